//! Audio Test Fixtures
//!
//! Generated audio payloads as a synthesis backend would return them.
//! Using generated audio ensures:
//! - Consistent, reproducible test inputs
//! - No external file dependencies
//!
//! Audio formats:
//! - WAV: RIFF/WAVE, 16-bit signed PCM, mono, 22.05kHz (what the local engines emit)
//! - MP3: an ID3v2 tag followed by silent MPEG-1 Layer III frames

use std::f32::consts::PI;

use bytes::Bytes;

/// Sample rate of local engine output
pub const SAMPLE_RATE: u32 = 22050;

/// 100ms at 22.05kHz
pub const MS_100: usize = 2205;

/// Generate a sine wave tone
pub fn generate_sine_wave(duration_samples: usize, frequency: f32, amplitude: f32) -> Vec<i16> {
    let max_amplitude = amplitude * i16::MAX as f32;
    let angular_freq = 2.0 * PI * frequency / SAMPLE_RATE as f32;

    (0..duration_samples)
        .map(|i| ((angular_freq * i as f32).sin() * max_amplitude) as i16)
        .collect()
}

/// Wrap PCM samples in a canonical 44-byte WAV header
pub fn wav_from_samples(samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = SAMPLE_RATE * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }
    wav
}

/// 100ms 440Hz WAV tone
pub fn wav_tone() -> Bytes {
    Bytes::from(wav_from_samples(&generate_sine_wave(MS_100, 440.0, 0.5)))
}

/// MP3 payload: empty ID3v2.4 tag plus `frames` silent 128kbps frames
pub fn mp3_silence(frames: usize) -> Bytes {
    // 144 * 128000 / 44100 = 417 bytes per frame, no padding
    const FRAME_LEN: usize = 417;

    let mut mp3 = Vec::with_capacity(10 + frames * FRAME_LEN);
    mp3.extend_from_slice(b"ID3");
    mp3.extend_from_slice(&[4, 0, 0, 0, 0, 0, 0]);
    for _ in 0..frames {
        let start = mp3.len();
        // Sync word, MPEG-1 Layer III no CRC, 128kbps 44.1kHz, mono
        mp3.extend_from_slice(&[0xFF, 0xFB, 0x90, 0xC4]);
        mp3.resize(start + FRAME_LEN, 0);
    }
    Bytes::from(mp3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_header() {
        let wav = wav_tone();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + MS_100 * 2);
    }

    #[test]
    fn test_mp3_frames() {
        let mp3 = mp3_silence(3);
        assert_eq!(&mp3[0..3], b"ID3");
        assert_eq!(mp3.len(), 10 + 3 * 417);
    }
}
