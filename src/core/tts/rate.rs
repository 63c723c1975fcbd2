//! Normalized speed to provider-native rate conversions.
//!
//! Speed is a multiplier in `[0.25, 4.0]` where 1.0 means the provider's
//! default pace. Every mapping here is monotonic non-decreasing and maps 1.0
//! to the provider's neutral value.

/// OpenAI accepts a `speed` multiplier in this range.
pub const OPENAI_SPEED_RANGE: (f32, f32) = (0.25, 4.0);

/// ElevenLabs `voice_settings.speed` range.
pub const ELEVENLABS_SPEED_RANGE: (f32, f32) = (0.7, 1.2);

/// Azure prosody accepts relative rates between half and double speed.
pub const AZURE_RATE_PERCENT_RANGE: (i32, i32) = (-50, 100);

/// Speaking pace of the local engines at speed 1.0.
pub const LOCAL_DEFAULT_WPM: u32 = 175;

#[inline]
pub fn openai_speed(speed: f32) -> f32 {
    speed.clamp(OPENAI_SPEED_RANGE.0, OPENAI_SPEED_RANGE.1)
}

#[inline]
pub fn elevenlabs_speed(speed: f32) -> f32 {
    speed.clamp(ELEVENLABS_SPEED_RANGE.0, ELEVENLABS_SPEED_RANGE.1)
}

/// Relative Azure rate in percent; 0 at speed 1.0.
pub fn azure_rate_percent(speed: f32) -> i32 {
    let percent = ((speed - 1.0) * 100.0).round() as i32;
    percent.clamp(AZURE_RATE_PERCENT_RANGE.0, AZURE_RATE_PERCENT_RANGE.1)
}

/// SSML `rate` attribute value, e.g. `"+0%"`, `"-25%"`, `"+50%"`.
pub fn azure_rate_attr(speed: f32) -> String {
    format!("{:+}%", azure_rate_percent(speed))
}

/// Words per minute for `say -r` / `espeak-ng -s`.
pub fn local_words_per_minute(speed: f32) -> u32 {
    (LOCAL_DEFAULT_WPM as f32 * speed).round() as u32
}
