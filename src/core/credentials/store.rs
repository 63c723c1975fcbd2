use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;
use zeroize::Zeroize;

use super::{Credential, CredentialError, CredentialStore};
use crate::core::tts::ProviderId;

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slots: Mutex<HashMap<ProviderId, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot.
    pub fn with(self, provider: ProviderId, secret: &str) -> Self {
        self.slots.lock().insert(provider, Credential::new(secret));
        self
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, provider: ProviderId) -> Result<Option<Credential>, CredentialError> {
        Ok(self.slots.lock().get(&provider).cloned())
    }

    fn save(&self, provider: ProviderId, credential: &Credential) -> Result<(), CredentialError> {
        self.slots.lock().insert(provider, credential.clone());
        Ok(())
    }
}

/// YAML file with one slot per provider, written with owner-only permissions.
///
/// ```yaml
/// openai: sk-...
/// azure: 0123abcd...
/// ```
///
/// When a slot is empty the provider's environment variable (for example
/// `OPENAI_API_KEY`) is consulted. The environment is never written back.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    env_fallback: bool,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_fallback: true,
            lock: Mutex::new(()),
        }
    }

    /// Disable the environment fallback.
    pub fn without_env_fallback(mut self) -> Self {
        self.env_fallback = false;
        self
    }

    /// `~/.config/speak-selection/credentials.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("speak-selection").join("credentials.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(&self) -> Result<HashMap<String, String>, CredentialError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_yaml::from_str(&contents).map_err(|e| {
            CredentialError::Format(format!("{}: {e}", self.path.display()))
        })
    }

    fn write_slots(&self, slots: &HashMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut yaml = serde_yaml::to_string(slots)
            .map_err(|e| CredentialError::Format(e.to_string()))?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let result = options
            .open(&self.path)
            .and_then(|mut file| file.write_all(yaml.as_bytes()));
        yaml.zeroize();
        result?;
        Ok(())
    }
}

fn wipe(slots: &mut HashMap<String, String>) {
    for value in slots.values_mut() {
        value.zeroize();
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, provider: ProviderId) -> Result<Option<Credential>, CredentialError> {
        let _guard = self.lock.lock();
        let mut slots = self.read_slots()?;
        let stored = slots
            .get(provider.as_str())
            .map(|s| Credential::new(s.as_str()))
            .filter(|c| !c.is_empty());
        wipe(&mut slots);

        if stored.is_some() || !self.env_fallback {
            return Ok(stored);
        }

        let from_env = provider
            .credential_env_var()
            .and_then(|var| std::env::var(var).ok())
            .map(Credential::new)
            .filter(|c| !c.is_empty());
        if from_env.is_some() {
            debug!(provider = %provider, "Using credential from environment");
        }
        Ok(from_env)
    }

    fn save(&self, provider: ProviderId, credential: &Credential) -> Result<(), CredentialError> {
        let _guard = self.lock.lock();
        let mut slots = self.read_slots()?;
        slots.insert(provider.as_str().to_string(), credential.expose().to_string());
        let result = self.write_slots(&slots);
        wipe(&mut slots);
        result
    }
}
