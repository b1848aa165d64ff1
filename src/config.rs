//! Service settings.
//!
//! Settings are layered: an optional TOML file first, then environment
//! variables prefixed with `BLINDVAULT__`. Nested keys use a double
//! underscore, so `BLINDVAULT__KEYS__HMAC_SECRET` maps to `keys.hmac_secret`.
//!
//! Settings are read once at startup and turned into the immutable
//! [`Secrets`] and [`KeyManager`](crate::keys::KeyManager) values that get
//! passed into each component. Nothing here is global.

use std::fmt;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::VerifyError;
use crate::keys::{Secrets, SymmetricSecret};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "BLINDVAULT";

fn default_database_path() -> PathBuf {
    PathBuf::from("data/verification.db")
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("keys/private_key.pem")
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Key locations and secrets. Both secrets are base64 text decoding to 32 bytes.
#[derive(Clone, Deserialize)]
pub struct KeySettings {
    #[serde(default = "default_private_key_path")]
    pub private_key_path: PathBuf,
    pub hmac_secret: String,
    pub storage_key: String,
}

impl fmt::Debug for KeySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySettings")
            .field("private_key_path", &self.private_key_path)
            .field("hmac_secret", &"[redacted]")
            .field("storage_key", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    pub keys: KeySettings,
}

impl Settings {
    /// Load settings from an optional TOML file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, VerifyError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            tracing::info!(path = %path.display(), "loading settings");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|err| VerifyError::Config(err.to_string()))
    }

    /// Parse settings from TOML text alone, without environment overrides.
    pub fn from_toml_str(toml: &str) -> Result<Self, VerifyError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|err| VerifyError::Config(err.to_string()))
    }

    /// Decode and validate the symmetric secrets.
    pub fn secrets(&self) -> Result<Secrets, VerifyError> {
        Secrets::new(
            SymmetricSecret::from_base64(&self.keys.hmac_secret)?,
            SymmetricSecret::from_base64(&self.keys.storage_key)?,
        )
    }
}
