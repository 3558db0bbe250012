//! TOML configuration for the intake service
//!
//! Every section and key is optional; an empty file yields the same
//! service the defaults describe (port 3000, `uploads/` next to the
//! working directory, 10 MiB upload limit).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::upload::DEFAULT_MAX_UPLOAD_BYTES;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

/// Filesystem locations and limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding stored proof files, also served under `/uploads`
    pub upload_dir: PathBuf,
    /// Static image returned by the QRIS endpoint
    pub placeholder_qris: PathBuf,
    /// Maximum accepted size of a single proof file, in bytes
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            placeholder_qris: PathBuf::from("placeholder-qris.png"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

impl IntakeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check the values that cannot be expressed in the types alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.storage.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_upload_bytes must be greater than 0".into(),
            ));
        }
        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.upload_dir must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Socket address the server listens on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}
