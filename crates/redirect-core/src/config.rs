//! redirect.toml configuration parser.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working single-node configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default table holding redirect entries.
pub const DEFAULT_TABLE: &str = "FoundryRedirects";

/// Prefix reserved for the service's own control namespace (`/api/...`).
pub const DEFAULT_RESERVED_PREFIX: &str = "api";

/// Cap on id generation attempts before allocation is declared failed.
pub const DEFAULT_MAX_ALLOCATION_ATTEMPTS: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid node_id {0:?}: expected 12 hex digits")]
    NodeId(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedirectConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file. Ignored when `in_memory` is set.
    pub path: PathBuf,
    pub table: String,
    pub in_memory: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/foundry-redirect/redirects.redb"),
            table: DEFAULT_TABLE.to_string(),
            in_memory: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub reserved_prefix: String,
    pub max_allocation_attempts: u32,
    /// Base URL used to render a public id as a full address,
    /// e.g. `https://redirect.example.com`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    /// UUID v1 node id as 12 hex digits. Random when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            max_allocation_attempts: DEFAULT_MAX_ALLOCATION_ATTEMPTS,
            public_base_url: None,
            node_id: None,
        }
    }
}

impl RegistryConfig {
    /// Decode `node_id` into the 6 bytes UUID v1 expects.
    pub fn node_id_bytes(&self) -> ConfigResult<Option<[u8; 6]>> {
        let Some(raw) = self.node_id.as_deref() else {
            return Ok(None);
        };
        let mut bytes = [0u8; 6];
        hex::decode_to_slice(raw, &mut bytes).map_err(|_| ConfigError::NodeId(raw.to_string()))?;
        Ok(Some(bytes))
    }
}

impl RedirectConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
