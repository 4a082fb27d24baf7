use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hoard_index::CasBudget;
use hoard_protocol::MAX_UPLOAD_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

pub const ENV_BIND: &str = "HOARD_BIND";
pub const ENV_DATA_DIR: &str = "HOARD_DATA_DIR";
pub const ENV_BUCKET: &str = "HOARD_BUCKET";
pub const ENV_INDEX_DOMAIN: &str = "HOARD_INDEX_DOMAIN";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub bucket: String,
    pub index_domain: String,
    pub page_size: usize,
    pub max_upload_bytes: usize,
    pub verify_reads: bool,
    pub counter_budget: CounterBudgetConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8010)),
            storage: StorageConfig::Memory,
            bucket: "hoard-blobs".into(),
            index_domain: "hoard-index".into(),
            page_size: 100,
            max_upload_bytes: MAX_UPLOAD_SIZE,
            verify_reads: false,
            counter_budget: CounterBudgetConfig::default(),
        }
    }
}

/// Where blob bytes live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory,
    Filesystem { root: PathBuf },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterBudgetConfig {
    pub max_attempts: u32,
    pub max_elapsed_ms: u64,
}

impl Default for CounterBudgetConfig {
    fn default() -> Self {
        let budget = CasBudget::default();
        Self {
            max_attempts: budget.max_attempts,
            max_elapsed_ms: budget.max_elapsed.as_millis() as u64,
        }
    }
}

impl From<CounterBudgetConfig> for CasBudget {
    fn from(c: CounterBudgetConfig) -> Self {
        Self {
            max_attempts: c.max_attempts,
            max_elapsed: Duration::from_millis(c.max_elapsed_ms),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply `HOARD_*` overrides from the process environment.
    pub fn apply_env(self) -> ServerResult<Self> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply `HOARD_*` overrides from an arbitrary lookup.
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind_addr = bind
                .parse()
                .map_err(|e| ServerError::Config(format!("{ENV_BIND}={bind}: {e}")))?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.storage = StorageConfig::Filesystem { root: dir.into() };
        }
        if let Some(bucket) = lookup(ENV_BUCKET) {
            self.bucket = bucket;
        }
        if let Some(domain) = lookup(ENV_INDEX_DOMAIN) {
            self.index_domain = domain;
        }
        Ok(self)
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(ServerError::Config("bucket name must be set".into()));
        }
        if self.index_domain.trim().is_empty() {
            return Err(ServerError::Config("index domain must be set".into()));
        }
        if self.page_size == 0 {
            return Err(ServerError::Config("page_size must be at least 1".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config("max_upload_bytes must be at least 1".into()));
        }
        if self.counter_budget.max_attempts == 0 {
            return Err(ServerError::Config(
                "counter_budget.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
