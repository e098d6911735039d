//! Registry configuration loaded from TOML
//!
//! ```toml
//! log_filter = "olive_provenance=debug"
//! principal_hrp = "olive"
//!
//! [storage]
//! backend = "sled"
//! path = "/var/lib/olive/batches.db"
//! ```
use super::principal::Principal;
use super::registry::BatchRegistry;
use super::store::{BatchStore, MemoryStore, SledStore};
use super::telemetry;
use super::utils::DEFAULT_HRP;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub storage: StorageConfig,
    pub log_filter: String,
    pub principal_hrp: String, // prefix for generated principal addresses
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    #[default]
    Memory,
    Sled {
        path: PathBuf,
    },
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::Memory,
            log_filter: "info".into(),
            principal_hrp: DEFAULT_HRP.into(),
        }
    }
}

impl RegistryConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: RegistryConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    fn validate(&self) -> anyhow::Result<()> {
        bech32::Hrp::parse(&self.principal_hrp)
            .with_context(|| format!("principal_hrp {:?} is not a valid prefix", self.principal_hrp))?;
        Ok(())
    }

    /// Install the tracing subscriber with `log_filter` as the default filter.
    pub fn init_telemetry(&self) {
        telemetry::init(&self.log_filter);
    }

    /// Mint a principal address under the configured prefix.
    pub fn generate_principal(&self) -> anyhow::Result<Principal> {
        Principal::generate(&self.principal_hrp)
    }

    /// Open a registry over the configured backend. Installs logging first.
    pub fn open_registry(&self) -> anyhow::Result<BatchRegistry<Box<dyn BatchStore>>> {
        self.init_telemetry();
        let store: Box<dyn BatchStore> = match &self.storage {
            StorageConfig::Memory => Box::new(MemoryStore::new()),
            StorageConfig::Sled { path } => Box::new(
                SledStore::open(path)
                    .with_context(|| format!("failed to open store at {}", path.display()))?,
            ),
        };
        tracing::info!(storage = ?self.storage, "batch registry opened");
        Ok(BatchRegistry::new(store))
    }
}
