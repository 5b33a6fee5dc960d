use effect_backend::{Descriptor, Fault, LocalFactory, MAX_LEVEL_DB, MIN_LEVEL_DB};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Problems with a runner configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "instance {uuid}: max_level {max_level} outside [{}, {}]",
        MIN_LEVEL_DB,
        MAX_LEVEL_DB
    )]
    LevelOutOfRange { uuid: Uuid, max_level: i32 },
    #[error("instance uuid {0} is registered twice")]
    DuplicateUuid(Uuid),
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Deliberate fault a configured reference instance is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultConfig {
    #[default]
    None,
    ClampsLevel,
    IgnoresCeiling,
    ForgetsMute,
    OffByOneFloor,
    Unresponsive,
}

impl FaultConfig {
    /// Backend fault; unresponsive instances stall well past `timeout`
    pub fn to_fault(self, timeout: Duration) -> Fault {
        match self {
            FaultConfig::None => Fault::None,
            FaultConfig::ClampsLevel => Fault::ClampsLevel,
            FaultConfig::IgnoresCeiling => Fault::IgnoresCeiling,
            FaultConfig::ForgetsMute => Fault::ForgetsMute,
            FaultConfig::OffByOneFloor => Fault::OffByOneFloor,
            FaultConfig::Unresponsive => Fault::Unresponsive(timeout * 4),
        }
    }
}

/// A reference volume instance hosted by the runner's local factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub implementor: String,
    pub name: String,
    pub uuid: Uuid,
    pub max_level: i32,
    #[serde(default)]
    pub fault: FaultConfig,
}

impl InstanceConfig {
    pub fn descriptor(&self) -> Descriptor {
        Descriptor::volume(self.uuid, &self.name, &self.implementor, self.max_level)
    }
}

/// Runner configuration, loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Per-call transport timeout
    pub timeout_ms: u64,
    /// gtest-style case filter
    pub filter: Option<String>,
    pub check_unchanged_after_reject: bool,
    /// Where to write the JSON report
    pub report_path: Option<PathBuf>,
    /// Name of the local factory hosting `instances`
    pub factory_name: String,
    pub instances: Vec<InstanceConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            filter: None,
            check_unchanged_after_reject: false,
            report_path: None,
            factory_name: "local".to_string(),
            instances: vec![
                InstanceConfig {
                    implementor: "Reference".to_string(),
                    name: "VolumeSw".to_string(),
                    uuid: Uuid::from_u128(0xb8a031e0_6bbf_11ed_a1eb_0242ac120002),
                    max_level: MAX_LEVEL_DB,
                    fault: FaultConfig::None,
                },
                InstanceConfig {
                    implementor: "Reference".to_string(),
                    name: "VolumeSwLimited".to_string(),
                    uuid: Uuid::from_u128(0x3c2f1a5e_0d7b_4e39_9a61_5b8e2c4d7f10),
                    max_level: -1000,
                    fault: FaultConfig::None,
                },
            ],
        }
    }
}

impl RunnerConfig {
    /// Load a configuration file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let mut seen = HashSet::new();
        for instance in &self.instances {
            if !(MIN_LEVEL_DB..=MAX_LEVEL_DB).contains(&instance.max_level) {
                return Err(ConfigError::LevelOutOfRange {
                    uuid: instance.uuid,
                    max_level: instance.max_level,
                });
            }
            if !seen.insert(instance.uuid) {
                return Err(ConfigError::DuplicateUuid(instance.uuid));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Local factory hosting every configured instance
    pub fn build_factory(&self) -> LocalFactory {
        let timeout = self.timeout();
        let mut factory = LocalFactory::new(&self.factory_name, timeout);
        for instance in &self.instances {
            factory.register_volume(instance.descriptor(), instance.fault.to_fault(timeout));
        }
        factory
    }
}
