use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use story_core::outcome::{DEFAULT_HIGH_IMPACT_FROM, DEFAULT_MEDIUM_IMPACT_FROM};
use story_core::{Catalog, ImpactThresholds};
use thiserror::Error;

use crate::{MemorySessionStore, PersistenceError, SessionStore, SqliteSessionStore, StoryApi};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_SQLITE_PATH: &str = "medishield_sessions.sqlite";

pub const ENV_BIND_ADDR: &str = "MEDISHIELD_BIND_ADDR";
pub const ENV_STORE: &str = "MEDISHIELD_STORE";
pub const ENV_SQLITE_PATH: &str = "MEDISHIELD_SQLITE_PATH";
pub const ENV_MEDIUM_FROM: &str = "MEDISHIELD_IMPACT_MEDIUM_FROM";
pub const ENV_HIGH_FROM: &str = "MEDISHIELD_IMPACT_HIGH_FROM";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid bind address: {0}")]
    BindAddr(String),
    #[error("unknown store backend {0:?}; expected \"sqlite\" or \"memory\"")]
    StoreBackend(String),
    #[error("invalid {name}: {value}")]
    Threshold { name: &'static str, value: String },
    #[error("medium impact threshold {medium_from} exceeds high threshold {high_from}")]
    ThresholdOrder { medium_from: f64, high_from: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite(PathBuf),
}

impl StoreBackend {
    pub fn parse(kind: &str, sqlite_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite(
                sqlite_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            )),
            _ => Err(ConfigError::StoreBackend(kind.to_string())),
        }
    }

    pub fn open(&self) -> Result<Box<dyn SessionStore>, PersistenceError> {
        match self {
            Self::Memory => Ok(Box::new(MemorySessionStore::new())),
            Self::Sqlite(path) => Ok(Box::new(SqliteSessionStore::open(path)?)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub thresholds: ImpactThresholds,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_addr = read(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::BindAddr(raw_addr.clone()))?;

        let store = StoreBackend::parse(
            read(ENV_STORE).as_deref().unwrap_or("sqlite"),
            read(ENV_SQLITE_PATH).map(PathBuf::from),
        )?;

        let medium_from = parse_threshold(ENV_MEDIUM_FROM, read(ENV_MEDIUM_FROM))?
            .unwrap_or(DEFAULT_MEDIUM_IMPACT_FROM);
        let high_from = parse_threshold(ENV_HIGH_FROM, read(ENV_HIGH_FROM))?
            .unwrap_or(DEFAULT_HIGH_IMPACT_FROM);
        let thresholds = ImpactThresholds::new(medium_from, high_from).ok_or(
            ConfigError::ThresholdOrder {
                medium_from,
                high_from,
            },
        )?;

        Ok(Self {
            bind_addr,
            store,
            thresholds,
        })
    }

    pub fn open_api(&self) -> Result<StoryApi, PersistenceError> {
        let store = self.store.open()?;
        Ok(StoryApi::new(Arc::new(Catalog::builtin()), store).with_thresholds(self.thresholds))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store: StoreBackend::Sqlite(PathBuf::from(DEFAULT_SQLITE_PATH)),
            thresholds: ImpactThresholds::default(),
        }
    }
}

fn parse_threshold(name: &'static str, raw: Option<String>) -> Result<Option<f64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        _ => Err(ConfigError::Threshold { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).expect("defaults");
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn environment_overrides_apply() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_BIND_ADDR, "0.0.0.0:9000"),
            (ENV_STORE, "Memory"),
            (ENV_MEDIUM_FROM, "5000"),
            (ENV_HIGH_FROM, "20000"),
        ]))
        .expect("overrides");

        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 9000)));
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.thresholds.medium_from, 5_000.0);
        assert_eq!(config.thresholds.high_from, 20_000.0);
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_SQLITE_PATH, "  "),
            (ENV_STORE, ""),
        ]))
        .expect("blank values");
        assert_eq!(
            config.store,
            StoreBackend::Sqlite(PathBuf::from(DEFAULT_SQLITE_PATH))
        );
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            ServerConfig::from_lookup(lookup_from(&[(ENV_BIND_ADDR, "nowhere")])),
            Err(ConfigError::BindAddr("nowhere".to_string()))
        );
        assert_eq!(
            ServerConfig::from_lookup(lookup_from(&[(ENV_STORE, "mongo")])),
            Err(ConfigError::StoreBackend("mongo".to_string()))
        );
        assert!(matches!(
            ServerConfig::from_lookup(lookup_from(&[(ENV_MEDIUM_FROM, "-1")])),
            Err(ConfigError::Threshold { .. })
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup_from(&[(ENV_MEDIUM_FROM, "50000")])),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn memory_backend_opens_without_touching_disk() {
        let config = ServerConfig {
            store: StoreBackend::Memory,
            ..ServerConfig::default()
        };
        let api = config.open_api().expect("open api");
        assert_eq!(api.store_backend(), "memory");
    }

    proptest! {
        #[test]
        fn threshold_pairs_accepted_only_when_ordered(
            medium in 0u32..50_000,
            high in 0u32..50_000,
        ) {
            let medium_raw = medium.to_string();
            let high_raw = high.to_string();
            let result = ServerConfig::from_lookup(lookup_from(&[
                (ENV_MEDIUM_FROM, medium_raw.as_str()),
                (ENV_HIGH_FROM, high_raw.as_str()),
            ]));

            if medium <= high {
                let config = result.expect("ordered thresholds");
                prop_assert_eq!(config.thresholds.medium_from, f64::from(medium));
                prop_assert_eq!(config.thresholds.high_from, f64::from(high));
            } else {
                let is_order_error = matches!(result, Err(ConfigError::ThresholdOrder { .. }));
                prop_assert!(is_order_error);
            }
        }
    }
}
