//! # Node Configuration
//!
//! One TOML file with a section per subsystem, then environment overrides.
//! Every section has defaults, so an empty file (or none) is a valid
//! testnet P2P configuration.
//!
//! ```toml
//! [network]
//! backend = "rpc"
//! chain = "testnet"
//!
//! [network.rpc]
//! url = "http://127.0.0.1:18332"
//!
//! [content]
//! gateways = ["https://ipfs.io"]
//!
//! [storage]
//! data_dir = "./data"
//! ```

use p2fk_02_peer_network::{Chain, PeerNetworkConfig, RpcConfig};
use p2fk_03_content_resolver::ResolverConfig;
use p2fk_04_tx_monitor::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Config file read when `P2FK_CONFIG` is unset, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "p2fk.toml";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Peer network backend and its settings.
    pub network: NetworkConfig,
    /// Content gateways and download retries.
    pub content: ResolverConfig,
    /// Monitor tunables.
    pub monitor: MonitorConfig,
    /// Where downloaded content lands.
    pub storage: StorageConfig,
    /// Background task intervals.
    pub runtime: RuntimeConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("invalid config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Which peer network implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Dial Bitcoin peers directly.
    #[default]
    P2p,
    /// Poll a full node over JSON-RPC.
    Rpc,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p2p" => Ok(Self::P2p),
            "rpc" => Ok(Self::Rpc),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub backend: Backend,
    /// Chain for both backends; overrides the per-backend `chain` keys.
    pub chain: Chain,
    pub p2p: PeerNetworkConfig,
    pub rpc: RpcConfig,
}

impl NetworkConfig {
    /// P2P settings on the configured chain.
    #[must_use]
    pub fn peer_network(&self) -> PeerNetworkConfig {
        PeerNetworkConfig {
            chain: self.chain,
            ..self.p2p.clone()
        }
    }

    /// RPC settings on the configured chain.
    #[must_use]
    pub fn rpc(&self) -> RpcConfig {
        RpcConfig {
            chain: self.chain,
            ..self.rpc.clone()
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory.
    pub data_dir: PathBuf,
    /// Signers blocked at startup.
    pub blocked_addresses: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            blocked_addresses: Vec::new(),
        }
    }
}

impl StorageConfig {
    /// Downloaded content goes here.
    #[must_use]
    pub fn content_dir(&self) -> PathBuf {
        self.data_dir.join("content")
    }
}

/// Intervals of the node's own background tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Gauge refresh interval, seconds.
    pub metrics_interval_secs: u64,
    /// Wait before retrying a start that found no peers, seconds.
    pub start_retry_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            metrics_interval_secs: 30,
            start_retry_secs: 30,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(1))
    }

    #[must_use]
    pub fn start_retry(&self) -> Duration {
        Duration::from_secs(self.start_retry_secs)
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl NodeConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` on malformed TOML or wrongly typed keys.
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read a config file.
    ///
    /// # Errors
    ///
    /// The file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&text, &origin)
    }

    /// Load from `P2FK_CONFIG` (or `p2fk.toml` if present), then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// An explicitly named file that is missing, or any unparsable file.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = match lookup("P2FK_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                info!("No config file, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    /// Apply `P2FK_*` overrides. Unparsable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("P2FK_NETWORK") {
            match value.parse() {
                Ok(chain) => self.network.chain = chain,
                Err(e) => warn!(value = %value, "Ignoring P2FK_NETWORK: {}", e),
            }
        }
        if let Some(value) = lookup("P2FK_BACKEND") {
            match value.parse() {
                Ok(backend) => self.network.backend = backend,
                Err(e) => warn!(value = %value, "Ignoring P2FK_BACKEND: {}", e),
            }
        }
        if let Some(value) = lookup("P2FK_SEEDS") {
            self.network.p2p.seeds = list(&value);
        }
        if let Some(value) = lookup("P2FK_RPC_URL") {
            self.network.rpc.url = value;
        }
        if let Some(value) = lookup("P2FK_RPC_USER") {
            self.network.rpc.user = Some(value);
        }
        if let Some(value) = lookup("P2FK_RPC_PASSWORD") {
            self.network.rpc.password = Some(value);
        }
        if let Some(value) = lookup("P2FK_GATEWAYS") {
            let gateways = list(&value);
            if gateways.is_empty() {
                warn!("Ignoring empty P2FK_GATEWAYS");
            } else {
                self.content.gateways = gateways;
            }
        }
        if let Some(value) = lookup("P2FK_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.network.backend, Backend::P2p);
        assert_eq!(config.network.chain, Chain::Testnet);
        assert_eq!(config.monitor.summary_chars, 50);
        assert_eq!(config.storage.content_dir(), PathBuf::from("./data/content"));
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = NodeConfig::from_toml("", "inline").unwrap();
        assert_eq!(config, NodeConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = NodeConfig::from_toml(
            r#"
            [network]
            backend = "rpc"
            chain = "mainnet"

            [network.rpc]
            url = "http://10.0.0.2:8332"
            user = "watcher"

            [network.p2p]
            target_peers = 3
            feed_cursor = "sequenced"

            [content]
            gateways = ["https://gw.example"]
            max_attempts = 5

            [storage]
            blocked_addresses = ["mzBc4XEFSdzCDcTxAgf6EZXgsZWpztRhef"]
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.network.backend, Backend::Rpc);
        assert_eq!(config.network.rpc().chain, Chain::Mainnet);
        assert_eq!(config.network.rpc().url, "http://10.0.0.2:8332");
        assert_eq!(config.network.rpc().password, None);
        assert_eq!(config.network.peer_network().chain, Chain::Mainnet);
        assert_eq!(config.network.peer_network().target_peers, 3);
        assert_eq!(config.content.max_attempts, 5);
        assert_eq!(config.content.request_timeout_secs, 60);
        assert_eq!(config.storage.blocked_addresses.len(), 1);
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_bad_document() {
        let err = NodeConfig::from_toml("[network]\nbackend = \"carrier-pigeon\"", "p2fk.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "p2fk.toml"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NodeConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p2fk.toml");
        std::fs::write(&path, "[runtime]\nmetrics_interval_secs = 5\n").unwrap();

        let config = NodeConfig::from_file(&path).unwrap();
        assert_eq!(config.runtime.metrics_interval(), Duration::from_secs(5));
        assert_eq!(config.runtime.start_retry_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = NodeConfig::default();
        config.apply_overrides(lookup(&[
            ("P2FK_NETWORK", "regtest"),
            ("P2FK_BACKEND", "RPC"),
            ("P2FK_SEEDS", "10.0.0.1:18444, 10.0.0.2:18444,"),
            ("P2FK_RPC_URL", "http://127.0.0.1:18443"),
            ("P2FK_RPC_USER", "alice"),
            ("P2FK_RPC_PASSWORD", "secret"),
            ("P2FK_GATEWAYS", "https://a.example,https://b.example"),
            ("P2FK_DATA_DIR", "/var/lib/p2fk"),
        ]));

        assert_eq!(config.network.chain, Chain::Regtest);
        assert_eq!(config.network.backend, Backend::Rpc);
        assert_eq!(
            config.network.p2p.seeds,
            vec!["10.0.0.1:18444".to_string(), "10.0.0.2:18444".to_string()]
        );
        assert_eq!(config.network.rpc().url, "http://127.0.0.1:18443");
        assert_eq!(config.network.rpc().user.as_deref(), Some("alice"));
        assert_eq!(config.network.rpc().password.as_deref(), Some("secret"));
        assert_eq!(config.content.gateways.len(), 2);
        assert_eq!(
            config.storage.content_dir(),
            PathBuf::from("/var/lib/p2fk/content")
        );
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = NodeConfig::default();
        config.apply_overrides(lookup(&[
            ("P2FK_NETWORK", "dogecoin"),
            ("P2FK_BACKEND", "carrier-pigeon"),
            ("P2FK_GATEWAYS", " , "),
        ]));
        assert_eq!(config, NodeConfig::default());
    }
}
