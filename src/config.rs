//! Bridge configuration
//!
//! Everything comes from the environment (optionally seeded from `.env`).
//! Only the store credential is mandatory.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::memory::mem0::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Mem0 platform API key
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout for store calls
    pub store_timeout: Duration,
    /// Time between activity samples
    pub activity_interval: Duration,
    /// Directory the activity loop samples
    pub watch_root: PathBuf,
    pub host: String,
    pub port: u16,
    /// Updates that may wait for the background worker before new ones are refused
    pub queue_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            store_timeout: Duration::from_secs(30),
            activity_interval: Duration::from_secs(60),
            watch_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            host: "0.0.0.0".to_string(),
            port: 8080,
            queue_capacity: 256,
        }
    }
}

impl BridgeConfig {
    /// Load from the process environment after reading `.env` if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("MEM0_API_KEY")
            .ok_or_else(|| BridgeError::Config("MEM0_API_KEY not found in environment".to_string()))?;

        let config = Self {
            api_key,
            base_url: get("MEM0_BASE_URL").unwrap_or(defaults.base_url),
            store_timeout: parse_or(&get, "MEM0_TIMEOUT_SECS", defaults.store_timeout.as_secs())
                .map(Duration::from_secs)?,
            activity_interval: parse_or(
                &get,
                "ACTIVITY_INTERVAL_SECS",
                defaults.activity_interval.as_secs(),
            )
            .map(Duration::from_secs)?,
            watch_root: get("ACTIVITY_WATCH_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.watch_root),
            host: get("TASKMASTER_BRIDGE_HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "TASKMASTER_BRIDGE_PORT", defaults.port)?,
            queue_capacity: parse_or(&get, "BRIDGE_QUEUE_CAPACITY", defaults.queue_capacity)?,
        };

        if config.activity_interval.is_zero() {
            return Err(BridgeError::Config(
                "ACTIVITY_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if config.queue_capacity == 0 {
            return Err(BridgeError::Config(
                "BRIDGE_QUEUE_CAPACITY must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Resolve the listen address. The host may be an IP or a hostname.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| BridgeError::Config(format!("invalid listen address {}: {e}", self.host)))?
            .next()
            .ok_or_else(|| BridgeError::Config(format!("{} resolved to no addresses", self.host)))
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| BridgeError::Config(format!("{key}={raw:?} is not valid: {e}"))),
    }
}
