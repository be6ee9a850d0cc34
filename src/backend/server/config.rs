/**
 * Server Configuration
 *
 * This module handles loading and validation of the realtime server's
 * configuration.
 *
 * # Configuration Sources
 *
 * Later sources override earlier ones:
 * 1. Built-in defaults
 * 2. TOML file: `$REALTIME_CONFIG`, else
 *    `<config dir>/social-realtime/config.toml` if it exists
 * 3. Environment variables (`.env` is loaded by the binary before this runs)
 *
 * | Variable                  | Default       |
 * |---------------------------|---------------|
 * | `PORT`                    | `6001`        |
 * | `BIND_ADDR`               | `0.0.0.0`     |
 * | `JWT_SECRET`              | required      |
 * | `WS_PATH`                 | `/websockets` |
 * | `OUTBOUND_QUEUE_CAPACITY` | `64`          |
 * | `MAX_FRAME_BYTES`         | `65536`       |
 * | `PING_INTERVAL_SECS`      | `30`          |
 * | `PONG_TIMEOUT_SECS`       | `10`          |
 *
 * # Error Handling
 *
 * Unlike optional services, a bad configuration stops startup: there is no
 * safe fallback for a missing signing secret.
 */

use crate::shared::codec::DEFAULT_MAX_FRAME_BYTES;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "REALTIME_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

/// Realtime server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    pub port: u16,
    pub bind_addr: IpAddr,
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
    /// Path of the WebSocket endpoint
    pub ws_path: String,
    /// Frames buffered per connection before new ones are dropped
    pub outbound_queue_capacity: usize,
    /// Largest inbound frame decoded; bigger frames get an error frame
    pub max_frame_bytes: usize,
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            port: 6001,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            jwt_secret: String::new(),
            ws_path: "/websockets".to_string(),
            outbound_queue_capacity: 64,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
        }
    }
}

/// On-disk form; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    port: Option<u16>,
    bind_addr: Option<IpAddr>,
    jwt_secret: Option<String>,
    ws_path: Option<String>,
    outbound_queue_capacity: Option<usize>,
    max_frame_bytes: Option<usize>,
    ping_interval_secs: Option<u64>,
    pong_timeout_secs: Option<u64>,
}

impl RealtimeConfig {
    pub fn builder() -> RealtimeConfigBuilder {
        RealtimeConfigBuilder::default()
    }

    /// Load from defaults, the config file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_file_path() {
            tracing::info!(path = %path.display(), "[Config] Loading config file");
            config.apply_file(&path)?;
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from a TOML file
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(addr) = file.bind_addr {
            self.bind_addr = addr;
        }
        if let Some(secret) = file.jwt_secret {
            self.jwt_secret = secret;
        }
        if let Some(path) = file.ws_path {
            self.ws_path = path;
        }
        if let Some(capacity) = file.outbound_queue_capacity {
            self.outbound_queue_capacity = capacity;
        }
        if let Some(bytes) = file.max_frame_bytes {
            self.max_frame_bytes = bytes;
        }
        if let Some(secs) = file.ping_interval_secs {
            self.ping_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.pong_timeout_secs {
            self.pong_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }

    /// Overlay values from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = parse("PORT", &port)?;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = parse("BIND_ADDR", &addr)?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(path) = lookup("WS_PATH") {
            self.ws_path = path;
        }
        if let Some(capacity) = lookup("OUTBOUND_QUEUE_CAPACITY") {
            self.outbound_queue_capacity = parse("OUTBOUND_QUEUE_CAPACITY", &capacity)?;
        }
        if let Some(bytes) = lookup("MAX_FRAME_BYTES") {
            self.max_frame_bytes = parse("MAX_FRAME_BYTES", &bytes)?;
        }
        if let Some(secs) = lookup("PING_INTERVAL_SECS") {
            self.ping_interval = Duration::from_secs(parse("PING_INTERVAL_SECS", &secs)?);
        }
        if let Some(secs) = lookup("PONG_TIMEOUT_SECS") {
            self.pong_timeout = Duration::from_secs(parse("PONG_TIMEOUT_SECS", &secs)?);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if !self.ws_path.starts_with('/') {
            return Err(ConfigError::invalid("WS_PATH", "must start with '/'"));
        }
        if self.outbound_queue_capacity == 0 {
            return Err(ConfigError::invalid("OUTBOUND_QUEUE_CAPACITY", "must be at least 1"));
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::invalid("MAX_FRAME_BYTES", "must be at least 1"));
        }
        if self.ping_interval.is_zero() {
            return Err(ConfigError::invalid("PING_INTERVAL_SECS", "must be at least 1"));
        }
        if self.pong_timeout.is_zero() {
            return Err(ConfigError::invalid("PONG_TIMEOUT_SECS", "must be at least 1"));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    let path = dirs::config_dir()?.join("social-realtime").join("config.toml");
    path.exists().then_some(path)
}

/// Builder for RealtimeConfig
///
/// Starts from the defaults; used by tests and embedders that do not read
/// the environment.
#[derive(Debug, Default)]
pub struct RealtimeConfigBuilder {
    config: RealtimeConfig,
}

impl RealtimeConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn bind_addr(mut self, addr: IpAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn ws_path(mut self, path: impl Into<String>) -> Self {
        self.config.ws_path = path.into();
        self
    }

    pub fn outbound_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_queue_capacity = capacity;
        self
    }

    pub fn max_frame_bytes(mut self, bytes: usize) -> Self {
        self.config.max_frame_bytes = bytes;
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.config.pong_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RealtimeConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RealtimeConfig::default();
        assert_eq!(config.port, 6001);
        assert_eq!(config.ws_path, "/websockets");
        assert_eq!(config.outbound_queue_capacity, 64);
        assert_eq!(config.max_frame_bytes, 64 * 1024);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:6001");
    }

    #[test]
    fn test_secret_is_required() {
        assert_matches!(
            RealtimeConfig::default().validate(),
            Err(ConfigError::MissingValue("JWT_SECRET"))
        );
        assert_matches!(
            RealtimeConfig::builder().jwt_secret("   ").build(),
            Err(ConfigError::MissingValue("JWT_SECRET"))
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RealtimeConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "7000"),
                ("BIND_ADDR", "127.0.0.1"),
                ("JWT_SECRET", "s3cret"),
                ("OUTBOUND_QUEUE_CAPACITY", "8"),
                ("PONG_TIMEOUT_SECS", "3"),
            ]))
            .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:7000");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.outbound_queue_capacity, 8);
        assert_eq!(config.pong_timeout, Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = RealtimeConfig::default();
        assert_matches!(
            config.apply_env(env(&[("PORT", "sixty")])),
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        );
    }

    #[test]
    fn test_validate_rules() {
        let base = || RealtimeConfig::builder().jwt_secret("s");
        assert!(base().build().is_ok());
        assert_matches!(
            base().ws_path("websockets").build(),
            Err(ConfigError::InvalidValue { key: "WS_PATH", .. })
        );
        assert_matches!(
            base().outbound_queue_capacity(0).build(),
            Err(ConfigError::InvalidValue { key: "OUTBOUND_QUEUE_CAPACITY", .. })
        );
        assert_matches!(
            base().max_frame_bytes(0).build(),
            Err(ConfigError::InvalidValue { key: "MAX_FRAME_BYTES", .. })
        );
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 7100\njwt_secret = \"from-file\"\nws_path = \"/ws\"\nping_interval_secs = 5"
        )
        .unwrap();

        let mut config = RealtimeConfig::default();
        config.apply_file(file.path()).unwrap();
        config.apply_env(env(&[("JWT_SECRET", "from-env")])).unwrap();

        assert_eq!(config.port, 7100);
        assert_eq!(config.ws_path, "/ws");
        assert_eq!(config.ping_interval, Duration::from_secs(5));
        assert_eq!(config.jwt_secret, "from-env");
    }

    #[test]
    fn test_file_with_unknown_key_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prot = 1").unwrap();

        let mut config = RealtimeConfig::default();
        assert_matches!(config.apply_file(file.path()), Err(ConfigError::Parse { .. }));
    }

    #[test]
    #[serial]
    fn test_load_reads_process_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 7200").unwrap();

        std::env::set_var(CONFIG_PATH_ENV, file.path());
        std::env::set_var("JWT_SECRET", "env-secret");
        let loaded = RealtimeConfig::load();
        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::remove_var("JWT_SECRET");

        let config = loaded.unwrap();
        assert_eq!(config.port, 7200);
        assert_eq!(config.jwt_secret, "env-secret");
    }
}
