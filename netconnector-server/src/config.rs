//! Server configuration: TOML file, then environment, then command line.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use netconnector::ConnectConfig;
use netconnector::pool::PoolConfig;
use netconnector::remote::{RemoteConfig, SessionMode};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const TOKEN_ENV: &str = "NETCONNECTOR_TOKEN";
pub const LISTEN_ENV: &str = "NETCONNECTOR_LISTEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct PoolSection {
    capacity: usize,
    ttl_secs: u64,
    sweep_secs: u64,
}

impl Default for PoolSection {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            capacity: pool.capacity,
            ttl_secs: pool.ttl.as_secs(),
            sweep_secs: pool.sweep_interval.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct DeviceSection {
    connect_timeout_secs: u64,
    login_timeout_secs: u64,
    session_mode: SessionMode,
    respawn: bool,
}

impl Default for DeviceSection {
    fn default() -> Self {
        let connect = ConnectConfig::default();
        Self {
            connect_timeout_secs: connect.connect_timeout.as_secs(),
            login_timeout_secs: connect.login_timeout.as_secs(),
            session_mode: SessionMode::default(),
            respawn: true,
        }
    }
}

/// On-disk layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    listen: Option<String>,
    token: Option<String>,
    pool: PoolSection,
    device: DeviceSection,
}

#[derive(Debug)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub token: SecretString,
    pub remote: RemoteConfig,
}

impl ServerConfig {
    pub const DEFAULT_LISTEN: &'static str = "0.0.0.0:8000";

    /// Read `path` (when given), apply `NETCONNECTOR_*` variables and the
    /// `--listen` override.
    pub fn load(path: Option<&Path>, listen: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => FileConfig::default(),
        };
        Self::resolve(
            file,
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(LISTEN_ENV).ok(),
            listen.map(str::to_string),
        )
    }

    fn resolve(
        file: FileConfig,
        env_token: Option<String>,
        env_listen: Option<String>,
        cli_listen: Option<String>,
    ) -> Result<Self, ConfigError> {
        let listen = cli_listen
            .or(env_listen)
            .or(file.listen)
            .unwrap_or_else(|| Self::DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen.parse().map_err(|e| ConfigError::Invalid {
            name: "listen",
            message: format!("'{listen}': {e}"),
        })?;

        let token = env_token.or(file.token).unwrap_or_default();
        if token.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "token",
                message: format!("set 'token' in the config file or {TOKEN_ENV}"),
            });
        }

        if file.pool.capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "pool.capacity",
                message: "must be at least 1".to_string(),
            });
        }

        let remote = RemoteConfig {
            mode: file.device.session_mode,
            respawn: file.device.respawn,
            connect: ConnectConfig {
                connect_timeout: Duration::from_secs(file.device.connect_timeout_secs),
                login_timeout: Duration::from_secs(file.device.login_timeout_secs),
                ..ConnectConfig::default()
            },
            pool: PoolConfig {
                capacity: file.pool.capacity,
                ttl: Duration::from_secs(file.pool.ttl_secs),
                sweep_interval: Duration::from_secs(file.pool.sweep_secs),
                ..PoolConfig::default()
            },
        };

        Ok(Self {
            listen,
            token: SecretString::from(token),
            remote,
        })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn parse(text: &str) -> FileConfig {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_file_values() {
        let file = parse(
            r#"
listen = "127.0.0.1:9000"
token = "s3cret"

[pool]
capacity = 3
ttl_secs = 60

[device]
session_mode = "shared"
login_timeout_secs = 20
"#,
        );
        let config = ServerConfig::resolve(file, None, None, None).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.token.expose_secret(), "s3cret");
        assert_eq!(config.remote.pool.capacity, 3);
        assert_eq!(config.remote.pool.ttl, Duration::from_secs(60));
        assert_eq!(config.remote.pool.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.remote.mode, SessionMode::Shared);
        assert_eq!(config.remote.connect.login_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_overrides() {
        let file = parse("listen = \"127.0.0.1:9000\"\ntoken = \"file\"\n");
        let config = ServerConfig::resolve(
            file,
            Some("env".into()),
            Some("127.0.0.1:9100".into()),
            Some("127.0.0.1:9200".into()),
        )
        .unwrap();
        assert_eq!(config.token.expose_secret(), "env");
        assert_eq!(config.listen.port(), 9200);
    }

    #[test]
    fn test_token_is_required() {
        let err = ServerConfig::resolve(FileConfig::default(), None, None, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "token", .. }));
    }

    #[test]
    fn test_bad_listen_address() {
        let err = ServerConfig::resolve(FileConfig::default(), Some("t".into()), Some("nowhere".into()), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "listen", .. }));
    }
}
