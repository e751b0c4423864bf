use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Medpredict";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 5000;

const ENV_HOST: &str = "MEDPREDICT_HOST";
const ENV_PORT: &str = "PORT";
const ENV_CORS: &str = "MEDPREDICT_CORS";
const ENV_REFERENCE_DIR: &str = "MEDPREDICT_REFERENCE_DIR";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medpredict=info,medpredict_lib=info,tower_http=info"
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key} value: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allow cross-origin requests from any origin.
    pub cors: bool,
    /// Directory holding `disease_mappings.json` and `sample_records.json`.
    /// Built-in reference data is used when unset.
    pub reference_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            cors: true,
            reference_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut builder = Self::builder();

        if let Some(raw) = get(ENV_HOST) {
            let host = raw.trim().parse::<IpAddr>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_HOST,
                value: raw.clone(),
            })?;
            builder = builder.host(host);
        }

        if let Some(raw) = get(ENV_PORT) {
            let port = raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PORT,
                value: raw.clone(),
            })?;
            builder = builder.port(port);
        }

        if let Some(raw) = get(ENV_CORS) {
            builder = builder.cors(parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                key: ENV_CORS,
                value: raw.clone(),
            })?);
        }

        if let Some(raw) = get(ENV_REFERENCE_DIR) {
            builder = builder.reference_dir(PathBuf::from(raw.trim()));
        }

        Ok(builder.build())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    host: Option<IpAddr>,
    port: Option<u16>,
    cors: Option<bool>,
    reference_dir: Option<PathBuf>,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: IpAddr) -> Self {
        self.host = Some(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    pub fn reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            cors: self.cors.unwrap_or(defaults.cors),
            reference_dir: self.reference_dir,
        }
    }
}
