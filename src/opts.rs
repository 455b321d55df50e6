use std::time::Duration;

use smart_default::SmartDefault;

use crate::error::Error;
use crate::params_pool::{MAX_EVICT_DELTA, MIN_EVICT_DELTA};

pub const DEFAULT_PORT: u16 = 9088;

/// A configuration for connection
///
/// ```rs
/// let mut opts1 = Opts::default();
/// opts1.port = 9090;
///
/// let mut opts2 = Opts::try_from("informix://localhost:9088/stores?locale=en_US.utf8")?;
/// opts2.auto_commit = true;
/// ```
#[derive(Debug, Clone, SmartDefault)]
pub struct Opts {
    /// Enable TCP_NODELAY socket option to disable Nagle's algorithm
    #[default(true)]
    pub tcp_nodelay: bool,

    /// Hostname or IP address
    #[default("localhost".to_string())]
    pub host: String,

    #[default(DEFAULT_PORT)]
    pub port: u16,

    /// Database selected during initial setup
    pub database: Option<String>,

    /// Switch autocommit on right after initial setup
    pub auto_commit: bool,

    /// Age after which a freed parameter container is dropped from the pool
    #[default(Duration::from_secs(60 * 60))]
    pub parameter_evict_delta: Duration,

    /// Session properties sent during initial setup, in URI order
    pub properties: Vec<(String, String)>,
}

impl TryFrom<&str> for Opts {
    type Error = Error;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::BadConfigError(format!("Failed to parse connection URL: {}", e)))?;

        if !matches!(parsed.scheme(), "informix" | "wiredb") {
            return Err(Error::BadConfigError(format!(
                "Invalid URL scheme '{}', expected 'informix'",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| Error::BadConfigError(format!("No host in URL '{}'", url)))?
            .to_string();
        let port = parsed.port().unwrap_or(DEFAULT_PORT);

        let database = parsed
            .path()
            .strip_prefix('/')
            .filter(|db| !db.is_empty())
            .map(ToString::to_string);

        let mut opts = Self {
            host,
            port,
            database,
            ..Default::default()
        };

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "tcp_nodelay" => opts.tcp_nodelay = parse_bool(&key, &value)?,
                "auto_commit" => opts.auto_commit = parse_bool(&key, &value)?,
                "parameter_evict_secs" => {
                    let secs: u64 = value.parse().map_err(|_e| {
                        Error::BadConfigError(format!("Invalid {}: '{}'", key, value))
                    })?;
                    opts.parameter_evict_delta = Duration::from_secs(secs);
                }
                _ => opts.properties.push((key.into_owned(), value.into_owned())),
            }
        }

        if !(MIN_EVICT_DELTA..=MAX_EVICT_DELTA).contains(&opts.parameter_evict_delta) {
            return Err(Error::BadConfigError(format!(
                "parameter_evict_secs must lie within {}..={}",
                MIN_EVICT_DELTA.as_secs(),
                MAX_EVICT_DELTA.as_secs()
            )));
        }

        Ok(opts)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(Error::BadConfigError(format!(
            "Invalid {}: '{}', expected true or false",
            key, value
        ))),
    }
}
