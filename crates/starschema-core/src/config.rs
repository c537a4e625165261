//! Configuration schema (dwh.cfg)
//!
//! `dwh.cfg` is an INI file:
//!
//! ```ini
//! [IAM_ROLE]
//! ARN='arn:aws:iam::123456789012:role/dwhRole'
//!
//! [S3]
//! LOG_DATA='s3://udacity-dend/log_data'
//! LOG_JSONPATH='s3://udacity-dend/log_json_path.json'
//! SONG_DATA='s3://udacity-dend/song_data'
//!
//! [CLUSTER]
//! HOST=dwhcluster.abc123.us-west-2.redshift.amazonaws.com
//! DB_NAME=dwh
//! DB_USER=dwhuser
//! DB_PORT=5439
//! ```
//!
//! Values are kept exactly as written, quotes included, and go into the
//! `COPY` statements unchanged. Keys are matched case-insensitively.

use ini::{Ini, ParseOption};
use std::path::{Path, PathBuf};

/// Default region used by the bulk-copy statements
pub const DEFAULT_REGION: &str = "us-west-2";

/// Default owner of the created schemas
pub const DEFAULT_SCHEMA_OWNER: &str = "dwhuser";

/// Default Redshift port
pub const DEFAULT_PORT: u16 = 5439;

/// Environment variable consulted when `CLUSTER.DB_PASSWORD` is absent
pub const PASSWORD_ENV: &str = "DWH_DB_PASSWORD";

/// Object storage locations feeding the staging tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Event log prefix (`S3.LOG_DATA`)
    pub log_data: String,

    /// JSONPath file describing the event log (`S3.LOG_JSONPATH`)
    pub log_jsonpath: String,

    /// Song metadata prefix (`S3.SONG_DATA`)
    pub song_data: String,

    /// Bucket region (`S3.REGION`, optional)
    pub region: String,
}

/// Warehouse connection settings (`[CLUSTER]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: Option<String>,
    pub db_port: u16,
}

impl ClusterConfig {
    /// Password from the file, falling back to `DWH_DB_PASSWORD`
    pub fn resolved_password(&self) -> Option<String> {
        self.db_password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
    }

    /// Render a libpq key/value connection string
    pub fn connection_string(&self) -> String {
        let mut conn = format!(
            "host={} port={} dbname={} user={}",
            quote_conn_value(&self.host),
            self.db_port,
            quote_conn_value(&self.db_name),
            quote_conn_value(&self.db_user),
        );

        if let Some(password) = self.resolved_password() {
            conn.push_str(" password=");
            conn.push_str(&quote_conn_value(&password));
        }

        conn
    }
}

/// Quote a libpq connection value when it is empty or contains spaces/quotes
fn quote_conn_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.chars().any(|c| c.is_whitespace() || c == '\'' || c == '\\');

    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DwhConfig {
    /// IAM role the warehouse assumes to read object storage (`IAM_ROLE.ARN`)
    pub role_arn: String,

    /// Staging sources
    pub s3: S3Config,

    /// Connection settings, only needed to execute statements
    pub cluster: Option<ClusterConfig>,

    /// File the config was loaded from
    pub source_path: Option<PathBuf>,
}

impl DwhConfig {
    /// Build a config from the four required values, defaults elsewhere
    pub fn new(
        role_arn: impl Into<String>,
        log_data: impl Into<String>,
        log_jsonpath: impl Into<String>,
        song_data: impl Into<String>,
    ) -> Self {
        Self {
            role_arn: role_arn.into(),
            s3: S3Config {
                log_data: log_data.into(),
                log_jsonpath: log_jsonpath.into(),
                song_data: song_data.into(),
                region: DEFAULT_REGION.to_string(),
            },
            cluster: None,
            source_path: None,
        }
    }

    /// Load config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_ini(&contents)?;
        config.source_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load config from a string
    pub fn from_ini(contents: &str) -> Result<Self, ConfigError> {
        // Raw values: no quote stripping, no escape processing
        let option = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };

        let ini = Ini::load_from_str_opt(contents, option)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        RawConfig::read(&ini).validate()
    }

    /// Owner of the created schemas: the cluster user, or `dwhuser`
    pub fn schema_owner(&self) -> &str {
        self.cluster
            .as_ref()
            .map(|c| c.db_user.as_str())
            .unwrap_or(DEFAULT_SCHEMA_OWNER)
    }

    /// Connection settings, or an error naming the missing section
    pub fn require_cluster(&self) -> Result<&ClusterConfig, ConfigError> {
        self.cluster
            .as_ref()
            .ok_or(ConfigError::MissingSection("CLUSTER"))
    }
}

#[derive(Debug, Default)]
struct RawConfig {
    iam_role: RawIamRole,
    s3: RawS3,
    cluster: Option<RawCluster>,
}

#[derive(Debug, Default)]
struct RawIamRole {
    arn: Option<String>,
}

#[derive(Debug, Default)]
struct RawS3 {
    log_data: Option<String>,
    log_jsonpath: Option<String>,
    song_data: Option<String>,
    region: Option<String>,
}

#[derive(Debug, Default)]
struct RawCluster {
    host: Option<String>,
    db_name: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_port: Option<String>,
}

fn lookup(ini: &Ini, section: &str, key: &str) -> Option<String> {
    ini.section(Some(section))
        .and_then(|props| props.get(key))
        .map(str::to_string)
}

fn require(value: Option<String>, section: &'static str, key: &'static str) -> Result<String, ConfigError> {
    value.ok_or(ConfigError::MissingKey { section, key })
}

impl RawConfig {
    fn read(ini: &Ini) -> Self {
        let cluster = ini.section(Some("CLUSTER")).map(|_| RawCluster {
            host: lookup(ini, "CLUSTER", "HOST"),
            db_name: lookup(ini, "CLUSTER", "DB_NAME"),
            db_user: lookup(ini, "CLUSTER", "DB_USER"),
            db_password: lookup(ini, "CLUSTER", "DB_PASSWORD"),
            db_port: lookup(ini, "CLUSTER", "DB_PORT"),
        });

        Self {
            iam_role: RawIamRole {
                arn: lookup(ini, "IAM_ROLE", "ARN"),
            },
            s3: RawS3 {
                log_data: lookup(ini, "S3", "LOG_DATA"),
                log_jsonpath: lookup(ini, "S3", "LOG_JSONPATH"),
                song_data: lookup(ini, "S3", "SONG_DATA"),
                region: lookup(ini, "S3", "REGION"),
            },
            cluster,
        }
    }

    fn validate(self) -> Result<DwhConfig, ConfigError> {
        let role_arn = require(self.iam_role.arn, "IAM_ROLE", "ARN")?;
        let log_data = require(self.s3.log_data, "S3", "LOG_DATA")?;
        let log_jsonpath = require(self.s3.log_jsonpath, "S3", "LOG_JSONPATH")?;
        let song_data = require(self.s3.song_data, "S3", "SONG_DATA")?;

        let cluster = match self.cluster {
            Some(raw) => Some(ClusterConfig {
                host: require(raw.host, "CLUSTER", "HOST")?,
                db_name: require(raw.db_name, "CLUSTER", "DB_NAME")?,
                db_user: require(raw.db_user, "CLUSTER", "DB_USER")?,
                db_password: raw.db_password,
                db_port: match raw.db_port {
                    Some(port) => port.parse().map_err(|e| {
                        ConfigError::ParseError(format!("CLUSTER.DB_PORT '{}': {}", port, e))
                    })?,
                    None => DEFAULT_PORT,
                },
            }),
            None => None,
        };

        Ok(DwhConfig {
            role_arn,
            s3: S3Config {
                log_data,
                log_jsonpath,
                song_data,
                region: self.s3.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            },
            cluster,
            source_path: None,
        })
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing configuration key {section}.{key}")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },

    #[error("Missing configuration section [{0}]")]
    MissingSection(&'static str),
}
