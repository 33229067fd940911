//! # Configuration
//!
//! Configuration is read from YAML. The text is first rendered as a `tera`
//! template, so values can come from the environment:
//!
//! ```yaml
//! logger:
//!   enable: true
//!   level: debug
//!   format: compact
//! server:
//!   base_uri: {{ get_env(name="LDT_BASE_URI", default="http://localhost:8080/") }}
//! sitemap:
//!   ontology: https://example.org/app#
//!   locations:
//!     https://example.org/app#: config/app.yaml
//! ```
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ontology::Iri, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logger: Logger,
    pub server: Server,
    pub sitemap: SitemapSettings,
}

/// Logger configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logger {
    /// Enable log write to stdout
    pub enable: bool,

    /// Set the logger level.
    ///
    /// * options: `trace` | `debug` | `info` | `warn` | `error`
    pub level: LogLevel,

    /// Set the logger format.
    ///
    /// * options: `compact` | `pretty` | `json`
    pub format: Format,

    /// Override our custom tracing filter.
    ///
    /// Set this to your own filter if you want to see traces from internal
    /// libraries. See more [here](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives)
    pub override_filter: Option<String>,

    /// Set this if you want to write log to file
    pub file_appender: Option<FileAppender>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: LogLevel::Info,
            format: Format::Compact,
            override_filter: None,
            file_appender: None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Rotation {
    #[serde(rename = "minutely")]
    Minutely,
    #[serde(rename = "hourly")]
    #[default]
    Hourly,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "never")]
    Never,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileAppender {
    /// Enable logger file appender
    pub enable: bool,
    /// Enable write log to file non-blocking
    #[serde(default)]
    pub non_blocking: bool,
    /// Set the logger file appender level.
    pub level: LogLevel,
    /// Set the logger file appender format.
    pub format: Format,
    /// Set the logger file appender rotation.
    #[serde(default)]
    pub rotation: Rotation,
    /// Set the logger file appender dir
    ///
    /// default is `./logs`
    pub dir: Option<String>,
    /// Set log filename prefix
    pub filename_prefix: Option<String>,
    /// Set log filename suffix
    pub filename_suffix: Option<String>,
    /// Set the logger file appender keep max log files.
    pub max_log_files: usize,
}

/// Site settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Server {
    /// Base URI that path templates resolve against, e.g. `https://example.org/`
    pub base_uri: Url,
}

/// Sitemap ontology settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SitemapSettings {
    /// Root ontology of the application
    pub ontology: Iri,
    /// Cache compiled sitemaps for the lifetime of the process
    #[serde(default = "default_cache")]
    pub cache: bool,
    /// Maximum number of cached sitemaps
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Ontology document locations, keyed by ontology IRI. Relative paths
    /// resolve against the working directory.
    #[serde(default)]
    pub locations: BTreeMap<Iri, PathBuf>,
}

fn default_cache() -> bool {
    true
}

fn default_max_capacity() -> u64 {
    32
}

impl Config {
    /// Renders `content` through `tera` and parses the resulting YAML.
    ///
    /// # Errors
    ///
    /// Returns an error when the template cannot be rendered or the YAML
    /// does not describe a valid configuration.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let rendered = tera::Tera::one_off(content, &tera::Context::new(), false)?;
        Ok(serde_yaml::from_str(&rendered)?)
    }

    /// Reads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        tracing::info!(config = %path.display(), "loading configuration");
        Self::from_yaml_str(&content)
    }
}
