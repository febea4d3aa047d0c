//! TOML configuration file loading
//!
//! ```toml
//! log_level = "warn"
//!
//! [handler]
//! name = "app"
//! max_queue_size = 20000
//!
//! [[sink]]
//! kind = "console"
//! target = "stderr"
//! min_type = "warning"
//!
//! [[sink]]
//! kind = "file"
//! path = "/var/log/app.log"
//! format = "json"
//! ```

use super::args::Args;
use crate::core::error_handling::ContextualError;
use crate::delivery::api::{
    ConsoleSink, ConsoleTarget, FileSink, HandlerConfig, MemorySink, MessageFormat, SinkHandle,
};
use crate::queue::{MessageType, MessageTypeMask};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory under the platform config dir holding the default config file
pub const CONFIG_DIR_NAME: &str = "logpump";
pub const CONFIG_FILE_NAME: &str = "logpump.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid sink '{sink}': {message}")]
    InvalidSink { sink: String, message: String },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::Read { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidSink { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Console,
    File,
    Memory,
}

/// One `[[sink]]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinkSpec {
    pub name: Option<String>,
    pub kind: SinkKind,
    /// Console only
    pub target: ConsoleTarget,
    /// File only
    pub path: Option<PathBuf>,
    pub format: MessageFormat,
    /// Console only; falls back to the resolved CLI color setting
    pub color: Option<bool>,
    /// Explicit type list; empty means every type
    pub types: Vec<MessageType>,
    /// Lowest accepted type; combined with `types` if both are given
    pub min_type: Option<MessageType>,
    pub record_source_location: bool,
}

impl SinkSpec {
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{:?}-{}", self.kind, index).to_lowercase())
    }

    pub fn type_mask(&self) -> MessageTypeMask {
        let listed: MessageTypeMask = self.types.iter().copied().collect();
        match self.min_type {
            Some(minimum) => listed | MessageTypeMask::at_least(minimum),
            None if listed.is_empty() => MessageTypeMask::all(),
            None => listed,
        }
    }

    /// Build the sink this table describes
    pub fn build(&self, index: usize, use_color: bool) -> Result<SinkHandle, ConfigError> {
        let name = self.display_name(index);
        let sink: SinkHandle = match self.kind {
            SinkKind::Console => Arc::new(
                ConsoleSink::new(name, self.target)
                    .with_format(self.format)
                    .with_color(self.color.unwrap_or(use_color))
                    .with_types(self.type_mask())
                    .with_source_location(self.record_source_location),
            ),
            SinkKind::File => {
                let path = self.path.clone().ok_or_else(|| ConfigError::InvalidSink {
                    sink: name.clone(),
                    message: format!("file sink '{}' needs a path", name),
                })?;
                Arc::new(
                    FileSink::new(name, path)
                        .with_format(self.format)
                        .with_types(self.type_mask())
                        .with_source_location(self.record_source_location),
                )
            }
            SinkKind::Memory => {
                let mut memory = MemorySink::new(name).with_types(self.type_mask());
                if self.record_source_location {
                    memory = memory.recording_source_location();
                }
                Arc::new(memory)
            }
        };
        Ok(sink)
    }
}

/// Contents of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Diagnostic log level used when `--log-level` is not given
    pub log_level: Option<String>,
    pub handler: HandlerConfig,
    #[serde(rename = "sink")]
    pub sinks: Vec<SinkSpec>,
}

impl FileConfig {
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Handler settings with command line overrides applied
    pub fn handler_config(&self, args: &Args) -> HandlerConfig {
        let mut config = self.handler.clone();
        if let Some(name) = &args.name {
            config.name = name.clone();
        }
        if let Some(queue_size) = args.queue_size {
            config.max_queue_size = queue_size;
        }
        if let Some(batch_size) = args.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(idle_wait_ms) = args.idle_wait_ms {
            config.idle_wait_ms = idle_wait_ms;
        }
        config
    }

    /// Build every configured sink, or a colored stdout console sink if none
    pub fn build_sinks(&self, use_color: bool) -> Result<Vec<SinkHandle>, ConfigError> {
        if self.sinks.is_empty() {
            let console = ConsoleSink::new("console", ConsoleTarget::Stdout).with_color(use_color);
            return Ok(vec![Arc::new(console)]);
        }
        self.sinks
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.build(index, use_color))
            .collect()
    }
}

/// Default configuration file location, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the configuration file
///
/// An explicit path must exist. Without one, the default location is used if
/// a file is present there; otherwise defaults apply.
pub async fn load_config(config_file: Option<PathBuf>) -> Result<FileConfig, ConfigError> {
    let path = match config_file {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound { path }),
        Some(path) => path,
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                log::debug!("No configuration file found; using defaults");
                return Ok(FileConfig::default());
            }
        },
    };

    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
    log::debug!("Loaded configuration from {}", path.display());
    FileConfig::parse(&contents, &path)
}
