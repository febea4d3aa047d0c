//! Command line arguments
//!
//! Every handler tunable can also come from the `[handler]` table of the
//! configuration file; flags given here win.

use crate::core::validation::{validate_millis, validate_name, validate_positive_int};
use crate::core::version::long_version;
use crate::queue::MessageType;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "logpump")]
#[command(about = "Pump log lines through a bounded asynchronous delivery queue")]
#[command(version, long_version = long_version())]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Read messages from FILE instead of stdin
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Source name stamped on every message
    #[arg(short = 's', long = "source", value_name = "NAME", value_parser = validate_name)]
    pub source: Option<String>,

    /// Type for lines without a recognised `type:` prefix
    #[arg(short = 't', long = "type", value_name = "TYPE", value_parser = parse_message_type)]
    pub message_type: Option<MessageType>,

    /// Handler name
    #[arg(short = 'n', long = "name", value_name = "NAME", value_parser = validate_name)]
    pub name: Option<String>,

    /// Maximum queued messages before new ones are dropped
    #[arg(short = 'Q', long = "queue-size", value_name = "COUNT", value_parser = validate_positive_int)]
    pub queue_size: Option<usize>,

    /// Messages handed to the sinks per worker iteration
    #[arg(short = 'B', long = "batch-size", value_name = "COUNT", value_parser = validate_positive_int)]
    pub batch_size: Option<usize>,

    /// Worker idle wait in milliseconds
    #[arg(long = "idle-wait", value_name = "MS", value_parser = validate_millis)]
    pub idle_wait_ms: Option<u64>,

    /// Print a delivery summary on exit
    #[arg(long = "stats", action = ArgAction::SetTrue)]
    pub stats: bool,

    /// Deliver to an in-memory sink instead of the configured sinks
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Force colored output (overrides TTY detection and NO_COLOR)
    #[arg(short = 'g', long = "color", action = ArgAction::SetTrue)]
    pub color: bool,

    /// Disable colored output (wins over --color)
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,
}

fn parse_message_type(value: &str) -> Result<MessageType, String> {
    value.parse::<MessageType>().map_err(|_| {
        format!(
            "'{}' is not a message type (trace, debug, info, notice, warning, error, critical)",
            value
        )
    })
}

impl Args {
    /// Resolve the color flags against terminal detection
    pub fn use_color(&self, is_terminal: bool) -> bool {
        match (self.color, self.no_color) {
            (_, true) => false,
            (true, false) => true,
            (false, false) => is_terminal && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Log file, honouring the magic values `none` and `-`
    pub fn log_file_path(&self) -> Option<String> {
        self.log_file
            .as_ref()
            .map(|path| path.to_string_lossy().to_string())
            .filter(|path| !path.eq_ignore_ascii_case("none") && path != "-")
    }

    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or("stdin")
    }

    pub fn default_message_type(&self) -> MessageType {
        self.message_type.unwrap_or(MessageType::Info)
    }
}
