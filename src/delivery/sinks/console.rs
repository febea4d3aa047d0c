//! Console sink writing one line per message to stdout or stderr

use crate::delivery::error::{SinkError, SinkResult};
use crate::delivery::sink::{Sink, SinkConfig};
use crate::delivery::sinks::format::{render, MessageFormat};
use crate::queue::{Message, MessageTypeMask};
use serde::Deserialize;
use std::io::{self, Write};
use std::sync::Arc;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Debug)]
pub struct ConsoleSink {
    name: String,
    target: ConsoleTarget,
    format: MessageFormat,
    color: bool,
    config: SinkConfig,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>, target: ConsoleTarget) -> Self {
        Self {
            name: name.into(),
            target,
            format: MessageFormat::Text,
            color: false,
            config: SinkConfig::default(),
        }
    }

    pub fn with_format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }

    /// Colorize text output; ignored for JSON
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_types(mut self, message_types: MessageTypeMask) -> Self {
        self.config.message_types = message_types;
        self
    }

    pub fn with_source_location(mut self, record: bool) -> Self {
        self.config.record_source_location = record;
        self
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    /// Render a batch exactly as it would be written
    pub fn render_batch(&self, batch: &[Arc<Message>]) -> String {
        let mut out = String::new();
        for message in batch {
            out.push_str(&render(
                message,
                self.format,
                self.color,
                self.config.record_source_location,
            ));
            out.push('\n');
        }
        out
    }

    fn io_error(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            sink: self.name.clone(),
            source,
        }
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> SinkConfig {
        self.config
    }

    fn handle_message_batch(&self, batch: &[Arc<Message>]) -> SinkResult<()> {
        let rendered = self.render_batch(batch);
        let result = match self.target {
            ConsoleTarget::Stdout => io::stdout().lock().write_all(rendered.as_bytes()),
            ConsoleTarget::Stderr => io::stderr().lock().write_all(rendered.as_bytes()),
        };
        result.map_err(|err| self.io_error(err))
    }

    fn flush(&self) -> SinkResult<()> {
        let result = match self.target {
            ConsoleTarget::Stdout => io::stdout().flush(),
            ConsoleTarget::Stderr => io::stderr().flush(),
        };
        result.map_err(|err| self.io_error(err))
    }

    fn shutdown(&self) -> SinkResult<()> {
        self.flush()
    }
}
