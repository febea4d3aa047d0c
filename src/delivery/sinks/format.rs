//! Line formats shared by the console and file sinks

use crate::queue::{Message, MessageType};
use colored::{ColoredString, Colorize};
use serde::Deserialize;
use serde_json::json;
use strum_macros::{Display, EnumString};

/// Rendering used by line-oriented sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// `2025-01-31 12:00:00.123 INF [source] text (file.rs:42)`
    #[default]
    Text,
    /// One compact JSON object per line
    Json,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render `message` as a single line without the trailing newline
pub fn render(message: &Message, format: MessageFormat, color: bool, with_location: bool) -> String {
    match format {
        MessageFormat::Json => json_line(message, with_location),
        MessageFormat::Text if color => color_line(message, with_location),
        MessageFormat::Text => text_line(message, with_location),
    }
}

fn text_line(message: &Message, with_location: bool) -> String {
    let mut line = format!(
        "{} {} [{}] {}",
        message.timestamp.format(TIMESTAMP_FORMAT),
        message.message_type.abbreviation(),
        message.source,
        message.text
    );
    if let Some(location) = location_suffix(message, with_location) {
        line.push_str(&format!(" ({})", location));
    }
    line
}

fn color_line(message: &Message, with_location: bool) -> String {
    let mut line = format!(
        "{} {} [{}] {}",
        message
            .timestamp
            .format(TIMESTAMP_FORMAT)
            .to_string()
            .dimmed(),
        colored_tag(message.message_type),
        message.source.cyan(),
        message.text
    );
    if let Some(location) = location_suffix(message, with_location) {
        line.push_str(&format!(" ({})", location.dimmed()));
    }
    line
}

fn colored_tag(message_type: MessageType) -> ColoredString {
    let tag = message_type.abbreviation();
    match message_type {
        MessageType::Critical => tag.red().bold().underline(),
        MessageType::Error => tag.red().bold(),
        MessageType::Warning => tag.yellow(),
        MessageType::Notice => tag.cyan(),
        MessageType::Info => tag.green(),
        MessageType::Debug => tag.blue(),
        MessageType::Trace => tag.magenta(),
    }
}

// Ordered: timestamp, level, source, message, metadata
fn json_line(message: &Message, with_location: bool) -> String {
    let mut object = json!({
        "timestamp": message.timestamp.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
        "level": message.message_type.abbreviation(),
        "source": message.source,
        "message": message.text,
    });
    if let Some(seq) = message.sequence() {
        object["sequence"] = json!(seq.value());
    }
    if let Some(location) = location_suffix(message, with_location) {
        object["location"] = json!(location);
    }

    serde_json::to_string(&object)
        .unwrap_or_else(|_| "{\"error\":\"Failed to serialize log message\"}".to_string())
}

/// `file.rs:42` when locations are wanted and the message carries one
fn location_suffix(message: &Message, with_location: bool) -> Option<String> {
    if !with_location {
        return None;
    }
    message
        .location
        .as_ref()
        .map(|location| format!("{}:{}", location.file, location.line))
}
