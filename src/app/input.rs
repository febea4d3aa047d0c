//! Turning input lines into messages
//!
//! A line may start with a message type followed by a colon
//! (`error: disk full`); otherwise the default type applies. Blank lines are
//! skipped.

use crate::queue::{Message, MessageType};
use std::io::BufRead;
use std::str::FromStr;

/// Build the message for one input line, or `None` for a blank line
pub fn parse_line(line: &str, source: &str, default_type: MessageType) -> Option<Message> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    let (message_type, text) = match line.split_once(':') {
        Some((prefix, rest)) => match MessageType::from_str(prefix.trim()) {
            Ok(message_type) if !rest.trim().is_empty() => (message_type, rest.trim_start()),
            _ => (default_type, line),
        },
        None => (default_type, line),
    };
    Some(Message::new(source, message_type, text))
}

/// Read `reader` to the end, handing each message to `deliver`
///
/// Returns the number of lines that produced a message.
pub fn pump_lines<R, F>(
    reader: R,
    source: &str,
    default_type: MessageType,
    mut deliver: F,
) -> std::io::Result<usize>
where
    R: BufRead,
    F: FnMut(Message),
{
    let mut produced = 0;
    for line in reader.lines() {
        if let Some(message) = parse_line(&line?, source, default_type) {
            deliver(message);
            produced += 1;
        }
    }
    Ok(produced)
}
