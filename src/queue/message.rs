//! Message types carried through the delivery queue
//!
//! A [`Message`] is built by a producer, handed to the queue by value and
//! frozen into an `Arc<Message>` at admission. The only field the queue ever
//! writes is the sequence number, and only at that moment.

use crate::queue::sequence::SeqNum;
use chrono::{DateTime, Local};
use serde::Deserialize;
use std::ops::{BitOr, BitOrAssign};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Severity / category of a message, used for sink gating
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Trace,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
}

impl MessageType {
    /// Three-letter tag used by the text formats
    pub fn abbreviation(self) -> &'static str {
        match self {
            MessageType::Trace => "TRC",
            MessageType::Debug => "DBG",
            MessageType::Info => "INF",
            MessageType::Notice => "NTC",
            MessageType::Warning => "WRN",
            MessageType::Error => "ERR",
            MessageType::Critical => "CRT",
        }
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Bit set of [`MessageType`] values a sink wants to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageTypeMask(u32);

impl MessageTypeMask {
    pub const NONE: MessageTypeMask = MessageTypeMask(0);

    pub fn all() -> Self {
        MessageType::iter().collect()
    }

    pub fn of(message_type: MessageType) -> Self {
        Self(message_type.bit())
    }

    /// Every type at or above `minimum` severity
    pub fn at_least(minimum: MessageType) -> Self {
        MessageType::iter().filter(|t| *t >= minimum).collect()
    }

    pub fn contains(self, message_type: MessageType) -> bool {
        self.0 & message_type.bit() != 0
    }

    pub fn insert(&mut self, message_type: MessageType) {
        self.0 |= message_type.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MessageTypeMask {
    type Output = MessageTypeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        MessageTypeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for MessageTypeMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<MessageType> for MessageTypeMask {
    fn from_iter<I: IntoIterator<Item = MessageType>>(iter: I) -> Self {
        let mut mask = MessageTypeMask::NONE;
        for message_type in iter {
            mask.insert(message_type);
        }
        mask
    }
}

/// Where a message was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub module: String,
    pub file: String,
    pub line: u32,
}

/// Capture the current module, file and line as a [`SourceLocation`]
#[macro_export]
macro_rules! source_location {
    () => {
        $crate::queue::SourceLocation {
            module: module_path!().to_string(),
            file: file!().to_string(),
            line: line!(),
        }
    };
}

/// A log message travelling from producer to sinks
///
/// # Example
///
/// ```rust
/// use logpump::queue::{Message, MessageType};
///
/// let message = Message::new("billing", MessageType::Info, "invoice 42 issued");
/// assert!(message.sequence().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    sequence: Option<SeqNum>,
    /// Time the producer created the message
    pub timestamp: DateTime<Local>,
    pub message_type: MessageType,
    /// Logical origin (logger name, component)
    pub source: String,
    pub text: String,
    pub location: Option<SourceLocation>,
}

impl Message {
    pub fn new(
        source: impl Into<String>,
        message_type: MessageType,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sequence: None,
            timestamp: Local::now(),
            message_type,
            source: source.into(),
            text: text.into(),
            location: None,
        }
    }

    /// Attach a producer-assigned sequence number
    ///
    /// Only honoured by queues that do not use their local generator.
    pub fn with_sequence(mut self, sequence: SeqNum) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Sequence number, or `None` for messages excluded from range tracking
    pub fn sequence(&self) -> Option<SeqNum> {
        self.sequence
    }

    pub(crate) fn assign_sequence(&mut self, sequence: SeqNum) {
        self.sequence = Some(sequence);
    }

    /// Messages without text are treated as malformed and never admitted
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
