//! Sink contract
//!
//! A sink is the downstream end of the pipeline: a file, the console, a
//! network client. The delivery worker is the only caller of the delivery
//! methods, so a sink never sees two batches at once from the same handler.
//! Sinks are shared between the handler and its worker, hence `Send + Sync`
//! and `&self` receivers with interior mutability.

use crate::delivery::error::SinkResult;
use crate::queue::{Message, MessageTypeMask};
use std::sync::Arc;

/// Declared gating configuration of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Message types this sink wants
    pub message_types: MessageTypeMask,
    /// Whether this sink renders producer source locations
    pub record_source_location: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            message_types: MessageTypeMask::all(),
            record_source_location: false,
        }
    }
}

/// Downstream consumer of delivered message batches
///
/// # Example Implementation
///
/// ```rust
/// use logpump::delivery::{Sink, SinkConfig, SinkResult};
/// use logpump::queue::Message;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct CountingSink {
///     seen: AtomicUsize,
/// }
///
/// impl Sink for CountingSink {
///     fn name(&self) -> &str {
///         "counting"
///     }
///
///     fn config(&self) -> SinkConfig {
///         SinkConfig::default()
///     }
///
///     fn handle_message_batch(&self, batch: &[Arc<Message>]) -> SinkResult<()> {
///         self.seen.fetch_add(batch.len(), Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
pub trait Sink: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Gating configuration, read once when the handler is built
    fn config(&self) -> SinkConfig;

    /// Acquire resources; called by the worker before the first batch
    fn start_if_needed(&self) -> SinkResult<()> {
        Ok(())
    }

    /// Deliver one batch, in admission order
    fn handle_message_batch(&self, batch: &[Arc<Message>]) -> SinkResult<()>;

    /// Block until everything this sink has accepted is written out
    fn flush(&self) -> SinkResult<()> {
        Ok(())
    }

    /// Release resources; called by the worker after the final drain
    fn shutdown(&self) -> SinkResult<()> {
        Ok(())
    }
}

/// Shared handle to a sink
pub type SinkHandle = Arc<dyn Sink>;

/// Union of the type masks of `sinks`
pub fn aggregate_type_mask(sinks: &[SinkHandle]) -> MessageTypeMask {
    sinks
        .iter()
        .fold(MessageTypeMask::NONE, |mask, sink| mask | sink.config().message_types)
}

/// True if any of `sinks` records source locations
pub fn any_records_source_location(sinks: &[SinkHandle]) -> bool {
    sinks.iter().any(|sink| sink.config().record_source_location)
}
