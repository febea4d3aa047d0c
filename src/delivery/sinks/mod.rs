//! Reference sink implementations

mod console;
mod file;
mod format;
mod memory;

pub use console::{ConsoleSink, ConsoleTarget};
pub use file::FileSink;
pub use format::{render, MessageFormat};
pub use memory::MemorySink;
