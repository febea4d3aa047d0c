//! Append-only file sink
//!
//! The file is opened by `start_if_needed` on the worker thread, so a handler
//! can be built before the target directory exists. Flush pushes the buffer
//! to the OS and syncs the data to disk.

use crate::core::sync::lock_unpoisoned;
use crate::delivery::error::{SinkError, SinkResult};
use crate::delivery::sink::{Sink, SinkConfig};
use crate::delivery::sinks::format::{render, MessageFormat};
use crate::queue::{Message, MessageTypeMask};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct FileSink {
    name: String,
    path: PathBuf,
    format: MessageFormat,
    config: SinkConfig,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            format: MessageFormat::Text,
            config: SinkConfig::default(),
            writer: Mutex::new(None),
        }
    }

    pub fn with_format(mut self, format: MessageFormat) -> Self {
        self.format = format;
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

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        lock_unpoisoned(&self.writer).is_some()
    }

    fn io_error(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            sink: self.name.clone(),
            source,
        }
    }

    fn open(&self) -> io::Result<BufWriter<File>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(BufWriter::new(file))
    }
}

fn flush_and_sync(writer: &mut BufWriter<File>) -> io::Result<()> {
    writer.flush()?;
    writer.get_ref().sync_data()
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> SinkConfig {
        self.config
    }

    fn start_if_needed(&self) -> SinkResult<()> {
        let mut writer = lock_unpoisoned(&self.writer);
        if writer.is_none() {
            *writer = Some(self.open().map_err(|err| self.io_error(err))?);
            log::debug!("Sink '{}' writing to {}", self.name, self.path.display());
        }
        Ok(())
    }

    fn handle_message_batch(&self, batch: &[Arc<Message>]) -> SinkResult<()> {
        let mut guard = lock_unpoisoned(&self.writer);
        let writer = guard.as_mut().ok_or_else(|| SinkError::NotStarted {
            sink: self.name.clone(),
        })?;
        for message in batch {
            let line = render(
                message,
                self.format,
                false,
                self.config.record_source_location,
            );
            writeln!(writer, "{}", line).map_err(|err| self.io_error(err))?;
        }
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        match lock_unpoisoned(&self.writer).as_mut() {
            Some(writer) => flush_and_sync(writer).map_err(|err| self.io_error(err)),
            None => Ok(()),
        }
    }

    fn shutdown(&self) -> SinkResult<()> {
        match lock_unpoisoned(&self.writer).take() {
            Some(mut writer) => flush_and_sync(&mut writer).map_err(|err| self.io_error(err)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MessageType;
    use tempfile::TempDir;

    fn batch(texts: &[&str]) -> Vec<Arc<Message>> {
        texts
            .iter()
            .map(|text| Arc::new(Message::new("svc", MessageType::Info, *text)))
            .collect()
    }

    #[test]
    fn test_writes_after_start_and_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.log");
        let sink = FileSink::new("file", &path);

        sink.start_if_needed().unwrap();
        sink.handle_message_batch(&batch(&["alpha", "beta"])).unwrap();
        sink.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[svc] alpha"));
        assert!(lines[1].ends_with("[svc] beta"));
    }

    #[test]
    fn test_batch_before_start_is_rejected() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new("file", dir.path().join("out.log"));

        let result = sink.handle_message_batch(&batch(&["early"]));
        assert!(matches!(result, Err(SinkError::NotStarted { .. })));
    }

    #[test]
    fn test_appends_across_restarts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.log");

        for text in ["first run", "second run"] {
            let sink = FileSink::new("file", &path).with_format(MessageFormat::Json);
            sink.start_if_needed().unwrap();
            sink.handle_message_batch(&batch(&[text])).unwrap();
            sink.shutdown().unwrap();
            assert!(!sink.is_open());
        }

        let content = fs::read_to_string(&path).unwrap();
        let messages: Vec<String> = content
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["message"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(messages, vec!["first run", "second run"]);
    }
}
