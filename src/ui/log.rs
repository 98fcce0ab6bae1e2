//! In-memory log pane.
//!
//! The tracing subscriber writes here instead of stdout, which the
//! alternate screen owns while the UI runs. The pane renders the tail
//! of the buffer.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

struct Inner {
    lines: VecDeque<String>,
    capacity: usize,
}

/// Bounded ring buffer of formatted log lines.
#[derive(Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<Inner>>,
}

impl LogBuffer {
    /// Create a buffer keeping at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                lines: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
            })),
        }
    }

    /// Append one line, evicting the oldest when full.
    pub fn push(&self, line: String) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.lines.len() == inner.capacity {
                inner.lines.pop_front();
            }
            inner.lines.push_back(line);
        }
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<String> {
        match self.inner.lock() {
            Ok(inner) => inner
                .lines
                .iter()
                .skip(inner.lines.len().saturating_sub(count))
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Line-buffering adapter between the tracing formatter and the pane.
pub struct LogWriter {
    buffer: LogBuffer,
    staging: Vec<u8>,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.staging.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        while let Some(newline) = self.staging.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.staging.drain(..=newline).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            self.buffer.push(text);
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
        if !self.staging.is_empty() {
            let text = String::from_utf8_lossy(&self.staging).into_owned();
            self.buffer.push(text);
        }
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: self.clone(),
            staging: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_tail_returns_newest_lines() {
        let buffer = LogBuffer::new(3);
        for i in 0..5 {
            buffer.push(format!("line {i}"));
        }
        assert_eq!(buffer.tail(2), vec!["line 3", "line 4"]);
        // Capacity caps retention.
        assert_eq!(buffer.tail(10).len(), 3);
    }

    #[test]
    fn test_writer_splits_lines_on_flush() {
        let buffer = LogBuffer::new(10);
        let mut writer = buffer.make_writer();
        writer.write_all(b"first\nsec").unwrap();
        writer.flush().unwrap();
        assert_eq!(buffer.tail(10), vec!["first"]);
        drop(writer);
        assert_eq!(buffer.tail(10), vec!["first", "sec"]);
    }
}
