//! Text sinks for program output.
//!
//! The interpreter only appends to two streams: standard output for
//! `display` and standard error for diagnostics. The embedder decides
//! where they go.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Destination for program output.
pub trait OutputSink {
    /// Appends text to standard output.
    fn stdout(&mut self, text: &str);

    /// Appends text to standard error.
    fn stderr(&mut self, text: &str);
}

#[derive(Debug, Default)]
struct Buffers {
    stdout: String,
    stderr: String,
}

/// Captures both streams in memory.
///
/// Clones share the same buffers, so the embedder keeps one clone and hands
/// the other to the interpreter.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    buffers: Rc<RefCell<Buffers>>,
}

impl BufferSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything written to standard output.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        self.buffers.borrow().stdout.clone()
    }

    /// Returns a copy of everything written to standard error.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        self.buffers.borrow().stderr.clone()
    }

    /// Drains standard output.
    pub fn take_stdout(&self) -> String {
        std::mem::take(&mut self.buffers.borrow_mut().stdout)
    }

    /// Drains standard error.
    pub fn take_stderr(&self) -> String {
        std::mem::take(&mut self.buffers.borrow_mut().stderr)
    }
}

impl OutputSink for BufferSink {
    fn stdout(&mut self, text: &str) {
        self.buffers.borrow_mut().stdout.push_str(text);
    }

    fn stderr(&mut self, text: &str) {
        self.buffers.borrow_mut().stderr.push_str(text);
    }
}

/// Writes to the process's standard streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdSink;

impl OutputSink for StdSink {
    fn stdout(&mut self, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            tracing::warn!(%err, "failed to write program output");
        }
    }

    fn stderr(&mut self, text: &str) {
        let mut err_out = std::io::stderr().lock();
        if let Err(err) = err_out.write_all(text.as_bytes()) {
            tracing::warn!(%err, "failed to write program diagnostics");
        }
    }
}
