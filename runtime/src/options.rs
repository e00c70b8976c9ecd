//! Runtime configuration.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Where `print` and `io.print` write to.
#[derive(Debug, Clone, Default)]
pub enum Output {
    /// The process' standard output.
    #[default]
    Stdout,
    /// An in-memory buffer, shared with the host.
    Buffer(OutputBuffer),
}

impl Output {
    pub(crate) fn write_line(&self, line: &str) {
        match self {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                // A closed stdout is not a script error.
                let _ = writeln!(stdout, "{}", line);
            }
            Output::Buffer(buffer) => buffer.push_line(line),
        }
    }
}

/// Shared capture buffer for script output.
///
/// Cloning yields another handle onto the same buffer.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take everything written so far, leaving the buffer empty.
    pub fn take(&self) -> String {
        core::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push_line(&self, line: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.push_str(line);
        inner.push('\n');
    }
}

/// Options for a runtime instance.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Output sink for printing builtins.
    pub output: Output,

    /// Maximum number of live values. Allocations beyond it fail.
    ///
    /// `Some(0)` cannot hold the runtime's own state, so engine creation fails.
    pub max_values: Option<usize>,

    /// Number of allocations between automatic collections.
    pub gc_threshold: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            output: Output::default(),
            max_values: None,
            gc_threshold: 1024,
        }
    }
}
