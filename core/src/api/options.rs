//! Engine configuration.

use bia_runtime::RuntimeOptions;

pub use bia_runtime::{Output, OutputBuffer};

/// Options fixed when an [`Engine`](super::Engine) is created.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Where `print` writes.
    pub output: Output,

    /// Maximum number of live runtime values. Allocation beyond it fails.
    pub max_values: Option<usize>,

    /// Allocations between two automatic collections.
    pub gc_threshold: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let runtime = RuntimeOptions::default();
        Self {
            output: runtime.output,
            max_values: runtime.max_values,
            gc_threshold: runtime.gc_threshold,
        }
    }
}

impl EngineOptions {
    /// Send script output to `buffer` instead of stdout.
    pub fn capture(mut self, buffer: OutputBuffer) -> Self {
        self.output = Output::Buffer(buffer);
        self
    }

    pub fn max_values(mut self, limit: usize) -> Self {
        self.max_values = Some(limit);
        self
    }

    pub(crate) fn to_runtime(&self) -> RuntimeOptions {
        RuntimeOptions {
            output: self.output.clone(),
            max_values: self.max_values,
            gc_threshold: self.gc_threshold,
        }
    }
}
