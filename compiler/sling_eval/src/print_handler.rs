//! Destination for script `print` output.
//!
//! - Stdout: the default for the CLI and plain embedding
//! - Buffer: captured for tests and hosts that read `output()`
//! - Silent: discarded
//!
//! Enum dispatch keeps the per-print cost to a match; no vtable.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Captures printed text.
#[derive(Default)]
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        BufferPrintHandler::default()
    }

    pub fn print(&self, text: &str) {
        self.buffer.lock().push_str(text);
    }

    pub fn output(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

pub enum PrintHandler {
    Stdout,
    Buffer(BufferPrintHandler),
    Silent,
}

impl PrintHandler {
    /// Write `text` as-is; callers supply their own line endings.
    pub fn print(&self, text: &str) {
        match self {
            Self::Stdout => {
                let mut out = std::io::stdout().lock();
                // A closed stdout is not a script error.
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            Self::Buffer(buffer) => buffer.print(text),
            Self::Silent => {}
        }
    }

    pub fn println(&self, text: &str) {
        match self {
            Self::Buffer(buffer) => {
                let mut guard = buffer.buffer.lock();
                guard.push_str(text);
                guard.push('\n');
            }
            _ => self.print(&format!("{text}\n")),
        }
    }

    /// Captured text; empty for handlers that do not capture.
    pub fn output(&self) -> String {
        match self {
            Self::Buffer(buffer) => buffer.output(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(buffer) = self {
            buffer.clear();
        }
    }
}

impl std::fmt::Debug for PrintHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stdout => "Stdout",
            Self::Buffer(_) => "Buffer",
            Self::Silent => "Silent",
        };
        f.write_str(name)
    }
}

/// Print handler shared between a runtime and its builtins.
pub type SharedPrintHandler = Arc<PrintHandler>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Buffer(BufferPrintHandler::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Silent)
}
