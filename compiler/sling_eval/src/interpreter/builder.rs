//! `InterpreterBuilder` for creating interpreters with non-default settings.

use std::sync::Arc;

use sling_stack::DEFAULT_MAX_CALL_DEPTH;
use sling_value::{EnvArena, FrameKind};

use super::{Interpreter, Shared};
use crate::builtins::core_builtins;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::registry::LibraryRegistry;

/// Builder for [`Interpreter`].
///
/// Defaults: output goes to stdout and script calls nest at most
/// [`DEFAULT_MAX_CALL_DEPTH`] deep.
#[derive(Debug)]
pub struct InterpreterBuilder {
    print_handler: Option<SharedPrintHandler>,
    max_call_depth: usize,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder {
            print_handler: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Where `print` writes.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn build(self) -> Interpreter {
        let print = self.print_handler.unwrap_or_else(stdout_handler);
        let arena = EnvArena::new();
        let globals = arena.push(FrameKind::Module, None);
        let builtins = core_builtins(&print);
        tracing::debug!(
            builtins = builtins.len(),
            max_call_depth = self.max_call_depth,
            "interpreter built"
        );
        Interpreter {
            shared: Arc::new(Shared {
                arena,
                globals,
                builtins,
                registry: LibraryRegistry::new(),
                print,
                max_call_depth: self.max_call_depth,
            }),
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        InterpreterBuilder::new()
    }
}
