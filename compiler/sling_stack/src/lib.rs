//! Stack safety for the parser and the tree-walking evaluator.
//!
//! Two independent limits apply to script execution:
//!
//! - **Native stack**: [`ensure_sufficient_stack`] grows the host stack on
//!   demand so deeply nested expressions do not overflow it.
//! - **Script call depth**: [`CallDepth`] counts active script calls and
//!   refuses to go past a configured maximum, so unbounded script recursion
//!   becomes a catchable error instead of exhausting memory.
//!
//! # Platform Support
//!
//! On `wasm32` the stack cannot be grown and [`ensure_sufficient_stack`]
//! calls the closure directly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Grow the stack when less than this remains (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment (2MB).
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Default maximum number of nested script calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Run `f`, first growing the stack if the remaining space is in the red zone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Shared counter of active script calls.
///
/// Cloning shares the counter, so every clone observes the same depth. One
/// `CallDepth` is created per evaluation and carried in its context.
#[derive(Clone, Debug)]
pub struct CallDepth {
    current: Arc<AtomicUsize>,
    max: usize,
}

impl CallDepth {
    pub fn new(max: usize) -> Self {
        CallDepth {
            current: Arc::new(AtomicUsize::new(0)),
            max,
        }
    }

    /// Enter one call level.
    ///
    /// Returns `None` when the maximum depth is already reached. The level is
    /// released when the returned guard drops.
    #[must_use = "the depth is released as soon as the guard is dropped"]
    pub fn enter(&self) -> Option<DepthGuard> {
        let previous = self.current.fetch_add(1, Ordering::AcqRel);
        if previous >= self.max {
            self.current.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(DepthGuard {
            current: Arc::clone(&self.current),
        })
    }

    /// Number of calls currently active.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for CallDepth {
    fn default() -> Self {
        CallDepth::new(DEFAULT_MAX_CALL_DEPTH)
    }
}

/// One active call level; decrements the counter on drop.
#[derive(Debug)]
pub struct DepthGuard {
    current: Arc<AtomicUsize>,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests;
