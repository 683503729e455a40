//! RAII guard for call, class-body and comprehension frames.
//!
//! Dropping a [`ScopedFrame`] releases its handle and then drains the
//! arena's release queue, so frames nobody captured are freed on scope
//! exit, including exit by `?` or unwinding.
//!
//! ```text
//! let scope = interpreter.scoped(Frame::new(FrameKind::Function, parent));
//! interpreter.exec_block(ctx, body, scope.env(), None)?;
//! // handle released and arena collected here
//! ```

use sling_value::{EnvArena, EnvRef, Frame};

use super::Interpreter;

struct CollectOnDrop<'a>(&'a EnvArena);

impl Drop for CollectOnDrop<'_> {
    fn drop(&mut self) {
        self.0.collect();
    }
}

/// A frame that lives for one lexical scope.
pub(crate) struct ScopedFrame<'a> {
    // Field order matters: the handle is released before the collect runs.
    env: EnvRef,
    _collect: CollectOnDrop<'a>,
}

impl ScopedFrame<'_> {
    pub(crate) fn env(&self) -> &EnvRef {
        &self.env
    }
}

impl Interpreter {
    /// Allocate `frame` for the duration of the returned guard.
    pub(crate) fn scoped(&self, frame: Frame) -> ScopedFrame<'_> {
        ScopedFrame {
            env: self.arena().alloc(frame),
            _collect: CollectOnDrop(self.arena().as_ref()),
        }
    }
}

#[cfg(test)]
mod tests;
