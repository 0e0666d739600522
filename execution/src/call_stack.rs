//! Invocation chain of one outer call.
//!
//! The stack records depth and ordering only. Whether a re-entry is allowed is
//! decided by the ledger's guard policy, never here.

use reentrancy_types::{Account, Error, LedgerId, OperationKind};

/// Default ceiling on nested ledger calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Largest ceiling a machine accepts. Every nested call is a native stack
/// frame, so deeper chains would overflow a 2 MiB thread before the ceiling
/// could fail them.
pub const MAX_CALL_DEPTH_LIMIT: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub ledger: LedgerId,
    pub account: Account,
    pub operation: OperationKind,
    /// 1-based position on the stack.
    pub depth: usize,
}

#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<Frame>,
    max_depth: usize,
    peak: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
            peak: 0,
        }
    }

    /// Enter a frame. Entering from `Idle` starts a new outer invocation.
    pub fn push(
        &mut self,
        ledger: LedgerId,
        account: Account,
        operation: OperationKind,
    ) -> Result<Frame, Error> {
        if self.frames.len() >= self.max_depth {
            return Err(Error::CallDepthExceeded {
                max: self.max_depth,
            });
        }
        if self.frames.is_empty() {
            self.peak = 0;
        }
        let frame = Frame {
            ledger,
            account,
            operation,
            depth: self.frames.len() + 1,
        };
        self.frames.push(frame);
        self.peak = self.peak.max(frame.depth);
        Ok(frame)
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_idle(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames currently executing against `ledger`.
    pub fn entries_for(&self, ledger: LedgerId) -> usize {
        self.frames.iter().filter(|f| f.ledger == ledger).count()
    }

    /// Whether the innermost frame re-entered a ledger already on the stack.
    pub fn is_reentry(&self) -> bool {
        self.frames
            .last()
            .is_some_and(|top| self.entries_for(top.ledger) > 1)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Deepest depth reached by the current (or last finished) outer invocation.
    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALL_DEPTH)
    }
}
