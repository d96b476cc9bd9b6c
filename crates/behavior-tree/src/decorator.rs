//! Decorator nodes.
//!
//! Decorators wrap a single child and transform its result or gate its
//! execution. The tree drives them in three steps: [`Decorator::latched`]
//! may answer without ticking the child, otherwise the child is ticked and
//! [`Decorator::finish`] maps its status. A decorator without a child reports
//! `Success` and never reaches either step.

use crate::Status;

/// Default edge codes for [`Decorator::Threshold`]: fire on entering Success.
pub const DEFAULT_THRESHOLDS: &str = "tnn";

/// Single-child transforms.
#[derive(Debug, Clone, PartialEq)]
pub enum Decorator {
    /// Success ↔ Failure. Running passes through.
    Invert,

    /// Always `Success`, whatever the child reports.
    Successify,

    /// Always `Failure`, whatever the child reports.
    Failify,

    /// Ticks the child once and mirrors it; afterwards always `Success`.
    Once { done: bool },

    /// Mirrors the child until it succeeds, then latches `Success`.
    /// Re-armed when the parent composite finishes a traversal.
    Gate { done: bool, armed: bool },

    /// Like `Gate`, but re-armed when a traversal ends on a node with a
    /// lower index than this decorator (the row was reset).
    RowReset { done: bool, armed: bool },

    /// Restarts the child each time it succeeds. Always `Running`.
    Repeat,

    /// Reports `Success` only when the child's status changes in a way
    /// selected by a three-character code (see [`threshold`]). Codes are
    /// literal DSL text, never a variable name.
    Threshold {
        codes: String,
        previous: Status,
    },
}

/// What the tree must do after a decorator has seen its child's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    /// Abort the child so it restarts from its initial state.
    pub restart_child: bool,
}

impl Outcome {
    fn report(status: Status) -> Self {
        Self {
            status,
            restart_child: false,
        }
    }
}

/// Which composite finished a traversal, relative to a decorator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitScope {
    /// The exiting composite is the decorator's parent.
    pub from_parent: bool,
    /// The exiting composite is the root.
    pub from_root: bool,
    /// The decorator's own index.
    pub own_index: usize,
    /// Index of the tree's current node at dispatch time.
    pub current_index: usize,
}

impl Decorator {
    pub fn once() -> Self {
        Decorator::Once { done: false }
    }

    pub fn gate() -> Self {
        Decorator::Gate {
            done: false,
            armed: false,
        }
    }

    pub fn row_reset() -> Self {
        Decorator::RowReset {
            done: false,
            armed: false,
        }
    }

    /// Threshold decorator reading its codes from `params[0]`.
    pub fn threshold(params: &[String]) -> Self {
        Decorator::Threshold {
            codes: params
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_THRESHOLDS.to_string()),
            previous: Status::Unprocessed,
        }
    }

    /// Status to report without ticking the child, if latched.
    pub fn latched(&self) -> Option<Status> {
        match self {
            Decorator::Once { done: true }
            | Decorator::Gate { done: true, .. }
            | Decorator::RowReset { done: true, .. } => Some(Status::Success),
            _ => None,
        }
    }

    /// Maps the child's fresh status to this decorator's status.
    pub fn finish(&mut self, child: Status) -> Outcome {
        match self {
            Decorator::Invert => Outcome::report(child.invert()),
            Decorator::Successify => Outcome::report(Status::Success),
            Decorator::Failify => Outcome::report(Status::Failure),
            Decorator::Once { done } => {
                *done = true;
                Outcome::report(child)
            }
            Decorator::Gate { done, armed } | Decorator::RowReset { done, armed } => {
                *armed = true;
                if child.is_success() {
                    *done = true;
                }
                Outcome::report(child)
            }
            Decorator::Repeat => Outcome {
                status: Status::Running,
                restart_child: child.is_success(),
            },
            Decorator::Threshold { codes, previous } => {
                let status = threshold(codes, *previous, child);
                *previous = child;
                Outcome::report(status)
            }
        }
    }

    /// Clears latched state. Called when the decorator is aborted.
    pub fn reset(&mut self) {
        match self {
            Decorator::Once { done }
            | Decorator::Gate { done, .. }
            | Decorator::RowReset { done, .. } => *done = false,
            Decorator::Threshold { previous, .. } => *previous = Status::Unprocessed,
            _ => {}
        }
    }

    /// Reacts to a composite finishing its traversal.
    pub fn on_exit(&mut self, scope: ExitScope) {
        match self {
            Decorator::Gate { done, armed: true } if scope.from_parent => *done = false,
            Decorator::RowReset { done, armed: true }
                if scope.from_root && scope.current_index < scope.own_index =>
            {
                *done = false
            }
            _ => {}
        }
    }
}

/// Edge detection for [`Decorator::Threshold`].
///
/// `codes` holds one character per status, in the order Success, Failure,
/// Running: `t` fires when the child enters that status, `f` when it leaves
/// it, `b` on both and `n` on neither. An unchanged status never fires.
pub fn threshold(codes: &str, previous: Status, next: Status) -> Status {
    let codes: Vec<char> = codes.to_ascii_lowercase().chars().collect();
    if codes.len() != 3 || next == previous {
        return Status::Failure;
    }

    let slot = |status: Status| match status {
        Status::Success => Some(0),
        Status::Failure => Some(1),
        Status::Running => Some(2),
        Status::Unprocessed => None,
    };

    let Some(entered) = slot(next) else {
        return Status::Failure;
    };
    let entering = matches!(codes[entered], 't' | 'b');
    let leaving = slot(previous).is_some_and(|left| matches!(codes[left], 'f' | 'b'));

    if entering || leaving {
        Status::Success
    } else {
        Status::Failure
    }
}
