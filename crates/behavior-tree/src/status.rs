//! Status reported by behavior nodes.

use serde::Serialize;

/// The outcome of ticking a node.
///
/// A node that has not been reached during the current traversal keeps
/// [`Status::Unprocessed`]; it is never produced by a node's own logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, strum::Display)]
pub enum Status {
    /// Not ticked yet, or reset before a diagnostic traversal.
    #[default]
    Unprocessed,

    /// In progress. The node must be ticked again next period.
    Running,

    /// For conditions: the condition was met.
    /// For actions: the action completed.
    Success,

    /// For conditions: the condition was not met.
    /// For actions: the action could not be carried out.
    Failure,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Swaps Success and Failure. Running and Unprocessed pass through.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}
