//! Leaf action capability.
//!
//! This module defines the [`Behavior`] trait, implemented by everything a
//! leaf node can run. The tree only sequences calls and mirrors the returned
//! status; what the action does is up to the implementation.

use crate::{Agent, Status, Variables};

/// Everything a leaf may read or mutate while it runs.
pub struct TickContext<'a> {
    /// The tree's variable store (boot variables, expression results).
    pub variables: &'a mut Variables,

    /// The agent environment the tree drives.
    pub agent: &'a mut Agent,

    /// Index of the node being ticked.
    pub index: usize,
}

/// An action run by a leaf node.
pub trait Behavior: Send {
    /// Runs one step of the action.
    ///
    /// # Returns
    ///
    /// - `Status::Success` if the action completed
    /// - `Status::Failure` if it could not run (e.g. a missing target)
    /// - `Status::Running` if it needs to be ticked again next period
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status;

    /// Cancels in-flight state so the next tick starts fresh.
    fn abort(&mut self, _ctx: &mut TickContext<'_>) {}

    /// Called once the node is linked into a tree and boot variables are set.
    fn init(&mut self, _ctx: &mut TickContext<'_>) {}
}

/// Blanket implementation for boxed behaviors.
impl Behavior for Box<dyn Behavior> {
    #[inline]
    fn tick(&mut self, ctx: &mut TickContext<'_>) -> Status {
        (**self).tick(ctx)
    }

    #[inline]
    fn abort(&mut self, ctx: &mut TickContext<'_>) {
        (**self).abort(ctx)
    }

    #[inline]
    fn init(&mut self, ctx: &mut TickContext<'_>) {
        (**self).init(ctx)
    }
}

/// A leaf that always reports the same status.
///
/// Handy as a placeholder while editing trees and in tests.
#[derive(Debug, Clone, Copy)]
pub struct Constant(pub Status);

impl Behavior for Constant {
    fn tick(&mut self, _ctx: &mut TickContext<'_>) -> Status {
        self.0
    }
}
