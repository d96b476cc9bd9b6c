//! Built-in leaves.
//!
//! Every leaf here is created from its DSL parameters by a `from_params`
//! constructor and registered under its token by
//! [`NodeRegistry::with_defaults`](crate::NodeRegistry::with_defaults).

pub mod actions;
pub mod conditions;
pub mod motion;

pub use actions::{Activate, Evaluate, Scale, Velocity, Wait, WaitMode};
pub use conditions::TriggerCheck;
pub use motion::{Dodge, MoveTo, Prowl, Roam};
