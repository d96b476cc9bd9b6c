//! Behavior tree interpreter driven by a small indentation-based DSL.
//!
//! Trees are compiled from text, ticked once per period by a [`Scheduler`]
//! and drive an [`Agent`] through leaf actions.
//!
//! - **Arena nodes**: nodes are addressed by [`NodeId`]; the pre-order
//!   index is recomputed after every structural edit
//! - **Running state**: leaves may span several ticks; the scheduler aborts
//!   a running branch when a higher-priority one takes over
//! - **Variables**: parameters bind to literals or to named variables
//!   resolved at tick time
//!
//! # Architecture
//!
//! - [`Behavior`]: Core trait for leaf actions
//! - [`Status`]: Unprocessed, Running, Success or Failure
//! - [`Tree`]: Node arena, variable store and agent; ticking in [`composite`]
//! - Decorator nodes: [`Decorator`]
//! - [`compile`]: DSL text to [`Tree`]; [`Tree::stringify`] goes back
//! - [`NodeRegistry`]: DSL token to node factory
//! - [`Scheduler`]: Periodic and event-driven traversals
//!
//! # Example
//!
//! ```
//! use behavior_tree::{NodeRegistry, Scheduler, SchedulerConfig, compile};
//!
//! let compiled = compile("-?\n--trigger Player true\n--velocity 1 0\n", &NodeRegistry::with_defaults());
//! let mut scheduler = Scheduler::new(SchedulerConfig::default());
//! scheduler.load(compiled.tree);
//! scheduler.advance(0.0);
//! assert!(scheduler.tree().unwrap().agent().motion.apply_vx);
//! ```

pub mod agent;
pub mod behavior;
pub mod builder;
pub mod composite;
pub mod decorator;
pub mod error;
pub mod node;
pub mod pack;
pub mod param;
pub mod registry;
pub mod scheduler;
pub mod status;
pub mod tree;
pub mod variables;

// Re-export core types for ergonomic API
pub use agent::{Agent, Motion, TriggerEvent, TriggerObject, Vec2};
pub use behavior::{Behavior, Constant, TickContext};
pub use builder::{Compiled, Issue, compile};
pub use decorator::Decorator;
pub use error::{Result, TreeError};
pub use node::{Node, NodeClass, NodeId, NodeKind};
pub use param::{Param, ParamValue};
pub use registry::{
    Builtin, COMPOSITE_DOCS, LeafFactory, NodeBinding, NodeDoc, NodeFactory, NodeRegistry, ParamDoc,
    RegistryConfig,
};
pub use scheduler::{
    Diagnostic, DiagnosticLog, DiagnosticObserver, MAX_CATCH_UP, Scheduler, SchedulerConfig,
    Traversal,
};
pub use status::Status;
pub use tree::Tree;
pub use variables::{Value, Variables};
