//! Errors raised while building or editing trees.

use thiserror::Error;

use crate::NodeId;

/// Errors surfaced by the compiler, the registry and structural edits.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("unknown node type `{0}`")]
    UnknownToken(String),

    #[error("unknown node implementation `{0}`")]
    UnknownImplementation(String),

    #[error("line depth {depth} exceeds open nesting depth {open}")]
    DepthExceeded { depth: usize, open: usize },

    #[error("the root already has a child")]
    RootOccupied,

    #[error("decorator {0} already has a child")]
    DecoratorOccupied(NodeId),

    #[error("node {0} is a leaf and cannot own children")]
    ParentIsLeaf(NodeId),

    #[error("node {0} is already attached")]
    AlreadyAttached(NodeId),

    #[error("node {0} is not attached")]
    NotAttached(NodeId),

    #[error("attaching node {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("the root node cannot be moved or detached")]
    RootImmovable,

    #[error("unknown node id {0}")]
    UnknownNode(NodeId),

    #[error("invalid parameters for `{token}`: {reason}")]
    InvalidParams { token: String, reason: String },

    #[error("expression error: {0}")]
    Expression(#[from] bt_expr::ExprError),

    #[error("unrecognized boot variable `{0}`")]
    BootVariable(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
