//! Node model.
//!
//! Nodes live in an arena owned by [`crate::Tree`] and refer to each other by
//! [`NodeId`]. The id is the arena slot and never changes; the node's
//! `index` is its pre-order position and is recomputed after every
//! structural edit.

use std::fmt;

use crate::{Behavior, Decorator, Status};

/// Stable handle to a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena slot of this node.
    pub fn slot(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node does when ticked.
pub enum NodeKind {
    /// Top of the tree. Owns at most one child.
    Root,
    /// Ticks children in order until one does not succeed (AND).
    Sequence,
    /// Ticks children in order until one does not fail (OR).
    Selector,
    /// Transforms the outcome of its single child.
    Decorator(Decorator),
    /// Runs an action.
    Leaf(Box<dyn Behavior>),
}

impl NodeKind {
    pub fn class(&self) -> NodeClass {
        match self {
            NodeKind::Root => NodeClass::Root,
            NodeKind::Sequence => NodeClass::Sequence,
            NodeKind::Selector => NodeClass::Selector,
            NodeKind::Decorator(_) => NodeClass::Decorator,
            NodeKind::Leaf(_) => NodeClass::Leaf,
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Decorator(decorator) => f.debug_tuple("Decorator").field(decorator).finish(),
            other => write!(f, "{:?}", other.class()),
        }
    }
}

/// Payload-free view of [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    Root,
    Sequence,
    Selector,
    Decorator,
    Leaf,
}

impl NodeClass {
    /// Composites own a child list. Decorators are composites limited to one child.
    pub fn is_composite(self) -> bool {
        !matches!(self, NodeClass::Leaf)
    }
}

/// A tree node.
#[derive(Debug)]
pub struct Node {
    pub(crate) token: String,
    pub(crate) kind: NodeKind,
    pub(crate) index: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) params: Vec<String>,
    pub(crate) comment: String,
    pub(crate) status: Status,
}

impl Node {
    pub(crate) fn new(token: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            token: token.into(),
            kind,
            index: 0,
            parent: None,
            children: Vec::new(),
            params: Vec::new(),
            comment: String::new(),
            status: Status::Unprocessed,
        }
    }

    /// DSL token this node was created from (`>`, `?`, `wait`, ...).
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn class(&self) -> NodeClass {
        self.kind.class()
    }

    /// Pre-order position in the tree. The root is 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Owning composite. `None` for the root and for detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in execution priority order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Parameters joined by single spaces.
    pub fn params_text(&self) -> String {
        self.params.join(" ")
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Status from this node's last tick.
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_leaf(&self) -> bool {
        self.class() == NodeClass::Leaf
    }

    pub fn is_composite(&self) -> bool {
        self.class().is_composite()
    }

    pub fn is_decorator(&self) -> bool {
        self.class() == NodeClass::Decorator
    }
}
