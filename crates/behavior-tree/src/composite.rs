//! Tick and abort protocol.
//!
//! Composite nodes control the execution flow of their children:
//! [`NodeKind::Sequence`] (AND logic) and [`NodeKind::Selector`] (OR logic).
//! The root ticks its single child, decorators wrap theirs, and leaves call
//! into their [`Behavior`].
//!
//! While ticking, the tree records the node the traversal ended on (the
//! *current node*) and queues an exit notification whenever a composite
//! finishes. Notifications are dispatched to decorators once the traversal
//! is over.

use crate::decorator::ExitScope;
use crate::{Behavior, NodeClass, NodeId, NodeKind, Status, TickContext, Tree};

impl Tree {
    /// Runs one traversal from the root.
    pub fn tick(&mut self) -> Status {
        let status = self.tick_node(self.root);
        self.dispatch_exits();
        status
    }

    /// Propagates an abort from the root.
    pub fn abort(&mut self, index: usize) {
        tracing::debug!(index, "abort");
        self.abort_node(self.root, index);
    }

    fn tick_node(&mut self, id: NodeId) -> Status {
        let status = match self.nodes[id.0].class() {
            NodeClass::Root => self.tick_root(id),
            NodeClass::Sequence => self.tick_sequence(id),
            NodeClass::Selector => self.tick_selector(id),
            NodeClass::Decorator => self.tick_decorator(id),
            NodeClass::Leaf => self.tick_leaf(id),
        };
        self.nodes[id.0].status = status;
        status
    }

    fn child(&self, id: NodeId, position: usize) -> Option<NodeId> {
        self.nodes[id.0].children.get(position).copied()
    }

    fn tick_root(&mut self, id: NodeId) -> Status {
        if let Some(child) = self.child(id, 0) {
            self.tick_node(child);
        }
        self.exits.push(id);
        Status::Running
    }

    /// Ticks children in order until one does not succeed.
    ///
    /// A running child becomes the current node. When every child succeeds
    /// the sequence itself becomes current.
    fn tick_sequence(&mut self, id: NodeId) -> Status {
        let mut position = 0;
        while let Some(child) = self.child(id, position) {
            match self.tick_node(child) {
                Status::Success => position += 1,
                Status::Running => {
                    self.current = child;
                    return Status::Running;
                }
                Status::Failure => {
                    self.exits.push(id);
                    return Status::Failure;
                }
                other => return other,
            }
        }
        self.exits.push(id);
        self.current = id;
        Status::Success
    }

    /// Ticks children in order until one does not fail.
    ///
    /// The first succeeding or running child becomes the current node. When
    /// every child fails the selector itself becomes current.
    fn tick_selector(&mut self, id: NodeId) -> Status {
        let mut position = 0;
        while let Some(child) = self.child(id, position) {
            let status = self.tick_node(child);
            if matches!(status, Status::Success | Status::Running) {
                self.current = child;
                if status.is_success() {
                    self.exits.push(id);
                }
                return status;
            }
            position += 1;
        }
        self.current = id;
        self.exits.push(id);
        Status::Failure
    }

    fn tick_decorator(&mut self, id: NodeId) -> Status {
        let Some(child) = self.child(id, 0) else {
            return Status::Success;
        };
        let latched = match &self.nodes[id.0].kind {
            NodeKind::Decorator(decorator) => decorator.latched(),
            _ => None,
        };
        if let Some(status) = latched {
            return status;
        }

        let child_status = self.tick_node(child);

        let NodeKind::Decorator(decorator) = &mut self.nodes[id.0].kind else {
            return child_status;
        };
        let outcome = decorator.finish(child_status);
        if outcome.restart_child {
            self.abort_node(child, 0);
        }
        outcome.status
    }

    fn tick_leaf(&mut self, id: NodeId) -> Status {
        let Tree {
            nodes,
            variables,
            agent,
            ..
        } = self;
        let node = &mut nodes[id.0];
        let NodeKind::Leaf(behavior) = &mut node.kind else {
            return Status::Failure;
        };
        let mut ctx = TickContext {
            variables,
            agent,
            index: node.index,
        };
        behavior.tick(&mut ctx)
    }

    /// Resets the subtree under `id` for an abort issued at `index`.
    ///
    /// When `index` lies before the composite every child is reset.
    /// Otherwise only earlier children and nested composites are. Children
    /// receive the composite's own index, so everything below a reset
    /// composite is reset as well.
    fn abort_node(&mut self, id: NodeId, index: usize) {
        if self.nodes[id.0].is_leaf() {
            self.abort_leaf(id);
            return;
        }
        let own_index = self.nodes[id.0].index;
        match &mut self.nodes[id.0].kind {
            NodeKind::Decorator(decorator) if index < own_index => decorator.reset(),
            _ => {}
        }

        let mut position = 0;
        while let Some(child) = self.child(id, position) {
            let target = &self.nodes[child.0];
            if index < own_index || target.index < own_index || target.is_composite() {
                self.abort_node(child, own_index);
            }
            position += 1;
        }
    }

    fn abort_leaf(&mut self, id: NodeId) {
        let Tree {
            nodes,
            variables,
            agent,
            ..
        } = self;
        let node = &mut nodes[id.0];
        if let NodeKind::Leaf(behavior) = &mut node.kind {
            tracing::trace!(index = node.index, token = %node.token, "leaf aborted");
            let mut ctx = TickContext {
                variables,
                agent,
                index: node.index,
            };
            behavior.abort(&mut ctx);
        }
    }

    /// Delivers queued exit notifications to the decorators that listen for
    /// them: Gate listens to its parent, RowReset to the root.
    fn dispatch_exits(&mut self) {
        let exits = std::mem::take(&mut self.exits);
        let current_index = self.nodes[self.current.0].index;
        let root = self.root;

        let Tree { nodes, order, .. } = self;
        for &exit in &exits {
            for id in order.iter() {
                let node = &mut nodes[id.0];
                let scope = ExitScope {
                    from_parent: node.parent == Some(exit),
                    from_root: exit == root,
                    own_index: node.index,
                    current_index,
                };
                if let NodeKind::Decorator(decorator) = &mut node.kind {
                    decorator.on_exit(scope);
                }
            }
        }
        self.last_exits = exits;
    }
}
