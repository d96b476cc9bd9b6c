//! Tree context: the node arena, the variable store and the agent.
//!
//! A [`Tree`] owns every node it ever created, attached or not. Structural
//! edits re-link nodes by [`NodeId`] and re-run the pre-order indexer, which
//! is the single source of truth for node ordering.

use crate::error::{Result, TreeError};
use crate::{
    Agent, Behavior, Node, NodeClass, NodeId, NodeKind, NodeRegistry, Status, TickContext,
    Variables,
};

/// A compiled behavior tree and the state it runs against.
#[derive(Debug)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) current: NodeId,
    pub(crate) order: Vec<NodeId>,
    pub(crate) variables: Variables,
    pub(crate) agent: Agent,
    pub(crate) boot_lines: Vec<String>,
    pub(crate) exits: Vec<NodeId>,
    pub(crate) last_exits: Vec<NodeId>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only its root.
    pub fn new() -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![Node::new("root", NodeKind::Root)],
            root,
            current: root,
            order: vec![root],
            variables: Variables::new(),
            agent: Agent::new(),
            boot_lines: Vec::new(),
            exits: Vec::new(),
            last_exits: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Node at pre-order `index`, if attached.
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.order.get(index).map(|id| &self.nodes[id.0])
    }

    /// Id of the node at pre-order `index`, if attached.
    pub fn id_at(&self, index: usize) -> Option<NodeId> {
        self.order.get(index).copied()
    }

    /// The node the last traversal ended on. The root before the first tick.
    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn current_node(&self) -> &Node {
        &self.nodes[self.current.0]
    }

    /// Attached nodes in pre-order, root first.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of attached nodes, root included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the root has no child.
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.0].children.is_empty()
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    /// Composites that finished during the last traversal, in order. The root
    /// finishes every traversal and comes last.
    pub fn exits(&self) -> &[NodeId] {
        &self.last_exits
    }

    /// Boot-variable lines in source order, kept for stringification.
    pub fn boot_lines(&self) -> &[String] {
        &self.boot_lines
    }

    /// Visits attached nodes in pre-order.
    pub fn traverse(&self, mut visit: impl FnMut(&Node)) {
        for id in &self.order {
            visit(&self.nodes[id.0]);
        }
    }

    /// Resets every node's status to `Unprocessed`.
    pub fn reset_statuses(&mut self) {
        for node in &mut self.nodes {
            node.status = Status::Unprocessed;
        }
    }

    /// Attached node with the highest index whose status is not `Unprocessed`.
    pub fn last_processed(&self) -> Option<&Node> {
        self.order
            .iter()
            .rev()
            .map(|id| &self.nodes[id.0])
            .find(|node| node.status != Status::Unprocessed)
    }

    /// Recomputes pre-order indices over the attached nodes.
    pub fn reindex(&mut self) {
        let mut order = Vec::with_capacity(self.order.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        for (index, id) in order.iter().enumerate() {
            self.nodes[id.0].index = index;
        }
        self.order = order;
    }

    /// Calls [`Behavior::init`] on every attached leaf.
    pub fn init_nodes(&mut self) {
        let order = self.order.clone();
        for id in order {
            self.init_node(id);
        }
    }

    fn init_node(&mut self, id: NodeId) {
        let Tree {
            nodes,
            variables,
            agent,
            ..
        } = self;
        let node = &mut nodes[id.0];
        if let NodeKind::Leaf(behavior) = &mut node.kind {
            let mut ctx = TickContext {
                variables,
                agent,
                index: node.index,
            };
            behavior.init(&mut ctx);
        }
    }

    /// Adds a detached node without initializing it.
    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Links `child` as the last child of `parent` without validation or
    /// reindexing. Used by the compiler, which indexes once at the end.
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    // ---------------------------------------------------------------------
    // Structural edits
    // ---------------------------------------------------------------------

    /// Creates a detached, initialized node from a DSL token.
    pub fn create_node(
        &mut self,
        registry: &NodeRegistry,
        token: &str,
        params: Vec<String>,
        comment: impl Into<String>,
    ) -> Result<NodeId> {
        let kind = registry.instantiate(token, &params)?;
        let mut node = Node::new(token, kind);
        node.params = params;
        node.comment = comment.into();
        let id = self.insert(node);
        self.init_node(id);
        Ok(id)
    }

    /// Appends a detached node (and its subtree) under `parent`.
    pub fn attach(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        if self.get(node)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(node));
        }
        self.check_attach(parent, node)?;
        self.link(parent, node);
        self.reindex();
        tracing::debug!(%node, %parent, "node attached");
        Ok(())
    }

    /// Unlinks a node (and its subtree) from its parent.
    ///
    /// If the current node was inside the detached subtree the current node
    /// falls back to the root.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(TreeError::RootImmovable);
        }
        let parent = self.get(node)?.parent.ok_or(TreeError::NotAttached(node))?;

        self.nodes[parent.0].children.retain(|&child| child != node);
        self.nodes[node.0].parent = None;

        if self.is_within(self.current, node) {
            self.current = self.root;
        }
        self.reindex();
        tracing::debug!(%node, %parent, "node detached");
        Ok(())
    }

    /// Moves an attached node under `new_parent`, appended last.
    pub fn move_to(&mut self, node: NodeId, new_parent: NodeId) -> Result<()> {
        if node == self.root {
            return Err(TreeError::RootImmovable);
        }
        if self.get(node)?.parent.is_none() {
            return Err(TreeError::NotAttached(node));
        }
        self.check_attach(new_parent, node)?;
        self.detach(node)?;
        self.attach(new_parent, node)
    }

    /// Swaps a node with its previous sibling. Returns `false` when it is
    /// already first.
    pub fn swap_with_previous(&mut self, node: NodeId) -> Result<bool> {
        self.swap_sibling(node, -1)
    }

    /// Swaps a node with its next sibling. Returns `false` when it is
    /// already last.
    pub fn swap_with_next(&mut self, node: NodeId) -> Result<bool> {
        self.swap_sibling(node, 1)
    }

    fn swap_sibling(&mut self, node: NodeId, offset: isize) -> Result<bool> {
        let parent = self.get(node)?.parent.ok_or(TreeError::NotAttached(node))?;
        let siblings = &mut self.nodes[parent.0].children;
        let Some(position) = siblings.iter().position(|&child| child == node) else {
            return Err(TreeError::NotAttached(node));
        };
        let Some(other) = position
            .checked_add_signed(offset)
            .filter(|&other| other < siblings.len())
        else {
            return Ok(false);
        };
        siblings.swap(position, other);
        self.reindex();
        Ok(true)
    }

    /// Replaces a node's parameters, rebuilding its behavior from the
    /// registry. Children and links are kept.
    pub fn set_params(
        &mut self,
        registry: &NodeRegistry,
        node: NodeId,
        params: Vec<String>,
    ) -> Result<()> {
        let token = self.get(node)?.token.clone();
        let kind = registry.instantiate(&token, &params)?;
        if kind.class() != self.nodes[node.0].class() {
            return Err(TreeError::InvalidParams {
                token,
                reason: "parameters change the node class".to_string(),
            });
        }
        let entry = &mut self.nodes[node.0];
        entry.kind = kind;
        entry.params = params;
        self.init_node(node);
        Ok(())
    }

    pub fn set_comment(&mut self, node: NodeId, comment: impl Into<String>) -> Result<()> {
        self.get(node)?;
        self.nodes[node.0].comment = comment.into();
        Ok(())
    }

    /// Checks that `node` may become a child of `parent`, ignoring whether
    /// `node` is currently attached elsewhere.
    fn check_attach(&self, parent: NodeId, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(TreeError::RootImmovable);
        }
        let target = self.get(parent)?;
        match target.class() {
            NodeClass::Leaf => return Err(TreeError::ParentIsLeaf(parent)),
            NodeClass::Root if !target.children.is_empty() => {
                return Err(TreeError::RootOccupied);
            }
            NodeClass::Decorator if !target.children.is_empty() => {
                return Err(TreeError::DecoratorOccupied(parent));
            }
            _ => {}
        }
        if self.is_within(parent, node) {
            return Err(TreeError::Cycle { node, parent });
        }
        Ok(())
    }

    /// True if `node` is `ancestor` or one of its descendants.
    fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes[id.0].parent;
        }
        false
    }

    /// Nesting depth of an attached node. The root is 0.
    pub fn depth(&self, node: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.nodes.get(node.0).and_then(|n| n.parent);
        while let Some(id) = cursor {
            depth += 1;
            cursor = self.nodes[id.0].parent;
        }
        depth
    }

    // ---------------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------------

    /// Renders the tree back to DSL text.
    pub fn stringify(&self) -> String {
        let mut out = String::new();
        for &id in self.order.iter().skip(1) {
            let node = &self.nodes[id.0];
            out.push_str(&"-".repeat(self.depth(id)));
            out.push_str(&node.token);
            if !node.comment.is_empty() {
                out.push_str(" [");
                out.push_str(&node.comment);
                out.push(']');
            }
            for param in &node.params {
                out.push(' ');
                out.push_str(param);
            }
            out.push('\n');
        }
        for line in &self.boot_lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NodeRegistry {
        NodeRegistry::with_defaults()
    }

    fn node(tree: &mut Tree, token: &str) -> NodeId {
        tree.create_node(&registry(), token, Vec::new(), "").unwrap()
    }

    #[test]
    fn new_tree_is_root_only() {
        let tree = Tree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.current(), tree.root());
        assert_eq!(tree.node_at(0).unwrap().class(), NodeClass::Root);
    }

    #[test]
    fn attach_reindexes_in_pre_order() {
        let mut tree = Tree::new();
        let seq = node(&mut tree, ">");
        let a = node(&mut tree, "succeed");
        let b = node(&mut tree, "fail");
        tree.attach(tree.root(), seq).unwrap();
        tree.attach(seq, a).unwrap();
        tree.attach(seq, b).unwrap();

        let indices: Vec<usize> = [seq, a, b]
            .iter()
            .map(|id| tree.node(*id).unwrap().index())
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);

        tree.swap_with_next(a).unwrap();
        assert_eq!(tree.node(b).unwrap().index(), 2);
        assert_eq!(tree.node(a).unwrap().index(), 3);
        assert!(!tree.swap_with_next(a).unwrap());
    }

    #[test]
    fn invalid_attachments_are_rejected() {
        let mut tree = Tree::new();
        let inv = node(&mut tree, "invertify");
        let leaf = node(&mut tree, "succeed");
        let other = node(&mut tree, "fail");
        tree.attach(tree.root(), inv).unwrap();
        tree.attach(inv, leaf).unwrap();

        assert!(matches!(
            tree.attach(inv, other),
            Err(TreeError::DecoratorOccupied(_))
        ));
        assert!(matches!(
            tree.attach(leaf, other),
            Err(TreeError::ParentIsLeaf(_))
        ));
        assert!(matches!(
            tree.attach(tree.root(), other),
            Err(TreeError::RootOccupied)
        ));
        assert!(matches!(
            tree.attach(inv, leaf),
            Err(TreeError::AlreadyAttached(_))
        ));
        assert!(matches!(tree.detach(tree.root()), Err(TreeError::RootImmovable)));
    }

    #[test]
    fn move_into_own_subtree_is_a_cycle() {
        let mut tree = Tree::new();
        let outer = node(&mut tree, "?");
        let inner = node(&mut tree, ">");
        tree.attach(tree.root(), outer).unwrap();
        tree.attach(outer, inner).unwrap();

        assert!(matches!(
            tree.move_to(outer, inner),
            Err(TreeError::Cycle { .. })
        ));
        // Rejected edits leave the tree untouched.
        assert_eq!(tree.node(inner).unwrap().parent(), Some(outer));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn detaching_current_subtree_resets_current() {
        let mut tree = Tree::new();
        let seq = node(&mut tree, ">");
        let leaf = node(&mut tree, "running");
        tree.attach(tree.root(), seq).unwrap();
        tree.attach(seq, leaf).unwrap();

        tree.tick();
        assert_eq!(tree.current(), leaf);

        tree.detach(seq).unwrap();
        assert_eq!(tree.current(), tree.root());
        assert_eq!(tree.len(), 1);
        assert!(tree.node(leaf).is_some());
    }

    #[test]
    fn stringify_renders_depth_comment_and_params() {
        let mut tree = Tree::new();
        let reg = registry();
        let seq = tree.create_node(&reg, ">", Vec::new(), "main loop").unwrap();
        let wait = tree
            .create_node(&reg, "wait", vec!["0.5".into(), "Skip".into()], "")
            .unwrap();
        tree.attach(tree.root(), seq).unwrap();
        tree.attach(seq, wait).unwrap();

        assert_eq!(tree.stringify(), "-> [main loop]\n--wait 0.5 Skip\n");
    }

    #[test]
    fn set_params_keeps_class() {
        let mut tree = Tree::new();
        let reg = registry();
        let wait = tree.create_node(&reg, "wait", vec!["1".into()], "").unwrap();
        tree.set_params(&reg, wait, vec!["2".into()]).unwrap();
        assert_eq!(tree.node(wait).unwrap().params_text(), "2");
        tree.set_comment(wait, "slower").unwrap();
        assert_eq!(tree.node(wait).unwrap().comment(), "slower");
    }
}
