//! Index-stable arena holding the expression tree.
//!
//! Nodes are never freed while the tree is alive: "update in place" rewrites
//! the fields of a fixed slot, so every [`NodeId`] handed out stays valid and
//! parent links (plain ids, non-owning) cannot dangle. Children lists are the
//! only ownership edges; a node dropped from every children list is simply
//! detached (`parent == None`).

use std::sync::Arc;

use tracing::{trace, warn};

use super::node::{Child, Leaf, Metadata, NodeId, NodeKind};

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    children: Vec<Child>,
    parent: Option<NodeId>,
    index: usize,
    metadata: Option<Arc<Metadata>>,
}

/// An expression tree with a single root.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Ast {
    /// Creates a tree whose root is a fresh node with the given shape.
    ///
    /// Node children must refer to nodes of this tree, so callers usually start
    /// from a placeholder root and build bottom-up with [`Ast::add_node`]
    /// followed by [`Ast::set_children`] on the root.
    pub fn new(kind: NodeKind, metadata: Option<Arc<Metadata>>) -> Self {
        let mut ast = Ast { nodes: Vec::new(), root: NodeId(0) };
        ast.root = ast.add_node(kind, Vec::new(), metadata);
        ast
    }

    /// Allocates a detached node and attaches the given children to it.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        children: Vec<Child>,
        metadata: Option<Arc<Metadata>>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            children: Vec::new(),
            parent: None,
            index: 0,
            metadata,
        });
        self.set_children(id, children);
        id
    }

    /// Shorthand for a leaf-only node, handy when building fixtures.
    pub fn leaf_node(&mut self, kind: NodeKind, leaves: Vec<Leaf>) -> NodeId {
        self.add_node(kind, leaves.into_iter().map(Child::Leaf).collect(), None)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Replaces the root, detaching the new root from any former parent.
    pub fn set_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = id;
    }

    /// Number of allocated slots, including detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[Child] {
        &self.nodes[id.0].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<&Child> {
        self.nodes[id.0].children.get(index)
    }

    /// Node-valued children of `id`, in order.
    pub fn child_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0].children.iter().filter_map(Child::as_node).collect()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Position of `id` in its parent's children.
    pub fn index(&self, id: NodeId) -> usize {
        self.nodes[id.0].index
    }

    pub fn metadata(&self, id: NodeId) -> Option<&Arc<Metadata>> {
        self.nodes[id.0].metadata.as_ref()
    }

    pub fn set_metadata(&mut self, id: NodeId, metadata: Option<Arc<Metadata>>) {
        self.nodes[id.0].metadata = metadata;
    }

    /// Retags `id` and, when `children` is given, replaces its children.
    /// Metadata and node identity are preserved.
    pub fn update(&mut self, id: NodeId, kind: NodeKind, children: Option<Vec<Child>>) {
        trace!("update {} {} -> {}", id, self.nodes[id.0].kind, kind);
        self.nodes[id.0].kind = kind;
        if let Some(children) = children {
            self.set_children(id, children);
        }
    }

    pub fn retag(&mut self, id: NodeId, kind: NodeKind) {
        self.update(id, kind, None);
    }

    /// Replaces all children of `id`, re-parenting the new ones and detaching
    /// node children that did not survive.
    pub fn set_children(&mut self, id: NodeId, children: Vec<Child>) {
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in old.iter().filter_map(Child::as_node) {
            if self.nodes[child.0].parent == Some(id) {
                self.nodes[child.0].parent = None;
            }
        }
        for child in children.iter().filter_map(Child::as_node) {
            debug_assert!(child != id, "node {} cannot be its own child", id);
            self.detach(child);
        }
        self.nodes[id.0].children = children;
        self.reindex(id);
    }

    /// Appends children to `id`, re-parenting node children.
    pub fn push_children(&mut self, id: NodeId, children: Vec<Child>) {
        for child in children.iter().filter_map(Child::as_node) {
            self.detach(child);
        }
        self.nodes[id.0].children.extend(children);
        self.reindex(id);
    }

    /// Removes and returns the children of `id` from position `at` onward.
    /// Removed nodes are left detached.
    pub fn split_off_children(&mut self, id: NodeId, at: usize) -> Vec<Child> {
        let tail = self.nodes[id.0].children.split_off(at);
        for child in tail.iter().filter_map(Child::as_node) {
            self.nodes[child.0].parent = None;
        }
        tail
    }

    /// Overwrites a single child slot, returning the previous occupant.
    pub fn replace_child(&mut self, parent: NodeId, index: usize, child: Child) -> Child {
        if let Child::Node(new) = child {
            self.detach(new);
        }
        let old = std::mem::replace(&mut self.nodes[parent.0].children[index], child);
        if let Child::Node(old) = old {
            if self.nodes[old.0].parent == Some(parent) {
                self.nodes[old.0].parent = None;
            }
        }
        if let Child::Node(new) = self.nodes[parent.0].children[index] {
            self.nodes[new.0].parent = Some(parent);
            self.nodes[new.0].index = index;
        }
        old
    }

    /// Logically negates the flag stored in slot 0 of `parent`.
    ///
    /// The flag takes the boolean value opposite to its truthiness. A node
    /// sitting in the slot is displaced (and left detached).
    pub fn negate_flag(&mut self, parent: NodeId) {
        let Some(current) = self.nodes[parent.0].children.first() else {
            panic!("{} {} has no flag slot to negate", self.kind(parent), parent);
        };
        if let Child::Node(displaced) = current {
            warn!(
                "negating {} flag slot that holds node {} {}",
                self.kind(parent),
                displaced,
                self.kind(*displaced)
            );
        }
        let negated = Child::bool(!current.truthy());
        self.replace_child(parent, 0, negated);
    }

    /// Replaces every direct `expand` child of `id` by that child's own
    /// children, in place. Returns whether anything was spliced.
    pub fn splice_expanded(&mut self, id: NodeId) -> bool {
        let has_expand = self.nodes[id.0]
            .children
            .iter()
            .any(|c| matches!(c, Child::Node(n) if self.nodes[n.0].kind == NodeKind::Expand));
        if !has_expand {
            return false;
        }

        let old = std::mem::take(&mut self.nodes[id.0].children);
        let mut spliced = Vec::with_capacity(old.len() + 1);
        for child in old {
            match child {
                Child::Node(n) if self.nodes[n.0].kind == NodeKind::Expand => {
                    trace!("splicing {} into {}", n, id);
                    self.nodes[n.0].parent = None;
                    spliced.extend(std::mem::take(&mut self.nodes[n.0].children));
                }
                other => spliced.push(other),
            }
        }
        self.nodes[id.0].children = spliced;
        self.reindex(id);
        true
    }

    /// Splices every `expand` node reachable from the root into its parent,
    /// bottom-up. An `expand` root has no parent and is left as is.
    pub fn splice_all(&mut self) {
        let mut stack = vec![(self.root, false)];
        while let Some((id, children_done)) = stack.pop() {
            if children_done {
                self.splice_expanded(id);
            } else {
                stack.push((id, true));
                for child in self.child_nodes(id) {
                    stack.push((child, false));
                }
            }
        }
    }

    /// Node ids reachable from the root in pre-order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.nodes[id.0].children.iter().rev().filter_map(Child::as_node) {
                stack.push(child);
            }
        }
        out
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            let index = self.nodes[id.0].index;
            let slot = &mut self.nodes[parent.0].children;
            if slot.get(index) == Some(&Child::Node(id)) {
                slot.remove(index);
                self.reindex(parent);
            }
        }
    }

    fn reindex(&mut self, id: NodeId) {
        for index in 0..self.nodes[id.0].children.len() {
            if let Child::Node(child) = self.nodes[id.0].children[index] {
                let data = &mut self.nodes[child.0];
                data.parent = Some(id);
                data.index = index;
            }
        }
    }
}
