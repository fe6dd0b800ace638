use std::ops::Index;

use tracing::debug;

use crate::{
    blackboard::{BlackboardType, Key},
    error::{AddChildError, AddChildResult, BlackboardError},
    library::TreeLibrary,
    symbol::Symbol,
    validate::TreeStack,
    Blackboard, Context, Node, NodeId, NodeKind, State,
};

/// A behavior tree: an arena of nodes under a single root, plus the
/// blackboard they share.
///
/// The same type serves as the read-only template and as a runtime instance.
/// `clone` is a deep copy, so instances never share node state or keys.
#[derive(Clone, Debug)]
pub struct Tree {
    name: String,
    pub(crate) root: NodeId,
    pub(crate) nodes: Vec<Node>,
    pub(crate) blackboard: Blackboard,
    pub(crate) state: State,
    bound: bool,
}

impl Tree {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_root(name, Node::root())
    }

    pub(crate) fn with_root(name: impl Into<String>, root: Node) -> Self {
        Self {
            name: name.into(),
            root: NodeId(0),
            nodes: vec![root],
            blackboard: Blackboard::new(),
            state: State::Running,
            bound: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Result of the last tick of the root, `Running` until it finishes.
    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_guid(&self, guid: &str) -> Option<NodeId> {
        self.nodes().find(|(_, node)| node.guid() == guid).map(|(id, _)| id)
    }

    /// Declares a blackboard key on this tree.
    pub fn add_key<T: BlackboardType>(
        &mut self,
        name: impl Into<Symbol>,
        value: T,
    ) -> Result<Key<T>, BlackboardError> {
        self.blackboard.add(name, value)
    }

    /// Adds a node to the arena without a parent.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Adds `node` and attaches it under `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> AddChildResult<NodeId> {
        self.check_child_slot(parent)?;
        let id = self.add_node(node);
        self.attach(parent, id)?;
        Ok(id)
    }

    /// Makes `child` the next child of `parent`. A node can have only one
    /// parent, the root can't be anybody's child and a node can't go under
    /// its own descendant.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> AddChildResult {
        if child.0 >= self.nodes.len() {
            return Err(AddChildError::InvalidNode);
        }
        if child == self.root || child == parent || self.parent(child).is_some() {
            return Err(AddChildError::AlreadyAttached);
        }
        self.check_child_slot(parent)?;
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(AddChildError::Cycle);
            }
            ancestor = self.parent(id);
        }

        match &mut self.nodes[parent.0].kind {
            NodeKind::Root(slot) => *slot = Some(child),
            NodeKind::Decorator(decorator) => decorator.child = Some(child),
            NodeKind::Composite(composite) => composite.children.push(child),
            NodeKind::Action(_) | NodeKind::SubTree(_) => return Err(AddChildError::NoChildSlot),
        }
        Ok(())
    }

    fn check_child_slot(&self, parent: NodeId) -> AddChildResult {
        match self.nodes.get(parent.0).map(Node::kind) {
            None => Err(AddChildError::InvalidNode),
            Some(NodeKind::Root(Some(_))) => Err(AddChildError::TooManyNodes),
            Some(NodeKind::Decorator(decorator)) if decorator.child.is_some() => {
                Err(AddChildError::TooManyNodes)
            }
            Some(NodeKind::Action(_) | NodeKind::SubTree(_)) => Err(AddChildError::NoChildSlot),
            Some(_) => Ok(()),
        }
    }

    pub fn parent(&self, child: NodeId) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|&id| self.children(id).contains(&child))
    }

    /// Drops every node the root doesn't reach and renumbers the rest, keeping
    /// their order. Returns the number of nodes removed.
    pub(crate) fn retain_reachable(&mut self) -> usize {
        let reachable = self.descendants(self.root);
        if reachable.len() == self.nodes.len() {
            return 0;
        }
        let mut remap = vec![None; self.nodes.len()];
        let mut kept = vec![false; self.nodes.len()];
        for id in &reachable {
            kept[id.0] = true;
        }
        let mut next = 0;
        for (old, keep) in kept.iter().enumerate() {
            if *keep {
                remap[old] = Some(NodeId(next));
                next += 1;
            }
        }

        let removed = self.nodes.len() - next;
        let nodes = std::mem::take(&mut self.nodes);
        let map = |id: NodeId| remap[id.0].unwrap_or(id);
        self.nodes = nodes
            .into_iter()
            .zip(kept)
            .filter_map(|(node, keep)| keep.then_some(node))
            .map(|mut node| {
                match &mut node.kind {
                    NodeKind::Root(child) => *child = child.map(map),
                    NodeKind::Decorator(decorator) => decorator.child = decorator.child.map(map),
                    NodeKind::Composite(composite) => {
                        for child in &mut composite.children {
                            *child = map(*child);
                        }
                    }
                    NodeKind::Action(_) | NodeKind::SubTree(_) => {}
                }
                node
            })
            .collect();
        self.root = map(self.root);
        removed
    }

    /// Children of a node in evaluation order: one for the root and
    /// decorators, the list of a composite, none for anything else.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id.0).map(Node::kind) {
            Some(NodeKind::Root(child)) => child.as_slice(),
            Some(NodeKind::Decorator(decorator)) => decorator.child.as_slice(),
            Some(NodeKind::Composite(composite)) => &composite.children,
            _ => &[],
        }
    }

    /// Ids of `id` and all of its descendants in pre-order. Ids outside the
    /// arena are skipped.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut ret = vec![];
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if id.0 >= self.nodes.len() {
                continue;
            }
            ret.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        ret
    }

    /// Visits `id` and then its descendants, pre-order.
    pub fn traverse(&self, id: NodeId, mut visit: impl FnMut(NodeId, &Node)) {
        for id in self.descendants(id) {
            visit(id, &self.nodes[id.0]);
        }
    }

    /// Ticks the root while the tree is running. Once the root reports a
    /// terminal state the tree keeps returning it until [`Tree::reset`].
    pub fn update(&mut self, ctx: &mut Context) -> State {
        if self.state == State::Running {
            self.state = self.update_node(self.root, ctx);
        }
        self.state
    }

    /// Aborts whatever is running and lets the next `update` start over.
    pub fn reset(&mut self, ctx: &mut Context) {
        self.abort(self.root, ctx);
        self.state = State::Running;
    }

    /// Runs `on_init` of every node reachable from the root and instantiates
    /// sub-tree references from `library`.
    pub fn bind(&mut self, ctx: &mut Context, library: &TreeLibrary) {
        let name = self.name.clone();
        self.bind_recurse(ctx, library, &TreeStack::new(&name));
    }

    pub(crate) fn bind_recurse(
        &mut self,
        ctx: &mut Context,
        library: &TreeLibrary,
        stack: &TreeStack,
    ) {
        for id in self.descendants(self.root) {
            let Tree {
                nodes, blackboard, ..
            } = self;
            match &mut nodes[id.0].kind {
                NodeKind::Action(action) => action.on_init(ctx, blackboard),
                NodeKind::SubTree(subtree) => subtree.instantiate(ctx, library, stack),
                _ => {}
            }
        }
        self.bound = true;
        debug!(tree = %self.name, nodes = self.nodes.len(), "Bound tree");
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}
