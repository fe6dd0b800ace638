mod action;
pub mod actions;
mod composite;
mod decorator;
mod subtree;

pub use self::action::{ActionClone, ActionNode};
pub use self::composite::{Composite, Flow};
pub use self::decorator::{Decorator, Effect, Repeat};
pub use self::subtree::SubTree;

use crate::{property::NodeProperty, Context, State, Tree};

/// Index of a node in the arena of its tree. Clones of a tree keep the same
/// ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Root(Option<NodeId>),
    Composite(Composite),
    Decorator(Decorator),
    Action(Box<dyn ActionNode>),
    SubTree(SubTree),
}

#[derive(Clone, Debug)]
pub struct Node {
    guid: String,
    pub description: String,
    pub draw_gizmos: bool,
    pub(crate) state: State,
    pub(crate) started: bool,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            guid: uuid::Uuid::new_v4().to_string(),
            description: String::new(),
            draw_gizmos: false,
            state: State::Running,
            started: false,
            kind,
        }
    }

    pub fn root() -> Self {
        Self::new(NodeKind::Root(None))
    }

    pub fn sequencer() -> Self {
        Self::new(NodeKind::Composite(Composite::new(Flow::Sequencer)))
    }

    pub fn selector() -> Self {
        Self::new(NodeKind::Composite(Composite::new(Flow::Selector)))
    }

    pub fn random_selector() -> Self {
        Self::new(NodeKind::Composite(Composite::new(Flow::RandomSelector)))
    }

    pub fn interrupt_selector() -> Self {
        Self::new(NodeKind::Composite(Composite::new(Flow::InterruptSelector)))
    }

    pub fn parallel() -> Self {
        Self::new(NodeKind::Composite(Composite::new(Flow::Parallel)))
    }

    pub fn switch(index: NodeProperty<i32>, interruptable: bool) -> Self {
        Self::new(NodeKind::Composite(Composite::new(Flow::Switch {
            index,
            interruptable,
        })))
    }

    pub fn decorator(effect: Effect) -> Self {
        Self::new(NodeKind::Decorator(Decorator::new(effect)))
    }

    pub fn inverter() -> Self {
        Self::decorator(Effect::Inverter)
    }

    pub fn action(action: impl ActionNode + 'static) -> Self {
        Self::new(NodeKind::Action(Box::new(action)))
    }

    pub fn sub_tree(tree: impl Into<String>) -> Self {
        Self::new(NodeKind::SubTree(SubTree::new(tree)))
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Human readable name of the node type, for diagnostics.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            NodeKind::Root(_) => "Root",
            NodeKind::Composite(composite) => composite.flow.name(),
            NodeKind::Decorator(decorator) => decorator.effect.name(),
            NodeKind::Action(action) => action.name(),
            NodeKind::SubTree(_) => "SubTree",
        }
    }
}

/// Lifecycle of a single node: `on_start` once per episode, `on_update` every
/// tick, `on_stop` when the node reaches a terminal state or is aborted.
impl Tree {
    pub(crate) fn update_node(&mut self, id: NodeId, ctx: &mut Context) -> State {
        if !self.nodes[id.0].started {
            self.on_start(id, ctx);
            self.nodes[id.0].started = true;
        }

        let state = self.on_update(id, ctx);
        self.nodes[id.0].state = state;

        if state != State::Running {
            self.on_stop(id, ctx);
            self.nodes[id.0].started = false;
        }
        state
    }

    /// Cancels the subtree under `id`. Every visited node is left as if it had
    /// never started and gets exactly one `on_stop` call, running or not.
    pub fn abort(&mut self, id: NodeId, ctx: &mut Context) {
        for id in self.descendants(id) {
            let node = &mut self.nodes[id.0];
            node.started = false;
            node.state = State::Running;
            self.on_stop(id, ctx);
        }
    }

    fn on_start(&mut self, id: NodeId, ctx: &mut Context) {
        let Tree {
            nodes, blackboard, ..
        } = self;
        match &mut nodes[id.0].kind {
            NodeKind::Root(_) | NodeKind::SubTree(_) => {}
            NodeKind::Composite(composite) => composite.on_start(ctx, blackboard),
            NodeKind::Decorator(decorator) => decorator.on_start(ctx),
            NodeKind::Action(action) => action.on_start(ctx, blackboard),
        }
    }

    fn on_update(&mut self, id: NodeId, ctx: &mut Context) -> State {
        match self.nodes[id.0].kind {
            NodeKind::Root(child) => match child {
                Some(child) => self.update_node(child, ctx),
                None => State::Failure,
            },
            NodeKind::Composite(_) => self.update_composite(id, ctx),
            NodeKind::Decorator(_) => self.update_decorator(id, ctx),
            NodeKind::SubTree(_) => self.update_subtree(id, ctx),
            NodeKind::Action(_) => {
                let Tree {
                    nodes, blackboard, ..
                } = self;
                match &mut nodes[id.0].kind {
                    NodeKind::Action(action) => action.on_update(ctx, blackboard),
                    _ => State::Failure,
                }
            }
        }
    }

    fn on_stop(&mut self, id: NodeId, ctx: &mut Context) {
        let Tree {
            nodes, blackboard, ..
        } = self;
        match &mut nodes[id.0].kind {
            NodeKind::Action(action) => action.on_stop(ctx, blackboard),
            NodeKind::SubTree(subtree) => subtree.on_stop(ctx),
            NodeKind::Root(_) | NodeKind::Composite(_) | NodeKind::Decorator(_) => {}
        }
    }
}

#[cfg(test)]
mod test;
