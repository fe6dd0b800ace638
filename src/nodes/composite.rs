use rand::Rng;

use super::NodeId;
use crate::{property::NodeProperty, Blackboard, Context, NodeKind, State, Tree};

/// Control-flow policy of a composite node.
#[derive(Clone, Debug)]
pub enum Flow {
    /// Ticks children in order until one fails or runs.
    Sequencer,
    /// Ticks children in order until one succeeds or runs.
    Selector,
    /// Commits to one child picked at random when started.
    RandomSelector,
    /// A selector that rescans from the first child every tick and aborts the
    /// child it leaves behind.
    InterruptSelector,
    /// Ticks every unfinished child each tick.
    Parallel,
    /// Ticks the child at `index`. An interruptable switch follows index
    /// changes while running.
    Switch {
        index: NodeProperty<i32>,
        interruptable: bool,
    },
}

impl Flow {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequencer => "Sequencer",
            Self::Selector => "Selector",
            Self::RandomSelector => "RandomSelector",
            Self::InterruptSelector => "InterruptSelector",
            Self::Parallel => "Parallel",
            Self::Switch { .. } => "Switch",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Composite {
    pub(crate) children: Vec<NodeId>,
    pub(crate) flow: Flow,
    current: usize,
    /// Latest state of each child, used by `Parallel`.
    child_states: Vec<State>,
}

impl Composite {
    pub fn new(flow: Flow) -> Self {
        Self {
            children: vec![],
            flow,
            current: 0,
            child_states: vec![],
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub(crate) fn on_start(&mut self, ctx: &mut Context, blackboard: &Blackboard) {
        self.current = 0;
        match &self.flow {
            Flow::RandomSelector if !self.children.is_empty() => {
                self.current = ctx.rng().gen_range(0..self.children.len());
            }
            Flow::Parallel => {
                self.child_states = vec![State::Running; self.children.len()];
            }
            Flow::Switch { index, .. } => {
                self.current = switch_index(index.value(blackboard));
            }
            _ => {}
        }
    }
}

/// Negative indices map to an out-of-range cursor, which ticks as `Failure`.
fn switch_index(index: i32) -> usize {
    usize::try_from(index).unwrap_or(usize::MAX)
}

impl Tree {
    fn composite(&self, id: NodeId) -> Option<&Composite> {
        match &self.nodes[id.0].kind {
            NodeKind::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    fn composite_mut(&mut self, id: NodeId) -> Option<&mut Composite> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.composite(id)?.children.get(index).copied()
    }

    fn cursor(&self, id: NodeId) -> usize {
        self.composite(id).map_or(0, |composite| composite.current)
    }

    fn set_cursor(&mut self, id: NodeId, current: usize) {
        if let Some(composite) = self.composite_mut(id) {
            composite.current = current;
        }
    }

    pub(crate) fn update_composite(&mut self, id: NodeId, ctx: &mut Context) -> State {
        let Some(composite) = self.composite(id) else {
            return State::Failure;
        };
        match composite.flow {
            Flow::Sequencer => self.tick_in_order(id, ctx, State::Success),
            Flow::Selector => self.tick_in_order(id, ctx, State::Failure),
            Flow::RandomSelector => self.update_random_selector(id, ctx),
            Flow::InterruptSelector => self.update_interrupt_selector(id, ctx),
            Flow::Parallel => self.update_parallel(id, ctx),
            Flow::Switch { .. } => self.update_switch(id, ctx),
        }
    }

    /// Ticks children from the cursor onwards while they return `proceed`.
    /// Any other result is returned at once with the cursor left on that
    /// child; running off the end returns `proceed` itself.
    fn tick_in_order(&mut self, id: NodeId, ctx: &mut Context, proceed: State) -> State {
        let mut current = self.cursor(id);
        while let Some(child) = self.child_at(id, current) {
            self.set_cursor(id, current);
            let state = self.update_node(child, ctx);
            if state != proceed {
                return state;
            }
            current += 1;
        }
        proceed
    }

    fn update_random_selector(&mut self, id: NodeId, ctx: &mut Context) -> State {
        match self.child_at(id, self.cursor(id)) {
            Some(child) => self.update_node(child, ctx),
            None => State::Failure,
        }
    }

    fn update_interrupt_selector(&mut self, id: NodeId, ctx: &mut Context) -> State {
        let previous = self.cursor(id);
        self.set_cursor(id, 0);
        let state = self.tick_in_order(id, ctx, State::Failure);

        if self.cursor(id) != previous {
            if let Some(previous) = self.child_at(id, previous) {
                if self.nodes[previous.0].state == State::Running {
                    self.abort(previous, ctx);
                }
            }
        }
        state
    }

    fn update_parallel(&mut self, id: NodeId, ctx: &mut Context) -> State {
        let mut still_running = false;
        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            if self.child_state(id, index) == State::Running {
                let state = self.update_node(child, ctx);
                self.set_child_state(id, index, state);
                match state {
                    State::Failure => {
                        self.abort_running_children(id, ctx);
                        return State::Failure;
                    }
                    State::Running => still_running = true,
                    State::Success => {}
                }
            }
            index += 1;
        }

        if still_running {
            State::Running
        } else {
            State::Success
        }
    }

    fn child_state(&self, id: NodeId, index: usize) -> State {
        self.composite(id)
            .and_then(|composite| composite.child_states.get(index).copied())
            .unwrap_or(State::Running)
    }

    fn set_child_state(&mut self, id: NodeId, index: usize, state: State) {
        if let Some(slot) = self
            .composite_mut(id)
            .and_then(|composite| composite.child_states.get_mut(index))
        {
            *slot = state;
        }
    }

    fn abort_running_children(&mut self, id: NodeId, ctx: &mut Context) {
        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            if self.child_state(id, index) == State::Running {
                self.abort(child, ctx);
            }
            index += 1;
        }
    }

    fn update_switch(&mut self, id: NodeId, ctx: &mut Context) -> State {
        let (next, interruptable) = match self.composite(id).map(|composite| &composite.flow) {
            Some(Flow::Switch {
                index,
                interruptable,
            }) => (switch_index(index.value(&self.blackboard)), *interruptable),
            _ => return State::Failure,
        };

        let mut current = self.cursor(id);
        if interruptable && next != current {
            if let Some(previous) = self.child_at(id, current) {
                self.abort(previous, ctx);
            }
            current = next;
            self.set_cursor(id, current);
        }

        match self.child_at(id, current) {
            Some(child) => self.update_node(child, ctx),
            None => State::Failure,
        }
    }
}
