use std::fmt::Debug;

use crate::{Blackboard, Context, State};

/// A leaf node with user defined behavior.
///
/// Only `on_update` is required. `on_init` runs once when the tree instance
/// is bound to a context; a node that finds a collaborator missing there
/// should remember it and report [`State::Failure`] from `on_update`.
pub trait ActionNode: ActionClone + Debug {
    fn name(&self) -> &str {
        "Action"
    }

    fn on_init(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) {}

    fn on_start(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) {}

    fn on_update(&mut self, ctx: &mut Context, blackboard: &mut Blackboard) -> State;

    fn on_stop(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) {}
}

/// Object safe clone, so that a tree holding boxed actions can be cloned into
/// runtime instances. Implemented for every `Clone` action.
pub trait ActionClone {
    fn clone_box(&self) -> Box<dyn ActionNode>;
}

impl<T> ActionClone for T
where
    T: ActionNode + Clone + 'static,
{
    fn clone_box(&self) -> Box<dyn ActionNode> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn ActionNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
