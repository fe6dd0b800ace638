use super::NodeId;
use crate::{property::NodeProperty, Context, NodeKind, State, Tree};

#[derive(Clone, Debug)]
pub struct Repeat {
    pub restart_on_success: bool,
    pub restart_on_failure: bool,
    /// Zero repeats forever.
    pub max_repeats: u32,
    iterations: u32,
}

impl Default for Repeat {
    fn default() -> Self {
        Self::new(true, false, 0)
    }
}

impl Repeat {
    pub fn new(restart_on_success: bool, restart_on_failure: bool, max_repeats: u32) -> Self {
        Self {
            restart_on_success,
            restart_on_failure,
            max_repeats,
            iterations: 0,
        }
    }

    fn filter(&mut self, state: State) -> State {
        let restart = match state {
            State::Running => return State::Running,
            State::Success => self.restart_on_success,
            State::Failure => self.restart_on_failure,
        };
        if !restart {
            return state;
        }
        if self.max_repeats == 0 {
            return State::Running;
        }
        self.iterations += 1;
        if self.max_repeats > 0 && self.iterations >= self.max_repeats {
            state
        } else {
            State::Running
        }
    }
}

/// What a decorator does to its child's result.
#[derive(Clone, Debug)]
pub enum Effect {
    Inverter,
    ForceSuccess,
    ForceFailure,
    Repeat(Repeat),
    /// Restarts a failing child until it has failed `attempts` times.
    Retry { attempts: u32, failures: u32 },
    /// Fails, aborting the child, once `duration` seconds have passed since
    /// the decorator started.
    Timeout {
        duration: NodeProperty<f32>,
        started_at: f64,
    },
}

impl Effect {
    pub fn retry(attempts: u32) -> Self {
        Self::Retry {
            attempts,
            failures: 0,
        }
    }

    pub fn timeout(duration: NodeProperty<f32>) -> Self {
        Self::Timeout {
            duration,
            started_at: 0.,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Inverter => "Inverter",
            Self::ForceSuccess => "ForceSuccess",
            Self::ForceFailure => "ForceFailure",
            Self::Repeat(_) => "Repeat",
            Self::Retry { .. } => "Retry",
            Self::Timeout { .. } => "Timeout",
        }
    }

    fn filter(&mut self, state: State) -> State {
        match self {
            Self::Inverter => match state {
                State::Running => State::Running,
                State::Success => State::Failure,
                State::Failure => State::Success,
            },
            Self::ForceSuccess if state != State::Running => State::Success,
            Self::ForceFailure if state != State::Running => State::Failure,
            Self::Repeat(repeat) => repeat.filter(state),
            Self::Retry { attempts, failures } if state == State::Failure => {
                *failures += 1;
                if *failures >= *attempts {
                    State::Failure
                } else {
                    State::Running
                }
            }
            _ => state,
        }
    }
}

/// Wraps exactly one child.
#[derive(Clone, Debug)]
pub struct Decorator {
    pub(crate) child: Option<NodeId>,
    pub(crate) effect: Effect,
}

impl Decorator {
    pub fn new(effect: Effect) -> Self {
        Self {
            child: None,
            effect,
        }
    }

    pub fn child(&self) -> Option<NodeId> {
        self.child
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub(crate) fn on_start(&mut self, ctx: &Context) {
        match &mut self.effect {
            Effect::Repeat(repeat) => repeat.iterations = 0,
            Effect::Retry { failures, .. } => *failures = 0,
            Effect::Timeout { started_at, .. } => *started_at = ctx.time(),
            _ => {}
        }
    }
}

impl Tree {
    pub(crate) fn update_decorator(&mut self, id: NodeId, ctx: &mut Context) -> State {
        let NodeKind::Decorator(decorator) = &self.nodes[id.0].kind else {
            return State::Failure;
        };
        let Some(child) = decorator.child else {
            return State::Failure;
        };

        let expired = match &decorator.effect {
            Effect::Timeout {
                duration,
                started_at,
            } => ctx.time() - started_at > f64::from(duration.value(&self.blackboard)),
            _ => false,
        };
        if expired {
            if self.nodes[child.0].started {
                self.abort(child, ctx);
            }
            return State::Failure;
        }

        let state = self.update_node(child, ctx);
        match &mut self.nodes[id.0].kind {
            NodeKind::Decorator(decorator) => decorator.effect.filter(state),
            _ => state,
        }
    }
}
