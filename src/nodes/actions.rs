//! Built-in action nodes, registered by name in [`crate::Registry::default`].

use rand::Rng;
use std::f32::consts::TAU;
use tracing::{info, warn};

use crate::{
    blackboard::{KeyId, Value},
    error::LoadError,
    registry::ActionArgs,
    ActionNode, Blackboard, BlackboardKey, Context, NodeProperty, State, Vec3,
};

/// Emits `message` at info level and succeeds.
#[derive(Clone, Debug, Default)]
pub struct Log {
    pub message: String,
}

impl Log {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        Ok(Self::new(args.get_or("message", String::new())?))
    }
}

impl ActionNode for Log {
    fn name(&self) -> &str {
        "Log"
    }

    fn on_update(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) -> State {
        info!(message = %self.message, "Log node");
        State::Success
    }
}

/// Runs for `duration` seconds of context time, then succeeds.
#[derive(Clone, Debug, Default)]
pub struct Wait {
    pub duration: NodeProperty<f32>,
    started_at: f64,
}

impl Wait {
    pub fn new(duration: impl Into<NodeProperty<f32>>) -> Self {
        Self {
            duration: duration.into(),
            started_at: 0.,
        }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        Ok(Self::new(args.property("duration", 1.0f32)?))
    }
}

impl ActionNode for Wait {
    fn name(&self) -> &str {
        "Wait"
    }

    fn on_start(&mut self, ctx: &mut Context, _blackboard: &mut Blackboard) {
        self.started_at = ctx.time();
    }

    fn on_update(&mut self, ctx: &mut Context, blackboard: &mut Blackboard) -> State {
        let duration = f64::from(self.duration.value(blackboard));
        if ctx.time() - self.started_at >= duration {
            State::Success
        } else {
            State::Running
        }
    }
}

/// Fails with probability `chance_of_failure`, succeeds otherwise.
#[derive(Clone, Debug)]
pub struct RandomFailure {
    pub chance_of_failure: f32,
}

impl RandomFailure {
    pub fn new(chance_of_failure: f32) -> Self {
        Self { chance_of_failure }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        Ok(Self::new(args.get_or("chance_of_failure", 0.5)?))
    }
}

impl ActionNode for RandomFailure {
    fn name(&self) -> &str {
        "RandomFailure"
    }

    fn on_update(&mut self, ctx: &mut Context, _blackboard: &mut Blackboard) -> State {
        if ctx.rng().gen::<f32>() < self.chance_of_failure {
            State::Failure
        } else {
            State::Success
        }
    }
}

/// Writes `value` into `key`. A value of another type than the key is
/// ignored.
#[derive(Clone, Debug)]
pub struct SetProperty {
    pub key: Option<KeyId>,
    pub value: BlackboardKey,
}

impl SetProperty {
    pub fn new(key: KeyId, value: impl Into<Value>) -> Self {
        Self {
            key: Some(key),
            value: BlackboardKey::new("value", value),
        }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        let (key, value) = args.key_value("key", "value")?;
        Ok(Self { key, value })
    }
}

impl ActionNode for SetProperty {
    fn name(&self) -> &str {
        "SetProperty"
    }

    fn on_update(&mut self, _ctx: &mut Context, blackboard: &mut Blackboard) -> State {
        if let Some(key) = self.key.and_then(|key| blackboard.key_mut(key)) {
            key.copy_value_from(&self.value);
        }
        State::Success
    }
}

/// Succeeds if `key` holds `value`.
#[derive(Clone, Debug)]
pub struct CompareProperty {
    pub key: Option<KeyId>,
    pub value: BlackboardKey,
}

impl CompareProperty {
    pub fn new(key: KeyId, value: impl Into<Value>) -> Self {
        Self {
            key: Some(key),
            value: BlackboardKey::new("value", value),
        }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        let (key, value) = args.key_value("key", "value")?;
        Ok(Self { key, value })
    }
}

impl ActionNode for CompareProperty {
    fn name(&self) -> &str {
        "CompareProperty"
    }

    fn on_update(&mut self, _ctx: &mut Context, blackboard: &mut Blackboard) -> State {
        match self.key.and_then(|key| blackboard.key(key)) {
            Some(key) if *key == self.value => State::Success,
            _ => State::Failure,
        }
    }
}

fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

/// Goal generator: picks a point uniformly inside the box `min..max`.
#[derive(Clone, Debug)]
pub struct RandomPosition {
    pub min: Vec3,
    pub max: Vec3,
    pub position: NodeProperty<Vec3>,
}

impl RandomPosition {
    pub fn new(min: Vec3, max: Vec3, position: NodeProperty<Vec3>) -> Self {
        Self { min, max, position }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        Ok(Self::new(
            args.get_or("min", Vec3::new(-10., -10., 0.))?,
            args.get_or("max", Vec3::new(10., 10., 0.))?,
            args.property("position", Vec3::ZERO)?,
        ))
    }
}

impl ActionNode for RandomPosition {
    fn name(&self) -> &str {
        "RandomPosition"
    }

    fn on_update(&mut self, ctx: &mut Context, blackboard: &mut Blackboard) -> State {
        let rng = ctx.rng();
        let position = Vec3::new(
            lerp(self.min.x, self.max.x, rng.gen()),
            lerp(self.min.y, self.max.y, rng.gen()),
            lerp(self.min.z, self.max.z, rng.gen()),
        );
        self.position.set_value(blackboard, position);
        State::Success
    }
}

/// Goal generator: samples points on the ground plane (y up) within
/// `radius` of the agent and keeps the first one the physics query reports
/// as reachable.
#[derive(Clone, Debug)]
pub struct GenerateGoal {
    pub radius: NodeProperty<f32>,
    pub attempts: u32,
    pub goal: NodeProperty<Vec3>,
    can_run: bool,
}

impl GenerateGoal {
    pub fn new(radius: impl Into<NodeProperty<f32>>, goal: NodeProperty<Vec3>) -> Self {
        Self {
            radius: radius.into(),
            attempts: 8,
            goal,
            can_run: false,
        }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        let mut ret = Self::new(
            args.property("radius", 10.0f32)?,
            args.property("goal", Vec3::ZERO)?,
        );
        ret.attempts = args.get_or("attempts", ret.attempts)?;
        Ok(ret)
    }
}

impl ActionNode for GenerateGoal {
    fn name(&self) -> &str {
        "GenerateGoal"
    }

    fn on_init(&mut self, ctx: &mut Context, _blackboard: &mut Blackboard) {
        self.can_run = ctx.physics().is_some();
        if !self.can_run {
            warn!("GenerateGoal needs a physics query in the context");
        }
    }

    fn on_update(&mut self, ctx: &mut Context, blackboard: &mut Blackboard) -> State {
        if !self.can_run {
            return State::Failure;
        }
        let origin = ctx.transform.position;
        let radius = self.radius.value(blackboard);
        for _ in 0..self.attempts {
            let (angle, distance) = {
                let rng = ctx.rng();
                (rng.gen::<f32>() * TAU, radius * rng.gen::<f32>().sqrt())
            };
            let candidate = origin + Vec3::new(angle.cos(), 0., angle.sin()) * distance;
            if ctx
                .physics()
                .map_or(false, |physics| physics.is_reachable(origin, candidate))
            {
                self.goal.set_value(blackboard, candidate);
                return State::Success;
            }
        }
        State::Failure
    }
}

/// Hands `target` to the movement controller and runs until the remaining
/// distance drops to `stopping_distance`.
#[derive(Clone, Debug)]
pub struct MoveToPosition {
    pub target: NodeProperty<Vec3>,
    pub stopping_distance: f32,
    can_run: bool,
    accepted: bool,
    arrived: bool,
}

impl MoveToPosition {
    pub fn new(target: NodeProperty<Vec3>) -> Self {
        Self {
            target,
            stopping_distance: 0.1,
            can_run: false,
            accepted: false,
            arrived: false,
        }
    }

    pub fn from_args(args: &ActionArgs<'_>) -> Result<Self, LoadError> {
        let mut ret = Self::new(args.property("target", Vec3::ZERO)?);
        ret.stopping_distance = args.get_or("stopping_distance", ret.stopping_distance)?;
        Ok(ret)
    }
}

impl ActionNode for MoveToPosition {
    fn name(&self) -> &str {
        "MoveToPosition"
    }

    fn on_init(&mut self, ctx: &mut Context, _blackboard: &mut Blackboard) {
        self.can_run = ctx.has_movement();
        if !self.can_run {
            warn!("MoveToPosition needs a movement controller in the context");
        }
    }

    fn on_start(&mut self, ctx: &mut Context, blackboard: &mut Blackboard) {
        self.arrived = false;
        self.accepted = false;
        if !self.can_run {
            return;
        }
        let target = self.target.value(blackboard);
        let origin = ctx.transform.position;
        let reachable = ctx
            .physics()
            .map_or(true, |physics| physics.is_reachable(origin, target));
        if let Some(movement) = ctx.movement().filter(|_| reachable) {
            self.accepted = movement.set_destination(target);
        }
    }

    fn on_update(&mut self, ctx: &mut Context, _blackboard: &mut Blackboard) -> State {
        if !self.accepted {
            return State::Failure;
        }
        match ctx.movement() {
            Some(movement) if movement.remaining_distance() <= self.stopping_distance => {
                self.arrived = true;
                State::Success
            }
            Some(_) => State::Running,
            None => State::Failure,
        }
    }

    fn on_stop(&mut self, ctx: &mut Context, _blackboard: &mut Blackboard) {
        if self.accepted && !self.arrived {
            if let Some(movement) = ctx.movement() {
                movement.stop();
            }
        }
        self.accepted = false;
    }
}
