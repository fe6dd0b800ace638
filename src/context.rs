use rand::{rngs::StdRng, SeedableRng};
use std::fmt;

use crate::Vec3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Sink for movement goals of the controlled entity, e.g. a navmesh agent.
pub trait MovementController {
    /// Returns `false` if the controller refuses the destination.
    fn set_destination(&mut self, target: Vec3) -> bool;

    fn remaining_distance(&self) -> f32;

    fn stop(&mut self);
}

/// Geometry queries against the host world.
pub trait PhysicsQuery {
    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool;
}

/// Host-provided collaborators shared by all nodes of one tree instance.
///
/// The context is owned by whoever drives the tree and lent to the nodes for
/// the duration of a bind or a tick.
pub struct Context {
    pub transform: Transform,
    movement: Option<Box<dyn MovementController>>,
    physics: Option<Box<dyn PhysicsQuery>>,
    rng: StdRng,
    time: f64,
    delta_time: f64,
}

impl Default for Context {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with a reproducible random sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            transform: Transform::default(),
            movement: None,
            physics: None,
            rng,
            time: 0.,
            delta_time: 0.,
        }
    }

    pub fn with_movement(mut self, movement: impl MovementController + 'static) -> Self {
        self.movement = Some(Box::new(movement));
        self
    }

    pub fn with_physics(mut self, physics: impl PhysicsQuery + 'static) -> Self {
        self.physics = Some(Box::new(physics));
        self
    }

    pub fn movement(&mut self) -> Option<&mut dyn MovementController> {
        match self.movement {
            Some(ref mut movement) => Some(movement.as_mut()),
            None => None,
        }
    }

    pub fn has_movement(&self) -> bool {
        self.movement.is_some()
    }

    pub fn physics(&self) -> Option<&dyn PhysicsQuery> {
        self.physics.as_deref()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Seconds elapsed since the context was created.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    pub fn advance(&mut self, delta_time: f64) {
        self.delta_time = delta_time;
        self.time += delta_time;
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("transform", &self.transform)
            .field("movement", &self.movement.is_some())
            .field("physics", &self.physics.is_some())
            .field("time", &self.time)
            .finish()
    }
}
