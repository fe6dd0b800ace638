use ::behavior_tree_runtime::{
    BehaviorTreeRunner, Context, MovementController, PhysicsQuery, Registry, RunnerSettings,
    State, TreeLibrary, Vec3,
};
use anyhow::Context as _;
use std::{cell::RefCell, fs, rc::Rc};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SPEED: f32 = 4.;
const DELTA_TIME: f64 = 0.1;

#[derive(Default)]
struct World {
    position: Vec3,
    destination: Option<Vec3>,
}

impl World {
    fn step(&mut self, max_distance: f32) {
        let Some(destination) = self.destination else {
            return;
        };
        let offset = destination - self.position;
        let distance = offset.length();
        if distance <= max_distance {
            self.position = destination;
        } else {
            self.position = self.position + offset * (max_distance / distance);
        }
    }
}

struct Navigator(Rc<RefCell<World>>);

impl MovementController for Navigator {
    fn set_destination(&mut self, target: Vec3) -> bool {
        self.0.borrow_mut().destination = Some(target);
        true
    }

    fn remaining_distance(&self) -> f32 {
        let world = self.0.borrow();
        world
            .destination
            .map_or(0., |destination| world.position.distance(destination))
    }

    fn stop(&mut self) {
        self.0.borrow_mut().destination = None;
    }
}

/// A square yard the guard can't leave.
struct Yard {
    half_size: f32,
}

impl PhysicsQuery for Yard {
    fn is_reachable(&self, _from: Vec3, to: Vec3) -> bool {
        to.x.abs() <= self.half_size && to.z.abs() <= self.half_size
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let source = fs::read_to_string("demos/patrol.yaml")?;
    let settings = RunnerSettings::from_yaml(&fs::read_to_string("demos/settings.yaml")?)?;
    let library = Rc::new(TreeLibrary::from_yaml(&source, &Registry::default())?);
    let template = library.get("Patrol").context("No Patrol tree")?.clone();

    let world = Rc::new(RefCell::new(World::default()));
    let context = Context::with_seed(settings.seed.unwrap_or_default())
        .with_movement(Navigator(world.clone()))
        .with_physics(Yard { half_size: 6. });
    let mut runner = BehaviorTreeRunner::from_settings(template, &settings)?
        .with_library(library)
        .with_context(context);
    runner.initialize_tree()?;

    for frame in 0..300 {
        match frame {
            150 => {
                info!("Raising the alarm");
                runner.set_blackboard_value("alert", true)?;
            }
            180 => {
                runner.set_blackboard_value("alert", false)?;
            }
            _ => {}
        }

        world.borrow_mut().step(SPEED * DELTA_TIME as f32);
        runner.context_mut().transform.position = world.borrow().position;

        let state = runner.tick(DELTA_TIME);
        if state != Some(State::Running) {
            info!(frame, ?state, "Tree stopped");
            break;
        }
    }

    let position = world.borrow().position;
    info!(x = position.x, z = position.z, "Guard finished at");
    Ok(())
}
