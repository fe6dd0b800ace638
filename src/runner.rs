use serde::Deserialize;
use std::rc::Rc;
use tracing::{debug, error};

use crate::{
    blackboard::{BlackboardType, Key},
    error::{LoadError, RunnerError},
    library::TreeLibrary,
    parser::KeyDef,
    symbol::Symbol,
    validate::validate_tree,
    Blackboard, BlackboardKey, Context, State, Tree,
};

/// A key value applied to the live blackboard after binding.
pub type KeyOverride = KeyDef;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Check sub-tree references for cycles before binding.
    pub validate: bool,
    /// Seed of the context's random generator; entropy when absent.
    pub seed: Option<u64>,
    pub overrides: Vec<KeyOverride>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            validate: true,
            seed: None,
            overrides: vec![],
        }
    }
}

impl RunnerSettings {
    pub fn from_yaml(source: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn override_keys(&self) -> Result<Vec<BlackboardKey>, LoadError> {
        self.overrides.iter().map(KeyDef::to_key).collect()
    }
}

/// Drives one agent: owns a private clone of a template tree and the context
/// its nodes run against.
///
/// Runners built from the same template never share nodes or blackboard
/// values.
pub struct BehaviorTreeRunner {
    template: Rc<Tree>,
    library: Rc<TreeLibrary>,
    context: Context,
    overrides: Vec<BlackboardKey>,
    validate: bool,
    tree: Option<Tree>,
}

impl BehaviorTreeRunner {
    pub fn new(template: Rc<Tree>) -> Self {
        Self {
            template,
            library: Rc::new(TreeLibrary::new()),
            context: Context::default(),
            overrides: vec![],
            validate: true,
            tree: None,
        }
    }

    pub fn from_settings(template: Rc<Tree>, settings: &RunnerSettings) -> Result<Self, LoadError> {
        let mut ret = Self::new(template);
        ret.validate = settings.validate;
        if let Some(seed) = settings.seed {
            ret.context = Context::with_seed(seed);
        }
        ret.overrides = settings.override_keys()?;
        Ok(ret)
    }

    /// Templates that sub-tree nodes are instantiated from.
    pub fn with_library(mut self, library: Rc<TreeLibrary>) -> Self {
        self.library = library;
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn add_override(&mut self, key: BlackboardKey) {
        self.overrides.push(key);
    }

    pub fn set_validate(&mut self, validate: bool) {
        self.validate = validate;
    }

    pub fn validate(&self) -> bool {
        self.validate
    }

    /// Clones the template, binds the clone to the context and applies the
    /// key overrides. A tree that fails validation is not bound and the
    /// runner stays idle.
    pub fn initialize_tree(&mut self) -> Result<(), RunnerError> {
        self.tree = None;
        if self.validate {
            if let Err(e) = validate_tree(&self.template, &self.library) {
                error!(tree = %self.template.name(), error = %e, "Refusing to bind tree");
                return Err(e.into());
            }
        }

        let mut tree = Tree::clone(&self.template);
        tree.bind(&mut self.context, &self.library);
        apply_key_overrides(&self.overrides, tree.blackboard_mut());
        debug!(
            tree = %tree.name(),
            overrides = self.overrides.len(),
            "Initialized tree"
        );
        self.tree = Some(tree);
        Ok(())
    }

    /// Advances the context clock by `delta_time` seconds and ticks the tree.
    /// Returns `None` while no tree is bound.
    pub fn tick(&mut self, delta_time: f64) -> Option<State> {
        let tree = self.tree.as_mut()?;
        self.context.advance(delta_time);
        Some(tree.update(&mut self.context))
    }

    /// Aborts whatever the bound tree is running and starts it over on the
    /// next tick.
    pub fn reset(&mut self) {
        if let Some(tree) = self.tree.as_mut() {
            tree.reset(&mut self.context);
        }
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut Tree> {
        self.tree.as_mut()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    fn bound_tree(&self) -> Result<&Tree, RunnerError> {
        self.tree.as_ref().ok_or(RunnerError::NotInitialized)
    }

    pub fn find_blackboard_key<T: BlackboardType>(
        &self,
        name: impl Into<Symbol>,
    ) -> Result<Option<Key<T>>, RunnerError> {
        Ok(self.bound_tree()?.blackboard().find_typed(name))
    }

    /// Writes an existing key of the live tree. Returns `Ok(false)` if there is
    /// no key of that name and type.
    pub fn set_blackboard_value<T: BlackboardType>(
        &mut self,
        name: impl Into<Symbol>,
        value: T,
    ) -> Result<bool, RunnerError> {
        let tree = self.tree.as_mut().ok_or(RunnerError::NotInitialized)?;
        Ok(tree.blackboard_mut().set_value(name, value))
    }

    pub fn get_blackboard_value<T: BlackboardType>(
        &self,
        name: impl Into<Symbol>,
    ) -> Result<T, RunnerError> {
        Ok(self.bound_tree()?.blackboard().get_value(name))
    }
}

fn apply_key_overrides(overrides: &[BlackboardKey], blackboard: &mut Blackboard) {
    for source in overrides {
        if let Some(key) = blackboard
            .find(source.name())
            .and_then(|id| blackboard.key_mut(id))
        {
            key.copy_value_from(source);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{error::ValidationError, nodes::actions::Wait, Node, Vec3};

    fn waiting_tree() -> Tree {
        let mut tree = Tree::new("Waiter");
        tree.add_key("count", 0).unwrap();
        tree.add_key("speed", 1.5f32).unwrap();
        let root = tree.root();
        tree.add_child(root, Node::action(Wait::new(1.0f32))).unwrap();
        tree
    }

    #[test]
    fn tick_before_initialize() {
        let mut runner = BehaviorTreeRunner::new(Rc::new(waiting_tree()));
        assert_eq!(runner.tick(0.1), None);
        assert!(matches!(
            runner.get_blackboard_value::<i32>("count"),
            Err(RunnerError::NotInitialized)
        ));
    }

    #[test]
    fn runs_to_completion() {
        let mut runner = BehaviorTreeRunner::new(Rc::new(waiting_tree()));
        runner.initialize_tree().unwrap();
        assert!(runner.tree().unwrap().is_bound());
        assert_eq!(runner.tick(0.5), Some(State::Running));
        assert_eq!(runner.tick(0.5), Some(State::Running));
        assert_eq!(runner.tick(0.5), Some(State::Success));
        // The result sticks until the tree is reset.
        assert_eq!(runner.tick(0.5), Some(State::Success));
    }

    #[test]
    fn overrides_skip_mismatched_types() {
        let mut runner = BehaviorTreeRunner::new(Rc::new(waiting_tree()));
        runner.add_override(BlackboardKey::new("count", 7));
        runner.add_override(BlackboardKey::new("speed", 3));
        runner.add_override(BlackboardKey::new("unknown", Vec3::ZERO));
        runner.initialize_tree().unwrap();
        assert_eq!(runner.get_blackboard_value::<i32>("count").unwrap(), 7);
        assert_eq!(runner.get_blackboard_value::<f32>("speed").unwrap(), 1.5);
    }

    #[test]
    fn blackboard_access() {
        let mut runner = BehaviorTreeRunner::new(Rc::new(waiting_tree()));
        runner.initialize_tree().unwrap();
        assert!(runner.find_blackboard_key::<i32>("count").unwrap().is_some());
        assert!(runner.find_blackboard_key::<bool>("count").unwrap().is_none());
        assert!(runner.set_blackboard_value("count", 3).unwrap());
        assert!(!runner.set_blackboard_value("count", true).unwrap());
        assert_eq!(runner.get_blackboard_value::<i32>("count").unwrap(), 3);
    }

    #[test]
    fn settings_from_yaml() {
        let settings = RunnerSettings::from_yaml(
            r#"
seed: 42
overrides:
  - { name: count, type: int, value: 9 }
"#,
        )
        .unwrap();
        assert!(settings.validate);
        assert_eq!(settings.seed, Some(42));

        let mut runner =
            BehaviorTreeRunner::from_settings(Rc::new(waiting_tree()), &settings).unwrap();
        runner.initialize_tree().unwrap();
        assert_eq!(runner.get_blackboard_value::<i32>("count").unwrap(), 9);
    }

    #[test]
    fn cycle_refuses_to_bind() {
        let mut library = TreeLibrary::new();
        let mut a = Tree::new("A");
        let root = a.root();
        a.add_child(root, Node::sub_tree("B")).unwrap();
        let a = library.insert(a);
        let mut b = Tree::new("B");
        let root = b.root();
        b.add_child(root, Node::sub_tree("A")).unwrap();
        library.insert(b);
        let library = Rc::new(library);

        let mut runner = BehaviorTreeRunner::new(a.clone()).with_library(library.clone());
        assert!(matches!(
            runner.initialize_tree(),
            Err(RunnerError::Validation(ValidationError::Cycle { path })) if path == "A -> B -> A"
        ));
        assert!(runner.tree().is_none());
        assert_eq!(runner.tick(0.1), None);

        // Without validation the recursive reference is left unbound and
        // fails at run time instead.
        let mut runner = BehaviorTreeRunner::new(a).with_library(library);
        runner.set_validate(false);
        runner.initialize_tree().unwrap();
        assert_eq!(runner.tick(0.1), Some(State::Failure));
    }
}
