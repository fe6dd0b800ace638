//! # behavior-tree-runtime (Rust crate)
//!
//! A host-agnostic behavior tree runtime: trees are authored once as
//! templates, cloned per agent, and driven one tick at a time.
//!
//!
//! ## Overview
//!
//! A behavior tree describes decision making as a tree of nodes. Every tick
//! the root is updated, the call recurses down through composite and
//! decorator nodes to leaf actions, and every node reports one of three
//! [`State`]s: `Running`, `Success` or `Failure`. Composites look at the
//! results of their children to decide their own result and which child to
//! tick next time.
//!
//! Nodes share data through a typed [`Blackboard`] owned by the tree, and
//! reach the host (movement, physics queries, randomness, time) through a
//! [`Context`].
//!
//!
//! ## How it looks like
//!
//! A tree starts with a root node. Children are added with `add_child`,
//! which returns the id of the new node.
//!
//! ```rust
//! use behavior_tree_runtime::{actions::Log, Context, Node, State, Tree};
//!
//! let mut tree = Tree::new("hello");
//! let root = tree.root();
//! let seq = tree.add_child(root, Node::sequencer()).unwrap();
//! tree.add_child(seq, Node::action(Log::new("Hello"))).unwrap();
//! tree.add_child(seq, Node::action(Log::new("World"))).unwrap();
//!
//! let mut ctx = Context::with_seed(0);
//! assert_eq!(tree.update(&mut ctx), State::Success);
//! ```
//!
//! Once the root reports `Success` or `Failure`, `update` keeps returning it
//! until the tree is `reset`.
//!
//!
//! ## The blackboard
//!
//! Keys are declared on the tree and have one of the types of [`KeyType`].
//! Declaring a key gives back a typed [`Key`] handle.
//!
//! ```rust
//! # use behavior_tree_runtime::*;
//! let mut tree = Tree::new("keys");
//! let alert = tree.add_key("alert", false).unwrap();
//! let goal = tree.add_key("goal", Vec3::new(1., 0., 2.)).unwrap();
//!
//! tree.blackboard_mut().set(alert, true);
//! assert_eq!(tree.blackboard().get(alert), Some(&true));
//! assert_eq!(tree.blackboard().get_value::<Vec3>("goal"), Vec3::new(1., 0., 2.));
//! # let _ = goal;
//! ```
//!
//! Copying the value of one key into another only happens when both have the
//! same type. Otherwise the target is left as it was.
//!
//! ```rust
//! # use behavior_tree_runtime::*;
//! let mut count = BlackboardKey::new("count", 1);
//! assert!(count.copy_value_from(&BlackboardKey::new("other", 5)));
//! assert!(!count.copy_value_from(&BlackboardKey::new("speed", 2.5f32)));
//! assert_eq!(count.get::<i32>(), Some(&5));
//! ```
//!
//! Node fields that may come from the blackboard are [`NodeProperty`]s. A
//! property holds an inline value until it is bound to a key; from then on
//! reads and writes go through the key.
//!
//! ```rust
//! # use behavior_tree_runtime::*;
//! let mut blackboard = Blackboard::new();
//! let goal = blackboard.add("goal", Vec3::ZERO).unwrap();
//!
//! let mut writer = NodeProperty::bound(goal);
//! let reader = NodeProperty::<Vec3>::bound(goal);
//! writer.set_value(&mut blackboard, Vec3::new(3., 0., 0.));
//! assert_eq!(reader.value(&blackboard), Vec3::new(3., 0., 0.));
//! ```
//!
//! Key names are interned [`Symbol`]s. Looking up a key by a string interns
//! it first; you can cache the symbol with `Lazy` (re-exported from
//! `once_cell`) to skip that step.
//!
//! ```rust
//! use ::behavior_tree_runtime::{Blackboard, Lazy, Symbol};
//!
//! static GOAL_SYM: Lazy<Symbol> = Lazy::new(|| "goal".into());
//!
//! let mut blackboard = Blackboard::new();
//! blackboard.add("goal", 1).unwrap();
//! assert!(blackboard.find(*GOAL_SYM).is_some());
//! ```
//!
//!
//! ## How to define your own action
//!
//! Leaf behavior is written by implementing [`ActionNode`]. Only `on_update`
//! is required; `on_init` runs once when the tree is bound to a context,
//! `on_start` when the node starts running and `on_stop` when it finishes or
//! is aborted.
//!
//! ```rust
//! use ::behavior_tree_runtime::{ActionNode, Blackboard, Context, State};
//!
//! #[derive(Clone, Debug)]
//! struct CountDown(u32);
//!
//! impl ActionNode for CountDown {
//!     fn name(&self) -> &str {
//!         "CountDown"
//!     }
//!
//!     fn on_update(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) -> State {
//!         if self.0 == 0 {
//!             return State::Success;
//!         }
//!         self.0 -= 1;
//!         State::Running
//!     }
//! }
//! ```
//!
//! Actions must be `Clone`, because every agent runs its own copy of the tree.
//!
//!
//! ## Loading trees from YAML
//!
//! Trees can be described in YAML. Every node has a `guid` and a `kind`;
//! children are referenced by guid.
//!
//! ```yaml
//! trees:
//!   - name: Patrol
//!     root: root
//!     blackboard:
//!       - { name: goal, type: vec3 }
//!     nodes:
//!       - { guid: root, kind: root, child: seq }
//!       - { guid: seq, kind: sequencer, children: [pick, move] }
//!       - guid: pick
//!         kind: action
//!         action: RandomPosition
//!         params: { min: [-5, 0, -5], max: [5, 0, 5], position: { key: goal } }
//!       - guid: move
//!         kind: action
//!         action: MoveToPosition
//!         params: { target: { key: goal } }
//! ```
//!
//! Action types are looked up in a [`Registry`]. The built-in actions are
//! registered by default; your own are added with `register`.
//!
//! ```rust
//! # use ::behavior_tree_runtime::*;
//! # #[derive(Clone, Debug)]
//! # struct CountDown(u32);
//! # impl ActionNode for CountDown {
//! #     fn on_update(&mut self, _: &mut Context, _: &mut Blackboard) -> State { State::Success }
//! # }
//! let mut registry = Registry::default();
//! registry.register(
//!     "CountDown",
//!     boxify(|args| Ok(CountDown(args.get_or("count", 3)?))),
//! );
//!
//! let library = TreeLibrary::from_yaml(
//!     r#"
//! trees:
//!   - name: Main
//!     root: r
//!     nodes:
//!       - { guid: r, kind: root, child: c }
//!       - { guid: c, kind: action, action: CountDown, params: { count: 2 } }
//! "#,
//!     &registry,
//! )
//! .unwrap();
//! assert!(library.get("Main").is_some());
//! ```
//!
//!
//! ## Running agents
//!
//! A [`BehaviorTreeRunner`] owns a private clone of a template, binds it to a
//! context and ticks it. Before binding it checks that sub-tree references
//! don't recurse, and refuses to run a tree that does.
//!
//! ```rust
//! # use ::behavior_tree_runtime::*;
//! # use std::rc::Rc;
//! let mut library = TreeLibrary::new();
//! let mut template = Tree::new("Agent");
//! template.add_key("hp", 10).unwrap();
//! let root = template.root();
//! template.add_child(root, Node::action(actions::Wait::new(1.0f32))).unwrap();
//! let template = library.insert(template);
//!
//! let mut runner = BehaviorTreeRunner::new(template).with_library(Rc::new(library));
//! runner.initialize_tree().unwrap();
//! runner.set_blackboard_value("hp", 3).unwrap();
//! assert_eq!(runner.tick(0.5), Some(State::Running));
//! assert_eq!(runner.tick(0.5), Some(State::Running));
//! assert_eq!(runner.tick(0.5), Some(State::Success));
//! ```

mod blackboard;
mod context;
pub mod error;
mod library;
mod nodes;
pub mod parser;
mod port;
mod property;
mod registry;
mod runner;
mod symbol;
mod tree;
mod validate;

pub use crate::blackboard::{
    Blackboard, BlackboardKey, BlackboardType, Key, KeyId, KeyType, Value, Vec3,
};
pub use crate::context::{Context, MovementController, PhysicsQuery, Transform};
pub use crate::library::TreeLibrary;
pub use crate::nodes::{
    actions, ActionClone, ActionNode, Composite, Decorator, Effect, Flow, Node, NodeId, NodeKind,
    Repeat, SubTree,
};
pub use crate::port::{PortSpec, PortType};
pub use crate::property::NodeProperty;
pub use crate::registry::{boxify, ActionArgs, Constructor, Registry};
pub use crate::runner::{BehaviorTreeRunner, KeyOverride, RunnerSettings};
pub use crate::symbol::Symbol;
pub use crate::tree::Tree;
pub use crate::validate::validate_tree;

pub use ::once_cell::sync::Lazy;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum State {
    Running,
    Success,
    Failure,
}
