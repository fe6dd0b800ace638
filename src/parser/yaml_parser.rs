use serde::{de::DeserializeOwned, Deserialize};
use serde_yaml::Value as Yaml;
use std::collections::HashMap;
use tracing::warn;

use crate::{
    blackboard::{BlackboardType, Key, KeyType, Value},
    error::{AddChildError, LoadError},
    port::{PortSpec, PortType},
    registry::ActionArgs,
    Blackboard, BlackboardKey, Effect, Node, NodeKind, NodeProperty, Registry, Repeat, SubTree,
    Tree,
};

#[derive(Deserialize)]
struct SourceDef {
    #[serde(default)]
    trees: Vec<TreeDef>,
}

#[derive(Deserialize)]
struct TreeDef {
    name: String,
    root: String,
    #[serde(default)]
    blackboard: Vec<KeyDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
}

/// A blackboard key as written in a source: `{name, type, value}`. A missing
/// value means the type's default.
#[derive(Clone, Debug, Deserialize)]
pub struct KeyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: KeyType,
    #[serde(default)]
    pub value: Option<Yaml>,
}

impl KeyDef {
    pub fn to_key(&self) -> Result<BlackboardKey, LoadError> {
        let value = match &self.value {
            Some(value) => parse_value(self.ty, value.clone(), &self.name)?,
            None => self.ty.default_value(),
        };
        Ok(BlackboardKey::new(self.name.as_str(), value))
    }
}

#[derive(Deserialize)]
struct NodeDef {
    guid: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    draw_gizmos: bool,
    #[serde(flatten)]
    kind: KindDef,
}

fn default_true() -> bool {
    true
}

fn default_attempts() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum KindDef {
    Root {
        #[serde(default)]
        child: Option<String>,
    },
    Sequencer {
        #[serde(default)]
        children: Vec<String>,
    },
    Selector {
        #[serde(default)]
        children: Vec<String>,
    },
    RandomSelector {
        #[serde(default)]
        children: Vec<String>,
    },
    InterruptSelector {
        #[serde(default)]
        children: Vec<String>,
    },
    Parallel {
        #[serde(default)]
        children: Vec<String>,
    },
    Switch {
        #[serde(default)]
        children: Vec<String>,
        #[serde(default)]
        index: Option<Yaml>,
        #[serde(default = "default_true")]
        interruptable: bool,
    },
    Inverter {
        #[serde(default)]
        child: Option<String>,
    },
    ForceSuccess {
        #[serde(default)]
        child: Option<String>,
    },
    ForceFailure {
        #[serde(default)]
        child: Option<String>,
    },
    Repeat {
        #[serde(default)]
        child: Option<String>,
        #[serde(default = "default_true")]
        restart_on_success: bool,
        #[serde(default)]
        restart_on_failure: bool,
        #[serde(default)]
        max_repeats: u32,
    },
    Retry {
        #[serde(default)]
        child: Option<String>,
        #[serde(default = "default_attempts")]
        attempts: u32,
    },
    Timeout {
        #[serde(default)]
        child: Option<String>,
        #[serde(default)]
        duration: Option<Yaml>,
    },
    SubTree {
        #[serde(default)]
        tree: Option<String>,
        #[serde(default)]
        ports: Vec<PortDef>,
    },
    Action {
        action: String,
        #[serde(default)]
        params: Yaml,
    },
}

impl KindDef {
    fn children(&self) -> &[String] {
        match self {
            Self::Root { child }
            | Self::Inverter { child }
            | Self::ForceSuccess { child }
            | Self::ForceFailure { child }
            | Self::Repeat { child, .. }
            | Self::Retry { child, .. }
            | Self::Timeout { child, .. } => child.as_slice(),
            Self::Sequencer { children }
            | Self::Selector { children }
            | Self::RandomSelector { children }
            | Self::InterruptSelector { children }
            | Self::Parallel { children }
            | Self::Switch { children, .. } => children,
            Self::SubTree { .. } | Self::Action { .. } => &[],
        }
    }
}

#[derive(Deserialize)]
struct PortDef {
    direction: PortType,
    name: String,
    key: String,
}

fn from_yaml<T: DeserializeOwned>(value: Yaml, field: &str) -> Result<T, LoadError> {
    serde_yaml::from_value(value).map_err(|source| LoadError::InvalidValue {
        field: field.to_owned(),
        source,
    })
}

pub(crate) fn parse_value(ty: KeyType, value: Yaml, field: &str) -> Result<Value, LoadError> {
    Ok(match ty {
        KeyType::Bool => Value::Bool(from_yaml(value, field)?),
        KeyType::Int => Value::Int(from_yaml(value, field)?),
        KeyType::Float => Value::Float(from_yaml(value, field)?),
        KeyType::String => Value::String(from_yaml(value, field)?),
        KeyType::Vec3 => Value::Vec3(from_yaml(value, field)?),
    })
}

/// Reads a node property. `{key: name}` binds it to a blackboard key of the
/// same type, `{value: v}` or a plain value sets it inline, and both together
/// bind with `v` as the default.
pub(crate) fn property_from_yaml<T>(
    value: Option<&Yaml>,
    default: T,
    blackboard: &Blackboard,
    field: &str,
) -> Result<NodeProperty<T>, LoadError>
where
    T: BlackboardType + DeserializeOwned,
{
    let Some(value) = value else {
        return Ok(NodeProperty::new(default));
    };
    let (key, inline) = match value {
        Yaml::Mapping(_) if value.get("key").is_some() || value.get("value").is_some() => {
            (value.get("key"), value.get("value"))
        }
        _ => (None, Some(value)),
    };

    let mut ret = match inline {
        Some(inline) => NodeProperty::new(from_yaml(inline.clone(), field)?),
        None => NodeProperty::new(default),
    };
    if let Some(key) = key {
        let name: String = from_yaml(key.clone(), field)?;
        let (id, actual) = blackboard
            .find(name.as_str())
            .and_then(|id| Some((id, blackboard.key(id)?.underlying_type())))
            .ok_or_else(|| LoadError::MissingKey(name.clone()))?;
        if actual != T::KEY_TYPE {
            return Err(LoadError::KeyType {
                key: name,
                expected: T::KEY_TYPE,
                actual,
            });
        }
        ret.bind(Some(Key::new(id)));
    }
    Ok(ret)
}

fn port_spec(def: &PortDef, blackboard: &Blackboard) -> Result<PortSpec, LoadError> {
    let outer = blackboard
        .find(def.key.as_str())
        .ok_or_else(|| LoadError::MissingKey(def.key.clone()))?;
    Ok(PortSpec {
        ty: def.direction,
        inner: def.name.as_str().into(),
        outer,
    })
}

fn build_node(
    def: &NodeDef,
    blackboard: &Blackboard,
    registry: &Registry,
) -> Result<Node, LoadError> {
    let mut node = match &def.kind {
        KindDef::Root { .. } => Node::root(),
        KindDef::Sequencer { .. } => Node::sequencer(),
        KindDef::Selector { .. } => Node::selector(),
        KindDef::RandomSelector { .. } => Node::random_selector(),
        KindDef::InterruptSelector { .. } => Node::interrupt_selector(),
        KindDef::Parallel { .. } => Node::parallel(),
        KindDef::Switch {
            index,
            interruptable,
            ..
        } => Node::switch(
            property_from_yaml(index.as_ref(), 0, blackboard, "index")?,
            *interruptable,
        ),
        KindDef::Inverter { .. } => Node::inverter(),
        KindDef::ForceSuccess { .. } => Node::decorator(Effect::ForceSuccess),
        KindDef::ForceFailure { .. } => Node::decorator(Effect::ForceFailure),
        KindDef::Repeat {
            restart_on_success,
            restart_on_failure,
            max_repeats,
            ..
        } => Node::decorator(Effect::Repeat(Repeat::new(
            *restart_on_success,
            *restart_on_failure,
            *max_repeats,
        ))),
        KindDef::Retry { attempts, .. } => Node::decorator(Effect::retry(*attempts)),
        KindDef::Timeout { duration, .. } => Node::decorator(Effect::timeout(
            property_from_yaml(duration.as_ref(), 1., blackboard, "duration")?,
        )),
        KindDef::SubTree { tree, ports } => {
            let mut subtree = tree.clone().map_or_else(SubTree::default, SubTree::new);
            for port in ports {
                subtree = subtree.with_port(port_spec(port, blackboard)?);
            }
            Node::new(NodeKind::SubTree(subtree))
        }
        KindDef::Action { action, params } => Node::new(NodeKind::Action(
            registry.build(action, &ActionArgs::new(params, blackboard))?,
        )),
    }
    .with_guid(def.guid.as_str())
    .with_description(def.description.as_str());
    node.draw_gizmos = def.draw_gizmos;
    Ok(node)
}

fn build_tree(def: &TreeDef, registry: &Registry) -> Result<Tree, LoadError> {
    let mut blackboard = Blackboard::new();
    for key in &def.blackboard {
        blackboard.add_key(key.to_key()?)?;
    }

    let mut index = HashMap::new();
    for (i, node) in def.nodes.iter().enumerate() {
        if index.insert(node.guid.as_str(), i).is_some() {
            return Err(LoadError::DuplicateNode(node.guid.clone()));
        }
    }
    let root_def = index
        .get(def.root.as_str())
        .map(|&i| &def.nodes[i])
        .ok_or_else(|| LoadError::MissingRoot(def.root.clone()))?;
    if !matches!(root_def.kind, KindDef::Root { .. }) {
        return Err(LoadError::NotARoot(def.root.clone()));
    }

    // All nodes go into the arena first, the root at index 0, so that
    // children can be referenced before their definition.
    let mut tree = Tree::with_root(&def.name, build_node(root_def, &blackboard, registry)?);
    let mut ids = HashMap::new();
    ids.insert(root_def.guid.as_str(), tree.root());
    for node in &def.nodes {
        if node.guid != def.root {
            let built = build_node(node, &blackboard, registry)?;
            ids.insert(node.guid.as_str(), tree.add_node(built));
        }
    }
    tree.blackboard = blackboard;

    for node in &def.nodes {
        let parent = ids[node.guid.as_str()];
        for child in node.kind.children() {
            let Some(&id) = ids.get(child.as_str()) else {
                warn!(
                    tree = %def.name,
                    node = %node.guid,
                    child = %child,
                    "Pruned dangling child reference"
                );
                continue;
            };
            tree.attach(parent, id).map_err(|e| match e {
                AddChildError::AlreadyAttached => LoadError::SharedNode(child.clone()),
                AddChildError::Cycle => LoadError::CyclicNode(child.clone()),
                e => LoadError::AddChild(e, node.guid.clone()),
            })?;
        }
    }

    let removed = tree.retain_reachable();
    if removed > 0 {
        warn!(tree = %def.name, removed, "Pruned nodes unreachable from the root");
    }
    Ok(tree)
}

/// Builds every tree of a YAML source. Action nodes are constructed through
/// `registry`.
pub fn load_yaml(source: &str, registry: &Registry) -> Result<Vec<Tree>, LoadError> {
    let source: SourceDef = serde_yaml::from_str(source)?;
    source
        .trees
        .iter()
        .map(|def| build_tree(def, registry))
        .collect()
}

/// Builds the tree called `name` out of a YAML source.
pub fn load_tree_yaml(source: &str, name: &str, registry: &Registry) -> Result<Tree, LoadError> {
    let source: SourceDef = serde_yaml::from_str(source)?;
    let def = source
        .trees
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| LoadError::MissingTree(name.to_owned()))?;
    build_tree(def, registry)
}
