use tracing::{debug, warn};

use super::NodeId;
use crate::{
    library::TreeLibrary, port::PortSpec, validate::TreeStack, Blackboard, Context, NodeKind,
    State, Tree,
};

/// Runs another tree template, by name, as a nested instance with its own
/// blackboard.
///
/// Ports copy values from the enclosing blackboard into the nested one before
/// each tick and back out afterwards. Keys of different types are skipped.
#[derive(Clone, Debug, Default)]
pub struct SubTree {
    pub(crate) tree: Option<String>,
    pub(crate) ports: Vec<PortSpec>,
    pub(crate) instance: Option<Box<Tree>>,
}

impl SubTree {
    pub fn new(tree: impl Into<String>) -> Self {
        Self {
            tree: Some(tree.into()),
            ports: vec![],
            instance: None,
        }
    }

    pub fn with_port(mut self, port: PortSpec) -> Self {
        self.ports.push(port);
        self
    }

    pub fn tree_name(&self) -> Option<&str> {
        self.tree.as_deref()
    }

    pub fn ports(&self) -> &[PortSpec] {
        &self.ports
    }

    pub fn instance(&self) -> Option<&Tree> {
        self.instance.as_deref()
    }

    /// Clones the referenced template out of `library` and binds it. A
    /// reference that would recurse into a tree already on `stack`, or that
    /// names an unknown tree, stays uninstantiated and ticks as `Failure`.
    pub(crate) fn instantiate(
        &mut self,
        ctx: &mut Context,
        library: &TreeLibrary,
        stack: &TreeStack,
    ) {
        let Some(name) = self.tree.as_deref() else {
            return;
        };
        if stack.contains(name) {
            warn!(path = %stack.path_to(name), "Recursive sub-tree left unbound");
            return;
        }
        let Some(template) = library.get(name) else {
            warn!(subtree = name, "Sub-tree template not found");
            return;
        };

        let mut instance = Tree::clone(template);
        instance.bind_recurse(ctx, library, &stack.push(name));
        debug!(subtree = name, "Instantiated sub-tree");
        self.instance = Some(Box::new(instance));
    }

    pub(crate) fn on_stop(&mut self, ctx: &mut Context) {
        if let Some(instance) = self.instance.as_deref_mut() {
            let root = instance.root;
            if instance.nodes[root.0].started {
                debug!(subtree = ?self.tree, "Aborting sub-tree");
                instance.abort(root, ctx);
            }
        }
    }
}

fn copy_ports(from: &Blackboard, to: &mut Blackboard, ports: &[PortSpec], outward: bool) {
    for port in ports {
        let (source, target) = if outward {
            if !port.is_output() {
                continue;
            }
            (from.find(port.inner), Some(port.outer))
        } else {
            if !port.is_input() {
                continue;
            }
            (Some(port.outer), to.find(port.inner))
        };
        if let (Some(source), Some(target)) = (source.and_then(|id| from.key(id)), target) {
            if let Some(target) = to.key_mut(target) {
                target.copy_value_from(source);
            }
        }
    }
}

impl Tree {
    pub(crate) fn update_subtree(&mut self, id: NodeId, ctx: &mut Context) -> State {
        let Tree {
            nodes, blackboard, ..
        } = self;
        let NodeKind::SubTree(SubTree {
            ports, instance, ..
        }) = &mut nodes[id.0].kind
        else {
            return State::Failure;
        };
        let Some(instance) = instance.as_deref_mut() else {
            return State::Failure;
        };

        copy_ports(blackboard, &mut instance.blackboard, ports, false);
        let root = instance.root;
        let state = instance.update_node(root, ctx);
        copy_ports(&instance.blackboard, blackboard, ports, true);
        state
    }
}
