use crate::{error::ValidationError, library::TreeLibrary, NodeKind, Tree};

/// The chain of trees currently being expanded, as a linked list living on
/// the call stack. Walking the parents answers "is this tree already open?"
/// without allocating a set.
pub(crate) struct TreeStack<'a> {
    name: &'a str,
    parent: Option<&'a TreeStack<'a>>,
}

impl<'a> TreeStack<'a> {
    pub(crate) fn new(name: &'a str) -> Self {
        Self { name, parent: None }
    }

    pub(crate) fn push(&'a self, name: &'a str) -> TreeStack<'a> {
        TreeStack {
            name,
            parent: Some(self),
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        if self.name == name {
            true
        } else if let Some(parent) = self.parent {
            parent.contains(name)
        } else {
            false
        }
    }

    /// `A -> B -> name`, outermost tree first.
    pub(crate) fn path_to(&self, name: &str) -> String {
        let mut names = vec![name];
        let mut cur = Some(self);
        while let Some(stack) = cur {
            names.push(stack.name);
            cur = stack.parent;
        }
        names.reverse();
        names.join(" -> ")
    }
}

/// Checks that expanding the sub-tree references of `tree` terminates and
/// that every referenced template exists in `library`.
///
/// A reference back to a tree that is still being expanded is reported with
/// the whole path, e.g. `A -> B -> A`. Trees are identified by name.
pub fn validate_tree(tree: &Tree, library: &TreeLibrary) -> Result<(), ValidationError> {
    validate_recurse(tree, library, &TreeStack::new(tree.name()))
}

fn validate_recurse(
    tree: &Tree,
    library: &TreeLibrary,
    stack: &TreeStack,
) -> Result<(), ValidationError> {
    for id in tree.descendants(tree.root()) {
        let NodeKind::SubTree(subtree) = tree[id].kind() else {
            continue;
        };
        let Some(name) = subtree.tree_name() else {
            continue;
        };
        if stack.contains(name) {
            return Err(ValidationError::Cycle {
                path: stack.path_to(name),
            });
        }
        let referenced = library
            .get(name)
            .ok_or_else(|| ValidationError::MissingSubTree {
                tree: tree.name().to_owned(),
                subtree: name.to_owned(),
            })?;
        validate_recurse(referenced, library, &stack.push(name))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Node;

    fn tree_calling(name: &str, subtrees: &[&str]) -> Tree {
        let mut tree = Tree::new(name);
        let root = tree.root();
        let seq = tree.add_child(root, Node::sequencer()).unwrap();
        for subtree in subtrees {
            tree.add_child(seq, Node::sub_tree(*subtree)).unwrap();
        }
        tree
    }

    #[test]
    fn stack_path() {
        let a = TreeStack::new("A");
        let b = a.push("B");
        assert!(b.contains("A"));
        assert!(!b.contains("C"));
        assert_eq!(b.path_to("A"), "A -> B -> A");
    }

    #[test]
    fn mutual_recursion() {
        let mut library = TreeLibrary::new();
        let a = library.insert(tree_calling("A", &["B"]));
        library.insert(tree_calling("B", &["A"]));
        assert_eq!(
            validate_tree(&a, &library),
            Err(ValidationError::Cycle {
                path: "A -> B -> A".to_owned()
            })
        );
    }

    #[test]
    fn self_recursion() {
        let mut library = TreeLibrary::new();
        let a = library.insert(tree_calling("A", &["A"]));
        assert_eq!(
            validate_tree(&a, &library),
            Err(ValidationError::Cycle {
                path: "A -> A".to_owned()
            })
        );
    }

    #[test]
    fn shared_subtree_is_not_a_cycle() {
        let mut library = TreeLibrary::new();
        let a = library.insert(tree_calling("A", &["B", "C"]));
        library.insert(tree_calling("B", &["C"]));
        library.insert(tree_calling("C", &[]));
        assert_eq!(validate_tree(&a, &library), Ok(()));
    }

    #[test]
    fn missing_subtree() {
        let library = TreeLibrary::new();
        let a = tree_calling("A", &["Nowhere"]);
        assert_eq!(
            validate_tree(&a, &library),
            Err(ValidationError::MissingSubTree {
                tree: "A".to_owned(),
                subtree: "Nowhere".to_owned()
            })
        );
    }
}
