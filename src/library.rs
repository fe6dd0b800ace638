use std::collections::HashMap;
use std::rc::Rc;

use crate::{error::LoadError, parser::load_yaml, Registry, Tree};

/// Named tree templates. Sub-tree references and runners resolve templates
/// here; the templates themselves are never mutated, only cloned.
#[derive(Debug, Default)]
pub struct TreeLibrary {
    trees: HashMap<String, Rc<Tree>>,
}

impl TreeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every tree of a YAML tree source.
    pub fn from_yaml(source: &str, registry: &Registry) -> Result<Self, LoadError> {
        let mut ret = Self::new();
        for tree in load_yaml(source, registry)? {
            ret.insert(tree);
        }
        Ok(ret)
    }

    /// Adds a template, replacing any previous one of the same name.
    pub fn insert(&mut self, tree: Tree) -> Rc<Tree> {
        let tree = Rc::new(tree);
        self.trees.insert(tree.name().to_owned(), tree.clone());
        tree
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Tree>> {
        self.trees.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
