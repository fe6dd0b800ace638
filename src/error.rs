use thiserror::Error;

use crate::blackboard::KeyType;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddChildError {
    #[error("Attempted to add too many nodes")]
    TooManyNodes,
    #[error("Node kind takes no children")]
    NoChildSlot,
    #[error("Node already has a parent")]
    AlreadyAttached,
    #[error("Node id out of range")]
    InvalidNode,
    #[error("Node would become its own ancestor")]
    Cycle,
}

pub type AddChildResult<T = ()> = Result<T, AddChildError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlackboardError {
    #[error("Blackboard key {0:?} already exists")]
    DuplicateKey(String),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("Tree {0:?} does not exist in the source")]
    MissingTree(String),
    #[error("Root node {0:?} is not in the node list")]
    MissingRoot(String),
    #[error("Root node {0:?} is not of kind root")]
    NotARoot(String),
    #[error("Node guid {0:?} appears more than once")]
    DuplicateNode(String),
    #[error("Node {0:?} is the child of more than one parent")]
    SharedNode(String),
    #[error("Node {0:?} is its own ancestor")]
    CyclicNode(String),
    #[error("Action type not found {0:?}")]
    MissingAction(String),
    #[error("Blackboard key not found {0:?}")]
    MissingKey(String),
    #[error("Blackboard key {key:?} is {actual}, expected {expected}")]
    KeyType {
        key: String,
        expected: KeyType,
        actual: KeyType,
    },
    #[error("Invalid value for {field:?}: {source}")]
    InvalidValue {
        field: String,
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Blackboard(#[from] BlackboardError),
    #[error("{0} to {1}")]
    AddChild(AddChildError, String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recursive sub-tree reference: {path}")]
    Cycle { path: String },
    #[error("Tree {tree:?} references unknown sub-tree {subtree:?}")]
    MissingSubTree { tree: String, subtree: String },
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Runner has no bound tree")]
    NotInitialized,
}
