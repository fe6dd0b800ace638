use serde::Deserialize;

use crate::{blackboard::KeyId, Symbol};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize)]
pub enum PortType {
    #[serde(rename = "in")]
    Input,
    #[serde(rename = "out")]
    Output,
    #[serde(rename = "inout")]
    InOut,
}

/// Connects a key of a sub-tree's own blackboard (`inner`) to a key of the
/// enclosing tree (`outer`).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PortSpec {
    pub ty: PortType,
    pub inner: Symbol,
    pub outer: KeyId,
}

impl PortSpec {
    pub fn new_in(inner: impl Into<Symbol>, outer: KeyId) -> Self {
        Self {
            ty: PortType::Input,
            inner: inner.into(),
            outer,
        }
    }

    pub fn new_out(inner: impl Into<Symbol>, outer: KeyId) -> Self {
        Self {
            ty: PortType::Output,
            inner: inner.into(),
            outer,
        }
    }

    pub fn new_inout(inner: impl Into<Symbol>, outer: KeyId) -> Self {
        Self {
            ty: PortType::InOut,
            inner: inner.into(),
            outer,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.ty, PortType::Input | PortType::InOut)
    }

    pub fn is_output(&self) -> bool {
        matches!(self.ty, PortType::Output | PortType::InOut)
    }
}
