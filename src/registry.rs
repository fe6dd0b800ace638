use serde::de::DeserializeOwned;
use serde_yaml::Value as Yaml;
use std::collections::HashMap;

use crate::{
    blackboard::{BlackboardType, KeyId},
    error::LoadError,
    nodes::actions::{
        CompareProperty, GenerateGoal, Log, MoveToPosition, RandomFailure, RandomPosition,
        SetProperty, Wait,
    },
    parser::{parse_value, property_from_yaml},
    ActionNode, Blackboard, BlackboardKey, NodeProperty,
};

/// Parameters of an action node in a tree source, with the blackboard the
/// node will belong to for resolving key references.
pub struct ActionArgs<'a> {
    params: &'a Yaml,
    blackboard: &'a Blackboard,
}

impl<'a> ActionArgs<'a> {
    pub fn new(params: &'a Yaml, blackboard: &'a Blackboard) -> Self {
        Self { params, blackboard }
    }

    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
    }

    fn field(&self, field: &str) -> Option<&'a Yaml> {
        self.params.get(field)
    }

    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, LoadError> {
        self.field(field)
            .map(|value| {
                serde_yaml::from_value(value.clone()).map_err(|source| LoadError::InvalidValue {
                    field: field.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    pub fn get_or<T: DeserializeOwned>(&self, field: &str, default: T) -> Result<T, LoadError> {
        Ok(self.get(field)?.unwrap_or(default))
    }

    pub fn property<T>(&self, field: &str, default: T) -> Result<NodeProperty<T>, LoadError>
    where
        T: BlackboardType + DeserializeOwned,
    {
        property_from_yaml(self.field(field), default, self.blackboard, field)
    }

    /// A blackboard key given by name.
    pub fn key(&self, field: &str) -> Result<Option<KeyId>, LoadError> {
        match self.get::<String>(field)? {
            Some(name) => match self.blackboard.find(name.as_str()) {
                Some(id) => Ok(Some(id)),
                None => Err(LoadError::MissingKey(name)),
            },
            None => Ok(None),
        }
    }

    /// A key given by name in `key_field` and a value of the same type in
    /// `value_field`, defaulting to the type's default value.
    pub fn key_value(
        &self,
        key_field: &str,
        value_field: &str,
    ) -> Result<(Option<KeyId>, BlackboardKey), LoadError> {
        let Some(id) = self.key(key_field)? else {
            return Ok((None, BlackboardKey::new("", false)));
        };
        let Some(key) = self.blackboard.key(id) else {
            return Ok((None, BlackboardKey::new("", false)));
        };
        let ty = key.underlying_type();
        let value = match self.field(value_field) {
            Some(value) => parse_value(ty, value.clone(), value_field)?,
            None => ty.default_value(),
        };
        Ok((Some(id), BlackboardKey::new(key.name(), value)))
    }
}

pub type Constructor = Box<dyn Fn(&ActionArgs<'_>) -> Result<Box<dyn ActionNode>, LoadError>>;

pub fn boxify<T>(
    cons: impl Fn(&ActionArgs<'_>) -> Result<T, LoadError> + 'static,
) -> Constructor
where
    T: ActionNode + 'static,
{
    Box::new(move |args| Ok(Box::new(cons(args)?) as Box<dyn ActionNode>))
}

/// Action constructors by type name, used when loading tree sources.
pub struct Registry {
    action_types: HashMap<String, Constructor>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut ret = Self {
            action_types: HashMap::new(),
        };
        ret.register("Log", boxify(Log::from_args));
        ret.register("Wait", boxify(Wait::from_args));
        ret.register("RandomFailure", boxify(RandomFailure::from_args));
        ret.register("SetProperty", boxify(SetProperty::from_args));
        ret.register("CompareProperty", boxify(CompareProperty::from_args));
        ret.register("RandomPosition", boxify(RandomPosition::from_args));
        ret.register("GenerateGoal", boxify(GenerateGoal::from_args));
        ret.register("MoveToPosition", boxify(MoveToPosition::from_args));
        ret
    }
}

impl Registry {
    pub fn register(&mut self, type_name: impl ToString, constructor: Constructor) {
        self.action_types.insert(type_name.to_string(), constructor);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.action_types.contains_key(type_name)
    }

    pub fn build(
        &self,
        type_name: &str,
        args: &ActionArgs<'_>,
    ) -> Result<Box<dyn ActionNode>, LoadError> {
        let constructor = self
            .action_types
            .get(type_name)
            .ok_or_else(|| LoadError::MissingAction(type_name.to_owned()))?;
        constructor(args)
    }
}
