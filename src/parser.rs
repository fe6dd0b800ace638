//! Loading trees from YAML sources.

mod yaml_parser;

pub use self::yaml_parser::{load_tree_yaml, load_yaml, KeyDef};
pub(crate) use self::yaml_parser::{parse_value, property_from_yaml};
