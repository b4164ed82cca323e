use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// The reserved identifier of the tree root. Generated ids are uuids and server ids are decimal
/// integers, so neither can ever collide with it.
const ROOT_ID: &str = "root";

/// Opaque identifier of a node in a `BudgetTree`.
///
/// Ids are stable for the lifetime of a node. They are either generated on the client when a node
/// is created, or coerced from the integer row id a node was loaded with.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// The sentinel id of the root node.
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    /// Generates a fresh id for a node created in the editor.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for NodeId {
    fn from(server_id: i64) -> Self {
        Self(server_id.to_string())
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_not_root() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(!a.is_root());
        assert!(!b.is_root());
    }

    #[test]
    fn test_server_id_coercion() {
        let id = NodeId::from(42);
        assert_eq!(id.as_str(), "42");
        assert!(!id.is_root());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&NodeId::root()).unwrap();
        assert_eq!(json, "\"root\"");
    }
}
