//! Hierarchical key/value persistence tree.
//!
//! The host persists module state as nested named nodes holding ordered
//! string values. Keys may repeat; lookups return the first match. This is
//! only the in-memory contract. Reading and writing save files belongs to
//! the host.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading persisted or design data.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("missing value '{key}'")]
    Missing { key: String },

    #[error("missing node '{name}'")]
    MissingNode { name: String },

    #[error("invalid value for '{key}': '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named node with ordered values and child nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    values: Vec<(String, String)>,
    nodes: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            nodes: Vec::new(),
        }
    }

    // ── Values ──────────────────────────────────────────────────────────

    pub fn add_value(&mut self, key: impl Into<String>, value: impl Display) {
        self.values.push((key.into(), value.to_string()));
    }

    /// Replace the first value under `key`, or append it.
    pub fn set_value(&mut self, key: &str, value: impl Display) {
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.add_value(key, value),
        }
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.values.iter().any(|(k, _)| k == key)
    }

    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn values(&self) -> &[(String, String)] {
        &self.values
    }

    /// Parse a required value.
    pub fn parse<T>(&self, key: &str) -> Result<T, NodeError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.get_value(key).ok_or_else(|| NodeError::Missing {
            key: key.to_string(),
        })?;
        raw.parse::<T>().map_err(|e| NodeError::Invalid {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse an optional value; absent keys yield `default`, malformed ones an error.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, NodeError>
    where
        T: FromStr,
        T::Err: Display,
    {
        if self.has_value(key) {
            self.parse(key)
        } else {
            Ok(default)
        }
    }

    // ── Child nodes ─────────────────────────────────────────────────────

    pub fn add_node(&mut self, name: impl Into<String>) -> &mut Node {
        self.nodes.push(Node::new(name));
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    pub fn add_child(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn require_node(&self, name: &str) -> Result<&Node, NodeError> {
        self.get_node(name).ok_or_else(|| NodeError::MissingNode {
            name: name.to_string(),
        })
    }

    pub fn get_nodes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.name == name)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.nodes.is_empty()
    }

    // ── JSON rendering ──────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, NodeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, NodeError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_and_nodes() {
        let mut root = Node::new("MODULE");
        root.add_value("hangarState", "Active");
        root.add_node("STORED_VESSELS").add_value("count", 2);
        assert_eq!(root.get_value("hangarState"), Some("Active"));
        assert!(root.has_node("STORED_VESSELS"));
        assert!(!root.has_node("PACKED_CONSTRUCTS"));
        assert_eq!(root.require_node("STORED_VESSELS").unwrap().parse::<u32>("count").unwrap(), 2);
    }

    #[test]
    fn test_parse_errors() {
        let mut n = Node::new("N");
        n.add_value("mass", "heavy");
        assert!(matches!(n.parse::<f64>("mass"), Err(NodeError::Invalid { .. })));
        assert!(matches!(n.parse::<f64>("cost"), Err(NodeError::Missing { .. })));
        assert_eq!(n.parse_or("cost", 3.0).unwrap(), 3.0);
    }

    #[test]
    fn test_set_value_replaces_first() {
        let mut n = Node::new("N");
        n.add_value("k", 1);
        n.add_value("k", 2);
        n.set_value("k", 9);
        assert_eq!(n.get_values("k").collect::<Vec<_>>(), vec!["9", "2"]);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut n = Node::new("ROOT");
        n.add_value("a", 1.5);
        n.add_node("CHILD").add_value("b", "x");
        let back = Node::from_json(&n.to_json().unwrap()).unwrap();
        assert_eq!(back, n);
    }
}
