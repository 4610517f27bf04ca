//! Serialized nodes
//!
//! JSON description of a node tree (`nodeName`, `attributes`, `childNodes`
//! and any extra properties such as `value` or `checked`). Trees built from
//! it have no styles or geometry and report themselves incomplete.

use crate::{Scope, VdomError, VirtualNode, VirtualTree};
use fos_dom::Namespace;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialNode {
    #[serde(default)]
    pub node_name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_nodes: Vec<SerialNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<u8>,
    /// Remaining properties (`value`, `checked`, `type`, ...)
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl SerialNode {
    pub fn element(name: &str) -> Self {
        Self {
            node_name: name.to_string(),
            node_type: Some(1),
            ..Default::default()
        }
    }

    pub fn text(value: &str) -> Self {
        Self {
            node_name: "#text".to_string(),
            node_value: Some(value.to_string()),
            node_type: Some(3),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn with_prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: SerialNode) -> Self {
        self.child_nodes.push(child);
        self
    }

    pub fn is_text(&self) -> bool {
        self.node_type == Some(3) || self.node_name == "#text"
    }
}

/// Attribute and property values as the DOM would stringify them; `null` is absent
fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl VirtualTree {
    /// Build an incomplete tree from a serialized root
    pub fn from_serial(root: &SerialNode) -> Result<Self, VdomError> {
        let mut tree = VirtualTree::new(
            Scope::Document {
                document: None,
                frame: None,
                url: None,
            },
            false,
        );
        tree.push_serial(root, None)?;
        Ok(tree)
    }

    /// Parse JSON and build an incomplete tree
    pub fn from_json(json: &str) -> Result<Self, VdomError> {
        let root: SerialNode = serde_json::from_str(json)?;
        Self::from_serial(&root)
    }

    fn push_serial(&mut self, serial: &SerialNode, parent: Option<crate::VNodeId>) -> Result<(), VdomError> {
        let scope = crate::ScopeId::ROOT;
        if serial.is_text() {
            let text = serial.node_value.as_deref().unwrap_or_default();
            let node = VirtualNode::text(self.next_id(), text, scope);
            self.push(node, parent);
            return Ok(());
        }
        if serial.node_name.trim().is_empty() {
            return Err(VdomError::InvalidSerialNode("missing nodeName".to_string()));
        }

        let namespace = match serial.node_name.to_ascii_lowercase().as_str() {
            "svg" => Namespace::Svg,
            "math" => Namespace::MathMl,
            _ => parent
                .and_then(|p| self.get(p))
                .map(|p| p.namespace.clone())
                .unwrap_or(Namespace::Html),
        };
        let mut node = VirtualNode::element(self.next_id(), &serial.node_name, namespace, scope);
        for (name, value) in &serial.attributes {
            if let Some(value) = value_string(value) {
                node.push_attr(name, &value);
            }
        }
        for (name, value) in &serial.properties {
            if let Some(value) = value_string(value) {
                node.properties.insert(name.clone(), value);
            }
        }
        let id = self.push(node, parent);
        for child in &serial.child_nodes {
            self.push_serial(child, Some(id))?;
        }
        Ok(())
    }
}
