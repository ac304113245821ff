#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One value inside a program tree.
///
/// Snap! ASTs are JSON objects with a `type` and a `children` object. Anything
/// else that shows up where a node is expected (literals, `null`, objects
/// without a string `type`) is kept as [`AstNode::Other`] so it round-trips,
/// but traversal treats it as a leaf that contributes nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AstNode {
    /// A structural node with a type tag.
    Node(Node),
    /// A non-structural value.
    Other(Value),
}

/// A structural AST node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// The block or node type, e.g. `doSayFor` or `script`.
    #[serde(rename = "type")]
    kind:       String,
    /// Child nodes by slot name.
    children:   BTreeMap<String, AstNode>,
    /// Remaining attributes (`value`, `id`, ...), kept verbatim.
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl Node {
    /// Creates a node with no children or attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind:       kind.into(),
            children:   BTreeMap::new(),
            attributes: Map::new(),
        }
    }

    /// Adds a child under `key`, replacing any previous child there.
    pub fn with_child(mut self, key: impl Into<String>, child: impl Into<AstNode>) -> Self {
        self.children.insert(key.into(), child.into());
        self
    }

    /// Returns the node type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the children keyed by slot name.
    pub fn children(&self) -> &BTreeMap<String, AstNode> {
        &self.children
    }

    /// Returns attributes other than `type` and `children`.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // unlink descendants one level at a time
        let mut pending: Vec<AstNode> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(current) = pending.pop() {
            if let AstNode::Node(mut node) = current {
                pending.extend(std::mem::take(&mut node.children).into_values());
            }
        }
    }
}

impl From<Node> for AstNode {
    fn from(node: Node) -> Self {
        AstNode::Node(node)
    }
}

impl<'de> Deserialize<'de> for AstNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(AstNode::from_value)
    }
}

/// Decodes JSON text of any nesting depth; the decoder grows its stack on
/// demand instead of stopping at serde_json's default limit.
pub fn parse_value(source: &str) -> Result<Value, serde_json::Error> {
    let mut json = serde_json::Deserializer::from_str(source);
    json.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

/// A node whose children are still being converted.
struct PartialNode {
    /// Node type.
    kind:       String,
    /// Attributes other than `type` and `children`.
    attributes: Map<String, Value>,
    /// Children not yet converted, last slot first.
    pending:    Vec<(String, Value)>,
    /// Slot of the child currently being converted.
    slot:       Option<String>,
    /// Converted children.
    children:   BTreeMap<String, AstNode>,
}

impl PartialNode {
    /// Starts converting `value`, or hands it back if it is not a node.
    fn open(value: Value) -> Result<Self, Value> {
        let Value::Object(mut map) = value else {
            return Err(value);
        };

        let kind = map.remove("type");
        let children = map.remove("children");
        let (kind, children) = match (kind, children) {
            (Some(Value::String(kind)), None) => (kind, Map::new()),
            (Some(Value::String(kind)), Some(Value::Object(children))) => (kind, children),
            (kind, children) => {
                if let Some(kind) = kind {
                    map.insert("type".to_string(), kind);
                }
                if let Some(children) = children {
                    map.insert("children".to_string(), children);
                }
                return Err(Value::Object(map));
            }
        };

        let mut pending: Vec<(String, Value)> = children.into_iter().collect();
        pending.reverse();
        Ok(Self {
            kind,
            attributes: map,
            pending,
            slot: None,
            children: BTreeMap::new(),
        })
    }

    /// Next child to convert; remembers its slot for [`PartialNode::attach`].
    fn next_child(&mut self) -> Option<Value> {
        let (slot, value) = self.pending.pop()?;
        self.slot = Some(slot);
        Some(value)
    }

    /// Stores the converted form of the child last handed out.
    fn attach(&mut self, child: AstNode) {
        if let Some(slot) = self.slot.take() {
            self.children.insert(slot, child);
        }
    }

    /// Finishes the node.
    fn close(self) -> AstNode {
        AstNode::Node(Node {
            kind:       self.kind,
            children:   self.children,
            attributes: self.attributes,
        })
    }
}

impl AstNode {
    /// Decodes an AST from its JSON text.
    pub fn parse(source: &str) -> Result<Self, serde_json::Error> {
        parse_value(source).map(AstNode::from_value)
    }

    /// Converts an already-decoded JSON value. Never fails: values that are not
    /// nodes become [`AstNode::Other`].
    pub fn from_value(value: Value) -> Self {
        let mut open: Vec<PartialNode> = Vec::new();
        let mut incoming = Some(value);
        let mut finished: Option<AstNode> = None;

        loop {
            if let Some(value) = incoming.take() {
                match PartialNode::open(value) {
                    Ok(partial) => open.push(partial),
                    Err(other) => finished = Some(AstNode::Other(other)),
                }
            }

            let Some(top) = open.last_mut() else {
                return finished.unwrap_or(AstNode::Other(Value::Null));
            };
            if let Some(child) = finished.take() {
                top.attach(child);
            }
            match top.next_child() {
                Some(child) => incoming = Some(child),
                None => finished = open.pop().map(PartialNode::close),
            }
        }
    }

    /// Returns the structural node, if this is one.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            AstNode::Node(node) => Some(node),
            AstNode::Other(_) => None,
        }
    }

    /// Returns true for nodes with a type tag.
    pub fn is_structural(&self) -> bool {
        matches!(self, AstNode::Node(_))
    }

    /// Returns the node type, if structural.
    pub fn kind(&self) -> Option<&str> {
        self.as_node().map(Node::kind)
    }

    /// Depth-first iterator over every structural node in the tree, root
    /// first.
    ///
    /// Uses an explicit stack, so tree depth is bounded by memory rather than
    /// by the call stack.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    /// Number of structural nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }
}

/// Iterator returned by [`AstNode::nodes`].
pub struct Nodes<'a> {
    /// Values still to visit.
    stack: Vec<&'a AstNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let AstNode::Node(node) = current {
                // reversed so siblings come out in key order
                self.stack.extend(node.children.values().rev());
                return Some(node);
            }
        }
        None
    }
}
