//! Ordered document model for the line-oriented `key: value` config format.
//!
//! The document keeps every line of the original file as a node — entries,
//! standalone comments, and blanks — so a render after programmatic mutation
//! preserves human-authored comments and ordering. A `#` comment on the line
//! immediately following an entry is attached to that entry and travels with
//! it.

use serde_json::Value;

use crate::storage::error::{Result, StorageError};

/// A single line of a config document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A `key: value` line, with an optional comment from the following line.
    Entry {
        key: String,
        value: Value,
        comment: Option<String>,
    },
    /// A standalone `#` comment line (text without the leading `#`).
    Comment(String),
    /// An empty line.
    Blank,
}

/// Parsed, ordered representation of a config file.
///
/// Keys are unique; a duplicate key is a parse error so that the value
/// mapping view of the document is always well-defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    nodes: Vec<Node>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Parse a document from text.
    ///
    /// Every line must be blank, a `#` comment, or a top-level `key: value`
    /// pair; anything else (indented lines, lines without a separator,
    /// duplicate keys) is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let mut nodes: Vec<Node> = Vec::new();
        // Whether the previous line was an entry still missing its comment.
        let mut last_line_was_entry = false;

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim_end();

            if line.trim().is_empty() {
                nodes.push(Node::Blank);
                last_line_was_entry = false;
                continue;
            }

            if let Some(comment) = line.trim_start().strip_prefix('#') {
                if last_line_was_entry {
                    // last_line_was_entry guarantees the last node is an
                    // entry without a comment yet.
                    if let Some(Node::Entry { comment: slot, .. }) = nodes.last_mut() {
                        *slot = Some(comment.to_string());
                        last_line_was_entry = false;
                        continue;
                    }
                }
                nodes.push(Node::Comment(comment.to_string()));
                last_line_was_entry = false;
                continue;
            }

            if line.starts_with(char::is_whitespace) {
                return Err(StorageError::MalformedDocument {
                    line: idx + 1,
                    reason: "indented line; only top-level keys are supported".to_string(),
                });
            }

            let (key, value_text) = match line.split_once(':') {
                Some((key, rest)) => (key.trim_end(), rest.trim()),
                None => {
                    return Err(StorageError::MalformedDocument {
                        line: idx + 1,
                        reason: "expected 'key: value'".to_string(),
                    });
                }
            };
            if key.is_empty() {
                return Err(StorageError::MalformedDocument {
                    line: idx + 1,
                    reason: "empty key".to_string(),
                });
            }
            if nodes.iter().any(|n| matches!(n, Node::Entry { key: k, .. } if k == key)) {
                return Err(StorageError::MalformedDocument {
                    line: idx + 1,
                    reason: format!("duplicate key '{key}'"),
                });
            }

            let value = parse_scalar(value_text)?;
            // Flow-style collections ([1, 2], {a: 1}) parse as YAML but
            // could not be rendered back onto a single line; treating them
            // as malformed keeps parse and render accepting the same
            // value set.
            if value.is_array() || value.is_object() {
                return Err(StorageError::MalformedDocument {
                    line: idx + 1,
                    reason: "collection values are not supported".to_string(),
                });
            }
            nodes.push(Node::Entry {
                key: key.to_string(),
                value,
                comment: None,
            });
            last_line_was_entry = true;
        }

        Ok(Self { nodes })
    }

    /// Render the document back to text. Deterministic: parsing the result
    /// yields an equal document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Entry { key, value, comment } => {
                    out.push_str(key);
                    out.push_str(": ");
                    out.push_str(&render_scalar_infallible(value));
                    out.push('\n');
                    if let Some(comment) = comment {
                        out.push('#');
                        out.push_str(comment);
                        out.push('\n');
                    }
                }
                Node::Comment(text) => {
                    out.push('#');
                    out.push_str(text);
                    out.push('\n');
                }
                Node::Blank => out.push('\n'),
            }
        }
        out
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.nodes.iter().find_map(|n| match n {
            Node::Entry { key: k, value, .. } if k == key => Some(value),
            _ => None,
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Update an existing entry in place. Returns false if the key is absent.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        for node in &mut self.nodes {
            if let Node::Entry { key: k, value: slot, .. } = node {
                if k == key {
                    *slot = value;
                    return true;
                }
            }
        }
        false
    }

    /// Append a new entry (with optional trailing comment) at the end.
    pub fn push_entry(&mut self, key: impl Into<String>, value: Value, comment: Option<String>) {
        self.nodes.push(Node::Entry {
            key: key.into(),
            value,
            comment,
        });
    }

    /// All keys, in document order.
    pub fn keys(&self) -> Vec<String> {
        self.entries().map(|(k, _, _)| k.to_string()).collect()
    }

    /// Iterate entries as (key, value, comment) in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value, Option<&str>)> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Entry { key, value, comment } => {
                Some((key.as_str(), value, comment.as_deref()))
            }
            _ => None,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// Parse one scalar value as YAML into a JSON value.
fn parse_scalar(text: &str) -> Result<Value> {
    if text.is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(text).map_err(|e| StorageError::Deserialization {
        format: "yaml".to_string(),
        source: Box::new(e),
    })
}

/// Render a JSON value as a single-line YAML scalar.
pub(crate) fn render_scalar(value: &Value) -> Result<String> {
    if value.is_array() || value.is_object() {
        return Err(StorageError::Serialization {
            format: "yaml".to_string(),
            source: format!("non-scalar value cannot be rendered on a single line: {value}")
                .into(),
        });
    }
    let rendered = serde_yaml::to_string(value).map_err(|e| StorageError::Serialization {
        format: "yaml".to_string(),
        source: Box::new(e),
    })?;
    let rendered = rendered.trim_end().to_string();
    // Strings containing newlines come back as multi-line block scalars,
    // which the line-oriented format cannot hold.
    if rendered.contains('\n') {
        return Err(StorageError::Serialization {
            format: "yaml".to_string(),
            source: format!("value does not fit on a single line: {value}").into(),
        });
    }
    Ok(rendered)
}

// Values reaching render() went through parse_scalar or a checked
// render_scalar, so scalar rendering here cannot fail.
fn render_scalar_infallible(value: &Value) -> String {
    render_scalar(value).unwrap_or_else(|_| "null".to_string())
}
