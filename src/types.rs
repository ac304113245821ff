use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize, de};

/// Identifies one hint request (or one trace) within an assignment.
///
/// Request traces are named after the request they end in, so the same key
/// addresses both a trace and the hints written for it.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Serialize, Deserialize)]
pub struct RequestKey {
    /// The assignment the request belongs to.
    pub assignment_id: String,
    /// The request (or trace) identifier.
    pub request_id:    String,
}

impl RequestKey {
    /// Creates a key from anything string-like.
    pub fn new(assignment_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            request_id:    request_id.into(),
        }
    }

    /// Returns the assignment identifier.
    pub fn assignment_id(&self) -> &str {
        &self.assignment_id
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.assignment_id, self.request_id)
    }
}

/// Deserializes an identifier column that may have been exported as a string
/// or as a bare number.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected an identifier, found {other}"))),
    }
}

/// Like [`id_string`], but for nullable columns.
pub(crate) fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!("expected an identifier, found {other}"))),
    }
}

/// Deserializes a boolean column that may have been exported as `true`,
/// `"TRUE"`, `1` or `null`. Null means absent.
pub(crate) fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Bool(b) => Ok(Some(b)),
        serde_json::Value::Number(n) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "1" => Ok(Some(true)),
            "false" | "f" | "no" | "0" => Ok(Some(false)),
            "" => Ok(None),
            other => Err(de::Error::custom(format!("expected a boolean, found `{other}`"))),
        },
        other => Err(de::Error::custom(format!("expected a boolean, found {other}"))),
    }
}
