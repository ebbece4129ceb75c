//! Canonical captured-error representation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::fmt;

/// Name reported for errors that carry no explicit name
pub const DEFAULT_ERROR_NAME: &str = "Error";

/// Scalar value attached to an error as a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// String tag
    Str(String),
    /// Integer tag
    Int(i64),
    /// Float tag
    Float(f64),
    /// Boolean tag
    Bool(bool),
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Str(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::Str(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Float(v)
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        TagValue::Bool(v)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(v) => write!(f, "{}", v),
            TagValue::Int(v) => write!(f, "{}", v),
            TagValue::Float(v) => write!(f, "{}", v),
            TagValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Tag map attached to errors and capture calls
pub type Tags = HashMap<String, TagValue>;

/// The canonical error produced by normalization and consumed by the
/// reporter.
///
/// Ownership note: once handed to [`crate::reporter::ErrorReporter`], the
/// reporter owns the value's lifecycle and may rewrite `stack` and `aux` in
/// place while sanitizing. Callers must not assume the value is unchanged
/// after a capture call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedError {
    /// Explicit error name. `None` means the default name applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human-readable error message
    pub message: String,

    /// Stack trace captured where the error originated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// Tags extracted alongside the error
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: Tags,

    /// Auxiliary diagnostic data carried with the error
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub aux: serde_json::Map<String, Value>,
}

impl CapturedError {
    /// Create an error with a message and nothing else.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: None,
            message: message.into(),
            stack: None,
            tags: Tags::new(),
            aux: serde_json::Map::new(),
        }
    }

    /// Create an error with a stack trace captured at this call site.
    pub fn with_backtrace(message: impl Into<String>) -> Self {
        let mut error = Self::new(message);
        error.stack = Some(Backtrace::force_capture().to_string());
        error
    }

    /// Create an error with an explicit name.
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new(message);
        error.name = Some(name.into());
        error
    }

    /// Attach a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attach an auxiliary data entry.
    pub fn aux_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.aux.insert(key.into(), value);
        self
    }

    /// Set the stack trace.
    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// The name this error reports under, explicit or default.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_ERROR_NAME)
    }

    /// Rename the error so the reported type reflects a semantic exception.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.display_name(), self.message)
    }
}

impl std::error::Error for CapturedError {}

impl From<anyhow::Error> for CapturedError {
    fn from(err: anyhow::Error) -> Self {
        let mut error = Self::new(err.to_string());
        error.stack = Some(format!("{}", err.backtrace()));
        error
    }
}

impl From<std::io::Error> for CapturedError {
    fn from(err: std::io::Error) -> Self {
        Self::named("IoError", err.to_string())
    }
}
