//! Semantic exception wrappers and the recognized-kind family

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use super::captured::{CapturedError, Tags};

/// Discriminator for a semantic exception shape.
///
/// A kind is an explicit capability tag: a wrapped exception either carries
/// a recognized kind or it does not. Membership never depends on structural
/// inspection of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionKind {
    name: Cow<'static, str>,
}

impl ExceptionKind {
    /// Create a kind from a static name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
        }
    }

    /// Create a kind from a runtime name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
        }
    }

    /// The kind's name, used as the reported error type.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Kind emitted when a process panic is intercepted
pub const UNCAUGHT_PANIC: ExceptionKind = ExceptionKind::new("UncaughtPanic");

/// Kind emitted when a detached task failure is intercepted
pub const UNHANDLED_REJECTION: ExceptionKind = ExceptionKind::new("UnhandledRejection");

/// A semantic exception: a recognized kind carrying an inner error and tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedException {
    /// The kind discriminator
    pub kind: ExceptionKind,

    /// The underlying error, when one was available at construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CapturedError>,

    /// Message to surface instead of the inner error's message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_message: Option<String>,

    /// Tags carried by the wrapper
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub tags: Tags,
}

impl WrappedException {
    /// Wrap an inner error in a kind.
    pub fn wrap(kind: ExceptionKind, error: CapturedError) -> Self {
        Self {
            kind,
            error: Some(error),
            response_message: None,
            tags: Tags::new(),
        }
    }

    /// Construct with an optional inner error and response message,
    /// mirroring the fallback chain of an exception constructor: inner
    /// error preferred, then message-only, then empty.
    pub fn build(
        kind: ExceptionKind,
        error: Option<CapturedError>,
        response_message: Option<String>,
    ) -> Self {
        Self {
            kind,
            error,
            response_message,
            tags: Tags::new(),
        }
    }

    /// Construct with a response message and no inner error.
    pub fn message_only(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Self::build(kind, None, Some(message.into()))
    }

    /// Construct with nothing but the kind.
    pub fn empty(kind: ExceptionKind) -> Self {
        Self::build(kind, None, None)
    }

    /// The message this exception surfaces: response message first, then
    /// the inner error's message, then the kind name.
    pub fn message(&self) -> &str {
        if let Some(message) = &self.response_message {
            message
        } else if let Some(error) = &self.error {
            &error.message
        } else {
            self.kind.name()
        }
    }
}

impl fmt::Display for WrappedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message())
    }
}

impl std::error::Error for WrappedException {}

/// Process-wide set of recognized exception kinds.
///
/// Configured once at startup and read on every capture. Membership is a
/// linear scan over the registered kinds, so the family is expected to
/// stay small.
#[derive(Debug, Clone, Default)]
pub struct ExceptionFamily {
    kinds: Vec<ExceptionKind>,
}

impl ExceptionFamily {
    /// An empty family: every wrapped exception is treated as unrecognized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a family from a set of kinds.
    pub fn with_kinds(kinds: impl IntoIterator<Item = ExceptionKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Register a kind.
    pub fn register(&mut self, kind: ExceptionKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    /// Whether the kind is recognized.
    pub fn contains(&self, kind: &ExceptionKind) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    /// Whether a thrown value is a recognized semantic exception.
    pub fn is_member(&self, caught: &Caught) -> bool {
        match caught {
            Caught::Wrapped(wrapped) => self.contains(&wrapped.kind),
            Caught::Error(_) => false,
        }
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the family is empty.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// A thrown value at the capture boundary: either a plain error or a
/// semantic exception wrapper. The two call shapes are named variants, so
/// no structural sniffing is needed to tell them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Caught {
    /// A semantic exception wrapper
    Wrapped(WrappedException),
    /// A plain error
    Error(CapturedError),
}

impl Caught {
    /// The message the thrown value surfaces.
    pub fn message(&self) -> &str {
        match self {
            Caught::Wrapped(wrapped) => wrapped.message(),
            Caught::Error(error) => &error.message,
        }
    }

    /// Tags currently attached to the thrown value.
    pub fn tags(&self) -> &Tags {
        match self {
            Caught::Wrapped(wrapped) => &wrapped.tags,
            Caught::Error(error) => &error.tags,
        }
    }

    /// Mutable access to the attached tags.
    pub fn tags_mut(&mut self) -> &mut Tags {
        match self {
            Caught::Wrapped(wrapped) => &mut wrapped.tags,
            Caught::Error(error) => &mut error.tags,
        }
    }
}

impl fmt::Display for Caught {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caught::Wrapped(wrapped) => wrapped.fmt(f),
            Caught::Error(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for Caught {}

impl From<CapturedError> for Caught {
    fn from(error: CapturedError) -> Self {
        Caught::Error(error)
    }
}

impl From<WrappedException> for Caught {
    fn from(wrapped: WrappedException) -> Self {
        Caught::Wrapped(wrapped)
    }
}

impl From<anyhow::Error> for Caught {
    fn from(err: anyhow::Error) -> Self {
        Caught::Error(err.into())
    }
}

impl From<String> for Caught {
    fn from(message: String) -> Self {
        Caught::Error(CapturedError::new(message))
    }
}

impl From<&str> for Caught {
    fn from(message: &str) -> Self {
        Caught::Error(CapturedError::new(message))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Caught {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Caught::Error(CapturedError::new(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_membership_is_an_explicit_kind_check() {
        let family = ExceptionFamily::with_kinds([ExceptionKind::new("ApiException")]);

        let recognized = Caught::from(WrappedException::wrap(
            ExceptionKind::new("ApiException"),
            CapturedError::new("boom"),
        ));
        let unrecognized = Caught::from(WrappedException::wrap(
            ExceptionKind::new("OtherException"),
            CapturedError::new("boom"),
        ));
        let plain = Caught::from(CapturedError::new("boom"));

        assert!(family.is_member(&recognized));
        assert!(!family.is_member(&unrecognized));
        assert!(!family.is_member(&plain));
    }

    #[test]
    fn register_deduplicates_kinds() {
        let mut family = ExceptionFamily::new();
        family.register(UNCAUGHT_PANIC);
        family.register(UNCAUGHT_PANIC);
        assert_eq!(family.len(), 1);
    }

    #[test]
    fn wrapper_message_fallback_chain() {
        let kind = ExceptionKind::new("ApiException");

        let with_inner = WrappedException::wrap(kind.clone(), CapturedError::new("inner"));
        assert_eq!(with_inner.message(), "inner");

        let with_response = WrappedException::message_only(kind.clone(), "client-safe");
        assert_eq!(with_response.message(), "client-safe");

        let empty = WrappedException::empty(kind);
        assert_eq!(empty.message(), "ApiException");
    }
}
