//! Interception options
//!
//! The two historical call shapes — "wrap everything in this exception
//! kind" and "just apply this policy" — are named variants of one union,
//! so resolving them is a match, not a structural sniff.

use crate::exception::{ExceptionKind, TagValue, Tags};
use crate::trace::TraceRequest;

/// How an intercepted call treats the exceptions it catches.
#[derive(Debug, Clone, Default)]
pub struct InterceptPolicy {
    /// Emit the exception on the channel and return normally instead of
    /// rethrowing it
    pub handle_only: bool,

    /// Message to surface from constructed exceptions instead of the raw
    /// error message
    pub custom_response_message: Option<String>,

    /// Kind to wrap the raw error in before any exception construction
    pub error_wrapper: Option<ExceptionKind>,

    /// Tags merged onto the resulting exception; tags already on the
    /// error win (closer to the throw)
    pub tags: Tags,

    /// Bracket the call in a span with this context
    pub create_trace: Option<TraceRequest>,
}

impl InterceptPolicy {
    /// The default policy: rethrow, no wrapping, no tracing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit instead of rethrowing.
    pub fn handle_only(mut self) -> Self {
        self.handle_only = true;
        self
    }

    /// Surface this message from constructed exceptions.
    pub fn response_message(mut self, message: impl Into<String>) -> Self {
        self.custom_response_message = Some(message.into());
        self
    }

    /// Wrap raw errors in this kind before anything else.
    pub fn wrap_errors_in(mut self, kind: ExceptionKind) -> Self {
        self.error_wrapper = Some(kind);
        self
    }

    /// Merge this tag onto resulting exceptions.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Bracket the call in a span.
    pub fn trace(mut self, request: TraceRequest) -> Self {
        self.create_trace = Some(request);
        self
    }
}

/// Options accepted by the interceptor: an exception kind with an optional
/// policy, or a bare policy.
#[derive(Debug, Clone)]
pub enum InterceptOptions {
    /// Wrap caught errors into `kind` (unless they are already recognized
    /// family members), then apply `policy`
    Exception {
        /// Kind to construct for caught errors
        kind: ExceptionKind,
        /// Policy applied after construction
        policy: InterceptPolicy,
    },
    /// Apply the policy without constructing any exception kind
    Policy(InterceptPolicy),
}

impl InterceptOptions {
    /// Exception-kind shape with the default policy.
    pub fn exception(kind: ExceptionKind) -> Self {
        Self::Exception {
            kind,
            policy: InterceptPolicy::default(),
        }
    }

    /// Exception-kind shape with an explicit policy.
    pub fn exception_with(kind: ExceptionKind, policy: InterceptPolicy) -> Self {
        Self::Exception { kind, policy }
    }

    /// Policy-only shape.
    pub fn policy(policy: InterceptPolicy) -> Self {
        Self::Policy(policy)
    }

    /// Split into the optional exception kind and the effective policy.
    pub(crate) fn resolve(self) -> (Option<ExceptionKind>, InterceptPolicy) {
        match self {
            Self::Exception { kind, policy } => (Some(kind), policy),
            Self::Policy(policy) => (None, policy),
        }
    }
}

impl From<InterceptPolicy> for InterceptOptions {
    fn from(policy: InterceptPolicy) -> Self {
        Self::Policy(policy)
    }
}

impl From<ExceptionKind> for InterceptOptions {
    fn from(kind: ExceptionKind) -> Self {
        Self::exception(kind)
    }
}
