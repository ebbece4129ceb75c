//! Call interception
//!
//! Higher-order wrapping of application operations: exceptions from the
//! wrapped call are normalized against the configured policy and either
//! emitted on the exception channel or returned to the caller, with the
//! call optionally bracketed by a trace span.
//!
//! Per invocation the flow is linear: Running, then Caught when the call
//! fails, then Resolved as either Emit or Rethrow. A caught exception is
//! handled exactly once.

use std::future::Future;
use std::sync::Arc;

use crate::exception::{Caught, CapturedError, ExceptionFamily, ExceptionKind, WrappedException};
use crate::intercept::channel::ExceptionChannel;
use crate::intercept::options::{InterceptOptions, InterceptPolicy};
use crate::trace::{Span, TraceBridge};

/// Wraps application operations with catch/emit/rethrow semantics.
///
/// One interceptor is wired per process with the recognized exception
/// family, the shared exception channel, and the trace bridge; it is cheap
/// to clone and share.
#[derive(Debug, Clone)]
pub struct Interceptor {
    family: ExceptionFamily,
    channel: Arc<ExceptionChannel>,
    bridge: TraceBridge,
}

impl Interceptor {
    /// Create an interceptor.
    pub fn new(
        family: ExceptionFamily,
        channel: Arc<ExceptionChannel>,
        bridge: TraceBridge,
    ) -> Self {
        Self {
            family,
            channel,
            bridge,
        }
    }

    /// The exception channel `handle_only` dispositions emit to.
    pub fn channel(&self) -> &ExceptionChannel {
        &self.channel
    }

    /// The trace bridge used for span bracketing.
    pub fn bridge(&self) -> &TraceBridge {
        &self.bridge
    }

    /// Run an async operation under this interceptor.
    ///
    /// On success the operation's value comes back as `Ok(Some(value))`.
    /// A failure handled by a `handle_only` policy is emitted on the
    /// channel and the call returns `Ok(None)`; otherwise the resulting
    /// exception is returned as `Err` for the caller to deal with.
    ///
    /// When the policy requests a trace and tracing is enabled, the
    /// operation runs inside a span nested under the ambient trace (or a
    /// new root when none is active), and the span is finished on every
    /// exit path, including cancellation of the returned future.
    pub async fn run<T, E, F, Fut>(
        &self,
        options: impl Into<InterceptOptions>,
        f: F,
    ) -> Result<Option<T>, Caught>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Caught>,
    {
        let (kind, policy) = options.into().resolve();
        let span = self.maybe_span(&policy);

        let result = match &span {
            Some(span) => TraceBridge::scope(span.context(), f()).await,
            None => f().await,
        };
        self.bridge.finish(span);

        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) => self.dispose(error.into(), kind, policy),
        }
    }

    /// Run a synchronous operation under this interceptor.
    ///
    /// Same semantics as [`run`](Self::run); the ambient trace is carried
    /// on the current thread instead of the task.
    pub fn run_sync<T, E, F>(
        &self,
        options: impl Into<InterceptOptions>,
        f: F,
    ) -> Result<Option<T>, Caught>
    where
        F: FnOnce() -> Result<T, E>,
        E: Into<Caught>,
    {
        let (kind, policy) = options.into().resolve();
        let span = self.maybe_span(&policy);

        let result = match &span {
            Some(span) => TraceBridge::scope_sync(span.context(), f),
            None => f(),
        };
        self.bridge.finish(span);

        match result {
            Ok(value) => Ok(Some(value)),
            Err(error) => self.dispose(error.into(), kind, policy),
        }
    }

    fn maybe_span(&self, policy: &InterceptPolicy) -> Option<Span> {
        let request = policy.create_trace.as_ref()?;
        if !self.bridge.is_enabled() {
            return None;
        }
        Some(self.bridge.start(request))
    }

    /// Caught -> Resolved(Emit | Rethrow).
    fn dispose<T>(
        &self,
        caught: Caught,
        kind: Option<ExceptionKind>,
        policy: InterceptPolicy,
    ) -> Result<Option<T>, Caught> {
        let mut caught = caught;

        if let Some(wrapper) = &policy.error_wrapper {
            caught = wrap_raw(wrapper.clone(), caught);
        }

        if let Some(kind) = kind {
            caught = self.apply_exception_kind(kind, caught, &policy);
        }

        merge_policy_tags(&mut caught, &policy);

        if policy.handle_only {
            self.channel.emit(caught);
            Ok(None)
        } else {
            Err(caught)
        }
    }

    /// Construct the configured exception kind around the caught value,
    /// unless it is already a recognized family member (no double-wrap).
    fn apply_exception_kind(
        &self,
        kind: ExceptionKind,
        caught: Caught,
        policy: &InterceptPolicy,
    ) -> Caught {
        if self.family.is_member(&caught) {
            return caught;
        }
        let inner = flatten(caught);
        WrappedException::build(kind, Some(inner), policy.custom_response_message.clone()).into()
    }
}

/// Wrap whatever was thrown into the policy's wrapper kind.
fn wrap_raw(kind: ExceptionKind, caught: Caught) -> Caught {
    WrappedException::wrap(kind, flatten(caught)).into()
}

/// Collapse a thrown value into one canonical error, keeping its tags.
fn flatten(caught: Caught) -> CapturedError {
    match caught {
        Caught::Error(error) => error,
        Caught::Wrapped(wrapped) => {
            let kind_name = wrapped.kind.name().to_string();
            let wrapper_tags = wrapped.tags;
            let mut error = match wrapped.error {
                Some(mut inner) => {
                    inner.rename(&kind_name);
                    inner
                }
                None => {
                    let message = wrapped.response_message.unwrap_or_else(|| kind_name.clone());
                    CapturedError::named(kind_name, message)
                }
            };
            for (key, value) in wrapper_tags {
                error.tags.entry(key).or_insert(value);
            }
            error
        }
    }
}

/// Merge policy tags onto the exception. Tags already present win, since
/// they were attached closer to where the error was thrown.
fn merge_policy_tags(caught: &mut Caught, policy: &InterceptPolicy) {
    if policy.tags.is_empty() {
        return;
    }
    let tags = caught.tags_mut();
    for (key, value) in &policy.tags {
        tags.entry(key.clone()).or_insert_with(|| value.clone());
    }
}
