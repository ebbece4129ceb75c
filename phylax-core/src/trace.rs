//! Trace context bridging
//!
//! Resolves and propagates the ambient trace (trace id, parent span id)
//! across the interceptor boundary so spans nest correctly, including
//! across asynchronous suspension. Async call chains carry the context in
//! a tokio task-local; synchronous brackets use a thread-local stack.
//!
//! Spans are scoped to exactly one call chain and finished on every exit
//! path. A span dropped unfinished (host-side cancellation) is finished by
//! its `Drop` impl, so release is guaranteed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use uuid::Uuid;

use crate::config::TraceConfig;

tokio::task_local! {
    static ASYNC_TRACE: TraceContext;
}

thread_local! {
    static SYNC_TRACE: RefCell<Vec<TraceContext>> = const { RefCell::new(Vec::new()) };
}

/// The ambient trace position: which trace is active and which span new
/// work should nest under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
    /// Trace this call chain belongs to
    pub trace_id: Uuid,
    /// Span new child spans nest under
    pub span_id: Uuid,
}

/// Span-creation context supplied by an interceptor policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceRequest {
    /// Span name
    pub name: String,
    /// Metadata attached to the span
    pub fields: serde_json::Map<String, Value>,
}

impl TraceRequest {
    /// Request a span with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: serde_json::Map::new(),
        }
    }

    /// Attach a metadata field.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// A live span. Created and finished strictly within one interceptor
/// invocation; never shared across call chains.
#[derive(Debug)]
pub struct Span {
    trace_id: Uuid,
    span_id: Uuid,
    parent_span_id: Option<Uuid>,
    name: String,
    fields: serde_json::Map<String, Value>,
    started_at: Instant,
    started_at_utc: DateTime<Utc>,
    finished: bool,
    sink: Arc<dyn SpanSink>,
}

impl Span {
    /// The context nested work should run under.
    pub fn context(&self) -> TraceContext {
        TraceContext {
            trace_id: self.trace_id,
            span_id: self.span_id,
        }
    }

    /// Whether this span starts a new trace.
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }

    fn finish_inner(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let finished = FinishedSpan {
            trace_id: self.trace_id,
            span_id: self.span_id,
            parent_span_id: self.parent_span_id,
            name: std::mem::take(&mut self.name),
            fields: std::mem::take(&mut self.fields),
            started_at: self.started_at_utc,
            duration_ms: self.started_at.elapsed().as_millis() as u64,
        };
        self.sink.on_finish(&finished);
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        // Cancellation backstop: a span abandoned mid-flight still gets
        // released exactly once.
        self.finish_inner();
    }
}

/// An immutable record of a completed span, handed to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct FinishedSpan {
    /// Trace the span belonged to
    pub trace_id: Uuid,
    /// Span id
    pub span_id: Uuid,
    /// Parent span, `None` for roots
    pub parent_span_id: Option<Uuid>,
    /// Span name
    pub name: String,
    /// Metadata fields
    pub fields: serde_json::Map<String, Value>,
    /// Wall-clock start time
    pub started_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Destination for completed spans.
pub trait SpanSink: Send + Sync + std::fmt::Debug {
    /// Called exactly once per span, on whichever path finished it.
    fn on_finish(&self, span: &FinishedSpan);
}

/// Default sink: emits completed spans as `tracing` debug events.
#[derive(Debug, Default)]
pub struct TracingSpanSink;

impl SpanSink for TracingSpanSink {
    fn on_finish(&self, span: &FinishedSpan) {
        tracing::debug!(
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            parent_span_id = ?span.parent_span_id,
            duration_ms = span.duration_ms,
            "span finished: {}",
            span.name
        );
    }
}

/// Sink that retains completed spans in memory, for tests and embedders
/// that export in bulk.
#[derive(Debug, Default)]
pub struct RecordingSpanSink {
    spans: Mutex<Vec<FinishedSpan>>,
}

impl RecordingSpanSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the spans finished so far.
    pub fn finished(&self) -> Vec<FinishedSpan> {
        self.spans.lock().expect("span sink poisoned").clone()
    }
}

impl SpanSink for RecordingSpanSink {
    fn on_finish(&self, span: &FinishedSpan) {
        self.spans.lock().expect("span sink poisoned").push(span.clone());
    }
}

/// Bridges the ambient trace context into and out of interceptor calls.
#[derive(Debug, Clone)]
pub struct TraceBridge {
    enabled: bool,
    sink: Arc<dyn SpanSink>,
}

impl TraceBridge {
    /// Bridge with the default tracing-event sink.
    pub fn new(config: &TraceConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSpanSink))
    }

    /// Bridge with a custom span sink.
    pub fn with_sink(config: &TraceConfig, sink: Arc<dyn SpanSink>) -> Self {
        Self {
            enabled: config.enabled,
            sink,
        }
    }

    /// Bridge that never creates spans.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            sink: Arc::new(TracingSpanSink),
        }
    }

    /// Whether span creation is globally enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The trace context active on this call chain, if any.
    ///
    /// Reflects the context installed at interceptor entry even after the
    /// wrapped call suspends and resumes.
    pub fn current() -> Option<TraceContext> {
        if let Ok(context) = ASYNC_TRACE.try_with(|c| *c) {
            return Some(context);
        }
        SYNC_TRACE.with(|stack| stack.borrow().last().copied())
    }

    /// Start a span that opens a new trace.
    pub fn start_root(&self, request: &TraceRequest) -> Span {
        self.make_span(request, Uuid::new_v4(), None)
    }

    /// Start a span nested under an existing context.
    pub fn start_child(&self, parent: TraceContext, request: &TraceRequest) -> Span {
        self.make_span(request, parent.trace_id, Some(parent.span_id))
    }

    /// Start a span using the canonical nesting strategy: a child of the
    /// ambient context when one exists, otherwise a new root.
    pub fn start(&self, request: &TraceRequest) -> Span {
        match Self::current() {
            Some(parent) => self.start_child(parent, request),
            None => self.start_root(request),
        }
    }

    /// Finish a span. Safe to call with `None`; a span that already
    /// finished is left alone.
    pub fn finish(&self, span: Option<Span>) {
        if let Some(mut span) = span {
            span.finish_inner();
        }
    }

    /// Run a future with `context` as the ambient trace.
    pub async fn scope<F>(context: TraceContext, fut: F) -> F::Output
    where
        F: Future,
    {
        ASYNC_TRACE.scope(context, fut).await
    }

    /// Run a closure with `context` as the ambient trace.
    pub fn scope_sync<T>(context: TraceContext, f: impl FnOnce() -> T) -> T {
        SYNC_TRACE.with(|stack| stack.borrow_mut().push(context));
        let _guard = SyncScopeGuard;
        f()
    }

    fn make_span(
        &self,
        request: &TraceRequest,
        trace_id: Uuid,
        parent_span_id: Option<Uuid>,
    ) -> Span {
        Span {
            trace_id,
            span_id: Uuid::new_v4(),
            parent_span_id,
            name: request.name.clone(),
            fields: request.fields.clone(),
            started_at: Instant::now(),
            started_at_utc: Utc::now(),
            finished: false,
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Pops the sync-scope stack even when the scoped closure panics.
struct SyncScopeGuard;

impl Drop for SyncScopeGuard {
    fn drop(&mut self) {
        SYNC_TRACE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recording_bridge() -> (TraceBridge, Arc<RecordingSpanSink>) {
        let sink = Arc::new(RecordingSpanSink::new());
        let bridge = TraceBridge::with_sink(&TraceConfig::default(), sink.clone());
        (bridge, sink)
    }

    #[test]
    fn no_ambient_context_outside_a_scope() {
        assert!(TraceBridge::current().is_none());
    }

    #[test]
    fn start_without_ambient_creates_a_root() {
        let (bridge, _) = recording_bridge();
        let span = bridge.start(&TraceRequest::new("op"));
        assert!(span.is_root());
    }

    #[test]
    fn sync_scope_nests_and_unwinds() {
        let (bridge, _) = recording_bridge();
        let root = bridge.start(&TraceRequest::new("outer"));
        let root_context = root.context();

        TraceBridge::scope_sync(root_context, || {
            assert_eq!(TraceBridge::current(), Some(root_context));

            let child = bridge.start(&TraceRequest::new("inner"));
            assert!(!child.is_root());
            assert_eq!(child.context().trace_id, root_context.trace_id);
            bridge.finish(Some(child));
        });

        assert!(TraceBridge::current().is_none());
        bridge.finish(Some(root));
    }

    #[tokio::test]
    async fn async_scope_survives_suspension() {
        let (bridge, _) = recording_bridge();
        let span = bridge.start(&TraceRequest::new("op"));
        let context = span.context();

        TraceBridge::scope(context, async move {
            tokio::task::yield_now().await;
            assert_eq!(TraceBridge::current(), Some(context));
        })
        .await;

        bridge.finish(Some(span));
    }

    #[test]
    fn finish_is_noop_on_none() {
        let (bridge, sink) = recording_bridge();
        bridge.finish(None);
        assert!(sink.finished().is_empty());
    }

    #[test]
    fn dropped_span_is_finished_once() {
        let (bridge, sink) = recording_bridge();
        let span = bridge.start(&TraceRequest::new("abandoned").field("k", json!(1)));
        drop(span);

        let finished = sink.finished();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].name, "abandoned");
        assert_eq!(finished[0].fields.get("k"), Some(&json!(1)));
    }

    #[test]
    fn explicit_finish_then_drop_emits_once() {
        let (bridge, sink) = recording_bridge();
        let span = bridge.start(&TraceRequest::new("op"));
        bridge.finish(Some(span));
        assert_eq!(sink.finished().len(), 1);
    }
}
