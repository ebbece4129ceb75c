//! Integration tests for the error-reporting facade

use phylax_core::config::{CaptureConfig, CaptureOverrides, StaticDeployment, TraceConfig};
use phylax_core::exception::{
    CapturedError, ExceptionFamily, ExceptionKind, Tags, WrappedException,
};
use phylax_core::reporter::{
    Breadcrumb, ErrorReporter, LogSink, MemoryBackend, ReportingBackend, NO_ERROR_PROVIDED,
    REPORT_PAYLOAD_LIMIT, TRACE_ID_TAG,
};
use phylax_core::trace::{TraceBridge, TraceRequest};

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct RecordingSink {
    errors: Mutex<Vec<String>>,
    infos: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }
}

impl LogSink for RecordingSink {
    fn error(&self, message: &str, _detail: Option<&Value>) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn info(&self, message: &str, _detail: Option<&Value>) {
        self.infos.lock().unwrap().push(message.to_string());
    }
}

#[derive(Debug)]
struct FailingBackend;

#[async_trait]
impl ReportingBackend for FailingBackend {
    async fn capture_exception(
        &self,
        _error: &CapturedError,
        _tags: &Tags,
    ) -> phylax_core::error::Result<Option<String>> {
        Err(phylax_core::error::PhylaxError::Backend(
            "connection refused".to_string(),
        ))
    }

    async fn capture_message(
        &self,
        _text: &str,
        _tags: &Tags,
    ) -> phylax_core::error::Result<Option<String>> {
        Err(phylax_core::error::PhylaxError::Backend(
            "connection refused".to_string(),
        ))
    }

    async fn add_breadcrumb(&self, _breadcrumb: &Breadcrumb) -> phylax_core::error::Result<()> {
        Err(phylax_core::error::PhylaxError::Backend(
            "connection refused".to_string(),
        ))
    }
}

struct Fixture {
    reporter: ErrorReporter,
    backend: Arc<MemoryBackend>,
    sink: Arc<RecordingSink>,
}

fn fixture(deployed: bool, config: CaptureConfig) -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let sink = Arc::new(RecordingSink::default());
    let reporter = ErrorReporter::builder(backend.clone())
        .log_sink(sink.clone())
        .config(config)
        .deployment(Arc::new(StaticDeployment(deployed)))
        .build();
    Fixture {
        reporter,
        backend,
        sink,
    }
}

#[tokio::test]
async fn local_mode_logs_without_forwarding() {
    let f = fixture(false, CaptureConfig::default());

    f.reporter
        .capture_exception(Some(CapturedError::new("boom").into()))
        .await;

    assert!(f.backend.exceptions().is_empty());
    let errors = f.sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("boom"));
}

#[tokio::test]
async fn deployed_mode_forwards_and_keeps_local_visibility() {
    let f = fixture(true, CaptureConfig::default());

    f.reporter
        .capture_exception(Some(CapturedError::new("boom").into()))
        .await;

    let exceptions = f.backend.exceptions();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].0.message, "boom");
    // Backend capture is additive, not a replacement.
    assert_eq!(f.sink.errors().len(), 1);
}

#[tokio::test]
async fn tag_precedence_is_call_over_process_and_error_over_call() {
    let config = CaptureConfig {
        extra_tags: HashMap::from([("a".to_string(), "1".to_string())]),
        ..CaptureConfig::default()
    };
    let f = fixture(true, config);

    let call_tags = Tags::from([("a".to_string(), "2".into()), ("b".to_string(), "3".into())]);
    let thrown = CapturedError::new("boom").tag("b", "4");

    f.reporter
        .capture_exception_with(Some(thrown.into()), CaptureOverrides::with_tags(call_tags))
        .await;

    let (_, tags) = &f.backend.exceptions()[0];
    assert_eq!(tags.get("a"), Some(&"2".into()));
    assert_eq!(tags.get("b"), Some(&"4".into()));
    assert_eq!(tags.len(), 2);
}

#[tokio::test]
async fn missing_error_is_captured_as_a_synthetic_diagnostic() {
    let f = fixture(true, CaptureConfig::default());

    f.reporter.capture_exception(None).await;

    let exceptions = f.backend.exceptions();
    // Exactly one recursive capture, not a loop.
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].0.message, NO_ERROR_PROVIDED);
    assert!(exceptions[0].0.stack.is_some());
}

#[tokio::test]
async fn oversized_errors_warn_then_sanitize() {
    let f = fixture(true, CaptureConfig::default());

    let huge = "x".repeat(REPORT_PAYLOAD_LIMIT);
    let thrown = CapturedError::new("too big")
        .tag("t", "v")
        .aux_entry("blob", json!(huge));

    f.reporter.capture_exception(Some(thrown.into())).await;

    let messages = f.backend.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].0.contains("too big"));
    assert!(messages[0].0.contains("too large"));

    let exceptions = f.backend.exceptions();
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].0.message, "too big");
    assert!(exceptions[0].0.aux.is_empty());
}

#[tokio::test]
async fn small_errors_are_forwarded_untouched() {
    let f = fixture(true, CaptureConfig::default());

    let thrown = CapturedError::new("small").aux_entry("detail", json!("fine"));
    f.reporter.capture_exception(Some(thrown.into())).await;

    let exceptions = f.backend.exceptions();
    assert_eq!(exceptions[0].0.aux.get("detail"), Some(&json!("fine")));
    assert!(f.backend.messages().is_empty());
}

#[tokio::test]
async fn backend_failure_is_demoted_to_the_sink() {
    let sink = Arc::new(RecordingSink::default());
    let reporter = ErrorReporter::builder(Arc::new(FailingBackend))
        .log_sink(sink.clone())
        .deployment(Arc::new(StaticDeployment(true)))
        .build();

    // Must return normally; the failure surfaces only as a log line.
    reporter
        .capture_exception(Some(CapturedError::new("boom").into()))
        .await;

    let errors = sink.errors();
    assert!(errors.iter().any(|e| e.contains("failed to report exception")));
    assert!(errors.iter().any(|e| e.contains("boom")));
}

#[tokio::test]
async fn alternate_backend_is_selected_per_call() {
    let primary = Arc::new(MemoryBackend::new());
    let alternate = Arc::new(MemoryBackend::new());
    let reporter = ErrorReporter::builder(primary.clone())
        .alternate(alternate.clone())
        .log_sink(Arc::new(RecordingSink::default()))
        .deployment(Arc::new(StaticDeployment(true)))
        .build();

    let overrides = CaptureOverrides {
        use_alternate_backend: Some(true),
        ..CaptureOverrides::default()
    };
    reporter
        .capture_exception_with(Some(CapturedError::new("boom").into()), overrides)
        .await;

    assert!(primary.exceptions().is_empty());
    assert_eq!(alternate.exceptions().len(), 1);
}

#[tokio::test]
async fn family_members_report_under_their_kind_name() {
    let backend = Arc::new(MemoryBackend::new());
    let reporter = ErrorReporter::builder(backend.clone())
        .log_sink(Arc::new(RecordingSink::default()))
        .family(ExceptionFamily::with_kinds([ExceptionKind::new(
            "ApiException",
        )]))
        .deployment(Arc::new(StaticDeployment(true)))
        .build();

    let thrown = WrappedException::wrap(
        ExceptionKind::new("ApiException"),
        CapturedError::new("inner detail"),
    );
    reporter.capture_exception(Some(thrown.into())).await;

    let exceptions = backend.exceptions();
    assert_eq!(exceptions[0].0.display_name(), "ApiException");
    assert_eq!(exceptions[0].0.message, "inner detail");
}

#[tokio::test]
async fn trace_correlation_tag_rides_along() {
    let f = fixture(true, CaptureConfig::default());
    let bridge = TraceBridge::new(&TraceConfig::default());
    let span = bridge.start(&TraceRequest::new("op"));
    let context = span.context();

    TraceBridge::scope(context, async {
        f.reporter
            .capture_exception(Some(CapturedError::new("boom").into()))
            .await;
    })
    .await;
    bridge.finish(Some(span));

    let (_, tags) = &f.backend.exceptions()[0];
    assert_eq!(
        tags.get(TRACE_ID_TAG),
        Some(&context.trace_id.to_string().into())
    );
}

#[tokio::test]
async fn messages_go_to_backend_only_when_deployed() {
    let deployed = fixture(true, CaptureConfig::default());
    deployed.reporter.capture_message("heads up").await;
    assert_eq!(deployed.backend.messages().len(), 1);
    assert!(deployed.sink.infos().is_empty());

    let local = fixture(false, CaptureConfig::default());
    local.reporter.capture_message("heads up").await;
    assert!(local.backend.messages().is_empty());
    assert_eq!(local.sink.infos(), vec!["heads up".to_string()]);
}

#[tokio::test]
async fn breadcrumbs_follow_the_deployment_branch() {
    let deployed = fixture(true, CaptureConfig::default());
    deployed
        .reporter
        .capture_breadcrumb(Breadcrumb::new("clicked").data_entry("button", json!("save")))
        .await;
    assert_eq!(deployed.backend.breadcrumbs().len(), 1);

    let local = fixture(false, CaptureConfig::default());
    local
        .reporter
        .capture_breadcrumb(Breadcrumb::new("clicked"))
        .await;
    assert!(local.backend.breadcrumbs().is_empty());
    assert_eq!(local.sink.infos(), vec!["clicked".to_string()]);
}

#[tokio::test]
async fn sanitize_exception_override_applies_per_call() {
    let f = fixture(true, CaptureConfig::default());

    let overrides = CaptureOverrides {
        sanitize_exception: Some(true),
        ..CaptureOverrides::default()
    };
    let thrown = CapturedError::named("KeepName", "boom").tag("dropped", "tag");

    f.reporter
        .capture_exception_with(Some(thrown.into()), overrides)
        .await;

    let exceptions = f.backend.exceptions();
    // Fresh instance of the same kind: name survives, error-side tags are
    // rebuilt from scratch.
    assert_eq!(exceptions[0].0.display_name(), "KeepName");
    assert!(exceptions[0].0.tags.is_empty());
}
