//! Error reporting facade
//!
//! [`ErrorReporter`] orchestrates exception, message, and breadcrumb
//! capture: it normalizes thrown values, bounds their serialized size,
//! merges tags, and forwards to the configured backend when the process
//! runs in deployed mode — while always keeping local visibility through
//! the log sink. Backend failures are demoted to the sink; capture never
//! becomes a new source of failures for its callers.

mod backend;
mod sink;

pub use backend::{MemoryBackend, ReportingBackend};
pub use sink::{LogSink, TracingLogSink};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::{CaptureConfig, CaptureOverrides, DeploymentSignal, EnvDeployment};
use crate::exception::{normalize, Caught, CapturedError, ExceptionFamily, TagValue, Tags};
use crate::sanitize;
use crate::size;
use crate::trace::TraceBridge;

/// Payload ceiling of the reporting backend, in UTF-16-weighted bytes.
/// Errors estimated at or over this are sanitized before forwarding.
pub const REPORT_PAYLOAD_LIMIT: usize = 32_752;

/// Diagnostic message used when capture is invoked with no error.
pub const NO_ERROR_PROVIDED: &str = "captureException was called and no error was provided";

/// Tag key carrying the trace-correlation id.
pub const TRACE_ID_TAG: &str = "trace_id";

/// A small timestamped event attached to the ongoing diagnostic context,
/// sent alongside a later exception to reconstruct recent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// What happened
    pub message: String,

    /// Grouping category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Structured payload
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, Value>,

    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl Breadcrumb {
    /// Create a breadcrumb timestamped now.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: None,
            data: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach a data entry.
    pub fn data_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// Builder for [`ErrorReporter`].
#[derive(Debug)]
pub struct ReporterBuilder {
    primary: Arc<dyn ReportingBackend>,
    alternate: Option<Arc<dyn ReportingBackend>>,
    log_sink: Arc<dyn LogSink>,
    config: CaptureConfig,
    family: ExceptionFamily,
    deployment: Arc<dyn DeploymentSignal>,
}

impl ReporterBuilder {
    /// Start from a primary backend; everything else defaults.
    pub fn new(primary: Arc<dyn ReportingBackend>) -> Self {
        Self {
            primary,
            alternate: None,
            log_sink: Arc::new(TracingLogSink),
            config: CaptureConfig::default(),
            family: ExceptionFamily::default(),
            deployment: Arc::new(EnvDeployment::new()),
        }
    }

    /// Wire the alternate backend selected by `use_alternate_backend`.
    pub fn alternate(mut self, backend: Arc<dyn ReportingBackend>) -> Self {
        self.alternate = Some(backend);
        self
    }

    /// Replace the local log sink.
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    /// Set the process-wide capture configuration.
    pub fn config(mut self, config: CaptureConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the recognized exception family.
    pub fn family(mut self, family: ExceptionFamily) -> Self {
        self.family = family;
        self
    }

    /// Replace the deployment signal.
    pub fn deployment(mut self, signal: Arc<dyn DeploymentSignal>) -> Self {
        self.deployment = signal;
        self
    }

    /// Build the reporter.
    pub fn build(self) -> ErrorReporter {
        ErrorReporter {
            primary: self.primary,
            alternate: self.alternate,
            log_sink: self.log_sink,
            config: self.config,
            family: self.family,
            deployment: self.deployment,
        }
    }
}

/// The process-wide capture facade.
///
/// One instance is wired by the host application and shared; all capture
/// state is explicit construction-time dependencies, not hidden globals.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    primary: Arc<dyn ReportingBackend>,
    alternate: Option<Arc<dyn ReportingBackend>>,
    log_sink: Arc<dyn LogSink>,
    config: CaptureConfig,
    family: ExceptionFamily,
    deployment: Arc<dyn DeploymentSignal>,
}

impl ErrorReporter {
    /// Builder with a primary backend.
    pub fn builder(primary: Arc<dyn ReportingBackend>) -> ReporterBuilder {
        ReporterBuilder::new(primary)
    }

    /// The recognized exception family this reporter normalizes against.
    pub fn family(&self) -> &ExceptionFamily {
        &self.family
    }

    /// Capture an exception with the process-wide configuration.
    pub async fn capture_exception(&self, caught: Option<Caught>) {
        self.capture_exception_with(caught, CaptureOverrides::none())
            .await;
    }

    /// Capture an exception with per-call overrides.
    ///
    /// Calling with `None` does not silently no-op: a synthetic error with
    /// a fixed diagnostic message and a stack pointing at this call site
    /// is captured instead, through exactly one recursion.
    pub fn capture_exception_with<'a>(
        &'a self,
        caught: Option<Caught>,
        overrides: CaptureOverrides,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let Some(caught) = caught else {
                // The backtrace is captured here so the synthetic error points
                // at the call that provided nothing.
                let synthetic = CapturedError::with_backtrace(NO_ERROR_PROVIDED);
                return self
                    .capture_exception_with(Some(synthetic.into()), overrides)
                    .await;
            };

            let config = overrides.resolve(&self.config);
            let (error, error_tags) = normalize(caught, &self.family);
            let tags = self.merge_tags(&config, &overrides.tags, &error_tags);

            if self.deployment.is_deployed() {
                let mut outgoing = sanitize::sanitize_error(&error, &config);

                if !size::error_within_budget(&outgoing, REPORT_PAYLOAD_LIMIT) {
                    let warning = format!(
                        "Error with message \"{}\" is too large and will not have all data displayed.",
                        outgoing.message
                    );
                    self.capture_message_with(&warning, CaptureOverrides::none())
                        .await;
                    sanitize::sanitize_oversized(&mut outgoing);
                }

                if let Err(e) = self.backend(&config).capture_exception(&outgoing, &tags).await {
                    self.log_sink
                        .error(&format!("failed to report exception: {}", e), None);
                }
            }

            // Backend capture is additive: local visibility in every mode.
            let detail = serde_json::to_value(&error).ok();
            self.log_sink.error(&error.to_string(), detail.as_ref());
        })
    }

    /// Capture a plain text message.
    pub async fn capture_message(&self, text: &str) {
        self.capture_message_with(text, CaptureOverrides::none())
            .await;
    }

    /// Capture a plain text message with per-call overrides.
    pub async fn capture_message_with(&self, text: &str, overrides: CaptureOverrides) {
        let config = overrides.resolve(&self.config);

        if self.deployment.is_deployed() {
            let tags = self.merge_tags(&config, &overrides.tags, &Tags::new());
            if let Err(e) = self.backend(&config).capture_message(text, &tags).await {
                self.log_sink
                    .error(&format!("failed to report message: {}", e), None);
            }
        } else {
            self.log_sink.info(text, None);
        }
    }

    /// Record a breadcrumb.
    pub async fn capture_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.capture_breadcrumb_with(breadcrumb, CaptureOverrides::none())
            .await;
    }

    /// Record a breadcrumb with per-call overrides.
    pub async fn capture_breadcrumb_with(
        &self,
        breadcrumb: Breadcrumb,
        overrides: CaptureOverrides,
    ) {
        let config = overrides.resolve(&self.config);

        if self.deployment.is_deployed() {
            if let Err(e) = self.backend(&config).add_breadcrumb(&breadcrumb).await {
                self.log_sink
                    .error(&format!("failed to record breadcrumb: {}", e), None);
            }
        } else {
            let detail = Value::Object(breadcrumb.data.clone());
            self.log_sink.info(&breadcrumb.message, Some(&detail));
        }
    }

    fn backend(&self, config: &CaptureConfig) -> &Arc<dyn ReportingBackend> {
        if config.use_alternate_backend {
            self.alternate.as_ref().unwrap_or(&self.primary)
        } else {
            &self.primary
        }
    }

    /// Merge tags for one capture. Later sources win on conflict:
    /// trace correlation < process extra tags < per-call tags < tags
    /// extracted from the exception itself.
    fn merge_tags(&self, config: &CaptureConfig, call_tags: &Tags, error_tags: &Tags) -> Tags {
        let mut merged = Tags::new();

        if let Some(context) = TraceBridge::current() {
            merged.insert(
                TRACE_ID_TAG.to_string(),
                TagValue::Str(context.trace_id.to_string()),
            );
        }
        for (key, value) in &config.extra_tags {
            merged.insert(key.clone(), TagValue::Str(value.clone()));
        }
        for (key, value) in call_tags {
            merged.insert(key.clone(), value.clone());
        }
        for (key, value) in error_tags {
            merged.insert(key.clone(), value.clone());
        }

        merged
    }
}
