//! Local log sink interface

use serde_json::Value;

/// Local logging collaborator. Capture operations always keep local
/// visibility through this sink, whether or not they also forward to a
/// backend.
pub trait LogSink: Send + Sync + std::fmt::Debug {
    /// Write at error severity.
    fn error(&self, message: &str, detail: Option<&Value>);

    /// Write at info severity.
    fn info(&self, message: &str, detail: Option<&Value>);
}

/// Default sink: forwards to `tracing` events.
#[derive(Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn error(&self, message: &str, detail: Option<&Value>) {
        match detail {
            Some(detail) => tracing::error!(detail = %detail, "{}", message),
            None => tracing::error!("{}", message),
        }
    }

    fn info(&self, message: &str, detail: Option<&Value>) {
        match detail {
            Some(detail) => tracing::info!(detail = %detail, "{}", message),
            None => tracing::info!("{}", message),
        }
    }
}
