//! # Phylax - Process-wide Error Interception & Telemetry
//!
//! Phylax (Φύλαξ, "guardian") intercepts errors raised anywhere in an
//! application, normalizes them into a canonical representation, bounds
//! their serialized size, and forwards them to an injected reporting
//! backend — optionally correlating them with a distributed-tracing span.
//!
//! - Canonical errors and semantic exception wrappers with a configurable
//!   recognized-kind family
//! - Bounded-size payload estimation and sanitization before forwarding
//! - A capture facade that keeps local log visibility in every mode and
//!   never lets backend failures escape
//! - Call interception with emit-vs-rethrow policies and span bracketing
//!   that nests correctly across async suspension
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use phylax_core::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     phylax_core::telemetry::init();
//!
//!     let backend = Arc::new(MemoryBackend::new());
//!     let reporter = ErrorReporter::builder(backend).build();
//!
//!     let channel = Arc::new(ExceptionChannel::default());
//!     let interceptor = Interceptor::new(
//!         ExceptionFamily::default(),
//!         channel.clone(),
//!         TraceBridge::new(&TraceConfig::default()),
//!     );
//!
//!     let result = interceptor
//!         .run(InterceptPolicy::new().handle_only(), || async {
//!             Err::<(), _>(CapturedError::new("boom"))
//!         })
//!         .await;
//!     assert_eq!(result.unwrap(), None);
//!
//!     reporter
//!         .capture_exception(Some(CapturedError::new("reported").into()))
//!         .await;
//! }
//! ```
//!
//! ## Architecture
//!
//! Application code fails, the [`intercept::Interceptor`] catches,
//! [`exception::normalize`] extracts the canonical `(error, tags)` pair,
//! and the policy either emits on the [`intercept::ExceptionChannel`] or
//! returns the exception to the caller. Captures flow through
//! [`reporter::ErrorReporter`], which consults [`size`] and [`sanitize`]
//! before forwarding to the injected [`reporter::ReportingBackend`].

pub mod config;
pub mod error;
pub mod exception;
pub mod hook;
pub mod intercept;
pub mod reporter;
pub mod sanitize;
pub mod size;
pub mod telemetry;
pub mod trace;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        CaptureConfig, CaptureOverrides, ChannelConfig, DeploymentSignal, EnvDeployment,
        PhylaxConfig, StackSanitizeConfig, StaticDeployment, TraceConfig,
    };
    pub use crate::error::{PhylaxError, Result};
    pub use crate::exception::{
        Caught, CapturedError, ExceptionFamily, ExceptionKind, TagValue, Tags, WrappedException,
    };
    pub use crate::intercept::{ExceptionChannel, InterceptOptions, InterceptPolicy, Interceptor};
    pub use crate::reporter::{
        Breadcrumb, ErrorReporter, LogSink, MemoryBackend, ReportingBackend, TracingLogSink,
        REPORT_PAYLOAD_LIMIT,
    };
    pub use crate::trace::{
        FinishedSpan, RecordingSpanSink, Span, SpanSink, TraceBridge, TraceContext, TraceRequest,
    };
}
