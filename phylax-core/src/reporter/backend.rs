//! Reporting backend interface

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::Result;
use crate::exception::{CapturedError, Tags};

use super::Breadcrumb;

/// A client for an external error-reporting service.
///
/// The reporter is backend-agnostic: anything exposing this shape works,
/// and two interchangeable backends can be wired at once with selection
/// per capture via `use_alternate_backend`.
#[async_trait]
pub trait ReportingBackend: Send + Sync + std::fmt::Debug {
    /// Forward an exception with its merged tags. Returns the backend's
    /// event id when it assigns one.
    async fn capture_exception(
        &self,
        error: &CapturedError,
        tags: &Tags,
    ) -> Result<Option<String>>;

    /// Forward a plain text message.
    async fn capture_message(&self, text: &str, tags: &Tags) -> Result<Option<String>>;

    /// Attach a breadcrumb to the ongoing diagnostic context.
    async fn add_breadcrumb(&self, breadcrumb: &Breadcrumb) -> Result<()>;
}

/// In-memory backend that retains everything it is given. The reference
/// implementation for tests and embedders that export in bulk.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    exceptions: Mutex<Vec<(CapturedError, Tags)>>,
    messages: Mutex<Vec<(String, Tags)>>,
    breadcrumbs: Mutex<Vec<Breadcrumb>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exceptions captured so far.
    pub fn exceptions(&self) -> Vec<(CapturedError, Tags)> {
        self.exceptions.lock().expect("backend poisoned").clone()
    }

    /// Messages captured so far.
    pub fn messages(&self) -> Vec<(String, Tags)> {
        self.messages.lock().expect("backend poisoned").clone()
    }

    /// Breadcrumbs recorded so far.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.breadcrumbs.lock().expect("backend poisoned").clone()
    }
}

#[async_trait]
impl ReportingBackend for MemoryBackend {
    async fn capture_exception(
        &self,
        error: &CapturedError,
        tags: &Tags,
    ) -> Result<Option<String>> {
        self.exceptions
            .lock()
            .expect("backend poisoned")
            .push((error.clone(), tags.clone()));
        Ok(Some(uuid::Uuid::new_v4().to_string()))
    }

    async fn capture_message(&self, text: &str, tags: &Tags) -> Result<Option<String>> {
        self.messages
            .lock()
            .expect("backend poisoned")
            .push((text.to_string(), tags.clone()));
        Ok(Some(uuid::Uuid::new_v4().to_string()))
    }

    async fn add_breadcrumb(&self, breadcrumb: &Breadcrumb) -> Result<()> {
        self.breadcrumbs
            .lock()
            .expect("backend poisoned")
            .push(breadcrumb.clone());
        Ok(())
    }
}
