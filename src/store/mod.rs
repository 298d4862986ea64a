//! Document database client boundary
//!
//! Persistence, querying and change notification are delegated to a document
//! database. [`DocumentStore`] is the client surface the rest of the crate
//! talks to; [`memory::MemoryStore`] is the bundled implementation.

pub mod matcher;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::query::Constraint;

/// Document fields keyed by name
pub type Fields = Map<String, Value>;

/// One stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Fields) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Resolve a dotted field path such as `additionalDetails.department`
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Error reported by the backend, tagged with its status code
/// (`failed-precondition`, `permission-denied`, `unavailable`, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not-found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", message)
    }
}

/// A full result set pushed by a live query, or the error that ended it
pub type SnapshotEvent = Result<Vec<Document>, BackendError>;

/// Detaches a live query; must be called at most once
pub type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Live query handle returned by [`DocumentStore::subscribe`]
pub struct BackendSubscription {
    pub events: mpsc::UnboundedReceiver<SnapshotEvent>,
    pub unsubscribe: Unsubscribe,
}

impl std::fmt::Debug for BackendSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSubscription").finish_non_exhaustive()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return its generated id
    async fn create(&self, collection: &str, data: Fields) -> Result<String, BackendError>;

    /// Point lookup by id
    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Merge top-level fields into an existing document
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError>;

    /// Merge top-level fields only while `field` still holds one of
    /// `expected`; the check and the write happen atomically. Returns
    /// whether the write was applied.
    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &[Value],
        fields: Fields,
    ) -> Result<bool, BackendError>;

    /// One-shot read of every document matching the constraints
    async fn query(
        &self,
        collection: &str,
        constraints: &[Constraint],
    ) -> Result<Vec<Document>, BackendError>;

    /// Open a live query. The first event carries the current result set;
    /// every later change to the collection pushes a complete replacement.
    fn subscribe(
        &self,
        collection: &str,
        constraints: &[Constraint],
    ) -> Result<BackendSubscription, BackendError>;
}
