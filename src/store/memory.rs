//! In-process document store
//!
//! Keeps collections in memory and pushes full result sets to live
//! subscribers whenever a collection changes. When index enforcement is on,
//! queries that need a composite index fail with `failed-precondition` unless
//! the index was declared, mirroring hosted document databases.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    matcher, BackendError, BackendSubscription, Document, DocumentStore, Fields, SnapshotEvent,
};
use crate::config::StoreConfig;
use crate::query::Constraint;

struct Subscriber {
    id: u64,
    collection: String,
    constraints: Vec<Constraint>,
    tx: mpsc::UnboundedSender<SnapshotEvent>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    subscribers: Vec<Subscriber>,
    next_subscriber_id: u64,
    enforce_indexes: bool,
    indexes: Vec<Vec<String>>,
}

impl Inner {
    fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn document_mut(&mut self, collection: &str, id: &str) -> Option<&mut Fields> {
        self.collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
    }

    fn run(&self, collection: &str, constraints: &[Constraint]) -> Vec<Document> {
        matcher::evaluate(&self.documents(collection), constraints)
    }

    fn check_index(&self, constraints: &[Constraint]) -> Result<(), BackendError> {
        if !self.enforce_indexes {
            return Ok(());
        }
        match matcher::required_index(constraints) {
            Some(fields) if !self.indexes.contains(&fields) => Err(BackendError::new(
                "failed-precondition",
                format!("The query requires an index on ({})", fields.join(", ")),
            )),
            _ => Ok(()),
        }
    }

    /// Push the current result set to every live query on the collection,
    /// forgetting subscribers whose receiver is gone
    fn notify(&mut self, collection: &str) {
        let docs = self.documents(collection);
        self.subscribers.retain(|sub| {
            if sub.collection != collection {
                return true;
            }
            let snapshot = matcher::evaluate(&docs, &sub.constraints);
            sub.tx.send(Ok(snapshot)).is_ok()
        });
    }
}

/// Document store held entirely in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.enforce_indexes = config.enforce_indexes;
            inner.indexes = config.indexes.clone();
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, BackendError> {
        self.inner
            .lock()
            .map_err(|_| BackendError::internal("store lock poisoned"))
    }

    /// Require declared composite indexes for multi-field queries
    pub fn enforce_indexes(&self, indexes: Vec<Vec<String>>) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        inner.enforce_indexes = true;
        inner.indexes = indexes;
        Ok(())
    }

    /// Store a document under a caller-chosen id, replacing any previous one
    pub fn insert(&self, collection: &str, id: &str, data: Fields) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        inner.notify(collection);
        Ok(())
    }

    /// Fail every live query on the collection with the given error.
    /// The affected subscriptions are closed afterwards.
    pub fn push_error(&self, collection: &str, error: BackendError) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        inner.subscribers.retain(|sub| {
            if sub.collection != collection {
                return true;
            }
            let _ = sub.tx.send(Err(error.clone()));
            false
        });
        Ok(())
    }

    /// Number of open live queries
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.subscribers.len())
            .unwrap_or(0)
    }
}

fn remove_subscriber(inner: &Weak<Mutex<Inner>>, id: u64) {
    if let Some(inner) = inner.upgrade() {
        if let Ok(mut inner) = inner.lock() {
            inner.subscribers.retain(|sub| sub.id != id);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, data: Fields) -> Result<String, BackendError> {
        let id = Uuid::new_v4().simple().to_string();
        self.insert(collection, &id, data)?;
        Ok(id)
    }

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError> {
        let inner = self.lock()?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError> {
        let mut inner = self.lock()?;
        let doc = inner
            .document_mut(collection, id)
            .ok_or_else(|| BackendError::not_found(format!("No document {}/{}", collection, id)))?;
        doc.extend(fields);
        inner.notify(collection);
        Ok(())
    }

    async fn update_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &[Value],
        fields: Fields,
    ) -> Result<bool, BackendError> {
        let mut inner = self.lock()?;
        let doc = inner
            .document_mut(collection, id)
            .ok_or_else(|| BackendError::not_found(format!("No document {}/{}", collection, id)))?;
        let current = doc.get(field).unwrap_or(&Value::Null);
        if !expected.contains(current) {
            return Ok(false);
        }
        doc.extend(fields);
        inner.notify(collection);
        Ok(true)
    }

    async fn query(
        &self,
        collection: &str,
        constraints: &[Constraint],
    ) -> Result<Vec<Document>, BackendError> {
        let inner = self.lock()?;
        inner.check_index(constraints)?;
        Ok(inner.run(collection, constraints))
    }

    fn subscribe(
        &self,
        collection: &str,
        constraints: &[Constraint],
    ) -> Result<BackendSubscription, BackendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock()?;

        // Query failures are delivered on the stream, like any later error.
        if let Err(err) = inner.check_index(constraints) {
            let _ = tx.send(Err(err));
            return Ok(BackendSubscription {
                events: rx,
                unsubscribe: Box::new(|| {}),
            });
        }

        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;

        let _ = tx.send(Ok(inner.run(collection, constraints)));
        inner.subscribers.push(Subscriber {
            id,
            collection: collection.to_string(),
            constraints: constraints.to_vec(),
            tx,
        });

        let weak = Arc::downgrade(&self.inner);
        Ok(BackendSubscription {
            events: rx,
            unsubscribe: Box::new(move || remove_subscriber(&weak, id)),
        })
    }
}
