//! Repository layer over the document store

pub mod projection;
pub mod visitors;

use std::sync::Arc;

use crate::store::DocumentStore;

/// Main repository struct holding the store client
#[derive(Clone)]
pub struct Repository {
    pub store: Arc<dyn DocumentStore>,
    pub visitors: visitors::VisitorsRepository,
}

impl Repository {
    /// Create a new repository over the given store
    pub fn new(store: Arc<dyn DocumentStore>, visitors_collection: &str) -> Self {
        Self {
            visitors: visitors::VisitorsRepository::new(store.clone(), visitors_collection),
            store,
        }
    }
}
