//! Visitor Log
//!
//! Front desk visitor registration and a live, filterable visitor log.
//! Storage, querying and change notification are delegated to a document
//! database behind [`store::DocumentStore`].

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod live;
pub mod models;
pub mod query;
pub mod repository;
pub mod services;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
