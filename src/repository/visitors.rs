//! Visitors repository

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

use super::projection::{project, project_snapshot};
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::VisitorStatus,
        visitor::{AdditionalDetails, NewVisitor, Visitor, VisitorSnapshot},
    },
    query::{fields, Constraint},
    store::{BackendError, DocumentStore, Fields},
};

/// Timestamp in the stored format, e.g. `2024-05-01T09:30:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn optional_text(value: &Option<String>) -> Value {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Value::String(s.to_string()),
        _ => Value::Null,
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Visitor with id {} not found", id))
}

/// Writes target a known id, so a missing document is the caller's not-found
fn write_error(id: &str, err: BackendError) -> AppError {
    if err.code == "not-found" {
        not_found(id)
    } else {
        err.into()
    }
}

#[derive(Clone)]
pub struct VisitorsRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl VisitorsRepository {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Store a new pending visitor and return its generated id
    pub async fn create(&self, data: &NewVisitor, registered_at: DateTime<Utc>) -> AppResult<String> {
        let visit_type = data
            .visit_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Personal");

        let mut record = Fields::new();
        let mut put = |key: &str, value: Value| {
            record.insert(key.to_string(), value);
        };
        put(fields::NAME, Value::from(data.name.trim()));
        put(fields::CONTACT_NUMBER, Value::from(data.contact_number.trim()));
        put(fields::ADDRESS, Value::from(data.address.trim()));
        put(
            fields::PURPOSE_OF_VISIT,
            Value::from(data.purpose_of_visit.trim().to_lowercase()),
        );
        put(fields::VEHICLE_NUMBER, optional_text(&data.vehicle_number));
        put(fields::VISIT_TYPE, Value::from(visit_type));
        put(fields::STATUS, Value::from(VisitorStatus::Pending.as_str()));
        put(fields::REGISTRATION_DATE, Value::from(format_timestamp(registered_at)));
        put(fields::CHECK_IN_TIME, Value::Null);
        put(fields::CHECK_OUT_TIME, Value::Null);
        put(fields::ADDITIONAL_DETAILS, Value::Null);

        let id = self.store.create(&self.collection, record).await?;
        Ok(id)
    }

    /// Get a visitor by id
    pub async fn get(&self, id: &str) -> AppResult<Visitor> {
        let doc = self
            .store
            .fetch(&self.collection, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        project(&doc)
    }

    /// Replace the additional details block
    pub async fn set_details(&self, id: &str, details: &AdditionalDetails) -> AppResult<()> {
        let value = serde_json::to_value(details)
            .map_err(|e| AppError::Internal(format!("Failed to encode details: {}", e)))?;
        let mut update = Fields::new();
        update.insert(fields::ADDITIONAL_DETAILS.to_string(), value);
        self.store
            .update(&self.collection, id, update)
            .await
            .map_err(|e| write_error(id, e))
    }

    /// Move a visitor from `from` to `to`, stamping `time_field` with `at`.
    /// Fails with a business rule error when the stored status is no longer
    /// `from`, so a transition is applied at most once.
    pub async fn transition(
        &self,
        id: &str,
        from: VisitorStatus,
        to: VisitorStatus,
        time_field: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let expected: Vec<Value> = from
            .stored_spellings()
            .iter()
            .map(|s| Value::String(s.to_string()))
            .collect();
        let mut update = Fields::new();
        update.insert(fields::STATUS.to_string(), Value::String(to.as_str().to_string()));
        update.insert(time_field.to_string(), Value::String(format_timestamp(at)));

        let applied = self
            .store
            .update_if(&self.collection, id, fields::STATUS, &expected, update)
            .await
            .map_err(|e| write_error(id, e))?;
        if !applied {
            return Err(AppError::BusinessRule(format!(
                "Visitor {} is no longer {}",
                id, from
            )));
        }
        Ok(())
    }

    /// One-shot query
    pub async fn query(&self, constraints: &[Constraint]) -> AppResult<VisitorSnapshot> {
        let docs = self.store.query(&self.collection, constraints).await?;
        Ok(project_snapshot(&docs))
    }
}
