//! Visitors service

use chrono::Utc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    live::{LiveResultChannel, VisitorFeed},
    models::{
        enums::VisitorStatus,
        filter::FilterState,
        visitor::{AdditionalDetails, NewVisitor, Visitor},
    },
    query::{build_constraints, fields},
    repository::Repository,
    services::search::refine,
};

#[derive(Clone)]
pub struct VisitorsService {
    repository: Repository,
}

impl VisitorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a visitor as pending and return the new id
    pub async fn register(&self, data: &NewVisitor) -> AppResult<String> {
        data.validate()?;
        let required = [&data.name, &data.contact_number, &data.purpose_of_visit];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(AppError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }

        let id = self.repository.visitors.create(data, Utc::now()).await?;
        tracing::info!(visitor_id = %id, "Visitor registered");
        Ok(id)
    }

    /// Fetch a single visitor
    pub async fn get(&self, id: &str) -> AppResult<Visitor> {
        self.repository.visitors.get(id).await
    }

    /// Attach host, department and document details
    pub async fn attach_details(&self, id: &str, details: &AdditionalDetails) -> AppResult<Visitor> {
        // Existence check gives a proper not-found before writing
        self.repository.visitors.get(id).await?;
        self.repository.visitors.set_details(id, details).await?;
        self.repository.visitors.get(id).await
    }

    /// Pending -> In
    pub async fn check_in(&self, id: &str) -> AppResult<Visitor> {
        let visitor = self.repository.visitors.get(id).await?;
        if visitor.status != VisitorStatus::Pending {
            return Err(AppError::BusinessRule(format!(
                "Visitor {} cannot be checked in while {}",
                id, visitor.status
            )));
        }

        self.repository
            .visitors
            .transition(
                id,
                VisitorStatus::Pending,
                VisitorStatus::In,
                fields::CHECK_IN_TIME,
                Utc::now(),
            )
            .await?;
        tracing::info!(visitor_id = %id, "Visitor checked in");
        self.repository.visitors.get(id).await
    }

    /// In -> Out. The check-out time is written once and never changed.
    pub async fn check_out(&self, id: &str) -> AppResult<Visitor> {
        let visitor = self.repository.visitors.get(id).await?;
        if visitor.status != VisitorStatus::In {
            return Err(AppError::BusinessRule(format!(
                "Visitor {} cannot be checked out while {}",
                id, visitor.status
            )));
        }

        self.repository
            .visitors
            .transition(
                id,
                VisitorStatus::In,
                VisitorStatus::Out,
                fields::CHECK_OUT_TIME,
                Utc::now(),
            )
            .await?;
        tracing::info!(visitor_id = %id, "Visitor checked out");
        self.repository.visitors.get(id).await
    }

    /// One-shot filtered list
    pub async fn list(&self, filter: &FilterState) -> AppResult<Vec<Visitor>> {
        let constraints = build_constraints(filter);
        let snapshot = self.repository.visitors.query(&constraints).await?;
        if snapshot.dropped > 0 {
            tracing::warn!(dropped = snapshot.dropped, "Listing skipped malformed visitors");
        }
        Ok(refine(snapshot.visitors, filter.search_text()))
    }

    /// Channel for live queries on the visitors collection
    pub fn channel(&self) -> LiveResultChannel {
        LiveResultChannel::new(
            self.repository.visitors.store(),
            self.repository.visitors.collection(),
        )
    }

    /// Open a live feed for one client
    pub fn feed(&self, filter: FilterState) -> VisitorFeed {
        VisitorFeed::open(self.channel(), filter)
    }
}
