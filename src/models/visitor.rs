//! Visitor model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::enums::VisitorStatus;

/// One recorded visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    /// Backend document id
    pub id: String,
    pub name: String,
    pub contact_number: String,
    pub address: String,
    pub purpose_of_visit: String,
    pub visit_type: Option<String>,
    pub vehicle_number: Option<String>,
    pub registration_date: Option<DateTime<Utc>>,
    /// Unset until the visitor is checked in
    pub check_in_time: Option<DateTime<Utc>>,
    /// Set once, at checkout
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: VisitorStatus,
    pub additional_details: Option<AdditionalDetails>,
}

impl Visitor {
    /// Host the visitor came to meet, if recorded
    pub fn host(&self) -> Option<&str> {
        self.additional_details
            .as_ref()
            .and_then(|d| d.whom_to_meet.as_deref())
    }

    pub fn department(&self) -> Option<&str> {
        self.additional_details
            .as_ref()
            .and_then(|d| d.department.as_deref())
    }
}

/// Details captured after the initial registration step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalDetails {
    /// Host to meet
    pub whom_to_meet: Option<String>,
    /// Department code (IT, HR, FIN, ...)
    pub department: Option<String>,
    /// Identity document type (NID, PASSPORT, DL, CID, OTHER)
    pub document_type: Option<String>,
    pub visitor_count: Option<u32>,
    /// Reference to the uploaded visitor photo
    pub visitor_photo_url: Option<String>,
    /// Reference to the uploaded identity document
    pub document_url: Option<String>,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitor {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Presence is checked after trimming, at registration
    #[validate(length(max = 20, message = "Contact number must be at most 20 characters"))]
    pub contact_number: String,
    #[serde(default)]
    pub address: String,
    #[validate(length(min = 1, message = "Purpose of visit is required"))]
    pub purpose_of_visit: String,
    pub vehicle_number: Option<String>,
    /// Type of visit, defaults to Personal
    pub visit_type: Option<String>,
}

/// Response returned after registration
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedVisitor {
    pub id: String,
}

/// One projected snapshot of the visitor list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitorSnapshot {
    pub visitors: Vec<Visitor>,
    /// Records rejected by projection
    pub dropped: usize,
}
