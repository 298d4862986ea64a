//! Visitor list filter state

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::IntoParams;

use super::enums::{SortKey, SortOrder, VisitorStatus};
use crate::error::AppError;

/// Inclusive check-in date range; either bound may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Criteria selected for the visitor list.
///
/// Recreated on every edit; two states compare equal when they would
/// produce the same query and the same client-side refinement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub status: BTreeSet<VisitorStatus>,
    #[serde(default)]
    pub department: BTreeSet<String>,
    pub date_range: Option<DateRange>,
    pub purpose: Option<String>,
    pub sort_by: Option<SortKey>,
    #[serde(default)]
    pub sort_order: SortOrder,
    pub search: Option<String>,
}

impl FilterState {
    /// Free-text search, empty when unset
    pub fn search_text(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }

    pub fn with_status(mut self, status: VisitorStatus) -> Self {
        self.status.insert(status);
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department.insert(department.into());
        self
    }

    pub fn with_sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_by = Some(key);
        self.sort_order = order;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Select or deselect a status
    pub fn toggle_status(&self, status: VisitorStatus) -> Self {
        let mut next = self.clone();
        if !next.status.remove(&status) {
            next.status.insert(status);
        }
        next
    }

    /// Select or deselect a department code
    pub fn toggle_department(&self, department: &str) -> Self {
        let mut next = self.clone();
        if !next.department.remove(department) {
            next.department.insert(department.to_string());
        }
        next
    }

    /// Picking the current key again while ascending flips to descending;
    /// anything else starts ascending.
    pub fn select_sort(&self, key: SortKey) -> Self {
        let mut next = self.clone();
        next.sort_order = if self.sort_by == Some(key) && self.sort_order == SortOrder::Asc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        next.sort_by = Some(key);
        next
    }

    /// Clear every filter but keep the search text
    pub fn cleared(&self) -> Self {
        Self {
            search: self.search.clone(),
            ..Self::default()
        }
    }
}

/// Query parameters for listing or streaming visitors
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitorListQuery {
    /// Comma separated statuses (In, Out, Pending)
    pub status: Option<String>,
    /// Comma separated department codes
    pub department: Option<String>,
    /// Start date (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD)
    pub end_date: Option<String>,
    pub purpose: Option<String>,
    /// checkInTime, name, status or department
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

fn split_list(value: &Option<String>) -> impl Iterator<Item = &str> {
    value
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_date(value: &Option<String>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match value.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {} format", field))),
    }
}

impl TryFrom<VisitorListQuery> for FilterState {
    type Error = AppError;

    fn try_from(query: VisitorListQuery) -> Result<Self, Self::Error> {
        let status = split_list(&query.status)
            .map(|s| s.parse::<VisitorStatus>().map_err(AppError::BadRequest))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let department = split_list(&query.department).map(str::to_string).collect();

        let start = parse_date(&query.start_date, "start_date")?;
        let end = parse_date(&query.end_date, "end_date")?;
        let date_range = match (start, end) {
            (None, None) => None,
            (start, end) => Some(DateRange { start, end }),
        };

        let sort_by = query
            .sort_by
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<SortKey>)
            .transpose()
            .map_err(AppError::BadRequest)?;
        let sort_order = query
            .sort_order
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<SortOrder>)
            .transpose()
            .map_err(AppError::BadRequest)?
            .unwrap_or_default();

        Ok(FilterState {
            status,
            department,
            date_range,
            purpose: query.purpose.filter(|p| !p.trim().is_empty()),
            sort_by,
            sort_order,
            search: query.search.filter(|s| !s.is_empty()),
        })
    }
}
