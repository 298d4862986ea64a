//! Filter state to constraint compilation

use serde_json::Value;

use super::{fields, Constraint, FilterOp};
use crate::models::{
    enums::{SortKey, SortOrder},
    filter::FilterState,
};

fn sort_field(key: SortKey) -> &'static str {
    match key {
        SortKey::CheckInTime => fields::CHECK_IN_TIME,
        SortKey::Name => fields::NAME,
        SortKey::Status => fields::STATUS,
        SortKey::Department => fields::DEPARTMENT,
    }
}

/// Compile a filter state into AND-combined predicates followed by exactly
/// one ordering clause.
///
/// Predicate order is fixed: check-in date bounds, status set, department
/// set, purpose. Date bounds are inclusive whole days in UTC. Without a sort
/// key the list is ordered by check-in time, newest first.
pub fn build_constraints(filter: &FilterState) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    if let Some(range) = &filter.date_range {
        if let Some(start) = range.start {
            constraints.push(Constraint::filter(
                fields::CHECK_IN_TIME,
                FilterOp::Gte,
                Value::String(format!("{}T00:00:00.000Z", start.format("%Y-%m-%d"))),
            ));
        }
        if let Some(end) = range.end {
            constraints.push(Constraint::filter(
                fields::CHECK_IN_TIME,
                FilterOp::Lte,
                Value::String(format!("{}T23:59:59.999Z", end.format("%Y-%m-%d"))),
            ));
        }
    }

    if !filter.status.is_empty() {
        let values = filter
            .status
            .iter()
            .flat_map(|s| s.stored_spellings())
            .map(|s| Value::String(s.to_string()))
            .collect();
        constraints.push(Constraint::filter(
            fields::STATUS,
            FilterOp::In,
            Value::Array(values),
        ));
    }

    if !filter.department.is_empty() {
        let values = filter
            .department
            .iter()
            .map(|d| Value::String(d.clone()))
            .collect();
        constraints.push(Constraint::filter(
            fields::DEPARTMENT,
            FilterOp::In,
            Value::Array(values),
        ));
    }

    if let Some(purpose) = filter.purpose.as_deref() {
        let purpose = purpose.trim().to_lowercase();
        if !purpose.is_empty() {
            constraints.push(Constraint::filter(
                fields::PURPOSE_OF_VISIT,
                FilterOp::Eq,
                Value::String(purpose),
            ));
        }
    }

    let order = match filter.sort_by {
        Some(key) => Constraint::order_by(sort_field(key), filter.sort_order),
        None => Constraint::order_by(fields::CHECK_IN_TIME, SortOrder::Desc),
    };
    constraints.push(order);

    tracing::debug!(
        constraints = ?constraints.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "Built visitor query"
    );

    constraints
}
