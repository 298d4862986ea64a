//! Backend query constraints

pub mod builder;

use serde_json::Value;

use crate::models::enums::SortOrder;

pub use builder::build_constraints;

/// Stored field names
pub mod fields {
    pub const NAME: &str = "name";
    pub const CONTACT_NUMBER: &str = "contactNumber";
    pub const ADDRESS: &str = "address";
    pub const PURPOSE_OF_VISIT: &str = "purposeOfVisit";
    pub const VEHICLE_NUMBER: &str = "vehicleNumber";
    pub const VISIT_TYPE: &str = "visitType";
    pub const REGISTRATION_DATE: &str = "registrationDate";
    pub const CHECK_IN_TIME: &str = "checkInTime";
    pub const CHECK_OUT_TIME: &str = "checkOutTime";
    pub const STATUS: &str = "status";
    pub const ADDITIONAL_DETAILS: &str = "additionalDetails";
    pub const DEPARTMENT: &str = "additionalDetails.department";
}

/// Comparison applied by a `Where` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    /// Field equals any element of an array value
    In,
    Gte,
    Lte,
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            FilterOp::Eq => "==",
            FilterOp::In => "in",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        };
        write!(f, "{}", op)
    }
}

/// One predicate or ordering clause sent to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Where {
        field: String,
        op: FilterOp,
        value: Value,
    },
    OrderBy {
        field: String,
        direction: SortOrder,
    },
}

impl Constraint {
    pub fn filter(field: &str, op: FilterOp, value: Value) -> Self {
        Constraint::Where {
            field: field.to_string(),
            op,
            value,
        }
    }

    pub fn order_by(field: &str, direction: SortOrder) -> Self {
        Constraint::OrderBy {
            field: field.to_string(),
            direction,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Constraint::Where { field, .. } | Constraint::OrderBy { field, .. } => field,
        }
    }

    pub fn is_order(&self) -> bool {
        matches!(self, Constraint::OrderBy { .. })
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Where { field, op, value } => write!(f, "where {} {} {}", field, op, value),
            Constraint::OrderBy { field, direction } => {
                let dir = match direction {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                };
                write!(f, "order by {} {}", field, dir)
            }
        }
    }
}
