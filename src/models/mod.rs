//! Data models for the visitor log

pub mod enums;
pub mod filter;
pub mod visitor;

// Re-export commonly used types
pub use enums::{SortKey, SortOrder, VisitorStatus};
pub use filter::{DateRange, FilterState, VisitorListQuery};
pub use visitor::{AdditionalDetails, CreatedVisitor, NewVisitor, Visitor, VisitorSnapshot};
