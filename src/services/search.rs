//! Client-side free-text refinement of the visitor list
//!
//! Full-text search is not pushed to the backend; it runs over each
//! snapshot after backend-side filtering.

use crate::models::visitor::Visitor;

/// Case-insensitive substring match over name, contact number, purpose and
/// host. `needle` must already be lower-cased.
pub fn matches_search(visitor: &Visitor, needle: &str) -> bool {
    let host = visitor.host().unwrap_or("");
    [
        visitor.name.as_str(),
        visitor.contact_number.as_str(),
        visitor.purpose_of_visit.as_str(),
        host,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Keep the visitors matching `search`, preserving order. An empty search
/// keeps everything.
pub fn refine(mut visitors: Vec<Visitor>, search: &str) -> Vec<Visitor> {
    if search.is_empty() {
        return visitors;
    }
    let needle = search.to_lowercase();
    visitors.retain(|visitor| matches_search(visitor, &needle));
    visitors
}
