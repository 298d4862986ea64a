//! Constraint evaluation over stored documents

use serde_json::Value;
use std::cmp::Ordering;

use super::Document;
use crate::models::enums::SortOrder;
use crate::query::{Constraint, FilterOp};

/// Rank of a value's type when ordering mixed types
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by content
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ord = compare_values(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Range comparisons only hold between values of the same type
fn comparable(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b) && !a.is_null()
}

fn matches_where(doc: &Document, field: &str, op: FilterOp, expected: &Value) -> bool {
    let Some(actual) = doc.get(field) else {
        return false;
    };
    match op {
        FilterOp::Eq => actual == expected,
        FilterOp::In => expected
            .as_array()
            .map(|candidates| candidates.iter().any(|c| c == actual))
            .unwrap_or(false),
        FilterOp::Gte => {
            comparable(actual, expected) && compare_values(actual, expected) != Ordering::Less
        }
        FilterOp::Lte => {
            comparable(actual, expected) && compare_values(actual, expected) != Ordering::Greater
        }
    }
}

/// Whether a document satisfies every predicate. Documents lacking an
/// ordered field are excluded, as ordering implies the field exists.
pub fn matches(doc: &Document, constraints: &[Constraint]) -> bool {
    constraints.iter().all(|constraint| match constraint {
        Constraint::Where { field, op, value } => matches_where(doc, field, *op, value),
        Constraint::OrderBy { field, .. } => doc.get(field).is_some(),
    })
}

/// Order documents by the ordering clauses, ties broken by id in the
/// direction of the last clause
pub fn sort_documents(docs: &mut [Document], constraints: &[Constraint]) {
    let orders: Vec<(&str, SortOrder)> = constraints
        .iter()
        .filter_map(|c| match c {
            Constraint::OrderBy { field, direction } => Some((field.as_str(), *direction)),
            Constraint::Where { .. } => None,
        })
        .collect();
    let tie_break = orders.last().map(|(_, d)| *d).unwrap_or(SortOrder::Asc);

    docs.sort_by(|a, b| {
        for (field, direction) in &orders {
            let ord = match (a.get(field), b.get(field)) {
                (Some(x), Some(y)) => compare_values(x, y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ord = match direction {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        match tie_break {
            SortOrder::Asc => a.id.cmp(&b.id),
            SortOrder::Desc => b.id.cmp(&a.id),
        }
    });
}

/// Run a query over a set of documents
pub fn evaluate<'a, I>(docs: I, constraints: &[Constraint]) -> Vec<Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut results: Vec<Document> = docs
        .into_iter()
        .filter(|doc| matches(doc, constraints))
        .cloned()
        .collect();
    sort_documents(&mut results, constraints);
    results
}

/// Fields a composite index must cover to serve the query: filtered fields
/// in sorted order followed by the ordering fields. Queries touching a
/// single field are served by the automatic single-field indexes.
pub fn required_index(constraints: &[Constraint]) -> Option<Vec<String>> {
    let mut filtered: Vec<String> = constraints
        .iter()
        .filter(|c| !c.is_order())
        .map(|c| c.field().to_string())
        .collect();
    filtered.sort();
    filtered.dedup();

    let mut fields = filtered;
    for constraint in constraints.iter().filter(|c| c.is_order()) {
        let field = constraint.field().to_string();
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    if fields.len() > 1 {
        Some(fields)
    } else {
        None
    }
}
