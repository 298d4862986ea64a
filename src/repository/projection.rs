//! Raw document to [`Visitor`] projection

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::VisitorStatus,
        visitor::{AdditionalDetails, Visitor, VisitorSnapshot},
    },
    query::fields,
    store::Document,
};

fn malformed(doc: &Document, reason: impl Into<String>) -> AppError {
    AppError::MalformedRecord {
        id: doc.id.clone(),
        reason: reason.into(),
    }
}

/// Non-blank string value, absent otherwise
fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn timestamp(doc: &Document, field: &str) -> AppResult<Option<DateTime<Utc>>> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|_| malformed(doc, format!("unparseable {}", field))),
        Some(_) => Err(malformed(doc, format!("{} is not a timestamp", field))),
    }
}

fn additional_details(value: Option<&Value>) -> Option<AdditionalDetails> {
    let details = value?.as_object()?;
    let get = |key: &str| text(details.get(key));
    Some(AdditionalDetails {
        whom_to_meet: get("whomToMeet"),
        department: get("department"),
        document_type: get("documentType"),
        visitor_count: details
            .get("visitorCount")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok()),
        visitor_photo_url: get("visitorPhotoUrl"),
        document_url: get("documentUrl"),
    })
}

/// Map one stored document onto a [`Visitor`].
///
/// A blank or missing `name`, a missing or unknown `status`, an unparseable
/// timestamp, or a checked-in record carrying a check-out time are rejected
/// as [`AppError::MalformedRecord`]. Every other field is optional.
pub fn project(doc: &Document) -> AppResult<Visitor> {
    let name = text(doc.get(fields::NAME)).ok_or_else(|| malformed(doc, "missing name"))?;
    let status = doc
        .get(fields::STATUS)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(doc, "missing status"))
        .and_then(|s| {
            VisitorStatus::from_stored(s)
                .ok_or_else(|| malformed(doc, format!("unknown status {}", s)))
        })?;

    let check_in_time = timestamp(doc, fields::CHECK_IN_TIME)?;
    let check_out_time = timestamp(doc, fields::CHECK_OUT_TIME)?;
    if status == VisitorStatus::In && check_out_time.is_some() {
        return Err(malformed(doc, "checked in with a check-out time"));
    }

    Ok(Visitor {
        id: doc.id.clone(),
        name,
        contact_number: text(doc.get(fields::CONTACT_NUMBER)).unwrap_or_default(),
        address: text(doc.get(fields::ADDRESS)).unwrap_or_default(),
        purpose_of_visit: text(doc.get(fields::PURPOSE_OF_VISIT)).unwrap_or_default(),
        visit_type: text(doc.get(fields::VISIT_TYPE)),
        vehicle_number: text(doc.get(fields::VEHICLE_NUMBER)),
        registration_date: timestamp(doc, fields::REGISTRATION_DATE)?,
        check_in_time,
        check_out_time,
        status,
        additional_details: additional_details(doc.get(fields::ADDITIONAL_DETAILS)),
    })
}

/// Project a pushed result set, dropping malformed records
pub fn project_snapshot(docs: &[Document]) -> VisitorSnapshot {
    let mut snapshot = VisitorSnapshot {
        visitors: Vec::with_capacity(docs.len()),
        dropped: 0,
    };
    for doc in docs {
        match project(doc) {
            Ok(visitor) => snapshot.visitors.push(visitor),
            Err(err) => {
                tracing::warn!(error = %err, "Dropping visitor record");
                snapshot.dropped += 1;
            }
        }
    }
    snapshot
}
