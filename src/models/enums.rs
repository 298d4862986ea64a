//! Shared domain enums

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// VisitorStatus
// ---------------------------------------------------------------------------

/// Visit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
pub enum VisitorStatus {
    Pending,
    In,
    Out,
}

impl VisitorStatus {
    /// Value written to and matched against the `status` field
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorStatus::Pending => "Pending",
            VisitorStatus::In => "In",
            VisitorStatus::Out => "Out",
        }
    }

    /// Every spelling of this status that may be found in stored records:
    /// the canonical value first, then the ones older clients wrote.
    pub fn stored_spellings(&self) -> &'static [&'static str] {
        match self {
            VisitorStatus::Pending => &["Pending", "pending"],
            VisitorStatus::In => &["In", "in", "checked_in", "checked-in"],
            VisitorStatus::Out => &["Out", "out", "checked_out", "checked-out"],
        }
    }

    /// Read a stored `status` value. Only the spellings the query builder
    /// can filter on are accepted, so every readable record is filterable.
    pub fn from_stored(value: &str) -> Option<Self> {
        [VisitorStatus::Pending, VisitorStatus::In, VisitorStatus::Out]
            .into_iter()
            .find(|status| status.stored_spellings().contains(&value))
    }
}

impl FromStr for VisitorStatus {
    type Err = String;

    /// Accepts the stored values in any case, plus the checked_in / checked_out
    /// codes used by older filter forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" | "checked_in" | "checked-in" => Ok(VisitorStatus::In),
            "out" | "checked_out" | "checked-out" => Ok(VisitorStatus::Out),
            "pending" => Ok(VisitorStatus::Pending),
            other => Err(format!("Unknown visitor status: {}", other)),
        }
    }
}

impl std::fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for VisitorStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VisitorStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SortKey
// ---------------------------------------------------------------------------

/// Field the visitor list can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum SortKey {
    #[serde(rename = "checkInTime")]
    CheckInTime,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "department", alias = "additionalDetails.department")]
    Department,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "checkInTime" | "check_in_time" => Ok(SortKey::CheckInTime),
            "name" => Ok(SortKey::Name),
            "status" => Ok(SortKey::Status),
            "department" | "additionalDetails.department" => Ok(SortKey::Department),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// SortOrder
// ---------------------------------------------------------------------------

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}
