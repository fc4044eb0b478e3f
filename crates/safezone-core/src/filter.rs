//! Report narrowing: text search and category filters.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, ReportRecord};

/// Category filter chips shown above the report list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    /// Newest first.
    Recent,
    /// Closest to the device first; needs location permission.
    Nearest,
    /// Only verified reports.
    Verified,
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Recent => "recent",
            Self::Nearest => "nearest",
            Self::Verified => "verified",
        };
        f.write_str(label)
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(Self::Recent),
            "nearest" => Ok(Self::Nearest),
            "verified" => Ok(Self::Verified),
            other => Err(format!(
                "unknown filter '{other}' (expected recent, nearest or verified)"
            )),
        }
    }
}

/// Keep records whose category or textual location contains `query`,
/// ignoring case. A blank query keeps everything.
pub fn apply_text_filter(records: &[ReportRecord], query: &str) -> Vec<ReportRecord> {
    let query = normalize_query(query);
    records
        .iter()
        .filter(|record| record_matches_query(record, &query))
        .cloned()
        .collect()
}

/// Apply a category filter.
///
/// `origin` is the device position for [`CategoryFilter::Nearest`]; without
/// it the records keep their order. Sorting is stable throughout.
pub fn apply_category_filter(
    records: &[ReportRecord],
    filter: CategoryFilter,
    origin: Option<Coordinate>,
) -> Vec<ReportRecord> {
    let mut records = records.to_vec();
    match filter {
        CategoryFilter::Recent => sort_recent(&mut records),
        CategoryFilter::Nearest => {
            if let Some(origin) = origin {
                sort_nearest(&mut records, origin);
            }
        }
        CategoryFilter::Verified => records.retain(|record| record.verified),
    }
    records
}

/// Newest first by the underlying instant; undated records go last.
pub fn sort_recent(records: &mut [ReportRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Closest coordinate first; textual locations go last in original order.
pub fn sort_nearest(records: &mut [ReportRecord], origin: Coordinate) {
    records.sort_by(|a, b| {
        let a = a.location.coordinate().map(|point| origin.distance_km(&point));
        let b = b.location.coordinate().map(|point| origin.distance_km(&point));
        match (a, b) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn record_matches_query(record: &ReportRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    record.category.to_lowercase().contains(query)
        || record
            .location
            .place()
            .is_some_and(|place| place.to_lowercase().contains(query))
}
