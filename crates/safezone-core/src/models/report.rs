//! Incident report model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::format_relative_time;
use crate::util::normalize_text_option;

/// Category used when the upstream document has no `type`.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Description used when the upstream document has no `description`.
pub const MISSING_DESCRIPTION: &str = "No description provided";

/// Opaque identifier of a report, taken from the remote document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReportId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Sentinel used when a report has no location at all.
    pub const ORIGIN: Self = Self {
        latitude: 0.0,
        longitude: 0.0,
    };

    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// Where a report happened: a free-text place or a coordinate, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportLocation {
    Place(String),
    Coordinates(Coordinate),
}

impl ReportLocation {
    /// The textual place name, if this location is textual.
    #[must_use]
    pub fn place(&self) -> Option<&str> {
        match self {
            Self::Place(name) => Some(name),
            Self::Coordinates(_) => None,
        }
    }

    #[must_use]
    pub const fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Place(_) => None,
            Self::Coordinates(coordinate) => Some(*coordinate),
        }
    }
}

impl Default for ReportLocation {
    fn default() -> Self {
        Self::Coordinates(Coordinate::ORIGIN)
    }
}

impl fmt::Display for ReportLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Place(name) => f.write_str(name),
            Self::Coordinates(coordinate) => write!(
                f,
                "{:.6}, {:.6}",
                coordinate.latitude, coordinate.longitude
            ),
        }
    }
}

/// Raw incident fields as stored upstream; every field may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawReport {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<ReportLocation>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One remote document from the incident collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub id: ReportId,
    pub fields: RawReport,
}

impl ReportDocument {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: RawReport) -> Self {
        Self {
            id: ReportId::new(id),
            fields,
        }
    }
}

/// A normalized, display-ready incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: ReportId,
    pub category: String,
    pub location: ReportLocation,
    pub description: String,
    pub verified: bool,
    pub created_at: Option<DateTime<Utc>>,
    /// Relative label derived from `created_at` when the snapshot arrived.
    pub time_ago: String,
}

impl ReportRecord {
    /// Normalize a remote document, substituting sentinels for absent fields.
    ///
    /// Blank strings count as absent, so an empty `type` still becomes
    /// `"Unknown"` and an empty place name falls back to the origin
    /// coordinate.
    #[must_use]
    pub fn from_document(document: ReportDocument, now: DateTime<Utc>) -> Self {
        let ReportDocument { id, fields } = document;

        let location = match fields.location {
            Some(ReportLocation::Place(name)) => normalize_text_option(Some(name))
                .map_or_else(ReportLocation::default, ReportLocation::Place),
            Some(coordinates @ ReportLocation::Coordinates(_)) => coordinates,
            None => ReportLocation::default(),
        };

        Self {
            id,
            category: normalize_text_option(fields.kind)
                .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            location,
            description: normalize_text_option(fields.description)
                .unwrap_or_else(|| MISSING_DESCRIPTION.to_string()),
            verified: fields.verified.unwrap_or(false),
            created_at: fields.timestamp,
            time_ago: format_relative_time(now, fields.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 0).unwrap()
    }

    #[test]
    fn empty_document_normalizes_to_sentinels() {
        let record = ReportRecord::from_document(ReportDocument::new("r1", RawReport::default()), now());

        assert_eq!(record.id.as_str(), "r1");
        assert_eq!(record.category, "Unknown");
        assert_eq!(
            record.location,
            ReportLocation::Coordinates(Coordinate::new(0.0, 0.0))
        );
        assert_eq!(record.description, "No description provided");
        assert!(!record.verified);
        assert_eq!(record.created_at, None);
        assert_eq!(record.time_ago, "Unknown time");
    }

    #[test]
    fn blank_strings_count_as_absent() {
        let fields = RawReport {
            kind: Some("  ".to_string()),
            location: Some(ReportLocation::Place(String::new())),
            description: Some(String::new()),
            ..RawReport::default()
        };
        let record = ReportRecord::from_document(ReportDocument::new("r2", fields), now());

        assert_eq!(record.category, UNKNOWN_CATEGORY);
        assert_eq!(record.location, ReportLocation::default());
        assert_eq!(record.description, MISSING_DESCRIPTION);
    }

    #[test]
    fn present_fields_are_kept() {
        let fields = RawReport {
            kind: Some("Harassment".to_string()),
            location: Some(ReportLocation::Place("Cafe Lane".to_string())),
            description: Some("Verbal abuse reported by 2 users.".to_string()),
            verified: Some(true),
            timestamp: Some(now() - Duration::hours(3)),
        };
        let record = ReportRecord::from_document(ReportDocument::new("r3", fields), now());

        assert_eq!(record.category, "Harassment");
        assert_eq!(record.location.place(), Some("Cafe Lane"));
        assert!(record.verified);
        assert_eq!(record.time_ago, "3 hours ago");
    }

    #[test]
    fn coordinates_render_with_six_decimals() {
        let location = ReportLocation::Coordinates(Coordinate::new(28.6139, 77.209));
        assert_eq!(location.to_string(), "28.613900, 77.209000");
    }

    #[test]
    fn distance_between_known_points() {
        let delhi = Coordinate::new(28.6139, 77.2090);
        let noida = Coordinate::new(28.5355, 77.3910);
        let distance = delhi.distance_km(&noida);
        assert!((19.0..20.5).contains(&distance), "got {distance}");
        assert!(delhi.distance_km(&delhi).abs() < f64::EPSILON);
    }
}
