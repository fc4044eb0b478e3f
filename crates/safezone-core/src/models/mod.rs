//! Data models for SafeZone

mod flag;
mod place;
mod profile;
mod report;

pub use flag::{IncidentFlag, DEFAULT_FLAG_REASON};
pub use place::{SafeSpot, SafeSpotKind, SafetyTip};
pub use profile::{UserProfile, DEFAULT_USER_NAME};
pub use report::{
    Coordinate, RawReport, ReportDocument, ReportId, ReportLocation, ReportRecord,
    MISSING_DESCRIPTION, UNKNOWN_CATEGORY,
};
