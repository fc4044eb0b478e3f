//! User-submitted meta-report on an incident report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReportId;

/// Reason recorded for flags raised from the report card.
pub const DEFAULT_FLAG_REASON: &str = "User reported";

/// A request to review a report as incorrect or inappropriate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentFlag {
    pub report_id: ReportId,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

impl IncidentFlag {
    #[must_use]
    pub fn new(report_id: ReportId, timestamp: DateTime<Utc>) -> Self {
        Self {
            report_id,
            timestamp,
            reason: DEFAULT_FLAG_REASON.to_string(),
        }
    }
}
