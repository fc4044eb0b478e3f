//! Home dashboard summary.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{ReportRecord, DEFAULT_USER_NAME};
use crate::store::ProfileDirectory;

pub const STATUS_LINE: &str = "You are currently in a SafeZone ✅";
pub const LOW_RISK_TEXT: &str = "Low risk area. No incidents reported in the past hour.";
pub const SMART_SUGGESTION_TEXT: &str = "The route to your hostel is currently clear and safe.";
pub const SAMPLE_COMMUNITY_REPORT: &str = "Catcalling reported 400m away, 16 mins ago.";
pub const EMERGENCY_CONTACT: &str = "+91 9876543210";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardCard {
    pub title: String,
    pub text: String,
}

impl DashboardCard {
    fn new(title: &str, text: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeDashboard {
    pub greeting: String,
    pub status: String,
    pub cards: Vec<DashboardCard>,
    pub user_name: String,
    pub emergency_contact: String,
}

impl HomeDashboard {
    /// Build the dashboard for `user_name` from the live report set.
    ///
    /// `reports` is expected newest first, as delivered by the store.
    pub fn build(user_name: &str, reports: &[ReportRecord], now: DateTime<Utc>) -> Self {
        let user_name = crate::util::normalize_text_option(Some(user_name.to_string()))
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());

        Self {
            greeting: format!("Hi {user_name} 👋"),
            status: STATUS_LINE.to_string(),
            cards: vec![
                DashboardCard::new("🔒 Safety Status", safety_status(reports, now)),
                DashboardCard::new("📍 Smart Suggestion", SMART_SUGGESTION_TEXT),
                DashboardCard::new("🔔 Latest Community Report", latest_report(reports)),
            ],
            user_name,
            emergency_contact: format!("Emergency Contact: {EMERGENCY_CONTACT}"),
        }
    }
}

fn safety_status(reports: &[ReportRecord], now: DateTime<Utc>) -> String {
    let hour_ago = now - Duration::hours(1);
    let recent = reports
        .iter()
        // Future timestamps (clock skew) read as "0 mins ago" and count as recent.
        .filter(|report| report.created_at.is_some_and(|created| created >= hour_ago))
        .count();

    match recent {
        0 => LOW_RISK_TEXT.to_string(),
        1 => "1 incident reported in the past hour. Stay alert.".to_string(),
        count => format!("{count} incidents reported in the past hour. Stay alert."),
    }
}

fn latest_report(reports: &[ReportRecord]) -> String {
    reports.first().map_or_else(
        || SAMPLE_COMMUNITY_REPORT.to_string(),
        |report| {
            format!(
                "{} reported at {}, {}.",
                report.category, report.location, report.time_ago
            )
        },
    )
}

/// Display name for the signed-in user.
///
/// Falls back to `"User"` when signed out, when the profile is missing or
/// unnamed, and when the lookup fails.
pub async fn load_user_name<D>(directory: &D, uid: Option<&str>, id_token: Option<&str>) -> String
where
    D: ProfileDirectory + ?Sized,
{
    let Some(uid) = uid else {
        return DEFAULT_USER_NAME.to_string();
    };

    match directory.fetch_profile(uid, id_token).await {
        Ok(Some(profile)) => profile.display_name(),
        Ok(None) => DEFAULT_USER_NAME.to_string(),
        Err(error) => {
            tracing::warn!("Failed to load profile for {}: {}", uid, error);
            DEFAULT_USER_NAME.to_string()
        }
    }
}
