//! Per-card actions: share, flag for review, and directions.
//!
//! Every action settles into an optional [`UserAlert`]; failures never
//! propagate to the caller and nothing is retried.

use chrono::{DateTime, Utc};

use crate::alert::UserAlert;
use crate::device::{map_deep_link, LinkOpener, Platform, ShareSheet, SharePayload};
use crate::models::{IncidentFlag, ReportId, ReportRecord, SafeSpot};
use crate::store::ReportStore;

/// Text shared for a report card.
pub fn share_payload(record: &ReportRecord) -> SharePayload {
    SharePayload {
        message: format!(
            "Safety Alert: {} reported at {}. {}",
            record.category, record.location, record.description
        ),
    }
}

/// Hand the report to the share sheet. Returns an alert when sharing fails.
pub async fn share_report<H>(sheet: &H, record: &ReportRecord) -> Option<UserAlert>
where
    H: ShareSheet + ?Sized,
{
    match sheet.share(&share_payload(record)).await {
        Ok(()) => None,
        Err(error) => {
            tracing::warn!("Failed to share report {}: {}", record.id, error);
            Some(UserAlert::error("Unable to share report"))
        }
    }
}

/// Write a review flag for `report_id` stamped with `now`.
///
/// Always yields an alert: a thank-you on success, an error otherwise.
pub async fn flag_report<S>(store: &S, report_id: &ReportId, now: DateTime<Utc>) -> UserAlert
where
    S: ReportStore + ?Sized,
{
    let flag = IncidentFlag::new(report_id.clone(), now);
    match store.create_flag(&flag).await {
        Ok(()) => {
            tracing::info!("Flagged report {} for review", report_id);
            UserAlert::new("Thank you", "We will review this report")
        }
        Err(error) => {
            tracing::error!("Failed to flag report {}: {}", report_id, error);
            UserAlert::error("Failed to submit report")
        }
    }
}

/// Maps deep link for a safe spot.
pub fn directions_link(platform: Platform, spot: &SafeSpot) -> String {
    map_deep_link(platform, &spot.name, spot.coordinate)
}

/// Open directions to `spot` in the platform maps app.
pub async fn open_directions<O>(opener: &O, platform: Platform, spot: &SafeSpot) -> Option<UserAlert>
where
    O: LinkOpener + ?Sized,
{
    let url = directions_link(platform, spot);
    let outcome = match opener.can_open(&url).await {
        Ok(true) => opener.open(&url).await,
        Ok(false) => {
            tracing::warn!("No handler for {}", url);
            return Some(maps_alert());
        }
        Err(error) => Err(error),
    };

    match outcome {
        Ok(()) => None,
        Err(error) => {
            tracing::warn!("Failed to open {}: {}", url, error);
            Some(maps_alert())
        }
    }
}

fn maps_alert() -> UserAlert {
    UserAlert::error("Unable to open maps")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::{fallback_reports, safe_spots};
    use crate::device::{DeviceError, DeviceResult};
    use crate::models::{Coordinate, ReportLocation};
    use crate::store::{InMemoryReportStore, StoreError};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 0).unwrap()
    }

    #[derive(Default)]
    struct RecordingSheet {
        fail: bool,
        shared: Mutex<Vec<SharePayload>>,
    }

    #[async_trait]
    impl ShareSheet for RecordingSheet {
        async fn share(&self, payload: &SharePayload) -> DeviceResult<()> {
            if self.fail {
                return Err(DeviceError::Share("dismissed".to_string()));
            }
            self.shared.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct ScriptedOpener {
        supported: DeviceResult<bool>,
        opened: Mutex<Vec<String>>,
    }

    impl ScriptedOpener {
        fn new(supported: DeviceResult<bool>) -> Self {
            Self {
                supported,
                opened: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LinkOpener for ScriptedOpener {
        async fn can_open(&self, _url: &str) -> DeviceResult<bool> {
            self.supported.clone()
        }

        async fn open(&self, url: &str) -> DeviceResult<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn share_payload_uses_display_location() {
        let mut record = fallback_reports(now()).remove(1);
        assert_eq!(
            share_payload(&record).message,
            "Safety Alert: Harassment reported at Cafe Lane. Verbal abuse reported by 2 users."
        );

        record.location = ReportLocation::Coordinates(Coordinate::new(28.5, 77.25));
        assert!(share_payload(&record)
            .message
            .contains("reported at 28.500000, 77.250000."));
    }

    #[tokio::test]
    async fn share_failure_becomes_alert() {
        let record = fallback_reports(now()).remove(0);

        let sheet = RecordingSheet::default();
        assert_eq!(share_report(&sheet, &record).await, None);
        assert_eq!(sheet.shared.lock().unwrap().len(), 1);

        let failing = RecordingSheet {
            fail: true,
            ..RecordingSheet::default()
        };
        assert_eq!(
            share_report(&failing, &record).await,
            Some(UserAlert::new("Error", "Unable to share report"))
        );
    }

    #[tokio::test]
    async fn flag_writes_meta_report() {
        let store = InMemoryReportStore::new();
        let alert = flag_report(&store, &ReportId::new("2"), now()).await;

        assert_eq!(alert, UserAlert::new("Thank you", "We will review this report"));
        let flags = store.flags();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].report_id.as_str(), "2");
        assert_eq!(flags[0].reason, "User reported");
        assert_eq!(flags[0].timestamp, now());
    }

    #[tokio::test]
    async fn flag_write_failure_becomes_alert() {
        let store = InMemoryReportStore::new();
        store.fail_writes(StoreError::Http("offline".to_string()));

        let alert = flag_report(&store, &ReportId::new("2"), now()).await;
        assert_eq!(alert, UserAlert::new("Error", "Failed to submit report"));
        assert!(store.flags().is_empty());
    }

    #[tokio::test]
    async fn directions_open_platform_link() {
        let spot = safe_spots().remove(0);
        let opener = ScriptedOpener::new(Ok(true));

        assert_eq!(open_directions(&opener, Platform::Android, &spot).await, None);
        assert_eq!(
            opener.opened.lock().unwrap().as_slice(),
            ["geo:0,0?q=28.6304,77.2177(Women%20Police%20Station)"]
        );
    }

    #[tokio::test]
    async fn unsupported_or_failing_maps_alert() {
        let spot = safe_spots().remove(1);

        let unsupported = ScriptedOpener::new(Ok(false));
        assert_eq!(
            open_directions(&unsupported, Platform::Ios, &spot).await,
            Some(UserAlert::new("Error", "Unable to open maps"))
        );
        assert!(unsupported.opened.lock().unwrap().is_empty());

        let broken = ScriptedOpener::new(Err(DeviceError::Link("no maps".to_string())));
        assert_eq!(
            open_directions(&broken, Platform::Ios, &spot).await,
            Some(UserAlert::new("Error", "Unable to open maps"))
        );
    }
}
