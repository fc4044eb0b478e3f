//! Reports screen controller: live state plus search text and filter chips.

use crate::alert::UserAlert;
use crate::clock::{Clock, SystemClock};
use crate::device::{DeviceError, LocationProvider, PermissionStatus};
use crate::filter::{apply_category_filter, apply_text_filter, CategoryFilter};
use crate::models::{Coordinate, ReportRecord};
use crate::store::ReportStore;
use crate::sync::{ReportSynchronizer, ReportsViewState};

/// Drives the reports screen.
///
/// The visible list is always derived from the synchronizer's displayed set
/// (live or fallback), narrowed by the active search text and then by the
/// active category filter. New snapshots are narrowed the same way.
pub struct ReportsController<S: ReportStore, C: Clock = SystemClock> {
    sync: ReportSynchronizer<S, C>,
    search_query: String,
    active_filter: Option<CategoryFilter>,
    origin: Option<Coordinate>,
    visible: Vec<ReportRecord>,
}

impl<S: ReportStore, C: Clock> ReportsController<S, C> {
    pub const fn new(sync: ReportSynchronizer<S, C>) -> Self {
        Self {
            sync,
            search_query: String::new(),
            active_filter: None,
            origin: None,
            visible: Vec::new(),
        }
    }

    /// Open the base subscription.
    pub fn start(&mut self) {
        self.sync.subscribe();
        self.recompute();
    }

    /// Pull-to-refresh.
    pub fn refresh(&mut self) {
        self.sync.refresh();
        self.recompute();
    }

    pub fn stop(&mut self) {
        self.sync.unsubscribe();
    }

    pub const fn state(&self) -> &ReportsViewState {
        self.sync.state()
    }

    /// Records currently shown as cards.
    pub fn visible(&self) -> &[ReportRecord] {
        &self.visible
    }

    pub const fn active_filter(&self) -> Option<CategoryFilter> {
        self.active_filter
    }

    /// Update the search text.
    ///
    /// Clearing the query re-issues the base subscription so the full set is
    /// restored from the store rather than from a previously narrowed list.
    pub fn search(&mut self, text: &str) {
        self.search_query = text.to_string();
        if text.trim().is_empty() {
            tracing::debug!("Search cleared, restoring base subscription");
            self.sync.subscribe();
        }
        self.recompute();
    }

    /// Select a category chip.
    ///
    /// `nearest` asks `location` for permission and the current position.
    /// When either fails the list keeps its order and an alert is returned.
    pub async fn select_filter<L>(
        &mut self,
        filter: CategoryFilter,
        location: &L,
    ) -> Option<UserAlert>
    where
        L: LocationProvider + ?Sized,
    {
        self.active_filter = Some(filter);
        let mut alert = None;

        if filter == CategoryFilter::Nearest {
            match locate(location).await {
                Ok(origin) => self.origin = Some(origin),
                Err(failure) => {
                    tracing::warn!("Nearest filter without location: {}", failure);
                    self.origin = None;
                    alert = Some(location_alert(&failure));
                }
            }
        }

        self.recompute();
        alert
    }

    /// Drop the category filter, keeping the search text.
    pub fn clear_filter(&mut self) {
        self.active_filter = None;
        self.origin = None;
        self.recompute();
    }

    /// Wait for the next delivery and refresh the visible list.
    ///
    /// Returns `false` once there is no live subscription left.
    pub async fn next_update(&mut self) -> bool {
        let updated = self.sync.next_update().await.is_some();
        if updated {
            self.recompute();
        }
        updated
    }

    /// Apply already-queued deliveries without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let applied = self.sync.drain_pending();
        if applied > 0 {
            self.recompute();
        }
        applied
    }

    fn recompute(&mut self) {
        let searched = apply_text_filter(self.sync.state().displayed(), &self.search_query);
        self.visible = match self.active_filter {
            Some(filter) => apply_category_filter(&searched, filter, self.origin),
            None => searched,
        };
    }
}

async fn locate<L>(location: &L) -> Result<Coordinate, DeviceError>
where
    L: LocationProvider + ?Sized,
{
    match location.request_permission().await? {
        PermissionStatus::Granted => location.current_position().await,
        PermissionStatus::Denied => Err(DeviceError::PermissionDenied),
    }
}

fn location_alert(error: &DeviceError) -> UserAlert {
    match error {
        DeviceError::PermissionDenied => UserAlert::new(
            "Location Permission",
            "Permission to access location was denied",
        ),
        _ => UserAlert::new("Location Error", "Unable to get current location"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::FixedClock;
    use crate::device::StaticLocationProvider;
    use crate::models::{RawReport, ReportDocument, ReportLocation};
    use crate::store::{InMemoryReportStore, StoreError};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 0).unwrap()
    }

    fn document(
        id: &str,
        kind: &str,
        location: ReportLocation,
        minutes_ago: i64,
        verified: bool,
    ) -> ReportDocument {
        ReportDocument::new(
            id,
            RawReport {
                kind: Some(kind.to_string()),
                location: Some(location),
                verified: Some(verified),
                timestamp: Some(now() - Duration::minutes(minutes_ago)),
                ..RawReport::default()
            },
        )
    }

    fn live_documents() -> Vec<ReportDocument> {
        vec![
            document(
                "far",
                "Harassment",
                ReportLocation::Coordinates(Coordinate::new(19.0760, 72.8777)),
                5,
                true,
            ),
            document(
                "lane",
                "Stalking",
                ReportLocation::Place("Market Lane".to_string()),
                20,
                false,
            ),
            document(
                "near",
                "Harassment",
                ReportLocation::Coordinates(Coordinate::new(28.6200, 77.2100)),
                40,
                false,
            ),
        ]
    }

    async fn started(
        store: &InMemoryReportStore,
    ) -> ReportsController<InMemoryReportStore, FixedClock> {
        let sync = ReportSynchronizer::with_clock(Arc::new(store.clone()), FixedClock(now()));
        let mut controller = ReportsController::new(sync);
        controller.start();
        controller.next_update().await;
        controller
    }

    fn visible_ids<S: ReportStore, C: Clock>(controller: &ReportsController<S, C>) -> Vec<String> {
        controller
            .visible()
            .iter()
            .map(|record| record.id.to_string())
            .collect()
    }

    #[tokio::test]
    async fn search_narrows_and_clearing_restores_full_set() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;

        controller.search("HARASS");
        assert_eq!(visible_ids(&controller), vec!["far", "near"]);

        controller.search("market");
        assert_eq!(visible_ids(&controller), vec!["lane"]);

        controller.search("");
        assert_eq!(store.listener_count(), 1);
        controller.next_update().await;
        assert_eq!(visible_ids(&controller), vec!["far", "lane", "near"]);
    }

    #[tokio::test]
    async fn active_search_narrows_new_snapshots() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;
        controller.search("stalk");

        store.upsert(document(
            "new",
            "Stalking",
            ReportLocation::Place("Bus Stop".to_string()),
            1,
            true,
        ));
        controller.next_update().await;
        assert_eq!(visible_ids(&controller), vec!["new", "lane"]);
    }

    #[tokio::test]
    async fn verified_filter_uses_displayed_live_set() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;

        let alert = controller
            .select_filter(CategoryFilter::Verified, &StaticLocationProvider::denied())
            .await;
        assert_eq!(alert, None);
        assert_eq!(visible_ids(&controller), vec!["far"]);
    }

    #[tokio::test]
    async fn verified_filter_on_error_uses_fallback_set() {
        let store = InMemoryReportStore::new();
        store.fail_subscriptions(StoreError::Backend("permission-denied".to_string()));
        let sync = ReportSynchronizer::with_clock(Arc::new(store.clone()), FixedClock(now()));
        let mut controller = ReportsController::new(sync);
        controller.start();
        assert_eq!(visible_ids(&controller), vec!["1", "2", "3"]);

        controller
            .select_filter(CategoryFilter::Verified, &StaticLocationProvider::denied())
            .await;
        assert_eq!(visible_ids(&controller), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn nearest_with_location_sorts_by_distance() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;
        let location = StaticLocationProvider::granted(Coordinate::new(28.6139, 77.2090));

        let alert = controller
            .select_filter(CategoryFilter::Nearest, &location)
            .await;
        assert_eq!(alert, None);
        assert_eq!(visible_ids(&controller), vec!["near", "far", "lane"]);
    }

    #[tokio::test]
    async fn nearest_denied_alerts_and_keeps_order() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;

        let alert = controller
            .select_filter(CategoryFilter::Nearest, &StaticLocationProvider::denied())
            .await
            .unwrap();
        assert_eq!(alert.title, "Location Permission");
        assert_eq!(visible_ids(&controller), vec!["far", "lane", "near"]);
    }

    #[tokio::test]
    async fn nearest_position_failure_alerts_and_keeps_order() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;

        let alert = controller
            .select_filter(
                CategoryFilter::Nearest,
                &StaticLocationProvider::unavailable("timeout"),
            )
            .await;
        assert_eq!(
            alert,
            Some(UserAlert::new("Location Error", "Unable to get current location"))
        );
        assert_eq!(visible_ids(&controller), vec!["far", "lane", "near"]);
    }

    #[tokio::test]
    async fn recent_then_clear_filter() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;

        controller
            .select_filter(CategoryFilter::Recent, &StaticLocationProvider::denied())
            .await;
        assert_eq!(controller.active_filter(), Some(CategoryFilter::Recent));
        assert_eq!(visible_ids(&controller), vec!["far", "lane", "near"]);

        controller.clear_filter();
        assert_eq!(controller.active_filter(), None);
    }

    #[tokio::test]
    async fn stop_releases_listener() {
        let store = InMemoryReportStore::with_documents(live_documents());
        let mut controller = started(&store).await;
        controller.stop();

        assert_eq!(store.listener_count(), 0);
        assert!(!controller.next_update().await);
    }
}
