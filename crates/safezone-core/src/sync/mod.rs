//! Live report synchronization for the reports screen.
//!
//! [`ReportSynchronizer`] owns the current store subscription and turns each
//! delivered snapshot into display-ready [`ReportRecord`]s. The screen state
//! is a single [`ReportsViewState`] value, swapped whole on every delivery.

mod state;

use std::sync::Arc;

use crate::catalog::fallback_reports;
use crate::clock::{Clock, SystemClock};
use crate::models::{ReportDocument, ReportRecord};
use crate::store::{ReportQuery, ReportStore, StoreError, StoreEvent, Subscription};

pub use state::{ReportsViewState, ViewPhase, RETRY_HINT};

/// Keeps [`ReportsViewState`] in step with a live report query.
///
/// Only the most recent subscription writes state: every re-subscribe drops
/// the previous handle first and bumps the generation, and deliveries tagged
/// with an older generation are ignored.
pub struct ReportSynchronizer<S: ReportStore, C: Clock = SystemClock> {
    store: Arc<S>,
    clock: C,
    query: ReportQuery,
    subscription: Option<Subscription>,
    generation: u64,
    state: ReportsViewState,
}

impl<S: ReportStore> ReportSynchronizer<S, SystemClock> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: ReportStore, C: Clock> ReportSynchronizer<S, C> {
    pub fn with_clock(store: Arc<S>, clock: C) -> Self {
        Self {
            store,
            clock,
            query: ReportQuery::default(),
            subscription: None,
            generation: 0,
            state: ReportsViewState::Loading,
        }
    }

    pub const fn state(&self) -> &ReportsViewState {
        &self.state
    }

    /// Generation of the current subscription; 0 before the first subscribe.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Open (or re-open) the live subscription.
    ///
    /// The previous subscription is released before the new one is opened.
    /// From a settled state the view enters refreshing and keeps showing the
    /// previous set until the next snapshot. Establishment failures move the
    /// view to the error state with the fallback set.
    pub fn subscribe(&mut self) {
        self.release_subscription();
        self.generation += 1;
        self.state.begin_refresh();

        match self.store.subscribe(&self.query) {
            Ok(subscription) => {
                tracing::debug!(
                    "Subscribed to {} (generation {}, {})",
                    self.query.collection,
                    self.generation,
                    subscription.id()
                );
                self.subscription = Some(subscription);
            }
            Err(error) => {
                tracing::error!("Failed to set up reports listener: {}", error);
                self.fail(&error);
            }
        }
    }

    /// Pull-to-refresh: re-issue the base subscription.
    pub fn refresh(&mut self) {
        self.subscribe();
    }

    /// Release the current subscription. No further deliveries are applied.
    pub fn unsubscribe(&mut self) {
        self.release_subscription();
        self.state.end_refresh();
    }

    /// Wait for the next delivery on the current subscription and apply it.
    ///
    /// Returns `None` when there is no subscription or the listener ended.
    pub async fn next_update(&mut self) -> Option<&ReportsViewState> {
        let generation = self.generation;
        let event = self.subscription.as_mut()?.next_event().await;
        match event {
            Some(event) => {
                self.deliver(generation, event);
                Some(&self.state)
            }
            None => {
                self.release_subscription();
                self.state.end_refresh();
                None
            }
        }
    }

    /// Apply every delivery already queued, without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self
            .subscription
            .as_mut()
            .and_then(Subscription::try_next_event)
        {
            let generation = self.generation;
            if self.deliver(generation, event) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one delivery tagged with the generation it was received on.
    ///
    /// Returns `false` (state untouched) for stale generations or when no
    /// subscription is active.
    pub fn deliver(&mut self, generation: u64, event: StoreEvent) -> bool {
        if generation != self.generation || self.subscription.is_none() {
            tracing::debug!(
                "Ignoring delivery for generation {} (current {})",
                generation,
                self.generation
            );
            return false;
        }

        match event {
            StoreEvent::Snapshot(documents) => self.apply_snapshot(documents),
            StoreEvent::Error(error) => {
                tracing::error!("Error fetching reports: {}", error);
                // A failed listener never delivers again.
                self.release_subscription();
                self.fail(&error);
            }
        }
        true
    }

    fn apply_snapshot(&mut self, documents: Vec<ReportDocument>) {
        let now = self.clock.now();
        let reports: Vec<ReportRecord> = documents
            .into_iter()
            .map(|document| ReportRecord::from_document(document, now))
            .collect();
        tracing::debug!("Applied snapshot with {} reports", reports.len());
        self.state = ReportsViewState::Ready {
            reports,
            refreshing: false,
        };
    }

    fn fail(&mut self, error: &StoreError) {
        self.state = ReportsViewState::Error {
            message: error.to_string(),
            fallback: fallback_reports(self.clock.now()),
            refreshing: false,
        };
    }

    fn release_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            tracing::debug!("Releasing {}", subscription.id());
            subscription.unsubscribe();
        }
    }
}
