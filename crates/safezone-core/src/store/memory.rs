//! In-memory report store used for tests and offline demo mode.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    order_documents, ProfileDirectory, ReportQuery, ReportStore, StoreError, StoreEvent,
    StoreResult, Subscription, SubscriptionId,
};
use crate::models::{IncidentFlag, ReportDocument, ReportId, UserProfile};

struct Listener {
    query: ReportQuery,
    sender: mpsc::UnboundedSender<StoreEvent>,
}

#[derive(Default)]
struct MemoryState {
    documents: Vec<ReportDocument>,
    listeners: BTreeMap<SubscriptionId, Listener>,
    next_subscription_id: u64,
    subscribe_failure: Option<StoreError>,
    write_failure: Option<StoreError>,
    flags: Vec<IncidentFlag>,
    profiles: HashMap<String, UserProfile>,
}

impl MemoryState {
    fn snapshot_for(&self, query: &ReportQuery) -> Vec<ReportDocument> {
        // Firestore leaves documents without the order-by field out of the result.
        let mut documents: Vec<_> = self
            .documents
            .iter()
            .filter(|document| document.fields.timestamp.is_some())
            .cloned()
            .collect();
        order_documents(&mut documents, query);
        documents
    }

    fn broadcast(&mut self) {
        let snapshots: Vec<_> = self
            .listeners
            .iter()
            .map(|(id, listener)| (*id, self.snapshot_for(&listener.query)))
            .collect();

        for (id, documents) in snapshots {
            let delivered = self
                .listeners
                .get(&id)
                .is_some_and(|listener| listener.sender.send(StoreEvent::Snapshot(documents)).is_ok());
            if !delivered {
                self.listeners.remove(&id);
            }
        }
    }
}

/// Report store kept entirely in process memory.
///
/// Every mutation pushes a fresh snapshot to each live listener, the way a
/// real-time backend does. Failures can be injected for either subscription
/// establishment or writes.
#[derive(Clone, Default)]
pub struct InMemoryReportStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryReportStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_documents(documents: Vec<ReportDocument>) -> Self {
        let store = Self::new();
        store.lock().documents = documents;
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a document and notify listeners.
    pub fn upsert(&self, document: ReportDocument) {
        let mut state = self.lock();
        if let Some(existing) = state
            .documents
            .iter_mut()
            .find(|existing| existing.id == document.id)
        {
            *existing = document;
        } else {
            state.documents.push(document);
        }
        state.broadcast();
    }

    /// Delete a document and notify listeners. Returns whether it existed.
    pub fn remove(&self, id: &ReportId) -> bool {
        let mut state = self.lock();
        let before = state.documents.len();
        state.documents.retain(|document| &document.id != id);
        let removed = state.documents.len() != before;
        if removed {
            state.broadcast();
        }
        removed
    }

    /// Make every following `subscribe` call fail with `error`.
    pub fn fail_subscriptions(&self, error: StoreError) {
        self.lock().subscribe_failure = Some(error);
    }

    /// Make every following flag write fail with `error`.
    pub fn fail_writes(&self, error: StoreError) {
        self.lock().write_failure = Some(error);
    }

    /// Clear injected failures.
    pub fn heal(&self) {
        let mut state = self.lock();
        state.subscribe_failure = None;
        state.write_failure = None;
    }

    /// Terminate every live listener with `error`.
    pub fn emit_error(&self, error: &StoreError) {
        let listeners = std::mem::take(&mut self.lock().listeners);
        for listener in listeners.into_values() {
            let _ = listener.sender.send(StoreEvent::Error(error.clone()));
        }
    }

    /// Push `documents` to one listener as-is, bypassing the stored set.
    ///
    /// Returns `false` when the listener no longer exists.
    pub fn force_snapshot(&self, id: SubscriptionId, documents: Vec<ReportDocument>) -> bool {
        self.lock()
            .listeners
            .get(&id)
            .is_some_and(|listener| listener.sender.send(StoreEvent::Snapshot(documents)).is_ok())
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Flags written so far.
    pub fn flags(&self) -> Vec<IncidentFlag> {
        self.lock().flags.clone()
    }

    pub fn insert_profile(&self, profile: UserProfile) {
        self.lock().profiles.insert(profile.uid.clone(), profile);
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    fn subscribe(&self, query: &ReportQuery) -> StoreResult<Subscription> {
        let mut state = self.lock();
        if let Some(error) = state.subscribe_failure.clone() {
            return Err(error);
        }

        state.next_subscription_id += 1;
        let id = SubscriptionId(state.next_subscription_id);
        let (sender, receiver) = mpsc::unbounded_channel();

        // Real-time listeners deliver the current set immediately.
        let initial = state.snapshot_for(query);
        let _ = sender.send(StoreEvent::Snapshot(initial));
        state.listeners.insert(
            id,
            Listener {
                query: query.clone(),
                sender,
            },
        );
        drop(state);

        tracing::debug!("Attached in-memory listener {}", id);
        let detach = Arc::downgrade(&self.state);
        Ok(Subscription::new(id, receiver, move || {
            if let Some(state) = detach.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&id);
                tracing::debug!("Detached in-memory listener {}", id);
            }
        }))
    }

    async fn create_flag(&self, flag: &IncidentFlag) -> StoreResult<()> {
        let mut state = self.lock();
        if let Some(error) = state.write_failure.clone() {
            return Err(error);
        }
        state.flags.push(flag.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryReportStore {
    async fn fetch_profile(
        &self,
        uid: &str,
        _id_token: Option<&str>,
    ) -> StoreResult<Option<UserProfile>> {
        Ok(self.lock().profiles.get(uid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawReport;
    use chrono::{TimeZone, Utc};

    fn document(id: &str, minute: u32) -> ReportDocument {
        ReportDocument::new(
            id,
            RawReport {
                kind: Some(format!("kind-{id}")),
                timestamp: Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap()),
                ..RawReport::default()
            },
        )
    }

    fn ids(event: Option<StoreEvent>) -> Vec<String> {
        match event {
            Some(StoreEvent::Snapshot(documents)) => documents
                .into_iter()
                .map(|document| document.id.to_string())
                .collect(),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_snapshot_newest_first() {
        let store = InMemoryReportStore::with_documents(vec![
            document("old", 1),
            document("new", 30),
            document("mid", 10),
        ]);
        let mut subscription = store.subscribe(&ReportQuery::default()).unwrap();

        assert_eq!(ids(subscription.next_event().await), vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn mutations_push_full_snapshots() {
        let store = InMemoryReportStore::with_documents(vec![document("a", 1)]);
        let mut subscription = store.subscribe(&ReportQuery::default()).unwrap();
        let _ = subscription.next_event().await;

        store.upsert(document("b", 2));
        assert_eq!(ids(subscription.next_event().await), vec!["b", "a"]);

        assert!(store.remove(&ReportId::new("a")));
        assert_eq!(ids(subscription.next_event().await), vec!["b"]);
        assert!(!store.remove(&ReportId::new("a")));
    }

    #[tokio::test]
    async fn undated_documents_are_left_out_of_snapshots() {
        let undated = ReportDocument::new(
            "undated",
            RawReport {
                kind: Some("Stalking".to_string()),
                ..RawReport::default()
            },
        );
        let store = InMemoryReportStore::with_documents(vec![undated, document("a", 1)]);
        let mut subscription = store.subscribe(&ReportQuery::default()).unwrap();
        assert_eq!(ids(subscription.next_event().await), vec!["a"]);

        store.upsert(document("undated", 5));
        assert_eq!(ids(subscription.next_event().await), vec!["undated", "a"]);
    }

    #[test]
    fn dropping_subscription_detaches_listener() {
        let store = InMemoryReportStore::new();
        let subscription = store.subscribe(&ReportQuery::default()).unwrap();
        let id = subscription.id();
        assert_eq!(store.listener_count(), 1);

        drop(subscription);
        assert_eq!(store.listener_count(), 0);
        assert!(!store.force_snapshot(id, Vec::new()));
    }

    #[test]
    fn injected_subscribe_failure_is_returned() {
        let store = InMemoryReportStore::new();
        store.fail_subscriptions(StoreError::Backend("permission-denied".to_string()));
        let error = store.subscribe(&ReportQuery::default()).unwrap_err();
        assert_eq!(error.to_string(), "permission-denied");

        store.heal();
        assert!(store.subscribe(&ReportQuery::default()).is_ok());
    }

    #[tokio::test]
    async fn emit_error_terminates_listeners() {
        let store = InMemoryReportStore::new();
        let mut subscription = store.subscribe(&ReportQuery::default()).unwrap();
        let _ = subscription.next_event().await;

        store.emit_error(&StoreError::Backend("unavailable".to_string()));
        assert_eq!(
            subscription.next_event().await,
            Some(StoreEvent::Error(StoreError::Backend("unavailable".to_string())))
        );
        assert_eq!(subscription.next_event().await, None);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn flags_are_recorded_unless_writes_fail() {
        let store = InMemoryReportStore::new();
        let flag = IncidentFlag::new(ReportId::new("r1"), Utc::now());
        store.create_flag(&flag).await.unwrap();
        assert_eq!(store.flags(), vec![flag.clone()]);

        store.fail_writes(StoreError::Http("offline".to_string()));
        assert!(store.create_flag(&flag).await.is_err());
        assert_eq!(store.flags().len(), 1);
    }
}
