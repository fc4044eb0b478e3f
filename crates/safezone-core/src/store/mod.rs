//! Remote report store contract.
//!
//! The store is an external collaborator: a document collection that can be
//! queried and subscribed to. Implementations deliver whole snapshots over a
//! per-subscription channel; the [`Subscription`] handle owns the listener
//! and releases it on drop.

mod firestore;
mod memory;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{IncidentFlag, ReportDocument, UserProfile};

pub use firestore::{FirestoreClient, FirestoreConfig};
pub use memory::InMemoryReportStore;

/// Collection holding incident reports.
pub const REPORTS_COLLECTION: &str = "incidentReports";
/// Collection receiving user flags on reports.
pub const FLAGS_COLLECTION: &str = "reportedIncidents";
/// Collection holding user profiles.
pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid store configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Store request failed: {0}")]
    Http(String),
    /// Error reported by the backend itself, e.g. `permission-denied`.
    #[error("{0}")]
    Backend(String),
    #[error("Invalid document payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Collection plus ordering for a live query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub collection: String,
    pub order_by: String,
    pub direction: SortDirection,
}

impl Default for ReportQuery {
    /// `incidentReports` ordered by `timestamp`, newest first.
    fn default() -> Self {
        Self {
            collection: REPORTS_COLLECTION.to_string(),
            order_by: "timestamp".to_string(),
            direction: SortDirection::Descending,
        }
    }
}

/// One delivery on a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The complete ordered result set at one point in time.
    Snapshot(Vec<ReportDocument>),
    /// The listener failed; no further events follow.
    Error(StoreError),
}

/// Identifier of a live listener within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Release = Box<dyn FnOnce() + Send>;

/// Owned handle to a live listener.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) closes the
/// channel and detaches the listener from the store, so nothing can be
/// delivered through it afterwards.
pub struct Subscription {
    id: SubscriptionId,
    events: mpsc::UnboundedReceiver<StoreEvent>,
    release: Option<Release>,
}

impl Subscription {
    pub fn new(
        id: SubscriptionId,
        events: mpsc::UnboundedReceiver<StoreEvent>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            id,
            events,
            release: Some(Box::new(release)),
        }
    }

    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event. `None` once the listener has ended.
    pub async fn next_event(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }

    /// Take an already-queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<StoreEvent> {
        self.events.try_recv().ok()
    }

    /// Detach the listener. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}

    fn release(&mut self) {
        self.events.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Query/subscribe/create contract of the remote report store.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Open a live subscription. Establishment failures are returned here;
    /// later failures arrive as [`StoreEvent::Error`].
    fn subscribe(&self, query: &ReportQuery) -> StoreResult<Subscription>;

    /// Write a flag into `reportedIncidents`. Fire-and-forget, no retry.
    async fn create_flag(&self, flag: &IncidentFlag) -> StoreResult<()>;
}

/// Lookup of `users/{uid}` profile documents.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn fetch_profile(&self, uid: &str, id_token: Option<&str>)
        -> StoreResult<Option<UserProfile>>;
}

/// Order documents the way a backend applies `query`.
pub(crate) fn order_documents(documents: &mut [ReportDocument], query: &ReportQuery) {
    match query.direction {
        SortDirection::Descending => {
            documents.sort_by(|a, b| b.fields.timestamp.cmp(&a.fields.timestamp));
        }
        SortDirection::Ascending => {
            documents.sort_by(|a, b| a.fields.timestamp.cmp(&b.fields.timestamp));
        }
    }
}
