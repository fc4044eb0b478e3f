//! Report store selection for the CLI.

use async_trait::async_trait;
use chrono::Utc;
use safezone_core::catalog::sample_documents;
use safezone_core::config::{AppConfig, BackendMode};
use safezone_core::models::{IncidentFlag, UserProfile};
use safezone_core::store::{
    FirestoreClient, InMemoryReportStore, ProfileDirectory, ReportQuery, ReportStore,
    StoreResult, Subscription,
};

/// The store the CLI talks to: Firestore when configured, otherwise an
/// in-memory store seeded with sample reports.
pub enum CliStore {
    Firestore(FirestoreClient),
    Offline(InMemoryReportStore),
}

impl CliStore {
    pub fn open(config: &AppConfig, id_token: Option<String>) -> StoreResult<Self> {
        match config.backend_mode()? {
            BackendMode::Firestore(firestore) => {
                tracing::debug!("Using Firestore project {}", firestore.project_id);
                Ok(Self::Firestore(
                    FirestoreClient::new(firestore)?.with_id_token(id_token),
                ))
            }
            BackendMode::Offline => {
                tracing::info!("Firebase is not configured, running in offline demo mode");
                Ok(Self::Offline(InMemoryReportStore::with_documents(
                    sample_documents(Utc::now()),
                )))
            }
        }
    }

    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline(_))
    }
}

#[async_trait]
impl ReportStore for CliStore {
    fn subscribe(&self, query: &ReportQuery) -> StoreResult<Subscription> {
        match self {
            Self::Firestore(store) => store.subscribe(query),
            Self::Offline(store) => store.subscribe(query),
        }
    }

    async fn create_flag(&self, flag: &IncidentFlag) -> StoreResult<()> {
        match self {
            Self::Firestore(store) => store.create_flag(flag).await,
            Self::Offline(store) => store.create_flag(flag).await,
        }
    }
}

#[async_trait]
impl ProfileDirectory for CliStore {
    async fn fetch_profile(
        &self,
        uid: &str,
        id_token: Option<&str>,
    ) -> StoreResult<Option<UserProfile>> {
        match self {
            Self::Firestore(store) => store.fetch_profile(uid, id_token).await,
            Self::Offline(store) => store.fetch_profile(uid, id_token).await,
        }
    }
}
