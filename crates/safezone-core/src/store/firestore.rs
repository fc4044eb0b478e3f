//! Firestore REST adapter for the report store contract.
//!
//! Live subscriptions are emulated by polling `:runQuery` and emitting a
//! snapshot whenever the ordered result set changes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use super::{
    ProfileDirectory, ReportQuery, ReportStore, SortDirection, StoreError, StoreEvent,
    StoreResult, Subscription, SubscriptionId, FLAGS_COLLECTION, USERS_COLLECTION,
};
use crate::models::{
    Coordinate, IncidentFlag, RawReport, ReportDocument, ReportLocation, UserProfile,
};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Connection settings for a Firestore project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
    pub base_url: String,
    pub poll_interval: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> StoreResult<Self> {
        let project_id = normalize_text_option(Some(project_id.into())).ok_or_else(|| {
            StoreError::InvalidConfiguration("Firebase project id must not be empty".to_string())
        })?;
        let api_key = normalize_text_option(Some(api_key.into())).ok_or_else(|| {
            StoreError::InvalidConfiguration("Firebase API key must not be empty".to_string())
        })?;

        Ok(Self {
            project_id,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Point the client at another endpoint, e.g. the local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> StoreResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !is_http_url(&base_url) {
            return Err(StoreError::InvalidConfiguration(
                "Firestore base URL must include http:// or https://".to_string(),
            ));
        }
        self.base_url = base_url;
        Ok(self)
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }
}

/// Firestore client implementing [`ReportStore`] and [`ProfileDirectory`].
#[derive(Clone)]
pub struct FirestoreClient {
    documents_url: String,
    api_key: String,
    poll_interval: Duration,
    id_token: Option<String>,
    client: reqwest::Client,
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> StoreResult<Self> {
        Ok(Self {
            documents_url: config.documents_url(),
            api_key: config.api_key,
            poll_interval: config.poll_interval,
            id_token: None,
            client: reqwest::Client::builder().build()?,
        })
    }

    /// Send requests on behalf of a signed-in user.
    #[must_use]
    pub fn with_id_token(mut self, id_token: Option<String>) -> Self {
        self.id_token = normalize_text_option(id_token);
        self
    }

    /// Run `query` once and return the ordered documents.
    pub async fn run_query(&self, query: &ReportQuery) -> StoreResult<Vec<ReportDocument>> {
        let request = self.authorize(
            self.client
                .post(format!("{}:runQuery", self.documents_url))
                .json(&structured_query(query)),
            self.id_token.as_deref(),
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(parse_api_error(status, &body)));
        }

        let body = response.text().await?;
        parse_run_query_response(&body)
    }

    fn authorize(&self, request: RequestBuilder, id_token: Option<&str>) -> RequestBuilder {
        let request = request
            .query(&[("key", self.api_key.as_str())])
            .header("Accept", "application/json");
        match id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn poll(
        self,
        id: SubscriptionId,
        query: ReportQuery,
        sender: mpsc::UnboundedSender<StoreEvent>,
    ) {
        let mut last_delivered: Option<Vec<ReportDocument>> = None;

        loop {
            match self.run_query(&query).await {
                Ok(documents) => {
                    if last_delivered.as_ref() != Some(&documents) {
                        tracing::debug!("{}: delivering {} documents", id, documents.len());
                        if sender.send(StoreEvent::Snapshot(documents.clone())).is_err() {
                            break;
                        }
                        last_delivered = Some(documents);
                    }
                }
                Err(error) => {
                    tracing::warn!("{}: listener failed: {}", id, error);
                    let _ = sender.send(StoreEvent::Error(error));
                    break;
                }
            }

            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                () = sender.closed() => break,
            }
        }

        tracing::debug!("{}: polling stopped", id);
    }
}

#[async_trait]
impl ReportStore for FirestoreClient {
    fn subscribe(&self, query: &ReportQuery) -> StoreResult<Subscription> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|error| {
            StoreError::InvalidConfiguration(format!("no async runtime available: {error}"))
        })?;

        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = runtime.spawn(self.clone().poll(id, query.clone(), sender));

        tracing::debug!("{}: polling {} every {:?}", id, query.collection, self.poll_interval);
        Ok(Subscription::new(id, receiver, move || task.abort()))
    }

    async fn create_flag(&self, flag: &IncidentFlag) -> StoreResult<()> {
        let payload = json!({
            "fields": {
                "reportId": { "stringValue": flag.report_id.as_str() },
                "timestamp": {
                    "timestampValue": flag.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
                },
                "reason": { "stringValue": flag.reason },
            }
        });
        let request = self.authorize(
            self.client
                .post(format!("{}/{}", self.documents_url, FLAGS_COLLECTION))
                .json(&payload),
            self.id_token.as_deref(),
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(parse_api_error(status, &body)));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for FirestoreClient {
    async fn fetch_profile(
        &self,
        uid: &str,
        id_token: Option<&str>,
    ) -> StoreResult<Option<UserProfile>> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(StoreError::InvalidPayload("user id must not be empty".to_string()));
        }

        let request = self.authorize(
            self.client.get(format!(
                "{}/{}/{}",
                self.documents_url,
                USERS_COLLECTION,
                urlencoding::encode(uid)
            )),
            id_token.or(self.id_token.as_deref()),
        );
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(parse_api_error(status, &body)));
        }

        let document = response.json::<FirestoreDocument>().await?;
        Ok(Some(UserProfile {
            uid: uid.to_string(),
            name: string_field(&document.fields, "name"),
        }))
    }
}

fn structured_query(query: &ReportQuery) -> serde_json::Value {
    let direction = match query.direction {
        SortDirection::Ascending => "ASCENDING",
        SortDirection::Descending => "DESCENDING",
    };
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": query.collection }],
            "orderBy": [{
                "field": { "fieldPath": query.order_by },
                "direction": direction,
            }],
        }
    })
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
struct FirestoreMap {
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
struct FirestoreGeoPoint {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum FirestoreValue {
    NullValue(IgnoredAny),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(IgnoredAny),
    ReferenceValue(IgnoredAny),
    GeoPointValue(FirestoreGeoPoint),
    ArrayValue(IgnoredAny),
    MapValue(FirestoreMap),
}

impl FirestoreValue {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::DoubleValue(value) => Some(*value),
            Self::IntegerValue(value) => value.parse::<i64>().ok().map(|value| value as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreErrorEnvelope {
    error: Option<FirestoreErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FirestoreErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn parse_run_query_response(body: &str) -> StoreResult<Vec<ReportDocument>> {
    let items: Vec<RunQueryItem> = serde_json::from_str(body)
        .map_err(|error| StoreError::InvalidPayload(format!("runQuery response: {error}")))?;

    Ok(items
        .into_iter()
        .filter_map(|item| item.document)
        .map(decode_report)
        .collect())
}

fn decode_report(document: FirestoreDocument) -> ReportDocument {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or(document.name.as_str())
        .to_string();
    let fields = &document.fields;

    ReportDocument::new(
        id,
        RawReport {
            kind: string_field(fields, "type"),
            location: location_field(fields, "location"),
            description: string_field(fields, "description"),
            verified: match fields.get("verified") {
                Some(FirestoreValue::BooleanValue(value)) => Some(*value),
                _ => None,
            },
            timestamp: timestamp_field(fields, "timestamp"),
        },
    )
}

fn string_field(fields: &HashMap<String, FirestoreValue>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(FirestoreValue::StringValue(value)) => Some(value.clone()),
        _ => None,
    }
}

fn timestamp_field(fields: &HashMap<String, FirestoreValue>, key: &str) -> Option<DateTime<Utc>> {
    match fields.get(key) {
        Some(FirestoreValue::TimestampValue(value)) => DateTime::parse_from_rfc3339(value)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(|error| tracing::debug!("Ignoring malformed timestamp {value}: {error}"))
            .ok(),
        _ => None,
    }
}

fn location_field(fields: &HashMap<String, FirestoreValue>, key: &str) -> Option<ReportLocation> {
    match fields.get(key)? {
        FirestoreValue::StringValue(place) => Some(ReportLocation::Place(place.clone())),
        FirestoreValue::GeoPointValue(point) => Some(ReportLocation::Coordinates(Coordinate::new(
            point.latitude,
            point.longitude,
        ))),
        FirestoreValue::MapValue(map) => {
            let latitude = map.fields.get("latitude")?.as_f64()?;
            let longitude = map.fields.get("longitude")?.as_f64()?;
            Some(ReportLocation::Coordinates(Coordinate::new(latitude, longitude)))
        }
        _ => None,
    }
}

/// Render a backend error as `"{message} ({code})"`, using the client SDK
/// spelling of status codes (`PERMISSION_DENIED` becomes `permission-denied`).
fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(FirestoreErrorEnvelope { error: Some(error) }) =
        serde_json::from_str::<FirestoreErrorEnvelope>(body)
    {
        let code = error
            .status
            .map_or_else(|| status.as_u16().to_string(), |code| sdk_error_code(&code));
        if let Some(message) = normalize_text_option(error.message) {
            return format!("{message} ({code})");
        }
        return code;
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn sdk_error_code(status: &str) -> String {
    status.trim().to_ascii_lowercase().replace('_', "-")
}
