//! Firebase Auth client logic.
//!
//! Sign-in goes through the Identity Toolkit REST API; the resulting session
//! is persisted through [`SessionPersistence`] so the CLI can stay signed in
//! between runs.

mod login;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option, unix_timestamp_now};

pub use login::{login_with_google, login_with_password, logout, LoginOutcome};

const EXPIRY_SKEW_SECONDS: i64 = 60;
const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
/// Redirect URI sent with ID-token sign-in; Firebase requires one even when
/// no redirect happens.
const IDP_REQUEST_URI: &str = "http://localhost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Firebase auth is not configured for this build.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Session kept in process memory only.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<Mutex<Option<AuthSession>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Sign-in operations used by the login flow.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthSession>;

    /// Sign in with a Google ID token obtained by the caller.
    async fn sign_in_with_google(&self, id_token: &str) -> AuthResult<AuthSession>;

    async fn sign_out(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct FirebaseAuthClient<S: SessionPersistence> {
    identity_url: String,
    token_url: String,
    api_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> FirebaseAuthClient<S> {
    pub fn new(api_key: impl Into<String>, store: S) -> AuthResult<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Firebase API key must not be empty",
            ));
        }

        Ok(Self {
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_key,
            client: Client::builder().build()?,
            store,
        })
    }

    /// Point the client at other endpoints, e.g. the auth emulator.
    pub fn with_endpoints(
        mut self,
        identity_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> AuthResult<Self> {
        self.identity_url = normalize_endpoint(identity_url.as_ref())?;
        self.token_url = normalize_endpoint(token_url.as_ref())?;
        Ok(self)
    }

    pub fn identity_url(&self) -> &str {
        &self.identity_url
    }

    /// Load the persisted session, refreshing it when expired.
    ///
    /// A session that can no longer be refreshed is cleared.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored_session) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored_session.is_expired() {
            return Ok(Some(stored_session));
        }

        match self.refresh_session(&stored_session).await {
            Ok(refreshed) => {
                self.store.save_session(&refreshed)?;
                Ok(Some(refreshed))
            }
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    pub async fn refresh_session(&self, session: &AuthSession) -> AuthResult<AuthSession> {
        if session.refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }

        let request = self.keyed(
            self.client
                .post(format!("{}/token", self.token_url))
                .form(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", session.refresh_token.as_str()),
                ]),
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        let refreshed = response
            .json::<FirebaseRefreshResponse>()
            .await?
            .into_session(session.user.email.clone())?;
        self.store.save_session(&refreshed)?;
        Ok(refreshed)
    }

    fn keyed(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[("key", self.api_key.as_str())])
    }

    async fn send_sign_in(&self, method: &str, payload: serde_json::Value) -> AuthResult<AuthSession> {
        let request = self.keyed(
            self.client
                .post(format!("{}/accounts:{method}", self.identity_url))
                .json(&payload),
        );

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        let session = response.json::<FirebaseSignInResponse>().await?.into_session()?;
        self.store.save_session(&session)?;
        tracing::debug!("Signed in as {}", session.user.uid);
        Ok(session)
    }
}

#[async_trait]
impl<S: SessionPersistence> AuthProvider for FirebaseAuthClient<S> {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;

        let payload = serde_json::json!({
            "email": email.trim(),
            "password": password,
            "returnSecureToken": true,
        });
        self.send_sign_in("signInWithPassword", payload).await
    }

    async fn sign_in_with_google(&self, id_token: &str) -> AuthResult<AuthSession> {
        let id_token = id_token.trim();
        if id_token.is_empty() {
            return Err(AuthError::Api("Google ID token is required".to_string()));
        }

        let post_body = format!(
            "id_token={}&providerId=google.com",
            urlencoding::encode(id_token)
        );
        let payload = serde_json::json!({
            "postBody": post_body,
            "requestUri": IDP_REQUEST_URI,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        self.send_sign_in("signInWithIdp", payload).await
    }

    /// Firebase ID tokens are stateless, so signing out only forgets the
    /// persisted session.
    async fn sign_out(&self) -> AuthResult<()> {
        self.store.clear_session()
    }
}

pub fn normalize_endpoint(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Auth endpoint must not be empty",
        ));
    }
    if !is_http_url(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "Auth endpoint must include http:// or https://",
        ));
    }
    Ok(trimmed.to_string())
}

/// Resolve the optional Firebase API key; a blank key means auth is off.
pub fn resolve_optional_api_key(api_key: Option<String>) -> Option<String> {
    normalize_text_option(api_key)
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Api("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Api("Password is required".to_string()));
    }
    Ok(())
}

fn expiry_from_now(expires_in: Option<&str>) -> AuthResult<i64> {
    let seconds = expires_in
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or_else(|| AuthError::Api("Auth response did not include a token lifetime".to_string()))?;
    Ok(unix_timestamp_now().saturating_add(seconds))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirebaseSignInResponse {
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
    local_id: Option<String>,
    email: Option<String>,
}

impl FirebaseSignInResponse {
    fn into_session(self) -> AuthResult<AuthSession> {
        match (self.id_token, self.refresh_token, self.local_id) {
            (Some(id_token), Some(refresh_token), Some(uid)) => Ok(AuthSession {
                id_token,
                refresh_token,
                expires_at: expiry_from_now(self.expires_in.as_deref())?,
                user: AuthUser {
                    uid,
                    email: normalize_text_option(self.email),
                },
            }),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

/// Secure token endpoint replies in snake case.
#[derive(Debug, Deserialize)]
struct FirebaseRefreshResponse {
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
    user_id: Option<String>,
}

impl FirebaseRefreshResponse {
    fn into_session(self, email: Option<String>) -> AuthResult<AuthSession> {
        match (self.id_token, self.refresh_token, self.user_id) {
            (Some(id_token), Some(refresh_token), Some(uid)) => Ok(AuthSession {
                id_token,
                refresh_token,
                expires_at: expiry_from_now(self.expires_in.as_deref())?,
                user: AuthUser { uid, email },
            }),
            _ => Err(AuthError::Api(
                "Refresh response did not include an active session".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorEnvelope {
    error: Option<FirebaseErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorBody {
    message: Option<String>,
}

/// Render an Identity Toolkit error as `auth/<code> (<status>)`.
///
/// Firebase reports codes such as `INVALID_LOGIN_CREDENTIALS`, sometimes
/// followed by ` : <detail>`; only the code is kept.
fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<FirebaseErrorEnvelope>(body) {
        if let Some(message) = payload.error.and_then(|error| error.message) {
            let code = message.split(" : ").next().unwrap_or_default().trim();
            if !code.is_empty() {
                return format!(
                    "auth/{} ({})",
                    code.to_ascii_lowercase().replace('_', "-"),
                    status.as_u16()
                );
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(expires_at: i64) -> AuthSession {
        AuthSession {
            id_token: "secret-id-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at,
            user: AuthUser {
                uid: "user".to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn sign_in_response_becomes_session() {
        let response: FirebaseSignInResponse = serde_json::from_str(
            r#"{
                "kind": "identitytoolkit#VerifyPasswordResponse",
                "localId": "uid-1",
                "email": "asha@example.com",
                "idToken": "id",
                "refreshToken": "refresh",
                "expiresIn": "3600",
                "registered": true
            }"#,
        )
        .unwrap();

        let before = unix_timestamp_now();
        let session = response.into_session().unwrap();
        assert_eq!(session.user.uid, "uid-1");
        assert_eq!(session.user.email.as_deref(), Some("asha@example.com"));
        assert!(session.expires_at >= before + 3600);
        assert!(!session.is_expired());
    }

    #[test]
    fn sign_in_response_without_tokens_is_rejected() {
        let response: FirebaseSignInResponse =
            serde_json::from_str(r#"{"localId": "uid-1"}"#).unwrap();
        assert!(matches!(response.into_session(), Err(AuthError::Api(_))));
    }

    #[test]
    fn refresh_response_keeps_email() {
        let response: FirebaseRefreshResponse = serde_json::from_str(
            r#"{"id_token": "new", "refresh_token": "r2", "expires_in": "3600", "user_id": "uid-1"}"#,
        )
        .unwrap();
        let session = response
            .into_session(Some("asha@example.com".to_string()))
            .unwrap();
        assert_eq!(session.id_token, "new");
        assert_eq!(session.user.email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn api_errors_render_sdk_style_codes() {
        let body = r#"{"error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}}"#;
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, body),
            "auth/invalid-login-credentials (400)"
        );

        let detailed = r#"{"error": {"message": "TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"}}"#;
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, detailed),
            "auth/too-many-attempts-try-later (400)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }

    #[test]
    fn endpoints_are_normalized() {
        assert_eq!(
            normalize_endpoint("http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1/").unwrap(),
            "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1"
        );
        assert!(normalize_endpoint("localhost:9099").is_err());
        assert_eq!(resolve_optional_api_key(Some("  ".to_string())), None);
    }

    #[test]
    fn memory_store_round_trips_session() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load_session().unwrap(), None);

        store.save_session(&session(1_700_000_000)).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session(1_700_000_000)));

        store.clear_session().unwrap();
        assert_eq!(store.load_session().unwrap(), None);
    }

    #[tokio::test]
    async fn unexpired_session_restores_without_network() {
        let store = MemorySessionStore::new();
        let fresh = session(unix_timestamp_now() + 3600);
        store.save_session(&fresh).unwrap();

        let client = FirebaseAuthClient::new("api-key", store).unwrap();
        assert_eq!(client.restore_session().await.unwrap(), Some(fresh));
    }

    #[tokio::test]
    async fn sign_in_validates_credentials_before_request() {
        let client = FirebaseAuthClient::new("api-key", MemorySessionStore::new()).unwrap();
        let error = client.sign_in_with_password(" ", "secret").await.unwrap_err();
        assert_eq!(error.to_string(), "Email is required");
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session(1_700_000_000));
        assert!(!rendered.contains("secret-id-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
