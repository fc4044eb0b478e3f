//! CLI Firebase session helpers with secure keychain persistence.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use safezone_core::auth::{
    resolve_optional_api_key, AuthError, AuthResult, AuthSession, FirebaseAuthClient,
    SessionPersistence,
};
use safezone_core::config::AppConfig;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "safezone-cli";
const SESSION_USERNAME: &str = "firebase_session";

#[derive(Clone)]
pub struct KeyringSessionStore {
    username: String,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self {
            username: SESSION_USERNAME.to_string(),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for KeyringSessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let store = Self::test_store();
        let guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        if let Some(raw) = guard.get(&self.username) {
            Ok(Some(serde_json::from_str(raw)?))
        } else {
            Ok(None)
        }
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let store = Self::test_store();
        let mut guard = store
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

pub type CliAuthClient = FirebaseAuthClient<KeyringSessionStore>;

/// Auth client for the configured project, if Firebase is configured.
pub fn auth_client(config: &AppConfig) -> AuthResult<Option<CliAuthClient>> {
    let Some(api_key) = resolve_optional_api_key(config.firebase_api_key.clone()) else {
        return Ok(None);
    };
    let client = FirebaseAuthClient::new(api_key, KeyringSessionStore::new())?;
    match config.auth_endpoints() {
        Some((identity_url, token_url)) => Ok(Some(client.with_endpoints(identity_url, token_url)?)),
        None => Ok(Some(client)),
    }
}

/// Restore the stored session, refreshing it when needed.
///
/// Storage or refresh problems are logged and treated as signed out.
pub async fn current_session(client: Option<&CliAuthClient>) -> Option<AuthSession> {
    let client = client?;
    match client.restore_session().await {
        Ok(session) => session,
        Err(error) => {
            tracing::warn!("Failed to restore session: {}", error);
            None
        }
    }
}

pub fn clear_stored_session() -> AuthResult<()> {
    KeyringSessionStore::new().clear_session()
}
