//! User profile model

use serde::{Deserialize, Serialize};

/// Display name used when a profile has no name.
pub const DEFAULT_USER_NAME: &str = "User";

/// Profile document stored under `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserProfile {
    /// The profile name, or `"User"` when it is missing or blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        crate::util::normalize_text_option(self.name.clone())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string())
    }
}
