//! User-facing alerts raised in place of errors.

use std::fmt;

use serde::Serialize;

/// A title/message pair shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAlert {
    pub title: String,
    pub message: String,
}

impl UserAlert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Generic `"Error"` alert.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }
}

impl fmt::Display for UserAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
