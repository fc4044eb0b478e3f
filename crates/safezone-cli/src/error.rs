use std::io;

use safezone_core::auth::AuthError;
use safezone_core::store::StoreError;
use safezone_core::UserAlert;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] safezone_core::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    /// A user-facing failure already phrased as an alert.
    #[error("{0}")]
    Alert(UserAlert),
    #[error("Report not found: {0}")]
    ReportNotFound(String),
    #[error("Safe spot not found: {0}")]
    SpotNotFound(String),
    #[error(
        "Firebase is not configured. Run `safezone config --project-id <ID> --api-key <KEY>`, or set SAFEZONE_FIREBASE_PROJECT_ID and SAFEZONE_FIREBASE_API_KEY."
    )]
    FirebaseNotConfigured,
}
