use safezone_core::config::{load_config_from_path, save_config_to_path, AppConfig};
use safezone_core::device::Platform;
use safezone_core::util::normalize_text_option;

use crate::auth::auth_client;
use crate::commands::common::CliContext;
use crate::error::CliError;

pub struct ConfigUpdate {
    pub project_id: Option<String>,
    pub api_key: Option<String>,
    pub firestore_url: Option<String>,
    pub auth_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub platform: Option<Platform>,
}

/// Merge explicit values over the file on disk and write it back.
pub fn run_config(context: &CliContext, update: ConfigUpdate) -> Result<(), CliError> {
    let existing = load_config_from_path(&context.config_path);
    let merged = merge_config(existing, update);

    // Validates the Firestore and auth endpoints before they are written.
    merged.backend_mode()?;
    auth_client(&merged)?;
    save_config_to_path(&merged, &context.config_path)?;

    println!("Wrote {}", context.config_path.display());
    if merged.has_firebase() {
        println!("Firebase project: {}", merged.firebase_project_id.as_deref().unwrap_or_default());
    } else {
        println!("Firebase is not configured; commands run in offline demo mode.");
    }
    Ok(())
}

pub fn merge_config(existing: AppConfig, update: ConfigUpdate) -> AppConfig {
    AppConfig {
        firebase_project_id: normalize_text_option(update.project_id)
            .or(existing.firebase_project_id),
        firebase_api_key: normalize_text_option(update.api_key).or(existing.firebase_api_key),
        firestore_base_url: normalize_text_option(update.firestore_url)
            .or(existing.firestore_base_url),
        firebase_auth_url: normalize_text_option(update.auth_url).or(existing.firebase_auth_url),
        poll_interval_secs: update.poll_interval_secs.or(existing.poll_interval_secs),
        platform: update.platform.or(existing.platform),
    }
    .normalized()
}
