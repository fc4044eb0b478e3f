use std::sync::Arc;

use chrono::{TimeZone, Utc};
use clap::Parser;
use pretty_assertions::assert_eq;
use safezone_core::catalog::{fallback_reports, safe_spots, safety_tips};
use safezone_core::config::AppConfig;
use safezone_core::device::Platform;
use safezone_core::home::HomeDashboard;
use safezone_core::presentation::ReportsPanel;
use safezone_core::sync::{ReportsViewState, ViewPhase};

use crate::backend::CliStore;
use crate::cli::{Cli, Commands, FilterArg};
use crate::commands::common::{
    format_dashboard_lines, format_panel_lines, format_spot_lines, format_tip_lines,
    is_affirmative, resolve_spot, start_controller,
};
use crate::commands::config::{merge_config, ConfigUpdate};
use crate::error::CliError;

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 18, 30, 0).unwrap()
}

#[test]
fn error_panel_lists_retry_text_then_fallback_cards() {
    let fallback = fallback_reports(fixed_now());
    let state = ReportsViewState::Error {
        message: "permission-denied".to_string(),
        fallback: fallback.clone(),
        refreshing: false,
    };

    let lines = format_panel_lines(&ReportsPanel::build(&state, &fallback));
    assert_eq!(lines[0], "permission-denied. Pull down to retry.");
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "1  Stalking [verified]  (12 mins ago)");
    assert_eq!(lines[3], "    at Near Metro Station");
    assert_eq!(lines.len(), 2 + 3 * 3);
}

#[test]
fn empty_ready_panel_says_no_reports() {
    let state = ReportsViewState::Ready {
        reports: Vec::new(),
        refreshing: false,
    };
    assert_eq!(
        format_panel_lines(&ReportsPanel::build(&state, &[])),
        vec!["No reports found.".to_string()]
    );
}

#[test]
fn spot_and_tip_lines_are_numbered_and_labelled() {
    let spots = format_spot_lines(&safe_spots());
    assert_eq!(
        spots[0],
        "1. Women Police Station (Police, shield)  1.2 km  Open 24/7"
    );
    assert_eq!(spots.len(), 3);

    let tips = format_tip_lines(&safety_tips());
    assert_eq!(
        tips[2],
        "Use Safe Routes (map): Stick to well-lit and populated areas"
    );
}

#[test]
fn dashboard_lines_start_with_greeting() {
    let dashboard = HomeDashboard::build("Asha", &[], fixed_now());
    let lines = format_dashboard_lines(&dashboard);
    assert_eq!(lines[0], "Hi Asha 👋");
    assert_eq!(lines[1], "You are currently in a SafeZone ✅");
    assert_eq!(lines.last().map(String::as_str), Some("Emergency Contact: +91 9876543210"));
}

#[test]
fn resolve_spot_by_position_or_name() {
    let spots = safe_spots();
    assert_eq!(resolve_spot(&spots, "2").unwrap().name, "Safe Shelter Home");
    assert_eq!(resolve_spot(&spots, "women help center").unwrap().name, "Women Help Center");
    assert_eq!(resolve_spot(&spots, "police").unwrap().name, "Women Police Station");
    assert!(matches!(
        resolve_spot(&spots, "9"),
        Err(CliError::SpotNotFound(_))
    ));
    assert!(resolve_spot(&spots, "  ").is_err());
}

#[test]
fn affirmative_answers() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative(""));
    assert!(!is_affirmative("nope"));
}

#[test]
fn config_update_keeps_unspecified_values() {
    let existing = AppConfig {
        firebase_project_id: Some("safezone-demo".to_string()),
        firebase_api_key: Some("old-key".to_string()),
        poll_interval_secs: Some(5),
        ..AppConfig::default()
    };
    let merged = merge_config(
        existing,
        ConfigUpdate {
            project_id: None,
            api_key: Some(" new-key ".to_string()),
            firestore_url: Some(String::new()),
            auth_url: Some("http://127.0.0.1:9099".to_string()),
            poll_interval_secs: None,
            platform: Some(Platform::Ios),
        },
    );

    assert_eq!(merged.firebase_project_id.as_deref(), Some("safezone-demo"));
    assert_eq!(merged.firebase_api_key.as_deref(), Some("new-key"));
    assert_eq!(merged.firestore_base_url, None);
    assert_eq!(merged.firebase_auth_url.as_deref(), Some("http://127.0.0.1:9099"));
    assert_eq!(merged.poll_interval_secs, Some(5));
    assert_eq!(merged.platform, Some(Platform::Ios));
}

#[test]
fn reports_command_parses_filter_and_position() {
    let cli = Cli::try_parse_from([
        "safezone", "reports", "--filter", "nearest", "--lat", "28.6", "--lng", "-77.2",
    ])
    .unwrap();

    let Commands::Reports {
        filter, lat, lng, ..
    } = cli.command
    else {
        panic!("expected reports command");
    };
    assert_eq!(filter, Some(FilterArg::Nearest));
    assert_eq!(lat, Some(28.6));
    assert_eq!(lng, Some(-77.2));
}

#[test]
fn lat_without_lng_is_rejected() {
    assert!(Cli::try_parse_from(["safezone", "reports", "--lat", "28.6"]).is_err());
}

#[tokio::test]
async fn offline_store_serves_sample_reports() {
    let store = CliStore::open(&AppConfig::default(), None).unwrap();
    assert!(store.is_offline());

    let mut controller = start_controller(Arc::new(store)).await;
    assert_eq!(controller.state().phase(), ViewPhase::Ready);
    let categories: Vec<_> = controller
        .visible()
        .iter()
        .map(|record| record.category.as_str())
        .collect();
    assert_eq!(categories, vec!["Stalking", "Harassment", "Catcalling"]);
    controller.stop();
}
