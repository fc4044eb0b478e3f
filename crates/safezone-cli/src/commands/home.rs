use std::sync::Arc;

use chrono::Utc;
use safezone_core::home::{load_user_name, HomeDashboard};
use safezone_core::sync::ReportsViewState;

use crate::auth::current_session;
use crate::backend::CliStore;
use crate::commands::common::{format_dashboard_lines, start_controller, CliContext};
use crate::error::CliError;

pub async fn run_home(context: &CliContext, as_json: bool) -> Result<(), CliError> {
    let auth = context.auth()?;
    let session = current_session(auth.as_ref()).await;
    let id_token = session.as_ref().map(|session| session.id_token.clone());
    let store = Arc::new(CliStore::open(&context.config, id_token)?);

    let user_name = load_user_name(
        store.as_ref(),
        session.as_ref().map(|session| session.user.uid.as_str()),
        session.as_ref().map(|session| session.id_token.as_str()),
    )
    .await;

    let mut controller = start_controller(store).await;
    // The dashboard summarizes live reports only, never the fallback set.
    let live = match controller.state() {
        ReportsViewState::Ready { reports, .. } => reports.as_slice(),
        _ => &[],
    };
    let dashboard = HomeDashboard::build(&user_name, live, Utc::now());
    controller.stop();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        for line in format_dashboard_lines(&dashboard) {
            println!("{line}");
        }
    }
    Ok(())
}
