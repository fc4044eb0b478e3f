use chrono::Utc;
use safezone_core::actions::{flag_report, share_report};
use safezone_core::models::ReportId;
use safezone_core::ReportRecord;

use crate::commands::common::{confirm, start_controller, CliContext};
use crate::device::StdoutShareSheet;
use crate::error::CliError;

pub async fn run_share(context: &CliContext, id: &str) -> Result<(), CliError> {
    let record = find_report(context, id).await?;
    match share_report(&StdoutShareSheet, &record).await {
        Some(alert) => Err(CliError::Alert(alert)),
        None => Ok(()),
    }
}

pub async fn run_flag(context: &CliContext, id: &str, assume_yes: bool) -> Result<(), CliError> {
    let report_id = ReportId::new(id.trim());
    if report_id.as_str().is_empty() {
        return Err(CliError::ReportNotFound(id.to_string()));
    }

    if !assume_yes
        && !confirm(
            "Report Incident",
            "Is this information incorrect or inappropriate?",
        )?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let store = context.open_store().await?;
    let alert = flag_report(store.as_ref(), &report_id, Utc::now()).await;
    println!("{alert}");
    Ok(())
}

/// Look a report up in the set the reports screen would display.
async fn find_report(context: &CliContext, id: &str) -> Result<ReportRecord, CliError> {
    let store = context.open_store().await?;
    let mut controller = start_controller(store).await;
    let record = controller
        .state()
        .displayed()
        .iter()
        .find(|record| record.id.as_str() == id.trim())
        .cloned();
    controller.stop();
    record.ok_or_else(|| CliError::ReportNotFound(id.to_string()))
}
