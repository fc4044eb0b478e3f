use safezone_core::device::StaticLocationProvider;
use safezone_core::filter::CategoryFilter;
use safezone_core::models::Coordinate;
use safezone_core::presentation::ReportsPanel;

use crate::commands::common::{
    format_panel_lines, print_alert, settle, start_controller, CliContext, CliController,
};
use crate::error::CliError;

pub struct ReportsOptions {
    pub search: Option<String>,
    pub filter: Option<CategoryFilter>,
    pub position: Option<Coordinate>,
    pub watch: bool,
    pub as_json: bool,
}

pub async fn run_reports(context: &CliContext, options: ReportsOptions) -> Result<(), CliError> {
    let store = context.open_store().await?;
    let mut controller = start_controller(store).await;

    if let Some(query) = options.search.as_deref() {
        controller.search(query);
        settle(&mut controller).await;
    }

    if let Some(filter) = options.filter {
        let location = options.position.map_or_else(
            || StaticLocationProvider::unavailable("no --lat/--lng given"),
            StaticLocationProvider::granted,
        );
        if let Some(alert) = controller.select_filter(filter, &location).await {
            print_alert(&alert);
        }
    }

    render(&controller, options.as_json)?;

    if options.watch {
        watch(&mut controller, options.as_json).await?;
    }

    controller.stop();
    Ok(())
}

async fn watch(controller: &mut CliController, as_json: bool) -> Result<(), CliError> {
    loop {
        tokio::select! {
            updated = controller.next_update() => {
                if !updated {
                    tracing::info!("Report listener ended");
                    return Ok(());
                }
                if !as_json {
                    println!();
                }
                render(controller, as_json)?;
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                return Ok(());
            }
        }
    }
}

fn render(controller: &CliController, as_json: bool) -> Result<(), CliError> {
    let panel = ReportsPanel::build(controller.state(), controller.visible());
    if as_json {
        println!("{}", serde_json::to_string_pretty(&panel)?);
    } else {
        for line in format_panel_lines(&panel) {
            println!("{line}");
        }
    }
    Ok(())
}
