use safezone_core::actions::{directions_link, open_directions};
use safezone_core::catalog::{safe_spots, safety_tips};

use crate::commands::common::{format_spot_lines, format_tip_lines, resolve_spot, CliContext};
use crate::device::SystemLinkOpener;
use crate::error::CliError;

pub fn run_spots(as_json: bool) -> Result<(), CliError> {
    let spots = safe_spots();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&spots)?);
    } else {
        for line in format_spot_lines(&spots) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn run_tips(as_json: bool) -> Result<(), CliError> {
    let tips = safety_tips();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&tips)?);
    } else {
        for line in format_tip_lines(&tips) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_directions(context: &CliContext, spot: &str, open: bool) -> Result<(), CliError> {
    let spots = safe_spots();
    let spot = resolve_spot(&spots, spot)?;

    if !open {
        println!("{}", directions_link(context.platform, spot));
        return Ok(());
    }

    match open_directions(&SystemLinkOpener::new(), context.platform, spot).await {
        Some(alert) => Err(CliError::Alert(alert)),
        None => Ok(()),
    }
}
