use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use safezone_core::config::{default_config_path, resolve_config, AppConfig};
use safezone_core::controller::ReportsController;
use safezone_core::device::Platform;
use safezone_core::home::HomeDashboard;
use safezone_core::models::{SafeSpot, SafetyTip};
use safezone_core::presentation::{ReportCard, ReportsPanel};
use safezone_core::sync::{ReportSynchronizer, ReportsViewState};
use safezone_core::UserAlert;

use crate::auth::{auth_client, current_session, CliAuthClient};
use crate::backend::CliStore;
use crate::error::CliError;

/// Settings shared by every command.
pub struct CliContext {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub platform: Platform,
}

impl CliContext {
    pub fn load(config_path: Option<&Path>, platform: Option<Platform>) -> Self {
        let config_path = config_path.map_or_else(default_config_path, Path::to_path_buf);
        let config = resolve_config(Some(&config_path));
        let platform = platform.unwrap_or_else(|| config.platform());
        Self {
            config,
            config_path,
            platform,
        }
    }

    pub fn auth(&self) -> Result<Option<CliAuthClient>, CliError> {
        Ok(auth_client(&self.config)?)
    }

    /// Open the store, acting for the signed-in user when there is one.
    pub async fn open_store(&self) -> Result<Arc<CliStore>, CliError> {
        let auth = self.auth()?;
        let session = current_session(auth.as_ref()).await;
        let store = CliStore::open(&self.config, session.map(|session| session.id_token))?;
        Ok(Arc::new(store))
    }
}

pub type CliController = ReportsController<CliStore>;

/// Subscribe and wait until the first snapshot (or failure) has landed.
pub async fn start_controller(store: Arc<CliStore>) -> CliController {
    let mut controller = ReportsController::new(ReportSynchronizer::new(store));
    controller.start();
    settle(&mut controller).await;
    controller
}

/// Wait while the view is loading or refreshing.
pub async fn settle(controller: &mut CliController) {
    while is_pending(controller.state()) {
        if !controller.next_update().await {
            break;
        }
    }
}

const fn is_pending(state: &ReportsViewState) -> bool {
    matches!(state, ReportsViewState::Loading) || state.is_refreshing()
}

pub fn print_alert(alert: &UserAlert) {
    eprintln!("{}: {}", alert.title, alert.message);
}

/// Ask a yes/no question on the terminal. Non-interactive input answers no.
pub fn confirm(title: &str, question: &str) -> Result<bool, CliError> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    print!("{title}\n{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn format_panel_lines(panel: &ReportsPanel) -> Vec<String> {
    let mut lines = Vec::new();
    match panel {
        ReportsPanel::Loading { text } | ReportsPanel::Empty { text } => lines.push(text.clone()),
        ReportsPanel::Error { text, cards } => {
            lines.push(text.clone());
            lines.push(String::new());
            lines.extend(format_card_lines(cards));
        }
        ReportsPanel::Cards { cards } => lines.extend(format_card_lines(cards)),
    }
    lines
}

pub fn format_card_lines(cards: &[ReportCard]) -> Vec<String> {
    cards.iter().flat_map(format_card).collect()
}

fn format_card(card: &ReportCard) -> Vec<String> {
    let badge = if card.verified { " [verified]" } else { "" };
    vec![
        format!("{}  {}{}  ({})", card.id, card.category, badge, card.time_ago),
        format!("    at {}", card.location),
        format!("    {}", card.description),
    ]
}

pub fn format_spot_lines(spots: &[SafeSpot]) -> Vec<String> {
    spots
        .iter()
        .enumerate()
        .map(|(index, spot)| {
            format!(
                "{}. {} ({}, {})  {}  {}",
                index + 1,
                spot.name,
                spot.kind,
                spot.kind.icon(),
                spot.distance,
                spot.status
            )
        })
        .collect()
}

pub fn format_tip_lines(tips: &[SafetyTip]) -> Vec<String> {
    tips.iter()
        .map(|tip| format!("{} ({}): {}", tip.title, tip.icon, tip.description))
        .collect()
}

pub fn format_dashboard_lines(dashboard: &HomeDashboard) -> Vec<String> {
    let mut lines = vec![dashboard.greeting.clone(), dashboard.status.clone(), String::new()];
    for card in &dashboard.cards {
        lines.push(card.title.clone());
        lines.push(format!("    {}", card.text));
    }
    lines.push(String::new());
    lines.push(dashboard.user_name.clone());
    lines.push(dashboard.emergency_contact.clone());
    lines
}

/// Find a safe spot by 1-based position or case-insensitive name.
pub fn resolve_spot<'a>(spots: &'a [SafeSpot], query: &str) -> Result<&'a SafeSpot, CliError> {
    let query = query.trim();
    if let Ok(position) = query.parse::<usize>() {
        if let Some(spot) = position.checked_sub(1).and_then(|index| spots.get(index)) {
            return Ok(spot);
        }
    }

    let needle = query.to_lowercase();
    spots
        .iter()
        .find(|spot| spot.name.to_lowercase() == needle)
        .or_else(|| {
            spots
                .iter()
                .find(|spot| spot.name.to_lowercase().contains(&needle))
        })
        .filter(|_| !needle.is_empty())
        .ok_or_else(|| CliError::SpotNotFound(query.to_string()))
}
