//! Render-ready description of the reports panel.

use serde::Serialize;

use crate::models::ReportRecord;
use crate::sync::ReportsViewState;

pub const LOADING_TEXT: &str = "Loading reports...";
pub const EMPTY_TEXT: &str = "No reports found.";

/// One report card as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportCard {
    pub id: String,
    pub category: String,
    pub location: String,
    pub time_ago: String,
    pub description: String,
    pub verified: bool,
}

impl From<&ReportRecord> for ReportCard {
    fn from(record: &ReportRecord) -> Self {
        Self {
            id: record.id.to_string(),
            category: record.category.clone(),
            location: record.location.to_string(),
            time_ago: record.time_ago.clone(),
            description: record.description.clone(),
            verified: record.verified,
        }
    }
}

/// What the reports panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "panel", rename_all = "lowercase")]
pub enum ReportsPanel {
    Loading { text: String },
    /// Error text above the (fallback) cards.
    Error { text: String, cards: Vec<ReportCard> },
    Empty { text: String },
    Cards { cards: Vec<ReportCard> },
}

impl ReportsPanel {
    /// Build the panel from the view state and the records left visible
    /// after search and filtering.
    pub fn build(state: &ReportsViewState, visible: &[ReportRecord]) -> Self {
        let cards = || -> Vec<ReportCard> { visible.iter().map(ReportCard::from).collect() };
        match state {
            ReportsViewState::Loading => Self::Loading {
                text: LOADING_TEXT.to_string(),
            },
            ReportsViewState::Error { .. } => Self::Error {
                text: state.error_text().unwrap_or_default(),
                cards: cards(),
            },
            ReportsViewState::Ready { .. } if visible.is_empty() => Self::Empty {
                text: EMPTY_TEXT.to_string(),
            },
            ReportsViewState::Ready { .. } => Self::Cards { cards: cards() },
        }
    }

    pub fn cards(&self) -> &[ReportCard] {
        match self {
            Self::Error { cards, .. } | Self::Cards { cards } => cards,
            Self::Loading { .. } | Self::Empty { .. } => &[],
        }
    }
}
