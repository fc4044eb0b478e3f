use serde::Serialize;

use crate::models::ReportRecord;

/// Appended to every error message shown on the reports screen.
pub const RETRY_HINT: &str = "Pull down to retry.";

/// Coarse phase of the reports screen, for rendering decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPhase {
    Loading,
    Ready,
    Error,
    Refreshing,
}

/// Everything the reports screen shows, as one value.
///
/// The error variant always carries the fallback set, so the screen never
/// renders an error without cards beneath it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ReportsViewState {
    /// No snapshot has arrived yet.
    Loading,
    Ready {
        reports: Vec<ReportRecord>,
        refreshing: bool,
    },
    Error {
        message: String,
        fallback: Vec<ReportRecord>,
        refreshing: bool,
    },
}

impl ReportsViewState {
    /// The set the screen currently displays: live reports when ready, the
    /// fallback set on error, nothing while loading.
    #[must_use]
    pub fn displayed(&self) -> &[ReportRecord] {
        match self {
            Self::Loading => &[],
            Self::Ready { reports, .. } => reports,
            Self::Error { fallback, .. } => fallback,
        }
    }

    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        match self {
            Self::Loading => false,
            Self::Ready { refreshing, .. } | Self::Error { refreshing, .. } => *refreshing,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Message shown above the fallback cards, e.g.
    /// `"permission-denied. Pull down to retry."`.
    #[must_use]
    pub fn error_text(&self) -> Option<String> {
        match self {
            Self::Error { message, .. } => Some(format!("{message}. {RETRY_HINT}")),
            _ => None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ViewPhase {
        match self {
            Self::Loading => ViewPhase::Loading,
            _ if self.is_refreshing() => ViewPhase::Refreshing,
            Self::Ready { .. } => ViewPhase::Ready,
            Self::Error { .. } => ViewPhase::Error,
        }
    }

    /// Settled states keep their content while a new subscription loads.
    pub(crate) fn begin_refresh(&mut self) {
        if let Self::Ready { refreshing, .. } | Self::Error { refreshing, .. } = self {
            *refreshing = true;
        }
    }

    pub(crate) fn end_refresh(&mut self) {
        if let Self::Ready { refreshing, .. } | Self::Error { refreshing, .. } = self {
            *refreshing = false;
        }
    }
}
