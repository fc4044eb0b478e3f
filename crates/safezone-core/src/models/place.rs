//! Safe spot and safety tip models

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// What kind of help a safe spot offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafeSpotKind {
    Police,
    Shelter,
    HelpCenter,
}

impl SafeSpotKind {
    /// Icon name used by the card for this kind.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Police => "shield",
            Self::Shelter => "home",
            Self::HelpCenter => "medical",
        }
    }
}

impl fmt::Display for SafeSpotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Police => "Police",
            Self::Shelter => "Shelter",
            Self::HelpCenter => "Help Center",
        };
        f.write_str(label)
    }
}

/// A nearby place offering help.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeSpot {
    pub name: String,
    pub kind: SafeSpotKind,
    /// Human-readable distance label, e.g. "1.2 km"
    pub distance: String,
    /// Opening status label, e.g. "Open 24/7"
    pub status: String,
    pub coordinate: Coordinate,
}

/// A short piece of safety advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyTip {
    pub title: String,
    pub description: String,
    pub icon: String,
}
