//! Device service seams: location, share sheet and map links.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Coordinate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
    #[error("Share failed: {0}")]
    Share(String),
    #[error("Unable to open link: {0}")]
    Link(String),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Outcome of a foreground location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Foreground location access.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_permission(&self) -> DeviceResult<PermissionStatus>;

    /// Current device position. May take several seconds.
    async fn current_position(&self) -> DeviceResult<Coordinate>;
}

/// Text payload handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub message: String,
}

#[async_trait]
pub trait ShareSheet: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> DeviceResult<()>;
}

#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn can_open(&self, url: &str) -> DeviceResult<bool>;
    async fn open(&self, url: &str) -> DeviceResult<()>;
}

/// Target platform, which decides the maps deep-link scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    #[default]
    Android,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ios => f.write_str("ios"),
            Self::Android => f.write_str("android"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(format!("unknown platform '{other}' (expected ios or android)")),
        }
    }
}

/// Build the platform maps deep link for a labelled coordinate.
///
/// iOS: `maps:0,0?q={label}@{lat},{lng}`; Android:
/// `geo:0,0?q={lat},{lng}({label})`. The label is percent-encoded.
pub fn map_deep_link(platform: Platform, label: &str, coordinate: Coordinate) -> String {
    let label = urlencoding::encode(label.trim());
    let lat_lng = format!("{},{}", coordinate.latitude, coordinate.longitude);
    match platform {
        Platform::Ios => format!("maps:0,0?q={label}@{lat_lng}"),
        Platform::Android => format!("geo:0,0?q={lat_lng}({label})"),
    }
}

/// Location provider with a scripted answer.
///
/// Used by the CLI (position passed on the command line) and by tests.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLocationProvider {
    permission: PermissionStatus,
    position: Result<Coordinate, String>,
}

impl StaticLocationProvider {
    #[must_use]
    pub const fn granted(position: Coordinate) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            position: Ok(position),
        }
    }

    #[must_use]
    pub const fn denied() -> Self {
        Self {
            permission: PermissionStatus::Denied,
            position: Err(String::new()),
        }
    }

    /// Permission is granted but the position fetch fails.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            position: Err(reason.into()),
        }
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn request_permission(&self) -> DeviceResult<PermissionStatus> {
        Ok(self.permission)
    }

    async fn current_position(&self) -> DeviceResult<Coordinate> {
        if self.permission == PermissionStatus::Denied {
            return Err(DeviceError::PermissionDenied);
        }
        self.position
            .clone()
            .map_err(DeviceError::LocationUnavailable)
    }
}
