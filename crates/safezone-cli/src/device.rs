//! Terminal stand-ins for the phone's share sheet and link handler.

use std::process::Command;

use async_trait::async_trait;
use safezone_core::device::{DeviceError, DeviceResult, LinkOpener, ShareSheet, SharePayload};

/// Shares by printing the payload to stdout.
pub struct StdoutShareSheet;

#[async_trait]
impl ShareSheet for StdoutShareSheet {
    async fn share(&self, payload: &SharePayload) -> DeviceResult<()> {
        println!("{}", payload.message);
        Ok(())
    }
}

/// Opens links with the desktop's default handler.
pub struct SystemLinkOpener {
    launcher: Option<&'static str>,
}

impl SystemLinkOpener {
    pub const fn new() -> Self {
        Self {
            launcher: system_launcher(),
        }
    }
}

impl Default for SystemLinkOpener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkOpener for SystemLinkOpener {
    async fn can_open(&self, url: &str) -> DeviceResult<bool> {
        Ok(self.launcher.is_some() && url.contains(':'))
    }

    async fn open(&self, url: &str) -> DeviceResult<()> {
        let launcher = self
            .launcher
            .ok_or_else(|| DeviceError::Link("no system link handler".to_string()))?;

        let status = Command::new(launcher)
            .arg(url)
            .status()
            .map_err(|error| DeviceError::Link(format!("failed to launch {launcher}: {error}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(DeviceError::Link(format!("{launcher} exited with {status}")))
        }
    }
}

const fn system_launcher() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("open")
    } else if cfg!(any(target_os = "linux", target_os = "freebsd")) {
        Some("xdg-open")
    } else {
        None
    }
}
