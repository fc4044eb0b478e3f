use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use safezone_core::device::Platform;
use safezone_core::filter::CategoryFilter;

#[derive(Parser)]
#[command(name = "safezone")]
#[command(about = "Crowd-sourced incident reports, safe spots and safety tips")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the runtime config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Platform used for map links (overrides config)
    #[arg(long, global = true, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show live incident reports
    Reports {
        /// Narrow by category or place name
        #[arg(short, long)]
        search: Option<String>,
        /// Category filter chip
        #[arg(short, long, value_enum)]
        filter: Option<FilterArg>,
        /// Device latitude for the nearest filter
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Device longitude for the nearest filter
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Keep running and print every update
        #[arg(short, long)]
        watch: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List nearby safe spots
    Spots {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List safety tips
    Tips {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print (or open) the maps link for a safe spot
    Directions {
        /// Spot name or 1-based position in `safezone spots`
        spot: String,
        /// Open the link with the system handler
        #[arg(long)]
        open: bool,
    },
    /// Share a report
    Share {
        /// Report ID
        id: String,
    },
    /// Flag a report as incorrect or inappropriate
    Flag {
        /// Report ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the home dashboard
    Home {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Login with Firebase email/password and store session in keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Login with a Google ID token
    LoginGoogle {
        /// ID token issued by Google sign-in
        #[arg(long, value_name = "TOKEN")]
        id_token: String,
    },
    /// Logout and clear stored session
    Logout,
    /// Show auth status
    Status,
    /// Write the runtime config file
    Config {
        /// Firebase project ID
        #[arg(long, value_name = "ID")]
        project_id: Option<String>,
        /// Firebase web API key
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
        /// Firestore endpoint override (e.g. the local emulator)
        #[arg(long, value_name = "URL")]
        firestore_url: Option<String>,
        /// Firebase Auth emulator host (e.g. http://127.0.0.1:9099)
        #[arg(long, value_name = "URL")]
        auth_url: Option<String>,
        /// Seconds between live report polls
        #[arg(long, value_name = "SECS")]
        poll_interval_secs: Option<u64>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FilterArg {
    Recent,
    Nearest,
    Verified,
}

impl From<FilterArg> for CategoryFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::Recent => Self::Recent,
            FilterArg::Nearest => Self::Nearest,
            FilterArg::Verified => Self::Verified,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PlatformArg {
    Ios,
    Android,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Ios => Self::Ios,
            PlatformArg::Android => Self::Android,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
