pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod home;
pub mod places;
pub mod report_actions;
pub mod reports;
