//! safezone-core - Core library for SafeZone
//!
//! This crate contains the report models, the live-data view-model layer that
//! keeps the reports screen in step with the remote incident collection, and
//! the thin adapters used to reach the managed backend (Firestore and
//! Firebase Auth) and device services.

pub mod actions;
pub mod alert;
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod filter;
pub mod home;
pub mod models;
pub mod presentation;
pub mod store;
pub mod sync;
pub mod time;
pub mod util;

pub use alert::UserAlert;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use models::{Coordinate, ReportId, ReportLocation, ReportRecord};
