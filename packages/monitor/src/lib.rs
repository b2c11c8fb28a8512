#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Australian emergency feed monitor.
//!
//! A [`context::MonitorContext`] owns one incident pipeline and one CAP
//! pipeline per configured state. Each pipeline pairs a
//! [`aus_emergency_coordinator::FeedCoordinator`] with a
//! [`aus_emergency_reconcile::Tracker`]; the [`scheduler`] polls them and
//! domain events fan out on a broadcast channel.

pub mod commands;
pub mod config;
pub mod console;
pub mod context;
pub mod diagnostics;
pub mod pipeline;
pub mod scheduler;
pub mod sensor;

pub use commands::{Command, CommandError, CommandOutcome};
pub use config::{ConfigError, MonitorConfig};
pub use context::MonitorContext;
