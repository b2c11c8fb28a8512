#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feed polling coordinators.
//!
//! A [`FeedCoordinator`] wraps one [`aus_emergency_feed::Fetcher`], tracks
//! its health with a [`BackoffController`] and hands every successful
//! snapshot back to the caller, keeping the last one for diagnostics.

pub mod backoff;
pub mod coordinator;

pub use backoff::{BackoffController, BackoffPolicy, BackoffState};
pub use coordinator::{CoordinatorError, CoordinatorStatus, FeedCoordinator};
