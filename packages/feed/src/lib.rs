#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Emergency feed retrieval and normalization.
//!
//! Each state publishes its incidents in a different wire format. The
//! [`parsers`] module turns every one of them into the shared
//! [`aus_emergency_incident_models::Incident`] schema (or
//! [`aus_emergency_incident_models::CapAlert`] for CAP feeds). A
//! [`Fetcher`] couples a feed definition from the [`registry`] with an
//! HTTP session and a parser.

pub mod feed_def;
pub mod fetcher;
pub mod http;
pub mod identity;
pub mod parsers;
pub mod parsing;
pub mod registry;
pub mod severity;
pub mod xml;

use async_trait::async_trait;
use aus_emergency_incident_models::{AustralianState, FeedKind, FeedSnapshot};

/// Errors that can occur while fetching or parsing a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing failed.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The payload parsed but has the wrong top-level shape.
    #[error("Malformed payload: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },

    /// Anything else.
    #[error("Unexpected error: {message}")]
    Unexpected {
        /// Description of what went wrong.
        message: String,
    },
}

/// Coarse failure category, used for logging and backoff decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, timeout or HTTP status failure.
    Transport,
    /// Malformed payload.
    Format,
    /// Catch-all.
    Unexpected,
}

impl FeedError {
    /// Returns the failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Http(_) | Self::Status { .. } => FailureKind::Transport,
            Self::Json(_) | Self::Xml(_) | Self::Format { .. } => FailureKind::Format,
            Self::Unexpected { .. } => FailureKind::Unexpected,
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }
}

/// A source of normalized feed snapshots.
///
/// Implementations own whatever long-lived resources they need (an HTTP
/// session for [`fetcher::HttpFeedFetcher`]) and must release them in
/// [`Fetcher::close`].
#[async_trait]
pub trait Fetcher: Send {
    /// Human-readable name used in logs (e.g. `"SA CAP Data"`).
    fn name(&self) -> &str;

    /// The state this fetcher polls.
    fn state(&self) -> AustralianState;

    /// Incident feed or CAP feed.
    fn kind(&self) -> FeedKind;

    /// Whether an upstream feed exists at all. A CAP fetcher for a state
    /// without a CAP feed returns `false` and always yields an empty
    /// snapshot.
    fn has_feed(&self) -> bool {
        true
    }

    /// Fetches and normalizes the current feed contents.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the request fails or the payload cannot be
    /// parsed at the top level.
    async fn fetch(&mut self) -> Result<FeedSnapshot, FeedError>;

    /// Releases the underlying session. Returns `true` if something was
    /// actually closed; closing twice is a no-op.
    fn close(&mut self) -> bool;
}
