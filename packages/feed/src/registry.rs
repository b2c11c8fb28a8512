//! Feed registry: loads every state's feed definition from embedded TOML.
//!
//! Each `.toml` file in `packages/feed/feeds/` is baked into the binary at
//! compile time via [`include_str!`]. Adding a state means adding a TOML
//! file, a normalizer, and an entry below.

use aus_emergency_incident_models::AustralianState;

use crate::feed_def::{FeedDefinition, parse_feed_toml};

/// TOML configs embedded at compile time.
const FEED_TOMLS: &[(&str, &str)] = &[
    ("sa", include_str!("../feeds/sa.toml")),
    ("nsw", include_str!("../feeds/nsw.toml")),
    ("vic", include_str!("../feeds/vic.toml")),
    ("qld", include_str!("../feeds/qld.toml")),
    ("tas", include_str!("../feeds/tas.toml")),
    ("wa", include_str!("../feeds/wa.toml")),
];

/// Returns all configured feed definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_feeds() -> Vec<FeedDefinition> {
    FEED_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_feed_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the feed definition for `state`, if one is registered.
#[must_use]
pub fn feed_for(state: AustralianState) -> Option<FeedDefinition> {
    all_feeds().into_iter().find(|feed| feed.state == state)
}
