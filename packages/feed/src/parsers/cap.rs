//! OASIS CAP 1.2 alert feeds.
//!
//! The document is either a single `<alert>` or any container (Atom feed,
//! EDXL wrapper, plain list) holding `<alert>` elements. Only the first
//! `<info>` block of each alert is read.

use aus_emergency_incident_models::{AustralianState, CapAlert, CapArea};

use crate::FeedError;
use crate::xml::{XmlElement, parse_document};

/// CAP 1.2 namespace.
pub const CAP_NS: &str = "urn:oasis:names:tc:emergency:cap:1.2";

/// Value used for the enumerated CAP fields when an alert omits them.
const UNKNOWN: &str = "Unknown";

/// Parses a CAP payload into alerts.
///
/// Alerts without an identifier or without an `<info>` block are skipped.
///
/// # Errors
///
/// Returns [`FeedError`] if the body is not well-formed XML.
pub fn parse(state: AustralianState, body: &str) -> Result<Vec<CapAlert>, FeedError> {
    let root = parse_document(body)?;

    let alerts = if root.is(Some(CAP_NS), "alert") {
        vec![&root]
    } else {
        root.descendants_named(Some(CAP_NS), "alert")
    };

    let alerts: Vec<CapAlert> = alerts
        .into_iter()
        .filter_map(|alert| cap_alert(state, alert))
        .collect();

    log::debug!("{state}: parsed {} CAP alert(s)", alerts.len());

    Ok(alerts)
}

fn cap_alert(state: AustralianState, alert: &XmlElement) -> Option<CapAlert> {
    let Some(id) = alert.child_text(Some(CAP_NS), "identifier") else {
        log::debug!("{state}: skipping CAP alert without identifier");
        return None;
    };
    let Some(info) = alert.child(Some(CAP_NS), "info") else {
        log::debug!("{state}: skipping CAP alert {id} without info block");
        return None;
    };

    let text = |name: &str| info.child_text(Some(CAP_NS), name);
    let enumerated = |name: &str| text(name).unwrap_or_else(|| UNKNOWN.to_string());

    Some(CapAlert {
        state,
        areas: info
            .children_named(Some(CAP_NS), "area")
            .map(cap_area)
            .collect(),
        headline: text("headline"),
        description: text("description"),
        instruction: text("instruction"),
        severity: enumerated("severity"),
        urgency: enumerated("urgency"),
        certainty: enumerated("certainty"),
        event: enumerated("event"),
        effective: text("effective"),
        expires: text("expires"),
        id,
    })
}

fn cap_area(area: &XmlElement) -> CapArea {
    let texts = |name: &str| -> Vec<String> {
        area.children_named(Some(CAP_NS), name)
            .filter_map(XmlElement::trimmed_text)
            .collect()
    };

    CapArea {
        area_desc: area.child_text(Some(CAP_NS), "areaDesc"),
        polygons: texts("polygon"),
        circles: texts("circle"),
    }
}
