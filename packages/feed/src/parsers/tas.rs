//! TAS Fire Service `GeoRSS` incident feed.
//!
//! RSS 2.0 items whose `description` holds `Key: value<br />` pairs and
//! whose position is a whitespace-separated `georss:point`.

use aus_emergency_incident_models::{AustralianState, Incident};

use super::finish;
use crate::FeedError;
use crate::parsing::{labeled_fields, parse_datetime, parse_georss_point, strip_tags};
use crate::severity::classify;
use crate::xml::{XmlElement, parse_document};

/// `GeoRSS` simple namespace.
pub const GEORSS_NS: &str = "http://www.georss.org/georss";

/// Parses a TAS `GeoRSS` payload.
///
/// # Errors
///
/// Returns [`FeedError`] if the body is not XML or not an RSS document.
pub fn parse(state: AustralianState, body: &str) -> Result<Vec<Incident>, FeedError> {
    let root = parse_document(body)?;
    if !root.is(None, "rss") && !root.is(None, "channel") {
        return Err(FeedError::format(format!(
            "expected an RSS document, found <{}>",
            root.name
        )));
    }

    Ok(root
        .descendants_named(None, "item")
        .into_iter()
        .map(|item| finish(incident(state, item)))
        .collect())
}

fn incident(state: AustralianState, item: &XmlElement) -> Incident {
    let description = item.child_text(None, "description").unwrap_or_default();
    let fields = labeled_fields(&description);
    let field = |keys: &[&str]| keys.iter().find_map(|key| fields.get(*key).cloned());

    let mut incident = Incident::new(state);

    incident.incident_no = item
        .child_text(None, "guid")
        .or_else(|| item.child_text(None, "link"))
        .unwrap_or_default();
    incident.location_name = field(&["location"]).or_else(|| item.child_text(None, "title"));
    incident.incident_type = field(&["type", "incident type"]);
    incident.status = field(&["status"]);
    incident.level = field(&["alert level", "warning level"]);
    incident.region = field(&["region", "municipality"]);
    incident.agency = field(&["agency", "responsible agency"]);
    incident.resources = field(&["resources", "vehicles"]);
    incident.message = Some(strip_tags(&description)).filter(|m| !m.is_empty());
    incident.message_link = item.child_text(None, "link");

    incident.severity = classify(
        incident.level.as_deref().unwrap_or_default(),
        incident.status.as_deref().unwrap_or_default(),
    );

    incident.incident_datetime = item
        .child_text(None, "pubDate")
        .as_deref()
        .and_then(parse_datetime)
        .or_else(|| field(&["last updated", "updated"]).as_deref().and_then(parse_datetime));

    match item
        .child_text(Some(GEORSS_NS), "point")
        .as_deref()
        .map(parse_georss_point)
    {
        Some(Some((lat, lon))) => {
            incident.latitude = Some(lat);
            incident.longitude = Some(lon);
        }
        Some(None) => log::debug!("{state}: ignoring malformed georss:point"),
        None => {}
    }

    incident
}

#[cfg(test)]
mod tests {
    use aus_emergency_incident_models::Severity;

    use super::*;

    const PAYLOAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0" xmlns:georss="http://www.georss.org/georss">
          <channel>
            <title>TFS Current Incidents</title>
            <item>
              <title>BRIGHTON, Elderslie Rd</title>
              <link>https://www.fire.tas.gov.au/incident/12345</link>
              <guid>TFS-12345</guid>
              <pubDate>Tue, 14 Oct 2025 13:45:00 +1100</pubDate>
              <description><![CDATA[Type: Bushfire<br />Status: Going<br />Alert Level: Watch and Act<br />Region: South<br />Vehicles: 6<br />Location: Elderslie Rd, Brighton]]></description>
              <georss:point>-42.70 147.25</georss:point>
            </item>
            <item>
              <title>LAUNCESTON</title>
              <description>Type: Structure Fire&lt;br /&gt;Status: Safe</description>
              <georss:point>bogus</georss:point>
            </item>
          </channel>
        </rss>"#;

    #[test]
    fn parses_items() {
        let incidents = parse(AustralianState::Tas, PAYLOAD).unwrap();
        assert_eq!(incidents.len(), 2);

        let first = &incidents[0];
        assert_eq!(first.incident_no, "TFS-12345");
        assert_eq!(first.location_name.as_deref(), Some("Elderslie Rd, Brighton"));
        assert_eq!(first.incident_type.as_deref(), Some("Bushfire"));
        assert_eq!(first.severity, Severity::WatchAndAct);
        assert_eq!(first.resources.as_deref(), Some("6"));
        assert_eq!(first.position(), Some((-42.70, 147.25)));
        assert_eq!(
            first.incident_datetime.map(|dt| dt.to_string()).as_deref(),
            Some("2025-10-14 13:45:00")
        );

        let second = &incidents[1];
        assert!(second.synthesized_id);
        assert_eq!(second.location_name.as_deref(), Some("LAUNCESTON"));
        assert_eq!(second.severity, Severity::AllClear);
        assert!(second.position().is_none());
    }

    #[test]
    fn rejects_non_rss_documents() {
        assert!(parse(AustralianState::Tas, "<feed></feed>").is_err());
        assert!(parse(AustralianState::Tas, "<rss><channel>").is_err());
    }
}
