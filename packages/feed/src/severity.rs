//! Severity normalization.
//!
//! Most feeds only publish free-text level and status strings, so
//! [`classify`] uses keyword detection on both. Feeds with a fixed warning
//! vocabulary (NSW `alertLevel`, QLD `WarningLevel` / `CurrentStatus`) are
//! mapped exactly first and only fall back to the keyword heuristic for
//! values outside that vocabulary.

use aus_emergency_incident_models::Severity;

/// Classifies free-text level and status strings into a [`Severity`].
///
/// Case-insensitive. Checks, in order, for `emergency`, `watch`, `advice`,
/// then `safe` / `all clear`, defaulting to [`Severity::Info`].
#[must_use]
pub fn classify(level: &str, status: &str) -> Severity {
    let text = format!("{level} {status}").to_lowercase();

    if text.contains("emergency") {
        return Severity::EmergencyWarning;
    }
    if text.contains("watch") {
        return Severity::WatchAndAct;
    }
    if text.contains("advice") {
        return Severity::Advice;
    }
    if contains_any(&text, &["safe", "all clear"]) {
        return Severity::AllClear;
    }

    Severity::Info
}

/// Maps the Australian Warning System level vocabulary exactly.
///
/// Returns `None` for anything outside the vocabulary.
#[must_use]
pub fn warning_level(raw: &str) -> Option<Severity> {
    match raw.trim().to_lowercase().as_str() {
        "emergency warning" | "emergency" => Some(Severity::EmergencyWarning),
        "watch and act" | "watch & act" => Some(Severity::WatchAndAct),
        "advice" => Some(Severity::Advice),
        "not applicable" | "information" | "info" | "no alert" => Some(Severity::Info),
        "all clear" | "safe" => Some(Severity::AllClear),
        _ => None,
    }
}

/// NSW RFS severity: `alertLevel` vocabulary first, keyword heuristic
/// over level and status otherwise.
#[must_use]
pub fn nsw_severity(alert_level: Option<&str>, status: Option<&str>) -> Severity {
    alert_level.and_then(warning_level).unwrap_or_else(|| {
        classify(alert_level.unwrap_or_default(), status.unwrap_or_default())
    })
}

/// QLD severity: `WarningLevel` vocabulary, then a `CurrentStatus` of
/// `Safe` / `All Clear`, then the keyword heuristic.
#[must_use]
pub fn qld_severity(warning: Option<&str>, current_status: Option<&str>) -> Severity {
    if let Some(severity) = warning.and_then(warning_level) {
        return severity;
    }
    if let Some(status) = current_status {
        let lower = status.trim().to_lowercase();
        if lower == "safe" || lower == "all clear" {
            return Severity::AllClear;
        }
    }
    classify(
        warning.unwrap_or_default(),
        current_status.unwrap_or_default(),
    )
}

/// Checks if `haystack` contains any of the given `needles`.
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_level_and_status() {
        assert_eq!(classify("Emergency Warning", ""), Severity::EmergencyWarning);
        assert_eq!(classify("", "Watch and Act"), Severity::WatchAndAct);
        assert_eq!(classify("", ""), Severity::Info);
    }

    #[test]
    fn classify_is_case_insensitive_and_ordered() {
        assert_eq!(classify("ADVICE", "going"), Severity::Advice);
        assert_eq!(classify("advice", "EMERGENCY"), Severity::EmergencyWarning);
        assert_eq!(classify("", "Safe"), Severity::AllClear);
        assert_eq!(classify("All Clear", ""), Severity::AllClear);
        assert_eq!(classify("Going", "Under control"), Severity::Info);
    }

    #[test]
    fn maps_warning_vocabulary_exactly() {
        assert_eq!(warning_level("Watch and Act"), Some(Severity::WatchAndAct));
        assert_eq!(warning_level(" advice "), Some(Severity::Advice));
        assert_eq!(warning_level("Not Applicable"), Some(Severity::Info));
        assert_eq!(warning_level("Something else"), None);
    }

    #[test]
    fn nsw_vocabulary_takes_precedence() {
        // "Not Applicable" is Info even when the status mentions advice.
        assert_eq!(
            nsw_severity(Some("Not Applicable"), Some("Advice issued")),
            Severity::Info
        );
        assert_eq!(
            nsw_severity(None, Some("Emergency evacuations")),
            Severity::EmergencyWarning
        );
    }

    #[test]
    fn qld_uses_warning_then_status() {
        assert_eq!(
            qld_severity(Some("Watch and Act"), Some("Going")),
            Severity::WatchAndAct
        );
        assert_eq!(qld_severity(None, Some("Safe")), Severity::AllClear);
        assert_eq!(
            qld_severity(Some("Bushfire Advice Level"), None),
            Severity::Advice
        );
        assert_eq!(qld_severity(None, Some("Patrolled")), Severity::Info);
    }
}
