use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::normalizer::compact;
use super::static_regex;

static PRIORITY_SYNONYMS: OnceLock<HashMap<&'static str, PriorityLevel>> = OnceLock::new();
static SEVERITY_SYNONYMS: OnceLock<HashMap<&'static str, SeverityLevel>> = OnceLock::new();
static PRIORITY_ORDINAL: OnceLock<Regex> = OnceLock::new();
static PRIORITY_NUMBERED_WORD: OnceLock<Regex> = OnceLock::new();
static SEVERITY_NUMBERED_WORD: OnceLock<Regex> = OnceLock::new();
static SEVERITY_BARE_ORDINAL: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub fn label(self) -> &'static str {
        match self {
            PriorityLevel::Critical => "1-Critical",
            PriorityLevel::High => "2-High",
            PriorityLevel::Medium => "3-Medium",
            PriorityLevel::Low => "4-Low",
        }
    }

    fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            1 => Some(PriorityLevel::Critical),
            2 => Some(PriorityLevel::High),
            3 => Some(PriorityLevel::Medium),
            4 => Some(PriorityLevel::Low),
            _ => None,
        }
    }

    fn from_keyword(text: &str) -> Option<Self> {
        if text.contains("critical") {
            Some(PriorityLevel::Critical)
        } else if text.contains("high") {
            Some(PriorityLevel::High)
        } else if text.contains("medium") || text.contains("moderate") {
            Some(PriorityLevel::Medium)
        } else if text.contains("low") {
            Some(PriorityLevel::Low)
        } else {
            None
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Impact and urgency share one three-step scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeverityLevel {
    High,
    Medium,
    Low,
}

impl SeverityLevel {
    pub fn label(self) -> &'static str {
        match self {
            SeverityLevel::High => "1-High",
            SeverityLevel::Medium => "2-Medium",
            SeverityLevel::Low => "3-Low",
        }
    }

    fn from_ordinal(ordinal: u32) -> Option<Self> {
        match ordinal {
            1 => Some(SeverityLevel::High),
            2 => Some(SeverityLevel::Medium),
            3 => Some(SeverityLevel::Low),
            _ => None,
        }
    }

    fn from_keyword(text: &str) -> Option<Self> {
        if ["high", "urgent", "immediate"].iter().any(|k| text.contains(k)) {
            Some(SeverityLevel::High)
        } else if ["medium", "moderate", "normal", "standard"]
            .iter()
            .any(|k| text.contains(k))
        {
            Some(SeverityLevel::Medium)
        } else if text.contains("low") || text.contains("minor") {
            Some(SeverityLevel::Low)
        } else {
            None
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A recognized label, or the normalized input when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonical<T> {
    Known(T),
    Raw(String),
}

impl<T: Copy> Canonical<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Canonical::Known(value) => Some(*value),
            Canonical::Raw(_) => None,
        }
    }
}

/// Trims, folds dash variants and collapses inner whitespace.
fn normalize_label(raw: &str) -> String {
    let folded = raw
        .trim()
        .replace(" \u{2013} ", "-")
        .replace(" - ", "-")
        .replace('\u{2013}', "-");
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn meaningful(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty() && trimmed != "None").then_some(trimmed)
}

pub fn canonical_priority(raw: &str) -> Option<Canonical<PriorityLevel>> {
    let normalized = normalize_label(meaningful(raw)?);
    let key = normalized.to_lowercase();

    if let Some(level) = priority_synonyms().get(key.as_str()) {
        return Some(Canonical::Known(*level));
    }

    let ordinal = static_regex(
        &PRIORITY_ORDINAL,
        r"\b(?:p|sev(?:erity)?|s|priority)\s*-?\s*([1-4])\b",
    );
    if let Some(level) = ordinal
        .captures(&key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .and_then(PriorityLevel::from_ordinal)
    {
        return Some(Canonical::Known(level));
    }

    let numbered = static_regex(
        &PRIORITY_NUMBERED_WORD,
        r"\b[1-4]\s*-\s*(critical|high|medium|moderate|low)\b",
    );
    if let Some(level) = numbered
        .captures(&key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| PriorityLevel::from_keyword(m.as_str()))
    {
        return Some(Canonical::Known(level));
    }

    Some(
        PriorityLevel::from_keyword(&key)
            .map(Canonical::Known)
            .unwrap_or(Canonical::Raw(normalized)),
    )
}

pub fn canonical_severity(raw: &str) -> Option<Canonical<SeverityLevel>> {
    let normalized = normalize_label(meaningful(raw)?);
    let key = normalized.to_lowercase();

    if let Some(level) = severity_synonyms().get(key.as_str()) {
        return Some(Canonical::Known(*level));
    }

    let numbered = static_regex(
        &SEVERITY_NUMBERED_WORD,
        r"\b([1-3])\s*-\s*(?:high|medium|moderate|low)\b",
    );
    if let Some(level) = numbered
        .captures(&key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .and_then(SeverityLevel::from_ordinal)
    {
        return Some(Canonical::Known(level));
    }

    if let Some(level) = SeverityLevel::from_keyword(&key) {
        return Some(Canonical::Known(level));
    }

    let bare = static_regex(&SEVERITY_BARE_ORDINAL, r"\b([1-3])\b");
    Some(
        bare.captures(&key)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .and_then(SeverityLevel::from_ordinal)
            .map(Canonical::Known)
            .unwrap_or(Canonical::Raw(normalized)),
    )
}

/// Priority the impact/urgency matrix assigns.
pub fn matrix_priority(impact: SeverityLevel, urgency: SeverityLevel) -> PriorityLevel {
    use PriorityLevel::*;
    use SeverityLevel as S;

    match (impact, urgency) {
        (S::High, S::High) => Critical,
        (S::High, S::Medium) | (S::Medium, S::High) => High,
        (S::High, S::Low) | (S::Medium, S::Medium) | (S::Low, S::High) => Medium,
        (S::Medium, S::Low) | (S::Low, S::Medium) | (S::Low, S::Low) => Low,
    }
}

/// Exact membership in the impact x urgency -> priority matrix.
pub fn priority_matches_matrix(
    impact: &Canonical<SeverityLevel>,
    urgency: &Canonical<SeverityLevel>,
    priority: &Canonical<PriorityLevel>,
) -> bool {
    match (impact.known(), urgency.known(), priority.known()) {
        (Some(impact), Some(urgency), Some(priority)) => {
            matrix_priority(impact, urgency) == priority
        }
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReason {
    Change,
    Vendor,
    Problem,
    Fulfillment,
    Incident,
    Customer,
    Other(String),
}

impl PendingReason {
    /// `None` for a null or literal `None` pending reason.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = compact(meaningful(raw)?);
        Some(match key.as_str() {
            "pendingchange" => PendingReason::Change,
            "pendingvendor" => PendingReason::Vendor,
            "pendingproblem" => PendingReason::Problem,
            "pendingfulfillment" => PendingReason::Fulfillment,
            "pendingincident" => PendingReason::Incident,
            "pendingcustomer" => PendingReason::Customer,
            _ => PendingReason::Other(key),
        })
    }

    /// Record-number prefix the related record must carry, when the reason demands one.
    pub fn required_record_prefix(&self) -> Option<&'static str> {
        match self {
            PendingReason::Change => Some("CHG"),
            PendingReason::Problem => Some("PRB"),
            PendingReason::Fulfillment => Some("RITM"),
            PendingReason::Incident => Some("INC"),
            _ => None,
        }
    }
}

fn priority_synonyms() -> &'static HashMap<&'static str, PriorityLevel> {
    PRIORITY_SYNONYMS.get_or_init(|| {
        use PriorityLevel::*;
        const SYNONYMS: &[(&str, PriorityLevel)] = &[
            ("1-critical", Critical),
            ("critical", Critical),
            ("p1", Critical),
            ("severity 1", Critical),
            ("sev1", Critical),
            ("s1", Critical),
            ("priority 1", Critical),
            ("2-high", High),
            ("high", High),
            ("p2", High),
            ("severity 2", High),
            ("sev2", High),
            ("s2", High),
            ("priority 2", High),
            ("3-medium", Medium),
            ("3-moderate", Medium),
            ("moderate", Medium),
            ("med", Medium),
            ("mod", Medium),
            ("p3", Medium),
            ("severity 3", Medium),
            ("sev3", Medium),
            ("s3", Medium),
            ("priority 3", Medium),
            ("4-low", Low),
            ("low", Low),
            ("p4", Low),
            ("severity 4", Low),
            ("sev4", Low),
            ("s4", Low),
            ("priority 4", Low),
        ];
        SYNONYMS.iter().copied().collect()
    })
}

fn severity_synonyms() -> &'static HashMap<&'static str, SeverityLevel> {
    SEVERITY_SYNONYMS.get_or_init(|| {
        use SeverityLevel::*;
        const SYNONYMS: &[(&str, SeverityLevel)] = &[
            ("1-high", High),
            ("high", High),
            ("h", High),
            ("urgent", High),
            ("immediate", High),
            ("2-medium", Medium),
            ("medium", Medium),
            ("moderate", Medium),
            ("med", Medium),
            ("mod", Medium),
            ("normal", Medium),
            ("standard", Medium),
            ("3-low", Low),
            ("low", Low),
            ("l", Low),
            ("minor", Low),
        ];
        SYNONYMS.iter().copied().collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_resolves_synonyms_ordinals_and_keywords() {
        assert_eq!(canonical_priority("P1"), Some(Canonical::Known(PriorityLevel::Critical)));
        assert_eq!(
            canonical_priority("Severity - 2"),
            Some(Canonical::Known(PriorityLevel::High))
        );
        assert_eq!(
            canonical_priority("3 \u{2013} Moderate"),
            Some(Canonical::Known(PriorityLevel::Medium))
        );
        assert_eq!(
            canonical_priority("Very low impact"),
            Some(Canonical::Known(PriorityLevel::Low))
        );
        assert_eq!(
            canonical_priority("  Sometime   soon "),
            Some(Canonical::Raw("Sometime soon".into()))
        );
        assert_eq!(canonical_priority("None"), None);
        assert_eq!(canonical_priority(""), None);
    }

    #[test]
    fn severity_resolves_numbered_and_bare_ordinals() {
        assert_eq!(canonical_severity("High"), Some(Canonical::Known(SeverityLevel::High)));
        assert_eq!(
            canonical_severity("2 - Medium"),
            Some(Canonical::Known(SeverityLevel::Medium))
        );
        assert_eq!(canonical_severity("3"), Some(Canonical::Known(SeverityLevel::Low)));
        assert_eq!(
            canonical_severity("Enterprise"),
            Some(Canonical::Raw("Enterprise".into()))
        );
    }

    #[test]
    fn p1_high_high_matches_matrix() {
        let priority = canonical_priority("P1").expect("present");
        let impact = canonical_severity("High").expect("present");
        let urgency = canonical_severity("High").expect("present");

        assert!(priority_matches_matrix(&impact, &urgency, &priority));
    }

    #[test]
    fn matrix_rejects_mismatch_and_raw_labels() {
        let high = Canonical::Known(SeverityLevel::High);
        let low = Canonical::Known(SeverityLevel::Low);
        assert!(priority_matches_matrix(&high, &low, &Canonical::Known(PriorityLevel::Medium)));
        assert!(!priority_matches_matrix(&high, &low, &Canonical::Known(PriorityLevel::Low)));
        assert!(!priority_matches_matrix(
            &Canonical::Raw("huge".into()),
            &low,
            &Canonical::Known(PriorityLevel::Low)
        ));
    }

    #[test]
    fn pending_reasons_are_compacted() {
        assert_eq!(PendingReason::parse("Pending Change"), Some(PendingReason::Change));
        assert_eq!(PendingReason::parse("pending  customer"), Some(PendingReason::Customer));
        assert_eq!(
            PendingReason::parse("Awaiting Parts"),
            Some(PendingReason::Other("awaitingparts".into()))
        );
        assert_eq!(PendingReason::parse("None"), None);
    }
}
