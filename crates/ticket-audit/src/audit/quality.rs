use serde::{Deserialize, Serialize};

const SENTENCE_MARKS: [char; 4] = ['.', ',', '?', '!'];

/// Minimum length requirements for a piece of agent-written prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPolicy {
    pub min_words: usize,
    pub min_chars: usize,
}

impl QualityPolicy {
    pub const fn new(min_words: usize, min_chars: usize) -> Self {
        Self {
            min_words,
            min_chars,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityCheck {
    TooFewWords,
    TooShort,
    MissingPunctuation,
    NoLeadingCapital,
}

impl QualityCheck {
    pub const ALL: [QualityCheck; 4] = [
        QualityCheck::TooFewWords,
        QualityCheck::TooShort,
        QualityCheck::MissingPunctuation,
        QualityCheck::NoLeadingCapital,
    ];

    pub fn label(self) -> &'static str {
        match self {
            QualityCheck::TooFewWords => "Too few words",
            QualityCheck::TooShort => "Too short",
            QualityCheck::MissingPunctuation => "Missing punctuation",
            QualityCheck::NoLeadingCapital => "Does not start with capital",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualityReport {
    failures: Vec<QualityCheck>,
}

impl QualityReport {
    pub fn passes(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[QualityCheck] {
        &self.failures
    }
}

/// Runs the word, length, punctuation and capitalization checks against normalized prose.
pub fn assess(prose: &str, policy: QualityPolicy) -> QualityReport {
    let prose = prose.trim();
    if prose.is_empty() || prose == "None" {
        return QualityReport {
            failures: QualityCheck::ALL.to_vec(),
        };
    }

    let mut failures = Vec::new();
    if prose.split_whitespace().count() < policy.min_words {
        failures.push(QualityCheck::TooFewWords);
    }
    if prose.chars().count() <= policy.min_chars {
        failures.push(QualityCheck::TooShort);
    }
    if !prose.contains(SENTENCE_MARKS) {
        failures.push(QualityCheck::MissingPunctuation);
    }
    if !prose.chars().next().is_some_and(char::is_uppercase) {
        failures.push(QualityCheck::NoLeadingCapital);
    }

    QualityReport { failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::normalizer::strip_header;

    const NOTE: &str = "Checked the mailbox rules with the user, removed the stale forwarding entry and \
                        confirmed that new messages arrive in the inbox without any delay today.";

    #[test]
    fn comprehensive_note_passes() {
        assert!(assess(NOTE, QualityPolicy::new(20, 100)).passes());
    }

    #[test]
    fn char_threshold_is_strict() {
        let prose = "Done, thanks.";
        let exact = prose.chars().count();
        assert!(!assess(prose, QualityPolicy::new(1, exact)).passes());
        assert!(assess(prose, QualityPolicy::new(1, exact - 1)).passes());
    }

    #[test]
    fn reports_every_failing_check() {
        let report = assess("restarted service", QualityPolicy::new(5, 50));
        assert_eq!(
            report.failures(),
            &[
                QualityCheck::TooFewWords,
                QualityCheck::TooShort,
                QualityCheck::MissingPunctuation,
                QualityCheck::NoLeadingCapital,
            ]
        );
    }

    #[test]
    fn literal_none_fails_regardless_of_thresholds() {
        assert!(!assess("None", QualityPolicy::new(0, 0)).passes());
        assert!(!assess("   ", QualityPolicy::new(0, 0)).passes());
    }

    #[test]
    fn header_only_entry_fails_after_normalization() {
        let normalized = strip_header("2025-10-01 09:15:02 - Jane Doe (Work notes)");
        assert!(!assess(&normalized, QualityPolicy::new(0, 0)).passes());
    }
}
