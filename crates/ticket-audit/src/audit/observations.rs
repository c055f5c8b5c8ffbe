//! Reviewer-facing summaries attached to each ticket's verdicts.

use std::collections::{BTreeSet, HashSet};

use super::normalizer::strip_header;
use super::outcome::Outcome;
use super::phrases::mentions_attachment;
use super::quality::{assess, QualityPolicy};
use super::rules::RuleId;
use super::timestamps::locate_timestamps;

const REMARK_POLICY: QualityPolicy = QualityPolicy::new(20, 100);
const ATTACHMENT_MENTIONED: &str = "Attachment mentioned";
const DUPLICATE_COMMENT: &str = "Duplicate comment found";
const NOTES_OK: &str = "Work notes meet quality standards";
const NO_NOTES: &str = "No work notes to review";
const ALL_CHECKS_PASSED: &str = "All key quality checks passed for this ticket.";

/// Splits a comment log into remarks at line breaks and embedded timestamps, dropping
/// journal headers and empty pieces.
pub fn split_remarks(log: &str) -> Vec<String> {
    let mut cuts: Vec<usize> = locate_timestamps(log)
        .into_iter()
        .map(|(offset, _)| offset)
        .collect();
    cuts.push(log.len());
    cuts.sort_unstable();
    cuts.dedup();

    let mut remarks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        if cut <= start {
            continue;
        }
        remarks.extend(
            log[start..cut]
                .split('\n')
                .map(strip_header)
                .filter(|remark| !remark.is_empty()),
        );
        start = cut;
    }
    remarks
}

/// Per-remark quality feedback on the work-notes log.
pub fn work_note_feedback(work_notes: Option<&str>, additional_comments: Option<&str>) -> String {
    let remarks = split_remarks(work_notes.unwrap_or_default());
    if remarks.is_empty() {
        return NO_NOTES.to_string();
    }

    let mut feedback: BTreeSet<&'static str> = BTreeSet::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for remark in &remarks {
        if !seen.insert(remark.as_str()) {
            feedback.insert(DUPLICATE_COMMENT);
        }
        feedback.extend(
            assess(remark, REMARK_POLICY)
                .failures()
                .iter()
                .map(|check| check.label()),
        );
        if mentions_attachment(remark) {
            feedback.insert(ATTACHMENT_MENTIONED);
        }
    }
    if additional_comments.is_some_and(mentions_attachment) {
        feedback.insert(ATTACHMENT_MENTIONED);
    }

    if feedback.is_empty() {
        NOTES_OK.to_string()
    } else {
        feedback.into_iter().collect::<Vec<_>>().join(", ")
    }
}

/// One sentence per failing rule, in verdict order.
pub fn failure_summary<'a, I>(verdicts: I) -> String
where
    I: IntoIterator<Item = (RuleId, &'a Outcome)>,
{
    let sentences: Vec<&'static str> = verdicts
        .into_iter()
        .filter(|(_, outcome)| outcome.is_failure())
        .filter_map(|(rule, _)| rule.observation())
        .collect();

    if sentences.is_empty() {
        ALL_CHECKS_PASSED.to_string()
    } else {
        sentences.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLID: &str = "Reviewed the mailbox rules with the user, removed a stale forwarding entry and \
                         confirmed that new messages now arrive in the inbox without any delay at all.";

    #[test]
    fn remarks_split_at_newlines_and_timestamps() {
        let log = "2025-10-01 09:00:00 - Sam Lee (Work notes)\nCalled user. 2025-10-02 10:00:00 - Sam Lee (Work notes) Sent update.";
        assert_eq!(split_remarks(log), vec!["Called user.", "Sent update."]);
    }

    #[test]
    fn well_written_log_meets_standards() {
        let log = format!("2025-10-01 09:00:00 - Sam Lee (Work notes)\n{SOLID}");
        assert_eq!(work_note_feedback(Some(&log), None), NOTES_OK);
    }

    #[test]
    fn flags_are_sorted_and_deduplicated() {
        let log = "see attached log\nsee attached log";
        assert_eq!(
            work_note_feedback(Some(log), None),
            "Attachment mentioned, Does not start with capital, Duplicate comment found, \
             Missing punctuation, Too few words, Too short"
        );
    }

    #[test]
    fn attachment_in_additional_comments_is_flagged() {
        let feedback = work_note_feedback(Some(SOLID), Some("Screenshot attached."));
        assert_eq!(feedback, ATTACHMENT_MENTIONED);
    }

    #[test]
    fn empty_log_has_nothing_to_review() {
        assert_eq!(work_note_feedback(None, None), NO_NOTES);
        assert_eq!(
            work_note_feedback(Some("2025-10-01 09:00:00 - Sam Lee (Work notes)"), None),
            NO_NOTES
        );
    }

    #[test]
    fn failure_summary_lists_failing_rules_only() {
        let fail = Outcome::Fail;
        let pass = Outcome::Pass;
        let labelled = Outcome::label("Fail (first gap > 1 day)");
        let missing = Outcome::MissingColumn;
        let tower = Outcome::label("Unknown Tower");

        let summary = failure_summary([
            (RuleId::ResponseSla, &fail),
            (RuleId::Reopened, &pass),
            (RuleId::Cadence111, &labelled),
            (RuleId::Reassignment, &missing),
            (RuleId::Tower, &tower),
        ]);
        assert_eq!(
            summary,
            "Response SLA is breached, 1-1-1 Check is not followed, Reassignment count is > 3"
        );
        assert_eq!(failure_summary([(RuleId::Reopened, &pass)]), ALL_CHECKS_PASSED);
    }
}
