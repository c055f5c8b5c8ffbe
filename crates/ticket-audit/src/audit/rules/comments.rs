//! Rules that read the agent's comment log.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use super::field::{
    ADDITIONAL_COMMENTS, CLOSED, OPENED, PENDING_REASON, RELATED_RECORD, WORK_NOTES,
};
use super::{Rule, RuleContext, RuleId};
use crate::audit::calendar::{business_days_elapsed, check_uninterrupted, ContinuityOutcome};
use crate::audit::canonical::PendingReason;
use crate::audit::config::Thresholds;
use crate::audit::normalizer::{clean_for_template, collapse_whitespace, strip_header};
use crate::audit::outcome::Outcome;
use crate::audit::phrases::{
    confirms_closure, contains_password, has_pending_justification, ReminderStage,
};
use crate::audit::quality::{assess, QualityPolicy};
use crate::audit::static_regex;
use crate::audit::ticket::{FieldValue, TicketRecord};
use crate::audit::timestamps::extract_timestamps;

static ENTRY_DATE: OnceLock<Regex> = OnceLock::new();

// First calendar date in a note, numeric or with a month name.
const ENTRY_DATE_PATTERN: &str = r"\b(?:\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4}|\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}|\d{1,2}[-/. ]?[A-Za-z]{3,9}[-/. ]?\d{4}|[A-Za-z]{3,9}[-/. ]?\d{1,2},?[-/. ]?\d{4})\b";

const SENTENCE_ENDINGS: [char; 4] = ['.', '!', '?', ';'];
const SAME_DAY_AGE: f64 = 0.04167;
const REMINDER_MIN_AGE: f64 = 3.0;
const FORMAT_MIN_CHARS: usize = 30;
const FORMAT_MIN_WORDS: usize = 10;

/// Both comment columns, work notes first, joined by a space.
pub(super) fn combined_comments(ticket: &TicketRecord) -> String {
    ticket.joined_text(&[WORK_NOTES, ADDITIONAL_COMMENTS], " ")
}

/// Update dates embedded in both comment columns.
pub(super) fn comment_dates(ticket: &TicketRecord) -> Vec<NaiveDate> {
    [WORK_NOTES, ADDITIONAL_COMMENTS]
        .iter()
        .filter_map(|field| ticket.text(field))
        .flat_map(|text| extract_timestamps(&text))
        .map(|stamp| stamp.date())
        .collect()
}

/// Parsed date of a boundary field; `Err` when a value is present but unreadable.
fn boundary_date(value: &FieldValue) -> Result<Option<NaiveDate>, ()> {
    if value.is_absent() {
        return Ok(None);
    }
    value.as_datetime().map(|stamp| Some(stamp.date())).ok_or(())
}

fn format_days(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Prose quality of a comment field once journal headers are removed.
pub(super) struct NotesLength {
    pub id: RuleId,
    pub field: &'static str,
    pub min_words: usize,
    pub min_chars: fn(&Thresholds) -> usize,
}

impl Rule for NotesLength {
    fn id(&self) -> RuleId {
        self.id
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let value = ticket.get(self.field);
        if value.is_absent() {
            return Outcome::Fail;
        }
        let prose = strip_header(&value.to_string());
        let policy = QualityPolicy::new(self.min_words, (self.min_chars)(ctx.thresholds));
        Outcome::from_bool(assess(&prose, policy).passes())
    }
}

/// A ticket on hold must carry the related record its pending reason implies.
pub(super) struct RelatedRecordRule;

impl Rule for RelatedRecordRule {
    fn id(&self) -> RuleId {
        RuleId::RelatedRecordTagged
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let Some(reason) = ticket.text(PENDING_REASON).and_then(|raw| PendingReason::parse(&raw))
        else {
            return Outcome::Pass;
        };

        let related = ticket.get(RELATED_RECORD);
        match reason {
            PendingReason::Customer => {
                Outcome::from_bool(has_pending_justification(&combined_comments(ticket)))
            }
            PendingReason::Vendor => Outcome::from_bool(!related.is_absent()),
            PendingReason::Other(_) => Outcome::Fail,
            tagged => {
                if related.is_absent() {
                    return Outcome::Fail;
                }
                let record = related.to_string();
                Outcome::from_bool(
                    tagged
                        .required_record_prefix()
                        .is_some_and(|prefix| record.contains(prefix)),
                )
            }
        }
    }
}

pub(super) struct PendingJustificationRule;

impl Rule for PendingJustificationRule {
    fn id(&self) -> RuleId {
        RuleId::PendingJustification
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        if ticket.get(PENDING_REASON).is_absent() {
            return Outcome::Pass;
        }
        Outcome::from_bool(has_pending_justification(&combined_comments(ticket)))
    }
}

/// Age-banded reminder escalation: the longer a ticket is open, the later the reminder
/// the log must show.
pub(super) struct ReminderRule;

impl Rule for ReminderRule {
    fn id(&self) -> RuleId {
        RuleId::ReminderEscalation
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let Some(age) = ticket.age() else {
            return Outcome::label("Pass - Missing timestamps");
        };
        if age <= SAME_DAY_AGE {
            return Outcome::label("Pass - Same-day closure");
        }
        let closure_days = ctx.thresholds.reminder_closure_days;
        if age < closure_days {
            return Outcome::label(format!("Pass - Closed <{}d", format_days(closure_days)));
        }
        if age < REMINDER_MIN_AGE {
            return Outcome::label("Pass - Age <3d");
        }

        let comments = combined_comments(ticket);
        if comments.trim().is_empty() {
            return Outcome::label("Fail - No comments");
        }

        let stage = ReminderStage::for_age(age);
        if stage.found_in(&comments) {
            Outcome::label(format!("Pass - {} found", stage.label()))
        } else {
            Outcome::label(format!("Fail - No {}", stage.label()))
        }
    }
}

pub(super) struct PasswordRule;

impl Rule for PasswordRule {
    fn id(&self) -> RuleId {
        RuleId::PasswordDetected
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        Outcome::from_bool(!contains_password(&combined_comments(ticket)))
    }
}

pub(super) struct ConfirmationRule;

impl Rule for ConfirmationRule {
    fn id(&self) -> RuleId {
        RuleId::ClosedWithConfirmation
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        Outcome::from_bool(confirms_closure(&combined_comments(ticket)))
    }
}

/// The first comment must land within the configured business days of opening.
pub(super) struct FirstUpdateRule;

impl Rule for FirstUpdateRule {
    fn id(&self) -> RuleId {
        RuleId::FirstUpdateWithinBusinessDays
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let Some(opened) = ticket.get(OPENED).as_datetime() else {
            return Outcome::label("Invalid Opened Date");
        };
        let Some(first_update) = comment_dates(ticket).into_iter().min() else {
            return Outcome::label("No Comments");
        };
        let elapsed = business_days_elapsed(opened.date(), first_update);
        Outcome::from_bool(elapsed <= ctx.thresholds.ticket_update_days)
    }
}

/// No stretch between opening, updates and closure may exceed one business day.
pub(super) struct ContinuityRule;

impl Rule for ContinuityRule {
    fn id(&self) -> RuleId {
        RuleId::UpdateContinuity
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let (Ok(opened), Ok(closed)) = (
            boundary_date(ticket.get(OPENED)),
            boundary_date(ticket.get(CLOSED)),
        ) else {
            return Outcome::label(ContinuityOutcome::InvalidDates.label());
        };
        let outcome = check_uninterrupted(opened, &comment_dates(ticket), closed);
        Outcome::label(outcome.label())
    }
}

/// A dated note followed by a substantial, well-formed sentence.
pub(super) struct WorkNoteFormatRule;

impl Rule for WorkNoteFormatRule {
    fn id(&self) -> RuleId {
        RuleId::WorkNoteFormat
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let value = ticket.get(WORK_NOTES);
        if value.is_null() || value.as_text().is_some_and(|text| text == "None") {
            return Outcome::Fail;
        }
        Outcome::label(assess_note_format(value.to_string().trim()))
    }
}

fn assess_note_format(entry: &str) -> &'static str {
    const NO_MATCH: &str = "No match or invalid format";
    const NEEDS_IMPROVEMENT: &str = "Needs improvement";

    let Some(date) = static_regex(&ENTRY_DATE, ENTRY_DATE_PATTERN).find(entry) else {
        return NO_MATCH;
    };
    let body = entry[date.end()..].trim();

    let well_formed = body.chars().count() > FORMAT_MIN_CHARS
        && body.split_whitespace().count() >= FORMAT_MIN_WORDS
        && body.contains(SENTENCE_ENDINGS)
        && body
            .chars()
            .find(|c| c.is_alphabetic())
            .is_some_and(char::is_uppercase);

    if well_formed {
        "Comprehensive"
    } else {
        NEEDS_IMPROVEMENT
    }
}

/// The configured template text must appear in the cleaned comment log.
pub(super) struct TemplateRule {
    pub id: RuleId,
    pub template: fn(&Thresholds) -> &str,
}

impl Rule for TemplateRule {
    fn id(&self) -> RuleId {
        self.id
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let template = collapse_whitespace((self.template)(ctx.thresholds)).to_lowercase();
        let cleaned = [WORK_NOTES, ADDITIONAL_COMMENTS]
            .iter()
            .filter_map(|field| ticket.text(field))
            .map(|text| clean_for_template(&text))
            .collect::<Vec<_>>()
            .join(" ");
        Outcome::from_bool(cleaned.contains(&template))
    }
}
