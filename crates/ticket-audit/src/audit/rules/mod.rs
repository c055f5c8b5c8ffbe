//! Rule registry: one [`Rule`] implementation per quality check, dispatched in a fixed order.

mod cadence;
mod comments;
mod fields;
mod lookups;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::Thresholds;
use super::outcome::Outcome;
use super::reference::ReferenceData;
use super::ticket::TicketRecord;

/// Ticket batch column names the rules read.
pub mod field {
    pub const NUMBER: &str = "Number";
    pub const ASSIGNED_TO: &str = "Assigned to";
    pub const APPLICATION: &str = "Application Name / CI";
    pub const SHORT_DESCRIPTION: &str = "Short description";
    pub const DESCRIPTION: &str = "Description";
    pub const RESPONSE_TIME: &str = "Response Time";
    pub const PRIORITY: &str = "Priority";
    pub const IMPACT: &str = "Impact";
    pub const URGENCY: &str = "Urgency";
    pub const RESPONSE_SLA: &str = "Response SLA";
    pub const RESOLUTION_SLA: &str = "Resolution SLA";
    pub const KNOWLEDGE_ARTICLE: &str = "Knowledge Article Used";
    pub const REOPENED: &str = "Reopened";
    pub const WORK_NOTES: &str = "Comments and Work notes";
    pub const ADDITIONAL_COMMENTS: &str = "Additional comments";
    pub const ASSIGNMENT_GROUP: &str = "Assignment Group";
    pub const PENDING_REASON: &str = "Pending reason";
    pub const RELATED_RECORD: &str = "Related Record";
    pub const AGE: &str = super::super::ticket::AGE;
    pub const OPENED: &str = super::super::ticket::OPENED;
    pub const CLOSED: &str = super::super::ticket::CLOSED;
    pub const REASSIGNMENT_COUNT: &str = "Reassignment count";
    pub const HAS_ATTACHMENTS: &str = "Has Attachments";
    pub const CATEGORY: &str = "Category";
    pub const SUBCATEGORY: &str = "Subcategory";
}

use field::*;

const COMMENT_FIELDS: &[&str] = &[WORK_NOTES, ADDITIONAL_COMMENTS];
const AGED_COMMENT_FIELDS: &[&str] = &[AGE, WORK_NOTES, ADDITIONAL_COMMENTS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum RuleId {
    Tower,
    ShortDescriptionLength,
    LongDescriptionLength,
    ResponseTime,
    ResponseSla,
    ResolutionSla,
    KbaTagged,
    Reopened,
    WorkNotesLength,
    ResolutionNotesLength,
    AssignmentGroup,
    RelatedRecordTagged,
    TicketAgeing,
    ReminderEscalation,
    Reassignment,
    HasAttachments,
    PriorityMatrix,
    CategoryMatch,
    PendingJustification,
    PasswordDetected,
    ClosedWithConfirmation,
    FirstUpdateWithinBusinessDays,
    UpdateContinuity,
    WorkNoteFormat,
    Cadence111,
    Cadence221,
    Cadence321,
    AcknowledgmentTemplate,
    ResolutionTemplate,
}

impl RuleId {
    /// Registry order; verdict columns follow it.
    pub const ALL: [RuleId; 29] = [
        RuleId::Tower,
        RuleId::ShortDescriptionLength,
        RuleId::LongDescriptionLength,
        RuleId::ResponseTime,
        RuleId::ResponseSla,
        RuleId::ResolutionSla,
        RuleId::KbaTagged,
        RuleId::Reopened,
        RuleId::WorkNotesLength,
        RuleId::ResolutionNotesLength,
        RuleId::AssignmentGroup,
        RuleId::RelatedRecordTagged,
        RuleId::TicketAgeing,
        RuleId::ReminderEscalation,
        RuleId::Reassignment,
        RuleId::HasAttachments,
        RuleId::PriorityMatrix,
        RuleId::CategoryMatch,
        RuleId::PendingJustification,
        RuleId::PasswordDetected,
        RuleId::ClosedWithConfirmation,
        RuleId::FirstUpdateWithinBusinessDays,
        RuleId::UpdateContinuity,
        RuleId::WorkNoteFormat,
        RuleId::Cadence111,
        RuleId::Cadence221,
        RuleId::Cadence321,
        RuleId::AcknowledgmentTemplate,
        RuleId::ResolutionTemplate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::Tower => "tower",
            RuleId::ShortDescriptionLength => "short_description_length",
            RuleId::LongDescriptionLength => "long_description_length",
            RuleId::ResponseTime => "response_time",
            RuleId::ResponseSla => "response_sla",
            RuleId::ResolutionSla => "resolution_sla",
            RuleId::KbaTagged => "kba_tagged",
            RuleId::Reopened => "reopened",
            RuleId::WorkNotesLength => "work_notes_length",
            RuleId::ResolutionNotesLength => "resolution_notes_length",
            RuleId::AssignmentGroup => "assignment_group",
            RuleId::RelatedRecordTagged => "related_record_tagged",
            RuleId::TicketAgeing => "ticket_ageing",
            RuleId::ReminderEscalation => "reminder_escalation",
            RuleId::Reassignment => "reassignment",
            RuleId::HasAttachments => "has_attachments",
            RuleId::PriorityMatrix => "priority_matrix",
            RuleId::CategoryMatch => "category_match",
            RuleId::PendingJustification => "pending_justification",
            RuleId::PasswordDetected => "password_detected",
            RuleId::ClosedWithConfirmation => "closed_with_confirmation",
            RuleId::FirstUpdateWithinBusinessDays => "first_update_within_business_days",
            RuleId::UpdateContinuity => "update_continuity",
            RuleId::WorkNoteFormat => "work_note_format",
            RuleId::Cadence111 => "cadence_1_1_1",
            RuleId::Cadence221 => "cadence_2_2_1",
            RuleId::Cadence321 => "cadence_3_2_1",
            RuleId::AcknowledgmentTemplate => "acknowledgment_template",
            RuleId::ResolutionTemplate => "resolution_template",
        }
    }

    /// Name reviewers pick the rule by.
    pub fn display_name(self) -> &'static str {
        match self {
            RuleId::Tower => "Tower",
            RuleId::ShortDescriptionLength => "Short Description Length Check",
            RuleId::LongDescriptionLength => "Long Description Length Check",
            RuleId::ResponseTime => "Actual Response Time took",
            RuleId::ResponseSla => "Response SLA Met ?",
            RuleId::ResolutionSla => "Resolution SLA Met ?",
            RuleId::KbaTagged => "KBA Tagged?",
            RuleId::Reopened => "Reopened ?",
            RuleId::WorkNotesLength => "Work notes Length Check",
            RuleId::ResolutionNotesLength => "Resolution Notes / Additional comment Length Check",
            RuleId::AssignmentGroup => "Right Assignment group Usage",
            RuleId::RelatedRecordTagged => "Related records tagged?",
            RuleId::TicketAgeing => "Ticket Ageing Check",
            RuleId::ReminderEscalation => {
                "3 Strike rule check(escalation policy check for Remainder)"
            }
            RuleId::Reassignment => "Reassignment check?",
            RuleId::HasAttachments => "Has Attachments",
            RuleId::PriorityMatrix => "Priority Validation",
            RuleId::CategoryMatch => "Category Validation",
            RuleId::PendingJustification => "Right Pending Justification Usage",
            RuleId::PasswordDetected => "Password_detected?",
            RuleId::ClosedWithConfirmation => "Closed with User Confirmation?",
            RuleId::FirstUpdateWithinBusinessDays => "Ticket Updated Within Business Days",
            RuleId::UpdateContinuity => "Process Adherence Violation Check",
            RuleId::WorkNoteFormat => "Work Note Format & Content Check",
            RuleId::Cadence111 => "3 Strike Check(1-1-1)",
            RuleId::Cadence221 => "3 Strike Check(2-2-1)",
            RuleId::Cadence321 => "3 Strike Check(3-2-1)",
            RuleId::AcknowledgmentTemplate => "Acknowledgment notes recorded in Worklog?",
            RuleId::ResolutionTemplate => {
                "Is the resolution summary and closure notes updated as per appropriate template?"
            }
        }
    }

    /// Header of the rule's verdict column.
    pub fn column_label(self) -> &'static str {
        match self {
            RuleId::Tower => "Tower",
            RuleId::ShortDescriptionLength => "Short Description",
            RuleId::LongDescriptionLength => "Long Description",
            RuleId::ResponseTime => "Response Time",
            RuleId::ResponseSla => "Response SLA Met",
            RuleId::ResolutionSla => "Resolution SLA Met",
            RuleId::KbaTagged => "KBA Tagged?",
            RuleId::Reopened => "Reopened?",
            RuleId::WorkNotesLength => "Work notes Length Check",
            RuleId::ResolutionNotesLength => "Resolution Notes Length",
            RuleId::AssignmentGroup => "Assignment group check",
            RuleId::RelatedRecordTagged => "Related records tagged?",
            RuleId::TicketAgeing => "Ticket Ageing Check",
            RuleId::ReminderEscalation => "3 Strike rule remainders check",
            RuleId::Reassignment => "Reassignment check?",
            RuleId::HasAttachments => "Has Attachments",
            RuleId::PriorityMatrix => "Priority Validation",
            RuleId::CategoryMatch => "Category Validation",
            RuleId::PendingJustification => "Pending Justification",
            RuleId::PasswordDetected => "password_detected?",
            RuleId::ClosedWithConfirmation => "Closed with User Confirmation?",
            RuleId::FirstUpdateWithinBusinessDays => "Ticket Updated Within Business Days",
            RuleId::UpdateContinuity => "PA violation Check",
            RuleId::WorkNoteFormat => "Work Note Format & Content Check",
            RuleId::Cadence111 => "3 Strike Check(1-1-1)",
            RuleId::Cadence221 => "3 Strike Check(2-2-1)",
            RuleId::Cadence321 => "3 Strike Check(3-2-1)",
            RuleId::AcknowledgmentTemplate => "Acknowledgment notes recorded in Worklog?",
            RuleId::ResolutionTemplate => {
                "Is the resolution summary and closure notes updated as per appropriate template?"
            }
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            RuleId::Tower => &[APPLICATION],
            RuleId::ShortDescriptionLength => &[SHORT_DESCRIPTION],
            RuleId::LongDescriptionLength => &[DESCRIPTION],
            RuleId::ResponseTime => &[RESPONSE_TIME],
            RuleId::ResponseSla => &[RESPONSE_SLA],
            RuleId::ResolutionSla => &[RESOLUTION_SLA],
            RuleId::KbaTagged => &[KNOWLEDGE_ARTICLE],
            RuleId::Reopened => &[REOPENED],
            RuleId::WorkNotesLength => &[WORK_NOTES],
            RuleId::ResolutionNotesLength => &[ADDITIONAL_COMMENTS],
            RuleId::AssignmentGroup => &[ASSIGNMENT_GROUP, APPLICATION],
            RuleId::RelatedRecordTagged => &[PENDING_REASON, RELATED_RECORD],
            RuleId::TicketAgeing => &[AGE],
            RuleId::ReminderEscalation => AGED_COMMENT_FIELDS,
            RuleId::Reassignment => &[REASSIGNMENT_COUNT],
            RuleId::HasAttachments => &[HAS_ATTACHMENTS],
            RuleId::PriorityMatrix => &[PRIORITY, IMPACT, URGENCY],
            RuleId::CategoryMatch => &[DESCRIPTION, CATEGORY, SUBCATEGORY],
            RuleId::PendingJustification => &[PENDING_REASON, WORK_NOTES, ADDITIONAL_COMMENTS],
            RuleId::PasswordDetected => COMMENT_FIELDS,
            RuleId::ClosedWithConfirmation => COMMENT_FIELDS,
            RuleId::FirstUpdateWithinBusinessDays => &[OPENED, WORK_NOTES, ADDITIONAL_COMMENTS],
            RuleId::UpdateContinuity => &[OPENED, CLOSED, WORK_NOTES, ADDITIONAL_COMMENTS],
            RuleId::WorkNoteFormat => &[WORK_NOTES],
            RuleId::Cadence111 | RuleId::Cadence221 | RuleId::Cadence321 => AGED_COMMENT_FIELDS,
            RuleId::AcknowledgmentTemplate | RuleId::ResolutionTemplate => COMMENT_FIELDS,
        }
    }

    /// Informational rules produce a column but never move the score.
    pub fn is_scored(self) -> bool {
        !matches!(self, RuleId::Tower | RuleId::HasAttachments)
    }

    /// Reviewer sentence emitted when the rule's verdict is a failure.
    pub fn observation(self) -> Option<&'static str> {
        let sentence = match self {
            RuleId::Tower | RuleId::HasAttachments => return None,
            RuleId::ShortDescriptionLength => "Short Description has less than threshold characters",
            RuleId::LongDescriptionLength => "Long Description is less than threshold characters",
            RuleId::ResponseTime => "Response time is more than threshold minutes",
            RuleId::ResponseSla => "Response SLA is breached",
            RuleId::ResolutionSla => "Resolution SLA is breached",
            RuleId::KbaTagged => "KBA is not tagged to the ticket",
            RuleId::Reopened => "Ticket is reopened",
            RuleId::WorkNotesLength => "Worknotes are not comprehensive",
            RuleId::ResolutionNotesLength => "Resolution notes are not comprehensive",
            RuleId::AssignmentGroup => "Ticket is assigned to an incorrect group",
            RuleId::RelatedRecordTagged => "Related record is not tagged",
            RuleId::TicketAgeing => "Ticket is ageing > 20 days",
            RuleId::ReminderEscalation => "3 Strike rule (Confirmation) is not followed",
            RuleId::Reassignment => "Reassignment count is > 3",
            RuleId::PriorityMatrix => "Priority does not match the impact/urgency matrix",
            RuleId::CategoryMatch => "Category/Subcategory does not match the description",
            RuleId::PendingJustification => "Pending justification is not recorded",
            RuleId::PasswordDetected => "Password is shared in the comments",
            RuleId::ClosedWithConfirmation => "Ticket is closed without user confirmation",
            RuleId::FirstUpdateWithinBusinessDays => {
                "Ticket is not updated within the allowed business days"
            }
            RuleId::UpdateContinuity => "Ticket updates have a gap of more than one business day",
            RuleId::WorkNoteFormat => "Work note format is not followed",
            RuleId::Cadence111 => "1-1-1 Check is not followed",
            RuleId::Cadence221 => "2-2-1 Check is not followed",
            RuleId::Cadence321 => "3-2-1 Check is not followed",
            RuleId::AcknowledgmentTemplate => "Acknowledgment template is not recorded in worklog",
            RuleId::ResolutionTemplate => "Resolution summary template is not followed",
        };
        Some(sentence)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRule(pub String);

impl fmt::Display for UnknownRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown rule '{}'", self.0)
    }
}

impl std::error::Error for UnknownRule {}

impl FromStr for RuleId {
    type Err = UnknownRule;

    /// Accepts the snake_case id or the display name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        RuleId::ALL
            .into_iter()
            .find(|rule| {
                rule.as_str().eq_ignore_ascii_case(trimmed) || rule.display_name() == trimmed
            })
            .ok_or_else(|| UnknownRule(trimmed.to_string()))
    }
}

impl TryFrom<String> for RuleId {
    type Error = UnknownRule;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RuleId> for &'static str {
    fn from(rule: RuleId) -> Self {
        rule.as_str()
    }
}

/// Read-only inputs shared by every rule during one run.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub thresholds: &'a Thresholds,
    pub reference: &'a ReferenceData,
    /// Whether the batch schema carries a Priority column.
    pub batch_has_priority: bool,
}

/// A single quality check.
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    fn required_fields(&self) -> &'static [&'static str] {
        self.id().required_fields()
    }

    /// Batch-wide verdict that replaces per-ticket evaluation, e.g. when a lookup table
    /// cannot be used.
    fn precheck(&self, _ctx: &RuleContext<'_>) -> Option<Outcome> {
        None
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome;
}

/// Ordered collection of rule implementations.
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Every built-in rule, in registry order.
    pub fn standard() -> Self {
        let rules: Vec<Box<dyn Rule>> = RuleId::ALL.into_iter().map(build_rule).collect();
        Self { rules }
    }

    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    pub fn get(&self, id: RuleId) -> Option<&dyn Rule> {
        self.rules().find(|rule| rule.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn build_rule(id: RuleId) -> Box<dyn Rule> {
    use super::calendar::CadencePattern;

    match id {
        RuleId::Tower => Box::new(lookups::TowerRule),
        RuleId::ShortDescriptionLength => Box::new(fields::DescriptionLength {
            id,
            field: SHORT_DESCRIPTION,
            minimum: |thresholds| thresholds.short_desc,
        }),
        RuleId::LongDescriptionLength => Box::new(fields::DescriptionLength {
            id,
            field: DESCRIPTION,
            minimum: |thresholds| thresholds.long_desc,
        }),
        RuleId::ResponseTime => Box::new(fields::ResponseTimeRule),
        RuleId::ResponseSla => Box::new(fields::SlaMet {
            id,
            field: RESPONSE_SLA,
        }),
        RuleId::ResolutionSla => Box::new(fields::SlaMet {
            id,
            field: RESOLUTION_SLA,
        }),
        RuleId::KbaTagged => Box::new(fields::KbaTagged),
        RuleId::Reopened => Box::new(fields::ReopenedRule),
        RuleId::WorkNotesLength => Box::new(comments::NotesLength {
            id,
            field: WORK_NOTES,
            min_words: 20,
            min_chars: |thresholds| thresholds.worknote,
        }),
        RuleId::ResolutionNotesLength => Box::new(comments::NotesLength {
            id,
            field: ADDITIONAL_COMMENTS,
            min_words: 10,
            min_chars: |thresholds| thresholds.resolution_notes,
        }),
        RuleId::AssignmentGroup => Box::new(lookups::AssignmentGroupRule),
        RuleId::RelatedRecordTagged => Box::new(comments::RelatedRecordRule),
        RuleId::TicketAgeing => Box::new(fields::TicketAgeing),
        RuleId::ReminderEscalation => Box::new(comments::ReminderRule),
        RuleId::Reassignment => Box::new(fields::ReassignmentRule),
        RuleId::HasAttachments => Box::new(fields::HasAttachmentsRule),
        RuleId::PriorityMatrix => Box::new(fields::PriorityMatrixRule),
        RuleId::CategoryMatch => Box::new(lookups::CategoryRule),
        RuleId::PendingJustification => Box::new(comments::PendingJustificationRule),
        RuleId::PasswordDetected => Box::new(comments::PasswordRule),
        RuleId::ClosedWithConfirmation => Box::new(comments::ConfirmationRule),
        RuleId::FirstUpdateWithinBusinessDays => Box::new(comments::FirstUpdateRule),
        RuleId::UpdateContinuity => Box::new(comments::ContinuityRule),
        RuleId::WorkNoteFormat => Box::new(comments::WorkNoteFormatRule),
        RuleId::Cadence111 => Box::new(cadence::CadenceRule {
            id,
            pattern: CadencePattern::ONE_ONE_ONE,
            age_threshold: |thresholds| thresholds.cadence_1_1_1,
        }),
        RuleId::Cadence221 => Box::new(cadence::CadenceRule {
            id,
            pattern: CadencePattern::TWO_TWO_ONE,
            age_threshold: |thresholds| thresholds.cadence_2_2_1,
        }),
        RuleId::Cadence321 => Box::new(cadence::CadenceRule {
            id,
            pattern: CadencePattern::THREE_TWO_ONE,
            age_threshold: |thresholds| thresholds.cadence_3_2_1,
        }),
        RuleId::AcknowledgmentTemplate => Box::new(comments::TemplateRule {
            id,
            template: |thresholds| thresholds.acknowledgment_template.as_str(),
        }),
        RuleId::ResolutionTemplate => Box::new(comments::TemplateRule {
            id,
            template: |thresholds| thresholds.resolution_template.as_str(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_follows_rule_order() {
        let registry = RuleRegistry::standard();
        let ids: Vec<RuleId> = registry.rules().map(|rule| rule.id()).collect();
        assert_eq!(ids, RuleId::ALL.to_vec());
    }

    #[test]
    fn ids_round_trip_through_names() {
        for rule in RuleId::ALL {
            assert_eq!(rule.as_str().parse::<RuleId>(), Ok(rule));
            assert_eq!(rule.display_name().parse::<RuleId>(), Ok(rule));
        }
        assert!("not_a_rule".parse::<RuleId>().is_err());
    }

    #[test]
    fn informational_rules_are_not_scored() {
        let unscored: Vec<RuleId> = RuleId::ALL
            .into_iter()
            .filter(|rule| !rule.is_scored())
            .collect();
        assert_eq!(unscored, vec![RuleId::Tower, RuleId::HasAttachments]);
        assert!(unscored.iter().all(|rule| rule.observation().is_none()));
    }
}
