//! Batch driver: runs the selected rules over every ticket and assembles the verdict table.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::config::AuditConfig;
use super::observations::{failure_summary, work_note_feedback};
use super::outcome::Outcome;
use super::reference::ReferenceData;
use super::report::{TicketVerdictSet, VerdictTable};
use super::rules::field::{ADDITIONAL_COMMENTS, APPLICATION, ASSIGNED_TO, NUMBER, PRIORITY, WORK_NOTES};
use super::rules::{Rule, RuleContext, RuleId, RuleRegistry};
use super::scoring::{completion_score, weighted_score, ScoreCategory};
use super::ticket::{TicketBatch, TicketRecord};

/// Alternative headers ticket exports commonly use for the columns rules depend on.
const COLUMN_ALTERNATIVES: &[(&str, &[&str])] = &[
    (
        "Short description",
        &[
            "Summary",
            "Title",
            "Brief Description",
            "Issue Summary",
            "Short Summary",
            "Description",
            "Subject",
            "Brief",
            "Issue Title",
            "Problem Summary",
        ],
    ),
    (
        "Description",
        &[
            "Long Description",
            "Details",
            "Full Description",
            "Issue Description",
            "Problem Description",
            "Detailed Description",
        ],
    ),
    (
        "Comments and Work notes",
        &[
            "Work Notes",
            "Comments",
            "Notes",
            "Work_Notes",
            "Worknotes",
            "Technical Notes",
            "Resolution Notes",
        ],
    ),
    (
        "Additional comments",
        &[
            "Resolution Notes",
            "Additional Notes",
            "Resolution Comments",
            "Final Comments",
            "Closure Notes",
            "Resolution Details",
        ],
    ),
    (
        "Response Time",
        &["Response_Time", "First Response Time", "Response Time (min)", "Response Time Min"],
    ),
    (
        "Response SLA",
        &["Response_SLA", "Response SLA Met", "SLA Response", "First Response SLA"],
    ),
    (
        "Resolution SLA",
        &["Resolution_SLA", "Resolution SLA Met", "SLA Resolution", "Final SLA"],
    ),
    (
        "Age",
        &["Ticket Age", "Days Open", "Aging", "Time Open", "Days Since Created"],
    ),
    (
        "Knowledge Article Used",
        &["KBA", "KB Article", "Knowledge Base", "KB Used", "Article", "Knowledge Article"],
    ),
    ("Reopened", &["Reopen Status", "Flag Reopened"]),
    (
        "Pending reason",
        &["Pending Reason", "Pending_Reason", "Wait Reason", "Hold Reason", "Pending Comments"],
    ),
    (
        "Related Record",
        &["Related Records", "Related_Record", "Parent Record", "Related Tickets", "Related INC"],
    ),
    (
        "Reassignment count",
        &[
            "Reassignment Count",
            "Reassignment_Count",
            "Assignment Changes",
            "Reassignments",
            "Transfer Count",
        ],
    ),
    (
        "Priority",
        &["Ticket Priority", "Issue Priority", "Severity", "Urgency Level", "Priority Level"],
    ),
];

/// Columns in the batch that look like a stand-in for a missing `target` column.
pub fn suggest_similar_columns(columns: &[String], target: &str) -> Vec<String> {
    let Some((_, alternatives)) = COLUMN_ALTERNATIVES
        .iter()
        .find(|(column, _)| *column == target)
    else {
        return Vec::new();
    };

    let suggestions: BTreeSet<&String> = columns
        .iter()
        .filter(|column| {
            let column = column.to_lowercase();
            alternatives.iter().any(|alternative| {
                let alternative = alternative.to_lowercase();
                alternative.contains(&column) || column.contains(&alternative)
            })
        })
        .collect();
    suggestions.into_iter().cloned().collect()
}

/// Verdicts for one rule across the whole batch.
enum RuleVerdicts {
    Uniform(Outcome),
    PerTicket(Vec<Outcome>),
}

impl RuleVerdicts {
    fn for_ticket(&self, index: usize) -> &Outcome {
        match self {
            RuleVerdicts::Uniform(outcome) => outcome,
            RuleVerdicts::PerTicket(outcomes) => &outcomes[index],
        }
    }
}

/// Audits ticket batches with a fixed configuration and reference data.
pub struct AuditEngine {
    config: AuditConfig,
    reference: ReferenceData,
    registry: RuleRegistry,
}

impl AuditEngine {
    pub fn new(config: AuditConfig, reference: ReferenceData) -> Self {
        Self::with_registry(config, reference, RuleRegistry::standard())
    }

    pub fn with_registry(config: AuditConfig, reference: ReferenceData, registry: RuleRegistry) -> Self {
        Self {
            config,
            reference,
            registry,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn run(&self, batch: &TicketBatch) -> VerdictTable {
        let selected: Vec<&dyn Rule> = self
            .registry
            .rules()
            .filter(|rule| self.config.is_selected(rule.id()))
            .collect();

        info!(
            tickets = batch.len(),
            rules = selected.len(),
            "starting ticket audit"
        );

        let ctx = RuleContext {
            thresholds: &self.config.thresholds,
            reference: &self.reference,
            batch_has_priority: batch.has_field(PRIORITY),
        };

        let columns: Vec<(RuleId, RuleVerdicts)> = selected
            .iter()
            .map(|rule| (rule.id(), self.evaluate_rule(*rule, batch, &ctx)))
            .collect();

        let weights = self.config.effective_weights();
        let policy = &self.config.scoring;

        let tickets: Vec<TicketVerdictSet> = batch
            .records()
            .iter()
            .enumerate()
            .map(|(index, ticket)| {
                let verdicts: Vec<(RuleId, Outcome)> = columns
                    .iter()
                    .map(|(id, verdicts)| (*id, verdicts.for_ticket(index).clone()))
                    .collect();
                let borrowed = || verdicts.iter().map(|(id, outcome)| (*id, outcome));

                let score = completion_score(borrowed(), policy);
                let weighted = match &weights {
                    Some(weights) => weighted_score(borrowed(), weights, policy),
                    None => score,
                };

                let verdict_set = TicketVerdictSet {
                    ticket_number: identifier(ticket, NUMBER),
                    assigned_to: identifier(ticket, ASSIGNED_TO),
                    application: identifier(ticket, APPLICATION),
                    work_note_feedback: work_note_feedback(
                        ticket.text(WORK_NOTES).as_deref(),
                        ticket.text(ADDITIONAL_COMMENTS).as_deref(),
                    ),
                    failure_summary: failure_summary(borrowed()),
                    score,
                    score_category: ScoreCategory::for_score(score),
                    weighted_score: weighted,
                    verdicts,
                };
                debug!(
                    ticket = %verdict_set.ticket_number,
                    score,
                    weighted_score = weighted,
                    "ticket audited"
                );
                verdict_set
            })
            .collect();

        let failing = tickets
            .iter()
            .filter(|ticket| ticket.score_category == ScoreCategory::Below75)
            .count();
        info!(
            tickets = tickets.len(),
            below_75 = failing,
            weighted = weights.is_some(),
            "ticket audit finished"
        );

        let rules = columns.into_iter().map(|(id, _)| id).collect();
        VerdictTable::new(rules, tickets)
    }

    fn evaluate_rule(&self, rule: &dyn Rule, batch: &TicketBatch, ctx: &RuleContext<'_>) -> RuleVerdicts {
        let missing: Vec<&str> = rule
            .required_fields()
            .iter()
            .copied()
            .filter(|field| !batch.has_field(field))
            .collect();

        if !missing.is_empty() {
            for field in &missing {
                let suggestions = suggest_similar_columns(batch.columns(), field);
                warn!(
                    rule = %rule.id(),
                    column = *field,
                    ?suggestions,
                    "required column missing; rule marked as failed for every ticket"
                );
            }
            return RuleVerdicts::Uniform(Outcome::MissingColumn);
        }

        if let Some(outcome) = rule.precheck(ctx) {
            warn!(rule = %rule.id(), outcome = %outcome, "rule resolved for whole batch");
            return RuleVerdicts::Uniform(outcome);
        }

        RuleVerdicts::PerTicket(
            batch
                .records()
                .iter()
                .map(|ticket| rule.evaluate(ticket, ctx))
                .collect(),
        )
    }
}

fn identifier(ticket: &TicketRecord, field: &str) -> String {
    ticket.get(field).to_string()
}
