//! Per-ticket verdict sets and the tabular report built from them.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::outcome::Outcome;
use super::rules::RuleId;
use super::scoring::ScoreCategory;

const TICKET_NUMBER: &str = "Ticket Number";
const ASSIGNED_TO: &str = "Assigned to";
const APPLICATION: &str = "Application";
const OBSERVATIONS_1: &str = "Observations1";
const OBSERVATIONS_2: &str = "Observations2";
const SCORE: &str = "Score";
const SCORE_CATEGORY: &str = "Score Category";
const WEIGHTAGE_SCORE: &str = "Weightage Score";

/// Everything the audit concluded about one ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketVerdictSet {
    pub ticket_number: String,
    pub assigned_to: String,
    pub application: String,
    /// One entry per executed rule, in registry order.
    pub verdicts: Vec<(RuleId, Outcome)>,
    pub work_note_feedback: String,
    pub failure_summary: String,
    pub score: u32,
    pub score_category: ScoreCategory,
    pub weighted_score: u32,
}

impl TicketVerdictSet {
    pub fn verdict(&self, rule: RuleId) -> Option<&Outcome> {
        self.verdicts
            .iter()
            .find(|(id, _)| *id == rule)
            .map(|(_, outcome)| outcome)
    }

    fn row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.verdicts.len() + 8);
        row.push(self.ticket_number.clone());
        row.push(self.assigned_to.clone());
        row.push(self.application.clone());
        row.extend(self.verdicts.iter().map(|(_, outcome)| outcome.to_string()));
        row.push(self.work_note_feedback.clone());
        row.push(self.failure_summary.clone());
        row.push(self.score.to_string());
        row.push(self.score_category.label().to_string());
        row.push(self.weighted_score.to_string());
        row
    }
}

/// Verdict table for one batch: a fixed column layout shared by every ticket row.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictTable {
    rules: Vec<RuleId>,
    tickets: Vec<TicketVerdictSet>,
}

impl VerdictTable {
    pub fn new(rules: Vec<RuleId>, tickets: Vec<TicketVerdictSet>) -> Self {
        Self { rules, tickets }
    }

    /// Rules that produced a column, in registry order.
    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    pub fn tickets(&self) -> &[TicketVerdictSet] {
        &self.tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            TICKET_NUMBER.to_string(),
            ASSIGNED_TO.to_string(),
            APPLICATION.to_string(),
        ];
        columns.extend(self.rules.iter().map(|rule| rule.column_label().to_string()));
        columns.extend(
            [
                OBSERVATIONS_1,
                OBSERVATIONS_2,
                SCORE,
                SCORE_CATEGORY,
                WEIGHTAGE_SCORE,
            ]
            .map(String::from),
        );
        columns
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.tickets.iter().map(TicketVerdictSet::row)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.columns())?;
        for row in self.rows() {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}

impl Serialize for VerdictTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<Vec<String>> = self.rows().collect();
        let mut state = serializer.serialize_struct("VerdictTable", 2)?;
        state.serialize_field("columns", &self.columns())?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
