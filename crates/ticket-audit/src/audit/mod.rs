//! Ticket quality audit engine.
//!
//! A batch of ticket rows is checked against the selected quality rules; each ticket receives
//! one verdict per rule plus the aggregate scores and reviewer observations.

pub mod calendar;
pub mod canonical;
pub mod config;
pub mod normalizer;
pub mod observations;
pub mod outcome;
pub mod phrases;
pub mod pipeline;
pub mod quality;
pub mod reference;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod ticket;
pub mod timestamps;

#[cfg(test)]
mod tests;

use std::sync::OnceLock;

use regex::Regex;

pub use config::{AuditConfig, AuditConfigError, ScoringPolicy, Thresholds};
pub use outcome::Outcome;
pub use pipeline::AuditEngine;
pub use reference::{CategoryTable, ReferenceData, TableState, TowerTable};
pub use report::{TicketVerdictSet, VerdictTable};
pub use rules::{RuleId, RuleRegistry};
pub use scoring::ScoreCategory;
pub use ticket::{BatchImportError, FieldValue, TicketBatch, TicketRecord};

/// Compiles a built-in pattern on first use.
pub(crate) fn static_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("built-in pattern compiles"))
}
