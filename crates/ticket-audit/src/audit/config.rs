use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::rules::RuleId;

const TOTAL_WEIGHT: u32 = 100;

/// Validation errors raised while loading an audit configuration.
#[derive(Debug, thiserror::Error)]
pub enum AuditConfigError {
    #[error("failed to read audit configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid audit configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown rule '{0}'")]
    UnknownRule(String),
    #[error("weight for {rule} must be within 0-100 (found {weight})")]
    WeightOutOfRange { rule: RuleId, weight: u32 },
    #[error("total assigned weight {total} exceeds 100")]
    TotalWeightExceeded { total: u32 },
}

/// Numeric and template dials read by the rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub short_desc: usize,
    pub long_desc: usize,
    /// Single response-time ceiling in minutes, used when no tiered map applies.
    pub response_time: f64,
    pub response_time_by_priority: BTreeMap<String, f64>,
    pub worknote: usize,
    #[serde(alias = "Resolution_notes_value", alias = "Additional_comments_value")]
    pub resolution_notes: usize,
    #[serde(alias = "Age Value")]
    pub max_age_days: f64,
    #[serde(alias = "Reassignment threshold")]
    pub max_reassignments: f64,
    pub ticket_update_days: i64,
    #[serde(alias = "1-1-1 Check")]
    pub cadence_1_1_1: f64,
    #[serde(alias = "2-2-1 Check")]
    pub cadence_2_2_1: f64,
    #[serde(alias = "3-2-1 Check")]
    pub cadence_3_2_1: f64,
    #[serde(alias = "3_strike_closure_threshold")]
    pub reminder_closure_days: f64,
    #[serde(alias = "Acknowledgment_notes_template")]
    pub acknowledgment_template: String,
    #[serde(alias = "Resolution_summary_template")]
    pub resolution_template: String,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            short_desc: 50,
            long_desc: 150,
            response_time: 10.0,
            response_time_by_priority: BTreeMap::from([
                ("1-Critical".to_string(), 5.0),
                ("2-High".to_string(), 30.0),
                ("3-Medium".to_string(), 120.0),
                ("4-Low".to_string(), 1440.0),
            ]),
            worknote: 100,
            resolution_notes: 50,
            max_age_days: 20.0,
            max_reassignments: 3.0,
            ticket_update_days: 2,
            cadence_1_1_1: 3.0,
            cadence_2_2_1: 3.0,
            cadence_3_2_1: 3.0,
            reminder_closure_days: 3.0,
            acknowledgment_template: "Thank you for reaching out to us.".to_string(),
            resolution_template: "Enter Resolution/Closure Summary here".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub missing_column_counts_as_fail: bool,
}

/// Everything a caller chooses for one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub selected_rules: Vec<RuleId>,
    pub thresholds: Thresholds,
    pub weights: BTreeMap<RuleId, u32>,
    pub scoring: ScoringPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            selected_rules: RuleId::ALL.to_vec(),
            thresholds: Thresholds::default(),
            weights: BTreeMap::new(),
            scoring: ScoringPolicy::default(),
        }
    }
}

impl AuditConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AuditConfigError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(file)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, AuditConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the rule selection with a comma-separated list of ids or display names.
    pub fn select_rules(&mut self, list: &str) -> Result<(), AuditConfigError> {
        let mut selected = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let rule: RuleId = entry
                .parse()
                .map_err(|_| AuditConfigError::UnknownRule(entry.to_string()))?;
            if !selected.contains(&rule) {
                selected.push(rule);
            }
        }
        self.selected_rules = selected;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AuditConfigError> {
        let mut total = 0;
        for (rule, weight) in &self.weights {
            if *weight > TOTAL_WEIGHT {
                return Err(AuditConfigError::WeightOutOfRange {
                    rule: *rule,
                    weight: *weight,
                });
            }
            total += weight;
        }
        if total > TOTAL_WEIGHT {
            return Err(AuditConfigError::TotalWeightExceeded { total });
        }
        Ok(())
    }

    pub fn is_selected(&self, rule: RuleId) -> bool {
        self.selected_rules.contains(&rule)
    }

    /// Weights actually applied to the weighted score, or `None` when weighting is off.
    ///
    /// Unassigned weight (100 minus the configured total) is split by integer division
    /// across the selected scoring rules left at zero.
    pub fn effective_weights(&self) -> Option<BTreeMap<RuleId, u32>> {
        let scoring_rules: Vec<RuleId> = RuleId::ALL
            .into_iter()
            .filter(|rule| rule.is_scored() && self.is_selected(*rule))
            .collect();

        let mut weights: BTreeMap<RuleId, u32> = scoring_rules
            .iter()
            .map(|rule| (*rule, self.weights.get(rule).copied().unwrap_or(0)))
            .collect();

        let assigned: u32 = weights.values().sum();
        if assigned == 0 {
            return None;
        }

        let unassigned: Vec<RuleId> = weights
            .iter()
            .filter(|(_, weight)| **weight == 0)
            .map(|(rule, _)| *rule)
            .collect();
        if !unassigned.is_empty() && assigned < TOTAL_WEIGHT {
            let share = (TOTAL_WEIGHT - assigned) / unassigned.len() as u32;
            for rule in unassigned {
                weights.insert(rule, share);
            }
        }

        Some(weights)
    }
}
