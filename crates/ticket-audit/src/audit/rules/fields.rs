//! Rules that judge a single ticket field on its own.

use super::field::{
    HAS_ATTACHMENTS, IMPACT, KNOWLEDGE_ARTICLE, PRIORITY, REASSIGNMENT_COUNT, REOPENED,
    RESPONSE_TIME, URGENCY,
};
use super::{Rule, RuleContext, RuleId};
use crate::audit::canonical::{
    canonical_priority, canonical_severity, priority_matches_matrix, PriorityLevel,
};
use crate::audit::config::Thresholds;
use crate::audit::outcome::Outcome;
use crate::audit::ticket::{FieldValue, TicketRecord};

const FALLBACK_TIER: &str = "2-High";
const FALLBACK_TIER_MINUTES: f64 = 30.0;

fn format_threshold(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Minimum length of a description field, spaces excluded.
pub(super) struct DescriptionLength {
    pub id: RuleId,
    pub field: &'static str,
    pub minimum: fn(&Thresholds) -> usize,
}

impl Rule for DescriptionLength {
    fn id(&self) -> RuleId {
        self.id
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let Some(text) = ticket.text(self.field) else {
            return Outcome::Fail;
        };
        if text.trim().is_empty() {
            return Outcome::Fail;
        }
        let length = text.chars().filter(|c| *c != ' ').count();
        Outcome::from_bool(length >= (self.minimum)(ctx.thresholds))
    }
}

/// Minutes to first response, tiered by priority when the batch allows it.
pub(super) struct ResponseTimeRule;

impl Rule for ResponseTimeRule {
    fn id(&self) -> RuleId {
        RuleId::ResponseTime
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let Some(minutes) = ticket.get(RESPONSE_TIME).as_number() else {
            return Outcome::Fail;
        };

        let tiers = &ctx.thresholds.response_time_by_priority;
        if tiers.is_empty() || !ctx.batch_has_priority {
            return Outcome::from_bool(minutes <= ctx.thresholds.response_time);
        }

        let level: Option<PriorityLevel> = ticket
            .text(PRIORITY)
            .and_then(|raw| canonical_priority(&raw))
            .and_then(|canonical| canonical.known());

        match level.and_then(|level| tiers.get(level.label()).map(|limit| (level, *limit))) {
            Some((level, limit)) if minutes > limit => Outcome::label(format!(
                "Fail (>{}min for {})",
                format_threshold(limit),
                level.label()
            )),
            Some(_) => Outcome::Pass,
            None => {
                let limit = tiers
                    .get(FALLBACK_TIER)
                    .copied()
                    .unwrap_or(FALLBACK_TIER_MINUTES);
                if minutes > limit {
                    Outcome::label(format!("Fail (>{}min)", format_threshold(limit)))
                } else {
                    Outcome::Pass
                }
            }
        }
    }
}

/// SLA flag: empty, `Breached`, `Missed` or `True` mean the SLA was not met.
pub(super) struct SlaMet {
    pub id: RuleId,
    pub field: &'static str,
}

impl Rule for SlaMet {
    fn id(&self) -> RuleId {
        self.id
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let Some(value) = ticket.text(self.field) else {
            return Outcome::Fail;
        };
        let breached = matches!(
            value.trim().to_lowercase().as_str(),
            "breached" | "true" | "missed"
        );
        Outcome::from_bool(!breached)
    }
}

pub(super) struct KbaTagged;

impl Rule for KbaTagged {
    fn id(&self) -> RuleId {
        RuleId::KbaTagged
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let value = ticket
            .text(KNOWLEDGE_ARTICLE)
            .map(|text| text.to_uppercase())
            .unwrap_or_default();
        Outcome::from_bool(value.contains("KB") || value.contains("TRUE"))
    }
}

pub(super) struct ReopenedRule;

impl Rule for ReopenedRule {
    fn id(&self) -> RuleId {
        RuleId::Reopened
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let value = ticket.get(REOPENED);
        if let FieldValue::Bool(reopened) = value {
            return Outcome::from_bool(!reopened);
        }
        if let FieldValue::Number(count) = value {
            return Outcome::from_bool(*count <= 0.0);
        }

        let Some(text) = value.as_text() else {
            return Outcome::Fail;
        };
        let cleaned = text
            .replace('\u{a0}', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match cleaned.as_str() {
            "" | "none" => Outcome::Fail,
            "true" | "yes" | "y" | "1" => Outcome::Fail,
            "false" | "no" | "n" | "0" => Outcome::Pass,
            other => match other.parse::<f64>() {
                Ok(count) => Outcome::from_bool(count <= 0.0),
                Err(_) => Outcome::Fail,
            },
        }
    }
}

pub(super) struct TicketAgeing;

impl Rule for TicketAgeing {
    fn id(&self) -> RuleId {
        RuleId::TicketAgeing
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        match ticket.age() {
            Some(age) => Outcome::from_bool(age <= ctx.thresholds.max_age_days),
            None => Outcome::Fail,
        }
    }
}

pub(super) struct ReassignmentRule;

impl Rule for ReassignmentRule {
    fn id(&self) -> RuleId {
        RuleId::Reassignment
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        match ticket.get(REASSIGNMENT_COUNT).as_number() {
            Some(count) => Outcome::from_bool(count < ctx.thresholds.max_reassignments),
            None => Outcome::Fail,
        }
    }
}

/// Informational flag; never scored.
pub(super) struct HasAttachmentsRule;

impl Rule for HasAttachmentsRule {
    fn id(&self) -> RuleId {
        RuleId::HasAttachments
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let value = ticket.get(HAS_ATTACHMENTS);
        if value.is_absent() {
            return Outcome::label("No data found");
        }
        let text = value.to_string().to_uppercase();
        if text.contains("TRUE") || text.contains("YES") {
            Outcome::label("Has attachment")
        } else {
            Outcome::label("No attachment")
        }
    }
}

/// Priority must be the matrix value for the ticket's impact and urgency.
pub(super) struct PriorityMatrixRule;

impl Rule for PriorityMatrixRule {
    fn id(&self) -> RuleId {
        RuleId::PriorityMatrix
    }

    fn evaluate(&self, ticket: &TicketRecord, _ctx: &RuleContext<'_>) -> Outcome {
        let priority = ticket.text(PRIORITY).and_then(|raw| canonical_priority(&raw));
        let impact = ticket.text(IMPACT).and_then(|raw| canonical_severity(&raw));
        let urgency = ticket.text(URGENCY).and_then(|raw| canonical_severity(&raw));

        match (impact, urgency, priority) {
            (Some(impact), Some(urgency), Some(priority)) => {
                Outcome::from_bool(priority_matches_matrix(&impact, &urgency, &priority))
            }
            _ => Outcome::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::reference::ReferenceData;
    use std::collections::HashMap;

    fn ticket(fields: &[(&str, FieldValue)]) -> TicketRecord {
        TicketRecord::new(
            fields
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    fn evaluate(rule: &dyn Rule, record: &TicketRecord, has_priority: bool) -> Outcome {
        let thresholds = Thresholds::default();
        let reference = ReferenceData::unavailable();
        let ctx = RuleContext {
            thresholds: &thresholds,
            reference: &reference,
            batch_has_priority: has_priority,
        };
        rule.evaluate(record, &ctx)
    }

    #[test]
    fn description_length_ignores_spaces() {
        let rule = DescriptionLength {
            id: RuleId::ShortDescriptionLength,
            field: "Short description",
            minimum: |_| 10,
        };
        assert_eq!(
            evaluate(&rule, &ticket(&[("Short description", text("a b c d e f g h i j"))]), false),
            Outcome::Pass
        );
        assert_eq!(
            evaluate(&rule, &ticket(&[("Short description", text("a b c d e f g h i"))]), false),
            Outcome::Fail
        );
        assert_eq!(evaluate(&rule, &ticket(&[]), false), Outcome::Fail);
    }

    #[test]
    fn response_time_uses_priority_tiers() {
        let critical = ticket(&[
            ("Response Time", FieldValue::Number(12.0)),
            ("Priority", text("P1")),
        ]);
        assert_eq!(
            evaluate(&ResponseTimeRule, &critical, true),
            Outcome::label("Fail (>5min for 1-Critical)")
        );

        let unknown = ticket(&[
            ("Response Time", FieldValue::Number(45.0)),
            ("Priority", text("whenever")),
        ]);
        assert_eq!(
            evaluate(&ResponseTimeRule, &unknown, true),
            Outcome::label("Fail (>30min)")
        );

        let medium = ticket(&[
            ("Response Time", FieldValue::Number(90.0)),
            ("Priority", text("3 - Medium")),
        ]);
        assert_eq!(evaluate(&ResponseTimeRule, &medium, true), Outcome::Pass);
    }

    #[test]
    fn response_time_falls_back_without_priority_column() {
        let record = ticket(&[("Response Time", FieldValue::Number(12.0))]);
        assert_eq!(evaluate(&ResponseTimeRule, &record, false), Outcome::Fail);

        let record = ticket(&[("Response Time", text("soon"))]);
        assert_eq!(evaluate(&ResponseTimeRule, &record, true), Outcome::Fail);
    }

    #[test]
    fn sla_flags() {
        let rule = SlaMet {
            id: RuleId::ResponseSla,
            field: "Response SLA",
        };
        let check = |value: FieldValue| evaluate(&rule, &ticket(&[("Response SLA", value)]), false);
        assert_eq!(check(text("Breached")), Outcome::Fail);
        assert_eq!(check(text("Met")), Outcome::Pass);
        assert_eq!(check(FieldValue::Null), Outcome::Fail);
        assert_eq!(check(FieldValue::Bool(true)), Outcome::Fail);
        assert_eq!(check(FieldValue::Bool(false)), Outcome::Pass);
    }

    #[test]
    fn reopened_values() {
        let check = |value: FieldValue| evaluate(&ReopenedRule, &ticket(&[("Reopened", value)]), false);
        assert_eq!(check(FieldValue::Bool(false)), Outcome::Pass);
        assert_eq!(check(FieldValue::Bool(true)), Outcome::Fail);
        assert_eq!(check(FieldValue::Number(0.0)), Outcome::Pass);
        assert_eq!(check(FieldValue::Number(2.0)), Outcome::Fail);
        assert_eq!(check(text(" No ")), Outcome::Pass);
        assert_eq!(check(text("None")), Outcome::Fail);
        assert_eq!(check(text("maybe")), Outcome::Fail);
        assert_eq!(check(FieldValue::Null), Outcome::Fail);
    }

    #[test]
    fn ageing_and_reassignment_thresholds() {
        let mut young = ticket(&[("Reassignment count", FieldValue::Number(2.0))]);
        assert_eq!(evaluate(&TicketAgeing, &young, false), Outcome::Fail);
        assert_eq!(evaluate(&ReassignmentRule, &young, false), Outcome::Pass);

        young = ticket(&[("Reassignment count", FieldValue::Number(3.0))]);
        assert_eq!(evaluate(&ReassignmentRule, &young, false), Outcome::Fail);
        assert_eq!(evaluate(&ReassignmentRule, &ticket(&[]), false), Outcome::Fail);
    }

    #[test]
    fn attachments_and_kba() {
        let check = |value: FieldValue| {
            evaluate(&HasAttachmentsRule, &ticket(&[("Has Attachments", value)]), false)
        };
        assert_eq!(check(FieldValue::Bool(true)), Outcome::label("Has attachment"));
        assert_eq!(check(text("no")), Outcome::label("No attachment"));
        assert_eq!(check(text("None")), Outcome::label("No data found"));

        let kba = ticket(&[("Knowledge Article Used", text("kb0012345"))]);
        assert_eq!(evaluate(&KbaTagged, &kba, false), Outcome::Pass);
        assert_eq!(evaluate(&KbaTagged, &ticket(&[]), false), Outcome::Fail);
    }

    #[test]
    fn priority_matrix_membership() {
        let record = ticket(&[
            ("Priority", text("P1")),
            ("Impact", text("High")),
            ("Urgency", text("High")),
        ]);
        assert_eq!(evaluate(&PriorityMatrixRule, &record, false), Outcome::Pass);

        let record = ticket(&[
            ("Priority", text("4 - Low")),
            ("Impact", text("1-High")),
            ("Urgency", text("1-High")),
        ]);
        assert_eq!(evaluate(&PriorityMatrixRule, &record, false), Outcome::Fail);

        let record = ticket(&[("Priority", text("P1")), ("Impact", text("None"))]);
        assert_eq!(evaluate(&PriorityMatrixRule, &record, false), Outcome::Fail);
    }
}
