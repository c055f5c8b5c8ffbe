//! Rules that consult the reference tables.

use tracing::debug;

use super::field::{APPLICATION, ASSIGNMENT_GROUP, CATEGORY, DESCRIPTION, NUMBER, SUBCATEGORY};
use super::{Rule, RuleContext, RuleId};
use crate::audit::outcome::Outcome;
use crate::audit::reference::TableState;
use crate::audit::ticket::TicketRecord;

const UNKNOWN_TOWER: &str = "Unknown Tower";
const INVALID_FILE: &str = "Invalid File";

/// Informational tower column looked up from the application name.
pub(super) struct TowerRule;

impl Rule for TowerRule {
    fn id(&self) -> RuleId {
        RuleId::Tower
    }

    fn precheck(&self, ctx: &RuleContext<'_>) -> Option<Outcome> {
        ctx.reference.tower.fallback_label().map(Outcome::label)
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let Some(table) = ctx.reference.tower.table() else {
            return Outcome::label(UNKNOWN_TOWER);
        };
        let application = ticket.text(APPLICATION);
        match application.as_deref().and_then(|app| table.tower_for(app)) {
            Some(tower) => Outcome::label(tower),
            None => {
                debug!(
                    ticket = %ticket.get(NUMBER),
                    application = application.as_deref().unwrap_or_default(),
                    "application has no tower mapping"
                );
                Outcome::label(UNKNOWN_TOWER)
            }
        }
    }
}

/// The assignment group must be one the application is mapped to.
pub(super) struct AssignmentGroupRule;

impl Rule for AssignmentGroupRule {
    fn id(&self) -> RuleId {
        RuleId::AssignmentGroup
    }

    fn precheck(&self, ctx: &RuleContext<'_>) -> Option<Outcome> {
        match &ctx.reference.tower {
            TableState::Loaded(table) if !table.has_groups() => Some(Outcome::label(INVALID_FILE)),
            state => state.fallback_label().map(Outcome::label),
        }
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let Some(table) = ctx.reference.tower.table() else {
            return Outcome::Fail;
        };
        match (ticket.text(APPLICATION), ticket.text(ASSIGNMENT_GROUP)) {
            (Some(application), Some(group)) => Outcome::from_bool(table.serves(&application, &group)),
            _ => Outcome::Fail,
        }
    }
}

/// The description's best keyword match must agree with the ticket's category.
pub(super) struct CategoryRule;

impl Rule for CategoryRule {
    fn id(&self) -> RuleId {
        RuleId::CategoryMatch
    }

    fn precheck(&self, ctx: &RuleContext<'_>) -> Option<Outcome> {
        ctx.reference.category.fallback_label().map(Outcome::label)
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        let Some(table) = ctx.reference.category.table() else {
            return Outcome::Fail;
        };
        let (Some(description), Some(category)) = (ticket.text(DESCRIPTION), ticket.text(CATEGORY))
        else {
            return Outcome::Fail;
        };
        let subcategory = ticket.text(SUBCATEGORY);
        Outcome::from_bool(table.validates(&description, &category, subcategory.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::config::Thresholds;
    use crate::audit::reference::{CategoryTable, ReferenceData, TowerTable};
    use crate::audit::ticket::FieldValue;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn reference(towers: &str) -> ReferenceData {
        let tower = TableState::from_result(TowerTable::from_reader(Cursor::new(towers.to_string())));
        let category = TableState::from_result(CategoryTable::from_reader(Cursor::new(
            "Keywords,Category,Subcategory\noutlook crash,Software,Email\n",
        )));
        ReferenceData::new(tower, category)
    }

    fn ticket(fields: &[(&str, &str)]) -> TicketRecord {
        TicketRecord::new(
            fields
                .iter()
                .map(|(name, value)| (name.to_string(), FieldValue::from_cell(value)))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn run(rule: &dyn Rule, reference: &ReferenceData, record: &TicketRecord) -> Outcome {
        let thresholds = Thresholds::default();
        let ctx = RuleContext {
            thresholds: &thresholds,
            reference,
            batch_has_priority: false,
        };
        rule.precheck(&ctx)
            .unwrap_or_else(|| rule.evaluate(record, &ctx))
    }

    #[test]
    fn tower_is_looked_up_or_reported_unknown() {
        let data = reference("Application Name,Tower,Assignment group\nOutlook,Workplace,Messaging\n");
        let mapped = ticket(&[("Application Name / CI", "outlook")]);
        let unmapped = ticket(&[("Application Name / CI", "Teams")]);

        assert_eq!(run(&TowerRule, &data, &mapped), Outcome::label("Workplace"));
        assert_eq!(run(&TowerRule, &data, &unmapped), Outcome::label("Unknown Tower"));
    }

    #[test]
    fn table_failures_apply_to_the_whole_batch() {
        let record = ticket(&[("Application Name / CI", "Outlook")]);
        assert_eq!(
            run(&TowerRule, &ReferenceData::unavailable(), &record),
            Outcome::label("File Missing")
        );

        let no_groups = reference("Application Name,Tower\nOutlook,Workplace\n");
        assert_eq!(
            run(&AssignmentGroupRule, &no_groups, &record),
            Outcome::label("Invalid File")
        );
    }

    #[test]
    fn assignment_group_must_be_mapped_to_application() {
        let data = reference(
            "Application Name,Tower,Assignment group\nOutlook,Workplace,Messaging\nSAP,Finance,SAP-L2\n",
        );
        let right = ticket(&[
            ("Application Name / CI", "Outlook"),
            ("Assignment Group", " messaging "),
        ]);
        let wrong = ticket(&[
            ("Application Name / CI", "Outlook"),
            ("Assignment Group", "SAP-L2"),
        ]);
        assert_eq!(run(&AssignmentGroupRule, &data, &right), Outcome::Pass);
        assert_eq!(run(&AssignmentGroupRule, &data, &wrong), Outcome::Fail);
    }

    #[test]
    fn category_follows_keyword_match() {
        let data = reference("Application Name,Tower,Assignment group\n");
        let record = ticket(&[
            ("Description", "Outlook crash on launch after update"),
            ("Category", "Software"),
            ("Subcategory", "email"),
        ]);
        assert_eq!(run(&CategoryRule, &data, &record), Outcome::Pass);

        let record = ticket(&[("Description", "Outlook crash"), ("Category", "Hardware")]);
        assert_eq!(run(&CategoryRule, &data, &record), Outcome::Fail);
    }
}
