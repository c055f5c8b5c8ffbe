use super::common::*;
use crate::audit::config::ScoringPolicy;
use crate::audit::outcome::Outcome;
use crate::audit::pipeline::AuditEngine;
use crate::audit::reference::ReferenceData;
use crate::audit::rules::RuleId;
use serde_json::{json, Value};

#[test]
fn verdict_columns_follow_registry_order() {
    let table = run(config("reopened, response_sla, tower"), vec![ticket("INC0001")]);

    assert_eq!(
        table.rules(),
        &[RuleId::Tower, RuleId::ResponseSla, RuleId::Reopened]
    );
    let verdicts = only_ticket(&table);
    assert_eq!(verdicts.verdict(RuleId::Tower), Some(&Outcome::label("Workplace")));
    assert_eq!(verdicts.verdict(RuleId::ResponseSla), Some(&Outcome::Pass));
    assert_eq!(verdicts.verdict(RuleId::Reopened), Some(&Outcome::Pass));
}

#[test]
fn identifiers_and_observations_pass_through() {
    let table = run(config("response_sla"), vec![ticket("INC0042")]);
    let verdicts = only_ticket(&table);

    assert_eq!(verdicts.ticket_number, "INC0042");
    assert_eq!(verdicts.assigned_to, "Sam Lee");
    assert_eq!(verdicts.application, "Outlook");
    assert_eq!(verdicts.work_note_feedback, "No work notes to review");
    assert_eq!(
        verdicts.failure_summary,
        "All key quality checks passed for this ticket."
    );
    assert_eq!(verdicts.score, 100);
    assert_eq!(verdicts.weighted_score, 100);
}

#[test]
fn missing_column_fails_every_ticket_without_moving_the_score() {
    let rows = vec![
        without(ticket("INC0001"), "Reopened"),
        without(ticket("INC0002"), "Reopened"),
    ];
    let table = run(config("response_sla, reopened, reassignment"), rows.clone());

    for verdicts in table.tickets() {
        assert_eq!(verdicts.verdict(RuleId::Reopened), Some(&Outcome::MissingColumn));
        assert_eq!(verdicts.score, 100);
        assert_eq!(verdicts.failure_summary, "Ticket is reopened");
    }

    let mut strict = config("response_sla, reopened, reassignment");
    strict.scoring = ScoringPolicy {
        missing_column_counts_as_fail: true,
    };
    let table = run(strict, rows);
    for verdicts in table.tickets() {
        assert_eq!(verdicts.score, 67);
        assert_eq!(verdicts.score_category.label(), "<75%");
    }
}

#[test]
fn sla_flags_across_a_batch() {
    let rows = vec![
        with(ticket("INC0001"), "Response SLA", json!("Breached")),
        with(ticket("INC0002"), "Response SLA", json!("Met")),
        with(ticket("INC0003"), "Response SLA", Value::Null),
    ];
    let table = run(config("response_sla"), rows);

    let verdicts: Vec<&Outcome> = table
        .tickets()
        .iter()
        .filter_map(|ticket| ticket.verdict(RuleId::ResponseSla))
        .collect();
    assert_eq!(verdicts, vec![&Outcome::Fail, &Outcome::Pass, &Outcome::Fail]);
    assert_eq!(table.tickets()[0].failure_summary, "Response SLA is breached");
}

#[test]
fn critical_priority_with_high_impact_and_urgency_passes() {
    let table = run(config("priority_matrix"), vec![ticket("INC0001")]);
    assert_eq!(
        only_ticket(&table).verdict(RuleId::PriorityMatrix),
        Some(&Outcome::Pass)
    );

    let low = with(ticket("INC0002"), "Priority", json!("P4"));
    let table = run(config("priority_matrix"), vec![low]);
    assert_eq!(
        only_ticket(&table).verdict(RuleId::PriorityMatrix),
        Some(&Outcome::Fail)
    );
}

#[test]
fn unavailable_reference_tables_label_the_whole_batch() {
    let rows = vec![
        with(ticket("INC0001"), "Description", json!("Outlook crash")),
        with(ticket("INC0002"), "Description", json!("Outlook crash")),
    ];
    let rows: Vec<_> = rows
        .into_iter()
        .map(|row| with(row, "Category", json!("Software")))
        .map(|row| with(row, "Subcategory", json!("Email")))
        .collect();
    let engine = AuditEngine::new(
        config("tower, assignment_group, category_match"),
        ReferenceData::unavailable(),
    );
    let table = engine.run(&batch(rows));

    for verdicts in table.tickets() {
        for rule in [RuleId::Tower, RuleId::AssignmentGroup, RuleId::CategoryMatch] {
            assert_eq!(verdicts.verdict(rule), Some(&Outcome::label("File Missing")));
        }
        assert_eq!(verdicts.score, 0);
        assert_eq!(
            verdicts.failure_summary,
            "All key quality checks passed for this ticket."
        );
    }
}

#[test]
fn loaded_reference_tables_judge_each_ticket() {
    let right = with(ticket("INC0001"), "Description", json!("Outlook crash on launch"));
    let right = with(with(right, "Category", json!("Software")), "Subcategory", json!("Email"));
    let wrong = with(
        with(ticket("INC0002"), "Assignment Group", json!("SAP-L2")),
        "Application Name / CI",
        json!("Teams"),
    );
    let wrong = with(wrong, "Description", json!("Laptop battery drains"));
    let wrong = with(with(wrong, "Category", json!("Software")), "Subcategory", json!("Email"));

    let table = run(
        config("tower, assignment_group, category_match"),
        vec![right, wrong],
    );
    let first = &table.tickets()[0];
    let second = &table.tickets()[1];

    assert_eq!(first.verdict(RuleId::Tower), Some(&Outcome::label("Workplace")));
    assert_eq!(first.verdict(RuleId::AssignmentGroup), Some(&Outcome::Pass));
    assert_eq!(first.verdict(RuleId::CategoryMatch), Some(&Outcome::Pass));
    assert_eq!(first.score, 100);

    assert_eq!(second.verdict(RuleId::Tower), Some(&Outcome::label("Unknown Tower")));
    assert_eq!(second.verdict(RuleId::AssignmentGroup), Some(&Outcome::Fail));
    assert_eq!(second.verdict(RuleId::CategoryMatch), Some(&Outcome::Fail));
    assert_eq!(second.score, 0);
}

#[test]
fn age_is_derived_from_opened_and_closed() {
    let row = without(ticket("INC0001"), "Age");
    let row = with(row, "Opened", json!("2025-10-01 09:00:00"));
    let row = with(row, "Closed", json!("2025-10-30 09:00:00"));
    let table = run(config("ticket_ageing"), vec![row]);

    assert_eq!(
        only_ticket(&table).verdict(RuleId::TicketAgeing),
        Some(&Outcome::Fail)
    );
    assert_eq!(
        only_ticket(&table).failure_summary,
        "Ticket is ageing > 20 days"
    );
}

#[test]
fn empty_batch_produces_an_empty_table_with_columns() {
    let table = run(config("response_sla, reopened"), Vec::new());
    assert!(table.is_empty());
    assert_eq!(table.rules(), &[RuleId::ResponseSla, RuleId::Reopened]);
    assert_eq!(table.columns().len(), 3 + 2 + 5);
}
