use std::io::Cursor;
use std::path::Path;

use ticket_audit::audit::{
    AuditConfig, AuditEngine, Outcome, ReferenceData, RuleId, TicketBatch,
};

const BATCH_CSV: &str = "\u{feff}Number,Assigned to,Application Name / CI,Age,Response SLA,Comments and Work notes,Additional comments\n\
INC1001,Sam Lee,Outlook,9,Met,\"2025-10-06 09:00:00 - Sam Lee (Work notes)\n\
First reminder sent to the user asking for the mailbox logs.\n\
2025-10-09 10:00:00 - Sam Lee (Work notes)\n\
Second reminder sent to the user asking for the mailbox logs.\n\
2025-10-13 11:00:00 - Sam Lee (Work notes)\n\
Final reminder sent to the user asking for the mailbox logs.\",\"2025-10-14 15:00:00 - Sam Lee (Additional comments)\n\
Closing the ticket as agreed with the user.\"\n\
INC1002,Ana Ruiz,SAP,1,Breached,,\n";

fn batch() -> TicketBatch {
    TicketBatch::from_csv_reader(Cursor::new(BATCH_CSV)).expect("batch imports")
}

fn engine(config: AuditConfig) -> AuditEngine {
    let reference = ReferenceData::load(
        Path::new("does-not-exist/Tower_Mapping.csv"),
        Path::new("does-not-exist/Category_Subcategory_Mapping.csv"),
    );
    AuditEngine::new(config, reference)
}

#[test]
fn csv_batch_runs_cadence_checks_end_to_end() {
    let config = AuditConfig::from_json_reader(Cursor::new(
        r#"{"selected_rules":["cadence_1_1_1","cadence_3_2_1","response_sla","tower"]}"#,
    ))
    .expect("config parses");
    let table = engine(config).run(&batch());

    assert_eq!(table.len(), 2);
    let aged = &table.tickets()[0];
    assert_eq!(aged.ticket_number, "INC1001");
    assert_eq!(aged.verdict(RuleId::Tower), Some(&Outcome::label("File Missing")));
    assert_eq!(aged.verdict(RuleId::Cadence321), Some(&Outcome::Pass));
    assert_eq!(
        aged.verdict(RuleId::Cadence111),
        Some(&Outcome::label("Fail (first gap > 1 day, second gap > 1 day)"))
    );
    assert_eq!(aged.score, 100);
    assert_eq!(aged.failure_summary, "1-1-1 Check is not followed");

    let young = &table.tickets()[1];
    assert_eq!(
        young.verdict(RuleId::Cadence111),
        Some(&Outcome::label("Age <= Threshold"))
    );
    assert_eq!(young.verdict(RuleId::ResponseSla), Some(&Outcome::Fail));
    assert_eq!(young.score, 0);
    assert_eq!(young.score_category.label(), "<75%");
    assert_eq!(young.work_note_feedback, "No work notes to review");
}

#[test]
fn verdict_table_renders_as_csv() {
    let mut config = AuditConfig::default();
    config
        .select_rules("response_sla, reopened")
        .expect("known rules");
    let table = engine(config).run(&batch());

    let mut output = Vec::new();
    table.write_csv(&mut output).expect("csv renders");
    let text = String::from_utf8(output).expect("utf8 output");
    let mut lines = text.lines();

    assert_eq!(
        lines.next(),
        Some(
            "Ticket Number,Assigned to,Application,Response SLA Met,Reopened?,\
             Observations1,Observations2,Score,Score Category,Weightage Score"
        )
    );
    let second_row = text
        .lines()
        .find(|line| line.starts_with("INC1002"))
        .expect("second ticket row");
    assert!(second_row.contains("Fail,Fail - Missing Column,No work notes to review"));
    assert!(second_row.ends_with(",0,<75%,0"));
}

#[test]
fn json_batch_and_weights_drive_the_weighted_score() {
    let rows = r#"[
        {"Number": "INC2001", "Response SLA": "Met", "Resolution SLA": "Breached"},
        {"Number": "INC2002", "Response SLA": "Met", "Resolution SLA": "Met"}
    ]"#;
    let batch = TicketBatch::from_json_reader(Cursor::new(rows)).expect("json imports");
    let config = AuditConfig::from_json_reader(Cursor::new(
        r#"{"selected_rules":["response_sla","resolution_sla"],
            "weights":{"response_sla":80,"resolution_sla":20}}"#,
    ))
    .expect("config parses");

    let table = engine(config).run(&batch);
    let scores: Vec<(u32, u32)> = table
        .tickets()
        .iter()
        .map(|ticket| (ticket.score, ticket.weighted_score))
        .collect();
    assert_eq!(scores, vec![(50, 80), (100, 100)]);

    let json = serde_json::to_value(&table).expect("table serializes");
    assert_eq!(json["rows"][0][0], "INC2001");
    assert_eq!(json["columns"].as_array().map(Vec::len), Some(3 + 2 + 5));
}
