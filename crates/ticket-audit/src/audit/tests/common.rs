use std::io::Cursor;

use serde_json::{json, Map, Value};

use crate::audit::config::AuditConfig;
use crate::audit::pipeline::AuditEngine;
use crate::audit::reference::{CategoryTable, ReferenceData, TableState, TowerTable};
use crate::audit::report::{TicketVerdictSet, VerdictTable};
use crate::audit::ticket::TicketBatch;

pub(super) const TOWER_CSV: &str = "Application Name,Tower,Assignment group\n\
Outlook,Workplace,Messaging\n\
SAP,Finance,SAP-L2\n";

pub(super) const CATEGORY_CSV: &str = "Keywords,Category,Subcategory\n\
outlook crash,Software,Email\n\
laptop battery,Hardware,Laptop\n";

/// A ticket that passes every field-level check.
pub(super) fn ticket(number: &str) -> Map<String, Value> {
    let row = json!({
        "Number": number,
        "Assigned to": "Sam Lee",
        "Application Name / CI": "Outlook",
        "Assignment Group": "Messaging",
        "Response SLA": "Met",
        "Resolution SLA": "Met",
        "Reopened": "No",
        "Reassignment count": 1,
        "Priority": "P1",
        "Impact": "High",
        "Urgency": "High",
        "Response Time": 2,
        "Knowledge Article Used": "KB0012345",
        "Has Attachments": "Yes",
        "Age": 2,
    });
    match row {
        Value::Object(map) => map,
        other => panic!("expected object, got {other:?}"),
    }
}

pub(super) fn with(mut row: Map<String, Value>, field: &str, value: Value) -> Map<String, Value> {
    row.insert(field.to_string(), value);
    row
}

pub(super) fn without(mut row: Map<String, Value>, field: &str) -> Map<String, Value> {
    row.remove(field);
    row
}

pub(super) fn batch(rows: Vec<Map<String, Value>>) -> TicketBatch {
    TicketBatch::from_json_rows(rows)
}

pub(super) fn config(rules: &str) -> AuditConfig {
    let mut config = AuditConfig::default();
    config.select_rules(rules).expect("known rules");
    config
}

pub(super) fn reference() -> ReferenceData {
    ReferenceData::new(
        TableState::from_result(TowerTable::from_reader(Cursor::new(TOWER_CSV))),
        TableState::from_result(CategoryTable::from_reader(Cursor::new(CATEGORY_CSV))),
    )
}

pub(super) fn run(config: AuditConfig, rows: Vec<Map<String, Value>>) -> VerdictTable {
    AuditEngine::new(config, reference()).run(&batch(rows))
}

pub(super) fn only_ticket(table: &VerdictTable) -> &TicketVerdictSet {
    assert_eq!(table.len(), 1, "expected a single audited ticket");
    &table.tickets()[0]
}
