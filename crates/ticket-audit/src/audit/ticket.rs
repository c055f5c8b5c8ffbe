use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use tracing::debug;

use super::timestamps::parse_timestamp;

pub const OPENED: &str = "Opened";
pub const CLOSED: &str = "Closed";
pub const AGE: &str = "Age";

const SECONDS_PER_DAY: f64 = 86_400.0;

static NULL_FIELD: FieldValue = FieldValue::Null;

/// Single cell of an imported ticket row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

impl FieldValue {
    /// Interprets a raw CSV cell the way spreadsheet exports are usually typed.
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Null;
        }

        match trimmed {
            "True" | "TRUE" | "true" => return Self::Bool(true),
            "False" | "FALSE" | "false" => return Self::Bool(false),
            _ => {}
        }

        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Number(number),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            Value::String(text) if text.trim().is_empty() => Self::Null,
            Value::String(text) => Self::Text(text),
            other => Self::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Null, blank, or the literal `None` that ticket exports use for empty cells.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => {
                let trimmed = text.trim();
                trimmed.is_empty() || trimmed == "None"
            }
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(text) => Some(Cow::Borrowed(text.as_str())),
            Self::Number(number) => Some(Cow::Owned(render_number(*number))),
            Self::Bool(true) => Some(Cow::Borrowed("True")),
            Self::Bool(false) => Some(Cow::Borrowed("False")),
            Self::DateTime(value) => Some(Cow::Owned(value.format("%Y-%m-%d %H:%M:%S").to_string())),
            Self::Null => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(value) => Some(*value),
            Self::Text(text) => parse_timestamp(text),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

fn render_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// One row of the incoming batch plus the derived age in days.
#[derive(Debug, Clone, Default)]
pub struct TicketRecord {
    fields: HashMap<String, FieldValue>,
    age: Option<f64>,
}

impl TicketRecord {
    pub fn new(fields: HashMap<String, FieldValue>) -> Self {
        Self { fields, age: None }
    }

    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&NULL_FIELD)
    }

    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.get(field).as_text()
    }

    /// Concatenates the non-null values of `fields` with `separator`.
    pub fn joined_text(&self, fields: &[&str], separator: &str) -> String {
        fields
            .iter()
            .filter_map(|field| self.text(field))
            .collect::<Vec<_>>()
            .join(separator)
    }

    pub fn age(&self) -> Option<f64> {
        self.age
    }

    fn derive_age(&mut self, source: AgeSource) {
        self.age = match source {
            AgeSource::OpenedClosed => {
                match (self.get(OPENED).as_datetime(), self.get(CLOSED).as_datetime()) {
                    (Some(opened), Some(closed)) => {
                        Some((closed - opened).num_seconds() as f64 / SECONDS_PER_DAY)
                    }
                    _ => None,
                }
            }
            AgeSource::Column => self.get(AGE).as_number(),
            AgeSource::Unavailable => None,
        };
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum AgeSource {
    OpenedClosed,
    Column,
    #[default]
    Unavailable,
}

/// Immutable batch of tickets with the column schema they were imported with.
#[derive(Debug, Clone, Default)]
pub struct TicketBatch {
    columns: Vec<String>,
    records: Vec<TicketRecord>,
    age_source: AgeSource,
}

impl TicketBatch {
    /// Builds the batch and computes every ticket's age once.
    pub fn new(columns: Vec<String>, records: Vec<TicketRecord>) -> Self {
        let has = |name: &str| columns.iter().any(|column| column == name);
        let source = if has(OPENED) && has(CLOSED) {
            AgeSource::OpenedClosed
        } else if has(AGE) {
            AgeSource::Column
        } else {
            AgeSource::Unavailable
        };

        let records = records
            .into_iter()
            .map(|mut record| {
                record.derive_age(source);
                record
            })
            .collect();

        debug!(?source, "derived ticket age");

        Self {
            columns,
            records,
            age_source: source,
        }
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, BatchImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|header| header.replace('\u{feff}', "").trim().to_string())
            .collect();

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let fields = columns
                .iter()
                .zip(row.iter())
                .map(|(column, cell)| (column.clone(), FieldValue::from_cell(cell)))
                .collect();
            records.push(TicketRecord::new(fields));
        }

        Ok(Self::new(columns, records))
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, BatchImportError> {
        let rows: Vec<Map<String, Value>> = serde_json::from_reader(reader)?;
        Ok(Self::from_json_rows(rows))
    }

    /// Column order follows first appearance across rows.
    pub fn from_json_rows(rows: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let mut fields = HashMap::with_capacity(row.len());
            for (key, value) in row {
                let key = key.trim().to_string();
                if !columns.contains(&key) {
                    columns.push(key.clone());
                }
                fields.insert(key, FieldValue::from_json(value));
            }
            records.push(TicketRecord::new(fields));
        }

        Self::new(columns, records)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[TicketRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Age counts as present when it is derivable from Opened/Closed.
    pub fn has_field(&self, field: &str) -> bool {
        if self.columns.iter().any(|column| column == field) {
            return true;
        }
        field == AGE && self.age_source == AgeSource::OpenedClosed
    }
}

#[derive(Debug)]
pub enum BatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl fmt::Display for BatchImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchImportError::Io(err) => write!(f, "failed to read ticket batch: {}", err),
            BatchImportError::Csv(err) => write!(f, "invalid ticket CSV data: {}", err),
            BatchImportError::Json(err) => {
                write!(f, "ticket JSON must be an array of objects: {}", err)
            }
        }
    }
}

impl std::error::Error for BatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchImportError::Io(err) => Some(err),
            BatchImportError::Csv(err) => Some(err),
            BatchImportError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BatchImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BatchImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for BatchImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
