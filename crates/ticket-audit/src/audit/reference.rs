use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use super::normalizer::compact;
use super::phrases::tokenize;

const APPLICATION_COLUMN: &str = "Application Name";
const TOWER_COLUMN: &str = "Tower";
const GROUP_COLUMN: &str = "Assignment group";
const KEYWORDS_COLUMN: &str = "Keywords";
const CATEGORY_COLUMN: &str = "Category";
const SUBCATEGORY_COLUMN: &str = "Subcategory";

#[derive(Debug, thiserror::Error)]
pub enum ReferenceTableError {
    #[error("reference table not found")]
    NotFound,
    #[error("reference table lacks required columns: {0:?}")]
    MissingColumns(Vec<String>),
    #[error("failed to read reference table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed reference table: {0}")]
    Csv(#[from] csv::Error),
}

/// Outcome of loading one lookup table; failures become batch-wide verdict labels.
#[derive(Debug, Clone)]
pub enum TableState<T> {
    Loaded(T),
    Missing,
    Invalid,
    Unreadable,
}

impl<T> TableState<T> {
    pub fn from_result(result: Result<T, ReferenceTableError>) -> Self {
        match result {
            Ok(table) => TableState::Loaded(table),
            Err(ReferenceTableError::NotFound) => TableState::Missing,
            Err(ReferenceTableError::MissingColumns(_)) => TableState::Invalid,
            Err(ReferenceTableError::Io(_) | ReferenceTableError::Csv(_)) => TableState::Unreadable,
        }
    }

    pub fn table(&self) -> Option<&T> {
        match self {
            TableState::Loaded(table) => Some(table),
            _ => None,
        }
    }

    /// Label every ticket receives when the table cannot be used.
    pub fn fallback_label(&self) -> Option<&'static str> {
        match self {
            TableState::Loaded(_) => None,
            TableState::Missing => Some("File Missing"),
            TableState::Invalid => Some("Invalid File"),
            TableState::Unreadable => Some("File Error"),
        }
    }
}

fn lookup_key(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[derive(Debug, Clone)]
struct TowerRow {
    application: String,
    tower: Option<String>,
    group: Option<String>,
}

/// Application -> tower / assignment group mapping.
#[derive(Debug, Clone, Default)]
pub struct TowerTable {
    rows: Vec<TowerRow>,
    has_groups: bool,
}

impl TowerTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let columns = ColumnIndex::new(&headers);

        let application = columns.require(APPLICATION_COLUMN);
        let tower = columns.require(TOWER_COLUMN);
        let (application, tower) = match (application, tower) {
            (Some(application), Some(tower)) => (application, tower),
            _ => {
                return Err(ReferenceTableError::MissingColumns(
                    columns.missing(&[APPLICATION_COLUMN, TOWER_COLUMN]),
                ))
            }
        };
        let group = columns.require(GROUP_COLUMN);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let cell = |index: usize| {
                record
                    .get(index)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let Some(app) = cell(application) else {
                continue;
            };
            rows.push(TowerRow {
                application: lookup_key(&app),
                tower: cell(tower),
                group: group.and_then(|index| cell(index)),
            });
        }

        Ok(Self {
            rows,
            has_groups: group.is_some(),
        })
    }

    pub fn has_groups(&self) -> bool {
        self.has_groups
    }

    /// First tower listed for the application.
    pub fn tower_for(&self, application: &str) -> Option<&str> {
        let key = lookup_key(application);
        self.rows
            .iter()
            .find(|row| row.application == key)
            .and_then(|row| row.tower.as_deref())
    }

    pub fn serves(&self, application: &str, group: &str) -> bool {
        let app_key = lookup_key(application);
        let group_key = lookup_key(group);
        self.rows
            .iter()
            .filter(|row| row.application == app_key)
            .filter_map(|row| row.group.as_deref())
            .any(|candidate| lookup_key(candidate) == group_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub tokens: BTreeSet<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// Keyword -> category / subcategory mapping, most specific keyword sets first.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    rows: Vec<CategoryRow>,
}

fn category_key(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    Some(compact(trimmed))
}

impl CategoryTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let columns = ColumnIndex::new(&headers);

        let (keywords, category) = match (
            columns.require(KEYWORDS_COLUMN),
            columns.require(CATEGORY_COLUMN),
        ) {
            (Some(keywords), Some(category)) => (keywords, category),
            _ => {
                return Err(ReferenceTableError::MissingColumns(
                    columns.missing(&[KEYWORDS_COLUMN, CATEGORY_COLUMN]),
                ))
            }
        };
        let subcategory = columns.require(SUBCATEGORY_COLUMN);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let tokens = tokenize(record.get(keywords).unwrap_or_default());
            if tokens.is_empty() {
                continue;
            }
            rows.push(CategoryRow {
                tokens,
                category: record.get(category).and_then(category_key),
                subcategory: subcategory
                    .and_then(|index| record.get(index))
                    .and_then(category_key),
            });
        }

        Ok(Self::from_rows(rows))
    }

    pub fn from_rows(mut rows: Vec<CategoryRow>) -> Self {
        rows.sort_by(|a, b| b.tokens.len().cmp(&a.tokens.len()));
        Self { rows }
    }

    /// Largest keyword set fully contained in the description tokens.
    pub fn best_match(&self, description: &BTreeSet<String>) -> Option<&CategoryRow> {
        self.rows
            .iter()
            .find(|row| row.tokens.is_subset(description))
    }

    /// Whether the ticket's own category (and subcategory when both sides have one) agrees.
    pub fn validates(&self, description: &str, category: &str, subcategory: Option<&str>) -> bool {
        let tokens = tokenize(description);
        if tokens.is_empty() {
            return false;
        }
        let Some(row) = self.best_match(&tokens) else {
            return false;
        };

        match (row.category.as_deref(), category_key(category)) {
            (Some(expected), Some(actual)) if expected == actual => {}
            _ => return false,
        }

        match (row.subcategory.as_deref(), subcategory.and_then(category_key)) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        }
    }
}

struct ColumnIndex<'a> {
    headers: &'a csv::StringRecord,
}

impl<'a> ColumnIndex<'a> {
    fn new(headers: &'a csv::StringRecord) -> Self {
        Self { headers }
    }

    fn require(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.replace('\u{feff}', "").trim() == name)
    }

    fn missing(&self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|name| self.require(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }
}

/// Both lookup tables, loaded once per batch and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub tower: TableState<TowerTable>,
    pub category: TableState<CategoryTable>,
}

impl ReferenceData {
    pub fn new(tower: TableState<TowerTable>, category: TableState<CategoryTable>) -> Self {
        Self { tower, category }
    }

    /// Loads both tables; a failure only degrades the rules that consult that table.
    pub fn load(tower_path: &Path, category_path: &Path) -> Self {
        let tower = TableState::from_result(open_with(tower_path, TowerTable::from_reader));
        let category = TableState::from_result(open_with(category_path, CategoryTable::from_reader));

        report("tower", tower_path, &tower);
        report("category", category_path, &category);

        Self { tower, category }
    }

    /// No tables at all; dependent rules report `File Missing`.
    pub fn unavailable() -> Self {
        Self {
            tower: TableState::Missing,
            category: TableState::Missing,
        }
    }
}

fn open_with<T>(
    path: &Path,
    parse: impl FnOnce(std::fs::File) -> Result<T, ReferenceTableError>,
) -> Result<T, ReferenceTableError> {
    let file = std::fs::File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ReferenceTableError::NotFound,
        _ => ReferenceTableError::Io(err),
    })?;
    parse(file)
}

fn report<T>(table: &str, path: &Path, state: &TableState<T>) {
    match state.fallback_label() {
        None => info!(table, path = %path.display(), "reference table loaded"),
        Some(label) => warn!(
            table,
            path = %path.display(),
            fallback = label,
            "reference table unavailable; dependent rules will degrade"
        ),
    }
}
