use std::sync::OnceLock;

use regex::Regex;

use super::static_regex;

static ENTRY_HEADER: OnceLock<Regex> = OnceLock::new();
static TEMPLATE_HEADER: OnceLock<Regex> = OnceLock::new();

// `<date> [<time> [AM|PM]] [- <actor> [(<tag>)]]` at the start of any line.
const ENTRY_HEADER_PATTERN: &str = r"(?im)^\(?(?:\d{4}[-/.]\d{1,2}[-/.]\d{1,2}|\d{1,2}[-/.]\d{1,2}[-/.]\d{4})(?:[T\s]+\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s*(?:AM|PM|A\.M\.|P\.M\.))?)?(?:\s*-\s*[^(\n]+(?:\s*\([^)]*\))?)?\s*";

// Journal stamps such as `2025-10-01 09:00:00 - Jane Doe (Work notes)` anywhere in the text.
const TEMPLATE_HEADER_PATTERN: &str =
    r"(?:OR)?\s*\d{1,4}[-/]\d{1,2}[-/]\d{1,4}\s+\d{1,2}:\d{2}:\d{2}\s*-\s*[^\n()]+(?:\([^)]+\))?";

/// Removes system-generated journal headers, leaving the prose an agent actually wrote.
pub fn strip_header(entry: &str) -> String {
    static_regex(&ENTRY_HEADER, ENTRY_HEADER_PATTERN)
        .replace_all(entry, "")
        .trim()
        .to_string()
}

/// Removes every journal stamp, collapses whitespace and lowercases for template lookups.
pub fn clean_for_template(text: &str) -> String {
    let stripped = static_regex(&TEMPLATE_HEADER, TEMPLATE_HEADER_PATTERN).replace_all(text, "");
    collapse_whitespace(&stripped).to_lowercase()
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased with every whitespace character removed; used for phrase lookups.
pub fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
