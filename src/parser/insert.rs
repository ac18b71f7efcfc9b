// INSERT parser: turns buffered INSERT lines into rows of byte fields.
// Splitting is purely separator based (no quote or paren tracking), so values
// containing "),(", commas, or escaped quotes come out mis-split.

use crate::error::{ConvertError, Result};
use crate::logger;
use crate::parser::{Field, Row, StatementClassifier};
use regex::bytes::Regex;

pub struct InsertParser {
    classifier: StatementClassifier,
    // Upper-case only, so a column or identifier spelled `values` is not taken
    // for the keyword.
    values_re: Regex,
    // Separator between row groups inside a value-list.
    row_separator_re: Regex,
}

impl InsertParser {
    pub fn new() -> Self {
        let values_re = Regex::new(r"(?-u)\bVALUES\b").expect("valid values regex");
        let row_separator_re = Regex::new(r"\),\(").expect("valid row separator regex");
        Self {
            classifier: StatementClassifier::new(),
            values_re,
            row_separator_re,
        }
    }

    // Extract every row from a table's buffered INSERT lines.
    // The first line without a VALUES clause fails the whole buffer and any rows
    // collected from earlier lines are dropped.
    pub fn extract_rows(&self, table: &str, lines: &[Vec<u8>]) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for line in lines {
            match self.parse_line(table, line)? {
                Some(line_rows) => rows.extend(line_rows),
                None => logger::debug(&format!(
                    "ExtractRows: {} skipping non-INSERT line",
                    table
                )),
            }
        }
        logger::debug(&format!(
            "ExtractRows: {} produced {} rows from {} lines",
            table,
            rows.len(),
            lines.len()
        ));
        Ok(rows)
    }

    // Parse one line. Returns Ok(None) for lines that are not INSERT statements.
    pub fn parse_line(&self, table: &str, line: &[u8]) -> Result<Option<Vec<Row>>> {
        let line = line.trim_ascii();
        if !self.classifier.is_insert(line) {
            return Ok(None);
        }
        let values_part = self
            .values_part(line)
            .ok_or_else(|| ConvertError::MissingValuesClause {
                table: table.to_string(),
                line: String::from_utf8_lossy(line).into_owned(),
            })?;
        if values_part.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let rows = self
            .row_separator_re
            .split(values_part)
            .map(split_fields)
            .collect();
        Ok(Some(rows))
    }

    // Everything after the first VALUES keyword, trimmed, minus one trailing ';'.
    fn values_part<'a>(&self, line: &'a [u8]) -> Option<&'a [u8]> {
        let m = self.values_re.find(line)?;
        let rest = line[m.end()..].trim_ascii();
        let rest = rest.strip_suffix(b";").unwrap_or(rest);
        Some(rest.trim_ascii())
    }
}

impl Default for InsertParser {
    fn default() -> Self {
        Self::new()
    }
}

// Split one row group into fields after removing its outer parens.
fn split_fields(group: &[u8]) -> Row {
    let group = group.trim_ascii();
    let group = group.strip_prefix(b"(").unwrap_or(group);
    let group = group.strip_suffix(b")").unwrap_or(group);
    group.split(|&b| b == b',').map(clean_field).collect()
}

// Trim whitespace, then at most one quote on each side.
fn clean_field(raw: &[u8]) -> Field {
    let v = raw.trim_ascii();
    let v = v.strip_prefix(b"'").unwrap_or(v);
    let v = v.strip_suffix(b"'").unwrap_or(v);
    v.to_vec()
}
