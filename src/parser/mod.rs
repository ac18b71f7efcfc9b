// Parser module: line-local classification of dump statements.
// Only two statement kinds matter: CREATE TABLE (table start) and INSERT INTO (rows).
// Everything else in the dump is ignored.
//
// Lines stay raw bytes from read to write. Every keyword and separator is ASCII,
// so dumps in any ASCII-compatible encoding pass through unchanged.

pub mod insert;
pub mod schema;

use regex::bytes::Regex;

// One field value, surrounding whitespace and quotes removed, in the dump's encoding.
pub type Field = Vec<u8>;

// One output row.
pub type Row = Vec<Field>;

// What a single trimmed dump line is, as far as extraction is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    // CREATE TABLE line. `None` when the line has no name token.
    TableStart(Option<String>),
    // INSERT INTO line, kept verbatim for the extractor.
    RowInsert(&'a [u8]),
    Other,
}

// Classifies lines. Regexes are compiled once and reused for the whole scan.
pub struct StatementClassifier {
    create_table_re: Regex,
    insert_into_re: Regex,
}

impl StatementClassifier {
    pub fn new() -> Self {
        let create_table_re =
            Regex::new(r"(?i-u)^CREATE\s+TABLE\b").expect("valid create table regex");
        let insert_into_re =
            Regex::new(r"(?i-u)^INSERT\s+INTO\b").expect("valid insert regex");
        Self {
            create_table_re,
            insert_into_re,
        }
    }

    // `line` must already be trimmed.
    pub fn classify<'a>(&self, line: &'a [u8]) -> Statement<'a> {
        if self.create_table_re.is_match(line) {
            Statement::TableStart(schema::table_name(line))
        } else if self.insert_into_re.is_match(line) {
            Statement::RowInsert(line)
        } else {
            Statement::Other
        }
    }

    pub fn is_insert(&self, line: &[u8]) -> bool {
        self.insert_into_re.is_match(line.trim_ascii_start())
    }
}

impl Default for StatementClassifier {
    fn default() -> Self {
        Self::new()
    }
}
