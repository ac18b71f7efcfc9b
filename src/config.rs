// Run configuration. Built from defaults, then an optional JSON config file,
// then command-line flags, each layer overriding only the keys it sets.

use crate::error::{ConvertError, Result};
use crate::writer::WriteOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SQL_FILE: &str = "emotion_dataset_jira.sql";
pub const DEFAULT_OUTPUT_DIR: &str = "jira_csv_output";
pub const DEFAULT_TABLES: [&str; 4] = ["projects", "issues", "comments", "authors"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub sql_file: PathBuf,
    pub output_dir: PathBuf,
    // Table selector. Order only matters for display.
    pub tables: Vec<String>,
    pub delimiter: char,
    pub extension: String,
    pub header: bool,
    // Abort the run on the first table whose INSERTs fail to parse.
    pub fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sql_file: PathBuf::from(DEFAULT_SQL_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            tables: DEFAULT_TABLES.iter().map(|t| t.to_string()).collect(),
            delimiter: ',',
            extension: "csv".to_string(),
            header: false,
            fail_fast: false,
        }
    }
}

// One partial layer of settings. Also the schema of the JSON config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub sql_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub tables: Option<Vec<String>>,
    pub delimiter: Option<String>,
    pub extension: Option<String>,
    pub header: Option<bool>,
    pub fail_fast: Option<bool>,
}

impl ConfigLayer {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl Config {
    pub fn apply(&mut self, layer: ConfigLayer) -> Result<()> {
        if let Some(v) = layer.sql_file {
            self.sql_file = v;
        }
        if let Some(v) = layer.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = layer.tables {
            self.tables = v;
        }
        if let Some(v) = layer.delimiter {
            self.delimiter = parse_delimiter(&v)?;
        }
        if let Some(v) = layer.extension {
            self.extension = v;
        }
        if let Some(v) = layer.header {
            self.header = v;
        }
        if let Some(v) = layer.fail_fast {
            self.fail_fast = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(ConvertError::Config("no tables selected".to_string()));
        }
        if self.tables.iter().any(|t| t.trim().is_empty()) {
            return Err(ConvertError::Config("empty table name in selection".to_string()));
        }
        if !self.delimiter.is_ascii() {
            return Err(ConvertError::Config(format!(
                "delimiter {:?} is not a single ASCII character",
                self.delimiter
            )));
        }
        // The writer quotes with '"' and ends records with '\n'.
        if matches!(self.delimiter, '"' | '\n' | '\r') {
            return Err(ConvertError::Config(format!(
                "delimiter {:?} clashes with CSV quoting or line endings",
                self.delimiter
            )));
        }
        let ext = self.extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(&['/', '\\'][..]) {
            return Err(ConvertError::Config(format!(
                "invalid file extension {:?}",
                self.extension
            )));
        }
        Ok(())
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            delimiter: self.delimiter as u8,
            extension: self.extension.trim_start_matches('.').to_string(),
            header: self.header,
        }
    }
}

// Accepts a single character, or the escapes \t and "tab".
fn parse_delimiter(raw: &str) -> Result<char> {
    if raw == "\\t" || raw.eq_ignore_ascii_case("tab") {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(ConvertError::Config(format!(
            "delimiter {:?} is not a single ASCII character",
            raw
        ))),
    }
}
