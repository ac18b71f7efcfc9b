// Conversion driver: one forward pass over the dump.
// Lines feed the scanner; every flushed table goes through the INSERT parser and
// the writer. Per-table outcomes are collected into a report.

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::logger;
use crate::parser::insert::InsertParser;
use crate::progress::{basename, ProgressManager};
use crate::scanner::{LineOutcome, PendingTable, TableScanner};
use crate::writer::TableWriter;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

const LOG_EVERY_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    Written { rows: usize, path: PathBuf },
    // Buffered lines produced no rows, so no file was created.
    Empty,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub insert_lines: usize,
    #[serde(flatten)]
    pub status: TableStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionReport {
    // Selected tables in the order they were flushed.
    pub tables: Vec<TableReport>,
    // Declared tables that were not in the selection.
    pub skipped: Vec<String>,
    pub malformed_declarations: usize,
    pub discarded_inserts: usize,
    pub lines_read: u64,
    pub elapsed_ms: u64,
}

impl ConversionReport {
    pub fn failed(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|t| matches!(t.status, TableStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn rows_written(&self) -> usize {
        self.tables
            .iter()
            .map(|t| match t.status {
                TableStatus::Written { rows, .. } => rows,
                _ => 0,
            })
            .sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

// Run a full conversion. Fails with InputNotFound before touching the output
// directory when the dump is missing.
pub fn run(config: &Config, progress: &ProgressManager) -> Result<ConversionReport> {
    config.validate()?;
    let start = Instant::now();

    progress.report(&format!("Looking for SQL file: {}", config.sql_file.display()));
    if !config.sql_file.is_file() {
        return Err(ConvertError::InputNotFound(config.sql_file.clone()));
    }

    fs::create_dir_all(&config.output_dir)?;
    logger::debug(&format!(
        "Convert: output directory {} ready",
        config.output_dir.display()
    ));

    let mut converter = Converter {
        config,
        progress,
        parser: InsertParser::new(),
        writer: TableWriter::new(&config.output_dir, config.write_options()),
        report: ConversionReport::default(),
        written: HashSet::new(),
    };
    converter.scan_file(&config.sql_file)?;

    let mut report = converter.report;
    report.elapsed_ms = start.elapsed().as_millis() as u64;
    logger::debug(&format!("Timing: conversion took {:?}", start.elapsed()));

    progress.report(&format!(
        "All tables processed! CSV files are ready in: {}",
        config.output_dir.display()
    ));
    Ok(report)
}

struct Converter<'a> {
    config: &'a Config,
    progress: &'a ProgressManager,
    parser: InsertParser,
    writer: TableWriter,
    report: ConversionReport,
    written: HashSet<String>,
}

impl Converter<'_> {
    fn scan_file(&mut self, path: &Path) -> Result<()> {
        logger::debug(&format!("Convert: opening {}", path.display()));
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let bar = self
            .progress
            .new_file_bar(path, &format!("Scanning {}", basename(path)));

        let mut scanner = TableScanner::new(self.config.tables.iter().cloned());
        let mut bytes_read: u64 = 0;
        let mut last_logged: u64 = 0;

        let mut buf = Vec::new();
        while reader.read_until(b'\n', &mut buf)? > 0 {
            let line_len = buf.len() as u64;
            bytes_read += line_len;
            self.report.lines_read += 1;
            if let Some(b) = bar.as_ref() {
                b.inc(line_len);
            } else if logger::is_debug() && bytes_read - last_logged > LOG_EVERY_BYTES {
                logger::debug(&format!(
                    "Convert: {} bytes read from {}",
                    bytes_read,
                    path.display()
                ));
                last_logged = bytes_read;
            }

            let outcome = scanner.scan_line(&buf);
            self.handle(outcome)?;
            buf.clear();
        }

        if let Some(pending) = scanner.finish() {
            self.flush(pending)?;
        }
        if let Some(b) = bar {
            b.finish();
        }
        logger::debug(&format!(
            "Convert: read {} lines ({} bytes), discarded {} INSERT lines",
            self.report.lines_read, bytes_read, self.report.discarded_inserts
        ));
        Ok(())
    }

    fn handle(&mut self, outcome: LineOutcome) -> Result<()> {
        match outcome {
            LineOutcome::TableStart {
                declared,
                selected,
                flushed,
            } => {
                if let Some(pending) = flushed {
                    self.flush(pending)?;
                }
                match declared {
                    Some(name) if selected => {
                        self.progress.report(&format!("Processing table: {}", name));
                    }
                    Some(name) => {
                        self.progress.report(&format!("Skipping table: {}", name));
                        self.report.skipped.push(name);
                    }
                    None => {
                        self.report.malformed_declarations += 1;
                        self.progress.report(&format!(
                            "Processing table: none (CREATE TABLE without a name on line {})",
                            self.report.lines_read
                        ));
                    }
                }
            }
            LineOutcome::Discarded => self.report.discarded_inserts += 1,
            LineOutcome::Buffered | LineOutcome::Ignored => {}
        }
        Ok(())
    }

    // Extract and write one table. Parse failures stay local to the table unless
    // fail_fast is set; write failures always abort.
    fn flush(&mut self, pending: PendingTable) -> Result<()> {
        let PendingTable { name, lines } = pending;
        logger::debug(&format!(
            "Convert: flushing {} ({} INSERT lines)",
            name,
            lines.len()
        ));

        let status = match self.parser.extract_rows(&name, &lines) {
            Ok(rows) => {
                if !self.written.insert(name.clone()) {
                    logger::debug(&format!(
                        "Convert: {} declared again, previous output is overwritten",
                        name
                    ));
                }
                match self.writer.write_table(&name, &rows)? {
                    Some(path) => {
                        self.progress.report(&format!(
                            "Written {} rows to {}",
                            rows.len(),
                            path.display()
                        ));
                        TableStatus::Written {
                            rows: rows.len(),
                            path,
                        }
                    }
                    None => {
                        logger::debug(&format!("Convert: {} produced no rows", name));
                        TableStatus::Empty
                    }
                }
            }
            Err(e) if e.is_table_local() => {
                self.progress
                    .suspend(|| logger::error(&format!("Table {} not written: {}", name, e)));
                if self.config.fail_fast {
                    return Err(e);
                }
                TableStatus::Failed {
                    error: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };

        self.report.tables.push(TableReport {
            table: name,
            insert_lines: lines.len(),
            status,
        });
        Ok(())
    }
}
