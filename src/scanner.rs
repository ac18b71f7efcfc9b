// Statement scanner: single forward pass over dump lines.
// Tracks the active (selected) table and buffers its INSERT lines until the next
// CREATE TABLE or end of input hands them back for extraction. No I/O happens here.

use crate::logger;
use crate::parser::{Statement, StatementClassifier};
use std::collections::HashSet;

// A selected table's buffered INSERT lines, ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTable {
    pub name: String,
    pub lines: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    // A CREATE TABLE line. `declared` is the parsed name (None if malformed),
    // `selected` says whether it became the active table, and `flushed` carries
    // the previous table's buffer if it had one.
    TableStart {
        declared: Option<String>,
        selected: bool,
        flushed: Option<PendingTable>,
    },
    // INSERT appended to the active table's buffer.
    Buffered,
    // INSERT seen while no table is active.
    Discarded,
    Ignored,
}

pub struct TableScanner {
    classifier: StatementClassifier,
    selector: HashSet<String>,
    active: Option<String>,
    buffer: Vec<Vec<u8>>,
}

impl TableScanner {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classifier: StatementClassifier::new(),
            selector: tables.into_iter().map(Into::into).collect(),
            active: None,
            buffer: Vec::new(),
        }
    }

    pub fn active_table(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn buffered_lines(&self) -> usize {
        self.buffer.len()
    }

    pub fn scan_line(&mut self, raw: &[u8]) -> LineOutcome {
        let line = raw.trim_ascii();
        match self.classifier.classify(line) {
            Statement::TableStart(declared) => {
                let flushed = self.take_pending();
                self.buffer.clear();
                self.active = declared
                    .as_ref()
                    .filter(|name| self.selector.contains(name.as_str()))
                    .cloned();
                logger::debug(&format!(
                    "Scanner: CREATE TABLE {:?} -> active {:?}",
                    declared, self.active
                ));
                LineOutcome::TableStart {
                    selected: self.active.is_some(),
                    declared,
                    flushed,
                }
            }
            Statement::RowInsert(stmt) => {
                if self.active.is_some() {
                    self.buffer.push(stmt.to_vec());
                    LineOutcome::Buffered
                } else {
                    LineOutcome::Discarded
                }
            }
            Statement::Other => LineOutcome::Ignored,
        }
    }

    // End of input: hand back whatever the last active table collected.
    pub fn finish(&mut self) -> Option<PendingTable> {
        let pending = self.take_pending();
        self.active = None;
        self.buffer.clear();
        pending
    }

    fn take_pending(&mut self) -> Option<PendingTable> {
        let name = self.active.take()?;
        if self.buffer.is_empty() {
            return None;
        }
        Some(PendingTable {
            name,
            lines: std::mem::take(&mut self.buffer),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> TableScanner {
        TableScanner::new(["issues", "projects"])
    }

    #[test]
    fn buffers_inserts_for_selected_table() {
        let mut s = scanner();
        let out = s.scan_line(br#"CREATE TABLE "issues" ("#);
        assert_eq!(
            out,
            LineOutcome::TableStart {
                declared: Some("issues".to_string()),
                selected: true,
                flushed: None,
            }
        );
        assert_eq!(s.scan_line(b"  INSERT INTO issues VALUES (1);\n"), LineOutcome::Buffered);
        assert_eq!(s.scan_line(b"  id int,"), LineOutcome::Ignored);
        assert_eq!(s.active_table(), Some("issues"));
        assert_eq!(s.buffered_lines(), 1);
    }

    #[test]
    fn next_declaration_flushes_previous_buffer() {
        let mut s = scanner();
        s.scan_line(b"CREATE TABLE issues (");
        s.scan_line(b"INSERT INTO issues VALUES (1);");
        s.scan_line(b"INSERT INTO issues VALUES (2);");
        match s.scan_line(b"CREATE TABLE projects (") {
            LineOutcome::TableStart { flushed: Some(p), selected: true, .. } => {
                assert_eq!(p.name, "issues");
                assert_eq!(
                    p.lines,
                    vec![
                        b"INSERT INTO issues VALUES (1);".to_vec(),
                        b"INSERT INTO issues VALUES (2);".to_vec(),
                    ]
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(s.buffered_lines(), 0);
        assert_eq!(s.active_table(), Some("projects"));
    }

    #[test]
    fn unselected_table_inserts_are_discarded() {
        let mut s = scanner();
        let out = s.scan_line(b"CREATE TABLE audit_log (");
        assert!(matches!(out, LineOutcome::TableStart { selected: false, .. }));
        assert_eq!(s.scan_line(b"INSERT INTO audit_log VALUES (1);"), LineOutcome::Discarded);
        assert_eq!(s.buffered_lines(), 0);
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn inserts_before_any_declaration_are_discarded() {
        let mut s = scanner();
        assert_eq!(s.scan_line(b"INSERT INTO issues VALUES (1);"), LineOutcome::Discarded);
    }

    #[test]
    fn malformed_declaration_clears_active_table() {
        let mut s = scanner();
        s.scan_line(b"CREATE TABLE issues (");
        s.scan_line(b"INSERT INTO issues VALUES (1);");
        match s.scan_line(b"CREATE TABLE") {
            LineOutcome::TableStart { declared: None, selected: false, flushed } => {
                assert_eq!(flushed.map(|p| p.lines.len()), Some(1));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(s.active_table(), None);
        assert_eq!(s.scan_line(b"INSERT INTO issues VALUES (2);"), LineOutcome::Discarded);
    }

    #[test]
    fn selected_table_without_inserts_flushes_nothing() {
        let mut s = scanner();
        s.scan_line(b"CREATE TABLE issues (");
        assert!(matches!(
            s.scan_line(b"CREATE TABLE projects ("),
            LineOutcome::TableStart { flushed: None, .. }
        ));
    }

    #[test]
    fn last_table_is_returned_by_finish() {
        let mut s = scanner();
        s.scan_line(b"CREATE TABLE projects (");
        s.scan_line(b"INSERT INTO projects VALUES (1,'core');");
        let pending = s.finish().expect("pending table");
        assert_eq!(pending.name, "projects");
        assert_eq!(pending.lines.len(), 1);
        assert_eq!(s.finish(), None);
    }
}
