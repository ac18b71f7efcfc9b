// Output writer: one delimited file per extracted table.
// Files are truncated on open, so re-running over the same dump gives identical output.

use crate::error::Result;
use crate::logger;
use crate::parser::Row;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub delimiter: u8,
    pub extension: String,
    // Positional header (0,1,...,n-1) sized from the first row.
    pub header: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            extension: "csv".to_string(),
            header: false,
        }
    }
}

pub struct TableWriter {
    output_dir: PathBuf,
    options: WriteOptions,
}

impl TableWriter {
    pub fn new(output_dir: impl Into<PathBuf>, options: WriteOptions) -> Self {
        Self {
            output_dir: output_dir.into(),
            options,
        }
    }

    pub fn path_for(&self, table: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", table, self.options.extension))
    }

    // Write all rows for a table. Returns None (and creates no file) for zero rows.
    // Every row is padded with empty fields to the widest row, so the file is
    // rectangular and a header covers every column.
    pub fn write_table(&self, table: &str, rows: &[Row]) -> Result<Option<PathBuf>> {
        let first_width = match rows.first() {
            Some(first) => first.len(),
            None => return Ok(None),
        };
        let width = rows.iter().map(Vec::len).max().unwrap_or(first_width);
        if width > first_width {
            logger::debug(&format!(
                "WriteTable: {} has rows wider than the first ({} > {} columns)",
                table, width, first_width
            ));
        }

        let path = self.path_for(table);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(&path)?;

        if self.options.header {
            writer.write_record((0..width).map(|i| i.to_string()))?;
        }

        let mut padded = 0usize;
        for row in rows {
            if row.len() < width {
                padded += 1;
                let fill = std::iter::repeat(&b""[..]).take(width - row.len());
                writer.write_record(row.iter().map(Vec::as_slice).chain(fill))?;
            } else {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;

        if padded > 0 {
            logger::debug(&format!(
                "WriteTable: {} padded {} short rows to {} columns",
                table, padded, width
            ));
        }
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|f| f.as_bytes().to_vec()).collect()
    }

    #[test]
    fn writes_rows_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TableWriter::new(dir.path(), WriteOptions::default());
        let path = writer
            .write_table("issues", &[row(&["1", "open"]), row(&["2", "closed"])])
            .unwrap()
            .expect("file written");
        assert_eq!(path, dir.path().join("issues.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "1,open\n2,closed\n");
    }

    #[test]
    fn zero_rows_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TableWriter::new(dir.path(), WriteOptions::default());
        assert_eq!(writer.write_table("issues", &[]).unwrap(), None);
        assert!(!dir.path().join("issues.csv").exists());
    }

    #[test]
    fn positional_header_and_custom_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let options = WriteOptions {
            delimiter: b'\t',
            extension: "tsv".to_string(),
            header: true,
        };
        let writer = TableWriter::new(dir.path(), options);
        let path = writer
            .write_table("authors", &[row(&["7", "Ada"])])
            .unwrap()
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "authors.tsv");
        assert_eq!(fs::read_to_string(path).unwrap(), "0\t1\n7\tAda\n");
    }

    #[test]
    fn rows_are_padded_to_the_widest_row() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TableWriter::new(dir.path(), WriteOptions::default());
        let path = writer
            .write_table("t", &[row(&["1", "a", "x"]), row(&["2"]), row(&["3", "b", "y", "z"])])
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "1,a,x,\n2,,,\n3,b,y,z\n");
    }

    #[test]
    fn header_spans_the_widest_row() {
        let dir = tempfile::tempdir().unwrap();
        let options = WriteOptions {
            header: true,
            ..WriteOptions::default()
        };
        let writer = TableWriter::new(dir.path(), options);
        let path = writer
            .write_table("t", &[row(&["1"]), row(&["2", "b", "c"])])
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "0,1,2\n1,,\n2,b,c\n");
    }

    #[test]
    fn non_utf8_fields_are_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TableWriter::new(dir.path(), WriteOptions::default());
        let path = writer
            .write_table("t", &[vec![b"1".to_vec(), b"caf\xE9".to_vec()]])
            .unwrap()
            .unwrap();
        assert_eq!(fs::read(path).unwrap(), b"1,caf\xE9\n".to_vec());
    }

    #[test]
    fn fields_containing_the_delimiter_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TableWriter::new(dir.path(), WriteOptions::default());
        let path = writer
            .write_table("t", &[row(&["1", "a b", "c,d"])])
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "1,a b,\"c,d\"\n");
    }

    #[test]
    fn rewriting_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TableWriter::new(dir.path(), WriteOptions::default());
        writer.write_table("t", &[row(&["1"]), row(&["2"])]).unwrap();
        let path = writer.write_table("t", &[row(&["3"])]).unwrap().unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "3\n");
    }
}
