// sqldump2csv: pull selected tables out of a SQL dump into delimited files.
// A single line-oriented pass: CREATE TABLE lines pick the active table, its
// INSERT lines are buffered, and each buffer is split into rows and written out.

pub mod config;
pub mod convert;
pub mod error;
pub mod logger;
pub mod parser;
pub mod progress;
pub mod scanner;
pub mod writer;

pub use config::{Config, ConfigLayer};
pub use convert::{run, ConversionReport, TableReport, TableStatus};
pub use error::{ConvertError, Result};
pub use parser::Row;
