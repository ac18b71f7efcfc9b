// sqldump2csv command-line entry point.
// Resolves configuration (defaults, --config file, flags), runs one conversion
// pass and turns the report into an exit status.

use clap::Parser;
use sqldump2csv::config::{Config, ConfigLayer};
use sqldump2csv::convert;
use sqldump2csv::error::ConvertError;
use sqldump2csv::logger;
use sqldump2csv::progress::ProgressManager;
use std::path::PathBuf;
use std::time::Instant;

// Command-line flags. Anything left unset falls back to the config file, then defaults.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// SQL dump to read [default: emotion_dataset_jira.sql].
    #[arg(long)]
    sql_file: Option<PathBuf>,

    /// Directory for the per-table files, created if missing [default: jira_csv_output].
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Comma-separated tables to extract [default: projects,issues,comments,authors].
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// JSON file with any of: sql_file, output_dir, tables, delimiter, extension, header, fail_fast.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field delimiter: one ASCII character, or "tab" [default: ,].
    #[arg(long)]
    delimiter: Option<String>,

    /// Output file extension [default: csv].
    #[arg(long)]
    extension: Option<String>,

    /// Write a positional header row (0,1,...,n-1).
    #[arg(long, overrides_with = "no_header")]
    header: bool,

    /// Do not write a header row, even if the config file asks for one.
    #[arg(long, overrides_with = "header")]
    no_header: bool,

    /// Stop at the first table whose INSERT lines cannot be parsed.
    #[arg(long, overrides_with = "no_fail_fast")]
    fail_fast: bool,

    /// Keep going past tables that fail to parse, even if the config file sets fail_fast.
    #[arg(long, overrides_with = "fail_fast")]
    no_fail_fast: bool,

    /// Enable debug logging (disables progress bars).
    #[arg(long)]
    debug: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Write the run report as JSON to this file.
    #[arg(long)]
    report_json: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            sql_file: self.sql_file.clone(),
            output_dir: self.output_dir.clone(),
            tables: self.tables.clone(),
            delimiter: self.delimiter.clone(),
            extension: self.extension.clone(),
            header: switch(self.header, self.no_header),
            fail_fast: switch(self.fail_fast, self.no_fail_fast),
        }
    }
}

// A --flag / --no-flag pair; None when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

fn build_config(args: &Args) -> Result<Config, ConvertError> {
    let mut config = Config::default();
    if let Some(path) = &args.config {
        logger::debug(&format!("main: loading config file {}", path.display()));
        config.apply(ConfigLayer::load(path)?)?;
    }
    config.apply(args.overrides())?;
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let wall_start = Instant::now();
    let args = Args::parse();

    logger::set_debug(args.debug);
    let config = build_config(&args)?;
    logger::debug(&format!("main: SQL file: {}", config.sql_file.display()));
    logger::debug(&format!("main: Output dir: {}", config.output_dir.display()));
    logger::debug(&format!("main: Tables: {}", config.tables.join(",")));

    // Progress bars are disabled in debug mode to avoid mangled output.
    let progress = ProgressManager::new(!args.debug && !args.no_progress);

    let report = match convert::run(&config, &progress) {
        Ok(report) => report,
        Err(ConvertError::InputNotFound(path)) => {
            // Missing input is a clean exit: explain and write nothing.
            println!("Error: The file '{}' was not found.", path.display());
            println!("Please make sure the SQL file exists, or pass its path with --sql-file.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = args.report_json.as_ref() {
        report.write_json(path)?;
        logger::debug(&format!("main: report written to {}", path.display()));
    }
    logger::debug(&format!(
        "Timing: total wall time {:?}, {} rows written",
        wall_start.elapsed(),
        report.rows_written()
    ));

    if report.has_failures() {
        let failed: Vec<&str> = report.failed().map(|t| t.table.as_str()).collect();
        logger::error(&format!(
            "{} table(s) not written: {}",
            failed.len(),
            failed.join(", ")
        ));
        std::process::exit(1);
    }
    logger::info(&format!(
        "{} rows written across {} table(s)",
        report.rows_written(),
        report.tables.len()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layered(file: &str, argv: &[&str]) -> Config {
        let mut config = Config::default();
        config.apply(ConfigLayer::from_json(file).unwrap()).unwrap();
        let args = Args::try_parse_from(std::iter::once("sqldump2csv").chain(argv.iter().copied()))
            .unwrap();
        config.apply(args.overrides()).unwrap();
        config
    }

    #[test]
    fn flags_left_unset_keep_config_file_values() {
        let config = layered(r#"{"header": true, "fail_fast": true}"#, &[]);
        assert!(config.header);
        assert!(config.fail_fast);
    }

    #[test]
    fn negative_flags_override_config_file() {
        let config = layered(
            r#"{"header": true, "fail_fast": true}"#,
            &["--no-header", "--no-fail-fast"],
        );
        assert!(!config.header);
        assert!(!config.fail_fast);
    }

    #[test]
    fn last_of_a_flag_pair_wins() {
        let config = layered("{}", &["--no-header", "--header"]);
        assert!(config.header);
        let config = layered("{}", &["--header", "--no-header"]);
        assert!(!config.header);
    }

    #[test]
    fn tables_are_comma_separated() {
        let config = layered("{}", &["--tables", "issues,authors"]);
        assert_eq!(config.tables, vec!["issues", "authors"]);
    }
}
