use crate::{DEFAULT_CSV_DELIMITER, NULL_VALUES};

use clap::Parser;
use std::path::PathBuf;

// https://stackoverflow.com/questions/74068168/clap-rs-not-printing-colors-during-help
fn get_styles() -> clap::builder::Styles {
    let cyan = anstyle::Color::Ansi(anstyle::AnsiColor::Cyan);
    let green = anstyle::Color::Ansi(anstyle::AnsiColor::Green);
    let yellow = anstyle::Color::Ansi(anstyle::AnsiColor::Yellow);

    clap::builder::Styles::styled()
        .placeholder(anstyle::Style::new().fg_color(Some(yellow)))
        .usage(anstyle::Style::new().fg_color(Some(cyan)).bold())
        .header(
            anstyle::Style::new()
                .fg_color(Some(cyan))
                .bold()
                .underline(),
        )
        .literal(anstyle::Style::new().fg_color(Some(green)))
}

// https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template
const APPLET_TEMPLATE: &str = "\
{before-help}
{about-with-newline}
{usage-heading} {usage}

{all-args}
{after-help}";

const EX1: &str = r#" csv-uploader warehouse.duckdb"#;
const EX2: &str = r#" csv-uploader warehouse.duckdb --list"#;
const EX3: &str = r#" csv-uploader warehouse.duckdb -s PUBLIC -t ORDERS -f orders.csv"#;
const EX4: &str = r#" csv-uploader warehouse.duckdb -d ";" -n "NA, <N/D>" -s PUBLIC -t ORDERS -f orders.csv"#;

/// Command-line arguments for the CSV uploader.
#[derive(Parser, Debug, Clone)]
#[command(
    // Read from `Cargo.toml`.
    author, version, about,
    long_about = None,
    next_line_help = true,
    help_template = APPLET_TEMPLATE,
    styles=get_styles(),
    after_help = format!("EXAMPLES:\n{EX1}\n{EX2}\n{EX3}\n{EX4}")
)]
pub struct Arguments {
    /// Path to the DuckDB database file.
    #[arg(
        value_name = "DB_PATH",
        default_value = "uploads.duckdb",
        help = "Path to the DuckDB database file [Default: uploads.duckdb]",
        long_help = "Path to the target DuckDB database. Created if missing.\n\
        Use ':memory:' for a throw-away in-memory database."
    )]
    pub database: PathBuf,

    /// CSV delimiter character. [Default: ',']
    #[arg(
        short = 'd',
        long,
        default_value = DEFAULT_CSV_DELIMITER,
        help = "CSV delimiter character",
        long_help = "Sets the single-byte CSV delimiter used to parse uploaded files."
    )]
    pub delimiter: String,

    /// Print schemas and tables of the database, then exit.
    #[arg(
        short = 'l',
        long,
        action = clap::ArgAction::SetTrue,
        conflicts_with = "file",
        help = "List schemas and tables, then exit"
    )]
    pub list: bool,

    /// Comma-separated values to treat as NULL.
    #[arg(
        short = 'n',
        long,
        value_name = "NULL_LIST",
        default_value = NULL_VALUES,
        hide_default_value = true,
        help = "Comma-separated values interpreted as NULL [Default: \"\", NA, N/A, NULL, NaN, ...]",
        long_help = "Specify custom null strings. Whitespace trimmed.\n\
        Use quotes for values with commas/spaces (e.g., \"NA\",\"-\").\n\
        Replaces the default list: empty fields and the usual missing-value markers\n\
        (#N/A, <NA>, N/A, NA, NULL, NaN, None, n/a, nan, null, ...)."
    )]
    pub null_values: String,

    /// CSV file to upload without opening a window.
    #[arg(
        short = 'f',
        long,
        value_name = "CSV_FILE",
        requires_all = ["schema", "table"],
        help = "Upload CSV_FILE headlessly [requires --schema and --table]"
    )]
    pub file: Option<PathBuf>,

    /// Destination schema.
    #[arg(
        short = 's',
        long,
        value_name = "SCHEMA",
        help = "Destination schema (preselected in the window)"
    )]
    pub schema: Option<String>,

    /// Destination table.
    #[arg(
        short = 't',
        long,
        value_name = "TABLE",
        requires = "schema",
        help = "Destination table (preselected in the window) [requires --schema]"
    )]
    pub table: Option<String>,
}

impl Arguments {
    /// Build `Arguments` struct.
    pub fn build() -> Arguments {
        Arguments::parse()
    }

    /// True when the command line asks for work without a window.
    pub fn is_headless(&self) -> bool {
        self.list || self.file.is_some()
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// cargo test -- --show-output tests_args`
#[cfg(test)]
mod tests_args {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Arguments::parse_from(["csv-uploader"]);

        assert_eq!(args.database, PathBuf::from("uploads.duckdb"));
        assert_eq!(args.delimiter, DEFAULT_CSV_DELIMITER);
        assert_eq!(args.null_values, NULL_VALUES);
        assert_eq!(args.schema, None);
        assert_eq!(args.table, None);
        assert_eq!(args.file, None);
        assert!(!args.list);
        assert!(!args.is_headless());
    }

    #[test]
    fn test_args_headless_upload() {
        let args = Arguments::parse_from([
            "csv-uploader",
            "-s",
            "PUBLIC",
            "-t",
            "ORDERS",
            "-f",
            "orders.csv",
            "data.duckdb",
        ]);

        assert_eq!(args.database, PathBuf::from("data.duckdb"));
        assert_eq!(args.schema.as_deref(), Some("PUBLIC"));
        assert_eq!(args.table.as_deref(), Some("ORDERS"));
        assert_eq!(args.file, Some(PathBuf::from("orders.csv")));
        assert!(args.is_headless());
    }

    #[test]
    fn test_args_all_options_long() {
        let args = Arguments::parse_from([
            "csv-uploader",
            "--delimiter",
            ";",
            "--null-values",
            "NA,-",
            "--schema",
            "PUBLIC",
            ":memory:",
        ]);

        assert_eq!(args.database, PathBuf::from(":memory:"));
        assert_eq!(args.delimiter, ";");
        assert_eq!(args.null_values, "NA,-");
        assert_eq!(args.schema.as_deref(), Some("PUBLIC"));
        assert!(!args.is_headless());
    }

    #[test]
    fn test_args_file_requires_destination() {
        let result = Arguments::try_parse_from(["csv-uploader", "-f", "orders.csv"]);
        assert!(result.is_err());

        let result = Arguments::try_parse_from(["csv-uploader", "-s", "PUBLIC", "-f", "x.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_table_requires_schema() {
        let result = Arguments::try_parse_from(["csv-uploader", "-t", "ORDERS"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_list_conflicts_with_file() {
        let result = Arguments::try_parse_from([
            "csv-uploader",
            "--list",
            "-s",
            "PUBLIC",
            "-t",
            "ORDERS",
            "-f",
            "orders.csv",
        ]);
        assert!(result.is_err());

        let args = Arguments::parse_from(["csv-uploader", "--list"]);
        assert!(args.list);
        assert!(args.is_headless());
    }
}
