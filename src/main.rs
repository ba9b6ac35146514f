#![warn(clippy::all)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use csv_uploader::{
    Arguments, CsvOptions, Database, UploaderApp, UploaderError, UploaderResult, upload_file,
    write_catalog,
};
use std::{io, process::ExitCode, sync::Arc};
use tracing::{debug, error, info};

/*
cargo fmt
cargo test -- --nocapture
cargo test -- --show-output tests_upload
cargo run -- --help
cargo run -- --list warehouse.duckdb
cargo run -- -s sales -t orders -f orders.csv warehouse.duckdb
cargo b -r && cargo install --path=.
*/

fn main() -> ExitCode {
    // Initialize the tracing subscriber for logging.
    // Use RUST_LOG environment variable to set logging level.  eg `export RUST_LOG=info`
    tracing_subscriber::fmt::init();

    // Parse command-line arguments.
    let args = Arguments::build();

    let result = if args.is_headless() {
        run_headless(&args)
    } else {
        run_window(args).map(|()| true)
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Lists the catalog or uploads one file. Returns `false` if the upload failed.
fn run_headless(args: &Arguments) -> UploaderResult<bool> {
    let database = Database::open(&args.database)?;
    info!("Connected to database '{}'", database.name());

    if args.list {
        let mut stdout = io::stdout().lock();
        write_catalog(&database, &mut stdout)?;
        return Ok(true);
    }

    let outcome = upload_file(&database, args)?;
    println!("{outcome}");
    Ok(outcome.is_success())
}

fn run_window(args: Arguments) -> UploaderResult<()> {
    let csv_options = CsvOptions::new(&args)?;

    // RUST_LOG=debug cargo run -- warehouse.duckdb
    debug!("main()\nCsvOptions: {csv_options:#?}");

    let database = Arc::new(Database::open(&args.database)?);
    info!("Connected to database '{}'", database.name());

    // Configure the native options for the eframe application.
    let native_options = eframe::NativeOptions {
        centered: true,
        persist_window: true,
        vsync: true,
        viewport: egui::ViewportBuilder::default().with_drag_and_drop(true),
        ..Default::default()
    };

    // Run the eframe application.
    eframe::run_native(
        "CSV Uploader",
        native_options,
        Box::new(move |creation_context| {
            let app = UploaderApp::new(
                creation_context,
                database,
                csv_options,
                args.schema,
                args.table,
            )?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| UploaderError::Other(err.to_string()))
}
