use crate::{
    CsvOptions, Database, ErrorNotice, NoticeReply, PickedFile, UploadError, UploadOutcome,
    UploadTarget, UploaderError, UploaderResult, UploaderStyle, describe_target, display_name,
    list_schemas, list_tables, open_file, render_preview, upload_in_background,
};

use egui::{
    CentralPanel, Context, RichText, ScrollArea, SidePanel, TopBottomPanel, Ui,
    warn_if_debug_build, widgets,
};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::oneshot::{self, Receiver, error::TryRecvError};
use tracing::{debug, error};

/// Type alias for the result of one upload run in the background.
pub type UploadReport = UploaderResult<UploadOutcome>;
/// Type alias for a boxed, dynamically dispatched Future that returns an `UploadReport`.
pub type UploadFuture = Box<dyn Future<Output = UploadReport> + Unpin + Send + 'static>;

const INSTRUCTIONS: [&str; 5] = [
    "Select the schema from the available.",
    "Then select the table which will automatically update to reflect your schema choice.",
    "Check that the table corresponds to that which you want to ingest into.",
    "Select the file you want to ingest.",
    "You should see an upload success message detailing how many rows were ingested.",
];

/// Where the current upload stands.
///
/// Every file starts a new run: `Idle -> FileReceived -> Finished`.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    /// No file supplied yet.
    Idle,
    /// A file was received and is being parsed and written.
    FileReceived(String),
    /// The last upload finished, successfully or not.
    Finished {
        file: String,
        outcome: UploadOutcome,
    },
}

impl UploadState {
    /// Status line shown under the file picker.
    pub fn status_message(&self) -> String {
        match self {
            UploadState::Idle => UploadOutcome::NoFileProvided.to_string(),
            UploadState::FileReceived(file) => format!("Uploading {file}..."),
            UploadState::Finished { outcome, .. } => outcome.to_string(),
        }
    }
}

/// The main application struct.
pub struct UploaderApp {
    /// The fixed target database. Each upload acquires its own session on it.
    database: Arc<Database>,
    /// How uploaded files are parsed.
    csv_options: CsvOptions,

    /// Schemas offered in the first selector, in catalog order.
    schemas: Vec<String>,
    /// Tables of `chosen_schema`, in catalog order.
    tables: Vec<String>,
    chosen_schema: Option<String>,
    chosen_table: Option<String>,

    state: UploadState,
    /// Error window, shown until dismissed.
    notification: Option<ErrorNotice>,

    /// Tokio runtime for the file dialog and background uploads.
    runtime: tokio::runtime::Runtime,
    /// Channel for receiving the result of the running upload.
    pipe: Option<Receiver<UploadReport>>,
    /// Vector of active asynchronous tasks.
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl UploaderApp {
    /// Creates the application and reads the catalog once.
    ///
    /// `schema` and `table` preselect a destination when they exist in the catalog.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        database: Arc<Database>,
        csv_options: CsvOptions,
        schema: Option<String>,
        table: Option<String>,
    ) -> UploaderResult<Self> {
        cc.egui_ctx.apply_uploader_style();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let mut app = UploaderApp {
            database,
            csv_options,
            schemas: Vec::new(),
            tables: Vec::new(),
            chosen_schema: schema,
            chosen_table: table,
            state: UploadState::Idle,
            notification: None,
            runtime,
            pipe: None,
            tasks: Vec::new(),
        };
        app.refresh_catalog();
        Ok(app)
    }

    /// Current destination, if both a schema and a table are selected.
    fn target(&self) -> Option<UploadTarget> {
        match (&self.chosen_schema, &self.chosen_table) {
            (Some(schema), Some(table)) => Some(UploadTarget::new(schema.as_str(), table.as_str())),
            _ => None,
        }
    }

    /// Re-reads the schema list, then the tables of the selected schema.
    ///
    /// Keeps the current selection if it is still listed, else picks the first schema.
    fn refresh_catalog(&mut self) {
        let schemas = self
            .database
            .session()
            .and_then(|session| list_schemas(&session));

        match schemas {
            Ok(schemas) => self.schemas = schemas,
            Err(err) => {
                self.schemas.clear();
                self.notify_error("Reading the schema list failed", err);
            }
        }

        self.chosen_schema = keep_or_first(self.chosen_schema.take(), &self.schemas);
        self.refresh_tables();
    }

    /// Re-reads the tables of the selected schema.
    fn refresh_tables(&mut self) {
        let Some(schema) = self.chosen_schema.clone() else {
            self.tables.clear();
            self.chosen_table = None;
            return;
        };

        let tables = self
            .database
            .session()
            .and_then(|session| list_tables(&session, &schema));

        match tables {
            Ok(tables) => self.tables = tables,
            Err(err) => {
                self.tables.clear();
                self.notify_error("Reading the table list failed", err);
            }
        }

        self.chosen_table = keep_or_first(self.chosen_table.take(), &self.tables);
    }

    fn notify_error(&mut self, context: &str, err: UploaderError) {
        error!("{context}: {err}");
        self.notification = Some(ErrorNotice::new(context, &err));
    }

    /// Shows the error window, if any. "Retry" reads the catalog again.
    fn check_notification(&mut self, ctx: &Context) {
        let Some(notice) = &self.notification else {
            return;
        };

        match notice.show(ctx) {
            NoticeReply::Open => {}
            NoticeReply::Dismissed => self.notification = None,
            NoticeReply::Retry => {
                self.notification = None;
                self.refresh_catalog();
            }
        }
    }

    /// Polls the running upload, if any.
    ///
    /// Returns `true` while an upload is still in flight.
    fn check_upload_pending(&mut self) -> bool {
        let Some(mut output) = self.pipe.take() else {
            return false;
        };

        let file = match &self.state {
            UploadState::FileReceived(file) => file.clone(),
            _ => String::new(),
        };

        let report = match output.try_recv() {
            Ok(report) => report,
            Err(TryRecvError::Empty) => {
                self.pipe = Some(output);
                return true;
            }
            Err(TryRecvError::Closed) => Err(UploaderError::ChannelReceive(
                "upload ended without a response".to_string(),
            )),
        };

        let (outcome, task_error) = settle_report(report);
        if let Some(err) = task_error {
            self.notify_error("Upload task failed", err);
        }
        self.state = UploadState::Finished { file, outcome };
        false
    }

    /// Starts uploading the file at `path` into the selected destination.
    fn upload_path(&mut self, path: PathBuf, ctx: &Context) {
        let Some(target) = self.target() else {
            self.notify_missing_target();
            return;
        };

        let database = self.database.clone();
        let options = self.csv_options.clone();
        self.state = UploadState::FileReceived(display_name(&path));

        let future = async move {
            match PickedFile::read(&path).await {
                Ok(file) => upload_in_background(database, target, Some(file.bytes), options).await,
                Err(err) => Ok(UploadOutcome::Failed(UploadError::Parse(err.to_string()))),
            }
        };
        self.run_upload_future(Box::new(Box::pin(future)), ctx);
    }

    /// Starts uploading a file that is already in memory (drag and drop without a path).
    fn upload_bytes(&mut self, file: PickedFile, ctx: &Context) {
        let Some(target) = self.target() else {
            self.notify_missing_target();
            return;
        };

        self.state = UploadState::FileReceived(file.name);
        let future = upload_in_background(
            self.database.clone(),
            target,
            Some(file.bytes),
            self.csv_options.clone(),
        );
        self.run_upload_future(Box::new(Box::pin(future)), ctx);
    }

    fn notify_missing_target(&mut self) {
        self.notification = Some(ErrorNotice::message(
            "No destination selected",
            "Select a schema and a table before choosing a file.",
        ));
    }

    /// Spawns `future` on the runtime and wires its result to `self.pipe`.
    fn run_upload_future(&mut self, future: UploadFuture, ctx: &Context) {
        self.tasks.retain(|task| !task.is_finished());

        let (tx, rx) = oneshot::channel::<UploadReport>();
        self.pipe = Some(rx);

        let ctx_clone = ctx.clone();

        let handle = self.runtime.spawn(async move {
            let report = future.await;
            if tx.send(report).is_err() {
                error!("Receiver dropped before the upload result could be sent.");
            }
            ctx_clone.request_repaint();
        });

        self.tasks.push(handle);
    }

    /// Handles files dropped onto the window.
    fn check_dropped_file(&mut self, ctx: &Context) {
        let Some(dropped_file) = ctx.input(|i| i.raw.dropped_files.last().cloned()) else {
            return;
        };

        if let Some(path) = dropped_file.path {
            self.upload_path(path, ctx);
        } else if let Some(bytes) = dropped_file.bytes {
            let file = PickedFile {
                name: dropped_file.name,
                bytes: bytes.to_vec(),
            };
            self.upload_bytes(file, ctx);
        }
    }

    fn render_side_panel(&mut self, ui: &mut Ui) {
        ui.heading("Instructions:");
        ui.add_space(8.0);
        for step in INSTRUCTIONS {
            ui.label(format!("• {step}"));
        }

        ui.separator();
        ui.label(format!("Database: {}", self.database.name()));
        if ui.button("Refresh catalog").clicked() {
            self.refresh_catalog();
        }
    }

    /// Radio buttons over `self.schemas`. Returns `true` if the selection changed.
    fn render_schema_selector(&mut self, ui: &mut Ui) -> bool {
        let mut changed = false;
        ui.label(RichText::new("Select schema:").strong());
        if self.schemas.is_empty() {
            ui.weak("No schemas with tables found.");
        }
        for schema in &self.schemas {
            changed |= ui
                .radio_value(&mut self.chosen_schema, Some(schema.clone()), schema.as_str())
                .changed();
        }
        changed
    }

    fn render_table_selector(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Select table to upload to:").strong());
        if self.tables.is_empty() {
            ui.weak("No tables in this schema.");
        }
        for table in &self.tables {
            ui.radio_value(&mut self.chosen_table, Some(table.clone()), table.as_str());
        }
    }

    /// File picker row. Returns the chosen path, if any.
    fn render_file_picker(&mut self, ui: &mut Ui) -> Option<PathBuf> {
        let label = match self.target() {
            Some(target) => target.describe(),
            None => describe_target("?", "?"),
        };
        ui.label(RichText::new(label).strong());

        let mut picked = None;
        ui.horizontal(|ui| {
            if ui.button("Browse files").clicked() {
                picked = chosen_path(self.runtime.block_on(open_file()));
            }
            ui.weak("or drag and drop a CSV file here.");
        });
        picked
    }

    fn render_status(&self, ui: &mut Ui) {
        let message = self.state.status_message();
        match &self.state {
            UploadState::Idle => {
                ui.label(message);
            }
            UploadState::FileReceived(_) => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(message);
                });
            }
            UploadState::Finished { file, outcome } => {
                let color = ui.ctx().outcome_color(outcome);
                if !file.is_empty() {
                    ui.weak(file.as_str());
                }
                ui.colored_label(color, message);

                if let UploadOutcome::Succeeded { preview, .. } = outcome
                    && preview.height() > 0
                {
                    ui.add_space(8.0);
                    ScrollArea::horizontal()
                        .auto_shrink([false, false])
                        .show(ui, |ui| render_preview(preview, ui));
                }
            }
        }
    }
}

/// Splits what the upload task sent back into the outcome to display and,
/// when the task itself failed, the error to report.
///
/// A failed task is never a lost connection: it becomes a non-retryable `Internal` failure.
fn settle_report(report: UploadReport) -> (UploadOutcome, Option<UploaderError>) {
    match report {
        Ok(outcome) => (outcome, None),
        Err(err) => {
            let outcome = UploadOutcome::Failed(UploadError::Internal(err.to_string()));
            (outcome, Some(err))
        }
    }
}

/// Path picked in the file dialog. A cancelled or failed dialog is logged and yields `None`.
fn chosen_path(result: UploaderResult<PathBuf>) -> Option<PathBuf> {
    match result {
        Ok(path) => Some(path),
        Err(err) => {
            debug!("fn chosen_path()\nno file picked: {err}");
            None
        }
    }
}

/// Keeps `current` if it is among `options`, else falls back to the first option.
fn keep_or_first(current: Option<String>, options: &[String]) -> Option<String> {
    match current {
        Some(name) if options.contains(&name) => Some(name),
        _ => options.first().cloned(),
    }
}

impl eframe::App for UploaderApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.check_notification(ctx);

        let pending = self.check_upload_pending();
        if !pending {
            self.check_dropped_file(ctx);
        }

        //  | title                 theme |
        //  -------------------------------
        //  |              |              |
        //  | instructions |  selectors   |
        //  |              |  status      |

        TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Manual CSV to Table Uploader");

                // Push the theme switch to the right.
                let delta = ui.available_width() - 15.0;
                if delta > 0.0 {
                    ui.add_space(delta);
                    widgets::global_theme_preference_switch(ui);
                }
            });
        });

        SidePanel::left("side_panel")
            .resizable(true)
            .show(ctx, |ui| {
                ScrollArea::vertical().show(ui, |ui| self.render_side_panel(ui));
            });

        // CentralPanel must be added after all other panels in your egui layout!
        CentralPanel::default().show(ctx, |ui| {
            warn_if_debug_build(ui);

            // No new selection or file while an upload is in flight.
            if pending {
                ui.disable();
            }

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if self.render_schema_selector(ui) {
                        self.refresh_tables();
                    }
                    ui.separator();

                    self.render_table_selector(ui);
                    ui.separator();

                    if let Some(path) = self.render_file_picker(ui) {
                        self.upload_path(path, ctx);
                    }
                    ui.separator();

                    self.render_status(ui);
                });
        });
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

#[cfg(test)]
mod tests_layout {
    use super::*;
    use polars::prelude::DataFrame;

    #[test]
    fn keep_or_first_prefers_current_selection() {
        let options = vec!["hr".to_string(), "sales".to_string()];

        assert_eq!(
            keep_or_first(Some("sales".to_string()), &options),
            Some("sales".to_string())
        );
        assert_eq!(
            keep_or_first(Some("gone".to_string()), &options),
            Some("hr".to_string())
        );
        assert_eq!(keep_or_first(None, &options), Some("hr".to_string()));
        assert_eq!(keep_or_first(Some("hr".to_string()), &[]), None);
    }

    #[test]
    fn task_failures_are_internal_not_retryable() {
        let report = Err(UploaderError::ChannelReceive("sender dropped".to_string()));
        let (outcome, task_error) = settle_report(report);

        match &outcome {
            UploadOutcome::Failed(error) => {
                assert!(matches!(error, UploadError::Internal(_)));
                assert!(!error.is_retryable());
            }
            other => panic!("expected a failed upload, got {other:?}"),
        }
        assert!(matches!(task_error, Some(UploaderError::ChannelReceive(_))));
        assert!(outcome.to_string().starts_with("Your upload was not successful."));
    }

    #[test]
    fn cancelled_dialog_picks_nothing() {
        let cancelled = Err(UploaderError::Other("No file selected.".to_string()));
        assert_eq!(chosen_path(cancelled), None);
        assert_eq!(
            chosen_path(Ok(PathBuf::from("orders.csv"))),
            Some(PathBuf::from("orders.csv"))
        );
    }

    #[test]
    fn finished_uploads_pass_through() {
        let report = Ok(UploadOutcome::Failed(UploadError::Connectivity("gone".into())));
        let (outcome, task_error) = settle_report(report);

        assert!(task_error.is_none());
        assert_eq!(
            outcome,
            UploadOutcome::Failed(UploadError::Connectivity("gone".into()))
        );
    }

    #[test]
    fn status_follows_the_upload_state() {
        assert_eq!(
            UploadState::Idle.status_message(),
            "Awaiting file to upload..."
        );
        assert_eq!(
            UploadState::FileReceived("orders.csv".to_string()).status_message(),
            "Uploading orders.csv..."
        );

        let finished = UploadState::Finished {
            file: "orders.csv".to_string(),
            outcome: UploadOutcome::Succeeded {
                rows: 3,
                preview: DataFrame::default(),
            },
        };
        assert_eq!(
            finished.status_message(),
            "Your upload was a success. You uploaded 3 rows."
        );
    }
}
