//! Look and feel of the uploader window, and the error pop-up it shows.

use crate::{UploadOutcome, UploaderError};

use egui::{
    Align2, Color32, Context,
    FontFamily::{Monospace as Mono, Proportional},
    FontId, Frame, RichText,
    TextStyle::{Body, Button, Heading, Monospace, Small},
    Vec2, Window,
};

/// Font sizes of the uploader window.
pub const UPLOADER_TEXT_STYLES: [(egui::TextStyle, egui::FontId); 5] = [
    (Heading, FontId::new(22.0, Proportional)),
    (Body, FontId::new(16.0, Proportional)),
    (Button, FontId::new(16.0, Proportional)),
    (Monospace, FontId::new(14.0, Mono)),
    (Small, FontId::new(13.0, Proportional)),
];

/// Styling helpers applied to the `egui` context.
pub trait UploaderStyle {
    /// Sets fonts and spacing for both the light and the dark theme.
    fn apply_uploader_style(&self);

    /// Colour of the status line for `outcome`, readable in the current theme.
    fn outcome_color(&self, outcome: &UploadOutcome) -> Color32;
}

impl UploaderStyle for Context {
    fn apply_uploader_style(&self) {
        self.all_styles_mut(|style| {
            style.text_styles = UPLOADER_TEXT_STYLES.into();
            style.spacing.item_spacing = Vec2::new(8.0, 6.0);
            style.spacing.scroll.handle_min_length = 32.0;
        });
    }

    fn outcome_color(&self, outcome: &UploadOutcome) -> Color32 {
        let visuals = self.style().visuals.clone();
        match (outcome, visuals.dark_mode) {
            (UploadOutcome::Succeeded { .. }, true) => Color32::LIGHT_GREEN,
            (UploadOutcome::Succeeded { .. }, false) => Color32::DARK_GREEN,
            (UploadOutcome::Failed(_), true) => Color32::LIGHT_RED,
            (UploadOutcome::Failed(_), false) => Color32::DARK_RED,
            (UploadOutcome::NoFileProvided, _) => visuals.text_color(),
        }
    }
}

/// What the user did with an [`ErrorNotice`] this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeReply {
    Open,
    Dismissed,
    Retry,
}

/// Error window: what was being done, the underlying error, and a
/// "Retry" button when repeating the request may help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub context: String,
    pub detail: String,
    pub retryable: bool,
}

impl ErrorNotice {
    /// Notice for a failed request; retryable when `error` is.
    pub fn new(context: impl Into<String>, error: &UploaderError) -> Self {
        ErrorNotice {
            context: context.into(),
            detail: error.to_string(),
            retryable: error.is_retryable(),
        }
    }

    /// Notice that no retry can fix.
    pub fn message(context: impl Into<String>, detail: impl Into<String>) -> Self {
        ErrorNotice {
            context: context.into(),
            detail: detail.into(),
            retryable: false,
        }
    }

    pub fn show(&self, ctx: &Context) -> NoticeReply {
        let mut open = true;
        let mut retry = false;

        Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(RichText::new(&self.context).strong());
                if !self.detail.is_empty() {
                    Frame::group(ui.style())
                        .fill(ui.visuals().extreme_bg_color)
                        .show(ui, |ui| {
                            ui.label(RichText::new(&self.detail).monospace());
                        });
                }
                if self.retryable {
                    ui.add_space(4.0);
                    retry = ui.button("Retry").clicked();
                }
            });

        match (retry, open) {
            (true, _) => NoticeReply::Retry,
            (false, true) => NoticeReply::Open,
            (false, false) => NoticeReply::Dismissed,
        }
    }
}

#[cfg(test)]
mod tests_error_notice {
    use super::*;

    #[test]
    fn catalog_errors_offer_a_retry() {
        let error = UploaderError::CatalogUnavailable("database is locked".to_string());
        let notice = ErrorNotice::new("Reading the schema list failed", &error);

        assert_eq!(notice.context, "Reading the schema list failed");
        assert_eq!(notice.detail, "Catalog unavailable: database is locked");
        assert!(notice.retryable);
    }

    #[test]
    fn internal_errors_do_not() {
        let error = UploaderError::ChannelReceive("sender dropped".to_string());
        assert!(!ErrorNotice::new("Upload task failed", &error).retryable);
        assert!(!ErrorNotice::message("Select a table first.", "").retryable);
    }

    #[test]
    fn status_colors_follow_the_theme() {
        let ctx = Context::default();
        let failed = UploadOutcome::Failed(crate::UploadError::Write("boom".to_string()));

        ctx.set_visuals(egui::Visuals::dark());
        assert_eq!(ctx.outcome_color(&failed), Color32::LIGHT_RED);

        ctx.set_visuals(egui::Visuals::light());
        assert_eq!(ctx.outcome_color(&failed), Color32::DARK_RED);
    }
}
