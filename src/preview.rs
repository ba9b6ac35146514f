use egui::{Direction, Layout, TextStyle, Ui};
use egui_extras::{Column, TableBuilder, TableRow};
use polars::prelude::*;

/// Decimal places used for float cells.
const PREVIEW_DECIMALS: usize = 2;

/// Formats one cell for display. Nulls are shown as empty strings.
pub fn format_cell(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float32(f) => format!("{:.*}", PREVIEW_DECIMALS, f),
        AnyValue::Float64(f) => format!("{:.*}", PREVIEW_DECIMALS, f),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        av => av.to_string(),
    }
}

/// Renders the rows of an upload as a read-only `egui` table.
pub fn render_preview(df: &DataFrame, ui: &mut Ui) {
    let header = |mut table_row: TableRow<'_, '_>| {
        for column_name in df.get_column_names() {
            table_row.col(|ui| {
                ui.strong(column_name.as_str());
            });
        }
    };

    let rows = |mut table_row: TableRow<'_, '_>| {
        let row_index = table_row.index();

        for column in df.columns() {
            let dtype = column.dtype();

            let layout = if dtype.is_float() {
                Layout::right_to_left(egui::Align::Center)
            } else if dtype.is_integer() || dtype.is_bool() {
                Layout::centered_and_justified(Direction::LeftToRight)
            } else {
                Layout::left_to_right(egui::Align::Center)
            };

            let value = match column.get(row_index) {
                Ok(any_value) => format_cell(any_value),
                Err(_) => "Error: Value not found".to_string(),
            };

            table_row.col(|ui| {
                ui.with_layout(layout.with_main_wrap(false), |ui| {
                    ui.label(value);
                });
            });
        }
    };

    let style = ui.style();
    let text_height = TextStyle::Body.resolve(style).size;
    let col_number = df.width().max(1) as f32;
    let available_space = ui.available_width()
        - col_number * style.spacing.item_spacing.x
        - style.spacing.scroll.bar_width;

    let initial_col_width = available_space / col_number;
    let header_height = style.spacing.interact_size.y + 2.0 * style.spacing.item_spacing.y;
    let min_col_width = style.spacing.interact_size.x.max(initial_col_width / 4.0);

    let column = Column::initial(initial_col_width)
        .at_least(min_col_width)
        .resizable(true)
        .clip(true);

    TableBuilder::new(ui)
        .striped(true)
        .columns(column, df.width())
        .column(Column::remainder())
        .auto_shrink([false, false])
        .header(header_height, header)
        .body(|body| {
            body.rows(text_height, df.height(), rows);
        });
}
