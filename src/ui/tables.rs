use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::config::DashboardConfig;
use crate::data::filter::FilteredView;
use crate::data::model::Dataset;
use crate::data::stats::Description;
use crate::state::SessionState;

// ---------------------------------------------------------------------------
// Central panel – preview, summary and filtered rows
// ---------------------------------------------------------------------------

pub fn overview(ui: &mut Ui, session: &SessionState, config: &DashboardConfig) {
    let Some(ws) = session.workspace() else {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add_space(40.0);
            ui.heading("📊 Simple Data Dashboard");
            ui.label("Upload a CSV file to begin analysis.  (File → Open…)");
        });
        return;
    };
    let ds = &ws.dataset;

    ui.heading("🔍 Data Preview");
    let head = ds.head(config.preview_rows);
    let mut headers = vec!["#".to_string()];
    headers.extend(ds.column_names.iter().cloned());
    grid(ui, "preview", &headers, head.len(), 240.0, |row, col| {
        if col == 0 {
            row.to_string()
        } else {
            head[row][col - 1].to_string()
        }
    });

    ui.add_space(8.0);
    ui.heading("📊 Data Summary");
    summary_table(ui, &ws.summary);

    egui::CollapsingHeader::new("Column overview")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            let columns = &ws.column_overview;
            let headers: Vec<String> = ["column", "type", "non-null", "nulls", "unique"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            grid(ui, "column_overview", &headers, columns.len(), 300.0, |row, col| {
                let c = &columns[row];
                match col {
                    0 => c.column.clone(),
                    1 => c.kind.to_string(),
                    2 => c.non_null.to_string(),
                    3 => c.nulls.to_string(),
                    _ => c.unique.to_string(),
                }
            });
        });

    ui.add_space(8.0);
    ui.heading(format!("🎚 Filtered Data  ({} of {} rows)", ws.view.len(), ds.len()));
    filtered_table(ui, ds, &ws.view);
}

fn summary_table(ui: &mut Ui, summary: &Description) {
    match summary {
        Description::Numeric(summaries) => {
            let mut headers = vec![String::new()];
            headers.extend(summaries.iter().map(|s| s.column.clone()));
            let labels = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
            grid(ui, "describe", &headers, labels.len(), 260.0, |row, col| {
                if col == 0 {
                    return labels[row].to_string();
                }
                let s = &summaries[col - 1];
                let value = match row {
                    0 => return s.count.to_string(),
                    1 => s.mean,
                    2 => s.std,
                    3 => s.min,
                    4 => s.q1,
                    5 => s.median,
                    6 => s.q3,
                    _ => s.max,
                };
                fmt_stat(value)
            });
        }
        Description::Text(summaries) => {
            let mut headers = vec![String::new()];
            headers.extend(summaries.iter().map(|s| s.column.clone()));
            let labels = ["count", "unique", "top", "freq"];
            grid(ui, "describe_text", &headers, labels.len(), 160.0, |row, col| {
                if col == 0 {
                    return labels[row].to_string();
                }
                let s = &summaries[col - 1];
                match row {
                    0 => s.count.to_string(),
                    1 => s.unique.to_string(),
                    2 => s.top.as_ref().map(|v| v.to_string()).unwrap_or_default(),
                    _ => s.freq.to_string(),
                }
            });
        }
    }
}

fn filtered_table(ui: &mut Ui, ds: &Dataset, view: &FilteredView) {
    if view.is_empty() {
        ui.label("No rows match the current filter.");
        return;
    }
    let mut headers = vec!["row".to_string()];
    headers.extend(ds.column_names.iter().cloned());
    grid(ui, "filtered", &headers, view.len(), 320.0, |row, col| {
        let idx = view.indices[row];
        if col == 0 {
            idx.to_string()
        } else {
            ds.rows[idx][col - 1].to_string()
        }
    });
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "NaN".to_string())
}

/// A striped, virtualised table; `cell(row, col)` renders one cell.
fn grid(
    ui: &mut Ui,
    id: &str,
    headers: &[String],
    n_rows: usize,
    max_height: f32,
    cell: impl Fn(usize, usize) -> String,
) {
    ui.push_id(id, |ui: &mut Ui| {
        let text_height = egui::TextStyle::Body.resolve(ui.style()).size * 1.5;
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .min_scrolled_height(0.0)
            .max_scroll_height(max_height)
            .vscroll(true);
        for _ in headers {
            builder = builder.column(
                Column::initial(110.0)
                    .at_least(50.0)
                    .at_most(400.0)
                    .clip(true)
                    .resizable(true),
            );
        }

        builder
            .header(20.0, |mut header| {
                for name in headers {
                    header.col(|ui| {
                        ui.strong(name.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(text_height, n_rows, |mut row| {
                    let r = row.index();
                    for c in 0..headers.len() {
                        row.col(|ui| {
                            ui.label(cell(r, c));
                        });
                    }
                });
            });
    });
}
