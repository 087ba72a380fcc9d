use eframe::egui::{self, Color32, RichText, Ui};

use crate::app::{Status, UiState};
use crate::config::DashboardConfig;
use crate::data::chart::ChartKind;
use crate::data::clean::CleaningOp;
use crate::data::filter::{FilterControl, FilterPredicate};
use crate::data::{export, loader};
use crate::state::{Action, SessionState, Workspace};

const NO_FILTER: &str = "(no filter)";

// ---------------------------------------------------------------------------
// Left side panel – filter and plot widgets
// ---------------------------------------------------------------------------

/// Render the left control panel. Widgets never touch the session directly;
/// they push [`Action`]s that the app applies after the frame.
pub fn side_panel(ui: &mut Ui, session: &SessionState, actions: &mut Vec<Action>) {
    ui.heading("Filter Data");
    ui.separator();

    let Some(ws) = session.workspace() else {
        ui.label("Upload a CSV file to begin analysis  (File → Open…)");
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            filter_widgets(ui, ws, actions);

            if let Some(notice) = &ws.notice {
                ui.add_space(4.0);
                ui.label(RichText::new(notice).color(Color32::RED));
            }

            ui.add_space(12.0);
            ui.heading("Plot Data");
            ui.separator();
            plot_widgets(ui, ws, actions);
        });
}

fn filter_widgets(ui: &mut Ui, ws: &Workspace, actions: &mut Vec<Action>) {
    ui.strong("Select column to filter by");
    let current = ws.filter.as_ref().map(|f| f.column.as_str());
    egui::ComboBox::from_id_salt("filter_column")
        .selected_text(current.unwrap_or(NO_FILTER))
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), NO_FILTER).clicked() && current.is_some() {
                actions.push(Action::ClearFilter);
            }
            for col in &ws.dataset.column_names {
                if ui
                    .selectable_label(current == Some(col.as_str()), col)
                    .clicked()
                    && current != Some(col.as_str())
                {
                    actions.push(Action::SelectFilterColumn(col.clone()));
                }
            }
        });

    let Some(filter) = &ws.filter else {
        return;
    };

    ui.add_space(4.0);
    match (&filter.control, &filter.predicate) {
        (FilterControl::Choices(values), predicate) => {
            ui.strong("Select value");
            let selected = match predicate {
                Some(FilterPredicate::Equals(v)) => Some(v),
                _ => None,
            };
            egui::ComboBox::from_id_salt("filter_value")
                .selected_text(selected.map(|v| v.to_string()).unwrap_or_default())
                .show_ui(ui, |ui: &mut Ui| {
                    for value in values {
                        if ui
                            .selectable_label(selected == Some(value), value.to_string())
                            .clicked()
                        {
                            actions.push(Action::ChooseValue(value.clone()));
                        }
                    }
                });
        }
        (FilterControl::Range { min, max }, predicate) => {
            ui.strong(format!("Select range for {}", filter.column));
            let (mut lo, mut hi) = match predicate {
                Some(FilterPredicate::Range { min: lo, max: hi }) => (*lo, *hi),
                _ => (*min, *max),
            };
            let lo_changed = ui
                .add(egui::Slider::new(&mut lo, *min..=*max).text("from"))
                .changed();
            let hi_changed = ui
                .add(egui::Slider::new(&mut hi, *min..=*max).text("to"))
                .changed();
            if lo_changed {
                hi = hi.max(lo);
            } else if hi_changed {
                lo = lo.min(hi);
            }
            if lo_changed || hi_changed {
                actions.push(Action::SetRange { min: lo, max: hi });
            }
        }
        (FilterControl::DateSpan { first, last }, predicate) => {
            ui.strong(format!("Select dates for {}", filter.column));
            let (mut start, mut end) = match predicate {
                Some(FilterPredicate::DateSpan { start, end }) => (*start, *end),
                _ => (*first, *last),
            };
            let mut changed = false;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("from");
                changed |= ui
                    .push_id("span_start", |ui| ui.add(egui_extras::DatePickerButton::new(&mut start)))
                    .inner
                    .changed();
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("to");
                changed |= ui
                    .push_id("span_end", |ui| ui.add(egui_extras::DatePickerButton::new(&mut end)))
                    .inner
                    .changed();
            });
            if changed {
                actions.push(Action::SetDateSpan { start, end });
            }
        }
        (FilterControl::Empty, _) => {
            ui.label(RichText::new("This column has no values to choose from.").italics());
        }
    }

    ui.label(format!(
        "{} of {} rows match",
        ws.view.len(),
        ws.dataset.len()
    ));
}

fn plot_widgets(ui: &mut Ui, ws: &Workspace, actions: &mut Vec<Action>) {
    if !ws.plotting_enabled() {
        ui.label(
            RichText::new("No numeric columns available for plotting. Upload a valid dataset.")
                .color(Color32::YELLOW),
        );
        return;
    }

    let request = &ws.request;

    ui.strong("Chart");
    egui::ComboBox::from_id_salt("chart_kind")
        .selected_text(request.kind.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ChartKind::ALL {
                if ui.selectable_label(request.kind == kind, kind.label()).clicked()
                    && request.kind != kind
                {
                    actions.push(Action::SelectChart(kind));
                }
            }
        });

    if request.kind.uses_x() {
        ui.strong("Select X-axis");
        axis_combo(ui, "x_axis", request.x_column.as_deref(), &ws.dataset.column_names, |c| {
            actions.push(Action::SelectX(c))
        });
    }

    if request.kind.uses_y() {
        ui.strong("Select Y-axis (numeric only)");
        axis_combo(ui, "y_axis", request.y_column.as_deref(), ws.numeric_columns(), |c| {
            actions.push(Action::SelectY(c))
        });
    }

    ui.add_space(8.0);
    if ui.button("📊 Generate Plot").clicked() {
        actions.push(Action::RequestPlot);
    }
}

fn axis_combo(
    ui: &mut Ui,
    id: &str,
    current: Option<&str>,
    options: &[String],
    mut on_select: impl FnMut(String),
) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.unwrap_or_default())
        .show_ui(ui, |ui: &mut Ui| {
            for col in options {
                if ui.selectable_label(current == Some(col.as_str()), col).clicked()
                    && current != Some(col.as_str())
                {
                    on_select(col.clone());
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(
    ui: &mut Ui,
    session: &SessionState,
    config: &DashboardConfig,
    ui_state: &mut UiState,
    actions: &mut Vec<Action>,
) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(config, ui_state, actions);
                ui.close_menu();
            }
            let loaded = session.workspace();
            if ui
                .add_enabled(loaded.is_some(), egui::Button::new("Export CSV…"))
                .clicked()
            {
                if let Some(ws) = loaded {
                    export_file_dialog(ws, ui_state);
                }
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Close dataset").clicked() {
                actions.push(Action::Reset);
                ui_state.status = None;
                ui.close_menu();
            }
        });

        ui.add_enabled_ui(session.workspace().is_some(), |ui: &mut Ui| {
            ui.menu_button("Clean", |ui: &mut Ui| {
                if let Some(ws) = session.workspace() {
                    cleaning_menu(ui, ws, ui_state, actions);
                }
            });
        });

        ui.separator();

        if let Some(ws) = session.workspace() {
            ui.label(format!(
                "{} rows × {} columns loaded, {} visible",
                ws.dataset.len(),
                ws.dataset.column_count(),
                ws.view.len()
            ));
        }

        match &ui_state.status {
            Some(Status::Error(msg)) => {
                ui.separator();
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(Status::Info(msg)) => {
                ui.separator();
                ui.label(msg);
            }
            None => {}
        }
    });
}

fn cleaning_menu(ui: &mut Ui, ws: &Workspace, ui_state: &mut UiState, actions: &mut Vec<Action>) {
    if ui.button("Remove duplicate rows").clicked() {
        actions.push(Action::Clean(CleaningOp::RemoveDuplicates));
        ui.close_menu();
    }

    ui.separator();
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Fill missing with");
        ui.add(egui::TextEdit::singleline(&mut ui_state.fill_value).desired_width(80.0));
        if ui.button("Fill").clicked() {
            actions.push(Action::Clean(CleaningOp::FillMissing(ui_state.fill_value.clone())));
            ui.close_menu();
        }
    });

    ui.separator();
    ui.label("Drop columns");
    for col in &ws.dataset.column_names {
        let mut checked = ui_state.drop_selection.contains(col);
        if ui.checkbox(&mut checked, col.as_str()).changed() {
            if checked {
                ui_state.drop_selection.insert(col.clone());
            } else {
                ui_state.drop_selection.remove(col);
            }
        }
    }
    if ui
        .add_enabled(!ui_state.drop_selection.is_empty(), egui::Button::new("Drop selected"))
        .clicked()
    {
        let names: Vec<String> = std::mem::take(&mut ui_state.drop_selection).into_iter().collect();
        actions.push(Action::Clean(CleaningOp::DropColumns(names)));
        ui.close_menu();
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(config: &DashboardConfig, ui_state: &mut UiState, actions: &mut Vec<Action>) {
    let file = rfd::FileDialog::new()
        .set_title("Open a data file")
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_file(&path, &config.load_options()) {
            Ok(dataset) => {
                ui_state.status = Some(Status::Info(format!(
                    "Opened {}",
                    path.file_name().and_then(|n| n.to_str()).unwrap_or("file")
                )));
                actions.push(Action::Upload(dataset));
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                ui_state.status = Some(Status::Error(format!("Error: {e:#}")));
            }
        }
    }
}

pub fn export_file_dialog(ws: &Workspace, ui_state: &mut UiState) {
    let file = rfd::FileDialog::new()
        .set_title("Export cleaned data")
        .add_filter("CSV", &["csv"])
        .set_file_name("cleaned_data.csv")
        .save_file();

    if let Some(path) = file {
        match export::save_csv(&ws.dataset, &path) {
            Ok(()) => {
                ui_state.status = Some(Status::Info(format!("Exported to {}", path.display())));
            }
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                ui_state.status = Some(Status::Error(format!("Error: {e:#}")));
            }
        }
    }
}
