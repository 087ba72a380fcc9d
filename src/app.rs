use std::collections::BTreeSet;

use eframe::egui;

use crate::config::DashboardConfig;
use crate::state::{Action, SessionState};
use crate::ui::{panels, plot, tables};

// ---------------------------------------------------------------------------
// Widget state that is not part of the session
// ---------------------------------------------------------------------------

/// Message shown in the top bar after a file operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Text inputs and pending selections owned by the widgets themselves.
#[derive(Debug, Default)]
pub struct UiState {
    pub status: Option<Status>,
    /// Text of the fill-missing input.
    pub fill_value: String,
    /// Columns ticked in the drop-columns menu.
    pub drop_selection: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyDashboardApp {
    pub session: SessionState,
    pub config: DashboardConfig,
    pub ui: UiState,
}

impl RustyDashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        let ui = UiState {
            fill_value: config.default_fill.clone(),
            ..Default::default()
        };
        Self {
            session: SessionState::default(),
            config,
            ui,
        }
    }

    /// Feed the actions collected during this frame through the state machine.
    fn apply_actions(&mut self, actions: Vec<Action>) {
        for action in actions {
            if matches!(action, Action::Upload(_) | Action::Reset) {
                self.ui.drop_selection.clear();
            }
            let prior = std::mem::take(&mut self.session);
            self.session = prior.apply(action, &self.config);
        }
    }
}

impl eframe::App for RustyDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions = Vec::new();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.session, &self.config, &mut self.ui, &mut actions);
        });

        // ---- Left side panel: filter + plot controls ----
        egui::SidePanel::left("control_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.session, &mut actions);
            });

        // ---- Central panel: tables + chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    tables::overview(ui, &self.session, &self.config);
                    ui.separator();
                    plot::chart_area(ui, &self.session);
                });
        });

        self.apply_actions(actions);
    }
}
