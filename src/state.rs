use chrono::NaiveDate;
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::data::chart::{ChartData, ChartKind, PlotError, PlotRequest, build_chart};
use crate::data::clean::CleaningOp;
use crate::data::filter::{FilterControl, FilterPredicate, FilterSpec, FilteredView, apply_filter};
use crate::data::model::{CellValue, Dataset};
use crate::data::stats::{self, ColumnSummary, Description};

// ---------------------------------------------------------------------------
// Actions and errors
// ---------------------------------------------------------------------------

/// One user interaction. The UI collects these during a frame and feeds them
/// to [`SessionState::apply`] in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the dataset with a newly loaded one.
    Upload(Dataset),
    SelectFilterColumn(String),
    ClearFilter,
    ChooseValue(CellValue),
    SetRange { min: f64, max: f64 },
    SetDateSpan { start: NaiveDate, end: NaiveDate },
    SelectChart(ChartKind),
    SelectX(String),
    SelectY(String),
    /// The "Generate plot" button.
    RequestPlot,
    Clean(CleaningOp),
    Reset,
}

/// Misuse of a selection. Reported as a notice; the state stays usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("Column '{0}' does not exist")]
    UnknownColumn(String),
    #[error("Select a column to filter by first")]
    NoActiveFilter,
    #[error("Column '{0}' cannot be filtered with that selection")]
    PredicateMismatch(String),
    #[error("Only numeric columns can be used for the Y axis, '{0}' is not numeric")]
    NonNumericY(String),
}

pub type PlotOutcome = Result<ChartData, PlotError>;

// ---------------------------------------------------------------------------
// Workspace: everything derived from one loaded dataset
// ---------------------------------------------------------------------------

/// The chosen filter column, the widget it calls for, and its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveFilter {
    pub column: String,
    pub control: FilterControl,
    /// `None` when the column has nothing to choose from.
    pub predicate: Option<FilterPredicate>,
}

impl ActiveFilter {
    fn new(dataset: &Dataset, column: &str, col: usize) -> Self {
        let control = FilterControl::for_column(dataset, col);
        let predicate = control.default_predicate();
        Self {
            column: column.to_string(),
            control,
            predicate,
        }
    }

    pub fn spec(&self) -> Option<FilterSpec> {
        self.predicate.as_ref().map(|predicate| FilterSpec {
            column: self.column.clone(),
            predicate: predicate.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub dataset: Dataset,
    pub filter: Option<ActiveFilter>,
    /// Always a subset of `dataset.rows`; recomputed on every filter change.
    pub view: FilteredView,
    pub request: PlotRequest,
    /// Last selection problem, cleared by the next action.
    pub notice: Option<String>,
    /// `describe()` of the whole dataset, recomputed only when it changes.
    pub summary: Description,
    pub column_overview: Vec<ColumnSummary>,
    numeric: Vec<String>,
}

impl Workspace {
    fn new(dataset: Dataset, config: &DashboardConfig) -> Self {
        let view = FilteredView::all(&dataset);
        let numeric = dataset.numeric_columns();
        let request = PlotRequest {
            kind: config.default_chart,
            x_column: dataset.column_names.first().cloned(),
            y_column: numeric.first().cloned(),
        };
        Self {
            summary: stats::describe(&dataset, &view),
            column_overview: stats::column_summary(&dataset),
            numeric,
            view,
            dataset,
            filter: None,
            request,
            notice: None,
        }
    }

    /// Columns offered for the Y axis.
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric
    }

    fn reprofile(&mut self) {
        self.numeric = self.dataset.numeric_columns();
        self.summary = stats::describe(&self.dataset, &FilteredView::all(&self.dataset));
        self.column_overview = stats::column_summary(&self.dataset);
    }

    /// Whether any chart can be drawn at all.
    pub fn plotting_enabled(&self) -> bool {
        !self.numeric.is_empty()
    }

    fn refilter(&mut self) {
        self.view = match self.filter.as_ref().and_then(ActiveFilter::spec) {
            Some(spec) => apply_filter(&self.dataset, &spec),
            None => FilteredView::all(&self.dataset),
        };
        log::debug!("{} of {} rows pass the filter", self.view.len(), self.dataset.len());
    }

    fn set_predicate(&mut self, predicate: FilterPredicate) -> Result<(), SessionError> {
        let filter = self.filter.as_mut().ok_or(SessionError::NoActiveFilter)?;
        if !filter.control.accepts(&predicate) {
            return Err(SessionError::PredicateMismatch(filter.column.clone()));
        }
        filter.predicate = Some(predicate);
        self.refilter();
        Ok(())
    }

    /// Bring the filter and axes back in line with the dataset after it
    /// changed shape (cleaning).
    fn revalidate(&mut self) {
        self.reprofile();
        self.filter = self.filter.take().and_then(|old| {
            let col = self.dataset.column_index(&old.column)?;
            let mut fresh = ActiveFilter::new(&self.dataset, &old.column, col);
            if let Some(predicate) = old.predicate.filter(|p| fresh.control.accepts(p)) {
                fresh.predicate = Some(predicate);
            }
            Some(fresh)
        });

        if self
            .request
            .x_column
            .as_deref()
            .map_or(true, |x| self.dataset.column_index(x).is_none())
        {
            self.request.x_column = self.dataset.column_names.first().cloned();
        }
        if self
            .request
            .y_column
            .as_ref()
            .map_or(true, |y| !self.numeric.contains(y))
        {
            self.request.y_column = self.numeric.first().cloned();
        }
        self.refilter();
    }

    /// Apply a selection. `Ok(Some(_))` means a plot was requested.
    fn handle(&mut self, action: Action, config: &DashboardConfig) -> Result<Option<PlotOutcome>, SessionError> {
        match action {
            Action::SelectFilterColumn(column) => {
                let col = self
                    .dataset
                    .column_index(&column)
                    .ok_or_else(|| SessionError::UnknownColumn(column.clone()))?;
                let filter = ActiveFilter::new(&self.dataset, &column, col);
                if filter.control == FilterControl::Empty {
                    log::warn!("Column '{column}' has no values to filter on");
                }
                self.filter = Some(filter);
                self.refilter();
            }
            Action::ClearFilter => {
                self.filter = None;
                self.refilter();
            }
            Action::ChooseValue(value) => self.set_predicate(FilterPredicate::Equals(value))?,
            Action::SetRange { min, max } => self.set_predicate(FilterPredicate::Range { min, max })?,
            Action::SetDateSpan { start, end } => {
                self.set_predicate(FilterPredicate::DateSpan { start, end })?
            }
            Action::SelectChart(kind) => self.request.kind = kind,
            Action::SelectX(column) => {
                if self.dataset.column_index(&column).is_none() {
                    return Err(SessionError::UnknownColumn(column));
                }
                self.request.x_column = Some(column);
            }
            Action::SelectY(column) => match self.dataset.kind_of(&column) {
                None => return Err(SessionError::UnknownColumn(column)),
                Some(kind) if !kind.is_numeric() => return Err(SessionError::NonNumericY(column)),
                Some(_) => self.request.y_column = Some(column),
            },
            Action::RequestPlot => {
                let outcome = build_chart(&self.dataset, &self.view, &self.request, config.histogram_bins);
                match &outcome {
                    Ok(_) => log::info!(
                        "Rendered {} over {} rows",
                        self.request.kind.label(),
                        self.view.len()
                    ),
                    Err(e) => log::warn!("Plot refused: {e}"),
                }
                return Ok(Some(outcome));
            }
            Action::Clean(op) => {
                let report = op.apply(&mut self.dataset);
                log::info!("Applied {op:?}: {report:?}");
                self.revalidate();
            }
            Action::Upload(_) | Action::Reset => {}
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Session state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded,
    Filtered,
    PlotRequested,
}

/// Idle → Loaded → Filtered → PlotRequested.
///
/// Any selection change after a plot drops back to Loaded/Filtered, so a
/// chart only exists right after an explicit request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Loaded(Workspace),
    Filtered(Workspace),
    PlotRequested {
        workspace: Workspace,
        outcome: PlotOutcome,
    },
}

impl SessionState {
    /// Take the prior state and one action, produce the next state.
    pub fn apply(self, action: Action, config: &DashboardConfig) -> SessionState {
        match action {
            Action::Upload(dataset) => {
                log::info!(
                    "New dataset: {} rows × {} columns",
                    dataset.len(),
                    dataset.column_count()
                );
                SessionState::Loaded(Workspace::new(dataset, config))
            }
            Action::Reset => SessionState::Idle,
            action => {
                let Some(mut workspace) = self.into_workspace() else {
                    log::debug!("Ignoring {action:?} with no dataset loaded");
                    return SessionState::Idle;
                };
                workspace.notice = None;
                match workspace.handle(action, config) {
                    Ok(Some(outcome)) => SessionState::PlotRequested { workspace, outcome },
                    Ok(None) => Self::settle(workspace),
                    Err(e) => {
                        log::warn!("{e}");
                        workspace.notice = Some(e.to_string());
                        Self::settle(workspace)
                    }
                }
            }
        }
    }

    fn settle(workspace: Workspace) -> SessionState {
        if workspace.filter.is_some() {
            SessionState::Filtered(workspace)
        } else {
            SessionState::Loaded(workspace)
        }
    }

    fn into_workspace(self) -> Option<Workspace> {
        match self {
            SessionState::Idle => None,
            SessionState::Loaded(ws) | SessionState::Filtered(ws) => Some(ws),
            SessionState::PlotRequested { workspace, .. } => Some(workspace),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            SessionState::Idle => Phase::Idle,
            SessionState::Loaded(_) => Phase::Loaded,
            SessionState::Filtered(_) => Phase::Filtered,
            SessionState::PlotRequested { .. } => Phase::PlotRequested,
        }
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        match self {
            SessionState::Idle => None,
            SessionState::Loaded(ws) | SessionState::Filtered(ws) => Some(ws),
            SessionState::PlotRequested { workspace, .. } => Some(workspace),
        }
    }

    /// The chart (or the reason there is none) after a plot request.
    pub fn outcome(&self) -> Option<&PlotOutcome> {
        match self {
            SessionState::PlotRequested { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}
