//! Plot requests and the chart data they produce.
//!
//! Rendering is split in two: this module validates a request against the
//! current view and turns it into plain series; `ui::plot` draws them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::filter::FilteredView;
use super::model::{CellValue, ColumnKind, Dataset};
use super::stats::{CorrelationMatrix, HistogramBin, correlation_matrix, histogram, numeric_values};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartKind {
    #[default]
    Line,
    Histogram,
    Correlation,
    Scatter,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Line,
        ChartKind::Histogram,
        ChartKind::Correlation,
        ChartKind::Scatter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Line => "Line chart",
            ChartKind::Histogram => "Histogram",
            ChartKind::Correlation => "Correlation heatmap",
            ChartKind::Scatter => "Scatter plot",
        }
    }

    pub fn uses_x(self) -> bool {
        matches!(self, ChartKind::Line | ChartKind::Scatter)
    }

    pub fn uses_y(self) -> bool {
        !matches!(self, ChartKind::Correlation)
    }
}

/// The user's chosen chart kind and axes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotRequest {
    pub kind: ChartKind,
    pub x_column: Option<String>,
    /// Restricted to numeric columns.
    pub y_column: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a plot request is refused. None of them touch the dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlotError {
    #[error("No numeric columns available for plotting. Upload a valid dataset.")]
    NoNumericColumns,
    #[error("Filtered data is empty! Adjust the filters.")]
    EmptyView,
    #[error("Please select valid X and Y columns!")]
    AxisNotSelected,
    #[error("Please select valid X and Y columns! Column '{0}' does not exist.")]
    MissingColumn(String),
    #[error("Column '{0}' is not numeric.")]
    NonNumericColumn(String),
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

/// How x positions of a line chart map back to the source column.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisScale {
    Numeric,
    /// x is seconds since the Unix epoch.
    Time,
    /// x is the ordinal position; `labels[i]` is the text at position `i`.
    Category(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XySeries {
    pub x_column: String,
    pub y_column: String,
    pub scale: AxisScale,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramChart {
    pub column: String,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Line(XySeries),
    Histogram(HistogramChart),
    Correlation(CorrelationMatrix),
    Scatter(XySeries),
}

/// Validate `request` against the view and build the chart.
///
/// Checks run in order: any numeric column at all, a non-empty view, axes
/// that resolve to columns, a numeric y (and a non-text x for scatter).
pub fn build_chart(
    dataset: &Dataset,
    view: &FilteredView,
    request: &PlotRequest,
    histogram_bins: usize,
) -> Result<ChartData, PlotError> {
    if !dataset.has_numeric_columns() {
        return Err(PlotError::NoNumericColumns);
    }
    if view.is_empty() {
        return Err(PlotError::EmptyView);
    }

    match request.kind {
        ChartKind::Correlation => Ok(ChartData::Correlation(correlation_matrix(dataset, view))),
        ChartKind::Histogram => {
            let y = numeric_axis(dataset, request.y_column.as_deref())?;
            Ok(ChartData::Histogram(HistogramChart {
                column: dataset.column_names[y].clone(),
                bins: histogram(&numeric_values(dataset, view, y), histogram_bins),
            }))
        }
        ChartKind::Line => {
            let x = resolve_axis(dataset, request.x_column.as_deref())?;
            let y = numeric_axis(dataset, request.y_column.as_deref())?;
            Ok(ChartData::Line(xy_series(dataset, view, x, y, true)))
        }
        ChartKind::Scatter => {
            let x = resolve_axis(dataset, request.x_column.as_deref())?;
            if dataset.column_kinds[x] == ColumnKind::Text {
                return Err(PlotError::NonNumericColumn(dataset.column_names[x].clone()));
            }
            let y = numeric_axis(dataset, request.y_column.as_deref())?;
            Ok(ChartData::Scatter(xy_series(dataset, view, x, y, false)))
        }
    }
}

fn resolve_axis(dataset: &Dataset, column: Option<&str>) -> Result<usize, PlotError> {
    let column = column.ok_or(PlotError::AxisNotSelected)?;
    dataset
        .column_index(column)
        .ok_or_else(|| PlotError::MissingColumn(column.to_string()))
}

fn numeric_axis(dataset: &Dataset, column: Option<&str>) -> Result<usize, PlotError> {
    let col = resolve_axis(dataset, column)?;
    if !dataset.column_kinds[col].is_numeric() {
        return Err(PlotError::NonNumericColumn(dataset.column_names[col].clone()));
    }
    Ok(col)
}

/// One point per row with both coordinates present. Numeric and time axes
/// are sorted by x when `sort` is set; text axes keep row order.
fn xy_series(dataset: &Dataset, view: &FilteredView, x: usize, y: usize, sort: bool) -> XySeries {
    let kind = dataset.column_kinds[x];
    let mut labels = Vec::new();
    let mut points = Vec::new();

    for row in view.rows(dataset) {
        let Some(yv) = row[y].as_f64() else {
            continue;
        };
        let xv = match (kind, &row[x]) {
            (_, CellValue::Null) => continue,
            (ColumnKind::Timestamp, cell) => match cell.as_timestamp() {
                Some(t) => t.and_utc().timestamp() as f64,
                None => continue,
            },
            (ColumnKind::Text, cell) => {
                labels.push(cell.to_string());
                (labels.len() - 1) as f64
            }
            (_, cell) => match cell.as_f64() {
                Some(v) => v,
                None => continue,
            },
        };
        points.push([xv, yv]);
    }

    let scale = match kind {
        ColumnKind::Text => AxisScale::Category(labels),
        ColumnKind::Timestamp => AxisScale::Time,
        ColumnKind::Integer | ColumnKind::Float => AxisScale::Numeric,
    };
    if sort && !matches!(scale, AxisScale::Category(_)) {
        points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    }

    XySeries {
        x_column: dataset.column_names[x].clone(),
        y_column: dataset.column_names[y].clone(),
        scale,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterPredicate, FilterSpec, apply_filter};
    use crate::data::loader::{LoadOptions, load_csv_reader};
    use crate::data::model::tests::{category_dataset, text};

    fn people() -> Dataset {
        Dataset::from_rows(
            vec!["Name".into(), "Score".into()],
            vec![
                vec![text("Ann"), CellValue::Integer(30)],
                vec![text("Bob"), CellValue::Integer(10)],
                vec![text("Cid"), CellValue::Integer(20)],
            ],
        )
    }

    fn request(kind: ChartKind, x: &str, y: &str) -> PlotRequest {
        PlotRequest {
            kind,
            x_column: Some(x.to_string()),
            y_column: Some(y.to_string()),
        }
    }

    #[test]
    fn test_line_with_text_x_has_one_point_per_row() {
        let ds = people();
        let view = FilteredView::all(&ds);
        let chart = build_chart(&ds, &view, &request(ChartKind::Line, "Name", "Score"), 10).unwrap();
        let ChartData::Line(series) = chart else {
            panic!("expected a line chart");
        };
        assert_eq!(series.points, vec![[0.0, 30.0], [1.0, 10.0], [2.0, 20.0]]);
        assert_eq!(
            series.scale,
            AxisScale::Category(vec!["Ann".into(), "Bob".into(), "Cid".into()])
        );
    }

    #[test]
    fn test_line_with_numeric_x_is_sorted() {
        let ds = people();
        let view = FilteredView::all(&ds);
        let chart = build_chart(&ds, &view, &request(ChartKind::Line, "Score", "Score"), 10).unwrap();
        let ChartData::Line(series) = chart else {
            panic!("expected a line chart");
        };
        let xs: Vec<f64> = series.points.iter().map(|p| p[0]).collect();
        assert_eq!(xs, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_line_with_date_x_skips_null_dates() {
        let ds = load_csv_reader(
            "Date,Value\n2024-01-02,2\nnot-a-date,5\n2024-01-01,1\n".as_bytes(),
            &LoadOptions::default(),
        )
        .unwrap();
        let view = FilteredView::all(&ds);
        let ChartData::Line(series) =
            build_chart(&ds, &view, &request(ChartKind::Line, "Date", "Value"), 10).unwrap()
        else {
            panic!("expected a line chart");
        };
        assert_eq!(series.scale, AxisScale::Time);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0][1], 1.0);
    }

    #[test]
    fn test_empty_view_is_reported() {
        let ds = category_dataset();
        let spec = FilterSpec {
            column: "Value".into(),
            predicate: FilterPredicate::Range { min: 100.0, max: 200.0 },
        };
        let view = apply_filter(&ds, &spec);
        let err = build_chart(&ds, &view, &request(ChartKind::Line, "Category", "Value"), 10);
        assert_eq!(err, Err(PlotError::EmptyView));
    }

    #[test]
    fn test_invalid_axes_are_reported() {
        let ds = category_dataset();
        let view = FilteredView::all(&ds);
        assert_eq!(
            build_chart(&ds, &view, &request(ChartKind::Line, "Nope", "Value"), 10),
            Err(PlotError::MissingColumn("Nope".into()))
        );
        assert_eq!(
            build_chart(&ds, &view, &request(ChartKind::Line, "Value", "Category"), 10),
            Err(PlotError::NonNumericColumn("Category".into()))
        );
        assert_eq!(
            build_chart(&ds, &view, &request(ChartKind::Scatter, "Category", "Value"), 10),
            Err(PlotError::NonNumericColumn("Category".into()))
        );
        let no_axes = PlotRequest::default();
        assert_eq!(
            build_chart(&ds, &view, &no_axes, 10),
            Err(PlotError::AxisNotSelected)
        );
    }

    #[test]
    fn test_no_numeric_columns_refuses_every_kind() {
        let ds = Dataset::from_rows(vec!["c".into()], vec![vec![text("a")]]);
        let view = FilteredView::all(&ds);
        for kind in ChartKind::ALL {
            assert_eq!(
                build_chart(&ds, &view, &request(kind, "c", "c"), 10),
                Err(PlotError::NoNumericColumns)
            );
        }
    }

    #[test]
    fn test_histogram_and_correlation() {
        let ds = people();
        let view = FilteredView::all(&ds);
        let ChartData::Histogram(h) = build_chart(
            &ds,
            &view,
            &PlotRequest {
                kind: ChartKind::Histogram,
                x_column: None,
                y_column: Some("Score".into()),
            },
            2,
        )
        .unwrap() else {
            panic!("expected a histogram");
        };
        assert_eq!(h.bins.len(), 2);
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), 3);

        let corr = PlotRequest {
            kind: ChartKind::Correlation,
            ..Default::default()
        };
        let ChartData::Correlation(m) = build_chart(&ds, &view, &corr, 2).unwrap() else {
            panic!("expected a correlation matrix");
        };
        assert_eq!(m.columns, vec!["Score"]);
    }
}
