use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use crate::color::{chart_color, diverging, text_on};
use crate::data::chart::{AxisScale, ChartData, ChartKind, HistogramChart, XySeries};
use crate::data::model::format_timestamp;
use crate::data::stats::CorrelationMatrix;
use crate::state::{Phase, SessionState};

const PLOT_HEIGHT: f32 = 380.0;

// ---------------------------------------------------------------------------
// Chart area (central panel, below the tables)
// ---------------------------------------------------------------------------

/// Render the outcome of the last plot request, if any.
pub fn chart_area(ui: &mut Ui, session: &SessionState) {
    if session.phase() == Phase::Idle {
        return;
    }

    ui.heading("📈 Plot");
    match session.outcome() {
        None => {
            ui.label(RichText::new("Choose a chart and axes, then press Generate Plot.").italics());
        }
        Some(Err(e)) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED));
        }
        Some(Ok(chart)) => match chart {
            ChartData::Line(series) => xy_plot(ui, series, ChartKind::Line),
            ChartData::Scatter(series) => xy_plot(ui, series, ChartKind::Scatter),
            ChartData::Histogram(hist) => histogram_plot(ui, hist),
            ChartData::Correlation(matrix) => correlation_plot(ui, matrix),
        },
    }
}

fn xy_plot(ui: &mut Ui, series: &XySeries, kind: ChartKind) {
    let color = chart_color(kind);
    let name = format!("{} vs {}", series.y_column, series.x_column);

    let mut plot = Plot::new(("xy_plot", kind.label()))
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(series.x_column.clone())
        .y_axis_label(series.y_column.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    match &series.scale {
        AxisScale::Numeric => {}
        AxisScale::Time => {
            plot = plot.x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                time_label(mark.value)
            });
        }
        AxisScale::Category(labels) => {
            let labels = labels.clone();
            plot = plot.x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                ordinal_label(&labels, mark.value)
            });
        }
    }

    let points: PlotPoints = series.points.iter().copied().collect();
    plot.show(ui, |plot_ui| match kind {
        ChartKind::Scatter => {
            plot_ui.points(Points::new(points).name(&name).color(color).radius(3.0));
        }
        _ => {
            plot_ui.line(Line::new(points).name(&name).color(color).width(1.5));
        }
    });
}

fn histogram_plot(ui: &mut Ui, hist: &HistogramChart) {
    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|bin| {
            let width = bin.end - bin.start;
            Bar::new((bin.start + bin.end) / 2.0, bin.count as f64)
                .width(if width > 0.0 { width } else { 1.0 })
        })
        .collect();

    let chart = BarChart::new(bars)
        .name(&hist.column)
        .color(chart_color(ChartKind::Histogram));

    Plot::new("histogram_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(hist.column.clone())
        .y_axis_label("count")
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Heatmap with one unit square per column pair; the first column is drawn
/// at the top-left.
fn correlation_plot(ui: &mut Ui, matrix: &CorrelationMatrix) {
    let n = matrix.columns.len();
    let x_labels = matrix.columns.clone();
    let y_labels: Vec<String> = matrix.columns.iter().rev().cloned().collect();

    Plot::new("correlation_plot")
        .height(PLOT_HEIGHT)
        .data_aspect(1.0)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            ordinal_label(&x_labels, mark.value)
        })
        .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            ordinal_label(&y_labels, mark.value)
        })
        .show(ui, |plot_ui| {
            for (i, row) in matrix.values.iter().enumerate() {
                for (j, value) in row.iter().enumerate() {
                    let x = j as f64;
                    let y = (n - 1 - i) as f64;
                    let fill = diverging(*value);
                    let cell = vec![
                        [x - 0.5, y - 0.5],
                        [x + 0.5, y - 0.5],
                        [x + 0.5, y + 0.5],
                        [x - 0.5, y + 0.5],
                    ];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(cell))
                            .fill_color(fill)
                            .stroke(Stroke::new(1.0, Color32::DARK_GRAY)),
                    );
                    let label = value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "–".into());
                    plot_ui.text(
                        Text::new(PlotPoint::new(x, y), RichText::new(label).strong())
                            .color(text_on(fill)),
                    );
                }
            }
        });
}

/// Label of the category at an integer grid position; blank elsewhere.
fn ordinal_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

fn time_label(seconds: f64) -> String {
    chrono::DateTime::from_timestamp(seconds.round() as i64, 0)
        .map(|t| format_timestamp(&t.naive_utc()))
        .unwrap_or_default()
}
