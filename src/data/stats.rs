//! Descriptive statistics over a dataset or a filtered view of it.

use std::collections::{BTreeMap, HashSet};

use super::filter::FilteredView;
use super::model::{CellValue, ColumnKind, Dataset};

// ---------------------------------------------------------------------------
// describe()
// ---------------------------------------------------------------------------

/// count / mean / std / min / quartiles / max of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); `None` below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

/// count / unique / top / freq of one non-numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<CellValue>,
    pub freq: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Description {
    Numeric(Vec<NumericSummary>),
    /// Used when the table has no numeric column at all.
    Text(Vec<TextSummary>),
}

/// Summary statistics, numeric columns first; falls back to text summaries
/// when there is nothing numeric to describe.
pub fn describe(dataset: &Dataset, view: &FilteredView) -> Description {
    let numeric: Vec<NumericSummary> = dataset
        .column_kinds
        .iter()
        .enumerate()
        .filter(|(_, kind)| kind.is_numeric())
        .map(|(col, _)| {
            let values = numeric_values(dataset, view, col);
            summarize_numeric(&dataset.column_names[col], values)
        })
        .collect();

    if !numeric.is_empty() {
        return Description::Numeric(numeric);
    }

    Description::Text(
        (0..dataset.column_count())
            .map(|col| summarize_text(dataset, view, col))
            .collect(),
    )
}

/// Non-missing numeric values of a column inside the view, in row order.
pub fn numeric_values(dataset: &Dataset, view: &FilteredView, col: usize) -> Vec<f64> {
    view.rows(dataset)
        .filter_map(|row| row[col].as_f64())
        .filter(|v| !v.is_nan())
        .collect()
}

fn summarize_numeric(column: &str, mut values: Vec<f64>) -> NumericSummary {
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });
    NumericSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Quantile of sorted values with linear interpolation between neighbours.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let idx = (sorted.len() - 1) as f64 * q;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    if lower == upper {
        Some(sorted[lower])
    } else {
        let fraction = idx - lower as f64;
        Some(sorted[lower] * (1.0 - fraction) + sorted[upper] * fraction)
    }
}

fn summarize_text(dataset: &Dataset, view: &FilteredView, col: usize) -> TextSummary {
    let mut counts: BTreeMap<&CellValue, usize> = BTreeMap::new();
    for row in view.rows(dataset) {
        if !row[col].is_null() {
            *counts.entry(&row[col]).or_default() += 1;
        }
    }
    // Ties resolve to the smallest value.
    let top = counts
        .iter()
        .fold(None::<(&CellValue, usize)>, |best, (v, n)| match best {
            Some((_, m)) if m >= *n => best,
            _ => Some((*v, *n)),
        });
    TextSummary {
        column: dataset.column_names[col].clone(),
        count: counts.values().sum(),
        unique: counts.len(),
        top: top.map(|(v, _)| v.clone()),
        freq: top.map(|(_, n)| n).unwrap_or(0),
    }
}

// ---------------------------------------------------------------------------
// Column overview
// ---------------------------------------------------------------------------

/// Per-column type, null count and unique count.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub kind: ColumnKind,
    pub non_null: usize,
    pub nulls: usize,
    pub unique: usize,
}

pub fn column_summary(dataset: &Dataset) -> Vec<ColumnSummary> {
    (0..dataset.column_count())
        .map(|col| {
            let nulls = dataset.column_cells(col).filter(|v| v.is_null()).count();
            let unique: HashSet<&CellValue> =
                dataset.column_cells(col).filter(|v| !v.is_null()).collect();
            ColumnSummary {
                column: dataset.column_names[col].clone(),
                kind: dataset.column_kinds[col],
                non_null: dataset.len() - nulls,
                nulls,
                unique: unique.len(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation between every pair of numeric columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]`; `None` where fewer than two complete pairs exist or a
    /// side has zero variance.
    pub values: Vec<Vec<Option<f64>>>,
}

/// Correlation over the numeric columns of the view, using pairwise-complete
/// observations.
pub fn correlation_matrix(dataset: &Dataset, view: &FilteredView) -> CorrelationMatrix {
    let cols: Vec<usize> = (0..dataset.column_count())
        .filter(|&c| dataset.column_kinds[c].is_numeric())
        .collect();
    let series: Vec<Vec<Option<f64>>> = cols
        .iter()
        .map(|&c| view.rows(dataset).map(|row| row[c].as_f64()).collect())
        .collect();

    let n = cols.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let (x, y): (Vec<f64>, Vec<f64>) = series[i]
                .iter()
                .zip(&series[j])
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .unzip();
            let r = pearson(&x, &y);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: cols.iter().map(|&c| dataset.column_names[c].clone()).collect(),
        values,
    }
}

pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        None
    } else {
        Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over `values`. Every bin is half-open except the last,
/// which also holds the maximum. A constant input gets a unit-wide range
/// centred on the value.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some((mut lo, mut hi)) = finite.iter().fold(None, |acc: Option<(f64, f64)>, &v| {
        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
    }) else {
        return Vec::new();
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: lo + width * (i + 1) as f64,
            count,
        })
        .collect()
}
