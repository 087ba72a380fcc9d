use chrono::NaiveDate;

use super::model::{CellValue, ColumnKind, Dataset, Row};

// ---------------------------------------------------------------------------
// Filter control: the widget shape a column calls for
// ---------------------------------------------------------------------------

/// What the filter widget for a column looks like, derived from its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterControl {
    /// Text column: pick one of the distinct non-missing values.
    Choices(Vec<CellValue>),
    /// Numeric column: inclusive range inside `[min, max]`.
    Range { min: f64, max: f64 },
    /// Timestamp column: inclusive span of days inside `[first, last]`.
    DateSpan { first: NaiveDate, last: NaiveDate },
    /// The column has no non-missing values; nothing can be chosen.
    Empty,
}

impl FilterControl {
    /// Build the control for a column index of `dataset`.
    pub fn for_column(dataset: &Dataset, col: usize) -> Self {
        match dataset.column_kinds[col] {
            ColumnKind::Text => {
                let values: Vec<CellValue> = dataset.distinct_values(col).into_iter().collect();
                if values.is_empty() {
                    FilterControl::Empty
                } else {
                    FilterControl::Choices(values)
                }
            }
            ColumnKind::Integer | ColumnKind::Float => match dataset.numeric_span(col) {
                Some((min, max)) => FilterControl::Range { min, max },
                None => FilterControl::Empty,
            },
            ColumnKind::Timestamp => match dataset.date_span(col) {
                Some((first, last)) => FilterControl::DateSpan { first, last },
                None => FilterControl::Empty,
            },
        }
    }

    /// The predicate the widget starts with: the first choice or the full span.
    pub fn default_predicate(&self) -> Option<FilterPredicate> {
        match self {
            FilterControl::Choices(values) => values.first().cloned().map(FilterPredicate::Equals),
            FilterControl::Range { min, max } => Some(FilterPredicate::Range {
                min: *min,
                max: *max,
            }),
            FilterControl::DateSpan { first, last } => Some(FilterPredicate::DateSpan {
                start: *first,
                end: *last,
            }),
            FilterControl::Empty => None,
        }
    }

    /// Whether `predicate` is the kind of predicate this control produces.
    pub fn accepts(&self, predicate: &FilterPredicate) -> bool {
        match (self, predicate) {
            (FilterControl::Choices(values), FilterPredicate::Equals(v)) => values.contains(v),
            (FilterControl::Range { .. }, FilterPredicate::Range { .. }) => true,
            (FilterControl::DateSpan { .. }, FilterPredicate::DateSpan { .. }) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Filter predicate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    Equals(CellValue),
    /// Inclusive numeric bounds.
    Range { min: f64, max: f64 },
    /// Inclusive calendar-day bounds.
    DateSpan { start: NaiveDate, end: NaiveDate },
}

impl FilterPredicate {
    /// Missing cells never match.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            FilterPredicate::Equals(value) => !cell.is_null() && cell == value,
            FilterPredicate::Range { min, max } => cell
                .as_f64()
                .is_some_and(|v| *min <= v && v <= *max),
            FilterPredicate::DateSpan { start, end } => cell
                .as_timestamp()
                .is_some_and(|t| *start <= t.date() && t.date() <= *end),
        }
    }
}

/// The user's current column + predicate choice.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub column: String,
    pub predicate: FilterPredicate,
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of a dataset passing the current filter, as ascending row indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    pub indices: Vec<usize>,
}

impl FilteredView {
    /// The identity view over every row.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over the rows of `dataset` in the view.
    pub fn rows<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Row> + 'a {
        self.indices.iter().map(move |&i| &dataset.rows[i])
    }
}

/// Return the view of `dataset` that passes `spec`.
///
/// A filter naming an unknown column yields an empty view.
pub fn apply_filter(dataset: &Dataset, spec: &FilterSpec) -> FilteredView {
    let Some(col) = dataset.column_index(&spec.column) else {
        return FilteredView::default();
    };
    let indices = dataset
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| spec.predicate.matches(&row[col]))
        .map(|(i, _)| i)
        .collect();
    FilteredView { indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{category_dataset, text};

    fn score_dataset() -> Dataset {
        Dataset::from_rows(
            vec!["Name".into(), "Score".into()],
            [10, 20, 30, 40, 50]
                .iter()
                .enumerate()
                .map(|(i, s)| vec![text(&format!("n{i}")), CellValue::Integer(*s)])
                .collect(),
        )
    }

    #[test]
    fn test_equality_filter_keeps_matching_rows() {
        let ds = category_dataset();
        let spec = FilterSpec {
            column: "Category".into(),
            predicate: FilterPredicate::Equals(text("A")),
        };
        let view = apply_filter(&ds, &spec);
        assert_eq!(view.indices, vec![0, 2]);
        let values: Vec<_> = view.rows(&ds).map(|r| r[1].clone()).collect();
        assert_eq!(values, vec![CellValue::Integer(1), CellValue::Integer(3)]);
    }

    #[test]
    fn test_every_observed_value_matches_at_least_one_row() {
        let ds = category_dataset();
        let FilterControl::Choices(values) = FilterControl::for_column(&ds, 0) else {
            panic!("text column should offer choices");
        };
        for value in values {
            let spec = FilterSpec {
                column: "Category".into(),
                predicate: FilterPredicate::Equals(value.clone()),
            };
            let view = apply_filter(&ds, &spec);
            assert!(!view.is_empty());
            assert!(view.rows(&ds).all(|r| r[0] == value));
        }
    }

    #[test]
    fn test_full_range_is_identity() {
        let ds = score_dataset();
        let control = FilterControl::for_column(&ds, 1);
        assert_eq!(control, FilterControl::Range { min: 10.0, max: 50.0 });
        let spec = FilterSpec {
            column: "Score".into(),
            predicate: control.default_predicate().unwrap(),
        };
        assert_eq!(apply_filter(&ds, &spec), FilteredView::all(&ds));
    }

    #[test]
    fn test_inner_range_excludes_bounds() {
        let ds = score_dataset();
        let spec = FilterSpec {
            column: "Score".into(),
            predicate: FilterPredicate::Range { min: 20.0, max: 40.0 },
        };
        let view = apply_filter(&ds, &spec);
        let scores: Vec<_> = view.rows(&ds).filter_map(|r| r[1].as_f64()).collect();
        assert_eq!(scores, vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_narrowing_never_grows_the_view() {
        let ds = score_dataset();
        let mut previous = ds.len();
        for (min, max) in [(10.0, 50.0), (15.0, 50.0), (15.0, 45.0), (30.0, 30.0), (31.0, 30.0)] {
            let spec = FilterSpec {
                column: "Score".into(),
                predicate: FilterPredicate::Range { min, max },
            };
            let len = apply_filter(&ds, &spec).len();
            assert!(len <= previous);
            previous = len;
        }
    }

    #[test]
    fn test_all_missing_column_degrades_to_empty_control() {
        let ds = Dataset::from_rows(
            vec!["Note".into()],
            vec![vec![CellValue::Null], vec![CellValue::Null]],
        );
        let control = FilterControl::for_column(&ds, 0);
        assert_eq!(control, FilterControl::Empty);
        assert_eq!(control.default_predicate(), None);
    }

    #[test]
    fn test_date_span_filter() {
        let mut ds = Dataset::from_text_records(
            vec!["Date".into()],
            vec![
                vec!["2024-01-01".into()],
                vec!["2024-01-15 12:00:00".into()],
                vec!["2024-02-01".into()],
                vec!["bad".into()],
            ],
        );
        ds.parse_dates("Date");
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(
            FilterControl::for_column(&ds, 0),
            FilterControl::DateSpan { first, last }
        );
        let spec = FilterSpec {
            column: "Date".into(),
            predicate: FilterPredicate::DateSpan {
                start: first,
                end: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            },
        };
        assert_eq!(apply_filter(&ds, &spec).indices, vec![0, 1]);
    }

    #[test]
    fn test_unknown_column_yields_empty_view() {
        let ds = category_dataset();
        let spec = FilterSpec {
            column: "Missing".into(),
            predicate: FilterPredicate::Equals(text("A")),
        };
        assert!(apply_filter(&ds, &spec).is_empty());
    }
}
