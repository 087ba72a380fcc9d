/// Data layer: core types, loading, filtering, statistics and charts.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (dates parsed, names normalised)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │ Dataset   │ ◀──  │  clean    │  dedupe / fill / drop, then export
///   └──────────┘      └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  one column predicate → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  chart    │  PlotRequest + view → ChartData (stats for histogram/corr)
///   └──────────┘
/// ```

pub mod chart;
pub mod clean;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
