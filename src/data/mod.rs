/// Data layer: loading, cleaning, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → RawTable (text cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  parse by TableSchema, drop bad rows, derive bins/months
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, distinct values, observed ranges (immutable)
///   └──────────┘
///        │  + FilterSpec
///        ▼
///   ┌──────────┐
///   │  filter   │  category + range predicates → filtered indices
///   └──────────┘
///        │  + brush
///        ▼
///   ┌──────────┐
///   │  view     │  histogram / scatter / group / monthly → DerivedView
///   └──────────┘
/// ```

pub mod aggregate;
pub mod bins;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod view;
