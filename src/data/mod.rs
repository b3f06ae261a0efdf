/// Data layer: schema, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → normalize → cache by path
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  rows + Schema (column roles, capabilities)
///   └──────────┘
///        │   Selection (selection)
///        ▼
///   ┌──────────┐
///   │  filter   │  conjunctive predicates + outlier cap → filtered Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  metrics  │  counts, medians, group-bys, correlation → Summary
///   └──────────┘
/// ```

pub mod error;
pub mod export;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod schema;
pub mod selection;
pub mod summary;
