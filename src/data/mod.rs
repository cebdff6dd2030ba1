/// Data layer: core types, loading, and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → HerdDataset
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ HerdDataset │  Vec<Record>, column order, unique values
///   └─────────────┘
///        │  (crate::filter selects rows)
///        ▼
///   ┌──────────┐
///   │  export  │  selected records → CSV
///   └──────────┘
/// ```

pub mod export;
pub mod loader;
pub mod model;
