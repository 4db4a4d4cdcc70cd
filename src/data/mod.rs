/// Data layer: core types, loading, type inference, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse payload → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ TableSnapshot  │  typed rows + column types (infer)
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  typed conditions → row mask → indices
///   └──────────┘
/// ```

pub mod filter;
pub mod infer;
pub mod loader;
pub mod model;
