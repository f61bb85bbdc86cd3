/// Data layer: core types, loading, selection, and series derivation.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TaxDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ TaxDataset  │  Vec<TaxRow>, domains, pivot index
///   └────────────┘
///        │            ┌───────────┐
///        │◄───────────│ selection  │  validated widget choices
///        ▼            └───────────┘
///   ┌──────────┐
///   │ pipeline  │  filter + derive → Vec<Series>
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod pipeline;
pub mod selection;
pub mod series;
