//! Catalog module
//!
//! This module handles the book data itself:
//! - Record model (record.rs)
//! - Loading spreadsheets and CSV files (loader.rs)
//! - Snapshot cache keyed by path and mtime (cache.rs)
//! - Filtering (filter.rs) and sorting (sort.rs)
//! - Value lists and genre statistics (facets.rs)

pub mod cache;
pub mod facets;
pub mod filter;
pub mod loader;
pub mod record;
pub mod sort;

pub use cache::CatalogCache;
pub use filter::{FilterCriteria, PriceRange, Selection};
pub use loader::{Catalog, FieldCoercionWarning};
pub use record::{BookRecord, Field};
pub use sort::{SortDirection, SortField, SortSpec};
