//! User interface module
//!
//! Widgets for the catalog window:
//! - Filter and sort controls (filters.rs)
//! - The card grid with cover art (card.rs)
//! - Genre statistics chart (stats.rs)

pub mod card;
pub mod filters;
pub mod stats;
