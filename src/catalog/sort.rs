//! Sort stage
//!
//! Reorders filtered records by one field. Sorting is stable, so records
//! with equal keys keep their catalog order in either direction.

use std::cmp::Ordering;
use std::fmt;

use super::record::BookRecord;

/// Attribute to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Title,
    Author,
    Genre,
    Price,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::Title,
        SortField::Author,
        SortField::Genre,
        SortField::Price,
    ];
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortField::Title => "Title",
            SortField::Author => "Author",
            SortField::Genre => "Genre",
            SortField::Price => "Price",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Compare two records on one field, ascending
///
/// Text compares byte-wise and case-sensitively, so empty values come first.
fn compare_field(a: &BookRecord, b: &BookRecord, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Genre => a.genre.cmp(&b.genre),
        SortField::Price => a.price.total_cmp(&b.price),
    }
}

/// Compare two records using the provided spec
pub fn compare_records(a: &BookRecord, b: &BookRecord, spec: SortSpec) -> Ordering {
    let ord = compare_field(a, b, spec.field);
    match spec.direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// Reorder records by `spec`
///
/// The sort is stable in both directions: records with equal keys keep
/// their incoming relative order.
pub fn order(mut records: Vec<&BookRecord>, spec: SortSpec) -> Vec<&BookRecord> {
    records.sort_by(|a, b| compare_records(a, b, spec));
    records
}
