//! Value lists and counts derived from the catalog
//!
//! These feed the pick lists in the filter panel and the genre statistics view.

use std::collections::{BTreeMap, BTreeSet};

use super::record::{BookRecord, Field};

/// Sorted, de-duplicated, non-empty values of a text attribute
pub fn distinct_values<'a, I>(records: I, field: Field) -> Vec<String>
where
    I: IntoIterator<Item = &'a BookRecord>,
{
    records
        .into_iter()
        .filter_map(|record| record.text(field))
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Number of books per genre, most common first
///
/// Ties are broken by genre name. Books without a genre are not counted.
pub fn genre_counts<'a, I>(records: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a BookRecord>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        if !record.genre.is_empty() {
            *counts.entry(record.genre.as_str()).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(genre, count)| (genre.to_string(), count))
        .collect();
    // BTreeMap already yields names in order; a stable sort keeps that for ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
