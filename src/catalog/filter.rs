//! Filter engine
//!
//! Turns the form state into a conjunction of predicates and selects the
//! matching records, keeping their catalog order.

use std::collections::BTreeSet;

use super::record::{BookRecord, Field};

/// Membership filter for enum-like attributes (genre, format, category)
///
/// `Any` is the "All" choice in the UI. It is its own variant so a real
/// category literally named "All" still filters normally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Any,
    OneOf(BTreeSet<String>),
}

impl Selection {
    /// Selection holding a single value
    pub fn only(value: impl Into<String>) -> Self {
        Selection::OneOf(BTreeSet::from([value.into()]))
    }

    /// Whether this selection constrains anything
    pub fn is_active(&self) -> bool {
        matches!(self, Selection::OneOf(values) if !values.is_empty())
    }

    fn admits(&self, value: &str) -> bool {
        match self {
            Selection::Any => true,
            Selection::OneOf(values) => values.is_empty() || values.contains(value),
        }
    }
}

/// Inclusive price bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range with only a lower bound
    pub fn at_least(min: f64) -> Self {
        Self::new(min, f64::INFINITY)
    }

    /// Range with only an upper bound
    pub fn at_most(max: f64) -> Self {
        Self::new(f64::NEG_INFINITY, max)
    }

    /// Inclusive at both ends; an inverted range contains nothing
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Every filter the user can set; unset fields do not constrain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Matches title OR author
    pub search: Option<String>,
    pub title: Option<String>,
    pub title_original: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub isbn: Option<String>,
    /// Exact genre, as picked from the catalog's genre list
    pub genre_choice: Selection,
    pub format: Selection,
    pub category: Selection,
    pub price: Option<PriceRange>,
}

/// Lowercased, trimmed needle; `None` when it would match everything
fn needle(criterion: &Option<String>) -> Option<String> {
    criterion
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl FilterCriteria {
    /// Whether any criterion constrains the result
    pub fn is_active(&self) -> bool {
        self.text_needles().next().is_some()
            || needle(&self.search).is_some()
            || self.genre_choice.is_active()
            || self.format.is_active()
            || self.category.is_active()
            || self.price.is_some()
    }

    fn text_needles(&self) -> impl Iterator<Item = (Field, String)> + '_ {
        [
            (Field::Title, &self.title),
            (Field::TitleOriginal, &self.title_original),
            (Field::Author, &self.author),
            (Field::Publisher, &self.publisher),
            (Field::Genre, &self.genre),
            (Field::Isbn, &self.isbn),
        ]
        .into_iter()
        .filter_map(|(field, criterion)| needle(criterion).map(|n| (field, n)))
    }

    /// Check one record against every active criterion
    pub fn matches(&self, record: &BookRecord) -> bool {
        if let Some(search) = needle(&self.search) {
            if !contains_folded(&record.title, &search) && !contains_folded(&record.author, &search)
            {
                return false;
            }
        }

        let text_ok = self.text_needles().all(|(field, needle)| {
            record
                .text(field)
                .map(|value| contains_folded(value, &needle))
                .unwrap_or(false)
        });
        if !text_ok {
            return false;
        }

        if !self.genre_choice.admits(&record.genre)
            || !self.format.admits(&record.format)
            || !self.category.admits(&record.category)
        {
            return false;
        }

        self.price.map_or(true, |range| range.contains(record.price))
    }
}

/// Select the records matching `criteria`, in their original order
pub fn apply<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<&'a BookRecord>
where
    I: IntoIterator<Item = &'a BookRecord>,
{
    records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect()
}
