//! Display units for the card grid
//!
//! Maps ordered records to cards with resolved covers and splits the result
//! into pages. Layout and styling live in `ui`.

use std::ops::Range;

use crate::catalog::BookRecord;
use crate::covers::{CoverResolver, ImageReference};

/// Everything one card shows
#[derive(Debug, Clone, PartialEq)]
pub struct BookCard {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub format: String,
    pub category: String,
    /// Whole-number price with currency symbol, e.g. "$450"
    pub price: String,
    pub isbn: String,
    /// `None` renders as "Cover not available"
    pub front: Option<ImageReference>,
    pub back: Option<ImageReference>,
}

impl BookCard {
    pub fn new(record: &BookRecord, resolver: &CoverResolver, currency: &str) -> Self {
        Self {
            title: record.title.clone(),
            author: record.author.clone(),
            genre: record.genre.clone(),
            publisher: record.publisher.clone(),
            format: record.format.clone(),
            category: record.category.clone(),
            price: format_price(record.price, currency),
            isbn: record.isbn.clone(),
            front: resolver.resolve(&record.front_cover, &record.isbn),
            // The ISBN steps only know front covers
            back: resolver.resolve(&record.back_cover, ""),
        }
    }

    /// Remote covers on this card, front first
    pub fn remote_urls(&self) -> impl Iterator<Item = &str> {
        [&self.front, &self.back]
            .into_iter()
            .filter_map(|cover| match cover {
                Some(ImageReference::Remote(url)) => Some(url.as_str()),
                _ => None,
            })
    }
}

/// One card per record, in the given order
///
/// Resolution may probe the network, so call this off the UI thread when
/// the resolver's policy is `Probe`.
pub fn present<'a, I>(records: I, resolver: &CoverResolver, currency: &str) -> Vec<BookCard>
where
    I: IntoIterator<Item = &'a BookRecord>,
{
    records
        .into_iter()
        .map(|record| BookCard::new(record, resolver, currency))
        .collect()
}

/// Price rounded to a whole number: `$450`, `-$5`
pub fn format_price(price: f64, currency: &str) -> String {
    let rounded = price.round();
    if rounded < 0.0 {
        format!("-{}{}", currency, -rounded)
    } else {
        // `+ 0.0` turns -0.0 into 0.0
        format!("{}{}", currency, rounded + 0.0)
    }
}

/// A window of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page number, clamped to the last page
    pub number: usize,
    /// Number of pages; at least 1 even when there are no results
    pub total: usize,
    /// Indices of the results on this page
    pub range: Range<usize>,
}

impl Page {
    /// Page `requested` of `len` results, `page_size` per page
    pub fn of(len: usize, page_size: usize, requested: usize) -> Self {
        let page_size = page_size.max(1);
        let total = len.div_ceil(page_size).max(1);
        let number = requested.min(total - 1);
        let start = (number * page_size).min(len);
        let end = (start + page_size).min(len);

        Self {
            number,
            total,
            range: start..end,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total
    }
}
