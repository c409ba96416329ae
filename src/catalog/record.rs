//! Shared data structures for the catalog
//!
//! These structs represent the data model that flows from the loader
//! through filtering and sorting into the presenter.

use std::fmt;

/// A single book in the catalog
///
/// Every field is always present. Text the source file did not provide is an
/// empty string and a missing or malformed price is `0.0`, so nothing
/// downstream has to deal with absent values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookRecord {
    pub title: String,
    /// Title in the original language, if the book is a translation
    pub title_original: String,
    pub author: String,
    pub publisher: String,
    pub genre: String,
    /// Binding, e.g. "Hardcover" or "Paperback"
    pub format: String,
    /// "Fiction", "Non-Fiction" or any other free text
    pub category: String,
    /// Price as given by the source; never clamped
    pub price: f64,
    /// Digits and an uppercase `X` only
    pub isbn: String,
    /// Filename or identifier of the front cover image
    pub front_cover: String,
    /// Filename or identifier of the back cover image
    pub back_cover: String,
}

/// Every attribute a `BookRecord` carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    TitleOriginal,
    Author,
    Publisher,
    Genre,
    Format,
    Category,
    Price,
    Isbn,
    FrontCover,
    BackCover,
}

impl Field {
    /// All attributes, in the order the loader reports them
    pub const ALL: [Field; 11] = [
        Field::Title,
        Field::TitleOriginal,
        Field::Author,
        Field::Publisher,
        Field::Genre,
        Field::Format,
        Field::Category,
        Field::Price,
        Field::Isbn,
        Field::FrontCover,
        Field::BackCover,
    ];

    /// Canonical attribute name
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::TitleOriginal => "title_original",
            Field::Author => "author",
            Field::Publisher => "publisher",
            Field::Genre => "genre",
            Field::Format => "format",
            Field::Category => "category",
            Field::Price => "price",
            Field::Isbn => "isbn",
            Field::FrontCover => "front_cover",
            Field::BackCover => "back_cover",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl BookRecord {
    /// Text value of an attribute, or `None` for `Field::Price`
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Title => &self.title,
            Field::TitleOriginal => &self.title_original,
            Field::Author => &self.author,
            Field::Publisher => &self.publisher,
            Field::Genre => &self.genre,
            Field::Format => &self.format,
            Field::Category => &self.category,
            Field::Isbn => &self.isbn,
            Field::FrontCover => &self.front_cover,
            Field::BackCover => &self.back_cover,
            Field::Price => return None,
        };
        Some(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_empty() {
        let record = BookRecord::default();
        for field in Field::ALL {
            if let Some(value) = record.text(field) {
                assert!(value.is_empty(), "{} should default to empty", field);
            }
        }
        assert_eq!(record.price, 0.0);
    }

    #[test]
    fn test_price_has_no_text_value() {
        let record = BookRecord {
            price: 12.5,
            ..Default::default()
        };
        assert_eq!(record.text(Field::Price), None);
    }
}
