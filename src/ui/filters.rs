//! Filter panel
//!
//! Holds the raw form state (text as typed) and turns it into
//! `FilterCriteria` and an optional `SortSpec` on demand.

use iced::widget::{button, column, pick_list, row, text, text_input};
use iced::{Alignment, Element, Length};
use std::fmt;

use crate::catalog::facets::distinct_values;
use crate::catalog::{BookRecord, Field, FilterCriteria, PriceRange, Selection};
use crate::catalog::{SortDirection, SortField, SortSpec};

const INPUT_WIDTH: f32 = 170.0;
const PRICE_WIDTH: f32 = 90.0;

/// A pick list entry for genre/format/category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choice {
    /// No constraint
    #[default]
    All,
    Value(String),
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str("All"),
            Choice::Value(value) => f.write_str(value),
        }
    }
}

impl Choice {
    fn selection(&self) -> Selection {
        match self {
            Choice::All => Selection::Any,
            Choice::Value(value) => Selection::only(value.clone()),
        }
    }
}

/// Sort pick list entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortChoice {
    /// Keep the order of the catalog file
    #[default]
    CatalogOrder,
    By(SortField),
}

impl SortChoice {
    /// "Catalog order" followed by every sortable field
    pub fn all() -> Vec<SortChoice> {
        std::iter::once(SortChoice::CatalogOrder)
            .chain(SortField::ALL.into_iter().map(SortChoice::By))
            .collect()
    }
}

impl fmt::Display for SortChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortChoice::CatalogOrder => f.write_str("Catalog order"),
            SortChoice::By(field) => write!(f, "{}", field),
        }
    }
}

/// Pick list contents derived from the loaded catalog
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub genres: Vec<Choice>,
    pub formats: Vec<Choice>,
    pub categories: Vec<Choice>,
}

impl FilterOptions {
    pub fn from_records(records: &[BookRecord]) -> Self {
        let choices = |field: Field| -> Vec<Choice> {
            std::iter::once(Choice::All)
                .chain(distinct_values(records, field).into_iter().map(Choice::Value))
                .collect()
        };
        Self {
            genres: choices(Field::Genre),
            formats: choices(Field::Format),
            categories: choices(Field::Category),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FilterMessage {
    Search(String),
    Title(String),
    TitleOriginal(String),
    Author(String),
    Publisher(String),
    Genre(Choice),
    Isbn(String),
    MinPrice(String),
    MaxPrice(String),
    Format(Choice),
    Category(Choice),
    Sort(SortChoice),
    ToggleDirection,
    Clear,
}

/// The filter form as typed by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterForm {
    pub search: String,
    pub title: String,
    pub title_original: String,
    pub author: String,
    pub publisher: String,
    pub genre: Choice,
    pub isbn: String,
    pub min_price: String,
    pub max_price: String,
    pub format: Choice,
    pub category: Choice,
    pub sort: SortChoice,
    pub direction: SortDirection,
}

fn text_criterion(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn labeled_input<'a>(
    placeholder: &'a str,
    value: &'a str,
    on_input: fn(String) -> FilterMessage,
) -> Element<'a, FilterMessage> {
    text_input(placeholder, value)
        .on_input(on_input)
        .width(Length::Fixed(INPUT_WIDTH))
        .into()
}

/// A price bound; blank or unparsable input means "no bound"
fn price_bound(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FilterForm {
    pub fn update(&mut self, message: FilterMessage) {
        match message {
            FilterMessage::Search(value) => self.search = value,
            FilterMessage::Title(value) => self.title = value,
            FilterMessage::TitleOriginal(value) => self.title_original = value,
            FilterMessage::Author(value) => self.author = value,
            FilterMessage::Publisher(value) => self.publisher = value,
            FilterMessage::Genre(choice) => self.genre = choice,
            FilterMessage::Isbn(value) => self.isbn = value,
            FilterMessage::MinPrice(value) => self.min_price = value,
            FilterMessage::MaxPrice(value) => self.max_price = value,
            FilterMessage::Format(choice) => self.format = choice,
            FilterMessage::Category(choice) => self.category = choice,
            FilterMessage::Sort(choice) => self.sort = choice,
            FilterMessage::ToggleDirection => self.direction = self.direction.toggled(),
            FilterMessage::Clear => *self = Self::default(),
        }
    }

    pub fn criteria(&self) -> FilterCriteria {
        let price = match (price_bound(&self.min_price), price_bound(&self.max_price)) {
            (None, None) => None,
            (Some(min), None) => Some(PriceRange::at_least(min)),
            (None, Some(max)) => Some(PriceRange::at_most(max)),
            (Some(min), Some(max)) => Some(PriceRange::new(min, max)),
        };

        FilterCriteria {
            search: text_criterion(&self.search),
            title: text_criterion(&self.title),
            title_original: text_criterion(&self.title_original),
            author: text_criterion(&self.author),
            publisher: text_criterion(&self.publisher),
            genre: None,
            isbn: text_criterion(&self.isbn),
            genre_choice: self.genre.selection(),
            format: self.format.selection(),
            category: self.category.selection(),
            price,
        }
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        match self.sort {
            SortChoice::CatalogOrder => None,
            SortChoice::By(field) => Some(SortSpec::new(field, self.direction)),
        }
    }

    /// Whether anything differs from a fresh form that Clear would undo
    pub fn can_clear(&self) -> bool {
        self.criteria().is_active() || self.sort != SortChoice::CatalogOrder
    }

    pub fn view<'a>(&'a self, options: &'a FilterOptions) -> Element<'a, FilterMessage> {
        let search = text_input("🔍 Search by book name or author", &self.search)
            .on_input(FilterMessage::Search)
            .width(Length::Fill);

        let text_filters = row![
            labeled_input("Title", &self.title, FilterMessage::Title),
            labeled_input("Original title", &self.title_original, FilterMessage::TitleOriginal),
            labeled_input("Author", &self.author, FilterMessage::Author),
            labeled_input("Publisher", &self.publisher, FilterMessage::Publisher),
            labeled_input("ISBN", &self.isbn, FilterMessage::Isbn),
        ]
        .spacing(8);

        let direction = match self.direction {
            SortDirection::Ascending => "↑ Ascending",
            SortDirection::Descending => "↓ Descending",
        };

        let choices = row![
            text("Genre"),
            pick_list(
                options.genres.as_slice(),
                Some(&self.genre),
                FilterMessage::Genre
            ),
            text("Format"),
            pick_list(
                options.formats.as_slice(),
                Some(&self.format),
                FilterMessage::Format
            ),
            text("Category"),
            pick_list(
                options.categories.as_slice(),
                Some(&self.category),
                FilterMessage::Category
            ),
            text("Price"),
            text_input("min", &self.min_price)
                .on_input(FilterMessage::MinPrice)
                .width(Length::Fixed(PRICE_WIDTH)),
            text("–"),
            text_input("max", &self.max_price)
                .on_input(FilterMessage::MaxPrice)
                .width(Length::Fixed(PRICE_WIDTH)),
            text("Sort"),
            pick_list(SortChoice::all(), Some(self.sort), FilterMessage::Sort),
            button(direction).on_press_maybe(
                (self.sort != SortChoice::CatalogOrder).then_some(FilterMessage::ToggleDirection)
            ),
            button("Clear").on_press_maybe(self.can_clear().then_some(FilterMessage::Clear)),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        column![search, text_filters, choices].spacing(10).into()
    }
}
