//! Card grid
//!
//! Lays the current page out as wrapped cards. Local and placeholder covers
//! load straight from disk; remote covers come from the download map kept
//! by the application.

use iced::widget::image::Handle;
use iced::widget::{column, container, image, row, text, Column};
use iced::{Element, Length};
use iced_aw::Wrap;
use std::collections::HashMap;

use crate::covers::ImageReference;
use crate::present::BookCard;
use crate::Message;

const CARD_WIDTH: f32 = 300.0;
const COVER_WIDTH: f32 = 130.0;
const COVER_HEIGHT: f32 = 190.0;

/// Download state of one remote cover
#[derive(Debug, Clone)]
pub enum RemoteImage {
    Pending,
    Ready(Handle),
    Failed,
}

/// All cards of the page, or a note when nothing matched
pub fn grid<'a>(
    cards: &'a [BookCard],
    remote: &'a HashMap<String, RemoteImage>,
) -> Element<'a, Message> {
    if cards.is_empty() {
        return container(text("No books match the current filters.").size(16))
            .width(Length::Fill)
            .padding(40)
            .center_x(Length::Fill)
            .into();
    }

    let elements: Vec<Element<'a, Message>> =
        cards.iter().map(|card| view_card(card, remote)).collect();

    Wrap::with_elements(elements)
        .spacing(16.0)
        .line_spacing(16.0)
        .into()
}

fn view_card<'a>(card: &'a BookCard, remote: &'a HashMap<String, RemoteImage>) -> Element<'a, Message> {
    let covers = row![
        view_cover("Front", card.front.as_ref(), remote),
        view_cover("Back", card.back.as_ref(), remote),
    ]
    .spacing(8);

    let mut details: Column<'a, Message> = column![text(&card.title).size(18)].spacing(4);
    if !card.author.is_empty() {
        details = details.push(text(format!("by {}", card.author)).size(14));
    }
    for (label, value) in [
        ("Genre", &card.genre),
        ("Publisher", &card.publisher),
        ("Format", &card.format),
        ("Category", &card.category),
        ("ISBN", &card.isbn),
    ] {
        if !value.is_empty() {
            details = details.push(text(format!("{}: {}", label, value)).size(12));
        }
    }
    details = details.push(text(&card.price).size(16));

    container(column![covers, details].spacing(10))
        .padding(12)
        .width(Length::Fixed(CARD_WIDTH))
        .style(container::rounded_box)
        .into()
}

fn view_cover<'a>(
    label: &'a str,
    cover: Option<&'a ImageReference>,
    remote: &'a HashMap<String, RemoteImage>,
) -> Element<'a, Message> {
    let picture: Element<'a, Message> = match cover {
        Some(ImageReference::Local(path)) | Some(ImageReference::Placeholder(path)) => {
            cover_image(Handle::from_path(path))
        }
        Some(ImageReference::Remote(url)) => match remote.get(url) {
            Some(RemoteImage::Ready(handle)) => cover_image(handle.clone()),
            Some(RemoteImage::Pending) => cover_panel("Loading cover…"),
            Some(RemoteImage::Failed) | None => cover_panel("Cover not available"),
        },
        None => cover_panel("Cover not available"),
    };

    column![picture, text(label).size(11)].spacing(4).into()
}

fn cover_image<'a>(handle: Handle) -> Element<'a, Message> {
    image(handle)
        .width(Length::Fixed(COVER_WIDTH))
        .height(Length::Fixed(COVER_HEIGHT))
        .into()
}

fn cover_panel<'a>(note: &'a str) -> Element<'a, Message> {
    container(text(note).size(12))
        .width(Length::Fixed(COVER_WIDTH))
        .height(Length::Fixed(COVER_HEIGHT))
        .center_x(Length::Fixed(COVER_WIDTH))
        .center_y(Length::Fixed(COVER_HEIGHT))
        .style(container::bordered_box)
        .into()
}
