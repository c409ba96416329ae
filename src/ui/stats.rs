//! Genre statistics
//! Horizontal bar chart of how many books each genre holds

use iced::alignment;
use iced::widget::canvas::{self, Canvas};
use iced::{Element, Length, Pixels, Point, Rectangle, Size};

use crate::Message;

const ROW_HEIGHT: f32 = 22.0;
const LABEL_WIDTH: f32 = 160.0;
const COUNT_WIDTH: f32 = 48.0;

/// Bar chart over `(genre, count)` pairs, drawn in the given order
#[derive(Debug, Clone)]
pub struct GenreChart<'a> {
    pub counts: &'a [(String, usize)],
}

impl<'a> canvas::Program<Message> for GenreChart<'a> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let max_count = self.counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
        if max_count == 0 {
            return vec![frame.into_geometry()];
        }

        let palette = theme.extended_palette();
        let available = (bounds.width - LABEL_WIDTH - COUNT_WIDTH).max(0.0);

        for (i, (genre, count)) in self.counts.iter().enumerate() {
            let top = i as f32 * ROW_HEIGHT;
            let middle = top + ROW_HEIGHT / 2.0;

            frame.fill_text(canvas::Text {
                content: genre.clone(),
                position: Point::new(0.0, middle),
                color: palette.background.base.text,
                size: Pixels(13.0),
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });

            let width = bar_width(*count, max_count, available);
            frame.fill_rectangle(
                Point::new(LABEL_WIDTH, top + 3.0),
                Size::new(width, ROW_HEIGHT - 6.0),
                palette.primary.base.color,
            );

            frame.fill_text(canvas::Text {
                content: count.to_string(),
                position: Point::new(LABEL_WIDTH + width + 6.0, middle),
                color: palette.background.base.text,
                size: Pixels(13.0),
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

/// Bar length for `count`, scaled so `max` fills `available`
fn bar_width(count: usize, max: usize, available: f32) -> f32 {
    if max == 0 {
        return 0.0;
    }
    count as f32 / max as f32 * available
}

/// The chart sized to fit every genre
pub fn view(counts: &[(String, usize)]) -> Element<'_, Message> {
    let height = (counts.len().max(1) as f32) * ROW_HEIGHT;

    Canvas::new(GenreChart { counts })
        .width(Length::Fill)
        .height(Length::Fixed(height))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_genre_fills_the_space() {
        assert_eq!(bar_width(10, 10, 200.0), 200.0);
        assert_eq!(bar_width(5, 10, 200.0), 100.0);
        assert_eq!(bar_width(0, 10, 200.0), 0.0);
    }

    #[test]
    fn test_no_books_draws_nothing() {
        assert_eq!(bar_width(0, 0, 200.0), 0.0);
    }
}
