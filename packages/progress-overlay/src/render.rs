use crate::{
    canvas::{Canvas, TextStyle},
    document::Snapshot,
    element::ContainerClass,
};
use crossterm::style::Color;
use unicode_width::UnicodeWidthStr;

const FILLED: &str = "█";
const EMPTY: &str = "░";

fn state_color(classes: ContainerClass) -> Color {
    if classes.contains(ContainerClass::CANCELLED) {
        Color::Red
    } else if classes.contains(ContainerClass::COMPLETE) {
        Color::Green
    } else {
        Color::Blue
    }
}

/// Draws a snapshot of the overlay.
///
/// A hidden overlay draws nothing. Otherwise the label (if shown) goes on the first row, then the
/// count text centered on the tooltip offset, then the track.
pub fn render(snapshot: &Snapshot) -> Canvas {
    if !snapshot.visible {
        return Canvas::new(snapshot.track_width, 0);
    }

    let height = if snapshot.label.is_some() { 3 } else { 2 };
    let mut canvas = Canvas::new(snapshot.track_width, height);
    let color = state_color(snapshot.classes);
    let mut y = 0;

    if let Some(label) = &snapshot.label {
        canvas.set_text(
            0,
            y,
            label,
            TextStyle {
                color: None,
                bold: true,
            },
        );
        y += 1;
    }

    let count_width = snapshot.count_text.width();
    let count_x = (snapshot.tooltip_left - count_width as f64 / 2.0)
        .round()
        .max(0.0) as usize;
    canvas.set_background_color(count_x, y, count_width, color);
    canvas.set_text(count_x, y, &snapshot.count_text, TextStyle::color(Color::White));
    y += 1;

    let filled = ((snapshot.bar_width_percent / 100.0 * snapshot.track_width as f64).round()
        as usize)
        .min(snapshot.track_width);
    canvas.set_text(0, y, &FILLED.repeat(filled), TextStyle::color(color));
    canvas.set_text(
        filled,
        y,
        &EMPTY.repeat(snapshot.track_width - filled),
        TextStyle::color(Color::DarkGrey),
    );

    canvas
}
