use crossterm::{
    csi,
    style::{Attribute, Color, Colored},
};
use std::{
    fmt::{self, Display},
    io::{self, Write},
};

/// The style of text drawn on a [`Canvas`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextStyle {
    /// The foreground color, or the terminal default.
    pub color: Option<Color>,
    /// Whether the text is bold.
    pub bold: bool,
}

impl TextStyle {
    /// A style with the given foreground color.
    pub fn color(color: Color) -> Self {
        Self {
            color: Some(color),
            bold: false,
        }
    }
}

#[derive(Clone, Copy, Default)]
struct Cell {
    background_color: Option<Color>,
    character: Option<(char, TextStyle)>,
}

impl Cell {
    fn is_empty(&self) -> bool {
        self.background_color.is_none() && self.character.is_none()
    }
}

/// A fixed-size grid of styled cells that the overlay is drawn onto.
pub struct Canvas {
    width: usize,
    rows: Vec<Vec<Cell>>,
}

impl Canvas {
    /// Creates a blank canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            rows: vec![vec![Cell::default(); width]; height],
        }
    }

    /// The canvas width, in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The canvas height, in rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Paints the background of `w` cells starting at `(x, y)`. Cells off the canvas are skipped.
    pub fn set_background_color(&mut self, x: usize, y: usize, w: usize, color: Color) {
        if let Some(row) = self.rows.get_mut(y) {
            for cell in row.iter_mut().skip(x).take(w) {
                cell.background_color = Some(color);
            }
        }
    }

    /// Writes `text` starting at `(x, y)`, one character per cell. Text past the right edge is
    /// clipped.
    pub fn set_text(&mut self, x: usize, y: usize, text: &str, style: TextStyle) {
        if let Some(row) = self.rows.get_mut(y) {
            for (cell, c) in row.iter_mut().skip(x).zip(text.chars()) {
                cell.character = Some((c, style));
            }
        }
    }

    fn write_impl<W: Write>(&self, mut w: W, ansi: bool) -> io::Result<()> {
        if ansi {
            write!(w, csi!("0m"))?;
        }

        let mut background_color = None;
        let mut text_style = TextStyle::default();

        for row in &self.rows {
            let len = row.iter().rposition(|cell| !cell.is_empty()).map_or(0, |i| i + 1);
            for cell in &row[..len] {
                if ansi {
                    if let Some((_, style)) = cell.character {
                        // Bold can only be turned off by resetting everything.
                        if text_style.bold && !style.bold {
                            write!(w, csi!("0m"))?;
                            background_color = None;
                            text_style = TextStyle::default();
                        }
                    }

                    if cell.background_color != background_color {
                        write!(
                            w,
                            csi!("{}m"),
                            Colored::BackgroundColor(cell.background_color.unwrap_or(Color::Reset))
                        )?;
                        background_color = cell.background_color;
                    }

                    if let Some((_, style)) = cell.character {
                        if style.color != text_style.color {
                            write!(
                                w,
                                csi!("{}m"),
                                Colored::ForegroundColor(style.color.unwrap_or(Color::Reset))
                            )?;
                        }
                        if style.bold && !text_style.bold {
                            write!(w, csi!("{}m"), Attribute::Bold.sgr())?;
                        }
                        text_style = style;
                    }
                }

                match cell.character {
                    Some((c, _)) => write!(w, "{}", c)?,
                    None => w.write_all(b" ")?,
                }
            }
            if ansi {
                // Wipe whatever the previous draw left past this row's content.
                write!(w, csi!("K"))?;
                w.write_all(b"\r\n")?;
            } else {
                w.write_all(b"\n")?;
            }
        }
        if ansi {
            write!(w, csi!("0m"))?;
        }
        w.flush()?;
        Ok(())
    }

    /// Writes the canvas with ANSI escape codes for colors and weight.
    pub fn write_ansi<W: Write>(&self, w: W) -> io::Result<()> {
        self.write_impl(w, true)
    }

    /// Writes the canvas as plain text.
    pub fn write<W: Write>(&self, w: W) -> io::Result<()> {
        self.write_impl(w, false)
    }
}

impl Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::with_capacity(self.width * self.rows.len());
        self.write(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
