use crate::canvas::Canvas;
use crossterm::{cursor, execute, queue, terminal};
use std::io::{self, stdout};

/// Redraws the overlay in place at the cursor's position when it was created.
///
/// The cursor is hidden for as long as the overlay is alive.
pub struct TerminalOverlay {
    _private: (),
}

impl TerminalOverlay {
    /// Takes over the terminal below the cursor.
    pub fn new() -> io::Result<Self> {
        execute!(stdout(), cursor::Hide, cursor::SavePosition)?;
        Ok(Self { _private: () })
    }

    /// The width available to the overlay, in cells.
    pub fn width(&self) -> io::Result<usize> {
        let (width, _) = terminal::size()?;
        Ok(width as usize)
    }

    /// Replaces whatever was drawn last with `canvas`.
    pub fn draw(&mut self, canvas: &Canvas) -> io::Result<()> {
        let mut dest = stdout();
        queue!(
            dest,
            cursor::RestorePosition,
            terminal::Clear(terminal::ClearType::FromCursorDown)
        )?;
        canvas.write_ansi(&mut dest)
    }
}

impl Drop for TerminalOverlay {
    fn drop(&mut self) {
        let _ = execute!(stdout(), cursor::Show);
    }
}
