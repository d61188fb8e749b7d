//! Terminal boundary
//!
//! The painter only needs a handful of primitives, captured by [`Terminal`].
//! [`CrosstermTerminal`] drives a real terminal; [`MemoryTerminal`] keeps a
//! character grid in memory for headless runs and tests.

use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use eyre::Result;
use tracing::debug;

use super::frame::TermSize;
use crate::status::Tint;

/// Primitive terminal operations used by the painter
pub trait Terminal {
    /// Current size in cells
    fn size(&self) -> Result<TermSize>;

    /// Move the cursor to `column`, `row` (0-based)
    fn move_to(&mut self, column: u16, row: u16) -> Result<()>;

    /// Clear the row the cursor is on; the cursor does not move
    fn clear_line(&mut self) -> Result<()>;

    /// Write `text` at the cursor in the colors of `tint`
    fn write_tinted(&mut self, text: &str, tint: Tint) -> Result<()>;

    /// Clear the whole screen and home the cursor
    fn clear_screen(&mut self) -> Result<()>;

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;

    /// Push queued output to the device
    fn flush(&mut self) -> Result<()>;
}

/// Foreground and background colors for a tint
fn tint_colors(tint: Tint) -> (Option<Color>, Option<Color>) {
    match tint {
        Tint::Plain => (None, None),
        Tint::Yellow => (Some(Color::Yellow), None),
        Tint::Green => (Some(Color::Green), None),
        Tint::Red => (Some(Color::Red), None),
        Tint::Overflow => (Some(Color::Black), Some(Color::Yellow)),
    }
}

/// Terminal driven through crossterm commands
///
/// Commands are queued and only written out on [`Terminal::flush`], so a
/// tick reaches the device as one write.
pub struct CrosstermTerminal<W: Write> {
    out: W,
}

impl CrosstermTerminal<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> CrosstermTerminal<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Terminal for CrosstermTerminal<W> {
    fn size(&self) -> Result<TermSize> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(TermSize::new(cols, rows))
    }

    fn move_to(&mut self, column: u16, row: u16) -> Result<()> {
        queue!(self.out, MoveTo(column, row))?;
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::CurrentLine))?;
        Ok(())
    }

    fn write_tinted(&mut self, text: &str, tint: Tint) -> Result<()> {
        let (fg, bg) = tint_colors(tint);
        if let Some(fg) = fg {
            queue!(self.out, SetForegroundColor(fg))?;
        }
        if let Some(bg) = bg {
            queue!(self.out, SetBackgroundColor(bg))?;
        }
        queue!(self.out, Print(text))?;
        if fg.is_some() || bg.is_some() {
            queue!(self.out, ResetColor)?;
        }
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<()> {
        debug!("CrosstermTerminal::clear_screen: called");
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        if visible {
            queue!(self.out, Show)?;
        } else {
            queue!(self.out, Hide)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Debug)]
struct Screen {
    size: TermSize,
    cells: Vec<Vec<char>>,
    row_tints: Vec<Tint>,
    cursor: (u16, u16),
    cursor_visible: bool,
    chars_written: usize,
    screen_clears: usize,
}

impl Screen {
    fn new(size: TermSize) -> Self {
        Self {
            size,
            cells: vec![vec![' '; size.cols as usize]; size.rows as usize],
            row_tints: vec![Tint::Plain; size.rows as usize],
            cursor: (0, 0),
            cursor_visible: true,
            chars_written: 0,
            screen_clears: 0,
        }
    }

    fn resize(&mut self, size: TermSize) {
        for row in &mut self.cells {
            row.resize(size.cols as usize, ' ');
        }
        self.cells.resize(size.rows as usize, vec![' '; size.cols as usize]);
        self.row_tints.resize(size.rows as usize, Tint::Plain);
        self.size = size;
    }

    fn put(&mut self, ch: char) {
        let (col, row) = self.cursor;
        if let Some(line) = self.cells.get_mut(row as usize)
            && let Some(cell) = line.get_mut(col as usize)
        {
            *cell = ch;
        }
        self.cursor.0 = col.saturating_add(1);
    }
}

/// In-memory terminal with a shared character grid
///
/// Clones share the same screen, so a test can hand one clone to the painter
/// and inspect the screen through another. Writes past the right edge are
/// dropped instead of wrapping.
#[derive(Debug, Clone)]
pub struct MemoryTerminal {
    screen: Arc<Mutex<Screen>>,
}

impl MemoryTerminal {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen::new(TermSize::new(cols, rows)))),
        }
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the reported size, keeping existing content where it fits
    pub fn set_size(&self, cols: u16, rows: u16) {
        self.screen().resize(TermSize::new(cols, rows));
    }

    /// Screen rows with trailing blanks trimmed
    pub fn lines(&self) -> Vec<String> {
        self.screen()
            .cells
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect()
    }

    /// Non-empty rows from the top, stopping at the last written one
    pub fn visible_lines(&self) -> Vec<String> {
        let mut lines = self.lines();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }

    /// Color of the last write on `row`
    pub fn row_tint(&self, row: usize) -> Tint {
        self.screen().row_tints.get(row).copied().unwrap_or_default()
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.screen().cursor
    }

    pub fn cursor_visible(&self) -> bool {
        self.screen().cursor_visible
    }

    /// Total characters written since creation
    pub fn chars_written(&self) -> usize {
        self.screen().chars_written
    }

    /// Number of full-screen clears since creation
    pub fn screen_clears(&self) -> usize {
        self.screen().screen_clears
    }
}

impl Terminal for MemoryTerminal {
    fn size(&self) -> Result<TermSize> {
        Ok(self.screen().size)
    }

    fn move_to(&mut self, column: u16, row: u16) -> Result<()> {
        self.screen().cursor = (column, row);
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        let mut screen = self.screen();
        let row = screen.cursor.1 as usize;
        if let Some(line) = screen.cells.get_mut(row) {
            line.fill(' ');
        }
        if let Some(tint) = screen.row_tints.get_mut(row) {
            *tint = Tint::Plain;
        }
        Ok(())
    }

    fn write_tinted(&mut self, text: &str, tint: Tint) -> Result<()> {
        let mut screen = self.screen();
        let row = screen.cursor.1 as usize;
        if let Some(slot) = screen.row_tints.get_mut(row) {
            *slot = tint;
        }
        for ch in text.chars() {
            if ch == '\n' {
                screen.cursor = (0, screen.cursor.1.saturating_add(1));
                continue;
            }
            screen.put(ch);
            screen.chars_written += 1;
        }
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<()> {
        let mut screen = self.screen();
        let size = screen.size;
        screen.cells = vec![vec![' '; size.cols as usize]; size.rows as usize];
        screen.row_tints = vec![Tint::Plain; size.rows as usize];
        screen.cursor = (0, 0);
        screen.screen_clears += 1;
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.screen().cursor_visible = visible;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
