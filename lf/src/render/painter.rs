//! Terminal painter: applies frame diffs to a terminal

use eyre::{Context, Result};
use tracing::{debug, info};

use super::diff::{DiffOp, diff_frames};
use super::frame::{Frame, TermSize};
use super::terminal::Terminal;
use crate::status::StatusBoard;

/// Paints frames incrementally against the last painted baseline
///
/// The baseline is only valid for the terminal size it was painted at; any
/// size change clears the screen and repaints from scratch.
pub struct Painter<T: Terminal> {
    terminal: T,
    baseline: Frame,
    baseline_size: Option<TermSize>,
}

impl<T: Terminal> Painter<T> {
    pub fn new(terminal: T) -> Self {
        Self {
            terminal,
            baseline: Frame::default(),
            baseline_size: None,
        }
    }

    /// Hide the cursor and start from a clear screen
    pub fn start(&mut self) -> Result<()> {
        debug!("Painter::start: called");
        self.terminal.set_cursor_visible(false)?;
        self.reset()
    }

    /// Clear the screen and drop the baseline so the next paint is complete
    pub fn reset(&mut self) -> Result<()> {
        debug!("Painter::reset: called");
        self.terminal.clear_screen().context("Failed to clear terminal")?;
        self.terminal.flush()?;
        self.baseline = Frame::default();
        self.baseline_size = None;
        Ok(())
    }

    /// Compose the current frame from `board` and paint it
    ///
    /// Returns the number of ops written.
    pub fn paint(&mut self, board: &StatusBoard) -> Result<usize> {
        let size = self.terminal.size().context("Failed to query terminal size")?;
        if self.baseline_size.is_some_and(|s| s != size) {
            info!(?size, "Terminal size changed, repainting");
            self.reset()?;
        }
        let frame = Frame::compose(board, size);
        self.paint_frame(frame, size)
    }

    /// Paint an already composed frame laid out for `size`
    pub fn paint_frame(&mut self, frame: Frame, size: TermSize) -> Result<usize> {
        let ops = diff_frames(&self.baseline, &frame);
        debug!(ops = ops.len(), rows = frame.len(), "Painter::paint_frame: diffed");

        for op in &ops {
            self.apply(op, &frame)?;
        }

        let (column, row) = resting_position(&frame, size);
        self.terminal.move_to(column, row)?;
        self.terminal.flush().context("Failed to flush terminal")?;

        self.baseline = frame;
        self.baseline_size = Some(size);
        Ok(ops.len())
    }

    fn apply(&mut self, op: &DiffOp, frame: &Frame) -> Result<()> {
        self.terminal.move_to(to_cell(op.column_start), to_cell(op.row))?;
        if op.full_row {
            self.terminal.clear_line()?;
        }
        if !op.text.is_empty() {
            self.terminal.write_tinted(&op.text, frame.tint(op.row))?;
        }
        Ok(())
    }

    /// Leave the cursor on a fresh line below the last frame and show it
    pub fn finish(&mut self) -> Result<()> {
        debug!("Painter::finish: called");
        let size = self.baseline_size.unwrap_or(TermSize::new(0, 0));
        if self.baseline.len() >= size.rows as usize {
            self.terminal.move_to(size.cols.saturating_sub(1), size.rows.saturating_sub(1))?;
            self.terminal.write_tinted("\n", crate::status::Tint::Plain)?;
        } else {
            self.terminal.move_to(0, to_cell(self.baseline.len()))?;
        }
        self.terminal.set_cursor_visible(true)?;
        self.terminal.flush()?;
        Ok(())
    }
}

/// Cursor parking spot: below the frame, or the bottom-right cell when full
fn resting_position(frame: &Frame, size: TermSize) -> (u16, u16) {
    if frame.len() >= size.rows as usize {
        (size.cols.saturating_sub(1), size.rows.saturating_sub(1))
    } else {
        (0, to_cell(frame.len()))
    }
}

fn to_cell(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::terminal::MemoryTerminal;
    use crate::status::Tint;

    fn painter(cols: u16, rows: u16) -> (Painter<MemoryTerminal>, MemoryTerminal) {
        let screen = MemoryTerminal::new(cols, rows);
        let mut painter = Painter::new(screen.clone());
        painter.start().unwrap();
        (painter, screen)
    }

    #[test]
    fn test_first_paint_draws_everything() {
        let (mut painter, screen) = painter(40, 10);
        let mut board = StatusBoard::new();
        board.on_task_start("repo");

        painter.paint(&board).unwrap();
        assert_eq!(screen.visible_lines(), vec!["Scanned 0 repositories", "[START] repo"]);
        assert_eq!(screen.row_tint(1), Tint::Yellow);
        assert_eq!(screen.cursor(), (0, 3));
        assert!(!screen.cursor_visible());
    }

    #[test]
    fn test_progress_tick_writes_only_changed_cells() {
        let (mut painter, screen) = painter(40, 10);
        let mut board = StatusBoard::new();
        board.on_task_start("repo");
        board.on_lint_start("repo", 20);
        board.on_file_lint_end("repo", 11);
        painter.paint(&board).unwrap();

        let before = screen.chars_written();
        board.on_file_lint_end("repo", 12);
        let ops = painter.paint(&board).unwrap();

        assert_eq!(ops, 1);
        assert_eq!(screen.chars_written() - before, 1);
        assert_eq!(screen.lines()[1], "[LINT ] repo 12/20");
    }

    #[test]
    fn test_unchanged_board_paints_nothing() {
        let (mut painter, screen) = painter(40, 10);
        let mut board = StatusBoard::new();
        board.on_task_start("repo");
        painter.paint(&board).unwrap();

        let before = screen.chars_written();
        assert_eq!(painter.paint(&board).unwrap(), 0);
        assert_eq!(screen.chars_written(), before);
    }

    #[test]
    fn test_completed_task_row_is_replaced() {
        let (mut painter, screen) = painter(60, 10);
        let mut board = StatusBoard::new();
        board.on_task_start("a");
        board.on_task_start("b");
        painter.paint(&board).unwrap();

        board.on_lint_end("a", 0);
        painter.paint(&board).unwrap();

        assert_eq!(
            screen.visible_lines(),
            vec![
                "Scanned 1 repositories",
                "[START] b",
                "",
                "[DONE] a without errors",
            ]
        );
        assert_eq!(screen.row_tint(3), Tint::Green);
    }

    #[test]
    fn test_size_change_forces_repaint() {
        let (mut painter, screen) = painter(40, 10);
        let mut board = StatusBoard::new();
        board.on_task_start("repo");
        painter.paint(&board).unwrap();
        let clears = screen.screen_clears();

        screen.set_size(30, 10);
        painter.paint(&board).unwrap();

        assert_eq!(screen.screen_clears(), clears + 1);
        assert_eq!(screen.visible_lines(), vec!["Scanned 0 repositories", "[START] repo"]);
    }

    #[test]
    fn test_overflow_renders_exactly_height_rows() {
        let (mut painter, screen) = painter(60, 10);
        let mut board = StatusBoard::new();
        for i in 0..12 {
            board.on_read_failure(&format!("r{}", i));
        }

        painter.paint(&board).unwrap();
        let lines = screen.lines();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[9], "... 4 rows hidden");
        assert_eq!(screen.row_tint(9), Tint::Overflow);
        assert_eq!(screen.cursor(), (59, 9));
    }

    #[test]
    fn test_finish_shows_cursor_below_frame() {
        let (mut painter, screen) = painter(40, 10);
        let board = StatusBoard::new();
        painter.paint(&board).unwrap();
        painter.finish().unwrap();

        assert!(screen.cursor_visible());
        assert_eq!(screen.cursor(), (0, 2));
    }
}
