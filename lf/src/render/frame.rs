//! Frame composition: rows and colors for one tick

use tracing::debug;

use crate::status::{StatusBoard, Tint, templates};

/// Visible terminal area in character cells
///
/// Width fitting treats each `char` as a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub cols: u16,
    pub rows: u16,
}

impl TermSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

/// One rendered snapshot: rows with a parallel list of colors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    rows: Vec<String>,
    tints: Vec<Tint>,
    overflow_row: Option<usize>,
}

impl Frame {
    /// Build a frame from already fitted rows
    pub fn new(rows: Vec<String>, tints: Vec<Tint>) -> Self {
        debug_assert_eq!(rows.len(), tints.len(), "rows and tints must line up");
        Self {
            rows,
            tints,
            overflow_row: None,
        }
    }

    /// Compose the frame for `board` at terminal `size`
    ///
    /// Layout: header, one row per task, a blank separator, then one row per
    /// message. Rows wider than the terminal are cut with `...`; a frame
    /// taller than the terminal keeps `rows - 1` rows and ends with a notice
    /// of how many rows were hidden.
    pub fn compose(board: &StatusBoard, size: TermSize) -> Self {
        let tasks = board.registry().tasks();
        let messages = board.log().messages();
        let width = size.cols as usize;

        let mut rows = Vec::with_capacity(tasks.len() + messages.len() + 2);
        let mut tints = Vec::with_capacity(rows.capacity());

        rows.push(templates::scanned_header(board.scanned()));
        tints.push(Tint::Plain);
        for task in tasks {
            rows.push(templates::task_row(task));
            tints.push(task.tint);
        }
        rows.push(String::new());
        tints.push(Tint::Plain);
        for message in messages {
            rows.push(message.content().to_string());
            tints.push(message.tint());
        }

        let mut rows: Vec<String> = rows.into_iter().map(|row| fit_width(row, width)).collect();
        let mut overflow_row = None;

        let height = size.rows as usize;
        if rows.len() > height {
            let hidden = rows.len() - height;
            debug!(total = rows.len(), height, hidden, "Frame::compose: overflowing rows");
            let keep = height.saturating_sub(1);
            rows.truncate(keep);
            tints.truncate(keep);
            if height > 0 {
                rows.push(fit_width(templates::overflow_row(hidden), width));
                tints.push(Tint::Overflow);
                overflow_row = Some(rows.len() - 1);
            }
        }

        Self {
            rows,
            tints,
            overflow_row,
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn tints(&self) -> &[Tint] {
        &self.tints
    }

    pub fn tint(&self, row: usize) -> Tint {
        self.tints.get(row).copied().unwrap_or_default()
    }

    /// Index of the synthetic hidden-rows notice, if the frame overflowed
    pub fn overflow_row(&self) -> Option<usize> {
        self.overflow_row
    }

    pub fn is_overflow_row(&self, row: usize) -> bool {
        self.overflow_row == Some(row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cut `row` to `width` characters, ending in `...` when it was too long
fn fit_width(row: String, width: usize) -> String {
    if row.chars().count() <= width {
        return row;
    }
    let mut fitted: String = row.chars().take(width.saturating_sub(3)).collect();
    fitted.extend("...".chars().take(width));
    fitted
}
