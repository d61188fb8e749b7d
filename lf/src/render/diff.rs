//! Diff engine: minimal terminal writes between two frames

use super::frame::Frame;

/// One terminal write
///
/// `full_row` ops clear the whole row before writing `text` from column 0;
/// an empty `text` just clears the row. Other ops overwrite `text` in place
/// starting at `column_start`.
///
/// Columns count `char`s, which assumes every character is one cell wide.
/// Wide characters (CJK, emoji) in keys or messages will shift later cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp {
    pub row: usize,
    pub column_start: usize,
    pub text: String,
    pub full_row: bool,
}

impl DiffOp {
    pub fn full(row: usize, text: &str) -> Self {
        Self {
            row,
            column_start: 0,
            text: text.to_string(),
            full_row: true,
        }
    }

    pub fn cells(row: usize, column_start: usize, text: String) -> Self {
        Self {
            row,
            column_start,
            text,
            full_row: false,
        }
    }
}

/// Compare one row; `None` when it is unchanged
///
/// Rows of different length are replaced whole. Otherwise the op spans from
/// the first to the last differing character, inclusive.
pub fn diff_row(row: usize, previous: &str, current: &str) -> Option<DiffOp> {
    let prev: Vec<char> = previous.chars().collect();
    let cur: Vec<char> = current.chars().collect();

    if prev.len() != cur.len() {
        return Some(DiffOp::full(row, current));
    }

    let lo = prev.iter().zip(&cur).position(|(a, b)| a != b)?;
    let hi = prev
        .iter()
        .rev()
        .zip(cur.iter().rev())
        .position(|(a, b)| a != b)
        .map(|from_end| cur.len() - 1 - from_end)
        .unwrap_or(lo);

    Some(DiffOp::cells(row, lo, cur[lo..=hi].iter().collect()))
}

/// Row-by-row text diff, ignoring colors
///
/// New rows become full-row ops; rows that disappeared become clearing ops.
pub fn diff_rows(previous: &[String], current: &[String]) -> Vec<DiffOp> {
    let mut ops: Vec<DiffOp> = current
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match previous.get(i) {
            Some(prev) => diff_row(i, prev, row),
            None => Some(DiffOp::full(i, row)),
        })
        .collect();

    ops.extend((current.len()..previous.len()).map(|i| DiffOp::full(i, "")));
    ops
}

/// Full diff between two frames of the same width
///
/// Rows whose color changed, and the hidden-rows notice, are rewritten in
/// full and come first. Cell-level ops for the remaining rows follow in row
/// order, then clears for rows that no longer exist.
pub fn diff_frames(previous: &Frame, current: &Frame) -> Vec<DiffOp> {
    let mut forced = Vec::new();
    let mut cells = Vec::new();

    for (i, row) in current.rows().iter().enumerate() {
        let recolored = previous.tints().get(i) != current.tints().get(i);
        if recolored || current.is_overflow_row(i) || previous.is_overflow_row(i) {
            forced.push(DiffOp::full(i, row));
            continue;
        }
        if let Some(op) = diff_row(i, &previous.rows()[i], row) {
            cells.push(op);
        }
    }

    cells.extend((current.len()..previous.len()).map(|i| DiffOp::full(i, "")));
    forced.extend(cells);
    forced
}
