//! Rendering: frame composition, diffing and painting
//!
//! Each tick the coordinator composes a [`Frame`] from the status board and
//! the [`Painter`] writes only what changed since the previous frame.

mod diff;
mod events;
mod frame;
mod painter;
mod terminal;

pub use diff::{DiffOp, diff_frames, diff_row, diff_rows};
pub use events::TerminalEvents;
pub use frame::{Frame, TermSize};
pub use painter::Painter;
pub use terminal::{CrosstermTerminal, MemoryTerminal, Terminal};
