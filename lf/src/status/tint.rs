//! Display color tags

/// Color tag attached to a task row or log message
///
/// Tags are compared between ticks: a row whose tag changed is repainted in
/// full, since a color cannot be applied to a sub-span of an already painted
/// row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tint {
    /// Terminal default colors
    #[default]
    Plain,
    Yellow,
    Green,
    Red,
    /// Black on yellow, reserved for the hidden-rows notice
    Overflow,
}
