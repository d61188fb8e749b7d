//! Append-only log of one-shot notices

use super::tint::Tint;

/// A notice printed under the task list; immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    content: String,
    tint: Tint,
}

impl LogMessage {
    pub fn new(content: impl Into<String>, tint: Tint) -> Self {
        Self {
            content: content.into(),
            tint,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }
}

/// Messages in append order. Entries are never mutated or removed.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<LogMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, content: impl Into<String>, tint: Tint) {
        self.messages.push(LogMessage::new(content, tint));
    }

    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
