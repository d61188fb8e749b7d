//! Status registry: one live task per repository in flight

use tracing::debug;

use super::tint::Tint;

/// Position of a task in its fixed progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Clone,
    Read,
    Lint,
}

impl Phase {
    /// Short label shown in the task row
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Clone => "CLONE",
            Self::Read => "READ",
            Self::Lint => "LINT",
        }
    }
}

/// Live progress record of a job still in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub key: String,
    pub phase: Option<Phase>,
    pub file_count: Option<usize>,
    pub current_file_index: Option<usize>,
    /// Crashed rule ids, in first-seen order, without duplicates
    pub warnings: Vec<String>,
    pub tint: Tint,
}

impl Task {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            phase: None,
            file_count: None,
            current_file_index: None,
            warnings: Vec::new(),
            tint: Tint::Plain,
        }
    }

    fn merge(&mut self, update: TaskUpdate) {
        if let Some(phase) = update.phase {
            self.phase = Some(phase);
        }
        if let Some(file_count) = update.file_count {
            self.file_count = Some(file_count);
        }
        if let Some(index) = update.current_file_index {
            self.current_file_index = Some(index);
        }
        if let Some(tint) = update.tint {
            self.tint = tint;
        }
    }
}

/// Partial update merged into a task; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub phase: Option<Phase>,
    pub file_count: Option<usize>,
    pub current_file_index: Option<usize>,
    pub tint: Option<Tint>,
}

impl TaskUpdate {
    /// Update that moves a task to `phase` with the given color
    pub fn phase(phase: Phase, tint: Tint) -> Self {
        Self {
            phase: Some(phase),
            tint: Some(tint),
            ..Default::default()
        }
    }

    pub fn with_file_count(mut self, file_count: usize) -> Self {
        self.file_count = Some(file_count);
        self
    }

    pub fn with_current_file_index(mut self, index: usize) -> Self {
        self.current_file_index = Some(index);
        self
    }
}

/// Ordered set of live tasks, unique by key
///
/// Tasks keep the order in which they were first seen, which is the order
/// they are rendered in.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    tasks: Vec<Task>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the task for `key` from `update`, or merge `update` into it
    pub fn upsert(&mut self, key: &str, update: TaskUpdate) {
        debug!(%key, ?update, "StatusRegistry::upsert: called");
        match self.tasks.iter_mut().find(|task| task.key == key) {
            Some(task) => task.merge(update),
            None => {
                let mut task = Task::new(key);
                task.merge(update);
                self.tasks.push(task);
            }
        }
    }

    /// Record a warning on an existing task
    ///
    /// Returns `true` only when the warning was not already present. Warnings
    /// for unknown keys are dropped.
    pub fn add_warning(&mut self, key: &str, warning: &str) -> bool {
        debug!(%key, %warning, "StatusRegistry::add_warning: called");
        let Some(task) = self.tasks.iter_mut().find(|task| task.key == key) else {
            debug!(%key, "StatusRegistry::add_warning: no such task");
            return false;
        };

        if task.warnings.iter().any(|w| w == warning) {
            return false;
        }
        task.warnings.push(warning.to_string());
        true
    }

    /// Remove the task for `key`, returning it if it existed
    pub fn remove(&mut self, key: &str) -> Option<Task> {
        debug!(%key, "StatusRegistry::remove: called");
        let position = self.tasks.iter().position(|task| task.key == key)?;
        Some(self.tasks.remove(position))
    }

    pub fn get(&self, key: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.key == key)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
