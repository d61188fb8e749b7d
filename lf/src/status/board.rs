//! StatusBoard - applies job events to the registry and message log

use tracing::{debug, info};

use crate::job::JobEvent;

use super::message_log::MessageLog;
use super::registry::{Phase, StatusRegistry, TaskUpdate};
use super::templates;
use super::tint::Tint;

/// Everything the renderer shows: live tasks, notices and the scanned count
///
/// Single writer: only the coordinator holds a `StatusBoard`, and every
/// handler runs to completion before the next frame is composed.
#[derive(Debug, Default)]
pub struct StatusBoard {
    registry: StatusRegistry,
    log: MessageLog,
    scanned: usize,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Count of repositories that reached completion
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    /// Dispatch a job event to its handler
    pub fn apply(&mut self, key: &str, event: &JobEvent) {
        debug!(%key, ?event, "StatusBoard::apply: called");
        match event {
            JobEvent::Start => self.on_task_start(key),
            JobEvent::Clone => self.on_repository_clone(key),
            JobEvent::Read => self.on_repository_read(key),
            JobEvent::CloneFailure => self.on_clone_failure(key),
            JobEvent::ReadFailure => self.on_read_failure(key),
            JobEvent::LintStart { file_count } => self.on_lint_start(key, *file_count),
            JobEvent::FileLintEnd { index } => self.on_file_lint_end(key, *index),
            JobEvent::LinterCrash { rule_id } => self.on_linter_crash(key, rule_id),
        }
    }

    pub fn on_task_start(&mut self, key: &str) {
        self.registry.upsert(key, TaskUpdate::phase(Phase::Start, Tint::Yellow));
    }

    pub fn on_repository_clone(&mut self, key: &str) {
        self.registry.upsert(key, TaskUpdate::phase(Phase::Clone, Tint::Yellow));
    }

    pub fn on_repository_read(&mut self, key: &str) {
        self.registry.upsert(key, TaskUpdate::phase(Phase::Read, Tint::Yellow));
    }

    pub fn on_lint_start(&mut self, key: &str, file_count: usize) {
        self.registry.upsert(
            key,
            TaskUpdate::phase(Phase::Lint, Tint::Yellow)
                .with_file_count(file_count)
                .with_current_file_index(0),
        );
    }

    pub fn on_file_lint_end(&mut self, key: &str, index: usize) {
        self.registry.upsert(
            key,
            TaskUpdate::phase(Phase::Lint, Tint::Green).with_current_file_index(index),
        );
    }

    /// Job resolved: drop its task, count it and report the result
    pub fn on_lint_end(&mut self, key: &str, result_count: usize) {
        info!(%key, result_count, "Repository scanned");
        self.scanned += 1;
        self.registry.remove(key);

        let tint = if result_count > 0 { Tint::Red } else { Tint::Green };
        self.log.push(templates::done_message(key, result_count), tint);
    }

    /// Crash warnings are reported once per (task, rule)
    pub fn on_linter_crash(&mut self, key: &str, rule_id: &str) {
        if self.registry.add_warning(key, rule_id) {
            self.log.push(templates::linter_crash_message(key, rule_id), Tint::Yellow);
        } else {
            debug!(%key, %rule_id, "StatusBoard::on_linter_crash: already reported");
        }
    }

    pub fn on_clone_failure(&mut self, key: &str) {
        self.log.push(templates::clone_failure_message(key), Tint::Yellow);
    }

    pub fn on_read_failure(&mut self, key: &str) {
        self.log.push(templates::read_failure_message(key), Tint::Yellow);
    }

    pub fn on_write_failure(&mut self, key: &str) {
        self.log.push(templates::write_failure_message(key), Tint::Yellow);
    }

    /// Job failed or panicked without resolving; it still counts as scanned
    pub fn on_job_failure(&mut self, key: &str, reason: &str) {
        info!(%key, %reason, "Repository scan failed");
        self.scanned += 1;
        self.registry.remove(key);
        self.log.push(templates::job_failure_message(key, reason), Tint::Red);
    }

    /// Closing summary appended once every job has completed
    pub fn on_all_scanned(&mut self) {
        info!(scanned = self.scanned, "All repositories scanned");
        self.log.push(templates::finished_message(self.scanned), Tint::Green);
    }
}
