//! Text of every row and message the renderer shows

use super::registry::Task;

/// Header row with the count of finished repositories
pub fn scanned_header(scanned: usize) -> String {
    format!("Scanned {} repositories", scanned)
}

/// One row per live task, e.g. `[LINT ] owner/repo 3/10 (crashed rules: eqeqeq)`
///
/// The phase label is padded so that the key starts at the same column in
/// every phase, which keeps phase changes to a short cell-level diff.
pub fn task_row(task: &Task) -> String {
    let label = task.phase.map(|p| p.label()).unwrap_or("WAIT");
    let mut row = format!("[{:<5}] {}", label, task.key);

    if let (Some(index), Some(count)) = (task.current_file_index, task.file_count) {
        row.push_str(&format!(" {}/{}", index, count));
    }

    if !task.warnings.is_empty() {
        row.push_str(&format!(" (crashed rules: {})", task.warnings.join(", ")));
    }

    row
}

pub fn done_message(key: &str, result_count: usize) -> String {
    if result_count > 0 {
        format!("[DONE] {} with {} errors", key, result_count)
    } else {
        format!("[DONE] {} without errors", key)
    }
}

pub fn linter_crash_message(key: &str, rule_id: &str) -> String {
    format!("[WARN] {}: linter crashed on rule {}", key, rule_id)
}

pub fn clone_failure_message(key: &str) -> String {
    format!("[WARN] {}: failed to clone repository", key)
}

pub fn read_failure_message(key: &str) -> String {
    format!("[WARN] {}: failed to read repository files", key)
}

pub fn write_failure_message(key: &str) -> String {
    format!("[WARN] {}: failed to write results", key)
}

pub fn job_failure_message(key: &str, reason: &str) -> String {
    format!("[FAIL] {}: {}", key, reason)
}

pub fn finished_message(scanned: usize) -> String {
    format!("[DONE] Finished scan of {} repositories", scanned)
}

/// Synthetic last row shown when the frame is taller than the terminal
pub fn overflow_row(hidden: usize) -> String {
    format!("... {} rows hidden", hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{Phase, Tint};

    fn task(phase: Phase) -> Task {
        Task {
            key: "owner/repo".to_string(),
            phase: Some(phase),
            file_count: None,
            current_file_index: None,
            warnings: Vec::new(),
            tint: Tint::Yellow,
        }
    }

    #[test]
    fn test_task_row_aligns_keys() {
        let start = task_row(&task(Phase::Start));
        let read = task_row(&task(Phase::Read));
        assert_eq!(start, "[START] owner/repo");
        assert_eq!(read, "[READ ] owner/repo");
        assert_eq!(start.len(), read.len());
    }

    #[test]
    fn test_task_row_with_progress_and_warnings() {
        let mut t = task(Phase::Lint);
        t.file_count = Some(10);
        t.current_file_index = Some(3);
        t.warnings = vec!["eqeqeq".to_string(), "no-undef".to_string()];

        assert_eq!(
            task_row(&t),
            "[LINT ] owner/repo 3/10 (crashed rules: eqeqeq, no-undef)"
        );
    }

    #[test]
    fn test_done_message() {
        assert_eq!(done_message("a", 0), "[DONE] a without errors");
        assert_eq!(done_message("a", 2), "[DONE] a with 2 errors");
    }
}
