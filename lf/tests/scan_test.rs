//! End-to-end scans with scripted jobs and an in-memory terminal

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;

use lintfleet::coordinator::{ControlMessage, Coordinator, CoordinatorConfig, EventSink, ScanSummary};
use lintfleet::job::{Finding, Job, JobEvent};
use lintfleet::persist::{PersistError, ResultWriter};
use lintfleet::pool::PoolConfig;
use lintfleet::render::MemoryTerminal;
use lintfleet::scan::Scanner;
use lintfleet::status::Tint;

/// Replays a fixed event script per key and records start/end order
struct ScriptedJob {
    timeline: Arc<Mutex<Vec<String>>>,
}

impl ScriptedJob {
    fn new() -> Self {
        Self {
            timeline: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, entry: String) {
        self.timeline.lock().unwrap().push(entry);
    }
}

fn finding(n: usize) -> Finding {
    Finding {
        path: format!("src/file{}.js", n),
        message: "unused variable".to_string(),
    }
}

#[async_trait]
impl Job for ScriptedJob {
    async fn run(&self, key: &str, sink: &EventSink) -> Result<Vec<Finding>> {
        self.record(format!("start:{}", key));
        sink.emit(JobEvent::Start).await;
        sink.emit(JobEvent::Clone).await;

        let results = match key {
            "A" => {
                sink.emit(JobEvent::CloneFailure).await;
                Vec::new()
            }
            "FAIL" => {
                self.record(format!("end:{}", key));
                return Err(eyre::eyre!("remote hung up"));
            }
            _ => {
                sink.emit(JobEvent::Read).await;
                sink.emit(JobEvent::LintStart { file_count: 2 }).await;
                let pause = if key.starts_with("slow") { 100 } else { 15 };
                for index in 1..=2 {
                    tokio::time::sleep(Duration::from_millis(pause)).await;
                    sink.emit(JobEvent::FileLintEnd { index }).await;
                }
                if key == "C" { vec![finding(1), finding(2)] } else { Vec::new() }
            }
        };

        self.record(format!("end:{}", key));
        Ok(results)
    }
}

#[derive(Default)]
struct MemoryWriter {
    written: Mutex<Vec<(String, usize)>>,
    fail: bool,
}

#[async_trait]
impl ResultWriter for MemoryWriter {
    async fn write(&self, repository: &str, findings: &[Finding]) -> Result<PathBuf, PersistError> {
        if self.fail {
            return Err(PersistError::Write {
                path: PathBuf::from("/results/out.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.written
            .lock()
            .unwrap()
            .push((repository.to_string(), findings.len()));
        Ok(PathBuf::from(format!("/results/{}.json", repository)))
    }
}

fn coordinator_config() -> CoordinatorConfig {
    CoordinatorConfig {
        tick_ms: 10,
        channel_buffer: 64,
    }
}

async fn run_scan(
    keys: &[&str],
    concurrency: usize,
    job: Arc<ScriptedJob>,
    writer: Arc<MemoryWriter>,
    screen: MemoryTerminal,
) -> ScanSummary {
    let coordinator = Coordinator::new(coordinator_config(), screen);
    let handle = coordinator.handle();
    let render = tokio::spawn(coordinator.run());

    let scanner = Scanner::new(PoolConfig::new(concurrency), job, writer);
    let keys = keys.iter().map(|k| k.to_string()).collect();
    scanner.scan(keys, handle).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), render)
        .await
        .expect("coordinator should stop after the scan")
        .unwrap()
        .unwrap()
}

fn log_contents(summary: &ScanSummary) -> Vec<String> {
    summary
        .board
        .log()
        .messages()
        .iter()
        .map(|m| m.content().to_string())
        .collect()
}

#[tokio::test]
async fn test_three_repositories_two_slots() {
    let screen = MemoryTerminal::new(80, 24);
    let job = Arc::new(ScriptedJob::new());
    let writer = Arc::new(MemoryWriter::default());

    let summary = run_scan(&["A", "B", "C"], 2, job.clone(), writer.clone(), screen.clone()).await;
    let log = log_contents(&summary);

    assert_eq!(log.len(), 5);
    let position = |line: &str| log.iter().position(|l| l == line).unwrap();
    assert!(position("[WARN] A: failed to clone repository") < position("[DONE] A without errors"));
    assert!(log.contains(&"[DONE] B without errors".to_string()));
    assert!(log.contains(&"[DONE] C with 2 errors".to_string()));
    assert_eq!(log[4], "[DONE] Finished scan of 3 repositories");

    assert_eq!(summary.scanned(), 3);
    assert!(summary.board.registry().is_empty());

    // C only starts once A or B has finished
    let timeline = job.timeline.lock().unwrap().clone();
    let at = |entry: &str| timeline.iter().position(|e| e == entry).unwrap();
    assert!(at("start:C") > at("end:A").min(at("end:B")));

    let mut written = writer.written.lock().unwrap().clone();
    written.sort();
    assert_eq!(
        written,
        vec![("A".to_string(), 0), ("B".to_string(), 0), ("C".to_string(), 2)]
    );

    // the last painted frame matches the final board
    let lines = screen.visible_lines();
    assert_eq!(lines[0], "Scanned 3 repositories");
    assert_eq!(lines[1], "");
    assert_eq!(lines.last().map(String::as_str), Some("[DONE] Finished scan of 3 repositories"));
    assert_eq!(screen.row_tint(lines.len() - 1), Tint::Green);
}

#[tokio::test]
async fn test_failed_job_still_counts_as_scanned() {
    let screen = MemoryTerminal::new(80, 24);
    let summary = run_scan(
        &["FAIL", "B"],
        2,
        Arc::new(ScriptedJob::new()),
        Arc::new(MemoryWriter::default()),
        screen.clone(),
    )
    .await;

    let log = log_contents(&summary);
    assert!(log.contains(&"[FAIL] FAIL: remote hung up".to_string()));
    assert_eq!(summary.scanned(), 2);
    assert_eq!(log.last().map(String::as_str), Some("[DONE] Finished scan of 2 repositories"));
}

#[tokio::test]
async fn test_write_failure_is_a_single_warning() {
    let screen = MemoryTerminal::new(80, 24);
    let writer = Arc::new(MemoryWriter {
        fail: true,
        ..Default::default()
    });

    let summary = run_scan(&["B"], 1, Arc::new(ScriptedJob::new()), writer, screen).await;

    let log = log_contents(&summary);
    assert_eq!(
        log,
        vec![
            "[DONE] B without errors",
            "[WARN] B: failed to write results",
            "[DONE] Finished scan of 1 repositories",
        ]
    );
}

#[tokio::test]
async fn test_resize_mid_scan_repaints_at_new_width() {
    let screen = MemoryTerminal::new(80, 24);
    let coordinator = Coordinator::new(coordinator_config(), screen.clone());
    let handle = coordinator.handle();
    let control = coordinator.control_sender();
    let render = tokio::spawn(coordinator.run());

    let scanner = Scanner::new(
        PoolConfig::new(1),
        Arc::new(ScriptedJob::new()),
        Arc::new(MemoryWriter::default()),
    );
    let scan = tokio::spawn(async move {
        scanner
            .scan(vec!["slow-and-rather-long-repository".to_string()], handle)
            .await
    });

    // wait for the task row to be painted
    for _ in 0..100 {
        if screen.lines()[1].contains("slow") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    screen.set_size(20, 24);
    control.send(ControlMessage::Resize { cols: 20, rows: 24 }).unwrap();

    scan.await.unwrap().unwrap();
    let summary = render.await.unwrap().unwrap();

    assert_eq!(summary.metrics.resizes, 1);
    assert!(screen.lines().iter().all(|line| line.chars().count() <= 20));
    assert_eq!(screen.lines()[2], "[DONE] slow-and-r...");
}
