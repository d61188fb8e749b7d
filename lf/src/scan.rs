//! Scanner - drives the worker pool and reports every outcome to the coordinator

use std::sync::Arc;

use eyre::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::coordinator::{CoordinatorHandle, EventSink, ScanSummary};
use crate::job::Job;
use crate::persist::ResultWriter;
use crate::pool::{PoolConfig, PoolReport, WorkerPool, join_error_reason};

/// Runs one job per repository under the pool's concurrency cap
///
/// Every repository signals completion exactly once, from inside its own
/// pool slot: `lint_end` when the job resolves, `job_failed` when it errors
/// or panics. Once the pool drains the coordinator is told the scan is
/// complete.
pub struct Scanner {
    pool: WorkerPool,
    job: Arc<dyn Job>,
    writer: Arc<dyn ResultWriter>,
}

impl Scanner {
    pub fn new(config: PoolConfig, job: Arc<dyn Job>, writer: Arc<dyn ResultWriter>) -> Self {
        debug!(?config, "Scanner::new: called");
        Self {
            pool: WorkerPool::new(config),
            job,
            writer,
        }
    }

    /// Scan every repository
    ///
    /// The report's values are finding counts, `None` for repositories whose
    /// job failed or that were skipped after the coordinator stopped.
    pub async fn scan(
        &self,
        repositories: Vec<String>,
        handle: CoordinatorHandle,
    ) -> Result<PoolReport<Option<usize>>> {
        info!(repositories = repositories.len(), "Starting scan");
        let report = self
            .pool
            .run(repositories, |key| {
                let job = self.job.clone();
                let writer = self.writer.clone();
                let sink = handle.sink_for(&key);
                async move {
                    if sink.is_closed() {
                        debug!(%key, "Coordinator stopped, skipping repository");
                        return None;
                    }
                    scan_repository(job, writer, key, sink).await
                }
            })
            .await?;

        for key in report.failed_keys() {
            warn!(%key, "Scan slot did not complete");
        }

        handle.all_scanned().await?;
        info!(
            scanned = report.outcomes.len(),
            peak = report.stats.peak_concurrent,
            "Scan complete"
        );
        Ok(report)
    }

    /// Scan while `render` paints, stopping as soon as either side fails
    ///
    /// A terminal failure ends the coordinator; its error is returned right
    /// away instead of after the remaining repositories are scanned.
    pub async fn scan_and_render(
        &self,
        repositories: Vec<String>,
        handle: CoordinatorHandle,
        mut render: JoinHandle<Result<ScanSummary>>,
    ) -> Result<(PoolReport<Option<usize>>, ScanSummary)> {
        debug!("Scanner::scan_and_render: called");
        let scan = self.scan(repositories, handle);
        tokio::pin!(scan);

        tokio::select! {
            report = &mut scan => {
                let summary = render.await.context("Render task panicked")??;
                Ok((report?, summary))
            }
            summary = &mut render => {
                let summary = summary.context("Render task panicked")??;
                Ok((scan.await?, summary))
            }
        }
    }
}

/// Run one job and persist its findings, reporting completion through `sink`
///
/// The job and the writer each run in their own task so that a panic in
/// either is reported here, once, rather than tearing down the slot.
async fn scan_repository(
    job: Arc<dyn Job>,
    writer: Arc<dyn ResultWriter>,
    key: String,
    sink: EventSink,
) -> Option<usize> {
    let run = tokio::spawn({
        let key = key.clone();
        let sink = sink.clone();
        async move { job.run(&key, &sink).await }
    });

    let findings = match run.await {
        Ok(Ok(findings)) => findings,
        Ok(Err(e)) => {
            warn!(%key, error = %e, "Job failed");
            sink.job_failed(&format!("{:#}", e)).await;
            return None;
        }
        Err(e) => {
            let reason = join_error_reason(e);
            warn!(%key, %reason, "Job did not complete");
            sink.job_failed(&reason).await;
            return None;
        }
    };

    let count = findings.len();
    sink.lint_end(count).await;

    let write = tokio::spawn({
        let key = key.clone();
        async move { writer.write(&key, &findings).await }
    });
    match write.await {
        Ok(Ok(path)) => debug!(%key, path = %path.display(), "Results written"),
        Ok(Err(e)) => {
            warn!(%key, error = %e, "Failed to write results");
            sink.write_failure().await;
        }
        Err(e) => {
            warn!(%key, reason = %join_error_reason(e), "Result writer did not complete");
            sink.write_failure().await;
        }
    }
    Some(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{CoordRequest, Coordinator, CoordinatorConfig};
    use crate::job::{Finding, JobEvent};
    use crate::persist::PersistError;
    use crate::render::{TermSize, Terminal};
    use crate::status::Tint;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct FixedJob {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl Job for FixedJob {
        async fn run(&self, key: &str, sink: &EventSink) -> Result<Vec<Finding>> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            sink.emit(JobEvent::Start).await;
            match key {
                "broken" => Err(eyre::eyre!("no such remote")),
                "panics" => panic!("linter exploded"),
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(Vec::new())
                }
                _ => Ok(vec![Finding {
                    path: "a.js".to_string(),
                    message: "bad".to_string(),
                }]),
            }
        }
    }

    struct FailingWriter;

    #[async_trait]
    impl ResultWriter for FailingWriter {
        async fn write(&self, _repository: &str, _findings: &[Finding]) -> Result<PathBuf, PersistError> {
            Err(PersistError::Write {
                path: PathBuf::from("/readonly/out.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    struct PanickingWriter;

    #[async_trait]
    impl ResultWriter for PanickingWriter {
        async fn write(&self, _repository: &str, _findings: &[Finding]) -> Result<PathBuf, PersistError> {
            panic!("disk on fire")
        }
    }

    /// Terminal that cannot be cleared
    struct BrokenTerminal;

    impl Terminal for BrokenTerminal {
        fn size(&self) -> Result<TermSize> {
            Ok(TermSize::new(80, 24))
        }
        fn move_to(&mut self, _column: u16, _row: u16) -> Result<()> {
            Ok(())
        }
        fn clear_line(&mut self) -> Result<()> {
            Ok(())
        }
        fn write_tinted(&mut self, _text: &str, _tint: Tint) -> Result<()> {
            Ok(())
        }
        fn clear_screen(&mut self) -> Result<()> {
            Err(eyre::eyre!("terminal gone"))
        }
        fn set_cursor_visible(&mut self, _visible: bool) -> Result<()> {
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|k| k.to_string()).collect()
    }

    async fn collect(mut rx: mpsc::Receiver<CoordRequest>) -> Vec<CoordRequest> {
        let mut requests = Vec::new();
        while let Some(req) = rx.recv().await {
            requests.push(req);
        }
        requests
    }

    fn completions(requests: &[CoordRequest], key: &str) -> usize {
        requests
            .iter()
            .filter(|r| match r {
                CoordRequest::LintEnd { key: k, .. } | CoordRequest::JobFailed { key: k, .. } => k == key,
                _ => false,
            })
            .count()
    }

    #[tokio::test]
    async fn test_every_repository_completes_once() {
        let (tx, rx) = mpsc::channel(64);
        let scanner = Scanner::new(PoolConfig::new(2), Arc::new(FixedJob::default()), Arc::new(FailingWriter));

        let report = scanner
            .scan(keys(&["ok", "broken", "panics"]), CoordinatorHandle::new(tx))
            .await
            .unwrap();
        assert_eq!(report.stats.total_panicked, 0);
        assert_eq!(report.outcomes[0].result, Ok(Some(1)));
        assert_eq!(report.outcomes[1].result, Ok(None));
        assert_eq!(report.outcomes[2].result, Ok(None));

        let requests = collect(rx).await;
        for key in ["ok", "broken", "panics"] {
            assert_eq!(completions(&requests, key), 1, "{} completed more than once", key);
        }
        assert!(requests.contains(&CoordRequest::WriteFailure { key: "ok".to_string() }));
        assert!(requests.contains(&CoordRequest::JobFailed {
            key: "broken".to_string(),
            reason: "no such remote".to_string()
        }));
        assert!(requests.iter().any(|r| matches!(
            r,
            CoordRequest::JobFailed { key, reason } if key == "panics" && reason.contains("linter exploded")
        )));
        assert_eq!(requests.last(), Some(&CoordRequest::AllScanned));
    }

    #[tokio::test]
    async fn test_panicked_job_reported_before_later_jobs() {
        let (tx, rx) = mpsc::channel(64);
        let scanner = Scanner::new(PoolConfig::new(1), Arc::new(FixedJob::default()), Arc::new(FailingWriter));

        scanner
            .scan(keys(&["panics", "ok1", "ok2"]), CoordinatorHandle::new(tx))
            .await
            .unwrap();

        let requests = collect(rx).await;
        let position = |wanted: &dyn Fn(&CoordRequest) -> bool| requests.iter().position(|r| wanted(r)).unwrap();
        let failed = position(&|r| matches!(r, CoordRequest::JobFailed { key, .. } if key == "panics"));
        let ok1_start = position(&|r| matches!(r, CoordRequest::Job { key, .. } if key == "ok1"));
        let ok2_end = position(&|r| matches!(r, CoordRequest::LintEnd { key, .. } if key == "ok2"));

        assert!(failed < ok1_start);
        assert!(failed < ok2_end);
    }

    #[tokio::test]
    async fn test_panicking_writer_is_a_write_failure() {
        let (tx, rx) = mpsc::channel(64);
        let scanner = Scanner::new(PoolConfig::new(1), Arc::new(FixedJob::default()), Arc::new(PanickingWriter));

        let report = scanner.scan(keys(&["ok"]), CoordinatorHandle::new(tx)).await.unwrap();
        assert_eq!(report.outcomes[0].result, Ok(Some(1)));

        let requests = collect(rx).await;
        assert_eq!(completions(&requests, "ok"), 1);
        assert!(requests.contains(&CoordRequest::LintEnd {
            key: "ok".to_string(),
            result_count: 1
        }));
        assert!(requests.contains(&CoordRequest::WriteFailure { key: "ok".to_string() }));
    }

    #[tokio::test]
    async fn test_stopped_coordinator_skips_remaining_jobs() {
        let (tx, rx) = mpsc::channel(64);
        drop(rx);
        let job = Arc::new(FixedJob::default());
        let scanner = Scanner::new(PoolConfig::new(2), job.clone(), Arc::new(FailingWriter));

        let result = scanner.scan(keys(&["a", "b", "c"]), CoordinatorHandle::new(tx)).await;

        assert!(result.is_err());
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_terminal_failure_aborts_the_run() {
        let coordinator = Coordinator::new(
            CoordinatorConfig {
                tick_ms: 10,
                channel_buffer: 16,
            },
            BrokenTerminal,
        );
        let handle = coordinator.handle();
        let render = tokio::spawn(coordinator.run());

        let job = Arc::new(FixedJob::default());
        let scanner = Scanner::new(PoolConfig::new(1), job.clone(), Arc::new(FailingWriter));
        let repositories = vec!["slow".to_string(); 10];

        let result = tokio::time::timeout(
            Duration::from_millis(500),
            scanner.scan_and_render(repositories, handle, render),
        )
        .await
        .expect("a terminal failure should end the run promptly");

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("terminal gone"));
        assert!(job.runs.load(Ordering::SeqCst) < 10);
    }
}
