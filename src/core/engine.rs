use crate::config::RunSettings;
use crate::core::discovery::discover_last_page;
use crate::core::fetcher::{CatalogClient, PageFetcher, RetryPolicy};
use crate::core::scheduler::BoundedScheduler;
use crate::core::sink::{CsvSink, ProgressReporter};
use crate::domain::model::{RunProgress, RunSummary};
use crate::domain::ports::Transport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct ScrapeEngine {
    transport: Arc<dyn Transport>,
    settings: RunSettings,
    reporter: ProgressReporter,
    monitor: SystemMonitor,
}

impl ScrapeEngine {
    pub fn new(transport: Arc<dyn Transport>, settings: RunSettings) -> Self {
        let monitor = SystemMonitor::new(settings.monitoring);
        Self {
            transport,
            settings,
            reporter: ProgressReporter,
            monitor,
        }
    }

    fn client(&self) -> Result<CatalogClient> {
        CatalogClient::new(
            Arc::clone(&self.transport),
            &self.settings.base_url,
            self.settings.headers.clone(),
            self.settings.request_timeout,
        )
    }

    /// 探索頁數 → 排程抓取 → 依完成順序寫入；只有探索失敗或輸出錯誤會中止
    pub async fn run(&self) -> Result<RunSummary> {
        let settings = &self.settings;
        tracing::info!("🚀 Starting catalog scrape from {}", settings.base_url);

        let client = self.client()?;

        // 探索失敗時尚未建立輸出檔
        let pagination = discover_last_page(&client).await?;
        let last_page = pagination.last_page;
        self.monitor.log_stats("Discovery");

        let sink = CsvSink::create(&settings.output_path, last_page)?;
        let progress = self.stream_pages(client, last_page, sink).await?;
        let summary = RunSummary::from_progress(&progress, settings.output_path.clone());

        if summary.is_complete() {
            tracing::info!(
                "✅ Done. {} rows saved to {}",
                summary.rows_written,
                summary.output_path.display()
            );
        } else {
            tracing::warn!(
                "⚠️ Done with {} dropped page(s) {:?}. {} rows saved to {}",
                summary.dropped_pages.len(),
                summary.dropped_pages,
                summary.rows_written,
                summary.output_path.display()
            );
        }
        self.monitor.log_final_stats();

        Ok(summary)
    }

    /// 抓取 [1, last_page] 並寫入 sink。寫入失敗時立即返回，
    /// 其餘頁面任務隨 `PageRun` 一併中止
    async fn stream_pages<W: Write>(
        &self,
        client: CatalogClient,
        last_page: u32,
        mut sink: CsvSink<W>,
    ) -> Result<RunProgress> {
        let settings = &self.settings;
        let fetcher = PageFetcher::new(
            client,
            RetryPolicy {
                max_attempts: settings.retry_limit,
                base_delay: settings.retry_delay,
                slot_policy: settings.backoff_slot_policy,
            },
            Arc::new(Semaphore::new(settings.concurrency)),
        );

        tracing::info!(
            "⚙️ Fetching {} pages with concurrency {} ({} attempts per page, {:?} backoff slot policy)",
            last_page,
            settings.concurrency,
            settings.retry_limit,
            settings.backoff_slot_policy
        );

        let mut run = BoundedScheduler::new(fetcher).spawn(last_page);
        let mut seen = HashSet::with_capacity(last_page as usize);

        while let Some(result) = run.recv().await {
            seen.insert(result.page);
            if let Err(e) = sink.consume(result) {
                tracing::error!(
                    "❌ Writing output failed, cancelling {} page task(s): {}",
                    run.pending_tasks(),
                    e
                );
                return Err(e);
            }
            self.reporter.report(sink.progress());
        }
        run.finish().await;

        for page in (1..=last_page).filter(|page| !seen.contains(page)) {
            tracing::warn!("❌ Page {} produced no result, counting it as dropped", page);
            sink.record_missing(page);
        }

        let (_, progress) = sink.finish()?;
        Ok(progress)
    }
}
