use crate::core::fetcher::PageFetcher;
use crate::domain::model::PageResult;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// 每頁一個抓取任務，並發上限由 `PageFetcher` 共用的 semaphore 控制；
/// 結果依完成順序送進單一 channel
pub struct BoundedScheduler {
    fetcher: Arc<PageFetcher>,
    channel_capacity: usize,
}

impl BoundedScheduler {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// 依頁碼遞增送出 [1, last_page] 的任務；所有任務結束後 channel 關閉
    pub fn spawn(self, last_page: u32) -> PageRun {
        let (tx, results) = mpsc::channel(self.channel_capacity);
        let mut tasks = JoinSet::new();

        for page in 1..=last_page {
            let fetcher = Arc::clone(&self.fetcher);
            let tx = tx.clone();
            tasks.spawn(async move {
                let result = fetcher.fetch_page(page).await;
                if tx.send(result).await.is_err() {
                    tracing::warn!("⚠️ Result channel closed, page {} discarded", page);
                }
            });
        }

        tracing::debug!("🚀 Scheduled {} page tasks", last_page);
        PageRun { results, tasks }
    }
}

/// 進行中的一次排程。drop 時中止所有尚未結束的頁面任務
pub struct PageRun {
    results: mpsc::Receiver<PageResult>,
    tasks: JoinSet<()>,
}

impl PageRun {
    /// 下一個完成的頁；所有任務結束後回傳 None
    pub async fn recv(&mut self) -> Option<PageResult> {
        self.results.recv().await
    }

    /// 尚未被回收的任務數
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// 回收所有任務並記錄異常結束者 (panic / 被中止)
    pub async fn finish(mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("❌ Page task aborted: {}", e);
            }
        }
    }
}
