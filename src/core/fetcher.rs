use crate::core::flatten::flatten;
use crate::domain::model::{FlatRow, PageResult, ProductsEnvelope};
use crate::domain::ports::{BackoffSlotPolicy, Transport};
use crate::utils::error::{Result, ScrapeError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use url::Url;

/// 目錄 API 的請求端：負責組出分頁 URL 並檢查回應狀態
pub struct CatalogClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    headers: Vec<(String, String)>,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: &str,
        headers: Vec<(String, String)>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ScrapeError::InvalidConfigValueError {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            transport,
            base_url,
            headers,
            timeout,
        })
    }

    /// `{base}?page={n}`，保留其他查詢參數並取代既有的 page
    pub fn page_url(&self, page: u32) -> Url {
        let retained: Vec<(String, String)> = self
            .base_url
            .query_pairs()
            .filter(|(key, _)| key != "page")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("page", &page.to_string());
        url
    }

    /// 取得一頁的原始內容，非 2xx 狀態視為失敗
    pub(crate) async fn get_page(&self, page: u32) -> Result<Vec<u8>> {
        let url = self.page_url(page);
        tracing::debug!("📡 GET {}", url);

        let response = self
            .transport
            .fetch(url.as_str(), &self.headers, self.timeout)
            .await?;

        if !response.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response.body)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub slot_policy: BackoffSlotPolicy,
}

impl RetryPolicy {
    /// 線性退避：第 n 次失敗後等待 base_delay × n
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// 以重試抓取單頁；任何失敗都只影響該頁
pub struct PageFetcher {
    client: CatalogClient,
    retry: RetryPolicy,
    slots: Arc<Semaphore>,
}

impl PageFetcher {
    pub fn new(client: CatalogClient, retry: RetryPolicy, slots: Arc<Semaphore>) -> Self {
        Self {
            client,
            retry,
            slots,
        }
    }

    async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.slots).acquire_owned().await.ok()
    }

    async fn fetch_once(&self, page: u32) -> Result<Vec<FlatRow>> {
        let body = self.client.get_page(page).await?;
        let envelope: ProductsEnvelope = serde_json::from_slice(&body)?;
        Ok(envelope
            .products
            .unwrap_or_default()
            .iter()
            .map(flatten)
            .collect())
    }

    /// 狀態機：Attempting(n) → Success | Attempting(n+1) | Exhausted
    pub async fn fetch_page(&self, page: u32) -> PageResult {
        let mut held: Option<OwnedSemaphorePermit> = None;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let permit = match held.take() {
                Some(permit) => permit,
                None => match self.acquire_slot().await {
                    Some(permit) => permit,
                    None => {
                        tracing::error!("❌ Page {}: concurrency limiter closed", page);
                        return PageResult::dropped(
                            page,
                            attempt - 1,
                            "concurrency limiter closed".to_string(),
                        );
                    }
                },
            };

            let outcome = self.fetch_once(page).await;

            match self.retry.slot_policy {
                BackoffSlotPolicy::Hold => held = Some(permit),
                BackoffSlotPolicy::Release => drop(permit),
            }

            match outcome {
                Ok(rows) => {
                    tracing::debug!(
                        "✅ Page {}: {} products (attempt {})",
                        page,
                        rows.len(),
                        attempt
                    );
                    return PageResult::fetched(page, rows, attempt);
                }
                Err(e) if attempt >= self.retry.max_attempts => {
                    tracing::warn!(
                        "❌ Page {} failed after {} attempts, dropping it: {}",
                        page,
                        attempt,
                        e
                    );
                    return PageResult::dropped(page, attempt, e.to_string());
                }
                Err(e) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        "🔁 Page {} attempt {}/{} failed: {}, retrying in {:?}",
                        page,
                        attempt,
                        self.retry.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
