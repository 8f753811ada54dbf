use crate::core::fetcher::CatalogClient;
use crate::domain::model::{DiscoveryEnvelope, Pagination};
use crate::utils::error::{Result, ScrapeError};

fn discovery_error(message: impl Into<String>) -> ScrapeError {
    ScrapeError::Discovery {
        message: message.into(),
    }
}

/// 抓取第 1 頁取得總頁數；失敗即終止整個執行，不重試
pub async fn discover_last_page(client: &CatalogClient) -> Result<Pagination> {
    tracing::info!("🔍 Fetching page 1 to discover total pages");

    let body = client
        .get_page(1)
        .await
        .map_err(|e| discovery_error(format!("request for page 1 failed: {}", e)))?;

    let envelope: DiscoveryEnvelope = serde_json::from_slice(&body)
        .map_err(|e| discovery_error(format!("could not parse page 1 payload: {}", e)))?;

    let raw = envelope
        .pagination
        .and_then(|pagination| pagination.last_page)
        .ok_or_else(|| discovery_error("response has no pagination.last_page field"))?;

    let last_page = raw
        .as_u64()
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value >= 1)
        .ok_or_else(|| {
            discovery_error(format!(
                "pagination.last_page must be a positive integer, got {}",
                raw
            ))
        })?;

    tracing::info!("📚 Total pages: {}", last_page);
    Ok(Pagination { last_page })
}
