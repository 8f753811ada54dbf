use crate::utils::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP 傳輸邊界：只關心狀態碼與回應內容
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// 重試等待期間是否保留並發名額
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffSlotPolicy {
    /// 每次嘗試結束即釋放名額，下一次嘗試前重新取得
    #[default]
    Release,
    /// 同一頁的所有嘗試與等待都佔用同一個名額
    Hold,
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn headers(&self) -> Vec<(String, String)>;
    fn concurrency(&self) -> usize;
    fn retry_limit(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn backoff_slot_policy(&self) -> BackoffSlotPolicy;
    fn accept_invalid_certs(&self) -> bool;
    fn monitoring_enabled(&self) -> bool;
}
