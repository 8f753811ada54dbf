use crate::config::RunSettings;
use crate::domain::ports::{Transport, TransportResponse};
use crate::utils::error::{Result, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// 以 reqwest 實作的傳輸層；連線池大小與並發上限一致
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(pool_size: usize, accept_invalid_certs: bool) -> Result<Self> {
        if accept_invalid_certs {
            tracing::warn!("⚠️ TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .pool_max_idle_per_host(pool_size)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_settings(settings: &RunSettings) -> Result<Self> {
        Self::new(settings.concurrency, settings.accept_invalid_certs)
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout { after: timeout }
    } else {
        TransportError::Network(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url).timeout(timeout);
        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|e| classify(e, timeout))?;
        let status = response.status().as_u16();
        // 逾時涵蓋讀取 body 的時間
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(e, timeout))?
            .to_vec();

        tracing::trace!("HTTP {} from {} ({} bytes)", status, url, body.len());
        Ok(TransportResponse { status, body })
    }
}
