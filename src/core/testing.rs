//! 測試用的可編排傳輸層，記錄每頁呼叫次數與同時進行中的請求數

use crate::domain::ports::{Transport, TransportResponse};
use crate::utils::error::TransportError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum PageScript {
    Products(Vec<Value>),
    /// 前 n 次失敗，之後回傳商品
    FailThen(u32, Vec<Value>),
    AlwaysFail,
    Raw(u16, Vec<u8>),
}

pub(crate) struct ScriptedTransport {
    scripts: HashMap<u32, PageScript>,
    last_page: Option<u32>,
    latency: Duration,
    calls: Mutex<HashMap<u32, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(last_page: Option<u32>) -> Self {
        Self {
            scripts: HashMap::new(),
            last_page,
            latency: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn page(mut self, page: u32, script: PageScript) -> Self {
        self.scripts.insert(page, script);
        self
    }

    pub(crate) fn calls(&self, page: u32) -> u32 {
        self.calls.lock().unwrap().get(&page).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn success(&self, products: &[Value]) -> TransportResponse {
        let mut body = json!({ "products": products });
        if let Some(last_page) = self.last_page {
            body["pagination"] = json!({ "last_page": last_page });
        }
        TransportResponse {
            status: 200,
            body: serde_json::to_vec(&body).unwrap(),
        }
    }
}

pub(crate) fn page_number(url: &str) -> u32 {
    let parsed = url::Url::parse(url).unwrap();
    parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.parse().unwrap())
        .unwrap()
}

pub(crate) fn product(id: u64) -> Value {
    json!({ "id": id, "name": format!("Product {}", id), "images": ["a.jpg", "b.jpg"] })
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(
        &self,
        url: &str,
        _headers: &[(String, String)],
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let page = page_number(url);
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(page).or_insert(0);
            *count += 1;
            *count
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(&page) {
            None => Ok(self.success(&[])),
            Some(PageScript::Products(products)) => Ok(self.success(products)),
            Some(PageScript::FailThen(failures, _)) if call <= *failures => {
                Err(TransportError::Network(format!("scripted failure {}", call)))
            }
            Some(PageScript::FailThen(_, products)) => Ok(self.success(products)),
            Some(PageScript::AlwaysFail) => Ok(TransportResponse {
                status: 503,
                body: b"unavailable".to_vec(),
            }),
            Some(PageScript::Raw(status, body)) => Ok(TransportResponse {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// 將目前執行緒上的 tracing 輸出收進記憶體，供測試檢查日誌內容
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || capture.clone())
            .with_ansi(false)
            .with_target(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(String::from)
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
