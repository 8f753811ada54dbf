use serde::Deserialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// 遠端 API 回傳的單筆商品，結構完全由遠端決定
pub type RawRecord = serde_json::Value;

/// 輸出欄位，順序即 CSV 標頭順序
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "id",
    "name",
    "slug",
    "status",
    "price",
    "old_price",
    "views",
    "rating",
    "favorites_count",
    "contact_count",
    "is_new",
    "has_delivery",
    "is_premium",
    "is_shop",
    "warranty",
    "whatsapp_enabled",
    "category_id",
    "category_name",
    "category_slug",
    "city_id",
    "city_name",
    "customer_id",
    "customer_name",
    "customer_phone",
    "customer_is_shop",
    "customer_ads_count",
    "images",
    "created_at",
    "updated_at",
    "last_auto_refresh",
    "description",
    "meta_title",
    "meta_description",
    "meta_keywords",
];

pub const COLUMN_COUNT: usize = 34;

/// 固定欄位的一列資料；缺少的來源欄位以 `None` 表示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    cells: [Option<String>; COLUMN_COUNT],
}

impl FlatRow {
    pub(crate) fn from_cells(cells: [Option<String>; COLUMN_COUNT]) -> Self {
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        let index = COLUMNS.iter().position(|name| *name == column)?;
        self.cells[index].as_deref()
    }

    pub fn cells(&self) -> &[Option<String>; COLUMN_COUNT] {
        &self.cells
    }

    /// CSV 輸出用，缺值寫成空字串
    pub fn to_record(&self) -> Vec<&str> {
        self.cells
            .iter()
            .map(|cell| cell.as_deref().unwrap_or(""))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Fetched { attempts: u32 },
    Dropped { attempts: u32, error: String },
}

#[derive(Debug, Clone)]
pub struct PageResult {
    pub page: u32,
    pub rows: Vec<FlatRow>,
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn fetched(page: u32, rows: Vec<FlatRow>, attempts: u32) -> Self {
        Self {
            page,
            rows,
            outcome: PageOutcome::Fetched { attempts },
        }
    }

    pub fn dropped(page: u32, attempts: u32, error: String) -> Self {
        Self {
            page,
            rows: Vec::new(),
            outcome: PageOutcome::Dropped { attempts, error },
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self.outcome, PageOutcome::Dropped { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self.outcome {
            PageOutcome::Fetched { attempts } | PageOutcome::Dropped { attempts, .. } => attempts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub last_page: u32,
}

/// 第一頁回應中與分頁相關的部分
#[derive(Debug, Deserialize)]
pub(crate) struct DiscoveryEnvelope {
    pub pagination: Option<PaginationMeta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaginationMeta {
    pub last_page: Option<serde_json::Value>,
}

/// 任一頁回應中與商品相關的部分；其餘欄位忽略
#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    #[serde(default)]
    pub products: Option<Vec<RawRecord>>,
}

/// 整個執行期間的累計進度，只由 Sink 修改
#[derive(Debug, Clone)]
pub struct RunProgress {
    started: Instant,
    total_pages: u32,
    rows_written: u64,
    pages_completed: u32,
    dropped_pages: Vec<u32>,
}

impl RunProgress {
    pub fn new(total_pages: u32) -> Self {
        Self {
            started: Instant::now(),
            total_pages,
            rows_written: 0,
            pages_completed: 0,
            dropped_pages: Vec::new(),
        }
    }

    pub(crate) fn record_page(&mut self, page: u32, rows: usize, dropped: bool) {
        self.rows_written += rows as u64;
        self.pages_completed += 1;
        if dropped {
            self.dropped_pages.push(page);
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn pages_completed(&self) -> u32 {
        self.pages_completed
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn dropped_pages(&self) -> &[u32] {
        &self.dropped_pages
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// 每秒寫入列數
    pub fn throughput(&self) -> f64 {
        rate(self.rows_written, self.elapsed())
    }
}

pub(crate) fn rate(rows: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        rows as f64 / secs
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_pages: u32,
    pub rows_written: u64,
    /// 由小到大排序
    pub dropped_pages: Vec<u32>,
    pub elapsed: Duration,
    pub output_path: PathBuf,
}

impl RunSummary {
    pub(crate) fn from_progress(progress: &RunProgress, output_path: PathBuf) -> Self {
        let mut dropped_pages = progress.dropped_pages.clone();
        dropped_pages.sort_unstable();
        Self {
            total_pages: progress.total_pages,
            rows_written: progress.rows_written,
            dropped_pages,
            elapsed: progress.elapsed(),
            output_path,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.dropped_pages.is_empty()
    }
}
