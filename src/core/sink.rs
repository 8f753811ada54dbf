use crate::domain::model::{PageResult, RunProgress, COLUMNS};
use crate::utils::error::{Result, ScrapeError};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// 輸出檔唯一的寫入者：標頭只寫一次，每頁結果到達即附加並 flush
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    progress: RunProgress,
}

impl CsvSink<File> {
    /// 建立輸出檔 (必要時建立上層目錄) 並寫入標頭
    pub fn create(path: &Path, total_pages: u32) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        tracing::debug!("📝 Created output file {}", path.display());
        Self::new(file, total_pages)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, total_pages: u32) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(COLUMNS)?;
        writer.flush()?;

        Ok(Self {
            writer,
            progress: RunProgress::new(total_pages),
        })
    }

    /// 寫入一頁的所有列並更新進度，回傳寫入列數
    pub fn consume(&mut self, result: PageResult) -> Result<usize> {
        for row in &result.rows {
            self.writer.write_record(row.to_record())?;
        }
        self.writer.flush()?;

        let written = result.rows.len();
        self.progress
            .record_page(result.page, written, result.is_dropped());
        Ok(written)
    }

    /// 記錄一個沒有產生結果的頁 (任務異常終止)
    pub fn record_missing(&mut self, page: u32) {
        self.progress.record_page(page, 0, true);
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    pub fn finish(mut self) -> Result<(W, RunProgress)> {
        self.writer.flush()?;
        let inner = self
            .writer
            .into_inner()
            .map_err(|e| ScrapeError::IoError(e.into_error()))?;
        Ok((inner, self.progress))
    }
}

/// 每完成一頁輸出一行進度到診斷串流
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressReporter;

impl ProgressReporter {
    pub fn report(&self, progress: &RunProgress) {
        tracing::info!("{}", format_progress(progress));
    }
}

pub fn format_progress(progress: &RunProgress) -> String {
    format!(
        "{:>6} products saved  |  {:.0} products/s  |  {:.1}s elapsed  |  page {}/{}",
        progress.rows_written(),
        progress.throughput(),
        progress.elapsed().as_secs_f64(),
        progress.pages_completed(),
        progress.total_pages()
    )
}
