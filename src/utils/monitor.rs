#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::Instant;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 某一時間點的行程資源用量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub share_of_host: f32,
}

impl ResourceSample {
    #[cfg_attr(not(feature = "cli"), allow(dead_code))]
    fn from_bytes(cpu_percent: f32, rss_bytes: u64, host_total_bytes: u64) -> Self {
        let share_of_host = if host_total_bytes == 0 {
            0.0
        } else {
            rss_bytes as f32 / host_total_bytes as f32 * 100.0
        };
        Self {
            cpu_percent,
            rss_mb: rss_bytes / BYTES_PER_MB,
            share_of_host,
        }
    }
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_rss_mb: u64,
}

/// 只觀察本行程，在探索完成與整體結束時各記錄一次
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    sampler: Option<Mutex<Sampler>>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(Mutex::new(Sampler {
                    system: System::new(),
                    pid,
                    peak_rss_mb: 0,
                })),
                Err(e) => {
                    tracing::warn!("⚠️ Cannot identify own process, monitoring off: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            sampler,
            started: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    /// 取樣一次並更新記憶體高峰；停用或行程不可見時回傳 None
    pub fn sample(&self) -> Option<(ResourceSample, u64)> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let pid = sampler.pid;

        sampler.system.refresh_memory();
        sampler.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let host_total = sampler.system.total_memory();
        let sample = {
            let process = sampler.system.process(pid)?;
            ResourceSample::from_bytes(process.cpu_usage(), process.memory(), host_total)
        };
        sampler.peak_rss_mb = sampler.peak_rss_mb.max(sample.rss_mb);
        Some((sample, sampler.peak_rss_mb))
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some((sample, peak_mb)) = self.sample() {
            tracing::info!(
                "📊 [{}] cpu {:.1}% | rss {}MB ({:.1}% of host) | peak {}MB | {:.1}s in",
                phase,
                sample.cpu_percent,
                sample.rss_mb,
                sample.share_of_host,
                peak_mb,
                self.started.elapsed().as_secs_f64()
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some((_, peak_mb)) = self.sample() {
            tracing::info!(
                "📊 Run finished in {:.1}s, peak rss {}MB",
                self.started.elapsed().as_secs_f64(),
                peak_mb
            );
        }
    }
}

// 未啟用 cli feature 時不取樣
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}
}
