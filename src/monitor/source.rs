//! Metric sources: one normalized percentage per tick.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::sync::Arc;

use crate::core::errors::{Result, XsmonError};
use crate::platform::pal::{CpuCounters, Platform};

/// Sampler feeding one sparkline.
///
/// `Ok(None)` means no sample this tick (rate sources need two observations).
/// Any `Err` is fatal to the process.
pub trait MetricSource {
    fn label(&self) -> &'static str;
    fn sample(&mut self) -> Result<Option<f64>>;
    /// Forget delta state; the next sample is suppressed again.
    fn reset(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuObservation {
    work: u64,
    total: u64,
}

impl From<CpuCounters> for CpuObservation {
    fn from(counters: CpuCounters) -> Self {
        Self {
            work: counters.work(),
            total: counters.total(),
        }
    }
}

/// Percentage of CPU time spent busy since the previous tick.
pub struct CpuLoadSource {
    platform: Arc<dyn Platform>,
    previous: Option<CpuObservation>,
}

impl CpuLoadSource {
    #[must_use]
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            previous: None,
        }
    }
}

impl MetricSource for CpuLoadSource {
    fn label(&self) -> &'static str {
        "CPU"
    }

    fn sample(&mut self) -> Result<Option<f64>> {
        let current = CpuObservation::from(self.platform.cpu_counters()?);
        let Some(previous) = self.previous.replace(current) else {
            return Ok(None);
        };

        // Counters are monotonic; going backwards means we misread them.
        for (counter, before, now) in [
            ("work", previous.work, current.work),
            ("total", previous.total, current.total),
        ] {
            if now < before {
                return Err(XsmonError::CounterRegression {
                    counter,
                    previous: before,
                    current: now,
                });
            }
        }

        let elapsed = current.total - previous.total;
        if elapsed == 0 {
            tracing::debug!("cpu counters did not advance, skipping sample");
            return Ok(None);
        }
        let busy = current.work - previous.work;
        Ok(Some(100.0 * busy as f64 / elapsed as f64))
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

/// Percentage of memory in use: `(total - available) / total`.
pub struct MemoryUsageSource {
    platform: Arc<dyn Platform>,
}

impl MemoryUsageSource {
    #[must_use]
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }
}

impl MetricSource for MemoryUsageSource {
    fn label(&self) -> &'static str {
        "Memory"
    }

    fn sample(&mut self) -> Result<Option<f64>> {
        let info = self.platform.memory_info()?;
        if info.total_bytes == 0 {
            return Err(XsmonError::MetricParse {
                source_name: "memory info",
                details: "total memory is zero".to_string(),
            });
        }
        let used = info.total_bytes.saturating_sub(info.available_bytes);
        Ok(Some(100.0 * used as f64 / info.total_bytes as f64))
    }
}
