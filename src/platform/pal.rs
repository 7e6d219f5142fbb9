//! PAL trait and platform implementations (Linux `/proc`, scripted mock).

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::errors::{Result, XsmonError};

/// Cumulative CPU time counters (clock ticks since boot, all CPUs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuCounters {
    /// Busy time: user + nice + system.
    #[must_use]
    pub const fn work(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
    }

    /// Busy plus idle time.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.work().saturating_add(self.idle)
    }
}

/// Current system memory info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// OS abstraction used by the metric sources.
pub trait Platform: Send + Sync {
    fn cpu_counters(&self) -> Result<CpuCounters>;
    fn memory_info(&self) -> Result<MemoryInfo>;
}

/// Linux platform implementation reading `/proc`.
#[derive(Debug, Clone)]
pub struct LinuxPlatform {
    proc_root: PathBuf,
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    /// Read counters from an alternate procfs mount (used by tests).
    #[must_use]
    pub fn with_proc_root(root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: root.into(),
        }
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.proc_root.join(name);
        fs::read_to_string(&path).map_err(|source| XsmonError::MetricRead { path, source })
    }
}

impl Platform for LinuxPlatform {
    fn cpu_counters(&self) -> Result<CpuCounters> {
        parse_proc_stat(&self.read("stat")?)
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        parse_meminfo(&self.read("meminfo")?)
    }
}

/// Scripted implementation for deterministic tests.
///
/// Each call pops the next queued reading; once a queue is down to its last
/// entry that entry repeats. An empty queue reports a read failure.
#[derive(Debug, Default)]
pub struct MockPlatform {
    cpu: Mutex<VecDeque<CpuCounters>>,
    memory: Mutex<VecDeque<MemoryInfo>>,
}

impl MockPlatform {
    #[must_use]
    pub fn new(cpu: Vec<CpuCounters>, memory: Vec<MemoryInfo>) -> Self {
        Self {
            cpu: Mutex::new(cpu.into()),
            memory: Mutex::new(memory.into()),
        }
    }
}

fn next_scripted<T: Copy>(queue: &Mutex<VecDeque<T>>, name: &str) -> Result<T> {
    let mut queue = queue.lock();
    let value = if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().copied()
    };
    value.ok_or_else(|| XsmonError::MetricRead {
        path: PathBuf::from(name),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no scripted reading"),
    })
}

impl Platform for MockPlatform {
    fn cpu_counters(&self) -> Result<CpuCounters> {
        next_scripted(&self.cpu, "mock/stat")
    }

    fn memory_info(&self) -> Result<MemoryInfo> {
        next_scripted(&self.memory, "mock/meminfo")
    }
}

/// Detect active platform implementation.
pub fn detect_platform() -> Result<Arc<dyn Platform>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Arc::new(LinuxPlatform::new()))
    }
    #[cfg(not(target_os = "linux"))]
    {
        Err(XsmonError::UnsupportedPlatform {
            details: "only Linux is currently implemented".to_string(),
        })
    }
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
fn parse_proc_stat(raw: &str) -> Result<CpuCounters> {
    let malformed = |details: String| XsmonError::MetricParse {
        source_name: "/proc/stat",
        details,
    };
    let line = raw
        .lines()
        .next()
        .ok_or_else(|| malformed("empty file".to_string()))?;
    let mut fields = line.split_whitespace();
    match fields.next() {
        Some("cpu") => {}
        other => {
            return Err(malformed(format!(
                "expected aggregate 'cpu' line first, got {other:?}"
            )));
        }
    }

    let mut next = |name: &str| -> Result<u64> {
        let raw = fields
            .next()
            .ok_or_else(|| malformed(format!("missing {name} counter")))?;
        raw.parse::<u64>()
            .map_err(|err| malformed(format!("invalid {name} counter {raw:?}: {err}")))
    };

    Ok(CpuCounters {
        user: next("user")?,
        nice: next("nice")?,
        system: next("system")?,
        idle: next("idle")?,
    })
}

/// Scan `/proc/meminfo` until both `MemTotal` and `MemAvailable` are seen.
///
/// Other lines are skipped unparsed.
fn parse_meminfo(raw: &str) -> Result<MemoryInfo> {
    let mut total = None;
    let mut available = None;

    for line in raw.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match key.trim() {
            "MemTotal" => &mut total,
            "MemAvailable" => &mut available,
            _ => continue,
        };
        *slot = Some(parse_meminfo_value(line, rest)?);
        if total.is_some() && available.is_some() {
            break;
        }
    }

    let missing = |key: &str| XsmonError::MetricParse {
        source_name: "/proc/meminfo",
        details: format!("missing required field: {key}"),
    };
    let total_bytes = total.ok_or_else(|| missing("MemTotal"))?;
    let available_bytes = available.ok_or_else(|| missing("MemAvailable"))?;
    if total_bytes == 0 {
        return Err(XsmonError::MetricParse {
            source_name: "/proc/meminfo",
            details: "MemTotal is zero".to_string(),
        });
    }

    Ok(MemoryInfo {
        total_bytes,
        available_bytes,
    })
}

fn parse_meminfo_value(line: &str, rest: &str) -> Result<u64> {
    let malformed = |details: String| XsmonError::MetricParse {
        source_name: "/proc/meminfo",
        details,
    };
    let mut parts = rest.split_whitespace();
    let value_raw = parts
        .next()
        .ok_or_else(|| malformed(format!("missing value in line: {line}")))?;
    let value = value_raw
        .parse::<u64>()
        .map_err(|err| malformed(format!("invalid numeric value in line {line:?}: {err}")))?;

    match parts.next() {
        None => Ok(value),
        Some("kB") => Ok(value.saturating_mul(1024)),
        Some(unit) => Err(malformed(format!(
            "unsupported unit in line {line:?}: {unit}"
        ))),
    }
}
