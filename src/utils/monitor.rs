#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub memory_usage_percent: f32,
    pub peak_memory_mb: u64,
    pub available_processors: usize,
    pub run_time_seconds: u64,
}

#[cfg(feature = "cli")]
pub struct ProcessMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    peak_memory: Mutex<u64>,
}

#[cfg(feature = "cli")]
impl ProcessMonitor {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());

        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Process statistics unavailable: {}", e);
                None
            }
        };

        // 初始刷新
        system.refresh_all();

        Self {
            system: Mutex::new(system),
            pid,
            peak_memory: Mutex::new(0),
        }
    }

    pub fn stats(&self) -> Option<ProcessStats> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_all();

        let process = system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_memory = system.total_memory() / 1024 / 1024;
        let memory_percent = if total_memory > 0 {
            (memory_mb as f32 / total_memory as f32) * 100.0
        } else {
            0.0
        };

        // 更新峰值記憶體
        let mut peak = self.peak_memory.lock().ok()?;
        if memory_mb > *peak {
            *peak = memory_mb;
        }

        Some(ProcessStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            memory_usage_percent: memory_percent,
            peak_memory_mb: *peak,
            available_processors: system.cpus().len(),
            run_time_seconds: process.run_time(),
        })
    }
}

#[cfg(feature = "cli")]
impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// 非 CLI 環境提供空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct ProcessMonitor;

#[cfg(not(feature = "cli"))]
impl ProcessMonitor {
    pub fn new() -> Self {
        Self
    }

    pub fn stats(&self) -> Option<ProcessStats> {
        None
    }
}
