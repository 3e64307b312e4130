use chrono::Utc;
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::PerformanceSample;

/// Reads resource usage of the current process through `sysinfo`.
pub struct ProcessProbe {
    system: System,
    pid: Option<Pid>,
}

impl ProcessProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// Refresh and read the process, or `None` when the platform cannot
    /// report on it.
    pub fn sample(&mut self) -> Option<PerformanceSample> {
        let pid = self.pid?;
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = self.system.process(pid)?;

        Some(PerformanceSample {
            cpu_time_used_ms: process.accumulated_cpu_time(),
            resident_memory_bytes: process.memory(),
            virtual_memory_bytes: process.virtual_memory(),
            timestamp: Utc::now(),
        })
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}
