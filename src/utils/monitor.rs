//! Optional per-phase resource reporting for the `--monitor` flag.

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    /// Time since the previous checkpoint.
    pub phase_time: Duration,
    pub total_time: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_memory_mb: u64,
    last_checkpoint: Instant,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let start_time = Instant::now();
        if !enabled {
            return Self {
                state: None,
                pid: None,
                start_time,
            };
        }

        let pid = sysinfo::get_current_pid()
            .map_err(|e| tracing::warn!("Monitoring without process stats: {}", e))
            .ok();

        let mut system = System::new();
        system.refresh_memory();

        Self {
            state: Some(Mutex::new(MonitorState {
                system,
                peak_memory_mb: 0,
                last_checkpoint: start_time,
            })),
            pid,
            start_time,
        }
    }

    /// Records a checkpoint for `phase`. `None` when monitoring is off.
    pub fn checkpoint(&self, phase: &str) -> Option<PhaseStats> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        let now = Instant::now();
        let phase_time = now.duration_since(state.last_checkpoint);
        state.last_checkpoint = now;

        let (cpu_usage, memory_mb) = match self.pid {
            Some(pid) => {
                state
                    .system
                    .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                state
                    .system
                    .process(pid)
                    .map(|p| (p.cpu_usage(), p.memory() / 1024 / 1024))
                    .unwrap_or((0.0, 0))
            }
            None => (0.0, 0),
        };
        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);

        Some(PhaseStats {
            phase: phase.to_string(),
            cpu_usage,
            memory_mb,
            peak_memory_mb: state.peak_memory_mb,
            phase_time,
            total_time: now.duration_since(self.start_time),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.checkpoint(phase) {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Phase: {:?}, Total: {:?}",
                stats.phase,
                stats.cpu_usage,
                stats.memory_mb,
                stats.peak_memory_mb,
                stats.phase_time,
                stats.total_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.checkpoint("Final") {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.total_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
