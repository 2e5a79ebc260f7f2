use serde::Serialize;
use std::fmt;

/// A reader's OS call failed on the tick that produced this value.
pub const UNAVAILABLE: f64 = -1.0;
/// The machine exposes no GPU accelerator statistics at all.
pub const GPU_ABSENT: f64 = -2.0;

pub const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Latest (CPU%, memory MB, GPU%) triple. Negative values are sentinels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub cpu_percent: f64,
    pub memory_megabytes: f64,
    pub gpu_percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GpuState {
    Sampled(f64),
    Unavailable,
    Absent,
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self {
            cpu_percent: UNAVAILABLE,
            memory_megabytes: UNAVAILABLE,
            gpu_percent: UNAVAILABLE,
        }
    }
}

impl UsageSnapshot {
    pub fn cpu(&self) -> Option<f64> {
        available(self.cpu_percent)
    }

    pub fn memory(&self) -> Option<f64> {
        available(self.memory_megabytes)
    }

    pub fn gpu_state(&self) -> GpuState {
        if self.gpu_percent == GPU_ABSENT {
            GpuState::Absent
        } else if self.gpu_percent < 0.0 {
            GpuState::Unavailable
        } else {
            GpuState::Sampled(self.gpu_percent)
        }
    }

    /// True until the first tick has written anything.
    pub fn is_unsampled(&self) -> bool {
        *self == Self::default()
    }
}

fn available(value: f64) -> Option<f64> {
    (value >= 0.0).then_some(value)
}

/// The three-line layout the host UI splits on newlines and spaces.
impl fmt::Display for UsageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU: {}%\nMemory: {} MB\nGPU: {}%",
            self.cpu_percent, self.memory_megabytes, self.gpu_percent
        )
    }
}
