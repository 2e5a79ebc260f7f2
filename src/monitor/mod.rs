pub mod cpu;
pub mod gpu;
#[cfg(target_vendor = "apple")]
mod mach;
pub mod memory;

use crate::model::UsageSnapshot;
use cpu::{SystemThreadProbe, ThreadCpuAccumulator, ThreadProbe};
use gpu::{GpuSource, GpuUtilizationOracle, SystemGpuSource};
use memory::{MemoryProbe, ResidentMemoryReader, SystemMemoryProbe};

/// The three readers a tick fans out to.
pub struct ProcessMonitor {
    cpu: ThreadCpuAccumulator,
    memory: ResidentMemoryReader,
    gpu: GpuUtilizationOracle,
}

impl ProcessMonitor {
    pub fn new(
        threads: Box<dyn ThreadProbe>,
        memory: Box<dyn MemoryProbe>,
        gpu: Box<dyn GpuSource>,
    ) -> Self {
        Self {
            cpu: ThreadCpuAccumulator::new(threads),
            memory: ResidentMemoryReader::new(memory),
            gpu: GpuUtilizationOracle::new(gpu),
        }
    }

    /// Probes for the platform this crate was built for.
    pub fn system() -> Self {
        Self::new(
            Box::new(SystemThreadProbe),
            Box::new(SystemMemoryProbe::new()),
            Box::new(SystemGpuSource),
        )
    }

    /// Each reader fails independently; a failure only affects its own field.
    pub fn poll(&mut self) -> UsageSnapshot {
        UsageSnapshot {
            cpu_percent: self.cpu.sample(),
            memory_megabytes: self.memory.sample(),
            gpu_percent: self.gpu.sample(),
        }
    }
}
