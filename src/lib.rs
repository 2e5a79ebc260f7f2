//! Periodic CPU, resident memory and GPU usage sampling for the current
//! process, exported to foreign callers through `StartTracking` and
//! `StopTracking`.

pub mod config;
pub mod error;
pub mod exporter;
pub mod ffi;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod sampler;
pub mod scheduler;

pub use config::Config;
pub use error::{ConfigError, ProbeError, SamplerError};
pub use exporter::{ExportedBuffer, SnapshotExporter};
pub use model::{GpuState, UsageSnapshot, GPU_ABSENT, UNAVAILABLE};
pub use monitor::ProcessMonitor;
pub use sampler::{Sampler, NOT_STARTED_TEXT};
pub use scheduler::{IntervalTicker, ManualTicker, SamplingScheduler, SchedulerState, Ticker};
