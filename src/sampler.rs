use crate::config::Config;
use crate::error::SamplerError;
use crate::exporter::SnapshotExporter;
use crate::model::UsageSnapshot;
use crate::monitor::ProcessMonitor;
use crate::scheduler::{IntervalTicker, SamplingScheduler, SchedulerState, Ticker};
use parking_lot::Mutex;
use std::ffi::c_char;
use std::sync::Arc;

pub const NOT_STARTED_TEXT: &str = "Tracking has not been started";

/// State touched by the tick thread.
struct Shared {
    monitor: Mutex<ProcessMonitor>,
    snapshot: Mutex<UsageSnapshot>,
}

impl Shared {
    fn tick(&self) {
        let snapshot = self.monitor.lock().poll();
        *self.snapshot.lock() = snapshot;
    }
}

/// Owns the readers, the latest snapshot, the timer and the export slot.
pub struct Sampler<T: Ticker = IntervalTicker> {
    shared: Arc<Shared>,
    scheduler: SamplingScheduler<T>,
    exporter: SnapshotExporter,
}

impl Sampler<IntervalTicker> {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(ProcessMonitor::system(), IntervalTicker, config)
    }
}

impl<T: Ticker> Sampler<T> {
    pub fn with_parts(monitor: ProcessMonitor, ticker: T, config: &Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                monitor: Mutex::new(monitor),
                snapshot: Mutex::new(UsageSnapshot::default()),
            }),
            scheduler: SamplingScheduler::new(ticker, config.poll_interval()),
            exporter: SnapshotExporter::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_tracking(&self) -> bool {
        self.state() == SchedulerState::Armed
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        *self.shared.snapshot.lock()
    }

    /// Samples once on the calling thread, outside the timer.
    pub fn tick(&self) {
        self.shared.tick();
    }

    pub fn start(&mut self) -> Result<(), SamplerError> {
        let shared = Arc::clone(&self.shared);
        self.scheduler.start(move || shared.tick())
    }

    /// Disarms the timer without taking a final sample; the last tick's
    /// values are returned.
    pub fn stop(&mut self) -> Result<UsageSnapshot, SamplerError> {
        if !self.scheduler.stop() {
            return Err(SamplerError::NotStarted);
        }
        Ok(self.snapshot())
    }

    pub fn export(&mut self) -> *const c_char {
        let snapshot = self.snapshot();
        self.exporter.export(&snapshot)
    }

    /// Stops and exports the report. Stopping while idle exports
    /// [`NOT_STARTED_TEXT`] instead and leaves the snapshot untouched.
    pub fn stop_and_export(&mut self) -> *const c_char {
        match self.stop() {
            Ok(_) => self.export(),
            Err(err) => {
                log::warn!("StopTracking: {err}");
                self.exporter.publish(NOT_STARTED_TEXT)
            }
        }
    }

    pub fn exporter(&self) -> &SnapshotExporter {
        &self.exporter
    }
}
