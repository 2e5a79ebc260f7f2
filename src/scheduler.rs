//! Cancellable periodic task driving the sampling ticks.
//!
//! At most one worker thread exists per [`SamplingScheduler`]. Arming while
//! already armed joins the old worker before the new one starts, and
//! disarming joins the worker, so once [`SamplingScheduler::stop`] returns no
//! tick is running.

use crate::error::SamplerError;
use crossbeam::channel::{self, select, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed,
}

/// Source of tick instants for an armed scheduler.
pub trait Ticker: Send {
    fn ticks(&self, interval: Duration) -> Receiver<Instant>;
}

/// Wall-clock ticks, one per interval.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntervalTicker;

impl Ticker for IntervalTicker {
    fn ticks(&self, interval: Duration) -> Receiver<Instant> {
        channel::tick(interval)
    }
}

/// Ticks fired explicitly with [`ManualTicker::fire`]; the interval is ignored.
/// Clones share the same channel.
#[derive(Clone, Debug)]
pub struct ManualTicker {
    tx: Sender<Instant>,
    rx: Receiver<Instant>,
}

impl ManualTicker {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    pub fn fire(&self) {
        let _ = self.tx.send(Instant::now());
    }
}

impl Default for ManualTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for ManualTicker {
    fn ticks(&self, _interval: Duration) -> Receiver<Instant> {
        self.rx.clone()
    }
}

struct PeriodicTask {
    cancel: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    fn spawn<F>(ticks: Receiver<Instant>, mut on_tick: F) -> Result<Self, SamplerError>
    where
        F: FnMut() + Send + 'static,
    {
        let (cancel, cancelled) = channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("usage-sampler".into())
            .spawn(move || loop {
                select! {
                    recv(cancelled) -> _ => break,
                    recv(ticks) -> tick => match tick {
                        Ok(_) => on_tick(),
                        Err(_) => break,
                    },
                }
            })?;
        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    fn cancel(mut self) {
        let _ = self.cancel.send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("sampling thread panicked");
            }
        }
    }
}

pub struct SamplingScheduler<T: Ticker> {
    ticker: T,
    interval: Duration,
    task: Option<PeriodicTask>,
}

impl<T: Ticker> SamplingScheduler<T> {
    pub fn new(ticker: T, interval: Duration) -> Self {
        Self {
            ticker,
            interval,
            task: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.task.is_some() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arms the timer, replacing any timer that is already running.
    pub fn start<F>(&mut self, on_tick: F) -> Result<(), SamplerError>
    where
        F: FnMut() + Send + 'static,
    {
        if let Some(task) = self.task.take() {
            log::debug!("replacing active timer");
            task.cancel();
        }

        let ticks = self.ticker.ticks(self.interval);
        // Drop ticks that queued up while idle.
        for _ in ticks.try_iter() {}

        self.task = Some(PeriodicTask::spawn(ticks, on_tick)?);
        log::info!("Timer started");
        Ok(())
    }

    /// Returns false if the scheduler was already idle.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.cancel();
                log::info!("Timer stopped");
                true
            }
            None => false,
        }
    }
}

impl<T: Ticker> Drop for SamplingScheduler<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const WAIT: Duration = Duration::from_secs(2);
    const QUIET: Duration = Duration::from_millis(150);

    fn counting(ticked: Sender<()>, count: Arc<AtomicUsize>) -> impl FnMut() + Send + 'static {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            let _ = ticked.send(());
        }
    }

    #[test]
    fn idle_until_started() {
        let mut scheduler = SamplingScheduler::new(ManualTicker::new(), Duration::from_secs(1));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.stop());
    }

    #[test]
    fn restart_keeps_a_single_timer() {
        let ticker = ManualTicker::new();
        let mut scheduler = SamplingScheduler::new(ticker.clone(), Duration::from_secs(1));
        let (tx, rx) = channel::unbounded();
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.start(counting(tx.clone(), count.clone())).unwrap();
        scheduler.start(counting(tx, count.clone())).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Armed);

        ticker.fire();
        rx.recv_timeout(WAIT).expect("tick handled");
        assert!(rx.recv_timeout(QUIET).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn ticks_while_idle_are_discarded() {
        let ticker = ManualTicker::new();
        let mut scheduler = SamplingScheduler::new(ticker.clone(), Duration::from_secs(1));
        let (tx, rx) = channel::unbounded();
        let count = Arc::new(AtomicUsize::new(0));

        ticker.fire();
        ticker.fire();
        scheduler.start(counting(tx, count.clone())).unwrap();
        assert!(rx.recv_timeout(QUIET).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        scheduler.stop();
    }

    #[test]
    fn no_ticks_after_stop() {
        let ticker = ManualTicker::new();
        let mut scheduler = SamplingScheduler::new(ticker.clone(), Duration::from_secs(1));
        let (tx, rx) = channel::unbounded();
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.start(counting(tx, count.clone())).unwrap();
        scheduler.stop();
        ticker.fire();
        assert!(rx.recv_timeout(QUIET).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn interval_ticker_fires_periodically() {
        let mut scheduler = SamplingScheduler::new(IntervalTicker, Duration::from_millis(20));
        let (tx, rx) = channel::unbounded();
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.start(counting(tx, count.clone())).unwrap();
        rx.recv_timeout(WAIT).expect("first tick");
        rx.recv_timeout(WAIT).expect("second tick");
        scheduler.stop();
        assert!(count.load(Ordering::SeqCst) >= 2);
    }
}
