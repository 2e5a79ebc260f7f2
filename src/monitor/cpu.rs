use crate::error::ProbeError;
use crate::model::UNAVAILABLE;

/// Kernel fixed-point scale for a thread's `cpu_usage` field.
pub const TH_USAGE_SCALE: f64 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreadUsage {
    pub usage: i32,
    pub idle: bool,
}

/// Lists the schedulable units of the current process.
pub trait ThreadProbe: Send {
    fn sample_threads(&mut self) -> Result<Vec<ThreadUsage>, ProbeError>;
}

pub struct ThreadCpuAccumulator {
    probe: Box<dyn ThreadProbe>,
}

impl ThreadCpuAccumulator {
    pub fn new(probe: Box<dyn ThreadProbe>) -> Self {
        Self { probe }
    }

    /// Sum of per-thread CPU percentages, or `UNAVAILABLE` if any thread
    /// could not be queried.
    pub fn sample(&mut self) -> f64 {
        match self.probe.sample_threads() {
            Ok(threads) => accumulate(&threads),
            Err(err) => {
                log::debug!("cpu sample failed: {err}");
                UNAVAILABLE
            }
        }
    }
}

pub fn accumulate(threads: &[ThreadUsage]) -> f64 {
    threads
        .iter()
        .filter(|t| !t.idle)
        .map(|t| f64::from(t.usage) / TH_USAGE_SCALE * 100.0)
        .sum()
}

/// Enumerates threads through `task_threads` / `thread_info`.
pub struct SystemThreadProbe;

impl ThreadProbe for SystemThreadProbe {
    #[cfg(target_vendor = "apple")]
    fn sample_threads(&mut self) -> Result<Vec<ThreadUsage>, ProbeError> {
        super::mach::task_thread_usage()
    }

    #[cfg(not(target_vendor = "apple"))]
    fn sample_threads(&mut self) -> Result<Vec<ThreadUsage>, ProbeError> {
        Err(ProbeError::Unsupported("per-thread cpu usage"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<Vec<ThreadUsage>>);

    impl ThreadProbe for Fixed {
        fn sample_threads(&mut self) -> Result<Vec<ThreadUsage>, ProbeError> {
            self.0.clone().ok_or(ProbeError::Kernel {
                call: "thread_info",
                code: 5,
            })
        }
    }

    #[test]
    fn idle_threads_are_skipped() {
        let threads = [
            ThreadUsage { usage: 250, idle: false },
            ThreadUsage { usage: 900, idle: true },
            ThreadUsage { usage: 125, idle: false },
        ];
        assert_eq!(accumulate(&threads), 37.5);
    }

    #[test]
    fn busy_threads_can_exceed_one_core() {
        let threads = [ThreadUsage { usage: 1000, idle: false }; 3];
        assert_eq!(accumulate(&threads), 300.0);
    }

    #[test]
    fn failure_yields_sentinel_not_partial_sum() {
        let mut acc = ThreadCpuAccumulator::new(Box::new(Fixed(None)));
        assert_eq!(acc.sample(), UNAVAILABLE);

        let mut acc = ThreadCpuAccumulator::new(Box::new(Fixed(Some(vec![]))));
        assert_eq!(acc.sample(), 0.0);
    }
}
