use crate::error::ProbeError;
use crate::model::{BYTES_PER_MEGABYTE, UNAVAILABLE};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

pub trait MemoryProbe: Send {
    fn resident_bytes(&mut self) -> Result<u64, ProbeError>;
}

pub struct ResidentMemoryReader {
    probe: Box<dyn MemoryProbe>,
}

impl ResidentMemoryReader {
    pub fn new(probe: Box<dyn MemoryProbe>) -> Self {
        Self { probe }
    }

    pub fn sample(&mut self) -> f64 {
        match self.probe.resident_bytes() {
            Ok(bytes) => bytes as f64 / BYTES_PER_MEGABYTE,
            Err(err) => {
                log::debug!("memory sample failed: {err}");
                UNAVAILABLE
            }
        }
    }
}

/// Resident set size of the current process from the sysinfo process table.
pub struct SystemMemoryProbe {
    sys: System,
    pid: Option<Pid>,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(err) => {
                log::warn!("cannot resolve current pid: {err}");
                None
            }
        };
        Self {
            sys: System::new(),
            pid,
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn resident_bytes(&mut self) -> Result<u64, ProbeError> {
        let pid = self.pid.ok_or(ProbeError::Pid("pid lookup failed at startup"))?;
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        self.sys
            .process(pid)
            .map(|process| process.memory())
            .ok_or(ProbeError::ProcessMissing(pid.as_u32()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<u64, ()>);

    impl MemoryProbe for Fixed {
        fn resident_bytes(&mut self) -> Result<u64, ProbeError> {
            self.0.map_err(|_| ProbeError::Kernel {
                call: "task_info",
                code: 4,
            })
        }
    }

    #[test]
    fn converts_bytes_to_megabytes() {
        let mut reader = ResidentMemoryReader::new(Box::new(Fixed(Ok(3 * 1_048_576 + 524_288))));
        assert_eq!(reader.sample(), 3.5);
    }

    #[test]
    fn failure_yields_sentinel() {
        let mut reader = ResidentMemoryReader::new(Box::new(Fixed(Err(()))));
        assert_eq!(reader.sample(), UNAVAILABLE);
    }

    #[test]
    fn reads_own_resident_set() {
        let mut probe = SystemMemoryProbe::new();
        let bytes = probe.resident_bytes().expect("own process is visible");
        assert!(bytes > 0);
    }
}
