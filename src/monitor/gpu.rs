use crate::error::ProbeError;
use crate::model::{GPU_ABSENT, UNAVAILABLE};

#[cfg(target_vendor = "apple")]
use std::process::Command;

const UTILIZATION_KEY: &str = "\"Device Utilization %\"=";

/// Reports GPU utilization in `[0, 100]`. `Ok(None)` means the machine has
/// no accelerator exposing statistics; `Err` means the query itself failed.
pub trait GpuSource: Send {
    fn utilization(&mut self) -> Result<Option<f64>, ProbeError>;
}

pub struct GpuUtilizationOracle {
    source: Box<dyn GpuSource>,
}

impl GpuUtilizationOracle {
    pub fn new(source: Box<dyn GpuSource>) -> Self {
        Self { source }
    }

    pub fn sample(&mut self) -> f64 {
        match self.source.utilization() {
            Ok(Some(value)) => value.clamp(0.0, 100.0),
            Ok(None) => GPU_ABSENT,
            Err(err) => {
                log::debug!("gpu sample failed: {err}");
                UNAVAILABLE
            }
        }
    }
}

/// Reads `PerformanceStatistics` of every IOAccelerator through `ioreg`.
pub struct SystemGpuSource;

impl GpuSource for SystemGpuSource {
    #[cfg(target_vendor = "apple")]
    fn utilization(&mut self) -> Result<Option<f64>, ProbeError> {
        let output = Command::new("ioreg")
            .args(["-r", "-d", "1", "-c", "IOAccelerator"])
            .output()
            .map_err(|err| ProbeError::Spawn {
                command: "ioreg",
                source: err,
            })?;
        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command: "ioreg",
                status: output.status.code(),
            });
        }
        Ok(parse_device_utilization(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    #[cfg(not(target_vendor = "apple"))]
    fn utilization(&mut self) -> Result<Option<f64>, ProbeError> {
        Ok(None)
    }
}

/// Averages every `"Device Utilization %"=N` entry in an `ioreg` dump.
pub fn parse_device_utilization(dump: &str) -> Option<f64> {
    let values: Vec<f64> = dump
        .match_indices(UTILIZATION_KEY)
        .filter_map(|(idx, _)| {
            let rest = &dump[idx + UTILIZATION_KEY.len()..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            rest[..end].parse::<f64>().ok()
        })
        .collect();

    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOREG_SAMPLE: &str = r#"+-o AGXAcceleratorG13X  <class AGXAcceleratorG13X, id 0x1000003ee>
    {
      "PerformanceStatistics" = {"In use system memory"=412254208,"Device Utilization %"=17,"Renderer Utilization %"=15,"Tiler Utilization %"=17}
    }
"#;

    struct Fixed(Option<f64>);

    impl GpuSource for Fixed {
        fn utilization(&mut self) -> Result<Option<f64>, ProbeError> {
            Ok(self.0)
        }
    }

    struct Failing;

    impl GpuSource for Failing {
        fn utilization(&mut self) -> Result<Option<f64>, ProbeError> {
            Err(ProbeError::CommandFailed {
                command: "ioreg",
                status: Some(1),
            })
        }
    }

    #[test]
    fn parses_device_utilization() {
        assert_eq!(parse_device_utilization(IOREG_SAMPLE), Some(17.0));
    }

    #[test]
    fn averages_multiple_accelerators() {
        let dump = format!("{IOREG_SAMPLE}{}", IOREG_SAMPLE.replace("=17,", "=41,"));
        assert_eq!(parse_device_utilization(&dump), Some(29.0));
    }

    #[test]
    fn no_accelerator_means_absent() {
        assert_eq!(parse_device_utilization(""), None);
        let mut oracle = GpuUtilizationOracle::new(Box::new(Fixed(None)));
        assert_eq!(oracle.sample(), GPU_ABSENT);
    }

    #[test]
    fn query_failure_is_unavailable_not_absent() {
        let mut oracle = GpuUtilizationOracle::new(Box::new(Failing));
        let snapshot = crate::model::UsageSnapshot {
            gpu_percent: oracle.sample(),
            ..Default::default()
        };
        assert_eq!(snapshot.gpu_percent, UNAVAILABLE);
        assert_eq!(snapshot.gpu_state(), crate::model::GpuState::Unavailable);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let mut oracle = GpuUtilizationOracle::new(Box::new(Fixed(Some(140.0))));
        assert_eq!(oracle.sample(), 100.0);
    }
}
