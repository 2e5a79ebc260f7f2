use std::io;

use thiserror::Error;

/// Failure of a single OS introspection call made by one of the readers.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{call} failed with kern_return_t {code}")]
    Kernel { call: &'static str, code: i32 },
    #[error("unable to resolve current pid: {0}")]
    Pid(&'static str),
    #[error("process {0} is missing from the process table")]
    ProcessMissing(u32),
    #[error("failed to run {command}")]
    Spawn {
        command: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with status {status:?}")]
    CommandFailed {
        command: &'static str,
        status: Option<i32>,
    },
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("tracking has not been started")]
    NotStarted,
    #[error("failed to spawn sampling thread")]
    Spawn(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
