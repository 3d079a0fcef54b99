//! Exit state of a tool server process.

use std::io;
use std::process::ExitStatus;

/// Lifecycle state published by a process monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessExit {
    /// Process is still running
    Running,
    /// Process exited on its own (`code` is `None` when killed by a signal)
    Exited { code: Option<i32> },
    /// Process was stopped by the supervisor
    Killed { code: Option<i32> },
    /// The OS never created the process
    SpawnFailed { message: String },
    /// Waiting on the process failed
    Failed { message: String },
}

impl ProcessExit {
    pub(crate) fn from_wait(result: io::Result<ExitStatus>) -> Self {
        match result {
            Ok(status) => Self::Exited {
                code: status.code(),
            },
            Err(e) => Self::Failed {
                message: e.to_string(),
            },
        }
    }

    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether this state is a failure rather than a clean exit or stop.
    pub fn is_error(&self) -> bool {
        match self {
            Self::Running | Self::Killed { .. } => false,
            Self::Exited { code } => *code != Some(0),
            Self::SpawnFailed { .. } | Self::Failed { .. } => true,
        }
    }
}

impl std::fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Exited { code: Some(code) } => write!(f, "exited with code {code}"),
            Self::Exited { code: None } => write!(f, "terminated by signal"),
            Self::Killed { .. } => write!(f, "stopped by supervisor"),
            Self::SpawnFailed { message } => write!(f, "failed to start: {message}"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!ProcessExit::Running.is_error());
        assert!(!ProcessExit::Exited { code: Some(0) }.is_error());
        assert!(ProcessExit::Exited { code: Some(1) }.is_error());
        assert!(ProcessExit::Exited { code: None }.is_error());
        assert!(!ProcessExit::Killed { code: None }.is_error());
        assert!(
            ProcessExit::SpawnFailed {
                message: "nope".into()
            }
            .is_error()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ProcessExit::Exited { code: Some(127) }.to_string(),
            "exited with code 127"
        );
    }
}
