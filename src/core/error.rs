//! # Job Errors / 作业错误
//!
//! Error taxonomy shared by the host runner and every job type.
//!
//! 主机运行器和所有作业类型共享的错误分类。

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while checking, configuring or executing a job.
#[derive(Error, Debug)]
pub enum JobError {
    /// A module dependency is not known to the host.
    #[error("required module '{0}' is not available")]
    MissingModule(String),

    /// One or more env names are not recognized by the env registry.
    #[error("required environment variables are not declared: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    /// No job type is registered under the requested name.
    #[error("unknown job type '{0}'")]
    UnknownJobType(String),

    /// A setting has a value the job type cannot work with.
    #[error("invalid value '{value}' for {name}")]
    InvalidSetting { name: String, value: String },

    /// A lifecycle phase ran before the one it depends on.
    #[error("job phase '{phase}' called before '{requires}'")]
    PhaseOrder {
        phase: &'static str,
        requires: &'static str,
    },

    /// A command line for an external tool could not be assembled.
    #[error("cannot build command: {0}")]
    CommandConstruction(String),

    /// An external process could not be spawned at all.
    #[error("failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying result artifacts failed.
    #[error("failed to persist results: {0}")]
    Persist(#[from] fs_extra::error::Error),

    /// The run was interrupted by a shutdown signal.
    #[error("job cancelled")]
    Cancelled,
}

impl JobError {
    /// Wraps an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JobError::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for failures detected before any side effect took place.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            JobError::MissingModule(_) | JobError::MissingEnv(_) | JobError::UnknownJobType(_)
        )
    }
}

/// Convenience result type for job operations.
pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_lists_every_name() {
        let err = JobError::MissingEnv(vec!["UUID".into(), "WORKSPACE".into()]);
        assert_eq!(
            err.to_string(),
            "required environment variables are not declared: UUID, WORKSPACE"
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn command_construction_is_not_a_precondition() {
        let err = JobError::CommandConstruction("no test plan".into());
        assert!(!err.is_precondition());
    }
}
