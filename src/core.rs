//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the runner: the env and
//! module registries, the job type contract and the lifecycle driver.
//!
//! 此模块包含运行器的核心功能：环境变量和模块注册表、作业类型契约以及生命周期驱动器。

pub mod config;
pub mod env;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod modules;

// Re-exports
pub use env::EnvRegistry;
pub use error::JobError;
pub use job::{JobContext, JobRegistry, JobType};
pub use lifecycle::{JobReport, JobRunner};
