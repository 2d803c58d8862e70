//! # Job Types / 作业类型
//!
//! Concrete job types shipped with the runner. Each one registers itself in
//! [`JobRegistry::with_builtin`](crate::core::job::JobRegistry::with_builtin).
//!
//! 随运行器提供的具体作业类型。

/// Moodle performance run driven by JMeter / 由 JMeter 驱动的 Moodle 性能测试
pub mod performance;
