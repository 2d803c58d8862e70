//! # CLI Commands / CLI 命令

/// Writes a starter job configuration / 写入初始作业配置
pub mod init;
/// Lists registered job types / 列出已注册的作业类型
pub mod list;
/// Runs a job type through its lifecycle / 按生命周期运行作业类型
pub mod run;
