//! # File System Operations Module / 文件系统操作模块
//!
//! Helpers for the shared directory that the web server container, the JMeter
//! container and the runner itself exchange artifacts through.
//!
//! 用于共享目录的辅助函数，Web 服务器容器、JMeter 容器和运行器本身通过它交换产物。

use fs_extra::dir::{copy, CopyOptions};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{JobError, Result};

/// Creates `path` and its parents if they do not exist yet.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| JobError::io(path, e))
}

/// Copies the entire content of a source directory into a destination directory.
/// Existing files are overwritten.
///
/// # Arguments
/// * `from` - Source directory path
/// * `to` - Destination directory path, created when missing
pub fn copy_dir_all(from: &Path, to: &Path) -> Result<u64> {
    ensure_dir(to)?;
    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;
    Ok(copy(from, to, &options)?)
}

/// Returns the most recently modified file in `dir` with the given extension.
/// Equal modification times are broken by the lexically greater name, which
/// for timestamped generator output is the newer file. A missing directory
/// counts as "no match".
pub fn find_newest_with_extension(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(JobError::io(dir, e)),
    };

    let newest = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| has_extension(path, extension) && path.is_file())
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .max();
    Ok(newest.map(|(_, path)| path))
}

/// `true` when `path` ends in `.extension`.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(extension)
}

/// The last path segment of a URL, without query string or fragment.
/// Returns `None` when the URL ends in a slash.
pub fn url_basename(url: &str) -> Option<&str> {
    let without_suffix = url.split(['?', '#']).next().unwrap_or(url);
    let path = without_suffix
        .split_once("://")
        .map_or(without_suffix, |(_, rest)| rest);
    // Drop the host so `http://host` has no basename.
    let (_, path) = path.split_once('/')?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Expands `~` and `$VARS` in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            tracing::warn!("could not expand path '{raw}': {e}");
            PathBuf::from(raw)
        }
    }
}
