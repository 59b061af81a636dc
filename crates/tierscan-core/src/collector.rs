use std::path::Path;

use anyhow::Result;

use crate::types::CodeMetrics;

/// Measures code files of one language. Implemented once per supported language.
pub trait MetricsCollector: Send + Sync {
    /// Language name (e.g., "python")
    fn language(&self) -> &'static str;

    /// File extensions this collector handles (e.g., &["py"])
    fn file_extensions(&self) -> &[&str];

    /// Compute complexity and comment metrics for a source file.
    fn collect(&self, path: &Path, content: &str) -> Result<CodeMetrics>;
}

/// Ratio of comment lines to total lines, `None` for an empty file.
pub fn comment_density(comment_lines: usize, total_lines: usize) -> Option<f64> {
    if total_lines == 0 {
        None
    } else {
        Some(comment_lines as f64 / total_lines as f64)
    }
}
