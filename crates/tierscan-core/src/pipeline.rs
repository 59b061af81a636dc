use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::classify::TierClassifier;
use crate::collector::MetricsCollector;
use crate::config::Config;
use crate::summary::{aggregate, ReportSummary};
use crate::types::{ConfigMetrics, FileKind, FileMetrics, FileSample, MetricsFailure};
use crate::walker::{Candidate, FileWalker};

/// Walks a project, measures every candidate and classifies the results.
/// Shared by the CLI and tests.
pub struct ScanPipeline {
    collectors: Vec<Box<dyn MetricsCollector>>,
    walker: FileWalker,
    classifier: TierClassifier,
    config: Config,
}

impl ScanPipeline {
    pub fn new(collectors: Vec<Box<dyn MetricsCollector>>, config: Config) -> Self {
        let walker = FileWalker::new(&config.scan);
        let classifier = TierClassifier::new(&config.thresholds);
        Self {
            collectors,
            walker,
            classifier,
            config,
        }
    }

    /// Exclude a path from the scan (the report being written, usually).
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.walker = self.walker.skip_path(path);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan `root` and return the aggregated summary.
    pub fn run(&self, root: &Path) -> ReportSummary {
        let samples = self.collect_samples(root);
        let classifications = self.classifier.classify_all(&samples);
        let summary = aggregate(classifications, &self.config.thresholds);
        tracing::info!(
            files = summary.total_files(),
            failed = summary.failed_files.len(),
            needs_review = summary.needs_review(),
            "scan complete"
        );
        summary
    }

    /// Measure every candidate under `root`. Output order is walker order
    /// (sorted by relative path) regardless of how the work was scheduled.
    pub fn collect_samples(&self, root: &Path) -> Vec<FileSample> {
        let candidates = self.walker.walk(root);
        tracing::debug!(count = candidates.len(), root = %root.display(), "found candidates");

        candidates
            .par_iter()
            .map(|candidate| {
                let sample = self.measure(candidate);
                match &sample.outcome {
                    Ok(_) => tracing::debug!(path = %sample.path, "measured"),
                    Err(failure) => tracing::warn!(path = %sample.path, "{failure}"),
                }
                sample
            })
            .collect()
    }

    fn measure(&self, candidate: &Candidate) -> FileSample {
        let path = candidate.rel_path.clone();
        match candidate.kind {
            None => FileSample::failed(path, None, MetricsFailure::UnknownKind),
            Some(FileKind::Config) => match measure_config(&candidate.path) {
                Ok(metrics) => FileSample::measured(path, FileMetrics::Config(metrics)),
                Err(detail) => FileSample::failed(
                    path,
                    Some(FileKind::Config),
                    MetricsFailure::Unavailable(detail),
                ),
            },
            Some(FileKind::Code) => match self.measure_code(&candidate.path) {
                Ok(metrics) => FileSample::measured(path, metrics),
                Err(detail) => FileSample::failed(
                    path,
                    Some(FileKind::Code),
                    MetricsFailure::Unavailable(detail),
                ),
            },
        }
    }

    fn measure_code(&self, file_path: &Path) -> Result<FileMetrics, String> {
        let ext = file_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let collector = self
            .collectors
            .iter()
            .find(|c| c.file_extensions().iter().any(|e| *e == ext))
            .ok_or_else(|| format!("no metrics collector registered for '.{ext}' files"))?;
        tracing::trace!(language = collector.language(), path = %file_path.display(), "collecting");

        let content =
            std::fs::read_to_string(file_path).map_err(|e| format!("failed to read file: {e}"))?;
        let metrics = collector
            .collect(file_path, &content)
            .map_err(|e| format!("{e:#}"))?;
        Ok(FileMetrics::Code(metrics))
    }
}

/// Stream a config file: size from metadata, then newlines and
/// whitespace-separated words in a single buffered pass.
fn measure_config(file_path: &Path) -> Result<ConfigMetrics, String> {
    let file = File::open(file_path).map_err(|e| format!("failed to read file: {e}"))?;
    let byte_size = file
        .metadata()
        .map_err(|e| format!("failed to read file metadata: {e}"))?
        .len();

    let mut reader = BufReader::new(file);
    let mut newlines = 0;
    let mut token_count = 0;
    let mut in_word = false;
    let mut last_byte = None;
    loop {
        let buf = reader
            .fill_buf()
            .map_err(|e| format!("failed to read file: {e}"))?;
        if buf.is_empty() {
            break;
        }
        for &b in buf {
            if b == b'\n' {
                newlines += 1;
            }
            if b.is_ascii_whitespace() {
                in_word = false;
            } else if !in_word {
                in_word = true;
                token_count += 1;
            }
        }
        last_byte = buf.last().copied();
        let consumed = buf.len();
        reader.consume(consumed);
    }

    // A final line without a trailing newline still counts.
    let line_count = newlines + usize::from(last_byte.is_some_and(|b| b != b'\n'));
    Ok(ConfigMetrics {
        byte_size,
        line_count,
        token_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CodeMetrics, ModelTier, SafetyTier};
    use anyhow::Result;
    use std::fs;

    /// Counts `if` lines as complexity; fails on files containing "SYNTAX ERROR".
    struct FakeCollector;

    impl MetricsCollector for FakeCollector {
        fn language(&self) -> &'static str {
            "fake"
        }

        fn file_extensions(&self) -> &[&str] {
            &["py"]
        }

        fn collect(&self, _path: &Path, content: &str) -> Result<CodeMetrics> {
            if content.contains("SYNTAX ERROR") {
                anyhow::bail!("invalid syntax");
            }
            let branches = content.lines().filter(|l| l.trim_start().starts_with("if")).count();
            Ok(CodeMetrics {
                max_complexity: branches as u32 + 1,
                total_complexity: branches as u32 + 1,
                function_count: 1,
                comment_density: Some(0.2),
                line_count: content.lines().count(),
                byte_size: content.len() as u64,
                token_count: content.split_whitespace().count(),
            })
        }
    }

    fn pipeline(config: Config) -> ScanPipeline {
        let collectors: Vec<Box<dyn MetricsCollector>> = vec![Box::new(FakeCollector)];
        ScanPipeline::new(collectors, config)
    }

    #[test]
    fn test_measure_config_counts_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yaml");
        fs::write(&path, "a: 1\nb: 2").unwrap();
        let metrics = measure_config(&path).unwrap();
        assert_eq!(metrics.byte_size, 10);
        assert_eq!(metrics.line_count, 2);
        assert_eq!(metrics.token_count, 4);

        fs::write(&path, "").unwrap();
        let metrics = measure_config(&path).unwrap();
        assert_eq!(metrics.byte_size, 0);
        assert_eq!(metrics.line_count, 0);
        assert_eq!(metrics.token_count, 0);
    }

    #[test]
    fn test_measure_config_counts_words_across_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(&path, "[server]\n\thost = example.org\n\nport=8080\n").unwrap();
        let metrics = measure_config(&path).unwrap();
        assert_eq!(metrics.line_count, 4);
        assert_eq!(metrics.token_count, 5);
        assert_eq!(metrics.byte_size, 40);
    }

    #[test]
    fn test_measure_config_streams_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        // Several reader buffers, so words straddle buffer boundaries.
        let line = "\"key\": \"value\",\n";
        fs::write(&path, line.repeat(10_000)).unwrap();
        let metrics = measure_config(&path).unwrap();
        assert_eq!(metrics.byte_size, (line.len() * 10_000) as u64);
        assert_eq!(metrics.line_count, 10_000);
        assert_eq!(metrics.token_count, 20_000);
    }

    #[test]
    fn test_run_classifies_all_files_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.py"), "def f():\n    if x:\n        pass\n").unwrap();
        fs::write(root.join("a.json"), "{}").unwrap();

        let summary = pipeline(Config::default()).run(root);
        let paths: Vec<_> = summary
            .classifications
            .iter()
            .map(|c| c.path.as_str())
            .collect();
        assert_eq!(paths, vec!["a.json", "b.py"]);
        assert_eq!(summary.tier_count(SafetyTier::Simple), 2);
        assert!(summary.failed_files.is_empty());
    }

    #[test]
    fn test_collector_failure_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("bad.py"), "SYNTAX ERROR").unwrap();
        fs::write(root.join("good.py"), "x = 1\n").unwrap();

        let summary = pipeline(Config::default()).run(root);
        assert_eq!(summary.total_files(), 2);
        assert_eq!(summary.failed_files, vec!["bad.py"]);

        let bad = &summary.classifications[0];
        assert!(bad.failed);
        assert_eq!(bad.safety_tier, SafetyTier::Danger);
        assert_eq!(bad.recommended_model, ModelTier::HumanReview);
        assert!(bad.reason.contains("invalid syntax"));

        assert!(!summary.classifications[1].failed);
    }

    #[test]
    fn test_code_without_collector_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("tool.rb"), "puts 1").unwrap();

        let mut config = Config::default();
        config.scan.code_extensions.push("rb".to_string());
        let summary = pipeline(config).run(root);

        assert_eq!(summary.failed_files, vec!["tool.rb"]);
        assert!(summary.classifications[0]
            .reason
            .contains("no metrics collector registered for '.rb' files"));
    }

    #[test]
    fn test_included_unknown_kind_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("deploy.sh"), "echo hi").unwrap();

        let mut config = Config::default();
        config.scan.include_patterns.push("*.sh".to_string());
        let summary = pipeline(config).run(root);

        assert_eq!(summary.failed_files, vec!["deploy.sh"]);
        assert_eq!(summary.classifications[0].kind, None);
    }

    #[test]
    fn test_empty_directory_yields_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = pipeline(Config::default()).run(dir.path());
        assert_eq!(summary.total_files(), 0);
    }
}
