//! Turns a file's measurements into a safety tier and model recommendation.
//!
//! Classification never fails: a file whose metrics could not be collected is
//! still classified, as DANGER with a human-review recommendation.

use std::fmt;

use crate::config::Thresholds;
use crate::types::{
    Classification, CodeMetrics, ConfigMetrics, FileKind, FileMetrics, FileSample,
    MetricsFailure, ModelTier, SafetyTier,
};

/// Facts about the whole run that affect per-file recommendations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Both code and config files are present in the run.
    pub mixed_kinds: bool,
}

impl RunContext {
    pub fn from_samples(samples: &[FileSample]) -> Self {
        let has_code = samples.iter().any(|s| s.kind == Some(FileKind::Code));
        let has_config = samples.iter().any(|s| s.kind == Some(FileKind::Config));
        Self {
            mixed_kinds: has_code && has_config,
        }
    }
}

/// A fragment of the justification recorded on a classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    Complexity { max: u32, tier: SafetyTier },
    NoFunctions,
    Size { bytes: u64, tier: SafetyTier },
    EmptyFile,
    LowCommentDensity { density: f64 },
    CommentDensityUnknown,
    CrossFileAlternative,
    MetricsUnavailable(String),
    UnknownKind,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Complexity { max, tier } => {
                write!(f, "max cyclomatic complexity {max} is within {tier}")
            }
            Reason::NoFunctions => write!(f, "no functions found, complexity treated as 0"),
            Reason::Size { bytes, tier } => write!(f, "size {bytes} bytes is within {tier}"),
            Reason::EmptyFile => write!(f, "empty file"),
            Reason::LowCommentDensity { density } => {
                write!(f, "low comment density ({:.1}%)", density * 100.0)
            }
            Reason::CommentDensityUnknown => write!(f, "comment density unknown"),
            Reason::CrossFileAlternative => write!(
                f,
                "mixed code and config project, consider {} for cross-file reasoning",
                ModelTier::Gpt4Turbo
            ),
            Reason::MetricsUnavailable(detail) => {
                write!(f, "metrics collection failed ({detail}), needs human review")
            }
            Reason::UnknownKind => write!(
                f,
                "file kind could not be determined, needs human review"
            ),
        }
    }
}

/// Join reason fragments into the single justification string.
pub fn join_reasons(reasons: &[Reason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Classifies samples against a fixed set of thresholds.
pub struct TierClassifier {
    thresholds: Thresholds,
}

impl TierClassifier {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            thresholds: thresholds.clone(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Classify one file. Pure: the result depends only on the sample and context.
    pub fn classify(&self, sample: &FileSample, ctx: RunContext) -> Classification {
        let metrics = match &sample.outcome {
            Ok(metrics) => metrics,
            Err(failure) => return self.classify_failure(sample, failure),
        };

        let mut reasons = Vec::new();
        let tier = match metrics {
            FileMetrics::Code(code) => self.code_tier(code, &mut reasons),
            FileMetrics::Config(config) => self.config_tier(config, &mut reasons),
        };

        let secondary_model = if ctx.mixed_kinds && tier.is_complex_or_worse() {
            reasons.push(Reason::CrossFileAlternative);
            Some(ModelTier::Gpt4Turbo)
        } else {
            None
        };

        Classification {
            path: sample.path.clone(),
            kind: Some(metrics.kind()),
            safety_tier: tier,
            recommended_model: tier.primary_model(),
            secondary_model,
            reason: join_reasons(&reasons),
            failed: false,
            metrics: Some(metrics.clone()),
        }
    }

    /// Classify every sample, deriving the run context from the whole set.
    pub fn classify_all(&self, samples: &[FileSample]) -> Vec<Classification> {
        let ctx = RunContext::from_samples(samples);
        samples.iter().map(|s| self.classify(s, ctx)).collect()
    }

    fn code_tier(&self, code: &CodeMetrics, reasons: &mut Vec<Reason>) -> SafetyTier {
        let tier = if code.function_count == 0 {
            reasons.push(Reason::NoFunctions);
            self.thresholds.complexity_tier(0)
        } else {
            let tier = self.thresholds.complexity_tier(code.max_complexity);
            reasons.push(Reason::Complexity {
                max: code.max_complexity,
                tier,
            });
            tier
        };

        // Advisory only: density never moves the tier.
        match code.comment_density {
            Some(density) if density < self.thresholds.low_comment_density => {
                reasons.push(Reason::LowCommentDensity { density });
            }
            Some(_) => {}
            None => reasons.push(Reason::CommentDensityUnknown),
        }

        tier
    }

    fn config_tier(&self, config: &ConfigMetrics, reasons: &mut Vec<Reason>) -> SafetyTier {
        let tier = self.thresholds.size_tier(config.byte_size);
        if config.byte_size == 0 {
            reasons.push(Reason::EmptyFile);
        } else {
            reasons.push(Reason::Size {
                bytes: config.byte_size,
                tier,
            });
        }
        tier
    }

    fn classify_failure(&self, sample: &FileSample, failure: &MetricsFailure) -> Classification {
        let reason = match failure {
            MetricsFailure::Unavailable(detail) => Reason::MetricsUnavailable(detail.clone()),
            MetricsFailure::UnknownKind => Reason::UnknownKind,
        };

        Classification {
            path: sample.path.clone(),
            kind: sample.kind,
            safety_tier: SafetyTier::Danger,
            recommended_model: ModelTier::HumanReview,
            secondary_model: None,
            reason: reason.to_string(),
            failed: true,
            metrics: None,
        }
    }
}

impl Default for TierClassifier {
    fn default() -> Self {
        Self::new(&Thresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(max: u32, density: Option<f64>) -> FileMetrics {
        FileMetrics::Code(CodeMetrics {
            max_complexity: max,
            total_complexity: max,
            function_count: if max == 0 { 0 } else { 1 },
            comment_density: density,
            line_count: 20,
            byte_size: 400,
            token_count: 120,
        })
    }

    fn config(bytes: u64) -> FileMetrics {
        FileMetrics::Config(ConfigMetrics {
            byte_size: bytes,
            line_count: 1,
            token_count: 2,
        })
    }

    fn classify_one(metrics: FileMetrics) -> Classification {
        TierClassifier::default().classify(
            &FileSample::measured("file", metrics),
            RunContext::default(),
        )
    }

    #[test]
    fn test_simple_code_file_uses_haiku() {
        let c = classify_one(code(10, Some(0.2)));
        assert_eq!(c.safety_tier, SafetyTier::Simple);
        assert_eq!(c.recommended_model, ModelTier::ClaudeHaiku);
        assert_eq!(c.secondary_model, None);
        assert!(!c.failed);
        assert_eq!(c.reason, "max cyclomatic complexity 10 is within SIMPLE");
    }

    #[test]
    fn test_complex_code_file_uses_sonnet() {
        let c = classify_one(code(40, Some(0.2)));
        assert_eq!(c.safety_tier, SafetyTier::Complex);
        assert_eq!(c.recommended_model, ModelTier::ClaudeSonnet);
    }

    #[test]
    fn test_large_config_needs_human_review() {
        let c = classify_one(config(5_000_000));
        assert_eq!(c.safety_tier, SafetyTier::Danger);
        assert_eq!(c.recommended_model, ModelTier::HumanReview);
        assert_eq!(c.kind, Some(FileKind::Config));
    }

    #[test]
    fn test_complexity_boundaries() {
        let cases = [
            (15, SafetyTier::Simple),
            (16, SafetyTier::Safe),
            (35, SafetyTier::Safe),
            (36, SafetyTier::Complex),
            (55, SafetyTier::Complex),
            (56, SafetyTier::Danger),
        ];
        for (cc, expected) in cases {
            assert_eq!(classify_one(code(cc, Some(0.3))).safety_tier, expected, "CC={cc}");
        }
    }

    #[test]
    fn test_size_boundaries() {
        let cases = [
            (1_048_576, SafetyTier::Simple),
            (1_048_577, SafetyTier::Safe),
            (2_621_440, SafetyTier::Safe),
            (2_621_441, SafetyTier::Complex),
            (4_194_304, SafetyTier::Complex),
            (4_194_305, SafetyTier::Danger),
        ];
        for (bytes, expected) in cases {
            assert_eq!(classify_one(config(bytes)).safety_tier, expected, "{bytes} bytes");
        }
    }

    #[test]
    fn test_zero_functions_is_simple() {
        let c = classify_one(code(0, Some(0.5)));
        assert_eq!(c.safety_tier, SafetyTier::Simple);
        assert!(c.reason.contains("no functions found"));
    }

    #[test]
    fn test_empty_config_is_simple() {
        let c = classify_one(config(0));
        assert_eq!(c.safety_tier, SafetyTier::Simple);
        assert_eq!(c.reason, "empty file");
    }

    #[test]
    fn test_low_comment_density_is_advisory() {
        let sparse = classify_one(code(20, Some(0.02)));
        let dense = classify_one(code(20, Some(0.40)));
        assert_eq!(sparse.safety_tier, dense.safety_tier);
        assert!(sparse.reason.contains("low comment density (2.0%)"));
        assert!(!dense.reason.contains("comment density"));
    }

    #[test]
    fn test_unknown_density_is_noted() {
        let c = classify_one(code(5, None));
        assert_eq!(c.safety_tier, SafetyTier::Simple);
        assert!(c.reason.ends_with("comment density unknown"));
    }

    #[test]
    fn test_failed_sample_forced_to_danger() {
        let sample = FileSample::failed(
            "broken.py",
            Some(FileKind::Code),
            MetricsFailure::Unavailable("invalid syntax".into()),
        );
        let ctx = RunContext { mixed_kinds: true };
        let c = TierClassifier::default().classify(&sample, ctx);
        assert!(c.failed);
        assert_eq!(c.safety_tier, SafetyTier::Danger);
        assert_eq!(c.recommended_model, ModelTier::HumanReview);
        assert_eq!(c.secondary_model, None);
        assert!(c.metrics.is_none());
        assert!(c.reason.contains("metrics collection failed (invalid syntax)"));
    }

    #[test]
    fn test_unknown_kind_has_specific_reason() {
        let sample = FileSample::failed("run.sh", None, MetricsFailure::UnknownKind);
        let c = TierClassifier::default().classify(&sample, RunContext::default());
        assert!(c.failed);
        assert_eq!(c.kind, None);
        assert_eq!(c.safety_tier, SafetyTier::Danger);
        assert!(c.reason.contains("file kind could not be determined"));
    }

    #[test]
    fn test_mixed_project_adds_secondary_suggestion() {
        let samples = vec![
            FileSample::measured("app.py", code(60, Some(0.2))),
            FileSample::measured("settings.json", config(10_000)),
        ];
        let results = TierClassifier::default().classify_all(&samples);

        let app = &results[0];
        assert_eq!(app.safety_tier, SafetyTier::Danger);
        assert_eq!(app.recommended_model, ModelTier::HumanReview);
        assert_eq!(app.secondary_model, Some(ModelTier::Gpt4Turbo));
        assert!(app.reason.contains("gpt-4-turbo"));

        let settings = &results[1];
        assert_eq!(settings.safety_tier, SafetyTier::Simple);
        assert_eq!(settings.recommended_model, ModelTier::ClaudeHaiku);
        assert_eq!(settings.secondary_model, None);
    }

    #[test]
    fn test_no_secondary_suggestion_without_mixed_kinds() {
        let samples = vec![
            FileSample::measured("a.py", code(60, Some(0.2))),
            FileSample::measured("b.py", code(40, Some(0.2))),
        ];
        let results = TierClassifier::default().classify_all(&samples);
        assert!(results.iter().all(|c| c.secondary_model.is_none()));
    }

    #[test]
    fn test_run_context_counts_failed_samples_with_known_kind() {
        let samples = vec![
            FileSample::measured("a.py", code(1, None)),
            FileSample::failed(
                "b.yaml",
                Some(FileKind::Config),
                MetricsFailure::Unavailable("unreadable".into()),
            ),
        ];
        assert!(RunContext::from_samples(&samples).mixed_kinds);

        let samples = vec![
            FileSample::measured("a.py", code(1, None)),
            FileSample::failed("b.sh", None, MetricsFailure::UnknownKind),
        ];
        assert!(!RunContext::from_samples(&samples).mixed_kinds);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = Thresholds {
            complexity_simple: 5,
            complexity_safe: 10,
            complexity_complex: 20,
            ..Thresholds::default()
        };
        let classifier = TierClassifier::new(&thresholds);
        let c = classifier.classify(
            &FileSample::measured("a.py", code(12, Some(0.3))),
            RunContext::default(),
        );
        assert_eq!(c.safety_tier, SafetyTier::Complex);
    }
}
