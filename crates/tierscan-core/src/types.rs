use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of file being scanned, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Code,
    Config,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Code => write!(f, "code"),
            FileKind::Config => write!(f, "config"),
        }
    }
}

/// How much scrutiny an automated edit to a file needs.
/// Ordered from least (Simple) to most (Danger) severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyTier {
    Simple,
    Safe,
    Complex,
    Danger,
}

impl SafetyTier {
    pub const ALL: [SafetyTier; 4] = [
        SafetyTier::Simple,
        SafetyTier::Safe,
        SafetyTier::Complex,
        SafetyTier::Danger,
    ];

    /// Model judged capable of editing a file at this tier.
    pub fn primary_model(&self) -> ModelTier {
        match self {
            SafetyTier::Simple | SafetyTier::Safe => ModelTier::ClaudeHaiku,
            SafetyTier::Complex => ModelTier::ClaudeSonnet,
            SafetyTier::Danger => ModelTier::HumanReview,
        }
    }

    /// Tiers at which cross-file reasoning warrants a second opinion.
    pub fn is_complex_or_worse(&self) -> bool {
        *self >= SafetyTier::Complex
    }
}

impl fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyTier::Simple => write!(f, "SIMPLE"),
            SafetyTier::Safe => write!(f, "SAFE"),
            SafetyTier::Complex => write!(f, "COMPLEX"),
            SafetyTier::Danger => write!(f, "DANGER"),
        }
    }
}

/// Recommended class of assistant for editing a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelTier {
    #[serde(rename = "claude-3.5-haiku")]
    ClaudeHaiku,
    #[serde(rename = "claude-3.5-sonnet")]
    ClaudeSonnet,
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "Human Review")]
    HumanReview,
}

impl ModelTier {
    pub const ALL: [ModelTier; 4] = [
        ModelTier::ClaudeHaiku,
        ModelTier::ClaudeSonnet,
        ModelTier::Gpt4Turbo,
        ModelTier::HumanReview,
    ];
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::ClaudeHaiku => write!(f, "claude-3.5-haiku"),
            ModelTier::ClaudeSonnet => write!(f, "claude-3.5-sonnet"),
            ModelTier::Gpt4Turbo => write!(f, "gpt-4-turbo"),
            ModelTier::HumanReview => write!(f, "Human Review"),
        }
    }
}

/// Advisory documentation label derived from comment density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommentQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl CommentQuality {
    /// Label for a density ratio in [0, 1].
    pub fn from_density(density: f64) -> Self {
        if density >= 0.25 {
            CommentQuality::Excellent
        } else if density >= 0.15 {
            CommentQuality::Good
        } else if density >= 0.05 {
            CommentQuality::Fair
        } else {
            CommentQuality::Poor
        }
    }
}

impl fmt::Display for CommentQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentQuality::Poor => write!(f, "POOR"),
            CommentQuality::Fair => write!(f, "FAIR"),
            CommentQuality::Good => write!(f, "GOOD"),
            CommentQuality::Excellent => write!(f, "EXCELLENT"),
        }
    }
}

/// Measurements for a structured-code file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeMetrics {
    /// Highest cyclomatic complexity among the file's functions (0 if none).
    pub max_complexity: u32,
    /// Sum of cyclomatic complexity over all functions.
    pub total_complexity: u32,
    pub function_count: usize,
    /// Ratio of comment lines to total lines, if it could be measured.
    pub comment_density: Option<f64>,
    pub line_count: usize,
    pub byte_size: u64,
    /// Lexical tokens, the proxy for how much context the file needs.
    pub token_count: usize,
}

impl CodeMetrics {
    pub fn comment_quality(&self) -> Option<CommentQuality> {
        self.comment_density.map(CommentQuality::from_density)
    }
}

/// Measurements for a configuration/data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetrics {
    pub byte_size: u64,
    pub line_count: usize,
    /// Whitespace-separated words.
    pub token_count: usize,
}

/// Per-file measurements. Exactly one shape applies, matching the file's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileMetrics {
    Code(CodeMetrics),
    Config(ConfigMetrics),
}

impl FileMetrics {
    pub fn kind(&self) -> FileKind {
        match self {
            FileMetrics::Code(_) => FileKind::Code,
            FileMetrics::Config(_) => FileKind::Config,
        }
    }

    pub fn byte_size(&self) -> u64 {
        match self {
            FileMetrics::Code(m) => m.byte_size,
            FileMetrics::Config(m) => m.byte_size,
        }
    }

    /// Max complexity for code files, `None` for config files.
    pub fn max_complexity(&self) -> Option<u32> {
        match self {
            FileMetrics::Code(m) => Some(m.max_complexity),
            FileMetrics::Config(_) => None,
        }
    }
}

/// Why metrics could not be produced for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "failure", content = "detail", rename_all = "snake_case")]
pub enum MetricsFailure {
    /// The collector could not measure the file (unreadable, unparseable, ...).
    Unavailable(String),
    /// The file is neither a code nor a config file.
    UnknownKind,
}

impl fmt::Display for MetricsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsFailure::Unavailable(detail) => write!(f, "metrics unavailable: {detail}"),
            MetricsFailure::UnknownKind => write!(f, "unknown file kind"),
        }
    }
}

/// One file as handed to the classifier: path, kind and measured outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSample {
    pub path: String,
    pub kind: Option<FileKind>,
    pub outcome: Result<FileMetrics, MetricsFailure>,
}

impl FileSample {
    pub fn measured(path: impl Into<String>, metrics: FileMetrics) -> Self {
        Self {
            path: path.into(),
            kind: Some(metrics.kind()),
            outcome: Ok(metrics),
        }
    }

    pub fn failed(path: impl Into<String>, kind: Option<FileKind>, failure: MetricsFailure) -> Self {
        Self {
            path: path.into(),
            kind,
            outcome: Err(failure),
        }
    }
}

/// Verdict for a single file. Built once by the classifier and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub path: String,
    pub kind: Option<FileKind>,
    pub safety_tier: SafetyTier,
    pub recommended_model: ModelTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_model: Option<ModelTier>,
    pub reason: String,
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FileMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_tier_ordering() {
        assert!(SafetyTier::Simple < SafetyTier::Safe);
        assert!(SafetyTier::Safe < SafetyTier::Complex);
        assert!(SafetyTier::Complex < SafetyTier::Danger);
    }

    #[test]
    fn test_primary_model_mapping() {
        assert_eq!(SafetyTier::Simple.primary_model(), ModelTier::ClaudeHaiku);
        assert_eq!(SafetyTier::Safe.primary_model(), ModelTier::ClaudeHaiku);
        assert_eq!(SafetyTier::Complex.primary_model(), ModelTier::ClaudeSonnet);
        assert_eq!(SafetyTier::Danger.primary_model(), ModelTier::HumanReview);
    }

    #[test]
    fn test_model_display_matches_serde() {
        for model in ModelTier::ALL {
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{model}\""));
        }
    }

    #[test]
    fn test_comment_quality_bands() {
        assert_eq!(CommentQuality::from_density(0.30), CommentQuality::Excellent);
        assert_eq!(CommentQuality::from_density(0.25), CommentQuality::Excellent);
        assert_eq!(CommentQuality::from_density(0.15), CommentQuality::Good);
        assert_eq!(CommentQuality::from_density(0.05), CommentQuality::Fair);
        assert_eq!(CommentQuality::from_density(0.049), CommentQuality::Poor);
        assert_eq!(CommentQuality::from_density(0.0), CommentQuality::Poor);
    }

    #[test]
    fn test_metrics_kind_matches_shape() {
        let config = FileMetrics::Config(ConfigMetrics {
            byte_size: 10,
            line_count: 1,
            token_count: 2,
        });
        assert_eq!(config.kind(), FileKind::Config);
        assert_eq!(config.max_complexity(), None);

        let sample = FileSample::measured("a.toml", config);
        assert_eq!(sample.kind, Some(FileKind::Config));
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(
            MetricsFailure::Unavailable("syntax error".into()).to_string(),
            "metrics unavailable: syntax error"
        );
        assert_eq!(MetricsFailure::UnknownKind.to_string(), "unknown file kind");
    }
}
