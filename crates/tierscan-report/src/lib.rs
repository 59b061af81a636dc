//! Report generators for tierscan results.
//!
//! [`markdown::render`] produces the assessment document. [`text`] and
//! [`json`] are alternative views of the same [`ReportSummary`].

pub mod json;
pub mod markdown;
pub mod text;

use thiserror::Error;

use tierscan_core::types::{ModelTier, SafetyTier};
use tierscan_core::ReportSummary;

pub use markdown::{render, render_with, RenderOptions};

/// Reasons a report refuses to render. A partial safety report is worse
/// than none, so any inconsistency stops rendering entirely.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("classification #{index} ('{path}') is inconsistent: {problem}")]
    Inconsistent {
        index: usize,
        path: String,
        problem: &'static str,
    },
    #[error("summary counts disagree with classifications: {0}")]
    CountMismatch(String),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Check every classification and the summary totals before rendering.
pub fn validate(summary: &ReportSummary) -> Result<(), ReportError> {
    for (index, c) in summary.classifications.iter().enumerate() {
        let problem = if c.path.trim().is_empty() {
            Some("missing path")
        } else if c.reason.trim().is_empty() {
            Some("missing reason")
        } else if c.failed {
            if c.safety_tier != SafetyTier::Danger || c.recommended_model != ModelTier::HumanReview
            {
                Some("failed file is not routed to human review")
            } else {
                None
            }
        } else if c.kind.is_none() {
            Some("missing file kind")
        } else {
            match &c.metrics {
                None => Some("missing metrics"),
                Some(m) if Some(m.kind()) != c.kind => Some("metrics do not match file kind"),
                Some(_) => None,
            }
        };

        if let Some(problem) = problem {
            return Err(ReportError::Inconsistent {
                index,
                path: c.path.clone(),
                problem,
            });
        }
    }

    let total = summary.classifications.len();
    let tier_total: usize = summary.tier_counts.values().sum();
    if tier_total != total {
        return Err(ReportError::CountMismatch(format!(
            "{tier_total} files counted by tier, {total} classified"
        )));
    }
    let model_total: usize = summary.model_counts.values().sum();
    if model_total != total {
        return Err(ReportError::CountMismatch(format!(
            "{model_total} files counted by model, {total} classified"
        )));
    }
    let failed = summary.classifications.iter().filter(|c| c.failed).count();
    if failed != summary.failed_files.len() {
        return Err(ReportError::CountMismatch(format!(
            "{} failed files listed, {failed} classifications failed",
            summary.failed_files.len()
        )));
    }

    Ok(())
}
