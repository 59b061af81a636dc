use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::types::{Classification, FileKind, ModelTier, SafetyTier};

/// Aggregate over every classification produced in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Classifications in the order they were handed to [`aggregate`].
    pub classifications: Vec<Classification>,
    pub tier_counts: BTreeMap<SafetyTier, usize>,
    pub model_counts: BTreeMap<ModelTier, usize>,
    pub secondary_counts: BTreeMap<ModelTier, usize>,
    pub kind_counts: BTreeMap<FileKind, usize>,
    pub failed_files: Vec<String>,
    pub thresholds: Thresholds,
}

/// Tally classifications into a summary. Input order is preserved as-is.
pub fn aggregate(classifications: Vec<Classification>, thresholds: &Thresholds) -> ReportSummary {
    let mut tier_counts: BTreeMap<SafetyTier, usize> =
        SafetyTier::ALL.iter().map(|t| (*t, 0)).collect();
    let mut model_counts: BTreeMap<ModelTier, usize> =
        ModelTier::ALL.iter().map(|m| (*m, 0)).collect();
    let mut secondary_counts = BTreeMap::new();
    let mut kind_counts = BTreeMap::new();
    let mut failed_files = Vec::new();

    for c in &classifications {
        *tier_counts.entry(c.safety_tier).or_insert(0) += 1;
        *model_counts.entry(c.recommended_model).or_insert(0) += 1;
        if let Some(secondary) = c.secondary_model {
            *secondary_counts.entry(secondary).or_insert(0) += 1;
        }
        if let Some(kind) = c.kind {
            *kind_counts.entry(kind).or_insert(0) += 1;
        }
        if c.failed {
            failed_files.push(c.path.clone());
        }
    }

    ReportSummary {
        classifications,
        tier_counts,
        model_counts,
        secondary_counts,
        kind_counts,
        failed_files,
        thresholds: thresholds.clone(),
    }
}

impl ReportSummary {
    pub fn total_files(&self) -> usize {
        self.classifications.len()
    }

    pub fn tier_count(&self, tier: SafetyTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }

    pub fn model_count(&self, model: ModelTier) -> usize {
        self.model_counts.get(&model).copied().unwrap_or(0)
    }

    /// Files whose primary recommendation is a human reviewer.
    pub fn needs_review(&self) -> usize {
        self.model_count(ModelTier::HumanReview)
    }

    /// Up to `n` files, most severe tier first, then highest complexity,
    /// then input order.
    pub fn riskiest(&self, n: usize) -> Vec<&Classification> {
        let mut ranked: Vec<&Classification> = self.classifications.iter().collect();
        // sort_by is stable, so ties keep input order.
        ranked.sort_by(|a, b| {
            b.safety_tier.cmp(&a.safety_tier).then_with(|| {
                let ca = a.metrics.as_ref().and_then(|m| m.max_complexity());
                let cb = b.metrics.as_ref().and_then(|m| m.max_complexity());
                cb.cmp(&ca)
            })
        });
        ranked.truncate(n);
        ranked
    }
}
