use chrono::{DateTime, SecondsFormat, Utc};

use tierscan_core::types::{Classification, FileMetrics, ModelTier, SafetyTier};
use tierscan_core::{ReportSummary, Thresholds};

use crate::{validate, ReportError};

/// Prefix of the only line that may differ between two renders of the same summary.
pub const TIMESTAMP_MARKER: &str = "<!-- generated-at:";

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Adds an isolated generation-timestamp line below the title.
    pub generated_at: Option<DateTime<Utc>>,
}

/// Render the assessment report as Markdown. Output is a pure function of `summary`.
pub fn render(summary: &ReportSummary) -> Result<String, ReportError> {
    render_with(summary, &RenderOptions::default())
}

/// Render with options. Fails without producing any output if the summary is inconsistent.
pub fn render_with(summary: &ReportSummary, options: &RenderOptions) -> Result<String, ReportError> {
    validate(summary)?;

    let mut out = String::new();

    out.push_str("# AI Maintainability Assessment Report\n\n");
    if let Some(at) = options.generated_at {
        out.push_str(&format!(
            "{TIMESTAMP_MARKER} {} -->\n\n",
            at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }

    out.push_str(&format_tier_definitions(&summary.thresholds));
    out.push_str(&format_files(&summary.classifications));
    out.push_str(&format_summary(summary));
    out.push_str(&format_comment_impact(&summary.thresholds));

    Ok(out)
}

fn format_tier_definitions(t: &Thresholds) -> String {
    let mut out = String::new();

    out.push_str("## Safety Tiers\n\n");
    out.push_str("### Code Files\n\n");
    out.push_str("Rated by the highest cyclomatic complexity (CC) of any function in the file.\n\n");
    out.push_str(&format!(
        "- **SIMPLE** (≤{} CC): safe for quick AI edits\n",
        t.complexity_simple
    ));
    out.push_str(&format!(
        "- **SAFE** (≤{} CC): within {}'s recommended limit\n",
        t.complexity_safe,
        ModelTier::ClaudeHaiku
    ));
    out.push_str(&format!(
        "- **COMPLEX** (≤{} CC): requires {}\n",
        t.complexity_complex,
        ModelTier::ClaudeSonnet
    ));
    out.push_str(&format!(
        "- **DANGER** (>{} CC): needs human review\n",
        t.complexity_complex
    ));

    out.push_str("\n### Config Files\n\n");
    out.push_str("Rated by file size.\n\n");
    out.push_str(&format!(
        "- **SIMPLE** (≤{}): simple key-value changes\n",
        format_mib(t.size_simple)
    ));
    out.push_str(&format!(
        "- **SAFE** (≤{}): within {}'s size limit\n",
        format_mib(t.size_safe),
        ModelTier::ClaudeHaiku
    ));
    out.push_str(&format!(
        "- **COMPLEX** (≤{}): needs {}'s context\n",
        format_mib(t.size_complex),
        ModelTier::ClaudeSonnet
    ));
    out.push_str(&format!(
        "- **DANGER** (>{}): potential context issues\n",
        format_mib(t.size_complex)
    ));

    out.push_str("\n### Model Recommendations\n\n");
    out.push_str("| Tier | Model |\n");
    out.push_str("|------|-------|\n");
    for tier in SafetyTier::ALL {
        out.push_str(&format!("| {tier} | {} |\n", tier.primary_model()));
    }
    out.push_str(&format!(
        "\nWhen a project mixes code and config files, COMPLEX and DANGER files also list {} as an alternative for cross-file reasoning.\n\n",
        ModelTier::Gpt4Turbo
    ));

    out
}

fn format_files(classifications: &[Classification]) -> String {
    let mut out = String::from("## Files\n\n");

    if classifications.is_empty() {
        out.push_str("No files found.\n\n");
        return out;
    }

    for c in classifications {
        out.push_str(&format!("### `{}`\n\n", c.path));
        let kind = c.kind.map_or_else(|| "unknown".to_string(), |k| k.to_string());
        out.push_str(&format!("- **Kind:** {kind}\n"));
        out.push_str(&format!("- **Safety:** **{}**\n", c.safety_tier));
        out.push_str(&format!("- **Model:** {}\n", c.recommended_model));
        if let Some(secondary) = c.secondary_model {
            out.push_str(&format!("- **Alternative:** {secondary}\n"));
        }

        match &c.metrics {
            Some(FileMetrics::Code(m)) => {
                out.push_str(&format!(
                    "- **Complexity:** max {}, total {} across {} function(s)\n",
                    m.max_complexity, m.total_complexity, m.function_count
                ));
                let comments = match (m.comment_density, m.comment_quality()) {
                    (Some(density), Some(quality)) => {
                        format!("{:.1}% ({quality})", density * 100.0)
                    }
                    _ => "N/A".to_string(),
                };
                out.push_str(&format!("- **Comments:** {comments}\n"));
                out.push_str(&format!(
                    "- **Size:** {} ({} lines)\n",
                    format_size(m.byte_size),
                    m.line_count
                ));
                out.push_str(&format!("- **Tokens:** {}\n", m.token_count));
            }
            Some(FileMetrics::Config(m)) => {
                out.push_str(&format!(
                    "- **Size:** {} ({} lines)\n",
                    format_size(m.byte_size),
                    m.line_count
                ));
                out.push_str(&format!("- **Tokens:** {}\n", m.token_count));
            }
            None => {}
        }

        if c.failed {
            out.push_str("- **Status:** analysis failed\n");
        }
        out.push_str(&format!("- **Reason:** {}\n\n", c.reason));
    }

    out
}

fn format_summary(summary: &ReportSummary) -> String {
    let mut out = String::from("## Summary\n\n");

    out.push_str(&format!(
        "- **Files analyzed:** {}\n- **Needs human review:** {}\n- **Failed analysis:** {}\n\n",
        summary.total_files(),
        summary.needs_review(),
        summary.failed_files.len(),
    ));

    out.push_str("### By Safety Tier\n\n");
    out.push_str("| Tier | Files |\n");
    out.push_str("|------|-------|\n");
    for (tier, count) in &summary.tier_counts {
        out.push_str(&format!("| {tier} | {count} |\n"));
    }

    out.push_str("\n### By Recommended Model\n\n");
    out.push_str("| Model | Files |\n");
    out.push_str("|-------|-------|\n");
    for (model, count) in &summary.model_counts {
        out.push_str(&format!("| {model} | {count} |\n"));
    }

    out.push_str("\n### Secondary Suggestions\n\n");
    if summary.secondary_counts.is_empty() {
        out.push_str("None.\n");
    } else {
        out.push_str("| Model | Files |\n");
        out.push_str("|-------|-------|\n");
        for (model, count) in &summary.secondary_counts {
            out.push_str(&format!("| {model} | {count} |\n"));
        }
    }

    out.push_str("\n### Failed Files\n\n");
    if summary.failed_files.is_empty() {
        out.push_str("None.\n");
    } else {
        for path in &summary.failed_files {
            out.push_str(&format!("- `{path}`\n"));
        }
    }
    out.push('\n');

    out
}

fn format_comment_impact(t: &Thresholds) -> String {
    format!(
        "## Comment Impact\n\n\
         - Comment density is advisory and never changes a file's safety tier\n\
         - Files below {:.0}% comment density are flagged as \"low comment density\"\n\
         - Documentation quality: EXCELLENT (≥25%), GOOD (≥15%), FAIR (≥5%), POOR (<5%)\n",
        t.low_comment_density * 100.0
    )
}

/// Threshold label: "1 MiB", "2.5 MiB".
fn format_mib(bytes: u64) -> String {
    format!("{} MiB", bytes as f64 / MIB)
}

fn format_size(bytes: u64) -> String {
    if bytes as f64 >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
