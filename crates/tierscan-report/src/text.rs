use colored::{ColoredString, Colorize};

use tierscan_core::types::SafetyTier;
use tierscan_core::ReportSummary;

/// Number of files listed under "Riskiest files".
const RISKIEST_LIMIT: usize = 5;

fn tier_label(tier: SafetyTier) -> ColoredString {
    let label = tier.to_string();
    match tier {
        SafetyTier::Simple => label.green(),
        SafetyTier::Safe => label.cyan(),
        SafetyTier::Complex => label.yellow(),
        SafetyTier::Danger => label.red().bold(),
    }
}

/// Short terminal summary printed after a scan.
pub fn format_summary(summary: &ReportSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        "tierscan - AI Maintainability Assessment".bold()
    ));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format!(
        "{}: {} files, {} need human review\n",
        "Summary".bold(),
        summary.total_files(),
        summary.needs_review(),
    ));

    for (tier, count) in &summary.tier_counts {
        out.push_str(&format!("  {:<8} {count}\n", tier_label(*tier)));
    }

    let risky: Vec<_> = summary
        .riskiest(RISKIEST_LIMIT)
        .into_iter()
        .filter(|c| c.safety_tier.is_complex_or_worse())
        .collect();
    if !risky.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", "Riskiest files".bold(), "-".repeat(40)));
        for c in risky {
            out.push_str(&format!(
                "  {} {} -> {}\n",
                tier_label(c.safety_tier),
                c.path,
                c.recommended_model
            ));
        }
    }

    if summary.failed_files.is_empty() {
        out.push_str(&format!("\n{}\n", "All files analyzed.".green()));
    } else {
        out.push_str(&format!(
            "\n{} ({})\n",
            "Analysis failed".red().bold(),
            summary.failed_files.len()
        ));
        for path in &summary.failed_files {
            out.push_str(&format!("  {path}\n"));
        }
    }

    out
}
