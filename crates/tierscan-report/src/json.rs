use tierscan_core::ReportSummary;

use crate::{validate, ReportError};

/// Format the summary as JSON. Subject to the same consistency check as Markdown.
pub fn format_report(summary: &ReportSummary, compact: bool) -> Result<String, ReportError> {
    validate(summary)?;
    let json = if compact {
        serde_json::to_string(summary)?
    } else {
        serde_json::to_string_pretty(summary)?
    };
    Ok(json)
}
