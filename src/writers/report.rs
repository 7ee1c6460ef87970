use crate::error::Result;
use crate::models::{format_percent, Verdict, VerdictScope};
use crate::processors::NormalizationStats;

/// Output flavour for QC reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Renders verdicts for humans (or as JSON). Never computes anything beyond
/// formatting.
#[derive(Debug, Clone, Default)]
pub struct ReportEmitter {
    format: ReportFormat,
}

impl ReportEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn render(&self, verdict: &Verdict) -> Result<String> {
        match self.format {
            ReportFormat::Text => Ok(render_text(verdict)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(verdict)?),
        }
    }

    pub fn render_all(&self, verdicts: &[Verdict]) -> Result<String> {
        match self.format {
            ReportFormat::Text => Ok(verdicts
                .iter()
                .map(render_text)
                .collect::<Vec<_>>()
                .join("\n")),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(verdicts)?),
        }
    }
}

fn scope_label(scope: &VerdictScope) -> String {
    match scope {
        VerdictScope::Source => "Source".to_string(),
        VerdictScope::Corpus { files } => format!("Corpus ({} files)", files),
        VerdictScope::Document => "Document".to_string(),
    }
}

/// Plain-text report for one verdict
pub fn render_text(verdict: &Verdict) -> String {
    let mut summary = String::new();

    summary.push_str(&format!(
        "=== QC Report: {} [{}] ===\n",
        verdict.label,
        scope_label(&verdict.scope)
    ));
    summary.push_str(&format!("Rows: {}\n", verdict.row_count));
    summary.push_str(&format!(
        "Valid timestamps: {} ({})\n",
        verdict.valid_timestamp_count,
        format_percent(verdict.ratio())
    ));
    summary.push_str(&format!("Duplicates: {}\n", verdict.duplicate_count));
    summary.push_str(&format!(
        "Result: {}\n",
        if verdict.passed { "PASS" } else { "FAIL" }
    ));

    if verdict.problems.is_empty() {
        summary.push_str("Problems: none\n");
    } else {
        summary.push_str(&format!("Problems ({}):\n", verdict.problems.len()));
        for (i, problem) in verdict.problems.iter().enumerate() {
            summary.push_str(&format!("  {}. {}\n", i + 1, problem));
        }
    }

    summary
}

/// One-line account of a normalization pass
pub fn render_normalization(table: &str, stats: &NormalizationStats) -> String {
    format!(
        "{}: {} of {} rows kept ({} without timestamp, {} without coordinates, {} out of range)",
        table,
        stats.output_rows,
        stats.input_rows,
        stats.missing_timestamp,
        stats.missing_coordinates,
        stats.out_of_range
    )
}
