//! Human-readable rendering of comparison and validation outcomes

use crate::error::Result;
use crate::frame::{format_value, RecordBatch};
use crate::result::{ComparisonResult, ComparisonSummary};
use crate::validation::ValidationResult;
use std::fmt::Write as _;

const RULE: &str = "============================================================";
const SECTION_RULE: &str = "----------------------------------------";

/// Report depth selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Summary,
    Detailed,
    None,
}

impl ReportKind {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "detailed" => Ok(Self::Detailed),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "Invalid report type: {}. Use 'summary', 'detailed' or 'none'",
                s
            )),
        }
    }
}

pub struct ComparisonReport<'a> {
    result: &'a ComparisonResult,
}

impl<'a> ComparisonReport<'a> {
    pub fn new(result: &'a ComparisonResult) -> Self {
        Self { result }
    }

    /// Counts and percentages only; forces no partition plan
    pub fn summary_report(&self) -> String {
        render_summary(self.result.summary())
    }

    /// Summary followed by up to `max_samples` rows of each non-empty partition
    pub fn detailed_report(&self, max_samples: usize) -> Result<String> {
        let summary = self.result.summary();
        let mut out = render_summary(summary);

        let sections = [
            (
                "VALUE DIFFERENCES SAMPLES:",
                summary.value_differences_count,
                self.result.value_differences(),
            ),
            (
                "LEFT-ONLY RECORDS SAMPLES:",
                summary.left_only_count,
                self.result.left_only_records(),
            ),
            (
                "RIGHT-ONLY RECORDS SAMPLES:",
                summary.right_only_count,
                self.result.right_only_records(),
            ),
        ];

        for (title, count, frame) in sections {
            if count == 0 {
                continue;
            }
            let batch = frame.head(max_samples)?;
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", title);
            let _ = writeln!(out, "{}", SECTION_RULE);
            out.push_str(&render_table(&batch));
            if count > batch.num_rows() as u64 {
                let _ = writeln!(
                    out,
                    "... showing {} of {} records",
                    batch.num_rows(),
                    count
                );
            }
        }

        let _ = writeln!(out, "{}", RULE);
        Ok(out)
    }
}

fn render_summary(summary: &ComparisonSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "TABCOMPARE COMPARISON SUMMARY");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Timestamp: {}", summary.comparison_timestamp);
    let _ = writeln!(out);
    let _ = writeln!(out, "RECORD COUNTS:");
    let _ = writeln!(out, "├─ Left records:  {}", summary.total_left_records);
    let _ = writeln!(out, "└─ Right records: {}", summary.total_right_records);
    let _ = writeln!(out);
    let _ = writeln!(out, "COMPARISON RESULTS:");
    let _ = writeln!(out, "├─ Matching records:  {}", summary.matching_records);
    let _ = writeln!(out, "├─ Value differences: {}", summary.value_differences_count);
    let _ = writeln!(out, "├─ Left-only records: {}", summary.left_only_count);
    let _ = writeln!(out, "└─ Right-only records: {}", summary.right_only_count);

    let left = summary.total_left_records;
    if left > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "PERCENTAGES (of left dataset):");
        let _ = writeln!(
            out,
            "├─ Matching:          {}",
            format_percentage(summary.matching_records, left)
        );
        let _ = writeln!(
            out,
            "├─ Value differences: {}",
            format_percentage(summary.value_differences_count, left)
        );
        let _ = writeln!(
            out,
            "└─ Left-only:         {}",
            format_percentage(summary.left_only_count, left)
        );
    }
    let right = summary.total_right_records;
    if right > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "PERCENTAGES (of right dataset):");
        let _ = writeln!(
            out,
            "└─ Right-only:        {}",
            format_percentage(summary.right_only_count, right)
        );
    }
    out
}

/// Align a batch into a plain-text table
pub fn render_table(batch: &RecordBatch) -> String {
    let cells: Vec<Vec<String>> = batch
        .rows
        .iter()
        .map(|row| row.iter().map(format_value).collect())
        .collect();

    let mut widths: Vec<usize> = batch.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", render_row(&batch.columns));
    let _ = writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        let _ = writeln!(out, "{}", render_row(row));
    }
    out
}

/// Tree listing of validation outcomes, one branch per check
pub fn render_validation(label: &str, results: &[ValidationResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🔎 {}", label);
    for (i, result) in results.iter().enumerate() {
        let last = i == results.len() - 1;
        let (branch, stem) = if last { ("└─", "   ") } else { ("├─", "│  ") };
        if result.is_valid {
            let _ = writeln!(out, "{} ✅ {}: passed", branch, result.check);
            continue;
        }
        let _ = writeln!(
            out,
            "{} ❌ {}: {} problem(s)",
            branch,
            result.check,
            result.errors.len()
        );
        for (j, error) in result.errors.iter().enumerate() {
            let leaf = if j == result.errors.len() - 1 { "└─" } else { "├─" };
            let _ = writeln!(out, "{}{} {}", stem, leaf, error);
        }
    }
    out
}

fn format_percentage(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "n/a".to_string();
    }
    format!("{:.2}%", part as f64 * 100.0 / whole as f64)
}
