//! Writing comparison partitions and the summary envelope to disk

use crate::error::{CompareError, Result};
use crate::frame::FileFormat;
use crate::result::{ComparisonResult, ComparisonSummary};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Bumped whenever the summary envelope changes shape
pub const SUMMARY_SCHEMA_VERSION: &str = "1.0";

/// Persisted summary with enough metadata to detect format drift
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEnvelope {
    pub schema_version: String,
    pub run_id: String,
    pub config_fingerprint: String,
    pub summary: ComparisonSummary,
}

impl SummaryEnvelope {
    pub fn from_result(result: &ComparisonResult) -> Result<Self> {
        Ok(Self {
            schema_version: SUMMARY_SCHEMA_VERSION.to_string(),
            run_id: result.run_id().to_string(),
            config_fingerprint: result.config().fingerprint()?,
            summary: result.summary().clone(),
        })
    }
}

pub struct ResultExporter;

impl ResultExporter {
    /// Write every non-empty partition plus `comparison_summary_<stamp>.json`.
    ///
    /// Returns artifact name to path, in write order. Partitions are streamed
    /// by the engine straight to disk.
    pub fn export(
        result: &ComparisonResult,
        output_dir: &Path,
        format: FileFormat,
    ) -> Result<IndexMap<String, PathBuf>> {
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(CompareError::invalid_input(format!(
                "Export path is not a directory: {}",
                output_dir.display()
            )));
        }
        fs::create_dir_all(output_dir)?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let summary = result.summary();
        let counts = [
            summary.value_differences_count,
            summary.left_only_count,
            summary.right_only_count,
        ];

        let mut artifacts = IndexMap::new();
        for ((name, frame), count) in result.partitions().into_iter().zip(counts) {
            if count == 0 {
                log::debug!("Skipping empty partition {}", name);
                continue;
            }
            let path = output_dir.join(format!("{}_{}.{}", name, stamp, format.extension()));
            frame.copy_to(&path, format)?;
            log::info!("Exported {} {} record(s) to {}", count, name, path.display());
            artifacts.insert(name.to_string(), path);
        }

        let envelope = SummaryEnvelope::from_result(result)?;
        let summary_path = output_dir.join(format!("comparison_summary_{}.json", stamp));
        fs::write(&summary_path, serde_json::to_string_pretty(&envelope)?)?;
        artifacts.insert("summary".to_string(), summary_path);

        Ok(artifacts)
    }

    pub fn read_summary(path: &Path) -> Result<SummaryEnvelope> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
