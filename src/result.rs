//! Comparison outcome: three deferred partitions plus summary counts

use crate::config::ComparisonConfig;
use crate::frame::LazyFrame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Record counts of one comparison run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_left_records: u64,
    pub total_right_records: u64,
    pub matching_records: u64,
    pub value_differences_count: u64,
    pub left_only_count: u64,
    pub right_only_count: u64,
    pub comparison_timestamp: String,
}

impl ComparisonSummary {
    /// Matching records are the left records that are neither left-only nor different
    pub fn from_counts(
        total_left_records: u64,
        total_right_records: u64,
        value_differences_count: u64,
        left_only_count: u64,
        right_only_count: u64,
    ) -> Self {
        Self {
            total_left_records,
            total_right_records,
            matching_records: total_left_records
                .saturating_sub(left_only_count)
                .saturating_sub(value_differences_count),
            value_differences_count,
            left_only_count,
            right_only_count,
            comparison_timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn has_differences(&self) -> bool {
        self.value_differences_count > 0 || self.left_only_count > 0 || self.right_only_count > 0
    }

    /// Counts only, so two runs can be compared regardless of when they ran
    pub fn counts(&self) -> [u64; 6] {
        [
            self.total_left_records,
            self.total_right_records,
            self.matching_records,
            self.value_differences_count,
            self.left_only_count,
            self.right_only_count,
        ]
    }
}

/// Produced once per compare call and never modified
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    run_id: Uuid,
    summary: ComparisonSummary,
    value_differences: LazyFrame,
    left_only_records: LazyFrame,
    right_only_records: LazyFrame,
    config: Arc<ComparisonConfig>,
}

impl ComparisonResult {
    pub(crate) fn new(
        summary: ComparisonSummary,
        value_differences: LazyFrame,
        left_only_records: LazyFrame,
        right_only_records: LazyFrame,
        config: Arc<ComparisonConfig>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            summary,
            value_differences,
            left_only_records,
            right_only_records,
            config,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn summary(&self) -> &ComparisonSummary {
        &self.summary
    }

    /// Matched keys where at least one value column differs
    pub fn value_differences(&self) -> &LazyFrame {
        &self.value_differences
    }

    pub fn left_only_records(&self) -> &LazyFrame {
        &self.left_only_records
    }

    pub fn right_only_records(&self) -> &LazyFrame {
        &self.right_only_records
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Partitions by their export name, in a fixed order
    pub fn partitions(&self) -> [(&'static str, &LazyFrame); 3] {
        [
            ("value_differences", &self.value_differences),
            ("left_only_records", &self.left_only_records),
            ("right_only_records", &self.right_only_records),
        ]
    }
}
