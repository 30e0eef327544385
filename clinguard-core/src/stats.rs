//! Aggregate statistics over audit records

use crate::logger::ScanLogEntry;
use crate::types::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-tool counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolStats {
    pub scans: usize,
    pub blocks: usize,
    pub detections: usize,
    pub errors: usize,
    /// Mean over scans with a non-zero timing, rounded to 0.1 ms
    pub avg_scan_time_ms: f64,
}

/// Dashboard summary of a set of scan records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_scans: usize,
    pub total_blocks: usize,
    pub tool_stats: BTreeMap<String, ToolStats>,
}

impl ScanStats {
    pub fn from_entries(entries: &[ScanLogEntry]) -> Self {
        let mut tool_stats: BTreeMap<String, ToolStats> = BTreeMap::new();
        // (total time, timed count) per tool
        let mut timings: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        for entry in entries {
            for (name, result) in &entry.tool_results {
                let stats = tool_stats.entry(name.clone()).or_default();
                stats.scans += 1;
                match result.verdict {
                    Verdict::Block => stats.blocks += 1,
                    Verdict::Detected => stats.detections += 1,
                    Verdict::Error => stats.errors += 1,
                    Verdict::Pass | Verdict::Skip => {}
                }

                if result.scan_time_ms > 0 {
                    let timing = timings.entry(name.clone()).or_default();
                    timing.0 += result.scan_time_ms;
                    timing.1 += 1;
                }
            }
        }

        for (name, (total, count)) in timings {
            if let Some(stats) = tool_stats.get_mut(&name) {
                let avg = total as f64 / count as f64;
                stats.avg_scan_time_ms = (avg * 10.0).round() / 10.0;
            }
        }

        Self {
            total_scans: entries.len(),
            total_blocks: entries
                .iter()
                .filter(|e| e.final_verdict == Verdict::Block)
                .count(),
            tool_stats,
        }
    }
}
