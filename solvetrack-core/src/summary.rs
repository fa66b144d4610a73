//! Period statistics over daily summaries.

use serde::Serialize;

use crate::round2;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_days: u64,
    pub total_minutes: u64,
    pub average_minutes: f64,
}

/// Totals for a listed summary period: day count, summed minutes, and the
/// rounded per-day mean (0 when the period is empty).
pub fn summary_stats(minutes_per_day: &[u32]) -> SummaryStats {
    let total_days = minutes_per_day.len() as u64;
    let total_minutes: u64 = minutes_per_day.iter().map(|m| u64::from(*m)).sum();
    let average_minutes = if total_days > 0 {
        round2(total_minutes as f64 / total_days as f64)
    } else {
        0.0
    };
    SummaryStats {
        total_days,
        total_minutes,
        average_minutes,
    }
}
