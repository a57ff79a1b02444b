//! Cross-timeframe ranking of finished reports.

use crate::config::DecisionSettings;
use crate::engine::decision::Action;
use crate::models::TimeframeReport;

/// |total_score| scaled by confidence, with a strong penalty for wait
/// recommendations so actionable signals always surface first. Failed
/// analyses score -1 and sink to the bottom.
pub fn rank_score(report: &TimeframeReport, settings: &DecisionSettings) -> f64 {
    if report.error.is_some() {
        return -1.0;
    }
    let recommendation = &report.recommendation;
    let penalty = if recommendation.action == Action::Wait {
        settings.wait_penalty
    } else {
        1.0
    };
    recommendation.total_score.abs() * (recommendation.confidence / 100.0) * penalty
}

/// Fill each report's rank score and sort best-first. The sort is stable,
/// so ties keep the caller's timeframe order.
pub fn rank_reports(reports: &mut [TimeframeReport], settings: &DecisionSettings) {
    for report in reports.iter_mut() {
        report.rank_score = rank_score(report, settings);
    }
    reports.sort_by(|a, b| b.rank_score.total_cmp(&a.rank_score));
}
