use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{Category, DailyMetrics, EventCounts, ReportResult, UserScoreRecord};

pub const SCORE_SCALE: f64 = 0.9;

const DISPLAY_ID_CHARS: usize = 8;

pub fn aggregate(metrics: &DailyMetrics, date: NaiveDate) -> ReportResult {
    let users: BTreeSet<&String> = Category::ALL
        .iter()
        .flat_map(|category| metrics.get(*category).keys())
        .collect();

    let mut records: Vec<UserScoreRecord> = Vec::new();
    for user_id in users {
        let mut counts = EventCounts::default();
        for category in Category::ALL {
            let value = metrics.get(category).get(user_id).copied().unwrap_or(0);
            counts.set(category, value);
        }

        let score = round_one_decimal(weighted_score(&counts));
        if !qualifies(score) {
            continue;
        }

        records.push(UserScoreRecord {
            user_id: user_id.clone(),
            display_id: display_id(user_id),
            counts,
            score,
        });
    }

    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    let total_score = round_one_decimal(records.iter().map(|record| record.score).sum());

    ReportResult {
        date,
        records,
        total_score,
    }
}

/// Unrounded score: `((A+B)*1.1 + C*0.9 + D*1.09 + E*1.0) * 0.9`.
pub fn weighted_score(counts: &EventCounts) -> f64 {
    let rejected = (counts.rejected + counts.rejected_secondary) as f64;
    (rejected * Category::RejectedReview.weight()
        + counts.forms as f64 * Category::Forms.weight()
        + counts.rotativos as f64 * Category::Rotativos.weight()
        + counts.reviewed_doc as f64 * Category::ReviewedDoc.weight())
        * SCORE_SCALE
}

pub fn qualifies(score: f64) -> bool {
    score > 0.0
}

// Rounds the exact binary value, not `value * 10`, whose product can land on a tie.
pub fn round_one_decimal(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

pub fn display_id(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(DISPLAY_ID_CHARS).collect();
    format!("{prefix}...")
}

/// Medal for the podium, `"{n}."` for everyone else. `rank` is zero-based.
pub fn rank_label(rank: usize) -> String {
    match rank {
        0 => "🥇".to_string(),
        1 => "🥈".to_string(),
        2 => "🥉".to_string(),
        _ => format!("{}.", rank + 1),
    }
}
