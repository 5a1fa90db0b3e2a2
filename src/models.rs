use std::collections::HashMap;

use chrono::NaiveDate;

/// Per-user event counts for a single day, keyed by analytics user id.
pub type MetricResult = HashMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    // A
    RejectedReview,
    // B
    RejectedReviewSecondary,
    // C
    Forms,
    // D
    Rotativos,
    // E
    ReviewedDoc,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::RejectedReview,
        Category::RejectedReviewSecondary,
        Category::Forms,
        Category::Rotativos,
        Category::ReviewedDoc,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            Category::RejectedReview | Category::RejectedReviewSecondary => "Rejected Review",
            Category::Forms | Category::Rotativos => "Reviewed Field",
            Category::ReviewedDoc => "Reviewed Doc",
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Category::RejectedReview | Category::RejectedReviewSecondary => 1.1,
            Category::Forms => 0.9,
            Category::Rotativos => 1.09,
            Category::ReviewedDoc => 1.0,
        }
    }

    /// Single-letter slot name, also the suffix of the per-category filter variable.
    pub fn slot(self) -> char {
        match self {
            Category::RejectedReview => 'A',
            Category::RejectedReviewSecondary => 'B',
            Category::Forms => 'C',
            Category::Rotativos => 'D',
            Category::ReviewedDoc => 'E',
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub rejected: u64,
    pub rejected_secondary: u64,
    pub forms: u64,
    pub rotativos: u64,
    pub reviewed_doc: u64,
}

impl EventCounts {
    pub fn set(&mut self, category: Category, value: u64) {
        match category {
            Category::RejectedReview => self.rejected = value,
            Category::RejectedReviewSecondary => self.rejected_secondary = value,
            Category::Forms => self.forms = value,
            Category::Rotativos => self.rotativos = value,
            Category::ReviewedDoc => self.reviewed_doc = value,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DailyMetrics {
    pub rejected: MetricResult,
    pub rejected_secondary: MetricResult,
    pub forms: MetricResult,
    pub rotativos: MetricResult,
    pub reviewed_doc: MetricResult,
}

impl DailyMetrics {
    pub fn get(&self, category: Category) -> &MetricResult {
        match category {
            Category::RejectedReview => &self.rejected,
            Category::RejectedReviewSecondary => &self.rejected_secondary,
            Category::Forms => &self.forms,
            Category::Rotativos => &self.rotativos,
            Category::ReviewedDoc => &self.reviewed_doc,
        }
    }

    pub fn insert(&mut self, category: Category, result: MetricResult) {
        match category {
            Category::RejectedReview => self.rejected = result,
            Category::RejectedReviewSecondary => self.rejected_secondary = result,
            Category::Forms => self.forms = result,
            Category::Rotativos => self.rotativos = result,
            Category::ReviewedDoc => self.reviewed_doc = result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserScoreRecord {
    pub user_id: String,
    pub display_id: String,
    pub counts: EventCounts,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportResult {
    pub date: NaiveDate,
    pub records: Vec<UserScoreRecord>,
    pub total_score: f64,
}
