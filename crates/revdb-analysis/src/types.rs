//! Analysis result document.
//!
//! Field names follow the JSON the model is asked to produce, which is also
//! the JSON persisted inside each stored report. Every section defaults when
//! missing so that validation, not decoding, decides what is required.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub analysis: Analysis,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    pub overall_summary: OverallSummary,
    pub sentiment_analysis: SentimentAnalysis,
    pub key_takeaways: KeyTakeaways,
    pub negative_review_breakdown: NegativeReviewBreakdown,
    pub training_recommendations: TrainingRecommendations,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallSummary {
    pub summary_text: String,
    pub positive_themes: Vec<String>,
    pub negative_themes: Vec<String>,
    pub overall_perception: String,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentAnalysis {
    pub positive_count: u32,
    pub positive_percentage: f64,
    pub neutral_count: u32,
    pub neutral_percentage: f64,
    pub negative_count: u32,
    pub negative_percentage: f64,
    /// Every review for the location and month, with or without text.
    pub total_reviews: u32,
    pub sentiment_trend: String,
}

impl SentimentAnalysis {
    /// Sum of the three counts. Widened because the counts come from the model.
    #[must_use]
    pub fn counted(&self) -> u64 {
        u64::from(self.positive_count)
            + u64::from(self.neutral_count)
            + u64::from(self.negative_count)
    }

    #[must_use]
    pub fn percentage_sum(&self) -> f64 {
        self.positive_percentage + self.neutral_percentage + self.negative_percentage
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyTakeaways {
    pub strengths: Vec<Insight>,
    pub areas_for_improvement: Vec<Insight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insight {
    pub category: String,
    pub description: String,
    pub example: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegativeReviewBreakdown {
    pub categories: Vec<ReviewCategory>,
    pub improvement_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewCategory {
    pub name: String,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingRecommendations {
    pub for_operators: Vec<String>,
    pub for_drivers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisMetadata {
    pub generated_at: DateTime<Utc>,
    pub review_count: u32,
    pub location_id: String,
    pub location_name: String,
    pub business_name: String,
    pub report_period: ReportPeriod,
    pub client_id: i64,
    pub analyzer_id: String,
    pub analyzer_name: String,
    pub analyzer_model: String,
}

/// Calendar dates shown for a report, `YYYY-MM-DD`, end inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPeriod {
    pub start_date: String,
    pub end_date: String,
}
