//! Monthly review analysis.
//!
//! [`prepare_batch`] groups a location's reviews for one month, and
//! [`Analyzer`] turns that batch into a validated [`AnalysisResult`] using a
//! [`TextGenerator`]. Counts, percentages and averages in the result are
//! always recomputed from the ratings rather than taken from the model.

pub mod analyzer;
pub mod batch;
pub mod error;
pub mod extract;
pub mod generation;
pub mod prompt;
pub mod types;

use async_trait::async_trait;

pub use analyzer::{
    average_rating, percentage, reconcile, star_band_counts, validate, Analyzer, AnalyzerConfig,
};
pub use batch::{prepare_batch, ReviewBatch};
pub use error::{AnalysisError, GenerationError};
pub use extract::extract_json_object;
pub use generation::{
    run_with_fixed_retry, GenerationSettings, OpenAiGenerator, RetryPolicy, TextGenerator,
};
pub use prompt::{build_prompt, ANALYSIS_SCHEMA_TEMPLATE, DEFAULT_SYSTEM_PROMPT};
pub use types::{
    Analysis, AnalysisMetadata, AnalysisResult, Insight, KeyTakeaways, NegativeReviewBreakdown,
    OverallSummary, ReportPeriod, ReviewCategory, SentimentAnalysis, TrainingRecommendations,
};

/// Analyses one batch. Implemented by [`Analyzer`]; the monthly run depends
/// on this trait so it can be driven without a model.
#[async_trait]
pub trait BatchAnalyzer: Send + Sync {
    async fn analyze(&self, batch: &ReviewBatch) -> Result<AnalysisResult, AnalysisError>;
}
