//! Batch analysis: prompt the model, validate what comes back, and replace
//! every aggregate statistic with values computed from the ratings.

use async_trait::async_trait;
use chrono::Utc;

use crate::batch::ReviewBatch;
use crate::error::AnalysisError;
use crate::extract::extract_json_object;
use crate::generation::{run_with_fixed_retry, RetryPolicy, TextGenerator};
use crate::prompt::{build_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::types::{
    Analysis, AnalysisMetadata, AnalysisResult, Insight, OverallSummary, SentimentAnalysis,
};
use crate::BatchAnalyzer;

/// Identity and prompt settings for an [`Analyzer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Empty means [`DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: String,
    /// Empty means the generator's own model name.
    pub model_name: String,
    pub analyzer_id: String,
    pub analyzer_name: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model_name: String::new(),
            analyzer_id: "monthly-report-analyzer".to_string(),
            analyzer_name: "Monthly Report Analyzer".to_string(),
        }
    }
}

pub struct Analyzer<G> {
    generator: G,
    config: AnalyzerConfig,
    retry: RetryPolicy,
}

impl<G: TextGenerator> Analyzer<G> {
    #[must_use]
    pub fn new(generator: G, config: AnalyzerConfig, retry: RetryPolicy) -> Self {
        Self {
            generator,
            config,
            retry,
        }
    }

    fn system_prompt(&self) -> &str {
        if self.config.system_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT
        } else {
            &self.config.system_prompt
        }
    }

    fn model_name(&self) -> &str {
        if self.config.model_name.is_empty() {
            self.generator.model_name()
        } else {
            &self.config.model_name
        }
    }

    /// Analyses `batch`.
    ///
    /// Reviews without text are left out of the prompt but count toward the
    /// average rating, the total and every percentage. A batch with ratings
    /// and no text yields a ratings-only result without calling the model.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::EmptyBatch`] when the batch has no reviews.
    /// - [`AnalysisError::Generation`] when every generation attempt failed.
    /// - [`AnalysisError::NoJsonObject`] or [`AnalysisError::Decode`] when the
    ///   response holds no usable JSON.
    /// - [`AnalysisError::MissingField`] when a required section is empty.
    pub async fn analyze(&self, batch: &ReviewBatch) -> Result<AnalysisResult, AnalysisError> {
        let ratings = batch.ratings();
        if ratings.is_empty() {
            return Err(AnalysisError::EmptyBatch);
        }

        let text_count = batch.text_reviews().len();
        if text_count == 0 {
            tracing::info!(
                location = %batch.location_name,
                ratings = ratings.len(),
                "no review text; building ratings-only analysis"
            );
            return Ok(AnalysisResult {
                analysis: ratings_only_analysis(&ratings),
                metadata: self.metadata(batch, &ratings),
            });
        }

        let prompt = build_prompt(batch);
        let system_prompt = self.system_prompt();
        tracing::debug!(
            location = %batch.location_name,
            analyzed = text_count,
            total = ratings.len(),
            prompt_chars = prompt.len(),
            "requesting analysis"
        );

        let response = run_with_fixed_retry(self.retry, || {
            self.generator.generate(system_prompt, &prompt)
        })
        .await?;

        let json = extract_json_object(&response)?;
        let mut result: AnalysisResult =
            serde_json::from_str(json).map_err(AnalysisError::Decode)?;
        validate(&result.analysis)?;

        reconcile(&mut result.analysis, &ratings);
        let sentiment = &result.analysis.sentiment_analysis;
        if sentiment.counted() != u64::from(sentiment.total_reviews) {
            tracing::warn!(
                location = %batch.location_name,
                model_counted = sentiment.counted(),
                total_reviews = sentiment.total_reviews,
                "model sentiment counts do not match review total"
            );
        }

        result.metadata = self.metadata(batch, &ratings);
        Ok(result)
    }

    fn metadata(&self, batch: &ReviewBatch, ratings: &[u8]) -> AnalysisMetadata {
        AnalysisMetadata {
            generated_at: Utc::now(),
            review_count: count_u32(ratings.len()),
            location_id: batch.location_id.clone(),
            location_name: batch.location_name.clone(),
            business_name: batch.business_name.clone(),
            report_period: batch.report_period.clone(),
            client_id: batch.client_id,
            analyzer_id: self.config.analyzer_id.clone(),
            analyzer_name: self.config.analyzer_name.clone(),
            analyzer_model: self.model_name().to_string(),
        }
    }
}

#[async_trait]
impl<G: TextGenerator> BatchAnalyzer for Analyzer<G> {
    async fn analyze(&self, batch: &ReviewBatch) -> Result<AnalysisResult, AnalysisError> {
        Analyzer::analyze(self, batch).await
    }
}

/// Rejects responses missing any of the sections a report cannot do without.
///
/// # Errors
///
/// Returns [`AnalysisError::MissingField`] naming the first empty section.
pub fn validate(analysis: &Analysis) -> Result<(), AnalysisError> {
    if analysis.overall_summary.summary_text.trim().is_empty() {
        return Err(AnalysisError::MissingField("summary"));
    }
    if analysis.sentiment_analysis.sentiment_trend.trim().is_empty() {
        return Err(AnalysisError::MissingField("sentiment trend"));
    }
    if analysis.key_takeaways.strengths.is_empty() {
        return Err(AnalysisError::MissingField("strengths"));
    }
    if analysis.key_takeaways.areas_for_improvement.is_empty() {
        return Err(AnalysisError::MissingField("areas for improvement"));
    }
    Ok(())
}

/// Overwrites the average, the total and the three percentages.
///
/// The model's counts are kept; percentages are those counts over the full
/// review total.
pub fn reconcile(analysis: &mut Analysis, ratings: &[u8]) {
    let total = count_u32(ratings.len());
    analysis.overall_summary.average_rating = average_rating(ratings);

    let sentiment = &mut analysis.sentiment_analysis;
    sentiment.total_reviews = total;
    sentiment.positive_percentage = percentage(sentiment.positive_count, total);
    sentiment.neutral_percentage = percentage(sentiment.neutral_count, total);
    sentiment.negative_percentage = percentage(sentiment.negative_count, total);
}

/// Arithmetic mean of every rating, unrated (0) included. 0.0 when empty.
#[must_use]
pub fn average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    f64::from(sum) / f64::from(count_u32(ratings.len()))
}

/// `count / total * 100`, or 0.0 when `total` is zero.
#[must_use]
pub fn percentage(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(count) / f64::from(total) * 100.0
}

/// Positive (4-5), neutral (3) and negative (1-2) counts. Unrated reviews
/// count as neutral so the three bands always cover every review.
#[must_use]
pub fn star_band_counts(ratings: &[u8]) -> (u32, u32, u32) {
    ratings
        .iter()
        .fold((0, 0, 0), |(pos, neu, neg), &rating| match rating {
            4..=5 => (pos + 1, neu, neg),
            1..=2 => (pos, neu, neg + 1),
            _ => (pos, neu + 1, neg),
        })
}

fn ratings_only_analysis(ratings: &[u8]) -> Analysis {
    let total = count_u32(ratings.len());
    let (positive, neutral, negative) = star_band_counts(ratings);
    let unavailable = "Not available - no review text".to_string();

    let mut analysis = Analysis {
        overall_summary: OverallSummary {
            summary_text:
                "No text content in reviews to analyze. Analysis based on ratings only."
                    .to_string(),
            positive_themes: vec![unavailable.clone()],
            negative_themes: vec![unavailable],
            overall_perception: "Analysis limited to numeric ratings only.".to_string(),
            average_rating: 0.0,
        },
        sentiment_analysis: SentimentAnalysis {
            positive_count: positive,
            neutral_count: neutral,
            negative_count: negative,
            total_reviews: total,
            sentiment_trend: "Unable to determine from ratings only".to_string(),
            ..SentimentAnalysis::default()
        },
        ..Analysis::default()
    };
    analysis.key_takeaways.strengths.push(Insight {
        category: "Limited Data".to_string(),
        description: "Unable to identify strengths without review text".to_string(),
        example: String::new(),
    });
    analysis.key_takeaways.areas_for_improvement.push(Insight {
        category: "Limited Data".to_string(),
        description: "Unable to identify areas for improvement without review text".to_string(),
        example: String::new(),
    });

    reconcile(&mut analysis, ratings);
    analysis
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::{json, Value};

    use revdb_listing::Review;

    use super::*;
    use crate::error::GenerationError;
    use crate::types::ReportPeriod;

    /// Replays canned responses and counts calls.
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
        calls: AtomicU32,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        fn replying(body: &Value) -> Self {
            Self::new(vec![Ok(body.to_string())])
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _system_prompt: &str,
            user_prompt: &str,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(user_prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::EmptyCompletion))
        }

        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    fn analyzer(generator: ScriptedGenerator) -> Analyzer<ScriptedGenerator> {
        Analyzer::new(
            generator,
            AnalyzerConfig::default(),
            RetryPolicy {
                max_retries: 2,
                delay: Duration::ZERO,
            },
        )
    }

    fn review(rating: u8, text: &str) -> Review {
        Review {
            id: format!("r-{rating}-{}", text.len()),
            text: text.to_string(),
            rating,
            date: None,
        }
    }

    fn batch(reviews: Vec<Review>) -> ReviewBatch {
        ReviewBatch {
            reviews,
            location_name: "Test Location".to_string(),
            location_id: "accounts/1/locations/2".to_string(),
            business_name: "Acme Taxis".to_string(),
            client_id: 7,
            postal_code: "AB1 2CD".to_string(),
            report_period: ReportPeriod {
                start_date: "2023-05-01".to_string(),
                end_date: "2023-05-31".to_string(),
            },
        }
    }

    fn model_response(positive: u32, neutral: u32, negative: u32) -> Value {
        json!({
            "analysis": {
                "overall_summary": {
                    "summary_text": "Mostly punctual service.",
                    "positive_themes": ["Punctuality"],
                    "negative_themes": ["Booking errors"],
                    "overall_perception": "Reliable",
                    "average_rating": 4.9
                },
                "sentiment_analysis": {
                    "positive_count": positive,
                    "positive_percentage": 99.0,
                    "neutral_count": neutral,
                    "neutral_percentage": 1.0,
                    "negative_count": negative,
                    "negative_percentage": 0.0,
                    "total_reviews": 2,
                    "sentiment_trend": "stable"
                },
                "key_takeaways": {
                    "strengths": [{"category": "Punctuality", "description": "On time", "example": "early"}],
                    "areas_for_improvement": [{"category": "Bookings", "description": "Missed", "example": "no-show"}]
                },
                "negative_review_breakdown": {
                    "categories": [{"name": "Missed or Delayed Pre-Bookings", "count": 1, "percentage": 100.0}],
                    "improvement_recommendations": ["Confirm bookings"]
                },
                "training_recommendations": {
                    "for_operators": ["Call back"],
                    "for_drivers": ["Arrive early"]
                }
            }
        })
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn scenario_four_reviews_two_with_text() {
        let generator = ScriptedGenerator::replying(&model_response(2, 1, 1));
        let analyzer = analyzer(generator);
        let input = batch(vec![
            review(5, "Excellent driver"),
            review(2, ""),
            review(4, "Good value"),
            review(3, ""),
        ]);

        let result = analyzer.analyze(&input).await.unwrap();
        let sentiment = &result.analysis.sentiment_analysis;

        assert_eq!(sentiment.total_reviews, 4);
        assert_close(result.analysis.overall_summary.average_rating, 3.5);
        assert_close(sentiment.positive_percentage, 50.0);
        assert_close(sentiment.neutral_percentage, 25.0);
        assert_close(sentiment.negative_percentage, 25.0);
        assert!((sentiment.percentage_sum() - 100.0).abs() < 0.1);
        assert_eq!(result.metadata.review_count, 4);
        assert_eq!(result.metadata.location_name, "Test Location");
    }

    #[tokio::test]
    async fn textless_ratings_still_count_toward_totals() {
        let generator = ScriptedGenerator::replying(&model_response(1, 0, 0));
        let analyzer = analyzer(generator);
        let input = batch(vec![review(4, ""), review(3, ""), review(5, "great")]);

        let result = analyzer.analyze(&input).await.unwrap();

        assert_eq!(result.analysis.sentiment_analysis.total_reviews, 3);
        assert_close(result.analysis.overall_summary.average_rating, 4.0);

        let prompt = analyzer.generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Text: great"));
        assert!(!prompt.contains("### Review 2"));
    }

    #[tokio::test]
    async fn model_counts_are_kept_even_when_they_disagree_with_total() {
        let generator = ScriptedGenerator::replying(&model_response(1, 0, 0));
        let analyzer = analyzer(generator);
        let input = batch(vec![review(5, "great"), review(1, "")]);

        let result = analyzer.analyze(&input).await.unwrap();
        let sentiment = &result.analysis.sentiment_analysis;

        assert_eq!(sentiment.positive_count, 1);
        assert_eq!(sentiment.negative_count, 0);
        assert_close(sentiment.positive_percentage, 50.0);
    }

    #[test]
    fn average_includes_unrated_reviews() {
        assert_close(average_rating(&[5, 0, 4]), 3.0);
        assert_close(average_rating(&[]), 0.0);
    }

    #[test]
    fn star_bands_put_unrated_in_neutral() {
        assert_eq!(star_band_counts(&[5, 4, 3, 2, 1, 0]), (2, 2, 2));
    }

    #[tokio::test]
    async fn huge_model_counts_do_not_overflow() {
        let generator = ScriptedGenerator::replying(&model_response(u32::MAX, 1, 0));
        let analyzer = analyzer(generator);
        let input = batch(vec![review(5, "great"), review(4, "fine")]);

        let result = analyzer.analyze(&input).await.unwrap();
        let sentiment = &result.analysis.sentiment_analysis;

        assert_eq!(sentiment.counted(), u64::from(u32::MAX) + 1);
        assert_eq!(sentiment.total_reviews, 2);
    }

    // -----------------------------------------------------------------------
    // Ratings-only and empty batches
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn ratings_only_batch_skips_model() {
        let analyzer = analyzer(ScriptedGenerator::new(vec![]));
        let input = batch(vec![review(5, ""), review(4, "   "), review(2, ""), review(3, "")]);

        let result = analyzer.analyze(&input).await.unwrap();
        let analysis = &result.analysis;

        assert_eq!(analyzer.generator.calls.load(Ordering::SeqCst), 0);
        assert!(analysis
            .overall_summary
            .summary_text
            .starts_with("No text content in reviews to analyze."));
        assert_close(analysis.overall_summary.average_rating, 3.5);
        assert_eq!(analysis.sentiment_analysis.total_reviews, 4);
        assert_eq!(analysis.sentiment_analysis.positive_count, 2);
        assert!((analysis.sentiment_analysis.percentage_sum() - 100.0).abs() < 0.1);
        assert_eq!(analysis.key_takeaways.strengths.len(), 1);
        assert_eq!(analysis.key_takeaways.areas_for_improvement.len(), 1);
        assert_eq!(analysis.key_takeaways.strengths[0].category, "Limited Data");
        assert_eq!(result.metadata.review_count, 4);
        assert_eq!(result.metadata.analyzer_model, "test-model");
    }

    #[tokio::test]
    async fn ratings_only_percentages_close_with_unrated_reviews() {
        let analyzer = analyzer(ScriptedGenerator::new(vec![]));
        let input = batch(vec![review(5, ""), review(0, "")]);

        let result = analyzer.analyze(&input).await.unwrap();
        let sentiment = &result.analysis.sentiment_analysis;

        assert_eq!(sentiment.total_reviews, 2);
        assert_eq!(sentiment.neutral_count, 1);
        assert_close(sentiment.positive_percentage, 50.0);
        assert_close(sentiment.neutral_percentage, 50.0);
        assert!((sentiment.percentage_sum() - 100.0).abs() < 0.1);
    }

    #[tokio::test]
    async fn empty_batch_is_an_error() {
        let analyzer = analyzer(ScriptedGenerator::new(vec![]));
        let err = analyzer.analyze(&batch(vec![])).await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyBatch));
        assert_eq!(err.to_string(), "cannot analyze empty review batch");
    }

    // -----------------------------------------------------------------------
    // Response handling
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn json_wrapped_in_prose_is_accepted() {
        let body = format!(
            "Here you go:\n{}\nHope that helps!",
            model_response(1, 0, 0)
        );
        let analyzer = analyzer(ScriptedGenerator::new(vec![Ok(body)]));
        let result = analyzer.analyze(&batch(vec![review(5, "great")])).await;
        assert!(result.is_ok(), "got {result:?}");
    }

    #[tokio::test]
    async fn response_without_json_fails() {
        let analyzer = analyzer(ScriptedGenerator::new(vec![Ok("I cannot help".to_string())]));
        let err = analyzer
            .analyze(&batch(vec![review(5, "great")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NoJsonObject { .. }));
    }

    #[tokio::test]
    async fn missing_sections_are_rejected() {
        let cases: [(&str, &str, &str); 4] = [
            ("overall_summary", "summary_text", "summary"),
            ("sentiment_analysis", "sentiment_trend", "sentiment trend"),
            ("key_takeaways", "strengths", "strengths"),
            ("key_takeaways", "areas_for_improvement", "areas for improvement"),
        ];

        for (section, field, expected) in cases {
            let mut body = model_response(1, 0, 0);
            body["analysis"][section]
                .as_object_mut()
                .unwrap()
                .remove(field);
            let analyzer = analyzer(ScriptedGenerator::replying(&body));

            let err = analyzer
                .analyze(&batch(vec![review(5, "great")]))
                .await
                .unwrap_err();
            assert!(
                matches!(err, AnalysisError::MissingField(name) if name == expected),
                "removing {section}.{field} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn transient_generation_failure_is_retried() {
        let generator = ScriptedGenerator::new(vec![
            Err(GenerationError::EmptyCompletion),
            Ok(model_response(1, 0, 0).to_string()),
        ]);
        let analyzer = analyzer(generator);

        let result = analyzer.analyze(&batch(vec![review(5, "great")])).await;
        assert!(result.is_ok());
        assert_eq!(analyzer.generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_generation_surfaces_wrapped_error() {
        let analyzer = analyzer(ScriptedGenerator::new(vec![]));
        let err = analyzer
            .analyze(&batch(vec![review(5, "great")]))
            .await
            .unwrap_err();

        assert_eq!(analyzer.generator.calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            AnalysisError::Generation(GenerationError::Exhausted { retries: 2, .. })
        ));
    }

    #[tokio::test]
    async fn metadata_carries_identity_and_configured_model() {
        let generator = ScriptedGenerator::replying(&model_response(1, 0, 0));
        let analyzer = Analyzer::new(
            generator,
            AnalyzerConfig {
                model_name: "gpt-4.1".to_string(),
                ..AnalyzerConfig::default()
            },
            RetryPolicy::default(),
        );

        let result = analyzer.analyze(&batch(vec![review(5, "great")])).await.unwrap();
        let metadata = &result.metadata;

        assert_eq!(metadata.client_id, 7);
        assert_eq!(metadata.business_name, "Acme Taxis");
        assert_eq!(metadata.location_id, "accounts/1/locations/2");
        assert_eq!(metadata.report_period.end_date, "2023-05-31");
        assert_eq!(metadata.analyzer_id, "monthly-report-analyzer");
        assert_eq!(metadata.analyzer_model, "gpt-4.1");
    }
}
