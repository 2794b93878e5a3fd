//! Prompt construction for the monthly analysis request.

use std::fmt::Write as _;

use crate::batch::ReviewBatch;

/// System prompt used when [`crate::AnalyzerConfig::system_prompt`] is empty.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a business analytics expert analyzing \
customer reviews. Provide insights in JSON format.";

/// Illustrative response shape sent with every request. The numbers are
/// examples only; counts and percentages are recomputed after decoding.
pub const ANALYSIS_SCHEMA_TEMPLATE: &str = r#"{
  "analysis": {
    "overall_summary": {
      // General overview of customer feedback across all reviews
      "summary_text": "string",
      // 3-5 recurring positive themes
      "positive_themes": ["string"],
      // 3-5 recurring negative themes
      "negative_themes": ["string"],
      // How passengers see the business: punctuality, reliability, friendliness
      "overall_perception": "string",
      "average_rating": 4.5
    },
    "sentiment_analysis": {
      // 4-5 stars
      "positive_count": 45,
      "positive_percentage": 75.0,
      // 3 stars
      "neutral_count": 10,
      "neutral_percentage": 16.7,
      // 1-2 stars
      "negative_count": 5,
      "negative_percentage": 8.3,
      "total_reviews": 60,
      // improving, declining or stable, with a short explanation
      "sentiment_trend": "string"
    },
    "key_takeaways": {
      // 3-5 strengths
      "strengths": [
        {
          "category": "string",
          "description": "string",
          // Quote or paraphrase from a real review
          "example": "string"
        }
      ],
      // 3-5 common complaints
      "areas_for_improvement": [
        {
          "category": "string",
          "description": "string",
          "example": "string"
        }
      ]
    },
    "negative_review_breakdown": {
      // Place each 1-2 star review in one of these categories
      "categories": [
        { "name": "Missed or Delayed Pre-Bookings", "count": 3, "percentage": 60.0 },
        { "name": "Poor Communication", "count": 1, "percentage": 20.0 },
        { "name": "Driver Behavior", "count": 1, "percentage": 20.0 },
        { "name": "Pricing Concerns", "count": 0, "percentage": 0.0 }
      ],
      // Concrete actions for the most frequent complaints
      "improvement_recommendations": ["string"]
    },
    "training_recommendations": {
      "for_operators": ["string"],
      "for_drivers": ["string"]
    }
  }
}"#;

/// Renders the user prompt for `batch`. Only reviews with text are listed.
#[must_use]
pub fn build_prompt(batch: &ReviewBatch) -> String {
    let mut reviews = String::new();
    for (index, review) in batch.text_reviews().into_iter().enumerate() {
        let date = review
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        // Writing to a String cannot fail.
        let _ = write!(
            reviews,
            "### Review {}\nRating: {}/5 stars\nDate: {}\nText: {}\n\n",
            index + 1,
            review.rating,
            date,
            review.text.trim()
        );
    }

    format!(
        "## Business Information\n\
         Business Name: {business}\n\
         Location: {location}\n\
         Location ID: {location_id}\n\
         Postal Code: {postal}\n\
         Report Period: {start} to {end}\n\n\
         ## Reviews\n{reviews}\n\
         ## Analysis Instructions\n\
         Please analyze these reviews and provide a comprehensive analysis including:\n\
         1. Overall summary and themes\n\
         2. Sentiment breakdown (positive, neutral, negative)\n\
         3. Key strengths and areas for improvement\n\
         4. Recommendations for addressing issues\n\
         5. Training suggestions for staff\n\n\
         Provide your analysis in the exact JSON format specified below:\n\n\
         {schema}",
        business = batch.business_name,
        location = batch.location_name,
        location_id = batch.location_id,
        postal = batch.postal_code,
        start = batch.report_period.start_date,
        end = batch.report_period.end_date,
        schema = ANALYSIS_SCHEMA_TEMPLATE,
    )
}
