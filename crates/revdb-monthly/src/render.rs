//! Self-contained HTML for the monthly PDF.

use std::fmt::Write as _;

use revdb_analysis::Insight;
use revdb_core::month_label;

use crate::report::{ClientReport, LocationReport};

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;color:#222;margin:32px}\
h1{font-size:24px;margin-bottom:4px}h2{font-size:18px;border-bottom:1px solid #ccc;\
padding-bottom:4px;margin-top:32px}h3{font-size:14px;margin:16px 0 4px}\
table{border-collapse:collapse;margin:8px 0}td,th{border:1px solid #ddd;padding:4px 8px;\
text-align:left}.muted{color:#666}.location{page-break-inside:avoid}";

/// Escapes text for element content and double-quoted attributes.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders the whole client report as one HTML document. Only analysed
/// locations appear; zero-review entries stay in the saved report alone.
#[must_use]
pub fn render_report_html(report: &ClientReport) -> String {
    let client = escape_html(&report.client.name);
    let period = escape_html(&month_label(&report.period));

    let mut html = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <title>{client} - Monthly Review Report - {period}</title>\
         <style>{STYLE}</style></head><body>\
         <h1>{client}</h1><p class=\"muted\">Monthly Review Report: {period}</p>"
    );

    let analysed = report.locations.iter().filter(|l| l.review_count > 0);
    for (index, location) in analysed.enumerate() {
        render_location(&mut html, index, location);
    }

    html.push_str("</body></html>");
    html
}

fn render_location(html: &mut String, index: usize, location: &LocationReport) {
    let name = if location.location_name.trim().is_empty() {
        format!("Location {}", index + 1)
    } else {
        location.location_name.clone()
    };
    let summary = &location.analysis.overall_summary;
    let sentiment = &location.analysis.sentiment_analysis;

    let _ = write!(
        html,
        "<section class=\"location\"><h2>{name}</h2>\
         <p class=\"muted\">{address} &middot; {count} reviews</p>",
        name = escape_html(&name),
        address = escape_html(&location.location_address),
        count = location.review_count,
    );

    let _ = write!(
        html,
        "<table><tr><th>Average rating</th><td>{avg:.1} / 5</td></tr>\
         <tr><th>Positive</th><td>{pos} ({pos_pct:.1}%)</td></tr>\
         <tr><th>Neutral</th><td>{neu} ({neu_pct:.1}%)</td></tr>\
         <tr><th>Negative</th><td>{neg} ({neg_pct:.1}%)</td></tr>\
         <tr><th>Trend</th><td>{trend}</td></tr></table>\
         <h3>Summary</h3><p>{text}</p>",
        avg = summary.average_rating,
        pos = sentiment.positive_count,
        pos_pct = sentiment.positive_percentage,
        neu = sentiment.neutral_count,
        neu_pct = sentiment.neutral_percentage,
        neg = sentiment.negative_count,
        neg_pct = sentiment.negative_percentage,
        trend = escape_html(&sentiment.sentiment_trend),
        text = escape_html(&summary.summary_text),
    );

    render_list(html, "Positive themes", &summary.positive_themes);
    render_list(html, "Negative themes", &summary.negative_themes);
    render_insights(html, "Strengths", &location.analysis.key_takeaways.strengths);
    render_insights(
        html,
        "Areas for improvement",
        &location.analysis.key_takeaways.areas_for_improvement,
    );

    let breakdown = &location.analysis.negative_review_breakdown;
    if !breakdown.categories.is_empty() {
        html.push_str("<h3>Negative review breakdown</h3><table><tr><th>Category</th><th>Count</th><th>Share</th></tr>");
        for category in &breakdown.categories {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>",
                escape_html(&category.name),
                category.count,
                category.percentage
            );
        }
        html.push_str("</table>");
    }
    render_list(html, "Recommendations", &breakdown.improvement_recommendations);

    let training = &location.analysis.training_recommendations;
    render_list(html, "Training for operators", &training.for_operators);
    render_list(html, "Training for drivers", &training.for_drivers);

    html.push_str("</section>");
}

fn render_list(html: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(html, "<h3>{heading}</h3><ul>");
    for item in items {
        let _ = write!(html, "<li>{}</li>", escape_html(item));
    }
    html.push_str("</ul>");
}

fn render_insights(html: &mut String, heading: &str, insights: &[Insight]) {
    if insights.is_empty() {
        return;
    }
    let _ = write!(html, "<h3>{heading}</h3><ul>");
    for insight in insights {
        let _ = write!(
            html,
            "<li><strong>{}</strong>: {}",
            escape_html(&insight.category),
            escape_html(&insight.description)
        );
        if !insight.example.trim().is_empty() {
            let _ = write!(html, " <em>&ldquo;{}&rdquo;</em>", escape_html(&insight.example));
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");
}

#[cfg(test)]
mod tests {
    use revdb_analysis::{Analysis, AnalysisMetadata};
    use revdb_core::{Client, MonthPeriod};

    use super::*;

    fn location(name: &str, count: u32) -> LocationReport {
        let mut analysis = Analysis::default();
        analysis.overall_summary.summary_text = "Drivers <always> on time & polite".to_string();
        analysis.overall_summary.average_rating = 4.25;
        analysis.sentiment_analysis.positive_count = 3;
        analysis.sentiment_analysis.positive_percentage = 75.0;
        analysis.key_takeaways.strengths.push(Insight {
            category: "Punctuality".to_string(),
            description: "Early pickups".to_string(),
            example: "He was \"early\"".to_string(),
        });
        LocationReport {
            location_id: "accounts/1/locations/2".to_string(),
            location_name: name.to_string(),
            location_address: "AB1 2CD".to_string(),
            review_count: count,
            analysis,
            metadata: AnalysisMetadata::default(),
        }
    }

    fn report(locations: Vec<LocationReport>) -> ClientReport {
        ClientReport {
            client: Client {
                id: 7,
                name: "Acme & Sons".to_string(),
                enabled: true,
                monthly_analysis_enabled: true,
                report_email: None,
            },
            period: MonthPeriod::new(2025, 3).unwrap(),
            locations,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn renders_header_and_location_sections() {
        let html = render_report_html(&report(vec![location("Depot", 4)]));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Acme &amp; Sons</h1>"));
        assert!(html.contains("March 2025"));
        assert!(html.contains("<h2>Depot</h2>"));
        assert!(html.contains("4.2 / 5") || html.contains("4.3 / 5"));
        assert!(html.contains("3 (75.0%)"));
        assert!(html.contains("Drivers &lt;always&gt; on time &amp; polite"));
        assert!(html.contains("He was &quot;early&quot;"));
        assert!(html.ends_with("</body></html>"));
    }

    #[test]
    fn blank_names_get_positional_labels() {
        let html = render_report_html(&report(vec![location("Depot", 1), location(" ", 1)]));
        assert!(html.contains("<h2>Location 2</h2>"));
    }

    #[test]
    fn zero_review_locations_are_left_out() {
        let html = render_report_html(&report(vec![
            location("Quiet", 0),
            location("Depot", 2),
            location(" ", 3),
        ]));
        assert!(!html.contains("Quiet"));
        assert!(html.contains("<h2>Depot</h2>"));
        assert!(html.contains("<h2>Location 2</h2>"));
        assert_eq!(html.matches("Average rating").count(), 2);
    }
}
