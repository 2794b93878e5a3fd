use std::fmt::Write as _;

use chrono::Utc;
use chrono_tz::Tz;
use revdb_analysis::{Analyzer, AnalyzerConfig, OpenAiGenerator, RetryPolicy};
use revdb_core::{format_month, parse_month, previous_month, AppConfig, Client, MonthPeriod};
use revdb_listing::{BusinessProfileClient, ListingEndpoints};
use revdb_monthly::{
    select_retry_clients, HttpPdfRenderer, Mailer, MonthlyOrchestrator, PdfRenderer, PgStore,
    ProcessingSummary, RetryTracker, RetryTracking, SendGridMailer,
};
use tracing::Instrument as _;

/// Options for one `monthly run` invocation.
#[derive(Debug, Default)]
pub(crate) struct MonthlyRunOptions {
    /// `YYYY-MM`; the previous calendar month when absent.
    pub target_month: Option<String>,
    pub force_reprocess: bool,
    pub retry_only: bool,
    pub summary_email: Option<String>,
    /// Empty means every client with monthly analysis enabled.
    pub client_ids: Vec<i64>,
    pub no_email: bool,
}

pub(crate) fn resolve_period(target_month: Option<&str>) -> anyhow::Result<MonthPeriod> {
    match target_month {
        Some(raw) => Ok(parse_month(raw)?),
        None => previous_month(Utc::now().date_naive())
            .ok_or_else(|| anyhow::anyhow!("could not determine the previous month")),
    }
}

fn filter_clients(clients: Vec<Client>, ids: &[i64]) -> Vec<Client> {
    if ids.is_empty() {
        return clients;
    }
    clients.into_iter().filter(|c| ids.contains(&c.id)).collect()
}

/// Run one monthly analysis pass.
pub(crate) async fn run_monthly(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    options: MonthlyRunOptions,
) -> anyhow::Result<()> {
    let period = resolve_period(options.target_month.as_deref())?;
    let month = format_month(&period);
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("monthly_run", %run_id, month = %month);

    run_monthly_inner(pool, config, options, period)
        .instrument(span)
        .await
}

async fn run_monthly_inner(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    options: MonthlyRunOptions,
    period: MonthPeriod,
) -> anyhow::Result<()> {
    let month = format_month(&period);
    let default_tz: Tz = config.default_timezone.parse().map_err(|e| {
        anyhow::anyhow!(
            "invalid default timezone {:?}: {e}",
            config.default_timezone
        )
    })?;

    let clients = revdb_db::list_clients_with_monthly_analysis(pool)
        .await
        .map_err(|e| anyhow::anyhow!("failed to list clients: {e}"))?;
    let mut clients = filter_clients(clients, &options.client_ids);

    let tracker = RetryTracker::new(&config.retry_file);
    let mut tracking = tracker.load();

    if options.retry_only {
        let selection =
            select_retry_clients(clients, &tracking, &month, config.max_retry_attempts);
        for client in &selection.eligible {
            let attempts = tracking.attempts(client.id, &month);
            println!(
                "will retry {} (id {}): attempt {}/{}",
                client.name,
                client.id,
                attempts + 1,
                config.max_retry_attempts
            );
        }
        for (client, attempts) in &selection.exhausted {
            println!(
                "skipping {} (id {}): {attempts}/{} attempts used",
                client.name, client.id, config.max_retry_attempts
            );
        }
        if selection.eligible.is_empty() {
            println!("No clients to retry for {month}");
            return Ok(());
        }
        clients = selection.eligible;
    }

    if clients.is_empty() {
        println!("No clients with monthly analysis enabled for {month}");
        return Ok(());
    }

    let listing = BusinessProfileClient::new(
        &ListingEndpoints {
            accounts_url: config.listing_accounts_url.clone(),
            locations_url: config.listing_locations_url.clone(),
            reviews_url: config.listing_reviews_url.clone(),
        },
        config.listing_access_token.as_deref(),
        config.listing_timeout_secs,
    )?;

    let generator = OpenAiGenerator::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("cannot build analysis generator: {e}"))?;
    let analyzer = Analyzer::new(
        generator,
        AnalyzerConfig {
            model_name: config.llm_model.clone(),
            ..AnalyzerConfig::default()
        },
        RetryPolicy::from_app_config(config),
    );

    let store = PgStore::new(pool.clone());
    let mailer = SendGridMailer::from_app_config(config)?;
    let pdf = if options.no_email {
        None
    } else {
        HttpPdfRenderer::from_app_config(config)?
    };
    if pdf.is_none() && !options.no_email {
        tracing::warn!("PDF service not configured; reports will be saved without delivery");
    }

    let orchestrator = MonthlyOrchestrator {
        listing: &listing,
        store: &store,
        directory: &store,
        analyzer: &analyzer,
        pdf: pdf.as_ref().map(|p| p as &dyn PdfRenderer),
        mailer: if options.no_email {
            None
        } else {
            mailer.as_ref().map(|m| m as &dyn Mailer)
        },
        default_tz,
    };

    let summary = orchestrator
        .run(&clients, &period, options.force_reprocess)
        .await;

    if !summary.failed_clients.is_empty() {
        tracking.record_failures(&month, &summary.failed_clients);
        tracker.save(&tracking);
    }

    print!(
        "{}",
        format_summary(&summary, &tracking, config.max_retry_attempts)
    );

    if let Some(recipient) = options.summary_email.as_deref() {
        match mailer.as_ref() {
            Some(mailer) => {
                if let Err(e) = mailer
                    .send_plain_text(recipient, &summary.email_subject(), &summary.email_body())
                    .await
                {
                    tracing::warn!(recipient, error = %e, "failed to send summary email");
                } else {
                    println!("summary emailed to {recipient}");
                }
            }
            None => tracing::warn!(recipient, "email not configured; summary email not sent"),
        }
    }

    Ok(())
}

/// Human-readable run summary, one line per failed client with its attempt count.
pub(crate) fn format_summary(
    summary: &ProcessingSummary,
    tracking: &RetryTracking,
    max_attempts: u32,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Monthly analysis for {}", summary.target_month);
    let _ = writeln!(out, "  clients processed: {}", summary.clients_processed);
    let _ = writeln!(out, "  succeeded:         {}", summary.clients_succeeded);
    let _ = writeln!(out, "  failed:            {}", summary.clients_failed);
    let _ = writeln!(out, "  skipped:           {}", summary.clients_skipped);
    let _ = writeln!(out, "  locations:         {}", summary.total_locations);
    let _ = writeln!(
        out,
        "  reviews:           {} ({} analysed)",
        summary.total_reviews, summary.total_reviews_analyzed
    );
    let _ = writeln!(out, "  pdfs generated:    {}", summary.pdfs_generated);
    let _ = writeln!(out, "  emails sent:       {}", summary.emails_sent);
    let _ = writeln!(out, "  elapsed:           {:.1}s", summary.elapsed.as_secs_f64());

    if !summary.failed_clients.is_empty() {
        let _ = writeln!(out, "Failed clients:");
        for failed in &summary.failed_clients {
            let attempts = tracking.attempts(failed.client_id, &summary.target_month);
            let _ = writeln!(
                out,
                "  - {} (id {}): {} [Attempt {attempts}/{max_attempts}]",
                failed.client_name, failed.client_id, failed.error
            );
        }
    }
    out
}
