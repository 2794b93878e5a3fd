//! The per-client monthly run.
//!
//! Clients are processed one at a time. For each: skip or replace an existing
//! report, resolve the locations it owns, fetch and analyse each location's
//! month of reviews, save one report, then render and email it best-effort.
//! A failure is confined to the location or client it happened in.

use std::time::Instant;

use chrono_tz::Tz;
use revdb_analysis::{prepare_batch, BatchAnalyzer};
use revdb_core::{format_month, month_label, resolve_timezone, Client, MonthPeriod};
use revdb_listing::{fetch_reviews_for_month, ListingApi, Location};

use crate::error::MonthlyError;
use crate::render::render_report_html;
use crate::report::{ClientReport, LocationReport};
use crate::summary::ProcessingSummary;
use crate::{LocationDirectory, Mailer, PdfRenderer, ReportStore};

/// Terminal state of a client that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOutcome {
    Succeeded,
    /// A report already existed and reprocessing was not forced.
    Skipped,
}

/// Collaborators for one run. PDF and email stages are disabled when their
/// collaborator is absent.
pub struct MonthlyOrchestrator<'a> {
    pub listing: &'a dyn ListingApi,
    pub store: &'a dyn ReportStore,
    pub directory: &'a dyn LocationDirectory,
    pub analyzer: &'a dyn BatchAnalyzer,
    pub pdf: Option<&'a dyn PdfRenderer>,
    pub mailer: Option<&'a dyn Mailer>,
    /// Zone for locations whose configured zone is missing or unknown.
    pub default_tz: Tz,
}

/// What one client contributed to the run totals.
#[derive(Debug, Default)]
struct ClientTally {
    locations: usize,
    reviews: usize,
    reviews_analyzed: usize,
    pdfs: usize,
    emails: usize,
}

impl MonthlyOrchestrator<'_> {
    /// Runs every client in `clients` for `period` and returns the totals.
    pub async fn run(
        &self,
        clients: &[Client],
        period: &MonthPeriod,
        force_reprocess: bool,
    ) -> ProcessingSummary {
        let started = Instant::now();
        let month = format_month(period);
        let mut summary = ProcessingSummary::new(month.clone());

        tracing::info!(month = %month, clients = clients.len(), force_reprocess, "monthly run starting");

        for client in clients {
            summary.clients_processed += 1;
            let mut tally = ClientTally::default();

            match self
                .process_client(client, period, force_reprocess, &mut tally)
                .await
            {
                Ok(ClientOutcome::Succeeded) => {
                    summary.clients_succeeded += 1;
                    tracing::info!(client_id = client.id, client = %client.name, "client report complete");
                }
                Ok(ClientOutcome::Skipped) => {
                    summary.clients_skipped += 1;
                    tracing::info!(client_id = client.id, client = %client.name, "report exists; skipping");
                }
                Err(e) => {
                    tracing::error!(client_id = client.id, client = %client.name, error = %e, "client failed");
                    summary.record_failure(client.id, &client.name, e.to_string());
                }
            }

            summary.total_locations += tally.locations;
            summary.total_reviews += tally.reviews;
            summary.total_reviews_analyzed += tally.reviews_analyzed;
            summary.pdfs_generated += tally.pdfs;
            summary.emails_sent += tally.emails;
        }

        summary.elapsed = started.elapsed();
        tracing::info!(
            month = %month,
            succeeded = summary.clients_succeeded,
            failed = summary.clients_failed,
            skipped = summary.clients_skipped,
            elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            "monthly run finished"
        );
        summary
    }

    async fn process_client(
        &self,
        client: &Client,
        period: &MonthPeriod,
        force_reprocess: bool,
        tally: &mut ClientTally,
    ) -> Result<ClientOutcome, MonthlyError> {
        let existing = self
            .store
            .find_report(client.id, period)
            .await
            .map_err(MonthlyError::ReportLookup)?;

        if let Some(report) = existing {
            if !force_reprocess {
                return Ok(ClientOutcome::Skipped);
            }
            tracing::info!(client_id = client.id, report_id = report.report_id, "deleting existing report");
            self.store
                .delete_report(report.report_id)
                .await
                .map_err(|source| MonthlyError::ReportDelete {
                    report_id: report.report_id,
                    source,
                })?;
        }

        let owned = self.owned_locations(client).await?;
        tally.locations = owned.len();

        let mut reports = Vec::new();
        let mut analysed_any = false;

        for (location, tz) in &owned {
            let month_reviews =
                match fetch_reviews_for_month(self.listing, location, period, *tz).await {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(
                            client_id = client.id,
                            location = %location.name,
                            error = %e,
                            "review fetch failed; skipping location"
                        );
                        continue;
                    }
                };

            let review_count = month_reviews.reviews.len();
            tally.reviews += review_count;
            let batch = prepare_batch(month_reviews.reviews, location, client, period);

            if review_count == 0 {
                reports.push(LocationReport::empty(&batch));
                continue;
            }

            match self.analyzer.analyze(&batch).await {
                Ok(result) => {
                    tally.reviews_analyzed += review_count;
                    analysed_any = true;
                    reports.push(LocationReport::analysed(&batch, result));
                }
                Err(e) => {
                    tracing::warn!(
                        client_id = client.id,
                        location = %batch.location_name,
                        error = %e,
                        "analysis failed; leaving location out of report"
                    );
                }
            }
        }

        if reports.is_empty() {
            return Err(MonthlyError::NoReviews);
        }

        let document = serde_json::to_value(&reports).map_err(MonthlyError::Encode)?;
        let report_id = self
            .store
            .save_report(client.id, period, &document)
            .await
            .map_err(MonthlyError::ReportSave)?;
        tracing::info!(client_id = client.id, report_id, locations = reports.len(), "report saved");

        if analysed_any {
            let report = ClientReport {
                client: client.clone(),
                period: *period,
                locations: reports,
            };
            self.deliver(&report, tally).await;
        } else {
            tracing::info!(client_id = client.id, "no location analysed; skipping PDF");
        }

        Ok(ClientOutcome::Succeeded)
    }

    /// Locations across every account that belong to `client`, each with the
    /// zone its month is measured in.
    async fn owned_locations(&self, client: &Client) -> Result<Vec<(Location, Tz)>, MonthlyError> {
        let accounts = self
            .listing
            .list_accounts()
            .await
            .map_err(MonthlyError::Accounts)?;
        if accounts.is_empty() {
            return Err(MonthlyError::NoAccounts);
        }

        let mut owned = Vec::new();
        for account in &accounts {
            let locations = match self.listing.list_locations(account).await {
                Ok(locations) => locations,
                Err(e) => {
                    tracing::warn!(client_id = client.id, account = %account, error = %e, "failed to list locations");
                    continue;
                }
            };

            for location in locations {
                if let Some(tz) = self.ownership(client, &location).await {
                    owned.push((location, tz));
                }
            }
        }

        if owned.is_empty() {
            return Err(MonthlyError::NoOwnedLocations {
                client_id: client.id,
            });
        }
        tracing::debug!(client_id = client.id, locations = owned.len(), "owned locations resolved");
        Ok(owned)
    }

    /// `Some(zone)` when `location` belongs to `client`.
    async fn ownership(&self, client: &Client, location: &Location) -> Option<Tz> {
        match location.client_id {
            Some(id) if id == client.id => {
                return Some(resolve_timezone(location.time_zone.as_deref(), self.default_tz));
            }
            Some(_) => return None,
            None => {}
        }

        match self
            .directory
            .find_location_config(&location.name, &location.postal_code)
            .await
        {
            Ok(Some(config)) if config.client_id == client.id => Some(resolve_timezone(
                config.time_zone.as_deref(),
                self.default_tz,
            )),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    client_id = client.id,
                    location = %location.name,
                    error = %e,
                    "location config lookup failed"
                );
                None
            }
        }
    }

    async fn deliver(&self, report: &ClientReport, tally: &mut ClientTally) {
        let client = &report.client;
        let Some(pdf_renderer) = self.pdf else {
            tracing::debug!(client_id = client.id, "PDF rendering disabled");
            return;
        };

        let html = render_report_html(report);
        let pdf = match pdf_renderer.render_pdf(&html).await {
            Ok(pdf) => {
                tally.pdfs += 1;
                pdf
            }
            Err(e) => {
                tracing::warn!(client_id = client.id, error = %e, "PDF rendering failed");
                return;
            }
        };

        let Some(recipient) = client.notification_email() else {
            tracing::info!(client_id = client.id, "no report email configured; not sending");
            return;
        };
        let Some(mailer) = self.mailer else {
            tracing::debug!(client_id = client.id, "email delivery disabled");
            return;
        };

        let label = month_label(&report.period);
        match mailer
            .send_monthly_report(&client.name, recipient, &label, &pdf)
            .await
        {
            Ok(()) => {
                tally.emails += 1;
                tracing::info!(client_id = client.id, recipient, "report emailed");
            }
            Err(e) => {
                tracing::warn!(client_id = client.id, recipient, error = %e, "report email failed");
            }
        }
    }
}
