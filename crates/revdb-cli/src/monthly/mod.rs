//! Monthly analysis command handlers.
//!
//! `run` performs one monthly pass over every eligible client; `retries`
//! prints the failure counts carried between passes.

mod retries;
mod run;

use clap::Subcommand;

pub(crate) use retries::run_monthly_retries;
pub(crate) use run::{run_monthly, MonthlyRunOptions};

/// Sub-commands available under `monthly`.
#[derive(Debug, Subcommand)]
pub enum MonthlyCommands {
    /// Analyse every eligible client's reviews for one month
    Run {
        /// Target month as YYYY-MM (defaults to the previous month)
        #[arg(long)]
        month: Option<String>,
        /// Delete and regenerate reports that already exist
        #[arg(long)]
        force_reprocess: bool,
        /// Only process clients that failed this month and are under the retry cap
        #[arg(long)]
        retry_only: bool,
        /// Send a plain-text run summary to this address
        #[arg(long)]
        email_summary: Option<String>,
        /// Restrict the run to these client ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        clients: Vec<i64>,
        /// Save reports but do not email them
        #[arg(long)]
        no_email: bool,
    },
    /// Show tracked failures for a month
    Retries {
        /// Month as YYYY-MM (defaults to the previous month)
        #[arg(long)]
        month: Option<String>,
    },
}
