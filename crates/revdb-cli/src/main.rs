mod monthly;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::monthly::MonthlyCommands;

#[derive(Debug, Parser)]
#[command(name = "revdb-cli")]
#[command(about = "Monthly review analysis command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Monthly review analysis
    Monthly {
        #[command(subcommand)]
        command: MonthlyCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

async fn connect(config: &revdb_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = revdb_db::PoolConfig::from_app_config(config);
    revdb_db::connect_pool(&config.database_url, pool_config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = revdb_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    revdb_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = revdb_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Some(Commands::Monthly { command }) => match command {
            MonthlyCommands::Run {
                month,
                force_reprocess,
                retry_only,
                email_summary,
                clients,
                no_email,
            } => {
                let pool = connect(&config).await?;
                let options = monthly::MonthlyRunOptions {
                    target_month: month,
                    force_reprocess,
                    retry_only,
                    summary_email: email_summary,
                    client_ids: clients,
                    no_email,
                };
                monthly::run_monthly(&pool, &config, options).await?;
            }
            MonthlyCommands::Retries { month } => {
                monthly::run_monthly_retries(&config, month.as_deref())?;
            }
        },
        None => println!("revdb-cli: see --help for commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
