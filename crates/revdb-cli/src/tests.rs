use super::*;

#[test]
fn parses_db_ping() {
    let cli = Cli::try_parse_from(["revdb-cli", "db", "ping"]).expect("should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate() {
    let cli = Cli::try_parse_from(["revdb-cli", "db", "migrate"]).expect("should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_subcommand_is_allowed() {
    let cli = Cli::try_parse_from(["revdb-cli"]).expect("should parse");
    assert!(cli.command.is_none());
}

// ---------------------------------------------------------------------------
// monthly run
// ---------------------------------------------------------------------------

#[test]
fn monthly_run_defaults() {
    let cli = Cli::try_parse_from(["revdb-cli", "monthly", "run"]).expect("should parse");
    match cli.command {
        Some(Commands::Monthly {
            command:
                MonthlyCommands::Run {
                    month,
                    force_reprocess,
                    retry_only,
                    email_summary,
                    clients,
                    no_email,
                },
        }) => {
            assert!(month.is_none());
            assert!(!force_reprocess);
            assert!(!retry_only);
            assert!(email_summary.is_none());
            assert!(clients.is_empty());
            assert!(!no_email);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn monthly_run_with_every_flag() {
    let cli = Cli::try_parse_from([
        "revdb-cli",
        "monthly",
        "run",
        "--month",
        "2024-03",
        "--force-reprocess",
        "--retry-only",
        "--email-summary",
        "ops@example.com",
        "--clients",
        "4,7",
        "--no-email",
    ])
    .expect("should parse");

    match cli.command {
        Some(Commands::Monthly {
            command:
                MonthlyCommands::Run {
                    month,
                    force_reprocess,
                    retry_only,
                    email_summary,
                    clients,
                    no_email,
                },
        }) => {
            assert_eq!(month.as_deref(), Some("2024-03"));
            assert!(force_reprocess);
            assert!(retry_only);
            assert_eq!(email_summary.as_deref(), Some("ops@example.com"));
            assert_eq!(clients, vec![4, 7]);
            assert!(no_email);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn monthly_run_rejects_non_numeric_client_ids() {
    let result = Cli::try_parse_from(["revdb-cli", "monthly", "run", "--clients", "4,abc"]);
    assert!(result.is_err());
}

#[test]
fn parses_monthly_retries() {
    let cli = Cli::try_parse_from(["revdb-cli", "monthly", "retries", "--month", "2024-03"])
        .expect("should parse");
    assert!(matches!(
        cli.command,
        Some(Commands::Monthly {
            command: MonthlyCommands::Retries { month: Some(ref m) }
        }) if m == "2024-03"
    ));
}
