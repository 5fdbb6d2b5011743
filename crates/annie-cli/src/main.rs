mod export;
mod list;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use annie_client::AnnieClient;
use annie_core::AppConfig;
use export::{ExportOptions, ExportSummary};

#[derive(Debug, Parser)]
#[command(name = "annie")]
#[command(about = "Export App Annie reviews and daily sales to CSV")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export reviews and sales for every account (the default)
    Export {
        /// Keep existing `Numbers *.csv` files; new rows are appended
        #[arg(long)]
        no_clean: bool,
        /// Skip the report generator even when `ANNIE_RUN_REPORT` is set
        #[arg(long)]
        no_report: bool,
        /// Export a single account by id
        #[arg(long)]
        account: Option<String>,
    },
    /// Delete `Numbers *.csv` files from the output directory
    Clean,
    /// List accounts visible to the API key
    Accounts,
    /// List the products of one account
    Apps {
        /// Account id (see `annie accounts`)
        #[arg(long)]
        account: String,
    },
}

impl Commands {
    fn default_export() -> Self {
        Self::Export {
            no_clean: false,
            no_report: false,
            account: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = annie_core::load_app_config().context("failed to load configuration")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let command = cli.command.unwrap_or_else(Commands::default_export);

    match command {
        Commands::Export {
            no_clean,
            no_report,
            account,
        } => {
            let client = build_client(&config)?;
            let corrections = annie_core::load_corrections(&config.corrections_path)
                .context("failed to load corrections")?;
            let options = ExportOptions::from_config(&config, no_clean, no_report, account);
            tracing::info!(
                output_dir = %options.output_dir.display(),
                clean = options.clean,
                run_report = options.run_report,
                "starting export"
            );
            let summary = export::run_export(&client, &config, &corrections, &options).await?;
            print_summary(&summary);
        }
        Commands::Clean => {
            let removed = export::clean_outputs(&config.output_dir)?;
            println!(
                "removed {removed} sales file(s) from {}",
                config.output_dir.display()
            );
        }
        Commands::Accounts => list::run_list_accounts(&build_client(&config)?).await?,
        Commands::Apps { account } => {
            list::run_list_apps(&build_client(&config)?, &account).await?;
        }
    }

    Ok(())
}

fn build_client(config: &AppConfig) -> anyhow::Result<AnnieClient> {
    AnnieClient::with_base_url(
        &config.api_key,
        config.request_timeout_secs,
        &config.base_url,
    )
    .context("failed to build App Annie client")
}

fn print_summary(summary: &ExportSummary) {
    println!(
        "\nexported {} product(s) across {} account(s); skipped {}",
        summary.products_exported, summary.accounts, summary.products_skipped
    );
    println!(
        "wrote {} review row(s) and {} sales row(s); applied {} correction(s); removed {} stale file(s)",
        summary.review_rows, summary.sales_rows, summary.corrections_applied, summary.files_removed
    );
}
