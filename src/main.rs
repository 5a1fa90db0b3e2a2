use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod error;
mod mailer;
mod mixpanel;
mod models;
mod pipeline;
mod report;
mod score;

use crate::config::{Config, EmailConfig};
use crate::mailer::SmtpMailer;
use crate::mixpanel::InsightsClient;

#[derive(Parser)]
#[command(name = "leaderboard")]
#[command(about = "Daily reviewer productivity leaderboard from Mixpanel insights", long_about = None)]
struct Cli {
    /// Log filter (e.g. info, debug, leaderboard=trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Day to report on (YYYY-MM-DD), defaults to today in local time
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, score and email the leaderboard
    Send,
    /// Render the HTML report to a file without sending it
    Preview {
        #[arg(long, default_value = "report.html")]
        out: PathBuf,
    },
    /// Print the leaderboard to stdout
    Score {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write per-user counts and scores as CSV
    Export {
        #[arg(long, default_value = "scores.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = Config::from_env().context("missing Mixpanel configuration")?;
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let source = InsightsClient::new(config.analytics.clone())?;

    match cli.command {
        Commands::Send => {
            let email = EmailConfig::from_env().context("missing email configuration")?;
            let mailer = SmtpMailer::new(email)?;
            let report = pipeline::run(&config, &source, &mailer, date).await?;
            info!(
                users = report.records.len(),
                total_score = report.total_score,
                "Report sent"
            );
        }
        Commands::Preview { out } => {
            let report = pipeline::build_report(&config, &source, date).await?;
            std::fs::write(&out, report::build_html(&report, &config.team_name))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Score { limit } => {
            let report = pipeline::build_report(&config, &source, date).await?;
            let mut shown = report.clone();
            shown.records.truncate(limit);
            print!("{}", report::build_text(&shown, &config.team_name));
        }
        Commands::Export { out } => {
            let report = pipeline::build_report(&config, &source, date).await?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_csv(&report, file)?;
            println!("Exported {} users to {}.", report.records.len(), out.display());
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();

    Ok(())
}
