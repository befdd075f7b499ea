/*
newsbrief-scheduler - resident driver.
Runs the full pipeline every N days at a fixed local time until Ctrl-C.
The configuration is reloaded for every run so edits apply without a restart.
*/

use clap::Parser;
use common::Config;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use newsbrief::error::RunError;
use newsbrief::pipeline::{ArchivePolicy, RunOptions, Services};
use newsbrief::scheduler::{self, parse_time_of_day, Schedule};

#[derive(Parser, Debug)]
#[command(name = "newsbrief-scheduler", about = "Run the news brief on a fixed calendar interval")]
struct Args {
    /// Path to config.json (config.toml is accepted too)
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,

    /// Defaults layered underneath --config
    #[arg(long, value_name = "FILE", default_value = "config.default.json")]
    default_config: PathBuf,

    /// Days between runs
    #[arg(long, default_value_t = 3)]
    every_days: u32,

    /// Local wall-clock time of each run, "HH:MM"
    #[arg(long, default_value = "08:00", value_parser = parse_time_of_day)]
    at: chrono::NaiveTime,

    /// Run once immediately before entering the schedule
    #[arg(long)]
    run_now: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// One scheduled pass. Every failure is returned, never fatal to the loop.
async fn scheduled_run(default_config: PathBuf, config_path: PathBuf) -> Result<(), RunError> {
    let config =
        Config::load_with_defaults(Some(default_config.as_path()), Some(config_path.as_path()))
            .await?;
    let services = Services::from_config(&config)?;
    let options = RunOptions {
        print_console: true,
        archive: ArchivePolicy::Always,
    };
    let report = services.run(&config, options).await?;
    info!(
        articles = report.brief.article_count(),
        emailed = report.emailed,
        "scheduled brief produced"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    if let Err(e) = dotenv::dotenv() {
        tracing::debug!("no .env loaded: {}", e);
    }

    let schedule = Schedule::new(args.every_days, args.at).map_err(|e| {
        error!(%e, "invalid schedule");
        anyhow::anyhow!(e)
    })?;

    info!(
        every_days = schedule.every_days(),
        at = %schedule.at().format("%H:%M"),
        "news brief scheduler started, press Ctrl-C to stop"
    );

    let default_config = args.default_config.clone();
    let config_path = args.config.clone();
    let mut job = move || scheduled_run(default_config.clone(), config_path.clone());

    if args.run_now {
        info!("running immediately (--run-now)");
        scheduler::run_and_log(&mut job).await;
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(%e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    scheduler::run_forever(schedule, job, shutdown).await;

    info!("scheduler stopped by user");
    Ok(())
}
