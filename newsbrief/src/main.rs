/*
newsbrief - one pipeline pass.
Fetches articles per topic, summarizes them, prints and archives the brief and
optionally emails it. Exits non-zero when the run could not complete cleanly.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsbrief::error::RunError;
use newsbrief::pipeline::{ArchivePolicy, RunOptions, Services};

#[derive(Parser, Debug)]
#[command(name = "newsbrief", about = "Build today's news brief once and exit")]
struct Args {
    /// Path to config.json (config.toml is accepted too)
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,

    /// Defaults layered underneath --config
    #[arg(long, value_name = "FILE", default_value = "config.default.json")]
    default_config: PathBuf,

    /// Always write the archive file, without asking
    #[arg(long, conflicts_with = "no_save")]
    save: bool,

    /// Never write the archive file
    #[arg(long)]
    no_save: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Command-line flags win over `auto_save`; without either, ask only on a terminal.
fn archive_policy(args: &Args, auto_save: bool, interactive: bool) -> ArchivePolicy {
    if args.no_save {
        ArchivePolicy::Never
    } else if args.save || auto_save || !interactive {
        ArchivePolicy::Always
    } else {
        ArchivePolicy::Confirm
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match dotenv::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(e) => tracing::debug!("no .env loaded: {}", e),
    }

    let config = match Config::load_with_defaults(
        Some(args.default_config.as_path()),
        Some(args.config.as_path()),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e.into());
        }
    };
    info!(
        config = ?args.config,
        topics = ?config.topics,
        model = %config.model,
        "configuration loaded"
    );

    let archive = archive_policy(&args, config.auto_save, std::io::stdin().is_terminal());

    let services = Services::from_config(&config).map_err(|e| {
        error!(%e, "failed to initialize API clients");
        e
    })?;

    let options = RunOptions {
        print_console: true,
        archive,
    };

    match services.run(&config, options).await {
        Ok(report) => {
            if let Some(path) = &report.archive_path {
                info!(path = %path.display(), "brief saved");
            }
            Ok(())
        }
        Err(RunError::Mail { source, archive }) => {
            if let Some(path) = &archive {
                warn!(path = %path.display(), "email failed, archive was still written");
            }
            error!(%source, "failed to email brief");
            Err(RunError::Mail { source, archive }.into())
        }
        Err(e) => {
            error!(%e, "run failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(flags: &[&str]) -> Args {
        Args::parse_from(std::iter::once("newsbrief").chain(flags.iter().copied()))
    }

    #[test]
    fn no_save_overrides_auto_save() {
        assert_eq!(archive_policy(&args(&["--no-save"]), true, true), ArchivePolicy::Never);
        assert_eq!(archive_policy(&args(&["--no-save"]), true, false), ArchivePolicy::Never);
    }

    #[test]
    fn save_flag_and_auto_save_skip_the_prompt() {
        assert_eq!(archive_policy(&args(&["--save"]), false, true), ArchivePolicy::Always);
        assert_eq!(archive_policy(&args(&[]), true, true), ArchivePolicy::Always);
        assert_eq!(archive_policy(&args(&[]), false, true), ArchivePolicy::Confirm);
        assert_eq!(archive_policy(&args(&[]), false, false), ArchivePolicy::Always);
    }

    #[test]
    fn save_and_no_save_conflict() {
        let parsed = Args::try_parse_from(["newsbrief", "--save", "--no-save"]);
        assert!(parsed.is_err());
    }
}
