//! One complete run: assemble the brief, present it, archive it, mail it.

use common::Config;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::archive;
use crate::brief::{Brief, BriefAssembler};
use crate::error::RunError;
use crate::llm::remote::RemoteLlmProvider;
use crate::llm::LlmProvider;
use crate::mailer::{Mailer, OutgoingEmail, SmtpMailer};
use crate::render::Presenter;
use crate::search::{NewsSearch, PerplexitySearch};

/// Whether the archive file gets written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivePolicy {
    Always,
    Never,
    /// Ask on stdin after the brief has been printed
    Confirm,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub print_console: bool,
    pub archive: ArchivePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            print_console: true,
            archive: ArchivePolicy::Always,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub brief: Brief,
    pub archive_path: Option<PathBuf>,
    pub emailed: bool,
}

/// Remote collaborators built from the configuration and process environment.
pub struct Services {
    pub search: PerplexitySearch,
    pub llm: RemoteLlmProvider,
    pub mailer: Option<SmtpMailer>,
}

impl Services {
    /// Fails when the API key is missing from the environment. The mail
    /// password is only looked up when the brief is sent.
    pub fn from_config(config: &Config) -> Result<Self, RunError> {
        let api_key = std::env::var(&config.api.api_key_env).map_err(|_| {
            RunError::Setup(format!(
                "API key env var '{}' not set",
                config.api.api_key_env
            ))
        })?;

        let search = PerplexitySearch::new(&config.api.base_url, api_key.clone())
            .with_query_suffix(config.query_suffix.clone())
            .with_timeout(config.api.timeout_seconds);

        let llm = RemoteLlmProvider::from_base_url(&config.api.base_url, api_key, config.model.clone())
            .with_default_timeout(config.api.timeout_seconds);

        let mailer = if config.email.enabled {
            let sender = config.email.sender.clone().unwrap_or_default();
            Some(SmtpMailer::from_env(sender, config.email.password_env.clone()))
        } else {
            None
        };

        Ok(Self { search, llm, mailer })
    }

    pub async fn run(&self, config: &Config, options: RunOptions) -> Result<RunReport, RunError> {
        let mailer = self.mailer.as_ref().map(|m| m as &dyn Mailer);
        run_pipeline(config, &self.search, &self.llm, mailer, options).await
    }
}

/// Run the pipeline against the given collaborators.
///
/// The archive is written before the email is attempted. Either step failing
/// still lets the other one run; the failure is reported afterwards as
/// [`RunError::Archive`], [`RunError::Mail`] or [`RunError::ArchiveAndMail`].
pub async fn run_pipeline<S, P>(
    config: &Config,
    search: &S,
    llm: &P,
    mailer: Option<&dyn Mailer>,
    options: RunOptions,
) -> Result<RunReport, RunError>
where
    S: NewsSearch + ?Sized,
    P: LlmProvider + ?Sized,
{
    config.validate()?;
    if config.email.enabled && mailer.is_none() {
        return Err(RunError::Setup(
            "email is enabled but no mailer is configured".into(),
        ));
    }

    let brief = BriefAssembler::new(search, llm).build(config).await;

    let failed = brief.failed_topics().count();
    if failed > 0 {
        warn!(
            "{} of {} topic(s) could not be fetched",
            failed,
            brief.topics.len()
        );
    }

    let presenter = Presenter::new(config.date_format.clone());

    if options.print_console {
        println!("{}", presenter.console(&brief));
    }

    let save = match options.archive {
        ArchivePolicy::Always => true,
        ArchivePolicy::Never => false,
        ArchivePolicy::Confirm => confirm_save().await,
    };

    // archive and email are independent: one failing never skips the other
    let archived = if save {
        archive::save_brief(
            Path::new(&config.output_directory),
            brief.generated_at.date_naive(),
            &presenter.archive(&brief),
        )
        .await
        .map(Some)
    } else {
        Ok(None)
    };
    if let Err(e) = &archived {
        error!(%e, "archive failed, continuing with email");
    }

    let mailed = match (config.email.enabled, mailer) {
        (true, Some(mailer)) => {
            let body = presenter.email(&brief);
            let email = OutgoingEmail {
                from: config.email.sender.clone().unwrap_or_default(),
                to: config.email.recipient.clone().unwrap_or_default(),
                subject: body.subject,
                html_body: body.html,
                text_body: body.text,
            };
            mailer.send(&email).await.map(|()| true)
        }
        _ => Ok(false),
    };

    let (archive_path, emailed) = match (archived, mailed) {
        (Ok(path), Ok(emailed)) => (path, emailed),
        (Ok(path), Err(source)) => {
            return Err(RunError::Mail {
                source,
                archive: path,
            })
        }
        (Err(archive), Ok(emailed)) => {
            if emailed {
                info!("brief emailed despite the archive failure");
            }
            return Err(RunError::Archive(archive));
        }
        (Err(archive), Err(mail)) => return Err(RunError::ArchiveAndMail { archive, mail }),
    };

    info!(
        articles = brief.article_count(),
        topics = brief.topics.len(),
        emailed,
        "run complete"
    );

    Ok(RunReport {
        brief,
        archive_path,
        emailed,
    })
}

/// Interactive "save?" prompt. Anything but an explicit yes declines.
async fn confirm_save() -> bool {
    tokio::task::spawn_blocking(|| {
        use std::io::{BufRead, Write};

        print!("Save brief to file? (y/n): ");
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    })
    .await
    .unwrap_or(false)
}
