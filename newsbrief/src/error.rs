//! Failure taxonomy for one pipeline run.
//!
//! Each error is contained at the smallest scope that keeps partial results:
//! a `FetchError` empties one topic, a `SummarizeError` replaces one summary,
//! a `MailError` loses only the email. `RunError` is what a whole run (or a
//! scheduled run) reports.

use std::path::PathBuf;
use thiserror::Error;

pub use common::ConfigError;

/// Search for one topic failed. Non-fatal: the topic ends up empty.
#[derive(Debug, Error)]
#[error("failed to fetch articles for topic '{topic}': {cause}")]
pub struct FetchError {
    pub topic: String,
    pub cause: String,
}

impl FetchError {
    pub fn new(topic: impl Into<String>, cause: impl ToString) -> Self {
        Self {
            topic: topic.into(),
            cause: cause.to_string(),
        }
    }
}

/// A completion call failed. Non-fatal: replaced by the fallback summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse LLM response: {0}")]
    Malformed(String),

    #[error("LLM returned an empty completion")]
    EmptyCompletion,
}

/// Sending the brief by email failed. Non-fatal for the brief itself.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build email message: {0}")]
    Build(String),

    #[error("mail credential env var '{0}' not set")]
    MissingCredential(String),

    #[error("SMTP transport failed: {0}")]
    Transport(String),
}

/// Writing the archive file failed.
#[derive(Debug, Error)]
#[error("failed to write archive {path}: {source}")]
pub struct ArchiveError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure of a whole run. The scheduler logs these and keeps going.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("brief produced but email delivery failed: {source}")]
    Mail {
        #[source]
        source: MailError,
        /// Archive written by the same run, if any
        archive: Option<PathBuf>,
    },

    #[error("archive and email both failed: {archive}; {mail}")]
    ArchiveAndMail {
        archive: ArchiveError,
        mail: MailError,
    },
}
