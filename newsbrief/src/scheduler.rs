//! Calendar scheduler: run the pipeline every N days at a fixed local time.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::future::Future;
use tokio::select;
use tracing::{error, info};

use crate::error::RunError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    every_days: u32,
    at: NaiveTime,
}

impl Schedule {
    pub fn new(every_days: u32, at: NaiveTime) -> Result<Self, String> {
        if every_days == 0 {
            return Err("interval must be at least one day".to_string());
        }
        Ok(Self { every_days, at })
    }

    pub fn every_days(&self) -> u32 {
        self.every_days
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    fn interval(&self) -> ChronoDuration {
        ChronoDuration::days(i64::from(self.every_days))
    }

    /// Next occurrence of the time of day: today if still ahead, otherwise tomorrow.
    pub fn first_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }

    /// Instant following `previous`. Instants already in the past are skipped,
    /// never caught up.
    pub fn next_after(&self, previous: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
        let mut next = previous + self.interval();
        while next <= now {
            next += self.interval();
        }
        next
    }
}

/// Parse a "HH:MM" 24h wall-clock time.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("invalid time '{}': {}", s, e))
}

/// Sleep until each scheduled instant and run `job`, one run at a time, until
/// `shutdown` resolves. A failed run is logged and does not stop the loop.
pub async fn run_forever<F, Fut, S>(schedule: Schedule, mut job: F, shutdown: S)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), RunError>>,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut next = schedule.first_run_after(Local::now().naive_local());

    loop {
        info!(next_run = %next, "scheduler: waiting for next run");
        let wait = (next - Local::now().naive_local())
            .to_std()
            .unwrap_or_default();

        select! {
            _ = tokio::time::sleep(wait) => {},
            _ = &mut shutdown => {
                info!("scheduler: shutdown requested, exiting loop");
                return;
            }
        }

        run_and_log(&mut job).await;
        next = schedule.next_after(next, Local::now().naive_local());
    }
}

/// Execute one scheduled run, containing any failure.
pub async fn run_and_log<F, Fut>(job: &mut F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), RunError>>,
{
    let started = Local::now();
    info!(at = %started.format("%Y-%m-%d %H:%M:%S"), "scheduler: run starting");

    match job().await {
        Ok(()) => {
            info!(
                at = %Local::now().format("%Y-%m-%d %H:%M:%S"),
                "scheduler: run completed successfully"
            );
            true
        }
        Err(e) => {
            error!(%e, "scheduler: run failed");
            false
        }
    }
}
