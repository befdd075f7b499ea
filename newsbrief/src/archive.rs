use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::ArchiveError;

/// Base file name for the archive of `date`, e.g. "news_brief_20261019.txt".
pub fn archive_file_name(date: NaiveDate, sequence: u32) -> String {
    let stamp = date.format("%Y%m%d");
    if sequence <= 1 {
        format!("news_brief_{}.txt", stamp)
    } else {
        format!("news_brief_{}_{}.txt", stamp, sequence)
    }
}

/// Write `contents` under `dir`. An existing archive for the same day is never
/// overwritten; later runs get a `_2`, `_3`, ... suffix.
pub async fn save_brief(dir: &Path, date: NaiveDate, contents: &str) -> Result<PathBuf, ArchiveError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ArchiveError {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut sequence = 1;
    loop {
        let path = dir.join(archive_file_name(date, sequence));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                let written = async {
                    file.write_all(contents.as_bytes()).await?;
                    file.flush().await?;
                    Ok::<(), std::io::Error>(())
                }
                .await;
                written.map_err(|source| ArchiveError {
                    path: path.clone(),
                    source,
                })?;
                info!(path = %path.display(), "brief archived");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => sequence += 1,
            Err(source) => return Err(ArchiveError { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn file_names() {
        assert_eq!(archive_file_name(day(), 1), "news_brief_20261019.txt");
        assert_eq!(archive_file_name(day(), 3), "news_brief_20261019_3.txt");
    }

    #[tokio::test]
    async fn same_day_runs_do_not_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let briefs = dir.path().join("briefs");

        let first = save_brief(&briefs, day(), "first").await.expect("first save");
        let second = save_brief(&briefs, day(), "second").await.expect("second save");

        assert_eq!(first.file_name().unwrap(), "news_brief_20261019.txt");
        assert_eq!(second.file_name().unwrap(), "news_brief_20261019_2.txt");
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "second");
    }
}
