//! Snapshot files and cache freshness
//!
//! A snapshot is the raw fetch result written as a JSON array to
//! `<base>_<YYYY-MM-DD>.json`. The orchestrator reuses the newest snapshot
//! while it is younger than the configured number of whole days.

use crate::subject::RawSubject;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use wkdeck_common::{Result, WkError};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Write fetched subjects to a dated snapshot file
///
/// Refuses an empty list: an empty snapshot would look like a valid cache
/// to the next run.
pub fn write_snapshot(dir: &Path, base: &str, subjects: &[RawSubject]) -> Result<PathBuf> {
    if subjects.is_empty() {
        return Err(WkError::validation("Cannot cache empty subjects list"));
    }

    fs::create_dir_all(dir)?;

    let today = chrono::Local::now().format("%Y-%m-%d");
    let path = dir.join(format!("{base}_{today}.json"));

    write_json_atomically(&path, subjects)?;

    let size = fs::metadata(&path)?.len();
    info!(
        path = %path.display(),
        subjects = subjects.len(),
        "Data cached ({:.2} MB)",
        size as f64 / (1024.0 * 1024.0)
    );

    Ok(path)
}

/// Serialize into a hidden temp file beside `path`, then rename it into place
///
/// A failed write leaves no file under the final name, so a half-written
/// snapshot is never picked up as a cache hit.
fn write_json_atomically<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(".wkdeck-snapshot-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a snapshot as untyped records
pub fn read_snapshot(path: &Path) -> Result<Vec<Value>> {
    let file = fs::File::open(path)?;
    let records: Vec<Value> = serde_json::from_reader(BufReader::new(file))?;
    debug!(path = %path.display(), records = records.len(), "Loaded snapshot");
    Ok(records)
}

/// Newest `<base>*.json` file in `dir` by modification time
pub fn find_latest_snapshot(dir: &Path, base: &str) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_snapshot_name(&path, base) || !entry.file_type()?.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().is_none_or(|(best, _)| modified > *best) {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

fn is_snapshot_name(path: &Path, base: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(base) && name.ends_with(".json"))
}

/// Age in whole days, rounded down; timestamps in the future count as 0
pub fn age_in_days(modified: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(modified)
        .unwrap_or(Duration::ZERO)
        .as_secs()
        / SECS_PER_DAY
}

/// A snapshot is fresh while its whole-day age is strictly below the limit
pub fn is_fresh(modified: SystemTime, now: SystemTime, max_age_days: u32) -> bool {
    age_in_days(modified, now) < u64::from(max_age_days)
}

/// Result of the cache check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh { path: PathBuf, age_days: u64 },
    Stale { path: PathBuf, age_days: u64 },
    Missing,
}

impl CacheStatus {
    /// Snapshot to reuse, if any
    pub fn fresh_path(&self) -> Option<&Path> {
        match self {
            CacheStatus::Fresh { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Inspect the newest snapshot against `max_age_days`
///
/// Problems reading the directory are logged and reported as `Missing`;
/// a broken cache means "fetch again", never "abort".
pub fn check_cache(dir: &Path, base: &str, max_age_days: u32) -> CacheStatus {
    check_cache_at(dir, base, max_age_days, SystemTime::now())
}

pub fn check_cache_at(dir: &Path, base: &str, max_age_days: u32, now: SystemTime) -> CacheStatus {
    let latest = match find_latest_snapshot(dir, base) {
        Ok(Some(path)) => path,
        Ok(None) => {
            info!("No cache files found in {}", dir.display());
            return CacheStatus::Missing;
        },
        Err(e) => {
            warn!("Error checking cache in {}: {}", dir.display(), e);
            return CacheStatus::Missing;
        },
    };

    let modified = match fs::metadata(&latest).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            warn!("Cannot read modification time of {}: {}", latest.display(), e);
            return CacheStatus::Missing;
        },
    };

    let age_days = age_in_days(modified, now);
    if is_fresh(modified, now, max_age_days) {
        info!("Found fresh cache ({} days old): {}", age_days, latest.display());
        CacheStatus::Fresh {
            path: latest,
            age_days,
        }
    } else {
        info!(
            "Cache is stale ({} days old, max: {}): {}",
            age_days,
            max_age_days,
            latest.display()
        );
        CacheStatus::Stale {
            path: latest,
            age_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(SECS_PER_DAY);

    fn subject(id: i64) -> RawSubject {
        serde_json::from_value(json!({"id": id, "object": "kanji", "data": {"level": 1}})).unwrap()
    }

    fn touch(path: &Path, modified: SystemTime) {
        fs::write(path, "[]").unwrap();
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    #[test]
    fn test_age_in_days_floors() {
        let now = SystemTime::now();
        assert_eq!(age_in_days(now - DAY * 2 - Duration::from_secs(5), now), 2);
        assert_eq!(age_in_days(now - DAY + Duration::from_secs(1), now), 0);
        assert_eq!(age_in_days(now + DAY, now), 0);
    }

    #[test]
    fn test_is_fresh_boundary_is_not_fresh() {
        let now = SystemTime::now();
        assert!(is_fresh(now - DAY * 6, now, 7));
        assert!(is_fresh(now - DAY * 7 + Duration::from_secs(1), now, 7));
        assert!(!is_fresh(now - DAY * 7, now, 7));
        assert!(!is_fresh(now, now, 0));
    }

    #[test]
    fn test_write_snapshot_rejects_empty_list() {
        let dir = TempDir::new().unwrap();
        let err = write_snapshot(dir.path(), "wanikani_subjects_cache", &[]).unwrap_err();
        assert!(matches!(err, WkError::Validation(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_then_read_snapshot() {
        let dir = TempDir::new().unwrap();
        let path =
            write_snapshot(&dir.path().join("data"), "wanikani_subjects_cache", &[subject(1), subject(2)])
                .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("wanikani_subjects_cache_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "wanikani_subjects_cache_2026-10-19.json".len());

        let records = read_snapshot(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], 2);
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn test_failed_write_leaves_no_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wanikani_subjects_cache_2024-05-01.json");

        assert!(write_json_atomically(&path, &Unserializable).is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(find_latest_snapshot(dir.path(), "wanikani_subjects_cache").unwrap(), None);
    }

    #[test]
    fn test_rewrite_replaces_snapshot_without_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache_2024-05-01.json");

        write_json_atomically(&path, &json!([{"id": 1}])).unwrap();
        write_json_atomically(&path, &json!([{"id": 2}, {"id": 3}])).unwrap();

        assert_eq!(read_snapshot(&path).unwrap().len(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_find_latest_snapshot_by_mtime() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        let older = dir.path().join("cache_2024-01-02.json");
        let newer = dir.path().join("cache_2024-01-01.json");
        touch(&older, now - DAY * 3);
        touch(&newer, now - DAY);
        fs::write(dir.path().join("cache_notes.txt"), "x").unwrap();
        fs::write(dir.path().join("other_2024.json"), "[]").unwrap();

        let latest = find_latest_snapshot(dir.path(), "cache").unwrap();
        assert_eq!(latest, Some(newer));
    }

    #[test]
    fn test_check_cache_states() {
        let dir = TempDir::new().unwrap();
        let now = SystemTime::now();
        assert_eq!(check_cache_at(dir.path(), "cache", 7, now), CacheStatus::Missing);

        let path = dir.path().join("cache_2024-01-01.json");
        touch(&path, now - DAY * 7);
        assert_eq!(
            check_cache_at(dir.path(), "cache", 7, now),
            CacheStatus::Stale {
                path: path.clone(),
                age_days: 7
            }
        );

        let status = check_cache_at(dir.path(), "cache", 8, now);
        assert_eq!(status.fresh_path(), Some(path.as_path()));
    }

    #[test]
    fn test_check_cache_missing_directory() {
        let dir = TempDir::new().unwrap();
        let status = check_cache(&dir.path().join("nope"), "cache", 7);
        assert_eq!(status, CacheStatus::Missing);
    }
}
