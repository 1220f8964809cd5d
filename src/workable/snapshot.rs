//! Disk snapshot of the full candidate list.
//! Survives restarts and is shared by every process on the host. By default a
//! present, parseable file is trusted regardless of age; `max_age` adds a TTL
//! based on the file's modification time.
//! Writes go to a uniquely named sibling temp file and are renamed into place,
//! so readers never see a half-written snapshot and concurrent writers in one
//! process never share a temp file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Candidate;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot encode/decode error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct SnapshotStore {
    path: PathBuf,
    max_age: Option<Duration>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, max_age: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. Missing, stale or unreadable files are all a miss.
    pub async fn load(&self) -> Option<Vec<Candidate>> {
        match self.try_load().await {
            Ok(Some(candidates)) => Some(candidates),
            Ok(None) => {
                debug!(path = %self.path.display(), "no usable candidate snapshot");
                None
            }
            Err(e) => {
                warn!(error = %e, "candidate snapshot unreadable, treating as missing");
                None
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces IO and parse failures.
    /// `Ok(None)` means the file is absent or older than `max_age`.
    pub async fn try_load(&self) -> Result<Option<Vec<Candidate>>, SnapshotError> {
        if let Some(max_age) = self.max_age {
            match tokio::fs::metadata(&self.path).await {
                Ok(meta) => {
                    let age = meta
                        .modified()
                        .ok()
                        .and_then(|m| m.elapsed().ok())
                        .unwrap_or_default();
                    if age > max_age {
                        info!(
                            path = %self.path.display(),
                            age_secs = age.as_secs(),
                            max_age_secs = max_age.as_secs(),
                            "candidate snapshot is stale"
                        );
                        return Ok(None);
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(self.io_err(e)),
            }
        }

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        let candidates: Vec<Candidate> = serde_json::from_slice(&bytes)?;
        Ok(Some(candidates))
    }

    /// Overwrite the snapshot with `candidates`.
    pub async fn save(&self, candidates: &[Candidate]) -> Result<(), SnapshotError> {
        let bytes = serde_json::to_vec(candidates)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_err(e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.io_err(e));
        }
        debug!(path = %self.path.display(), bytes = bytes.len(), "candidate snapshot written");
        Ok(())
    }

    /// Delete the snapshot so the next cached read goes upstream.
    pub async fn remove(&self) -> Result<(), SnapshotError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workable::testing::candidate;

    fn sample() -> Vec<Candidate> {
        vec![
            candidate("1", "Brand Manager", "BM", "Applied", false),
            candidate("2", "Brand Manager", "BM", "CEO Review", true),
        ]
    }

    #[tokio::test]
    async fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("none.json"), None);
        assert!(store.try_load().await.unwrap().is_none());
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snap.json"), None);
        store.save(&sample()).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, sample());
        // no temp file left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn unknown_upstream_fields_survive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(
            &path,
            r#"[{"id":"9","name":"N","email":"e","job":{"id":"j","title":"T","shortcode":"S"},
                "stage":"Applied","sourced":false,"created_at":"x","phone":"+30 123","tags":["a"]}]"#,
        )
        .unwrap();
        let store = SnapshotStore::new(&path, None);
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded[0].extra["phone"], "+30 123");

        store.save(&loaded).await.unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["tags"][0], "a");
        assert!(raw[0].get("profile_url").is_none());
    }

    #[tokio::test]
    async fn malformed_file_is_absorbed_by_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = SnapshotStore::new(&path, None);

        assert!(matches!(store.try_load().await, Err(SnapshotError::Json(_))));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn max_age_makes_old_file_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        SnapshotStore::new(&path, None).save(&sample()).await.unwrap();

        let fresh = SnapshotStore::new(&path, Some(Duration::from_secs(3600)));
        assert!(fresh.load().await.is_some());

        std::thread::sleep(Duration::from_millis(20));
        let strict = SnapshotStore::new(&path, Some(Duration::from_millis(1)));
        assert!(strict.load().await.is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snap.json"), None);
        store.save(&sample()).await.unwrap();
        store.remove().await.unwrap();
        store.remove().await.unwrap();
        assert!(store.load().await.is_none());
    }

    #[test]
    fn temp_paths_are_unique_per_write() {
        let store = SnapshotStore::new("/var/cache/snap.json", None);
        let (a, b) = (store.tmp_path(), store.tmp_path());
        assert_ne!(a, b);
        assert_eq!(a.parent(), store.path().parent());
    }

    #[tokio::test]
    async fn concurrent_saves_leave_one_whole_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snap.json"), None);
        let big: Vec<Candidate> = (0..500)
            .map(|i| candidate(&i.to_string(), "Ops Lead", "OPS", "Applied", false))
            .collect();
        let small = sample();

        let (r1, r2) = tokio::join!(store.save(&big), store.save(&small));
        r1.unwrap();
        r2.unwrap();

        let loaded = store.try_load().await.unwrap().unwrap();
        assert!(loaded == big || loaded == small);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nope/snap.json"), None);
        assert!(matches!(
            store.save(&sample()).await,
            Err(SnapshotError::Io { .. })
        ));
    }
}
