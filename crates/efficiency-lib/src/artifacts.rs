//! Durable artifact storage
//!
//! Artifacts are bincode envelopes carrying the schema id of the feature
//! list they were written against and a SHA256 checksum of the payload.
//! Both are verified on load so a stale or damaged file is rejected before
//! anything is served from it.

use crate::error::{Error, ErrorKind, Result};
use crate::models::FEATURE_NAMES;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fixed artifact file names
pub mod names {
    pub const X_TRAIN: &str = "X_train.bin";
    pub const X_TEST: &str = "X_test.bin";
    pub const Y_TRAIN: &str = "y_train.bin";
    pub const Y_TEST: &str = "y_test.bin";
    pub const SCALER: &str = "scaler.bin";
    pub const MODEL: &str = "model.bin";
    pub const METRICS: &str = "metrics.json";
}

/// Advisory lock file held for the duration of a batch run
pub const LOCK_FILE: &str = ".pipeline.lock";

const SCHEMA_PREFIX: &str = "efficiency-v1:";

/// Schema id derived from the feature list
pub fn schema_id() -> String {
    let mut hasher = Sha256::new();
    hasher.update(SCHEMA_PREFIX.as_bytes());
    hasher.update(FEATURE_NAMES.join(",").as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    schema: String,
    checksum: String,
    payload: Vec<u8>,
}

/// Serialize `value` into an artifact at `path`.
///
/// The file is written under a temporary name and renamed into place.
pub fn save_artifact<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let payload = bincode::serialize(value).map_err(|e| {
        Error::new(
            ErrorKind::Io,
            format!("Failed to serialize artifact {}: {}", path.display(), e),
        )
    })?;
    let envelope = Envelope {
        schema: schema_id(),
        checksum: compute_checksum(&payload),
        payload,
    };
    let bytes = bincode::serialize(&envelope).map_err(|e| {
        Error::new(
            ErrorKind::Io,
            format!("Failed to serialize artifact {}: {}", path.display(), e),
        )
    })?;

    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, &bytes)?;
    fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), size = bytes.len(), "Artifact written");
    Ok(())
}

/// Load and verify the artifact at `path`
pub fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::artifact_missing(&path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let envelope: Envelope = bincode::deserialize(&bytes).map_err(|e| {
        Error::new(
            ErrorKind::ArtifactCorrupt,
            format!("Artifact {} is not a valid envelope: {}", path.display(), e),
        )
    })?;

    let expected_schema = schema_id();
    if envelope.schema != expected_schema {
        return Err(Error::new(
            ErrorKind::SchemaMismatch,
            format!(
                "Artifact {} was written for schema {}, expected {}",
                path.display(),
                envelope.schema,
                expected_schema
            ),
        ));
    }

    let computed = compute_checksum(&envelope.payload);
    if computed != envelope.checksum {
        return Err(Error::new(
            ErrorKind::ArtifactCorrupt,
            format!(
                "Checksum mismatch for {}: expected {}, got {}",
                path.display(),
                envelope.checksum,
                computed
            ),
        ));
    }

    bincode::deserialize(&envelope.payload).map_err(|e| {
        Error::new(
            ErrorKind::ArtifactCorrupt,
            format!("Failed to decode artifact {}: {}", path.display(), e),
        )
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Directory of named artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open the store, creating the directory if needed
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(dir);
        fs::create_dir_all(&store.dir).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("Failed to create artifact directory {}: {}", store.dir.display(), e),
            )
            .with_source(e)
        })?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        save_artifact(&self.path(name), value)
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        load_artifact(&self.path(name))
    }

    /// Take the run lock on this directory
    pub fn lock(&self) -> Result<RunLock> {
        RunLock::acquire(&self.dir)
    }
}

/// Advisory lock serializing batch runs against one artifact directory.
///
/// Released when dropped. A lock left behind by a killed process has to be
/// removed by hand.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        Self::acquire_with(dir, |file| writeln!(file, "{}", std::process::id()))
    }

    /// Create the lock file, then let `stamp` write its contents. The guard
    /// exists before `stamp` runs, so a failed write still removes the file.
    fn acquire_with(
        dir: &Path,
        stamp: impl FnOnce(&mut File) -> std::io::Result<()>,
    ) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::new(
                        ErrorKind::ConcurrentRun,
                        format!(
                            "Another run holds {}; remove it if no run is active",
                            path.display()
                        ),
                    )
                } else {
                    Error::from(e)
                }
            })?;
        let lock = Self { path };
        stamp(&mut file)?;

        info!(lock = %lock.path.display(), "Run lock acquired");
        Ok(lock)
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
