//! Persistent route table cache.
//!
//! The cache is a single JSON artifact holding the whole table. It is valid
//! only while nothing under the source directory is newer than the artifact:
//! a stale cache serving removed routes is far worse than an unnecessary
//! rebuild, so any doubt is treated as a miss.
//!
//! Writes go to a temporary file in the artifact's directory which is then
//! renamed over the artifact, so concurrent rebuilds never leave a torn file.
//! A rebuilt artifact is stamped with the newest source time seen before the
//! build, and dropped if the sources moved on while it was being built.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;

use crate::{RouteError, RouteTable};

/// Counter recording cache lookups, labelled `result=hit|miss`.
pub const CACHE_METRIC: &str = "switchyard_route_cache_total";

/// Why a cache lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// No artifact on disk.
    Absent,
    /// The artifact or a source could not be read.
    Unreadable,
    /// The artifact did not parse.
    Corrupt,
    /// A source is newer than the artifact.
    Stale,
}

impl MissReason {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Unreadable => "unreadable",
            Self::Corrupt => "corrupt",
            Self::Stale => "stale",
        }
    }
}

/// Cache for one route table artifact.
///
/// # Example
///
/// ```no_run
/// use switchyard_router::{source, RouteCache};
/// use std::path::Path;
///
/// # fn main() -> Result<(), switchyard_router::RouteError> {
/// let cache = RouteCache::new("storage/routes.json", "routes");
/// let table = cache.load_or_build(|| source::load_dir(Path::new("routes")))?;
/// println!("{} routes", table.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RouteCache {
    artifact: PathBuf,
    source_dir: PathBuf,
}

impl RouteCache {
    /// Creates a cache for `artifact`, invalidated by changes under `source_dir`.
    #[must_use]
    pub fn new(artifact: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact: artifact.into(),
            source_dir: source_dir.into(),
        }
    }

    /// Returns the artifact path.
    #[must_use]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Returns the source directory.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Loads the cached table, or returns `None` on any kind of miss.
    #[must_use]
    pub fn try_load(&self) -> Option<RouteTable> {
        match self.load() {
            Ok(table) => {
                metrics::counter!(CACHE_METRIC, "result" => "hit").increment(1);
                tracing::info!(
                    artifact = %self.artifact.display(),
                    routes = table.len(),
                    "route cache hit"
                );
                Some(table)
            }
            Err(reason) => {
                metrics::counter!(CACHE_METRIC, "result" => "miss").increment(1);
                tracing::info!(
                    artifact = %self.artifact.display(),
                    reason = reason.as_str(),
                    "route cache miss"
                );
                None
            }
        }
    }

    /// Loads the cached table, reporting why it missed.
    pub fn load(&self) -> Result<RouteTable, MissReason> {
        let artifact_mtime = match fs::metadata(&self.artifact) {
            Ok(meta) => meta.modified().map_err(|_| MissReason::Unreadable)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(MissReason::Absent),
            Err(_) => return Err(MissReason::Unreadable),
        };

        match newest_mtime(&self.source_dir) {
            Ok(Some(newest)) if newest > artifact_mtime => return Err(MissReason::Stale),
            Ok(_) => {}
            Err(_) => return Err(MissReason::Unreadable),
        }

        let bytes = fs::read(&self.artifact).map_err(|_| MissReason::Unreadable)?;
        RouteTable::from_json(&bytes).map_err(|e| {
            tracing::warn!(
                artifact = %self.artifact.display(),
                error = %e,
                "route cache artifact is corrupt"
            );
            MissReason::Corrupt
        })
    }

    /// Writes the whole table, atomically replacing the artifact.
    pub fn save(&self, table: &RouteTable) -> Result<(), RouteError> {
        self.write(table, None)
    }

    /// Writes the artifact, stamping it with `as_of` when given so that any
    /// source modified after that instant still reads as newer.
    fn write(&self, table: &RouteTable, as_of: Option<SystemTime>) -> Result<(), RouteError> {
        let dir = match self.artifact.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| RouteError::io(&dir, e))?;

        let bytes = table.to_json()?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| RouteError::io(&dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .and_then(|()| match as_of {
                Some(mtime) => tmp.as_file().set_modified(mtime),
                None => Ok(()),
            })
            .map_err(|e| RouteError::io(tmp.path(), e))?;
        tmp.persist(&self.artifact)
            .map_err(|e| RouteError::io(&self.artifact, e.error))?;

        tracing::info!(
            artifact = %self.artifact.display(),
            routes = table.len(),
            bytes = bytes.len(),
            "route cache written"
        );
        Ok(())
    }

    /// Returns the cached table, or builds and saves a fresh one on a miss.
    pub fn load_or_build<F>(&self, build: F) -> Result<RouteTable, RouteError>
    where
        F: FnOnce() -> Result<RouteTable, RouteError>,
    {
        if let Some(table) = self.try_load() {
            return Ok(table);
        }

        let snapshot = self.sources_mtime()?;
        let table = build()?;
        self.write(&table, snapshot)?;

        if self.sources_mtime()? != snapshot {
            tracing::warn!(
                source_dir = %self.source_dir.display(),
                "route sources changed during rebuild, discarding artifact"
            );
            self.clear()?;
        }
        Ok(table)
    }

    /// Deletes the artifact. A missing artifact is not an error.
    pub fn clear(&self) -> Result<(), RouteError> {
        match fs::remove_file(&self.artifact) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RouteError::io(&self.artifact, e)),
        }
    }

    fn sources_mtime(&self) -> Result<Option<SystemTime>, RouteError> {
        newest_mtime(&self.source_dir).map_err(|e| RouteError::io(&self.source_dir, e))
    }
}

/// Returns the newest modification time of `dir` and everything below it.
///
/// Directories count too, so deleting a source file (which touches its
/// parent) also invalidates the cache.
fn newest_mtime(dir: &Path) -> std::io::Result<Option<SystemTime>> {
    let meta = match fs::metadata(dir) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut newest = meta.modified()?;
    if meta.is_dir() {
        for entry in fs::read_dir(dir)? {
            if let Some(mtime) = newest_mtime(&entry?.path())? {
                newest = newest.max(mtime);
            }
        }
    }
    Ok(Some(newest))
}
