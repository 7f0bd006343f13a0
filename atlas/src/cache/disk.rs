//! On-disk tile store with a byte budget.
//!
//! Each tile server owns one folder; every tile is a single file named by
//! the scheme's `path_to_tile`. The store never evicts on write. Instead
//! [`DiskTileCache::evict_to_budget`] is run periodically by the
//! [`SweepDaemon`](super::SweepDaemon).
//!
//! Writes land in a dot-prefixed temporary file and are renamed into place,
//! so readers never observe a partial tile. Dot-files are invisible to the
//! sweep and to [`DiskTileCache::stats`].

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use bytes::Bytes;
use filetime::FileTime;
use tracing::{debug, trace, warn};

use super::CacheError;

/// Outcome of one eviction pass over a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
    /// Files considered.
    pub files_scanned: usize,
    /// Files deleted.
    pub files_removed: usize,
    /// Bytes reclaimed.
    pub bytes_freed: u64,
    /// Bytes still on disk afterwards.
    pub bytes_retained: u64,
    /// Wall time of the pass in milliseconds.
    pub duration_ms: u64,
}

impl fmt::Display for SweepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sweep: scanned {} files, removed {} ({} bytes freed, {} retained) in {}ms",
            self.files_scanned, self.files_removed, self.bytes_freed, self.bytes_retained, self.duration_ms
        )
    }
}

/// Size of a cache folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub files: u64,
    pub bytes: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} files, {}", self.files, format_size(self.bytes))
    }
}

/// Formats a byte count with a binary unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{:.1} {}", value, unit)
}

/// The tile store of one server.
///
/// Cheap to clone; all state lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskTileCache {
    folder: PathBuf,
    budget: u64,
}

impl DiskTileCache {
    /// Creates a store rooted at `folder`. A `budget` of 0 means unlimited.
    pub fn new(folder: impl Into<PathBuf>, budget: u64) -> Self {
        Self {
            folder: folder.into(),
            budget,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, CacheError> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(CacheError::InvalidName(name.to_string()));
        }
        Ok(self.folder.join(name))
    }

    /// Reads a tile and marks it as recently used.
    ///
    /// Returns `Ok(None)` when the tile is not cached.
    pub async fn get(&self, name: &str) -> Result<Option<Bytes>, CacheError> {
        let path = self.path_for(name)?;
        let data = blocking(move || read_and_touch(&path)).await?;
        trace!(folder = %self.folder.display(), name, hit = data.is_some(), "cache lookup");
        Ok(data.map(Bytes::from))
    }

    /// Stores a tile, replacing any previous copy atomically.
    pub async fn put(&self, name: &str, data: Bytes) -> Result<(), CacheError> {
        let path = self.path_for(name)?;
        let size = data.len();
        blocking(move || write_atomically(&path, &data)).await?;
        debug!(folder = %self.folder.display(), name, size, "cached tile");
        Ok(())
    }

    pub async fn contains(&self, name: &str) -> Result<bool, CacheError> {
        let path = self.path_for(name)?;
        blocking(move || Ok(path.is_file())).await
    }

    /// Counts the cached tiles and their total size.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let folder = self.folder.clone();
        let entries = blocking(move || list_entries(&folder)).await?;
        Ok(CacheStats {
            files: entries.len() as u64,
            bytes: entries.iter().map(|e| e.size).sum(),
        })
    }

    /// Deletes least recently used tiles until the folder fits the budget.
    ///
    /// The most recently used tile is always kept, even when it alone
    /// exceeds the budget. A budget of 0 disables eviction.
    pub async fn evict_to_budget(&self) -> Result<SweepResult, CacheError> {
        let folder = self.folder.clone();
        let budget = self.budget;
        blocking(move || sweep_folder(&folder, budget)).await
    }
}

/// Runs blocking filesystem work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, CacheError>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CacheError::SpawnError(e.to_string()))?
        .map_err(CacheError::from)
}

fn read_and_touch(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => {
            let now = FileTime::now();
            if let Err(e) = filetime::set_file_times(path, now, now) {
                // Still servable; it will just look older to the sweep.
                debug!(path = %path.display(), error = %e, "failed to refresh access time");
            }
            Ok(Some(data))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    let folder = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "tile path has no folder"))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "tile path has no name"))?;
    fs::create_dir_all(folder)?;

    let temp = folder.join(format!(".{}.{:08x}.tmp", name, rand::random::<u32>()));
    let result = fs::write(&temp, data).and_then(|()| fs::rename(&temp, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

struct Entry {
    path: PathBuf,
    size: u64,
    last_used: SystemTime,
}

/// Lists cached tiles, skipping temporary files and subfolders.
fn list_entries(folder: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(folder)? {
        let item = item?;
        if item.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let meta = match item.metadata() {
            Ok(meta) => meta,
            // Removed since the listing; nothing to account for.
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if !meta.is_file() {
            continue;
        }

        // Some filesystems are mounted noatime; `get` refreshes both times.
        let last_used = [meta.accessed().ok(), meta.modified().ok()]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(SystemTime::UNIX_EPOCH);

        entries.push(Entry {
            path: item.path(),
            size: meta.len(),
            last_used,
        });
    }
    Ok(entries)
}

fn sweep_folder(folder: &Path, budget: u64) -> io::Result<SweepResult> {
    let start = Instant::now();
    if budget == 0 {
        return Ok(SweepResult::default());
    }

    let mut entries = list_entries(folder)?;
    entries.sort_by(|a, b| b.last_used.cmp(&a.last_used));

    let mut result = SweepResult {
        files_scanned: entries.len(),
        ..SweepResult::default()
    };
    let mut running = 0u64;
    for (rank, entry) in entries.iter().enumerate() {
        running = running.saturating_add(entry.size);
        if rank == 0 || running <= budget {
            result.bytes_retained += entry.size;
            continue;
        }

        match fs::remove_file(&entry.path) {
            Ok(()) => {
                result.files_removed += 1;
                result.bytes_freed += entry.size;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "failed to evict tile");
                result.bytes_retained += entry.size;
            }
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    Ok(result)
}
