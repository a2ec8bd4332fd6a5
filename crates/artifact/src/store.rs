use crate::error::{ErrorKind, Result};
use crate::{Artifact, ArtifactKind};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Counters for every artifact a store has handed out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub acquired: usize,
    pub released: usize,
}

impl Stats {
    /// Artifacts acquired but not yet released.
    pub fn pending(&self) -> usize {
        self.acquired - self.released
    }
}

struct Entry {
    id: u64,
    path: PathBuf,
    kind: ArtifactKind,
}

#[derive(Default)]
struct Ledger {
    next_id: u64,
    pending: Vec<Entry>,
    stats: Stats,
    /// Set by a purge; nothing can be acquired afterwards.
    closed: bool,
}

/// Hands out [`Artifact`]s and remembers which of them still exist on disk.
///
/// Cloning is cheap and every clone shares the same ledger, so the interrupt
/// handler can hold one clone while the pipeline holds another.
#[derive(Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    ledger: Arc<Mutex<Ledger>>,
}

impl Default for ArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactStore {
    /// A store that creates artifacts in the system temporary directory.
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    /// A store that creates artifacts in `root` by default.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ledger: Arc::default() }
    }

    /// Create a uniquely named temporary file (or directory, for
    /// [`ArtifactKind::Batch`]) ending in `suffix`.
    pub fn acquire(&self, kind: ArtifactKind, suffix: &str) -> Result<Artifact> {
        self.acquire_in(&self.root, kind, suffix)
    }

    /// Like [`acquire()`](Self::acquire) but inside `dir` instead of the
    /// store's root. Used for scratch files that must live on the same
    /// filesystem as their eventual destination.
    ///
    /// Output scratch files are created like any other new file (mode 0666
    /// less the umask) rather than owner-only, since they become the output.
    pub fn acquire_in(&self, dir: &Path, kind: ArtifactKind, suffix: &str) -> Result<Artifact> {
        if self.ledger().closed {
            exn::bail!(ErrorKind::Released(dir.to_path_buf()));
        }
        let mut builder = tempfile::Builder::new();
        builder.prefix(kind.prefix()).suffix(suffix);
        #[cfg(unix)]
        if kind == ArtifactKind::Output {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let path = if kind.is_dir() {
            builder.tempdir_in(dir).or_raise(|| ErrorKind::Create(dir.to_path_buf()))?.keep()
        } else {
            let file = builder.tempfile_in(dir).or_raise(|| ErrorKind::Create(dir.to_path_buf()))?;
            let (_, path) = file.keep().or_raise(|| ErrorKind::Create(dir.to_path_buf()))?;
            path
        };

        let mut ledger = self.ledger();
        // A purge may have run while the file was being created.
        if ledger.closed {
            drop(ledger);
            remove(&path, kind)?;
            exn::bail!(ErrorKind::Released(path));
        }
        let id = ledger.next_id;
        ledger.next_id += 1;
        ledger.stats.acquired += 1;
        ledger.pending.push(Entry { id, path: path.clone(), kind });
        drop(ledger);

        tracing::trace!(id, ?kind, path = %path.display(), "Artifact acquired");
        Ok(Artifact::new(id, path, kind, self.clone()))
    }

    /// Remove every artifact that is still on disk, newest first. Returns how
    /// many were released.
    ///
    /// Guards that outlive a purge become inert: dropping or releasing them
    /// afterwards does nothing. The store is closed for good; any later
    /// acquisition fails with [`ErrorKind::Released`].
    pub fn purge(&self) -> usize {
        let entries: Vec<Entry> = {
            let mut ledger = self.ledger();
            ledger.closed = true;
            let entries: Vec<Entry> = ledger.pending.drain(..).rev().collect();
            ledger.stats.released += entries.len();
            entries
        };
        for entry in &entries {
            if let Err(err) = remove(&entry.path, entry.kind) {
                tracing::warn!(path = %entry.path.display(), error = ?err, "Could not remove artifact during purge");
            }
        }
        if !entries.is_empty() {
            tracing::debug!(count = entries.len(), "Purged pending artifacts");
        }
        entries.len()
    }

    pub fn stats(&self) -> Stats {
        self.ledger().stats
    }

    /// Release a single artifact. A no-op if it has already been released.
    pub(crate) fn release_id(&self, id: u64) -> Result<()> {
        let Some(entry) = self.take(id) else {
            return Ok(());
        };
        tracing::trace!(id, path = %entry.path.display(), "Artifact released");
        remove(&entry.path, entry.kind)
    }

    /// Move a file artifact to `dest`. Only on success does the artifact count
    /// as released; on failure it stays pending so its guard still cleans up.
    pub(crate) fn persist_id(&self, id: u64, dest: &Path) -> Result<()> {
        let mut ledger = self.ledger();
        let Some(index) = ledger.pending.iter().position(|e| e.id == id) else {
            exn::bail!(ErrorKind::Released(dest.to_path_buf()));
        };
        // Replacing a file keeps its permissions.
        if let Ok(existing) = std::fs::metadata(dest)
            && let Err(err) = std::fs::set_permissions(&ledger.pending[index].path, existing.permissions())
        {
            tracing::debug!(dest = %dest.display(), error = %err, "Could not copy permissions of replaced file");
        }
        std::fs::rename(&ledger.pending[index].path, dest).or_raise(|| ErrorKind::Persist(dest.to_path_buf()))?;
        let entry = ledger.pending.remove(index);
        ledger.stats.released += 1;
        tracing::trace!(id, from = %entry.path.display(), to = %dest.display(), "Artifact persisted");
        Ok(())
    }

    pub(crate) fn is_pending(&self, id: u64) -> bool {
        self.ledger().pending.iter().any(|e| e.id == id)
    }

    fn take(&self, id: u64) -> Option<Entry> {
        let mut ledger = self.ledger();
        let index = ledger.pending.iter().position(|e| e.id == id)?;
        ledger.stats.released += 1;
        Some(ledger.pending.remove(index))
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // A panic while holding the lock can't leave the ledger half-updated;
        // every mutation is a single push/remove plus a counter bump.
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn remove(path: &Path, kind: ArtifactKind) -> Result<()> {
    let result = match kind.is_dir() {
        true => std::fs::remove_dir_all(path),
        false => std::fs::remove_file(path),
    };
    match result {
        Ok(()) => Ok(()),
        // Something else already cleaned it up, which is all we wanted.
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).or_raise(|| ErrorKind::Release(path.to_path_buf())),
    }
}
