use crate::error::{ErrorKind, Result};
use crate::{ArtifactKind, ArtifactStore};
use exn::ResultExt;
use std::fmt;
use std::path::{Path, PathBuf};

/// A temporary file or directory that is removed when the guard is dropped.
///
/// Use [`release()`](Self::release) to clean up explicitly and observe
/// failures, or [`persist()`](Self::persist) to keep the file under a new
/// name.
pub struct Artifact {
    id: u64,
    path: PathBuf,
    kind: ArtifactKind,
    store: ArtifactStore,
}

impl Artifact {
    pub(crate) fn new(id: u64, path: PathBuf, kind: ArtifactKind, store: ArtifactStore) -> Self {
        Self { id, path, kind, store }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Whether the artifact still exists as far as its store is concerned.
    pub fn is_pending(&self) -> bool {
        self.store.is_pending(self.id)
    }

    /// Remove the artifact from disk now.
    pub fn release(self) -> Result<()> {
        self.store.release_id(self.id)
        // Drop runs next and finds nothing left to do.
    }

    /// Atomically rename a file artifact to `dest`, which must be on the same
    /// filesystem. If the rename fails the artifact is removed as usual and
    /// `dest` is left untouched.
    pub fn persist(self, dest: impl AsRef<Path>) -> Result<()> {
        self.store.persist_id(self.id, dest.as_ref())
    }

    /// List the regular files inside a directory artifact, sorted by file name.
    ///
    /// Hidden entries (names starting with `.`) and subdirectories are skipped.
    /// Sorting is lexicographic, so zero-padded numbering sorts numerically.
    pub fn visible_files(&self) -> Result<Vec<PathBuf>> {
        if !self.kind.is_dir() {
            exn::bail!(ErrorKind::NotDirectory(self.path.clone()));
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.path).or_raise(|| ErrorKind::Io)? {
            let entry = entry.or_raise(|| ErrorKind::Io)?;
            if entry.file_name().as_encoded_bytes().starts_with(b".") {
                continue;
            }
            if !entry.file_type().or_raise(|| ErrorKind::Io)?.is_file() {
                continue;
            }
            files.push(entry.path());
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if let Err(err) = self.store.release_id(self.id) {
            tracing::warn!(path = %self.path.display(), error = ?err, "Could not remove artifact");
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Deref;

    #[test]
    fn visible_files_sorted_without_hidden() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(root.path());
        let batch = store.acquire(ArtifactKind::Batch, "").unwrap();
        for name in ["page-0010.tiff", "page-0002.tiff", ".lockfile", "page-0001.tiff"] {
            std::fs::write(batch.path().join(name), name).unwrap();
        }
        std::fs::create_dir(batch.path().join("page-0003.tiff")).unwrap();

        let names: Vec<_> = batch
            .visible_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["page-0001.tiff", "page-0002.tiff", "page-0010.tiff"]);
    }

    #[test]
    fn visible_files_empty_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(root.path());
        let batch = store.acquire(ArtifactKind::Batch, "").unwrap();
        assert!(batch.visible_files().unwrap().is_empty());
    }

    #[test]
    fn visible_files_requires_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(root.path());
        let page = store.acquire(ArtifactKind::Page, ".tiff").unwrap();
        let err = page.visible_files().unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::NotDirectory(_)));
    }
}
