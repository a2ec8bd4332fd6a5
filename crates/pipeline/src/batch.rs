use scandoc_artifact::Artifact;
use std::path::{Path, PathBuf};

/// One page of a capture run.
#[derive(Debug)]
pub enum Page {
    /// Captured on its own; the page owns its file.
    Scanned(Artifact),
    /// Produced by the document feeder inside a batch directory, which owns
    /// the file.
    Fed(PathBuf),
}

impl Page {
    pub fn path(&self) -> &Path {
        match self {
            Self::Scanned(artifact) => artifact.path(),
            Self::Fed(path) => path,
        }
    }
}

/// The ordered pages of one capture run.
///
/// Pages only ever get appended; the order they went in is the order they
/// come out in the document. Dropping the batch releases every scanned page.
#[derive(Debug, Default)]
pub struct CaptureBatch {
    pages: Vec<Page>,
}

impl CaptureBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.pages.iter().map(|page| page.path().to_path_buf()).collect()
    }
}

impl FromIterator<Page> for CaptureBatch {
    fn from_iter<I: IntoIterator<Item = Page>>(iter: I) -> Self {
        Self { pages: iter.into_iter().collect() }
    }
}
