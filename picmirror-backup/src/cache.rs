use crate::types::CachedFile;
use picmirror::FileRecord;
use std::sync::Arc;

/// Holds the payload copies for the single in-flight upload cycle.
///
/// `Empty -> Populated` on [`capture`](Self::capture), back to `Empty` on
/// [`clear`](Self::clear). Snapshots share the cached files read-only; the
/// bytes are freed once the cache is cleared and the last snapshot dropped.
#[derive(Debug, Default)]
pub struct PayloadCache {
    state: CacheState,
}

#[derive(Debug, Default)]
enum CacheState {
    #[default]
    Empty,
    Populated(Arc<[CachedFile]>),
}

impl PayloadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every record's payload, replacing whatever was cached before.
    pub fn capture(&mut self, files: &[FileRecord]) {
        if files.is_empty() {
            self.state = CacheState::Empty;
            return;
        }
        let cached: Vec<CachedFile> = files.iter().map(CachedFile::capture).collect();
        self.state = CacheState::Populated(cached.into());
    }

    /// Current contents without consuming them; empty when nothing is cached.
    pub fn snapshot(&self) -> Arc<[CachedFile]> {
        match self.state {
            CacheState::Empty => Arc::from(Vec::new()),
            CacheState::Populated(ref files) => Arc::clone(files),
        }
    }

    /// Release the cached payloads. Returns how many files were held.
    pub fn clear(&mut self) -> usize {
        match std::mem::take(&mut self.state) {
            CacheState::Empty => 0,
            CacheState::Populated(files) => files.len(),
        }
    }

    /// Clear the cache only if it still holds `snapshot`. Returns the number
    /// of files released, or `None` when a newer capture has replaced it.
    pub fn release(&mut self, snapshot: &Arc<[CachedFile]>) -> Option<usize> {
        let held = match self.state {
            CacheState::Empty => return Some(0),
            CacheState::Populated(ref files) => Arc::ptr_eq(files, snapshot),
        };
        held.then(|| self.clear())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, CacheState::Empty)
    }

    pub fn len(&self) -> usize {
        match self.state {
            CacheState::Empty => 0,
            CacheState::Populated(ref files) => files.len(),
        }
    }
}
