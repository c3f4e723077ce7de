use crate::types::CachedFile;
use picmirror::{DestinationId, PrimaryResult};
use std::sync::Arc;

/// One destination's share of a backup cycle: the cached files paired with
/// the names the primary upload gave them.
#[derive(Debug, Clone)]
pub struct BackupTask {
    pub destination_id: DestinationId,
    files: Arc<[CachedFile]>,
    expected_names: Vec<String>,
}

impl BackupTask {
    /// Pair cached files with primary results by index. A file without an
    /// aligned primary result keeps its cached name.
    pub fn new(
        destination_id: impl Into<DestinationId>,
        files: Arc<[CachedFile]>,
        primary_results: &[PrimaryResult],
    ) -> Self {
        let expected_names = files
            .iter()
            .enumerate()
            .map(|(i, cached)| match primary_results.get(i) {
                Some(primary) => primary.file_name.clone(),
                None => cached.file_name.clone(),
            })
            .collect();

        BackupTask {
            destination_id: destination_id.into(),
            files,
            expected_names,
        }
    }

    pub fn files(&self) -> impl Iterator<Item = (&CachedFile, &str)> {
        self.files
            .iter()
            .zip(self.expected_names.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
