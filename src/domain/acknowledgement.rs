use std::collections::HashSet;

/// Filenames the user has actually retrieved during this session.
///
/// Keyed by filename alone. Two jobs delivering the same name share one entry.
#[derive(Debug, Clone, Default)]
pub struct FileAcknowledgementTracker {
    acknowledged: HashSet<String>,
}

impl FileAcknowledgementTracker {
    /// Returns `true` the first time a filename is seen.
    pub fn acknowledge(&mut self, filename: &str) -> bool {
        self.acknowledged.insert(filename.to_string())
    }

    pub fn count(&self) -> usize {
        self.acknowledged.len()
    }

    pub fn is_acknowledged(&self, filename: &str) -> bool {
        self.acknowledged.contains(filename)
    }

    pub fn is_fully_acknowledged(&self, total_files: usize) -> bool {
        total_files > 0 && self.count() >= total_files
    }
}
