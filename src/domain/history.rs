use std::collections::VecDeque;

use super::DownloadRecord;

pub const HISTORY_CAPACITY: usize = 10;

/// Completed downloads of this session, newest first.
#[derive(Debug, Clone)]
pub struct DownloadHistory {
    records: VecDeque<DownloadRecord>,
    capacity: usize,
}

impl Default for DownloadHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl DownloadHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Puts `record` at the front and silently drops whatever falls past the cap.
    pub fn record_completed(&mut self, record: DownloadRecord) {
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    pub fn total_file_count(&self) -> usize {
        self.records.iter().map(|r| r.files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.records.iter()
    }
}
