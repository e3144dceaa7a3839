use crate::domain::{
    evaluate_exit, warning_visible, DownloadHistory, DownloadRecord, ExitDecision,
    FileAcknowledgementTracker,
};

/// Everything one run of the application remembers about its downloads.
///
/// Owned by the application state and only mutated from its update loop, so
/// every job's results are applied one at a time.
#[derive(Debug, Default)]
pub struct SessionContext {
    history: DownloadHistory,
    tracker: FileAcknowledgementTracker,
}

impl SessionContext {
    pub fn record_completed(&mut self, record: DownloadRecord) {
        tracing::info!(
            "Recorded \"{}\" with {} file(s)",
            record.title,
            record.files.len()
        );
        self.history.record_completed(record);
    }

    pub fn acknowledge(&mut self, filename: &str) {
        if self.tracker.acknowledge(filename) {
            tracing::debug!(
                "Acknowledged {} ({}/{})",
                filename,
                self.tracker.count(),
                self.history.total_file_count()
            );
        }
    }

    pub fn history(&self) -> &DownloadHistory {
        &self.history
    }

    pub fn is_acknowledged(&self, filename: &str) -> bool {
        self.tracker.is_acknowledged(filename)
    }

    pub fn total_file_count(&self) -> usize {
        self.history.total_file_count()
    }

    pub fn is_fully_acknowledged(&self) -> bool {
        self.tracker
            .is_fully_acknowledged(self.history.total_file_count())
    }

    pub fn warning_visible(&self) -> bool {
        warning_visible(&self.history, &self.tracker)
    }

    pub fn on_exit_attempt(&self) -> ExitDecision {
        evaluate_exit(&self.history, &self.tracker)
    }
}
