use super::{DownloadHistory, FileAcknowledgementTracker};

pub const EXIT_WARNING: &str = "You have undownloaded files that will be lost.";
pub const BANNER_WARNING: &str = "Warning: Downloaded media will be deleted after page reload or close. Please download all files to your device first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Proceed,
    Intercept,
}

/// Decides what happens to an exit attempt.
pub fn evaluate_exit(
    history: &DownloadHistory,
    tracker: &FileAcknowledgementTracker,
) -> ExitDecision {
    let total = history.total_file_count();
    if total > 0 && tracker.count() < total {
        ExitDecision::Intercept
    } else {
        ExitDecision::Proceed
    }
}

/// The unsaved-files banner is derived, never stored.
pub fn warning_visible(history: &DownloadHistory, tracker: &FileAcknowledgementTracker) -> bool {
    !history.is_empty() && tracker.count() < history.total_file_count()
}
