pub mod acknowledgement;
pub mod error;
pub mod guard;
pub mod history;
pub mod model;
pub mod platform;
pub mod progress;

pub use acknowledgement::FileAcknowledgementTracker;
pub use error::{AppError, ValidationError};
pub use guard::{evaluate_exit, warning_visible, ExitDecision};
pub use history::DownloadHistory;
pub use model::{DownloadJob, DownloadPhase, DownloadRecord, DownloadRequest, JobStatus};
pub use platform::{PlatformDescriptor, PlatformRegistry};
