pub mod context;
pub mod download_coordinator;
pub mod session;

pub use context::SessionContext;
pub use download_coordinator::{DownloadCoordinator, FileEvent};
pub use session::SessionEvent;
