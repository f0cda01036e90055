pub mod progress;
pub mod store;

pub use progress::{ScrapeSessionTracker, SessionKind, SessionPlan};
pub use store::{load_records, rotate_archives, IncrementalRecordStore};
