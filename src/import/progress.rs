mod handle;
mod tracker;

pub use handle::{ImportProgressHandle, SubscriptionFilter};
pub use tracker::CommitProgressTracker;
