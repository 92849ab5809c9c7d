pub mod cache;
pub mod retry;

pub use cache::LocalCache;
pub use retry::retry_on_conflict;
