pub mod blocks;
pub mod scheduler;

pub use blocks::{PendingUpdates, UpdatesFromOneNode};
pub use scheduler::UpdateScheduler;
