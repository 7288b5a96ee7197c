mod client;
mod poller;
mod types;

pub use client::{failure_message, ApiClient};
pub use poller::{Poller, RETRY_DELAY};
pub use types::ReviewRecord;
