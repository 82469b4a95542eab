//! Jobs runnable against the Imgur adapter.

pub mod account_me;

use crate::adapter::Imgur;
use botkit::JobRegistry;
use std::sync::Arc;

/// Every job the runner can dispatch.
pub fn all_jobs() -> JobRegistry<Imgur> {
    let mut registry = JobRegistry::new();
    registry.register(Arc::new(account_me::AccountMe));
    registry
}
