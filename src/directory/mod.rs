//! Upstream member directory boundary.
//! The directory itself is an external service; this module only defines how it is reached
//! and what comes back. Keep the public surface thin and split implementation across sub-modules.

mod member;
mod http;
mod filter;

use futures_util::future::BoxFuture;

use crate::error::FetchError;

pub use member::{Member, Activity};
pub use http::HttpDirectoryClient;
pub use filter::filter_roster;

/// Capability to query the upstream directory. Every call is one network round trip;
/// implementations classify failures but never retry on behalf of the caches.
pub trait DirectoryClient: Send + Sync {
    fn fetch_roster(&self) -> BoxFuture<'_, Result<Vec<Member>, FetchError>>;

    fn fetch_recent_activity(&self) -> BoxFuture<'_, Result<Vec<Activity>, FetchError>>;

    /// Mark a member as present. Callers must invalidate roster-derived caches on success.
    fn record_presence<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), FetchError>>;
}

/// Stand-in used when no upstream URL is configured: every call fails with
/// [`FetchError::Unconfigured`], so only the admin bypass can log in.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredDirectory;

impl DirectoryClient for UnconfiguredDirectory {
    fn fetch_roster(&self) -> BoxFuture<'_, Result<Vec<Member>, FetchError>> {
        Box::pin(async { Err(FetchError::Unconfigured) })
    }

    fn fetch_recent_activity(&self) -> BoxFuture<'_, Result<Vec<Activity>, FetchError>> {
        Box::pin(async { Err(FetchError::Unconfigured) })
    }

    fn record_presence<'a>(&'a self, _name: &'a str) -> BoxFuture<'a, Result<(), FetchError>> {
        Box::pin(async { Err(FetchError::Unconfigured) })
    }
}
