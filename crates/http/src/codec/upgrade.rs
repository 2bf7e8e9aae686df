//! Process wide registry of protocol upgrade providers.
//!
//! When a request carrying an `Upgrade` field is encoded, the providers are
//! asked in registration order whether they support the first protocol
//! listed. The first one that does may add the fields its protocol needs to
//! the request (e.g. the WebSocket key). No matching provider is not an
//! error: the upgrade is left to the application.

use std::fmt::Debug;
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::protocol::RequestHeader;

/// Prepares the opening request of a protocol reached through `Upgrade`.
pub trait UpgradeProvider: Debug + Send + Sync {
    fn supports_protocol(&self, protocol: &str) -> bool;

    fn augment_initial_request(&self, request: &mut RequestHeader);
}

static PROVIDERS: Lazy<ArcSwap<Vec<Arc<dyn UpgradeProvider>>>> = Lazy::new(|| ArcSwap::from_pointee(Vec::new()));

/// Adds a provider; it is consulted after all providers registered before it.
pub fn register(provider: Arc<dyn UpgradeProvider>) {
    debug!(?provider, "registering upgrade provider");
    PROVIDERS.rcu(|providers| {
        let mut providers: Vec<_> = providers.iter().map(Arc::clone).collect();
        providers.push(Arc::clone(&provider));
        providers
    });
}

/// Snapshot of the registered providers.
pub fn providers() -> Arc<Vec<Arc<dyn UpgradeProvider>>> {
    PROVIDERS.load_full()
}

/// The first registered provider supporting `protocol`.
pub fn find_provider(protocol: &str) -> Option<Arc<dyn UpgradeProvider>> {
    providers().iter().find(|provider| provider.supports_protocol(protocol)).map(Arc::clone)
}
