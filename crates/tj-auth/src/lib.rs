//! # tj-auth
//!
//! Role resolution and session reconciliation for the ThoseJobs client.
//!
//! - [`roles`]: canonical role sets from whatever the profile row stores
//! - [`session`]: live-session lookup against the auth service
//! - [`context`]: which role a multi-role identity is acting as
//! - [`guard`]: a single role-parameterized route guard
//! - [`nav`]: signed-in state for the navigation bar
//! - [`flows`]: login, registration, email verification, logout
//!
//! A [`Tab`] bundles what one open client window needs. Tabs opened on the
//! same [`SharedStorage`] observe each other's writes through
//! [`Tab::subscribe`].

pub mod context;
pub mod error;
pub mod flows;
pub mod guard;
pub mod nav;
pub mod navigator;
pub mod notifier;
pub mod roles;
pub mod session;
pub mod storage;
pub mod store;

pub use error::AuthError;
pub use guard::{Authorized, GuardState, Mount, RouteGuard};
pub use nav::{NavModel, NavState};
pub use navigator::{Navigator, RecordingNavigator};
pub use notifier::{AuthEvent, Notifier, Subscription};
pub use storage::{FileStorage, SharedStorage, Storage, StorageEvent, StorageWatch, TabId, TabStorage};
pub use store::{ClientStore, StorageKey};

use std::sync::Arc;

use tj_baas::Baas;
use tj_core::Route;

/// One open client window.
#[derive(Clone)]
pub struct Tab {
    pub baas: Arc<dyn Baas>,
    pub store: ClientStore,
    pub notifier: Notifier,
    pub navigator: Arc<dyn Navigator>,
}

impl Tab {
    pub fn new(baas: Arc<dyn Baas>, storage: Arc<dyn Storage>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            baas,
            store: ClientStore::new(storage),
            notifier: Notifier::new(),
            navigator,
        }
    }

    /// Local auth events plus storage writes from other tabs.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe().with_storage(self.store.watch())
    }

    pub(crate) fn go(&self, route: Route) -> Route {
        self.navigator.navigate(route);
        route
    }
}
