//! Signed-in state for the navigation bar.

use tj_core::{AccountContext, Identity, RoleTag};

use crate::notifier::{AuthEvent, Subscription};
use crate::{Tab, context, session};

/// Roles the navigation offers as switch targets.
const SWITCHABLE: [RoleTag; 2] = [RoleTag::Requester, RoleTag::Worker];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavState {
    Anonymous,
    SignedIn {
        identity: Identity,
        context: AccountContext,
        switchable: Vec<RoleTag>,
    },
}

impl NavState {
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

/// Follows auth events and re-derives [`NavState`] on each one.
pub struct NavModel {
    tab: Tab,
    events: Subscription,
    state: NavState,
}

impl NavModel {
    /// Subscribes immediately; call [`refresh`](Self::refresh) for the first state.
    #[must_use]
    pub fn new(tab: Tab) -> Self {
        let events = tab.subscribe();
        Self {
            tab,
            events,
            state: NavState::Anonymous,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &NavState {
        &self.state
    }

    pub async fn refresh(&mut self) -> &NavState {
        self.state = derive(&self.tab).await;
        &self.state
    }

    /// Wait for the next auth event and refresh. `None` when events stop.
    pub async fn changed(&mut self) -> Option<(AuthEvent, &NavState)> {
        let event = self.events.recv().await?;
        tracing::debug!(?event, "navigation refresh");
        self.state = derive(&self.tab).await;
        Some((event, &self.state))
    }
}

async fn derive(tab: &Tab) -> NavState {
    if session::resolve(tab.baas.as_ref()).await.is_none() {
        return NavState::Anonymous;
    }
    let Some(identity) = tab.store.identity() else {
        return NavState::Anonymous;
    };
    let roles = tab.store.roles();
    let context = match context::resolve(&tab.store, &roles) {
        Ok(Some(context)) => context,
        Ok(None) => return NavState::Anonymous,
        Err(error) => {
            tracing::warn!(%error, "failed to persist account context");
            match context::choose(&roles, tab.store.account_context(), tab.store.selected_role()) {
                Some(context) => context,
                None => return NavState::Anonymous,
            }
        }
    };
    let switchable = context::switch_targets(&roles, context)
        .into_iter()
        .filter(|role| SWITCHABLE.contains(role))
        .collect();
    NavState::SignedIn {
        identity,
        context,
        switchable,
    }
}
