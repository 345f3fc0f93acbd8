//! Identity provider seam.
//!
//! The board never authenticates anyone itself. It watches an
//! `IdentityProvider` and loads or drops per-user data as the signed-in user
//! changes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    /// Name shown on activity entries: display name, else the local part of
    /// the email, else "You".
    pub fn actor_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => "You".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<Identity>,
    pub is_loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            user: None,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            is_loading: false,
        }
    }

    pub fn signed_in(user: Identity) -> Self {
        Self {
            user: Some(user),
            is_loading: false,
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> AuthState;

    /// Receive every auth state change, starting with the current one.
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    async fn login(&self) -> Result<Identity>;

    async fn logout(&self) -> Result<()>;
}

/// Provider for a single preconfigured identity (local and demo use).
pub struct StaticIdentityProvider {
    identity: Identity,
    tx: watch::Sender<AuthState>,
}

impl StaticIdentityProvider {
    /// Starts in the loading state until `login()` is called.
    pub fn new(identity: Identity) -> Self {
        let (tx, _) = watch::channel(AuthState::loading());
        Self { identity, tx }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let (tx, _) = watch::channel(AuthState::signed_in(identity.clone()));
        Self { identity, tx }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    async fn login(&self) -> Result<Identity> {
        self.tx.send_replace(AuthState::signed_in(self.identity.clone()));
        tracing::info!(user = %self.identity.id, "Signed in");
        Ok(self.identity.clone())
    }

    async fn logout(&self) -> Result<()> {
        self.tx.send_replace(AuthState::signed_out());
        tracing::info!(user = %self.identity.id, "Signed out");
        Ok(())
    }
}
