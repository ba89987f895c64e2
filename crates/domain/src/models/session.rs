//! Session context handed to the synchronization controller.
//!
//! The session subsystem itself lives elsewhere; callers pass its current
//! state in explicitly.

use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// The signed-in user as reported by the session subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: UserId,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Snapshot of authentication state at a sync call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub authenticated: bool,
    pub user: Option<UserIdentity>,
}

impl SessionContext {
    pub fn signed_in(user: Option<UserIdentity>) -> Self {
        Self {
            authenticated: true,
            user,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|user| user.id)
    }
}

/// Source of the current session state.
pub trait SessionProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn current_user(&self) -> Option<UserIdentity>;

    fn context(&self) -> SessionContext {
        SessionContext {
            authenticated: self.is_authenticated(),
            user: self.current_user(),
        }
    }
}
