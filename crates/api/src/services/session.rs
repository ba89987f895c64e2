//! Session state backed by service configuration.

use std::sync::{PoisonError, RwLock};

use domain::models::{SessionContext, SessionProvider, UserIdentity};

use crate::config::UpstreamConfig;

/// Session provider seeded from `upstream.token` and `upstream.user_id`.
///
/// A configured token means signed in. The state can be replaced at runtime,
/// e.g. when a token is revoked.
#[derive(Debug, Default)]
pub struct ConfigSessionProvider {
    state: RwLock<SessionContext>,
}

impl ConfigSessionProvider {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        let authenticated = !config.token.trim().is_empty();
        let user = config.user_id.map(|id| UserIdentity {
            id,
            attributes: Default::default(),
        });

        Self {
            state: RwLock::new(SessionContext {
                authenticated,
                user: if authenticated { user } else { None },
            }),
        }
    }

    pub fn set(&self, context: SessionContext) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = context;
    }
}

impl SessionProvider for ConfigSessionProvider {
    fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .authenticated
    }

    fn current_user(&self) -> Option<UserIdentity> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    fn context(&self) -> SessionContext {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
