//! Session store: the locally persisted token and username.
//!
//! The store is passed around explicitly. Create it once at startup with
//! [`SessionStore::restore`], which reads whatever a previous run left in
//! storage; [`SessionStore::logout`] clears it again.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::Result,
    gateway::ContractsGateway,
    models::{Credentials, TokenResponse},
    storage::SessionStorage,
};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

const FALLBACK_USERNAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: Option<Session>,
}

impl SessionStore {
    /// A session exists iff a token is stored.
    pub async fn restore(storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let current = match storage.get(TOKEN_KEY).await? {
            Some(token) => {
                let user = match storage.get(USER_KEY).await? {
                    Some(raw) => serde_json::from_str::<User>(&raw).unwrap_or_else(|e| {
                        warn!("Stored user record is unreadable ({}), using fallback name", e);
                        fallback_user()
                    }),
                    None => fallback_user(),
                };
                info!(username = %user.username, "Restored session");
                Some(Session { token, user })
            }
            None => None,
        };

        Ok(Self { storage, current })
    }

    pub async fn login(
        &mut self,
        gateway: &dyn ContractsGateway,
        credentials: &Credentials,
    ) -> Result<&Session> {
        let response = gateway.login(credentials).await?;
        self.establish(&credentials.username, response).await
    }

    pub async fn signup(
        &mut self,
        gateway: &dyn ContractsGateway,
        credentials: &Credentials,
    ) -> Result<&Session> {
        let response = gateway.signup(credentials).await?;
        self.establish(&credentials.username, response).await
    }

    async fn establish(&mut self, username: &str, response: TokenResponse) -> Result<&Session> {
        let user = User {
            username: username.to_string(),
        };
        self.storage
            .set(TOKEN_KEY, response.access_token.clone())
            .await?;
        self.storage
            .set(USER_KEY, serde_json::to_string(&user)?)
            .await?;

        info!(username = %user.username, "Session established");
        Ok(&*self.current.insert(Session {
            token: response.access_token,
            user,
        }))
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.storage.remove(TOKEN_KEY).await?;
        self.storage.remove(USER_KEY).await?;
        if let Some(session) = self.current.take() {
            info!(username = %session.user.username, "Logged out");
        }
        Ok(())
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref().map(|session| &session.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|session| session.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}

fn fallback_user() -> User {
    User {
        username: FALLBACK_USERNAME.to_string(),
    }
}
