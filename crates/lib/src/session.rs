//! The logged-in session and its persistence.
//!
//! A session is stored as exactly two entries: the raw token under
//! [`TOKEN_KEY`] and the JSON profile under [`USER_KEY`]. A session is only
//! restored when both are present and the profile decodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Result,
    accounts::LocalAccount,
    constants::{OFFLINE_TOKEN_PREFIX, TOKEN_KEY, USER_KEY},
    storage::{self, KvStore},
};

/// Public profile of the logged-in user, as persisted under [`USER_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub token: String,
}

impl Session {
    pub fn new(profile: Profile, token: impl Into<String>) -> Self {
        Self {
            user_id: profile.id,
            name: profile.name,
            email: profile.email,
            token: token.into(),
        }
    }

    /// A session established from a locally held account.
    pub fn local(account: &LocalAccount) -> Self {
        Self {
            user_id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            token: format!("{OFFLINE_TOKEN_PREFIX}{}", account.id),
        }
    }

    /// Whether the token was issued locally rather than by the backend.
    pub fn is_offline(&self) -> bool {
        self.token.starts_with(OFFLINE_TOKEN_PREFIX)
    }

    pub fn profile(&self) -> Profile {
        Profile {
            id: self.user_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Reads and writes the session entries of a [`KvStore`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: Arc<dyn KvStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Persist `session`, replacing any previous one.
    pub fn save(&self, session: &Session) -> Result<()> {
        self.store.set(TOKEN_KEY, &session.token)?;
        storage::write_json(self.store.as_ref(), USER_KEY, &session.profile())?;
        debug!(email = %session.email, offline = session.is_offline(), "Session saved");
        Ok(())
    }

    /// Load the persisted session, if a complete one exists.
    pub fn load(&self) -> Result<Option<Session>> {
        let Some(token) = self.store.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        if token.is_empty() {
            return Ok(None);
        }
        match storage::read_json::<Profile>(self.store.as_ref(), USER_KEY)? {
            Some(profile) => Ok(Some(Session::new(profile, token))),
            None => {
                warn!("Session token present without a readable profile");
                Ok(None)
            }
        }
    }

    /// Remove both session entries.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }
}
