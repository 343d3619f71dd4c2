//! Accounts created without the remote backend.
//!
//! Two lists share the same record type:
//!
//! * the **pending** list holds signups accepted while the backend was
//!   unreachable; each carries a sealed password so it can be replayed once
//!   the backend is back.
//! * the **offline** list holds accounts created when no backend is
//!   configured at all; they only ever live in the local store.
//!
//! Email addresses are unique within each list.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::{
    Clock, Result,
    constants::{OFFLINE_USERS_KEY, PENDING_ACCOUNTS_KEY},
    crypto::{self, SealKey, SealedSecret},
    manager::AuthError,
    storage::{self, KvStore, StoreError},
};

/// A locally held account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Present on pending accounts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sealed_password: Option<SealedSecret>,
    /// RFC3339 creation time.
    pub created_at: String,
}

impl LocalAccount {
    /// Create an account record, hashing `password`.
    ///
    /// When `seal_key` is given the password is also sealed for later replay.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: &str,
        clock: &dyn Clock,
        seal_key: Option<&SealKey>,
    ) -> Result<Self> {
        let sealed_password = seal_key
            .map(|key| crypto::seal(key, password))
            .transpose()?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password_hash: crypto::hash_password(password)?,
            sealed_password,
            created_at: clock.now_rfc3339(),
        })
    }

    /// Check `password` against the stored hash.
    pub fn verify(&self, password: &str) -> bool {
        crypto::password_matches(password, &self.password_hash)
    }

    /// Recover the plaintext password for replay.
    pub fn unseal_password(&self, key: &SealKey) -> Result<Zeroizing<String>> {
        match &self.sealed_password {
            Some(sealed) => crypto::open(key, sealed),
            None => Err(crypto::CryptoError::OpenFailed {
                reason: format!("account {} has no sealed password", self.email),
            }
            .into()),
        }
    }

    pub fn has_email(&self, email: &str) -> bool {
        emails_match(&self.email, email)
    }
}

/// Email addresses compare case-insensitively, ignoring surrounding whitespace.
pub fn emails_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// A list of [`LocalAccount`]s stored as one JSON array under a store key.
///
/// Every read-modify-write happens under an internal lock. A stored value
/// that cannot be decoded reads as an empty list.
#[derive(Debug)]
pub struct AccountList {
    store: Arc<dyn KvStore>,
    key: &'static str,
    guard: Mutex<()>,
}

impl AccountList {
    pub fn new(store: Arc<dyn KvStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            guard: Mutex::new(()),
        }
    }

    /// The list of signups waiting to be replayed against the backend.
    pub fn pending(store: Arc<dyn KvStore>) -> Self {
        Self::new(store, PENDING_ACCOUNTS_KEY)
    }

    /// The list of accounts created with no backend configured.
    pub fn offline(store: Arc<dyn KvStore>) -> Self {
        Self::new(store, OFFLINE_USERS_KEY)
    }

    /// All accounts in the list.
    pub fn load(&self) -> Result<Vec<LocalAccount>> {
        let _guard = self.lock()?;
        self.read()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.load()?.is_empty())
    }

    pub fn contains_email(&self, email: &str) -> Result<bool> {
        Ok(self.load()?.iter().any(|a| a.has_email(email)))
    }

    /// Append `account`, failing with [`AuthError::DuplicateEmail`] if its
    /// email is already present.
    pub fn insert(&self, account: LocalAccount) -> Result<()> {
        let _guard = self.lock()?;
        let mut accounts = self.read()?;
        if accounts.iter().any(|a| a.has_email(&account.email)) {
            return Err(AuthError::DuplicateEmail {
                email: account.email,
            }
            .into());
        }
        debug!(list = self.key, email = %account.email, "Adding local account");
        accounts.push(account);
        self.write(&accounts)
    }

    /// Find the account whose email and password both match.
    pub fn find_by_credentials(&self, email: &str, password: &str) -> Result<Option<LocalAccount>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|a| a.has_email(email) && a.verify(password)))
    }

    /// Remove every account whose email is in `emails`.
    ///
    /// Accounts not named, including ones added since the caller last read
    /// the list, are kept. Returns the number removed.
    pub fn remove_emails(&self, emails: &[String]) -> Result<usize> {
        let _guard = self.lock()?;
        let accounts = self.read()?;
        let before = accounts.len();
        let kept: Vec<LocalAccount> = accounts
            .into_iter()
            .filter(|a| !emails.iter().any(|e| a.has_email(e)))
            .collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.write(&kept)?;
        }
        Ok(removed)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.guard.lock().map_err(|_| StoreError::Poisoned.into())
    }

    fn read(&self) -> Result<Vec<LocalAccount>> {
        Ok(storage::read_json(self.store.as_ref(), self.key)?.unwrap_or_default())
    }

    fn write(&self, accounts: &[LocalAccount]) -> Result<()> {
        storage::write_json(self.store.as_ref(), self.key, accounts)
    }
}
