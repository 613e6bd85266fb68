//! Profiles kept in the local key-value store.

use comanda_core::{UserId, UserProfile, UserRole};
use tracing::instrument;

use super::DirectoryError;
use crate::storage::{SharedStore, USERS_KEY, load_json, save_json};

/// Profile list persisted under the `users` key.
///
/// Nothing is cached: every call reads the stored blob, and a malformed
/// blob reads as an empty directory.
#[derive(Clone)]
pub struct LocalUsers {
    store: SharedStore,
}

impl std::fmt::Debug for LocalUsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalUsers").finish_non_exhaustive()
    }
}

impl LocalUsers {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<UserProfile>, DirectoryError> {
        Ok(load_json(self.store.as_ref(), USERS_KEY)?
            .into_option()
            .unwrap_or_default())
    }

    fn save(&self, users: &[UserProfile]) -> Result<(), DirectoryError> {
        save_json(self.store.as_ref(), USERS_KEY, users)?;
        Ok(())
    }

    /// Replace the record with the same uid, or append.
    #[instrument(skip(self, profile), fields(uid = %profile.uid))]
    pub(super) fn upsert(&self, profile: UserProfile) -> Result<UserProfile, DirectoryError> {
        let mut users = self.load()?;
        match users.iter_mut().find(|u| u.uid == profile.uid) {
            Some(existing) => *existing = profile.clone(),
            None => users.push(profile.clone()),
        }
        self.save(&users)?;
        Ok(profile)
    }

    pub(super) fn get(&self, uid: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        Ok(self.load()?.into_iter().find(|u| &u.uid == uid))
    }

    pub(super) fn list(&self) -> Result<Vec<UserProfile>, DirectoryError> {
        self.load()
    }

    #[instrument(skip(self))]
    pub(super) fn update_role(&self, uid: &UserId, role: UserRole) -> Result<(), DirectoryError> {
        let mut users = self.load()?;
        let Some(user) = users.iter_mut().find(|u| &u.uid == uid) else {
            tracing::debug!("Role update for unknown user ignored");
            return Ok(());
        };
        user.role = role;
        self.save(&users)
    }
}
