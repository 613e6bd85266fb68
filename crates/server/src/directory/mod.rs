//! User profile directory.
//!
//! Like [`crate::sync::OrderSync`], [`UserDirectory`] is chosen once at
//! startup and exposes the same operations for both backends. Listings are
//! one-shot reads; there is no live subscription for profiles.

mod local;
mod remote;

use chrono::Utc;
use comanda_core::{ProfileDraft, UserId, UserProfile, UserRole};
use thiserror::Error;

use crate::firestore::FirestoreError;
use crate::storage::StorageError;

pub use local::LocalUsers;
pub use remote::{RemoteUsers, profile_from_document};

/// Errors from directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Local persistence failed.
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),

    /// Remote store rejected or failed the operation.
    #[error("remote store error: {0}")]
    Remote(#[from] FirestoreError),
}

/// Profile store selected at startup.
#[derive(Debug, Clone)]
pub enum UserDirectory {
    Local(LocalUsers),
    Remote(RemoteUsers),
}

impl UserDirectory {
    /// Insert or overwrite the profile keyed by `uid`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the profile cannot be written.
    pub async fn create_or_update_profile(
        &self,
        uid: &UserId,
        draft: ProfileDraft,
    ) -> Result<UserProfile, DirectoryError> {
        let profile = draft.into_profile(uid.clone(), Utc::now());
        match self {
            Self::Local(local) => local.upsert(profile),
            Self::Remote(remote) => remote.upsert(profile).await,
        }
    }

    /// Look up one profile.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the store cannot be read.
    pub async fn get_profile(&self, uid: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        match self {
            Self::Local(local) => local.get(uid),
            Self::Remote(remote) => remote.get(uid).await,
        }
    }

    /// Every stored profile.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the store cannot be read.
    pub async fn list_all(&self) -> Result<Vec<UserProfile>, DirectoryError> {
        match self {
            Self::Local(local) => local.list(),
            Self::Remote(remote) => remote.list().await,
        }
    }

    /// Set the role of one profile.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the write fails. Locally an unknown uid
    /// is a no-op; remotely it is an error.
    pub async fn update_role(&self, uid: &UserId, role: UserRole) -> Result<(), DirectoryError> {
        match self {
            Self::Local(local) => local.update_role(uid, role),
            Self::Remote(remote) => remote.update_role(uid, role).await,
        }
    }

    /// Apply a role change to a caller-held roster, then persist it.
    ///
    /// When persisting fails the roster is overwritten with a fresh listing
    /// so it never shows a change that did not happen, and the write error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns the error from the failed role update.
    pub async fn change_role(
        &self,
        roster: &mut Vec<UserProfile>,
        uid: &UserId,
        role: UserRole,
    ) -> Result<(), DirectoryError> {
        if let Some(profile) = roster.iter_mut().find(|p| &p.uid == uid) {
            profile.role = role;
        }

        let Err(e) = self.update_role(uid, role).await else {
            return Ok(());
        };

        tracing::error!(uid = %uid, error = %e, "Role update failed, restoring roster");
        match self.list_all().await {
            Ok(fresh) => *roster = fresh,
            Err(refetch) => {
                tracing::error!(error = %refetch, "Could not re-fetch roster after failed role update");
            }
        }
        Err(e)
    }

    /// Whether profiles are served from the remote store.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
