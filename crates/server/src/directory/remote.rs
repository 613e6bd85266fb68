//! Profiles stored as documents in the `users` collection.

use chrono::{DateTime, Utc};
use comanda_core::{DEFAULT_DISPLAY_NAME, UserId, UserProfile, UserRole};
use tracing::instrument;

use super::DirectoryError;
use crate::firestore::{Document, Fields, FirestoreClient, FirestoreError, USERS_COLLECTION, Value};

/// Fields written by profile upserts. Anything else on the document survives.
const PROFILE_FIELDS: &[&str] = &["uid", "email", "displayName", "role", "createdAt"];

#[derive(Debug, Clone)]
pub struct RemoteUsers {
    client: FirestoreClient,
}

impl RemoteUsers {
    #[must_use]
    pub const fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Merge-write the profile fields.
    #[instrument(skip(self, profile), fields(uid = %profile.uid))]
    pub(super) async fn upsert(&self, profile: UserProfile) -> Result<UserProfile, DirectoryError> {
        self.client
            .patch_document(
                USERS_COLLECTION,
                profile.uid.as_str(),
                profile_fields(&profile),
                PROFILE_FIELDS,
                false,
            )
            .await?;
        Ok(profile)
    }

    pub(super) async fn get(&self, uid: &UserId) -> Result<Option<UserProfile>, DirectoryError> {
        let doc = self
            .client
            .get_document(USERS_COLLECTION, uid.as_str())
            .await?;
        Ok(doc.map(|d| profile_from_document(&d)).transpose()?)
    }

    pub(super) async fn list(&self) -> Result<Vec<UserProfile>, DirectoryError> {
        let documents = self.client.list_documents(USERS_COLLECTION).await?;
        Ok(documents
            .iter()
            .filter_map(|doc| match profile_from_document(doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(document = doc.id(), error = %e, "Skipping malformed profile");
                    None
                }
            })
            .collect())
    }

    /// Patch `role` on an existing document only.
    #[instrument(skip(self))]
    pub(super) async fn update_role(&self, uid: &UserId, role: UserRole) -> Result<(), DirectoryError> {
        let mut fields = Fields::new();
        fields.insert("role".to_owned(), Value::string(role.as_str()));
        self.client
            .patch_document(USERS_COLLECTION, uid.as_str(), fields, &["role"], true)
            .await?;
        Ok(())
    }
}

fn profile_fields(profile: &UserProfile) -> Fields {
    let mut fields = Fields::new();
    fields.insert("uid".to_owned(), Value::string(profile.uid.as_str()));
    fields.insert("email".to_owned(), Value::string(&profile.email));
    fields.insert("displayName".to_owned(), Value::string(&profile.display_name));
    fields.insert("role".to_owned(), Value::string(profile.role.as_str()));
    fields.insert("createdAt".to_owned(), Value::timestamp(profile.created_at));
    fields
}

/// Decode a profile document.
///
/// The uid falls back to the document id; a missing `createdAt` falls back
/// to the document's creation time.
///
/// # Errors
///
/// Returns `FirestoreError::Parse` if no creation time can be found.
pub fn profile_from_document(doc: &Document) -> Result<UserProfile, FirestoreError> {
    let created_at = match doc.timestamp("createdAt") {
        Ok(at) => at,
        Err(e) => doc
            .create_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .ok_or(e)?,
    };

    Ok(UserProfile {
        uid: UserId::new(doc.string("uid").unwrap_or_else(|| doc.id())),
        email: doc.string("email").unwrap_or_default().to_owned(),
        display_name: doc
            .string("displayName")
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_owned(),
        role: doc
            .string("role")
            .and_then(|r| r.parse().ok())
            .unwrap_or_default(),
        created_at,
    })
}
