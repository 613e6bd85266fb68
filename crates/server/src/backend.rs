//! Backend selection.
//!
//! Decides once, at startup, whether orders and profiles live in the remote
//! document store or in the local key-value store. Remote credentials come
//! from a persisted override (set through the API) or from the environment.
//! If the remote store cannot be reached the service quietly runs locally
//! and reports it through [`BackendStatus::banner`].

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AuthError, AuthService};
use crate::config::{FirebaseConfig, ServerConfig};
use crate::directory::{LocalUsers, RemoteUsers, UserDirectory};
use crate::firestore::{FirestoreClient, FirestoreError};
use crate::storage::{
    BACKEND_KEY, KeyValueStore, Loaded, SharedStore, StorageError, load_json, save_json,
};
use crate::sync::{LocalOrders, OrderSync, RemoteOrders};

/// Banner shown while running without the remote store.
pub const OFFLINE_BANNER: &str =
    "Modo Offline. Dispositivos não sincronizarão. Configure o backend remoto em Configurações > Nuvem.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Local,
    Remote,
}

/// What `/api/status` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub mode: BackendMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    /// Credentials came from the persisted override.
    pub credentials_override: bool,
}

/// Remote credentials as persisted under the `backend` key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCredentials {
    pub project_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl RemoteCredentials {
    fn is_complete(&self) -> bool {
        !self.project_id.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    fn into_config(self) -> FirebaseConfig {
        FirebaseConfig {
            project_id: self.project_id.trim().to_owned(),
            api_key: SecretString::from(self.api_key.trim().to_owned()),
        }
    }
}

/// Errors that make the remote backend unusable.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("remote store unreachable: {0}")]
    Firestore(#[from] FirestoreError),

    #[error("auth client unavailable: {0}")]
    Auth(#[from] AuthError),
}

/// The selected stores.
#[derive(Debug, Clone)]
pub struct Backend {
    pub orders: OrderSync,
    pub users: UserDirectory,
    /// Present only in remote mode.
    pub auth: Option<AuthService>,
    pub status: BackendStatus,
}

impl Backend {
    /// Local stores over `store`.
    #[must_use]
    pub fn local(store: SharedStore, credentials_override: bool) -> Self {
        Self {
            orders: OrderSync::Local(LocalOrders::new(store.clone())),
            users: UserDirectory::Local(LocalUsers::new(store)),
            auth: None,
            status: BackendStatus {
                mode: BackendMode::Local,
                project_id: None,
                banner: Some(OFFLINE_BANNER.to_owned()),
                credentials_override,
            },
        }
    }

    /// Remote stores for a project, after checking the project answers.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if a client cannot be built or the probe fails.
    pub async fn remote(
        firebase: &FirebaseConfig,
        poll_interval: Duration,
        credentials_override: bool,
    ) -> Result<Self, BackendError> {
        let client = FirestoreClient::new(firebase)?;
        client.probe().await?;

        let users = UserDirectory::Remote(RemoteUsers::new(client.clone()));
        let auth = AuthService::new(firebase, client.clone(), users.clone())?;

        Ok(Self {
            orders: OrderSync::Remote(RemoteOrders::new(client, poll_interval)),
            users,
            auth: Some(auth),
            status: BackendStatus {
                mode: BackendMode::Remote,
                project_id: Some(firebase.project_id.clone()),
                banner: None,
                credentials_override,
            },
        })
    }
}

/// Pick the backend for this process.
///
/// Never fails: any problem with the remote store is logged and the local
/// stores are used instead.
pub async fn select(config: &ServerConfig, store: SharedStore) -> Backend {
    let stored = match stored_credentials(store.as_ref()) {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read stored backend credentials");
            None
        }
    };

    let credentials_override = stored.is_some();
    let firebase = stored
        .map(RemoteCredentials::into_config)
        .or_else(|| config.firebase.clone());

    let Some(firebase) = firebase else {
        tracing::info!("No remote backend configured, running in local mode");
        return Backend::local(store, false);
    };

    match Backend::remote(&firebase, config.poll_interval, credentials_override).await {
        Ok(backend) => {
            tracing::info!(project_id = %firebase.project_id, "Using remote backend");
            backend
        }
        Err(e) => {
            tracing::warn!(
                project_id = %firebase.project_id,
                error = %e,
                "Remote backend unavailable, falling back to local mode"
            );
            Backend::local(store, credentials_override)
        }
    }
}

/// Persisted credentials override, if a complete one is stored.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn stored_credentials(
    store: &dyn KeyValueStore,
) -> Result<Option<RemoteCredentials>, StorageError> {
    Ok(match load_json::<RemoteCredentials>(store, BACKEND_KEY)? {
        Loaded::Value(creds) if creds.is_complete() => Some(creds),
        _ => None,
    })
}

/// Persist a credentials override. Takes effect on the next start.
///
/// # Errors
///
/// Returns `StorageError` if the override cannot be written.
pub fn save_credentials(
    store: &dyn KeyValueStore,
    credentials: &RemoteCredentials,
) -> Result<(), StorageError> {
    save_json(store, BACKEND_KEY, credentials)
}

/// Remove the credentials override. Takes effect on the next start.
///
/// # Errors
///
/// Returns `StorageError` if the override cannot be removed.
pub fn clear_credentials(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(BACKEND_KEY)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_select_without_credentials_is_local() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let config = ServerConfig::local("./unused");

        let backend = select(&config, store).await;
        assert_eq!(backend.status.mode, BackendMode::Local);
        assert_eq!(backend.status.banner.as_deref(), Some(OFFLINE_BANNER));
        assert!(!backend.orders.is_remote());
        assert!(!backend.users.is_remote());
        assert!(backend.auth.is_none());
    }

    #[test]
    fn test_credentials_override_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(stored_credentials(&store).unwrap(), None);

        let creds = RemoteCredentials {
            project_id: "comanda-prod".into(),
            api_key: "AIzaSyExample".into(),
        };
        save_credentials(&store, &creds).unwrap();
        assert_eq!(stored_credentials(&store).unwrap(), Some(creds));

        clear_credentials(&store).unwrap();
        assert_eq!(stored_credentials(&store).unwrap(), None);
    }

    #[test]
    fn test_incomplete_or_corrupt_override_ignored() {
        let store = MemoryStore::new();
        store
            .set(BACKEND_KEY, r#"{"projectId":"p","apiKey":"  "}"#)
            .unwrap();
        assert_eq!(stored_credentials(&store).unwrap(), None);

        store.set(BACKEND_KEY, "garbage").unwrap();
        assert_eq!(stored_credentials(&store).unwrap(), None);
    }

    #[test]
    fn test_status_json() {
        let backend = Backend::local(Arc::new(MemoryStore::new()), true);
        let json = serde_json::to_value(&backend.status).unwrap();
        assert_eq!(json["mode"], "local");
        assert_eq!(json["credentialsOverride"], true);
        assert!(json.get("projectId").is_none());
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = RemoteCredentials {
            project_id: "p".into(),
            api_key: "very-secret".into(),
        };
        assert!(!format!("{creds:?}").contains("very-secret"));
    }
}
