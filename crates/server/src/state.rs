//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::AuthService;
use crate::backend::{self, Backend, BackendStatus};
use crate::config::ServerConfig;
use crate::directory::UserDirectory;
use crate::gemini::GeminiClient;
use crate::menu::MenuStore;
use crate::storage::{FileStore, SharedStore};
use crate::sync::OrderSync;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: SharedStore,
    backend: Backend,
    menu: MenuStore,
    gemini: Option<GeminiClient>,
}

impl AppState {
    /// Assemble state from already-built parts.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: SharedStore,
        backend: Backend,
        gemini: Option<GeminiClient>,
    ) -> Self {
        let menu = MenuStore::new(store.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                backend,
                menu,
                gemini,
            }),
        }
    }

    /// Open the data directory, select the backend and build the clients.
    ///
    /// Problems with optional integrations are logged and the integration
    /// is left out.
    pub async fn from_config(config: ServerConfig) -> Self {
        let store: SharedStore = Arc::new(FileStore::new(config.data_dir.clone()));
        let backend = backend::select(&config, store.clone()).await;

        let gemini = config
            .gemini
            .as_ref()
            .and_then(|gemini| match GeminiClient::new(gemini) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!(error = %e, "Menu extraction disabled");
                    None
                }
            });

        Self::new(config, store, backend, gemini)
    }

    /// Local-only state over `store`, without extraction.
    #[must_use]
    pub fn local(store: SharedStore) -> Self {
        let backend = Backend::local(store.clone(), false);
        Self::new(ServerConfig::local("."), store, backend, None)
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// The local key-value store.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    #[must_use]
    pub fn orders(&self) -> &OrderSync {
        &self.inner.backend.orders
    }

    #[must_use]
    pub fn users(&self) -> &UserDirectory {
        &self.inner.backend.users
    }

    /// Auth service; `None` in local mode.
    #[must_use]
    pub fn auth(&self) -> Option<&AuthService> {
        self.inner.backend.auth.as_ref()
    }

    #[must_use]
    pub fn backend_status(&self) -> &BackendStatus {
        &self.inner.backend.status
    }

    #[must_use]
    pub fn menu(&self) -> &MenuStore {
        &self.inner.menu
    }

    /// Extraction client; `None` when no API key is configured.
    #[must_use]
    pub fn gemini(&self) -> Option<&GeminiClient> {
        self.inner.gemini.as_ref()
    }
}
