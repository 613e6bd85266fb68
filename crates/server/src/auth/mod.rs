//! Email/password authentication against the Identity Toolkit REST API.
//!
//! Only available with the remote backend. A successful sign-in hands the
//! id token to the [`FirestoreClient`] so later document reads and writes
//! run as that user, and publishes the user on a watch channel.
//!
//! The session is process-wide, not per HTTP client. The server holds one
//! signed-in operator at a time, the same way a single device holds one
//! signed-in user. Every clone of [`AuthService`] shares it, so a login from
//! any client replaces the session and the Firestore id token for all
//! clients, and a logout signs everyone out. Deployments that need several
//! concurrent operators should run one server per operator.

mod error;

use std::sync::Arc;

use comanda_core::{Email, ProfileDraft, UserId, UserRole};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::instrument;
use url::Url;

use crate::config::FirebaseConfig;
use crate::directory::UserDirectory;
use crate::firestore::FirestoreClient;

pub use error::{ApiErrorResponse, AuthError, AuthErrorCode};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Display name used when an account is registered automatically.
pub const AUTO_REGISTER_DISPLAY_NAME: &str = "Equipe";

/// A signed-in user.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip)]
    id_token: SecretString,
}

impl std::fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// Fields shared by the sign-in and sign-up responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

impl TokenResponse {
    fn into_user(self) -> AuthUser {
        AuthUser {
            uid: UserId::new(self.local_id),
            email: self.email,
            display_name: self.display_name.filter(|n| !n.trim().is_empty()),
            id_token: SecretString::from(self.id_token),
        }
    }
}

/// Session holder and provider client.
///
/// Clones share a single session; see the module docs.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<AuthServiceInner>,
}

struct AuthServiceInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    firestore: FirestoreClient,
    directory: UserDirectory,
    session: watch::Sender<Option<AuthUser>>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("signed_in", &self.inner.session.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create the auth service for a project.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &FirebaseConfig,
        firestore: FirestoreClient,
        directory: UserDirectory,
    ) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        let (session, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(AuthServiceInner {
                client,
                base_url: IDENTITY_TOOLKIT_URL.to_owned(),
                api_key: config.api_key.clone(),
                firestore,
                directory,
                session,
            }),
        })
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the input is invalid or the provider refuses.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = validate(email, password)?;

        let response: TokenResponse = self
            .call(
                "accounts:signInWithPassword",
                &serde_json::json!({
                    "email": email.as_str(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let user = response.into_user();
        self.start_session(user.clone());
        tracing::info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    /// Create an account, set its display name and store a customer profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the input is invalid, the provider refuses, or
    /// the profile cannot be stored.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError> {
        let email = validate(email, password)?;

        let response: TokenResponse = self
            .call(
                "accounts:signUp",
                &serde_json::json!({
                    "email": email.as_str(),
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        let mut user = response.into_user();
        // Profile writes below must carry the new account's token
        self.start_session(user.clone());

        let display_name = display_name.trim();
        if !display_name.is_empty() {
            let _: serde_json::Value = self
                .call(
                    "accounts:update",
                    &serde_json::json!({
                        "idToken": user.id_token.expose_secret(),
                        "displayName": display_name,
                        "returnSecureToken": false,
                    }),
                )
                .await?;
            user.display_name = Some(display_name.to_owned());
        }

        let draft = ProfileDraft {
            email: Some(email.to_string()),
            display_name: user.display_name.clone(),
            role: Some(UserRole::Customer),
            created_at: None,
        };
        self.inner
            .directory
            .create_or_update_profile(&user.uid, draft)
            .await?;

        self.start_session(user.clone());
        tracing::info!(uid = %user.uid, "Registered");
        Ok(user)
    }

    /// Sign in, registering the account first-time when the provider
    /// reports it unknown. A registration failure replaces the sign-in error.
    ///
    /// # Errors
    ///
    /// Returns the sign-in error, or the registration error if registration
    /// was attempted.
    pub async fn sign_in_or_register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        match self.sign_in(email, password).await {
            Err(e) if e.code().is_some_and(AuthErrorCode::triggers_registration) => {
                tracing::info!("Sign-in failed for unknown account, registering");
                self.register(email, password, AUTO_REGISTER_DISPLAY_NAME).await
            }
            result => result,
        }
    }

    /// End the session and drop the document store token.
    pub fn sign_out(&self) {
        self.inner.firestore.set_id_token(None);
        self.inner.session.send_replace(None);
        tracing::info!("Signed out");
    }

    /// Currently signed-in user.
    #[must_use]
    pub fn session(&self) -> Option<AuthUser> {
        self.inner.session.borrow().clone()
    }

    /// Listen for sign-in and sign-out.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.inner.session.subscribe()
    }

    fn start_session(&self, user: AuthUser) {
        self.inner
            .firestore
            .set_id_token(Some(user.id_token.clone()));
        self.inner.session.send_replace(Some(user));
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, AuthError> {
        let mut url = Url::parse(&format!("{}/{method}", self.inner.base_url))
            .map_err(|e| AuthError::Parse(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());

        let response = self.inner.client.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| AuthError::Parse(format!("Failed to parse response: {e}")));
        }

        let message = serde_json::from_str::<ApiErrorResponse>(&text)
            .map(|r| r.error.message)
            .unwrap_or(text);
        tracing::warn!(method, %status, %message, "Auth provider rejected request");
        Err(AuthError::Provider {
            code: AuthErrorCode::from_message(&message),
            message,
        })
    }
}

fn validate(email: &str, password: &str) -> Result<Email, AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(Email::parse(email)?)
}
