//! HTTP client for the Firestore v1 REST API.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::config::FirebaseConfig;

use super::error::{ApiErrorResponse, FirestoreError};
use super::value::{Document, Fields};

const FIRESTORE_API_URL: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: u32 = 300;

/// Sort direction for structured queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Firestore client bound to one project's default database.
///
/// Cheap to clone; clones share the HTTP pool and the signed-in id token.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// `.../projects/{p}/databases/(default)/documents`
    documents_url: String,
    api_key: SecretString,
    id_token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("documents_url", &self.inner.documents_url)
            .finish_non_exhaustive()
    }
}

impl FirestoreClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Http` if the HTTP client cannot be built.
    pub fn new(config: &FirebaseConfig) -> Result<Self, FirestoreError> {
        Self::with_base_url(config, FIRESTORE_API_URL)
    }

    /// Create a client against a different API root (emulator or test server).
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Http` if the HTTP client cannot be built.
    pub fn with_base_url(config: &FirebaseConfig, base_url: &str) -> Result<Self, FirestoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        let documents_url = format!(
            "{}/projects/{}/databases/(default)/documents",
            base_url.trim_end_matches('/'),
            config.project_id
        );

        Ok(Self {
            inner: Arc::new(FirestoreClientInner {
                client,
                documents_url,
                api_key: config.api_key.clone(),
                id_token: RwLock::new(None),
            }),
        })
    }

    /// Attach (or clear) the signed-in user's id token to every request.
    pub fn set_id_token(&self, token: Option<SecretString>) {
        let mut slot = self
            .inner
            .id_token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = token;
    }

    #[cfg(test)]
    pub(crate) fn has_id_token(&self) -> bool {
        self.inner
            .id_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Check that the project's database answers.
    ///
    /// A permission error still counts as reachable: security rules may
    /// require a signed-in user for reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the key is rejected, or the
    /// database does not exist.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> Result<(), FirestoreError> {
        #[derive(Deserialize)]
        struct Ignored {}

        let url = self.url(&[super::ORDERS_COLLECTION], &[("pageSize", "1")])?;
        let response = self.authorized(self.inner.client.get(url)).send().await?;
        match Self::handle_response::<Ignored>(response).await {
            Ok(_) | Err(FirestoreError::PermissionDenied(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Create a document with a store-generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Firestore rejects the write.
    #[instrument(skip(self, fields))]
    pub async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
    ) -> Result<Document, FirestoreError> {
        let url = self.url(&[collection], &[])?;
        let request = self
            .authorized(self.inner.client.post(url))
            .json(&Document::from_fields(fields));

        Self::handle_response(request.send().await?).await
    }

    /// Fetch one document. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason other than 404.
    #[instrument(skip(self))]
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, FirestoreError> {
        let url = self.url(&[collection, id], &[])?;
        let response = self.authorized(self.inner.client.get(url)).send().await?;

        match Self::handle_response(response).await {
            Ok(doc) => Ok(Some(doc)),
            Err(FirestoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List every document in a collection, following page tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, FirestoreError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ListPage {
            #[serde(default)]
            documents: Vec<Document>,
            next_page_token: Option<String>,
        }

        let page_size = LIST_PAGE_SIZE.to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let url = self.url(&[collection], &query)?;
            let response = self.authorized(self.inner.client.get(url)).send().await?;
            let page: ListPage = Self::handle_response(response).await?;

            documents.extend(page.documents);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    /// Run a structured query over one collection, optionally ordered by a field.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the query is rejected.
    #[instrument(skip(self))]
    pub async fn run_query(
        &self,
        collection: &str,
        order_by: Option<(&str, Direction)>,
    ) -> Result<Vec<Document>, FirestoreError> {
        #[derive(Deserialize)]
        struct QueryRow {
            document: Option<Document>,
        }

        let mut structured = serde_json::json!({
            "from": [{ "collectionId": collection }],
        });
        if let Some((field, direction)) = order_by {
            structured["orderBy"] = serde_json::json!([{
                "field": { "fieldPath": field },
                "direction": direction,
            }]);
        }

        let url = self.run_query_url()?;
        let response = self
            .authorized(self.inner.client.post(url))
            .json(&serde_json::json!({ "structuredQuery": structured }))
            .send()
            .await?;

        // One row per result; a row without `document` only carries readTime
        let rows: Vec<QueryRow> = Self::handle_response(response).await?;
        Ok(rows.into_iter().filter_map(|row| row.document).collect())
    }

    /// Update the masked fields of a document.
    ///
    /// With `must_exist`, a missing document fails with
    /// `FirestoreError::NotFound` instead of being created.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a precondition is not met.
    #[instrument(skip(self, fields))]
    pub async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mask: &[&str],
        must_exist: bool,
    ) -> Result<Document, FirestoreError> {
        let mut query: Vec<(&str, &str)> =
            mask.iter().map(|path| ("updateMask.fieldPaths", *path)).collect();
        if must_exist {
            query.push(("currentDocument.exists", "true"));
        }

        let url = self.url(&[collection, id], &query)?;
        let response = self
            .authorized(self.inner.client.patch(url))
            .json(&Document::from_fields(fields))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, FirestoreError> {
        let mut url = Url::parse(&self.inner.documents_url)?;
        url.path_segments_mut()
            .map_err(|()| FirestoreError::Parse("documents URL cannot be a base".to_string()))?
            .extend(segments);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("key", self.inner.api_key.expose_secret());
        }
        Ok(url)
    }

    fn run_query_url(&self) -> Result<Url, FirestoreError> {
        let mut url = Url::parse(&format!("{}:runQuery", self.inner.documents_url))?;
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self
            .inner
            .id_token
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match token.as_ref() {
            Some(token) => request.header(
                AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    /// Decode a successful body or translate the error envelope.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, FirestoreError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map_err(|e| FirestoreError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(error_from_body(status, &body))
    }
}

/// Map an error status and body to a `FirestoreError`.
fn error_from_body(status: reqwest::StatusCode, body: &str) -> FirestoreError {
    let (api_status, message) = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(envelope) => (envelope.error.status, envelope.error.message),
        Err(_) => (status.to_string(), body.to_string()),
    };

    match status {
        reqwest::StatusCode::NOT_FOUND => FirestoreError::NotFound(message),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            FirestoreError::PermissionDenied(message)
        }
        _ => FirestoreError::Api {
            status: api_status,
            message,
        },
    }
}
