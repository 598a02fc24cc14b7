//! Firestore REST backend for analysis history.
//!
//! Records live in one collection. Each document holds the record's own
//! fields plus `createdAt`, a timestamp derived from the record's
//! `timestamp`, which the history query orders by.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use equicheck_core::AnalysisResult;
use equicheck_store::{RemoteBackend, StoreError};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::value::{self, CodecError};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_COLLECTION: &str = "analyses";
pub const CREATED_AT_FIELD: &str = "createdAt";

#[derive(Error, Debug)]
pub enum FirestoreError {
    #[error("missing Firestore configuration: {0}")]
    MissingConfig(&'static str),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Where the history collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
    pub database: String,
    pub collection: String,
    /// No trailing slash.
    pub base_url: String,
}

impl FirestoreConfig {
    /// Build from the two settings that switch the remote path on.
    ///
    /// Either one missing or blank means "no remote backend".
    pub fn from_parts(
        api_key: Option<&str>,
        project_id: Option<&str>,
    ) -> Result<Self, FirestoreError> {
        let api_key = non_blank(api_key).ok_or(FirestoreError::MissingConfig("api key"))?;
        let project_id =
            non_blank(project_id).ok_or(FirestoreError::MissingConfig("project id"))?;
        Ok(Self {
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url, self.project_id, self.database
        )
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.documents_root(), self.collection)
    }

    fn run_query_url(&self) -> String {
        format!("{}:runQuery", self.documents_root())
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Firestore-backed history collection.
pub struct FirestoreBackend {
    client: reqwest::Client,
    config: FirestoreConfig,
}

impl FirestoreBackend {
    pub fn new(config: FirestoreConfig) -> Self {
        info!(
            project = %config.project_id,
            collection = %config.collection,
            "Firestore backend initialised"
        );
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    /// Create a document with a server-assigned id. Returns that id.
    pub async fn create_document(&self, record: &AnalysisResult) -> Result<String, FirestoreError> {
        let url = self.config.collection_url();
        let body = json!({ "fields": encode_record(record)? });

        debug!(url = %url, id = %record.id, "creating Firestore document");
        let resp = self
            .client
            .post(&url)
            .query(&[("key", &self.config.api_key)])
            .json(&body)
            .send()
            .await?;
        let created = check(resp).await?;
        document_id(&created)
    }

    /// Every document in the collection ordered by `createdAt` descending.
    pub async fn query_newest_first(&self) -> Result<Vec<AnalysisResult>, FirestoreError> {
        let url = self.config.run_query_url();
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.config.collection }],
                "orderBy": [{
                    "field": { "fieldPath": CREATED_AT_FIELD },
                    "direction": "DESCENDING"
                }]
            }
        });

        debug!(url = %url, "querying Firestore history");
        let resp = self
            .client
            .post(&url)
            .query(&[("key", &self.config.api_key)])
            .json(&body)
            .send()
            .await?;
        let rows = check(resp).await?;
        decode_query_rows(&rows)
    }
}

#[async_trait]
impl RemoteBackend for FirestoreBackend {
    fn name(&self) -> &str {
        "firestore"
    }

    async fn insert(&self, record: &AnalysisResult) -> Result<String, StoreError> {
        self.create_document(record)
            .await
            .map_err(|e| StoreError::RemoteWriteFailed(e.to_string()))
    }

    async fn list_newest_first(&self) -> Result<Vec<AnalysisResult>, StoreError> {
        self.query_newest_first()
            .await
            .map_err(|e| StoreError::RemoteReadFailed(e.to_string()))
    }
}

async fn check(resp: reqwest::Response) -> Result<Value, FirestoreError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FirestoreError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json().await?)
}

// ── Document mapping ──

/// Document `fields` for a record: its own fields plus `createdAt`.
pub fn encode_record(record: &AnalysisResult) -> Result<Map<String, Value>, FirestoreError> {
    let Value::Object(mut map) = serde_json::to_value(record)? else {
        return Err(FirestoreError::Unexpected("record did not serialise to an object".into()));
    };
    map.remove(CREATED_AT_FIELD);
    let mut fields = value::encode_fields(&map);
    fields.insert(
        CREATED_AT_FIELD.to_string(),
        json!({ "timestampValue": millis_to_rfc3339(record.timestamp)? }),
    );
    Ok(fields)
}

/// Record from a document's `fields`, ignoring `createdAt`.
pub fn decode_record(fields: &Map<String, Value>) -> Result<AnalysisResult, FirestoreError> {
    let mut map = value::decode_fields(fields)?;
    map.remove(CREATED_AT_FIELD);
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Records from a `runQuery` response array, in response order.
///
/// Rows without a `document` (read-time markers) are skipped. A document
/// that no longer decodes as a record is skipped with a warning rather than
/// failing the whole history.
pub fn decode_query_rows(rows: &Value) -> Result<Vec<AnalysisResult>, FirestoreError> {
    let rows = rows
        .as_array()
        .ok_or_else(|| FirestoreError::Unexpected("runQuery response is not an array".into()))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(doc) = row.get("document") else {
            continue;
        };
        let empty = Map::new();
        let fields = doc.get("fields").and_then(Value::as_object).unwrap_or(&empty);
        match decode_record(fields) {
            Ok(record) => records.push(record),
            Err(e) => {
                let name = doc.get("name").and_then(Value::as_str).unwrap_or("<unnamed>");
                warn!(document = name, error = %e, "skipping undecodable history document");
            }
        }
    }
    Ok(records)
}

/// Last path segment of a created document's `name`.
fn document_id(created: &Value) -> Result<String, FirestoreError> {
    created
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| FirestoreError::Unexpected(format!("created document has no name: {created}")))
}

fn millis_to_rfc3339(millis: i64) -> Result<String, FirestoreError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| FirestoreError::Unexpected(format!("timestamp out of range: {millis}")))
}
