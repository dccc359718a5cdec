//! REST adapter for the hosted Parse-compatible backend.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use homedash_core::{
    AuthGateway, Document, ListenerHandle, ListenerRegistry, QueryOptions, RecordEvent,
    RecordEventKind, RecordListener, RecordStore, StoreHealth,
};
use homedash_domain::constants::SUBSCRIPTION_COLLECTION;
use homedash_domain::{
    ApiFailure, ApiResult, CollectionSchema, Config, ConnectionConfig, Credentials, HomedashError,
    HttpConfig, Result, RetryPolicy, UserRecord,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};
use url::form_urlencoded;

use super::codec::{decode_document, encode_document, encode_filter, strip_reserved};
use crate::config::validate_config;
use crate::http::{HttpClient, RequestOptions};

pub const APP_ID_HEADER: &str = "X-App-Id";
pub const REST_KEY_HEADER: &str = "X-REST-API-Key";
pub const MASTER_KEY_HEADER: &str = "X-Master-Key";
pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

/// Statuses the readiness probe treats as "reachable": the collection may
/// not exist yet, or the key may lack class-level read access.
const TOLERATED_PROBE_STATUSES: [u16; 2] = [403, 404];

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    object_id: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedResponse {
    #[serde(default)]
    updated_at: Option<String>,
}

/// CRUD, credential exchange and a process-local change feed over the
/// backend's REST API.
///
/// Every data method fails with [`HomedashError::NotInitialized`] until
/// [`RecordStore::initialize`] has succeeded once.
pub struct BackendRestAdapter {
    http: HttpClient,
    connection: ConnectionConfig,
    initialized: OnceCell<()>,
    listeners: ListenerRegistry<RecordEvent>,
}

impl fmt::Debug for BackendRestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRestAdapter")
            .field("connection", &self.connection)
            .field("initialized", &self.is_initialized())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl BackendRestAdapter {
    /// Validate `config` and build an adapter with its own HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        validate_config(config)?;
        Self::new(config.backend.clone(), &config.http)
    }

    pub fn new(connection: ConnectionConfig, http: &HttpConfig) -> Result<Self> {
        let client = HttpClient::builder().base_url(connection.base_url()).config(http).build()?;
        Self::with_http_client(connection, client)
    }

    /// Use a prebuilt client; requests go to the client's base URL.
    pub fn with_http_client(connection: ConnectionConfig, http: HttpClient) -> Result<Self> {
        if !connection.validate() {
            return Err(HomedashError::Config(format!(
                "Invalid backend configuration for {}: application id and REST key are required \
                 and the server URL must use https://",
                connection.server_url
            )));
        }

        Ok(Self {
            http,
            connection,
            initialized: OnceCell::new(),
            listeners: ListenerRegistry::new(),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Number of change-feed listeners across all collections.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(HomedashError::NotInitialized)
        }
    }

    /// Authentication headers for every call; the master key replaces the
    /// REST key when configured.
    fn request_options(&self) -> RequestOptions {
        let options = RequestOptions::new().header(APP_ID_HEADER, &self.connection.application_id);
        match &self.connection.master_key {
            Some(master_key) => options.header(MASTER_KEY_HEADER, master_key),
            None => options.header(REST_KEY_HEADER, &self.connection.rest_api_key),
        }
    }

    async fn probe(&self, options: &RequestOptions) -> Result<()> {
        let endpoint = format!("{}?limit=1", collection_endpoint(SUBSCRIPTION_COLLECTION));
        match self.http.get::<Value>(&endpoint, options).await? {
            ApiResult::Success(_) => Ok(()),
            ApiResult::Failure(failure) if TOLERATED_PROBE_STATUSES.contains(&failure.code) => {
                debug!(code = failure.code, "readiness probe tolerated");
                Ok(())
            }
            ApiResult::Failure(failure) => Err(HomedashError::Network(format!(
                "Backend initialization failed: {}",
                failure_message(&failure)
            ))),
        }
    }

    fn emit(&self, kind: RecordEventKind, schema: &CollectionSchema, record: Document) {
        let delivered = self.listeners.emit(&RecordEvent::new(kind, schema.name, record));
        debug!(collection = schema.name, ?kind, delivered, "change feed notified");
    }

    async fn fetch_user(&self, credentials: &Credentials) -> Result<ApiResult<Value>> {
        match credentials {
            Credentials::Password { username, password } => {
                let body = json!({ "username": username, "password": password });
                self.http.post("/login", &body, &self.request_options()).await
            }
            Credentials::SessionToken { session_token } => {
                let options = self.request_options().header(SESSION_TOKEN_HEADER, session_token);
                self.http.get("/users/me", &options).await
            }
        }
    }
}

#[async_trait]
impl RecordStore for BackendRestAdapter {
    async fn initialize(&self) -> Result<()> {
        let options = self.request_options();
        self.initialized
            .get_or_try_init(|| async {
                self.probe(&options).await?;
                info!(server = %self.connection.base_url(), "backend client initialized");
                Ok::<(), HomedashError>(())
            })
            .await?;
        Ok(())
    }

    #[instrument(skip(self, options), fields(collection = schema.name))]
    async fn query(&self, schema: &CollectionSchema, options: &QueryOptions) -> Result<Vec<Document>> {
        self.ensure_initialized()?;

        let endpoint = query_endpoint(schema, options)?;
        let response: QueryResponse =
            into_result(self.http.get(&endpoint, &self.request_options()).await?)?;

        response
            .results
            .into_iter()
            .map(|result| match result {
                Value::Object(raw) => Ok(decode_document(raw)),
                other => Err(HomedashError::Serialization(format!(
                    "expected an object in {} results, got {other}",
                    schema.name
                ))),
            })
            .collect()
    }

    #[instrument(skip(self, data), fields(collection = schema.name))]
    async fn create(&self, schema: &CollectionSchema, data: Document) -> Result<Document> {
        self.ensure_initialized()?;

        let data = strip_reserved(data);
        let body = Value::Object(encode_document(schema, &data));
        let created: CreatedResponse = into_result(
            self.http.post(&collection_endpoint(schema.name), &body, &self.request_options()).await?,
        )?;

        let created_at = created.created_at.unwrap_or_else(now);
        let mut record = data;
        record.insert("id".into(), Value::String(created.object_id));
        record.insert("createdAt".into(), Value::String(created_at.clone()));
        record.insert("updatedAt".into(), Value::String(created_at));

        self.emit(RecordEventKind::Created, schema, record.clone());
        Ok(record)
    }

    #[instrument(skip(self, data), fields(collection = schema.name))]
    async fn update(&self, schema: &CollectionSchema, id: &str, data: Document) -> Result<Document> {
        self.ensure_initialized()?;

        let data = strip_reserved(data);
        let body = Value::Object(encode_document(schema, &data));
        let updated: UpdatedResponse = into_result(
            self.http.put(&record_endpoint(schema.name, id), &body, &self.request_options()).await?,
        )?;

        let mut record = data;
        record.insert("id".into(), Value::String(id.to_string()));
        record.insert("updatedAt".into(), Value::String(updated.updated_at.unwrap_or_else(now)));

        self.emit(RecordEventKind::Updated, schema, record.clone());
        Ok(record)
    }

    #[instrument(skip(self), fields(collection = schema.name))]
    async fn delete(&self, schema: &CollectionSchema, id: &str) -> Result<()> {
        self.ensure_initialized()?;

        into_result::<Value>(
            self.http.delete(&record_endpoint(schema.name, id), &self.request_options()).await?,
        )?;

        let mut record = Document::new();
        record.insert("id".into(), Value::String(id.to_string()));
        self.emit(RecordEventKind::Deleted, schema, record);
        Ok(())
    }

    fn subscribe(&self, collection: &str, listener: RecordListener) -> ListenerHandle {
        let collection = collection.to_string();
        self.listeners.subscribe(Arc::new(move |event: &RecordEvent| {
            if event.collection == collection {
                listener(event);
            }
        }))
    }

    async fn health(&self) -> StoreHealth {
        let options = self.request_options().retry(RetryPolicy::no_retry());
        let error = self.probe(&options).await.err().map(|err| err.to_string());
        StoreHealth { initialized: self.is_initialized(), reachable: error.is_none(), error }
    }
}

#[async_trait]
impl AuthGateway for BackendRestAdapter {
    #[instrument(skip_all)]
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserRecord> {
        self.initialize().await?;

        let raw = match self.fetch_user(credentials).await? {
            ApiResult::Success(Value::Object(raw)) => raw,
            ApiResult::Success(other) => {
                return Err(HomedashError::Serialization(format!("expected a user object, got {other}")))
            }
            ApiResult::Failure(failure) if failure.is_client_error() => {
                return Err(HomedashError::Auth(failure_message(&failure)))
            }
            ApiResult::Failure(failure) => return Err(failure_to_error(failure)),
        };

        let mut user = decode_document(raw);
        if let Credentials::SessionToken { session_token } = credentials {
            user.entry("sessionToken").or_insert_with(|| Value::String(session_token.clone()));
        }
        let user: UserRecord = serde_json::from_value(Value::Object(user))?;
        debug!(user_id = %user.id, "credentials accepted");
        Ok(user)
    }

    #[instrument(skip_all)]
    async fn invalidate_session(&self, session_token: &str) -> Result<()> {
        let options = self.request_options().header(SESSION_TOKEN_HEADER, session_token);
        into_result::<Value>(self.http.post("/logout", &json!({}), &options).await?)?;
        Ok(())
    }
}

fn collection_endpoint(collection: &str) -> String {
    format!("/classes/{collection}")
}

fn record_endpoint(collection: &str, id: &str) -> String {
    let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("/classes/{collection}/{id}")
}

/// `/classes/{name}` with `where`, paging, ordering and projection encoded
/// as query parameters.
fn query_endpoint(schema: &CollectionSchema, options: &QueryOptions) -> Result<String> {
    let mut params = form_urlencoded::Serializer::new(String::new());

    if !options.filter.is_empty() {
        let filter = Value::Object(encode_filter(schema, &options.filter));
        params.append_pair("where", &serde_json::to_string(&filter)?);
    }
    if let Some(limit) = options.limit {
        params.append_pair("limit", &limit.to_string());
    }
    if let Some(skip) = options.skip {
        params.append_pair("skip", &skip.to_string());
    }
    if let Some(order) = options.order_param() {
        params.append_pair("order", &order);
    }
    if !options.include.is_empty() {
        params.append_pair("include", &options.include.join(","));
    }
    if !options.keys.is_empty() {
        params.append_pair("keys", &options.keys.join(","));
    }

    let query = params.finish();
    let endpoint = collection_endpoint(schema.name);
    Ok(if query.is_empty() { endpoint } else { format!("{endpoint}?{query}") })
}

fn into_result<T>(result: ApiResult<T>) -> Result<T> {
    result.into_result().map_err(failure_to_error)
}

/// Backend `error` field if present, else the HTTP status text, else the
/// client's own description (timeouts, transport failures).
fn failure_message(failure: &ApiFailure) -> String {
    failure
        .detail("body")
        .and_then(|body| body.get("error"))
        .and_then(Value::as_str)
        .or_else(|| failure.detail("statusText").and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .map_or_else(|| failure.message.clone(), str::to_string)
}

fn failure_to_error(failure: ApiFailure) -> HomedashError {
    let message = failure_message(&failure);
    if failure.is_client_error() {
        HomedashError::client(failure.code, message)
    } else {
        HomedashError::Network(message)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use homedash_domain::FOOD_SCHEMA;
    use serde_json::json;

    use super::*;

    #[test]
    fn query_endpoint_encodes_every_option() {
        let options = QueryOptions::new()
            .filter("todate", json!({"$lt": "2025-01-01"}))
            .limit(10)
            .skip(20)
            .order_by("-createdAt")
            .order_by("name")
            .include("owner")
            .select("category");

        let endpoint = query_endpoint(&FOOD_SCHEMA, &options).unwrap();
        let (path, query) = endpoint.split_once('?').unwrap();
        assert_eq!(path, "/classes/food");

        let params: Vec<(String, String)> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        let get = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

        let filter: Value = serde_json::from_str(get("where").unwrap()).unwrap();
        assert_eq!(filter["todate"]["$lt"]["__type"], "Date");
        assert_eq!(get("limit"), Some("10"));
        assert_eq!(get("skip"), Some("20"));
        assert_eq!(get("order"), Some("-createdAt,name"));
        assert_eq!(get("include"), Some("owner"));
        assert_eq!(get("keys"), Some("category"));
    }

    #[test]
    fn bare_query_has_no_parameters() {
        assert_eq!(query_endpoint(&FOOD_SCHEMA, &QueryOptions::new()).unwrap(), "/classes/food");
    }

    #[test]
    fn failures_prefer_the_backend_message() {
        let failure = ApiFailure::new(404, "HTTP 404: Not Found")
            .with_detail("statusText", "Not Found")
            .with_detail("body", json!({"code": 101, "error": "Object not found."}));
        assert_eq!(failure_to_error(failure), HomedashError::client(404, "Object not found."));

        let failure = ApiFailure::new(400, "HTTP 400: Bad Request").with_detail("statusText", "Bad Request");
        assert_eq!(failure_to_error(failure), HomedashError::client(400, "Bad Request"));

        let failure = ApiFailure::new(408, "Request timeout after 50ms");
        assert_eq!(failure_to_error(failure), HomedashError::Network("Request timeout after 50ms".into()));
    }

    #[test]
    fn record_ids_are_escaped() {
        assert_eq!(record_endpoint("food", "a/b"), "/classes/food/a%2Fb");
        assert_eq!(record_endpoint("food", "Xy12"), "/classes/food/Xy12");
    }
}
