//! Backend client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the `opensearch` HTTP transport.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    cert::{Certificate, CertificateValidation},
    cluster::ClusterHealthParts,
    http::headers::{HeaderMap, HeaderValue, AUTHORIZATION},
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    http::Method,
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesRefreshParts},
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::types::{BulkSummary, EsqlRequest, EsqlResponse};

/// Path of the ES|QL query endpoint.
const ESQL_PATH: &str = "/_query";

/// Backend client implementation.
///
/// # Example
///
/// ```ignore
/// let config = ClientConfig::new("https://localhost:9200")
///     .with_basic_auth("elastic", "changeme");
/// let client = ElasticsearchClient::new(&config)?;
///
/// let response = client
///     .esql_query(&EsqlRequest::new("from books | limit 5"))
///     .await?;
/// println!("{} rows", response.len());
/// ```
pub struct ElasticsearchClient {
    client: OpenSearch,
}

impl ElasticsearchClient {
    /// Create a new client from the connection settings.
    ///
    /// No request is sent; an unreachable backend surfaces on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(ElasticsearchClient)` - A new client instance
    /// * `Err(SearchError::ConnectionError)` - If the URL, certificate or
    ///   headers are invalid, or the transport cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self, SearchError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();

        if let Some(ref pem) = config.ca_certificate {
            let certificate = Certificate::from_pem(pem)
                .map_err(|e| SearchError::connection(format!("Invalid CA certificate: {}", e)))?;
            builder = builder.cert_validation(CertificateValidation::Full(certificate));
        }

        if let Some((ref username, ref password)) = config.credentials {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }

        if let Some(header) = config.api_key_header() {
            let value = HeaderValue::from_str(&header)
                .map_err(|e| SearchError::connection(format!("Invalid API key: {}", e)))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(
            url = %config.url,
            tls = config.ca_certificate.is_some(),
            basic_auth = config.credentials.is_some(),
            api_key = config.api_key.is_some(),
            "Created search backend client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// Request body for a bulk payload: the payload without trailing blank
    /// lines. The transport terminates it with a single newline. `None` when
    /// nothing is left.
    fn bulk_body(payload: &[u8]) -> Option<&[u8]> {
        payload
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map(|last| &payload[..=last])
    }
}

#[async_trait]
impl SearchEngineClient for ElasticsearchClient {
    #[instrument(skip(self, request), fields(params = request.params.len()))]
    async fn esql_query(&self, request: &EsqlRequest) -> Result<EsqlResponse, SearchError> {
        debug!(query = %request.query, "Executing ES|QL query");

        let response = self
            .client
            .send(
                Method::Post,
                ESQL_PATH,
                HeaderMap::new(),
                None::<&()>,
                Some(JsonBody::new(request)),
                None,
            )
            .await
            .map_err(|e| SearchError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "ES|QL request failed");
            return Err(SearchError::query(format!(
                "Query failed with status {}: {}",
                status, error_body
            )));
        }

        let result: EsqlResponse = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        debug!(
            columns = result.columns.len(),
            rows = result.len(),
            "ES|QL query completed"
        );
        Ok(result)
    }

    #[instrument(skip(self, settings))]
    async fn ensure_index_exists(&self, index: &str, settings: &Value) -> Result<(), SearchError> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if exists.status_code().is_success() {
            debug!(index = %index, "Index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(settings.clone())
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another caller may have created it between the two requests
            if error_body.contains("resource_already_exists_exception") {
                warn!(index = %index, "Index was created concurrently");
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index, "Created index");
        Ok(())
    }

    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    async fn bulk_index(&self, index: &str, payload: &[u8]) -> Result<BulkSummary, SearchError> {
        let Some(body) = Self::bulk_body(payload) else {
            debug!(index = %index, "Empty bulk payload, nothing to send");
            return Ok(BulkSummary::default());
        };

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(vec![body])
            .send()
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;
        let summary = BulkSummary::from_response(&response_body);

        if summary.failed > 0 {
            warn!(
                index = %index,
                failed = summary.failed,
                total = summary.total,
                "Bulk request had item failures"
            );
        } else {
            debug!(index = %index, total = summary.total, "Bulk request completed");
        }
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn refresh_index(&self, index: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::index_creation(format!(
                "Refresh failed with status {}: {}",
                status, error_body
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let health: Value = response.json().await.unwrap_or(json!({}));
        let status = health
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        info!(status = %status, "Cluster health");
        Ok(status == "green" || status == "yellow")
    }
}
