//! Settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::AppError;
use book_search_ingest::DEFAULT_BATCH_SIZE;
use book_search_repository::{ClientConfig, DEFAULT_URL};
use book_search_shared::BOOKS_INDEX;

/// Published sample dataset used when no source is given.
pub const DEFAULT_BOOKS_CSV_URL: &str =
    "https://raw.githubusercontent.com/elastic/elasticsearch-php-examples/main/examples/ESQL/data/books.csv";

/// Default username for basic authentication.
const DEFAULT_USERNAME: &str = "elastic";

/// Default timeout, in seconds, for backend requests and dataset downloads.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub elasticsearch_url: String,
    pub username: String,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub ca_cert_path: Option<PathBuf>,
    pub books_csv_url: String,
    pub books_index: String,
    pub http_timeout: Duration,
    pub bulk_batch_size: usize,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `ELASTICSEARCH_URL`: backend URL (default: http://localhost:9200)
    /// - `ELASTICSEARCH_USERNAME`: basic auth user (default: elastic)
    /// - `ESPSWD`: basic auth password; credentials are only sent when set
    /// - `ELASTICSEARCH_API_KEY`: encoded API key
    /// - `ELASTICSEARCH_CA_CERT`: path to a PEM CA certificate
    /// - `BOOKS_CSV_URL`: dataset location (default: the published books.csv)
    /// - `BOOKS_INDEX`: index name (default: books)
    /// - `HTTP_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    /// - `BULK_BATCH_SIZE`: records per bulk request when seeding (default: 1000)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AppError::config(format!("HTTP_TIMEOUT_SECS must be a whole number, got {:?}", raw))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let bulk_batch_size = match get("BULK_BATCH_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(AppError::config(format!(
                        "BULK_BATCH_SIZE must be a positive whole number, got {:?}",
                        raw
                    )))
                }
            },
            None => DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            elasticsearch_url: get("ELASTICSEARCH_URL").unwrap_or_else(|| DEFAULT_URL.to_string()),
            username: get("ELASTICSEARCH_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: get("ESPSWD"),
            api_key: get("ELASTICSEARCH_API_KEY"),
            ca_cert_path: get("ELASTICSEARCH_CA_CERT").map(PathBuf::from),
            books_csv_url: get("BOOKS_CSV_URL").unwrap_or_else(|| DEFAULT_BOOKS_CSV_URL.to_string()),
            books_index: get("BOOKS_INDEX").unwrap_or_else(|| BOOKS_INDEX.to_string()),
            http_timeout,
            bulk_batch_size,
        })
    }

    /// Build the backend client configuration, reading the CA certificate
    /// from disk when one is configured.
    pub fn client_config(&self) -> Result<ClientConfig, AppError> {
        let mut config =
            ClientConfig::new(self.elasticsearch_url.clone()).with_timeout(self.http_timeout);

        if let Some(path) = &self.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                AppError::config(format!("Failed to read CA certificate {}: {}", path.display(), e))
            })?;
            config = config.with_ca_certificate(pem);
        }
        if let Some(password) = &self.password {
            config = config.with_basic_auth(self.username.clone(), password.clone());
        }
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key.clone());
        }
        Ok(config)
    }
}
