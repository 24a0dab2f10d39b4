//! Opening input streams.
//!
//! Sources are read incrementally: an HTTP response body is handed to the
//! record reader as it arrives, and files are read through the reader's own
//! buffer.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::info;
use url::Url;

use crate::errors::IngestError;

/// Where the delimited input lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Http(Url),
    File(PathBuf),
}

impl SourceLocation {
    /// Interpret `location` as an `http(s)://` or `file://` URL, otherwise as
    /// a local path.
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Self::Http(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Self::File(path),
                Err(()) => Self::File(PathBuf::from(location)),
            },
            _ => Self::File(PathBuf::from(location)),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Blocking HTTP fetcher for delimited input.
///
/// Must not be created or dropped on an async runtime thread; run it under
/// `tokio::task::spawn_blocking`.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Create a fetcher. `timeout` bounds the whole transfer, body included;
    /// `None` disables it.
    pub fn new(timeout: Option<Duration>) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Issue a GET and return the streaming response body.
    ///
    /// # Returns
    ///
    /// * `Err(IngestError::TransportError)` - On connection failure or a non-success status
    pub fn open(&self, url: &Url) -> Result<Response, IngestError> {
        info!(url = %url, "Fetching source");

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| IngestError::transport(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::transport(format!(
                "GET {} returned status {}",
                url, status
            )));
        }
        Ok(response)
    }
}

/// Open `location` for reading.
pub fn open_location(
    location: &SourceLocation,
    http: &HttpSource,
) -> Result<Box<dyn Read + Send>, IngestError> {
    match location {
        SourceLocation::Http(url) => Ok(Box::new(http.open(url)?)),
        SourceLocation::File(path) => {
            let file = File::open(path).map_err(|e| {
                IngestError::transport(format!("Failed to open {}: {}", path.display(), e))
            })?;
            Ok(Box::new(file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locations() {
        assert!(matches!(
            SourceLocation::parse("https://example.com/books.csv"),
            SourceLocation::Http(_)
        ));
        assert_eq!(
            SourceLocation::parse("data/books.csv"),
            SourceLocation::File(PathBuf::from("data/books.csv"))
        );
        assert_eq!(
            SourceLocation::parse("file:///tmp/books.csv"),
            SourceLocation::File(PathBuf::from("/tmp/books.csv"))
        );
    }

    #[test]
    fn test_missing_file_is_transport_error() {
        let http = HttpSource::new(Some(Duration::from_secs(1))).unwrap();
        let location = SourceLocation::File(PathBuf::from("/nonexistent/books.csv"));

        let result = open_location(&location, &http);
        assert!(matches!(result, Err(IngestError::TransportError(_))));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let http = HttpSource::new(Some(Duration::from_secs(2))).unwrap();
        // Nothing listens on the discard port
        let url = Url::parse("http://127.0.0.1:9/books.csv").unwrap();

        assert!(matches!(http.open(&url), Err(IngestError::TransportError(_))));
    }

    /// Serve one canned HTTP response on a local port.
    fn serve_once(response: &'static str) -> Url {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
        });
        Url::parse(&format!("http://127.0.0.1:{}/books.csv", port)).unwrap()
    }

    #[test]
    fn test_non_success_status_is_transport_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let http = HttpSource::new(Some(Duration::from_secs(5))).unwrap();

        match http.open(&url) {
            Err(IngestError::TransportError(msg)) => assert!(msg.contains("404"), "{}", msg),
            other => panic!("expected transport error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_success_streams_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 11\r\nConnection: close\r\n\r\ntitle;year\n",
        );
        let http = HttpSource::new(Some(Duration::from_secs(5))).unwrap();

        let mut body = String::new();
        open_location(&SourceLocation::Http(url), &http)
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "title;year\n");
    }
}
