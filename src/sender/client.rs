//! `Sender` trait and the reqwest-backed `HttpSender`.
//!
//! The service speaks plain HTTP: the container bytes are the request body
//! and the answer is JSON.  All connection details come from
//! [`ServerConfig`].

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::encode::EncodedContainer;

use super::response::{RecognitionResult, UploadResult};

// ---------------------------------------------------------------------------
// SendError
// ---------------------------------------------------------------------------

/// Errors that can occur while handing a container to the service.
#[derive(Debug, Error)]
pub enum SendError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Non-success status without a recognisable error body.
    #[error("server returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The service answered with `{"error": ...}`.
    #[error("server error: {0}")]
    Server(String),
}

impl From<reqwest::Error> for SendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SendError::Timeout
        } else {
            SendError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Sender trait
// ---------------------------------------------------------------------------

/// Async boundary between a finished recording and the recognition service.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn Sender>`.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn recognize(&self, container: &EncodedContainer)
        -> Result<RecognitionResult, SendError>;
}

// ---------------------------------------------------------------------------
// HttpSender
// ---------------------------------------------------------------------------

/// Posts containers to `{base_url}/recognize` and `{base_url}/upload`.
pub struct HttpSender {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSender {
    /// Build an `HttpSender` from application config.
    ///
    /// The client carries the per-request timeout from
    /// `config.timeout_secs`; a plain client is used if the builder fails.
    pub fn from_config(config: &ServerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Register a reference track under `name`.
    pub async fn upload(
        &self,
        name: &str,
        container: &EncodedContainer,
    ) -> Result<UploadResult, SendError> {
        let response = self
            .client
            .post(self.endpoint("upload"))
            .query(&[("name", name)])
            .header(reqwest::header::CONTENT_TYPE, EncodedContainer::CONTENT_TYPE)
            .body(container.as_bytes().to_vec())
            .send()
            .await?;

        let result: UploadResult = read_json(response).await?;
        match result.error {
            Some(message) => Err(SendError::Server(message)),
            None => {
                log::info!("sender: uploaded {:?}", result.name);
                Ok(result)
            }
        }
    }
}

#[async_trait]
impl Sender for HttpSender {
    async fn recognize(
        &self,
        container: &EncodedContainer,
    ) -> Result<RecognitionResult, SendError> {
        log::debug!(
            "sender: posting {} bytes ({:.2} s) to {}",
            container.len(),
            container.duration_secs(),
            self.endpoint("recognize")
        );

        let response = self
            .client
            .post(self.endpoint("recognize"))
            .header(reqwest::header::CONTENT_TYPE, EncodedContainer::CONTENT_TYPE)
            .body(container.as_bytes().to_vec())
            .send()
            .await?;

        let result: RecognitionResult = read_json(response).await?;
        match result.error {
            Some(message) => Err(SendError::Server(message)),
            None => Ok(result),
        }
    }
}

/// Decode a JSON body.  An `{"error": ...}` body on a failed status is
/// surfaced as [`SendError::Server`]; anything else unparseable on a failed
/// status becomes [`SendError::Status`].
async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        if let Some(message) = error_message(&body) {
            return Err(SendError::Server(message));
        }
        return Err(SendError::Status {
            code: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| SendError::Parse(e.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json["error"].as_str().map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(base_url: &str) -> ServerConfig {
        ServerConfig {
            base_url: base_url.into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn from_config_strips_trailing_slash() {
        let sender = HttpSender::from_config(&make_config("http://localhost:5001/"));
        assert_eq!(sender.base_url(), "http://localhost:5001");
        assert_eq!(sender.endpoint("recognize"), "http://localhost:5001/recognize");
    }

    #[test]
    fn error_message_extracts_error_field() {
        assert_eq!(
            error_message(r#"{"error":"no file"}"#).as_deref(),
            Some("no file")
        );
        assert!(error_message(r#"{"match":null}"#).is_none());
        assert!(error_message("<html>502</html>").is_none());
    }

    #[test]
    fn send_error_display() {
        let err = SendError::Status {
            code: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "server returned HTTP 502: bad gateway");
        assert_eq!(SendError::Timeout.to_string(), "request timed out");
    }

    /// `HttpSender` must be usable as `dyn Sender`.
    #[test]
    fn sender_is_object_safe() {
        let sender: Box<dyn Sender> = Box::new(HttpSender::from_config(&make_config(
            "http://localhost:5001",
        )));
        drop(sender);
    }

    #[tokio::test]
    async fn unreachable_server_is_request_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let sender = HttpSender::from_config(&make_config("http://127.0.0.1:9"));
        let container = crate::encode::encode(
            &[0.0; 16],
            &crate::encode::ContainerDescriptor::new(8_000).unwrap(),
        )
        .unwrap();

        let err = sender.recognize(&container).await.unwrap_err();
        assert!(matches!(err, SendError::Request(_) | SendError::Timeout));
    }
}
