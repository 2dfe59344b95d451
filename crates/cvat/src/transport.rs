//! HTTP transport for export downloads

use crate::error::{CvatError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::io::Read;
use std::time::Duration;

/// One export download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ExportRequest {
    /// Value of a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Transport-level failure, before any body is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status
    Status(u16),
    /// The request never produced a response
    Network(String),
}

/// Performs the GET behind a download
pub trait ExportTransport: Send + Sync {
    /// Issue the request and return the response body as a stream
    fn get(&self, request: &ExportRequest) -> std::result::Result<Box<dyn Read + Send>, TransportError>;
}

/// Blocking reqwest transport that sends `Authorization` on every request
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(auth: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(auth).map_err(|e| CvatError::InvalidAuth(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CvatError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl ExportTransport for ReqwestTransport {
    fn get(&self, request: &ExportRequest) -> std::result::Result<Box<dyn Read + Send>, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .query(&request.params)
            .timeout(request.timeout)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(Box::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_param_lookup() {
        let request = ExportRequest {
            url: "https://example.com/api/v1/tasks/1/dataset".to_string(),
            params: vec![("action".to_string(), "download".to_string())],
            timeout: Duration::from_secs(5),
        };
        assert_eq!(request.param("action"), Some("download"));
        assert_eq!(request.param("format"), None);
    }

    #[test]
    fn test_reqwest_transport_rejects_invalid_header() {
        let err = ReqwestTransport::new("Bearer bad\ntoken").unwrap_err();
        assert!(matches!(err, CvatError::InvalidAuth(_)));
    }
}
