//! HTTP transport implementation.
//!
//! `ReqwestHttpClient` is the default `HttpClient`: a blocking reqwest client
//! speaking JSON over HTTP(S) with rustls.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpClient, HttpResponse};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use wukongim_protocol::{Method, WireRequest};

/// Blocking reqwest transport.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a transport using the timeout and user agent of `config`.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&self, base_url: &str, request: &WireRequest) -> Result<HttpResponse, String> {
        let url = format!("{}{}", base_url, request.path());
        let json = HeaderValue::from_static("application/json");

        let builder = match request.method() {
            Method::Get => self
                .client
                .get(&url)
                .query(&request.query)
                .header(CONTENT_TYPE, json.clone()),
            Method::Post => {
                let body = request.body.clone().unwrap_or(serde_json::Value::Null);
                self.client.post(&url).json(&body)
            }
        };

        let response = builder
            .header(ACCEPT, json)
            .send()
            .map_err(|e| describe(&e))?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| describe(&e))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wukongim_protocol::Operation;

    #[test]
    fn builds_from_config() {
        let config =
            ClientConfig::new("http://127.0.0.1:5001").with_timeout(Duration::from_secs(1));
        assert!(ReqwestHttpClient::new(&config).is_ok());
    }

    #[test]
    fn connection_refused_is_an_error() {
        // Port 9 (discard) is closed on test machines.
        let config =
            ClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500));
        let client = ReqwestHttpClient::new(&config).unwrap();
        let request = Operation::Route { uid: "u1".into() }.build().unwrap();

        assert!(client.execute(config.base_url(), &request).is_err());
    }
}
