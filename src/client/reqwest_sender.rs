//! `HttpSender` backed by reqwest

use crate::client::{Auth, ClientConfig, HttpError, HttpRequest, HttpResponse, HttpSender, Method};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Production sender that talks to the tenant over HTTPS
#[derive(Debug, Clone)]
pub struct ReqwestSender {
    http: reqwest::Client,

    /// Timeout for a single request in seconds
    timeout_secs: u64,
}

impl ReqwestSender {
    /// Create a new sender
    ///
    /// # Errors
    /// Returns `HttpError::InvalidRequest` if the TLS backend cannot be
    /// initialised.
    pub fn new(config: ClientConfig) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HttpError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            timeout_secs: config.timeout_secs,
        })
    }

    #[cfg(test)]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn build(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.auth {
            Some(Auth::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            Some(Auth::Bearer(token)) => builder.bearer_auth(token),
            None => builder,
        };
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = request.method;
        let url = request.url.clone();
        debug!("{} {}", method, url);

        let response = self.build(request).send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout_secs)
            } else if e.is_builder() {
                HttpError::InvalidRequest(e.to_string())
            } else {
                HttpError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            warn!("failed to read body of {} {}: {}", method, url, e);
            HttpError::Transport(format!(
                "HTTP response body could not be read, response status code: {}: {}",
                status, e
            ))
        })?;

        debug!("{} {} returned {} ({} bytes)", method, url, status, body.len());

        Ok(HttpResponse { status, body })
    }
}
