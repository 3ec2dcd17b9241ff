//! Test utilities for cpi-steps

#![allow(dead_code)]

use async_trait::async_trait;
use cpi_steps::client::{HttpError, HttpRequest, HttpResponse, HttpSender};
use cpi_steps::cpi::ServiceKeySource;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const HOST: &str = "https://tenant.it-cpi.example.com";
pub const TOKEN_URL: &str = "https://tenant.authentication.example.com/oauth/token";
pub const TOKEN: &str = "test-bearer-token";

/// Service key pointing at the fake tenant, as inline JSON
pub fn service_key() -> ServiceKeySource {
    ServiceKeySource::new(format!(
        r#"{{"oauth": {{"url": "{}", "tokenurl": "{}", "clientid": "client", "clientsecret": "secret"}}}}"#,
        HOST, TOKEN_URL
    ))
}

pub fn token_response() -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(
        200,
        format!(r#"{{"access_token":"{}","token_type":"bearer","expires_in":3600}}"#, TOKEN),
    ))
}

pub fn respond(status: u16, body: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(status, body))
}

pub fn deploy_status(status: &str) -> Result<HttpResponse, HttpError> {
    respond(200, &format!(r#"{{"d":{{"TaskId":"task-1","Status":"{}"}}}}"#, status))
}

/// Mock sender that replays scripted responses in order
///
/// Every request is recorded so tests can assert on what was sent.
pub struct MockSender {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockSender {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests sent so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// URLs of all requests sent so far
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Get number of responses remaining
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpSender for MockSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(HttpError::Transport(format!(
                "MockSender: No response available for request {}",
                index
            )))
        })
    }
}
