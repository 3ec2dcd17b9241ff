//! HTTP client seam shared by every step

pub mod config;
pub mod request;
pub mod reqwest_sender;

use async_trait::async_trait;
pub use config::ClientConfig;
pub use request::{Auth, HttpError, HttpRequest, HttpResponse, Method};
pub use reqwest_sender::ReqwestSender;

/// Trait for sending HTTP requests - allows for different implementations
#[async_trait]
pub trait HttpSender: Send + Sync {
    /// Send a request and read the whole response body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

