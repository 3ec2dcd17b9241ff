//! SAP Cloud Platform Integration tenant access

pub mod api;
pub mod service_key;
pub mod token;

pub use api::{ApiSession, ACTIVE_VERSION};
pub use service_key::{OAuth, ServiceKey, ServiceKeySource};
pub use token::{fetch_bearer_token, TokenParameters};

use crate::client::HttpSender;
use crate::steps::StepError;

/// Exchange a service key for an authenticated API session
pub async fn authenticate(
    sender: &dyn HttpSender,
    service_key: &ServiceKey,
) -> Result<ApiSession, StepError> {
    let token = fetch_bearer_token(sender, &TokenParameters::from(service_key)).await?;
    Ok(ApiSession::new(service_key.oauth.host.clone(), token))
}
