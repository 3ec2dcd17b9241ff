//! OAuth client-credentials token retrieval

use crate::client::{HttpRequest, HttpSender, Method};
use crate::cpi::ServiceKey;
use crate::steps::StepError;
use tracing::{debug, error};

/// Parameters for a client-credentials token request
#[derive(Debug, Clone)]
pub struct TokenParameters {
    pub token_url: String,
    pub username: String,
    pub password: String,
}

impl From<&ServiceKey> for TokenParameters {
    fn from(key: &ServiceKey) -> Self {
        Self {
            token_url: key.oauth.token_url.clone(),
            username: key.oauth.client_id.clone(),
            password: key.oauth.client_secret.clone(),
        }
    }
}

/// Fetch a bearer token from the tenant's token endpoint
///
/// Sends `POST {token_url}?grant_type=client_credentials` with HTTP basic
/// auth and returns the `access_token` field of the response.
pub async fn fetch_bearer_token(
    sender: &dyn HttpSender,
    params: &TokenParameters,
) -> Result<String, StepError> {
    let url = format!("{}?grant_type=client_credentials", params.token_url);
    let request = HttpRequest::post(&url)
        .accept_json()
        .basic_auth(&params.username, &params.password);

    let response = sender
        .send(request)
        .await
        .map_err(|e| StepError::Token(StepError::http(Method::Post, &url, e).to_string()))?;

    if response.status != 200 {
        error!(
            "token request returned status {}: {}",
            response.status, response.body
        );
        return Err(StepError::Token(format!(
            "did not retrieve a valid HTTP response code: {}, response body: {}",
            response.status, response.body
        )));
    }

    let parsed: serde_json::Value = response
        .json()
        .map_err(|e| StepError::Token(format!("token response is not valid JSON: {}", e)))?;

    let token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| StepError::Token("token response has no access_token".to_string()))?;

    debug!("retrieved bearer token ({} chars)", token.len());
    Ok(token.to_string())
}
