//! Owner API Client Module
//!
//! HTTP communication with the Tesla Owner API and the SSO token endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{AuthApi, AuthError, Credentials, Token};

/// Production Owner API host.
pub const DEFAULT_API_BASE: &str = "https://owner-api.teslamotors.com";
/// Production SSO host for the refresh-token grant.
pub const DEFAULT_AUTH_BASE: &str = "https://auth.tesla.com";

/// OAuth client id for the refresh-token grant.
const SSO_CLIENT_ID: &str = "ownerapi";
const SSO_SCOPE: &str = "openid email offline_access";

/// Fixed client pair of the legacy Owner API password grant.
const OWNER_CLIENT_ID: &str =
    "81527cff06843c8634fdc09e8ac0abefb46ac849f38fe1e431c2ef2106796384";
const OWNER_CLIENT_SECRET: &str =
    "c7257eb71a564034f9419ee651c7d0e5f7aa6bfbd18bafb5c5c033b093bb2fa3";

/// Vehicle list entry, mapped from the Owner API record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub id: String,
    pub display_name: String,
    pub state: Option<String>,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Seam to the vehicle API, substituted by fakes in tests.
#[async_trait]
pub trait VehicleApi: Send + Sync {
    /// List all vehicles on the account.
    async fn vehicles(&self, access_token: &str) -> Result<Vec<VehicleSummary>, ApiError>;

    /// Fetch a single vehicle record (served even while the car sleeps).
    async fn vehicle(&self, access_token: &str, vehicle_id: &str) -> Result<Value, ApiError>;

    /// Signal the car to wake up.
    async fn wake_up(&self, access_token: &str, vehicle_id: &str) -> Result<Value, ApiError>;

    /// Read-only GET under `/api/1/vehicles/{id}/`.
    async fn data_request(
        &self,
        access_token: &str,
        vehicle_id: &str,
        path: &str,
    ) -> Result<Value, ApiError>;

    /// POST a command under `/api/1/vehicles/{id}/command/`.
    async fn command(
        &self,
        access_token: &str,
        vehicle_id: &str,
        endpoint: &str,
        body: Value,
    ) -> Result<Value, ApiError>;
}

/// HTTP client for the Owner API
pub struct OwnerApiClient {
    api_base: String,
    auth_base: String,
    client: reqwest::Client,
}

impl OwnerApiClient {
    /// Create a new API client
    pub fn new(api_base: &str, auth_base: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            auth_base: auth_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json(&self, url: &str, access_token: &str) -> Result<Value, ApiError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read_envelope(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        access_token: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {access_token}"))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read_envelope(response).await
    }

    /// Unwrap the Owner API `{"response": ...}` envelope, keeping the inner
    /// payload opaque.
    async fn read_envelope(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        match value {
            Value::Object(mut map) => map
                .remove("response")
                .ok_or_else(|| ApiError::Parse("missing response envelope".into())),
            other => Err(ApiError::Parse(format!(
                "expected JSON object, got: {other}"
            ))),
        }
    }

    async fn post_token_request(&self, url: &str, body: &Value) -> Result<Token, AuthError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Rejected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!("status {status}: {body}")));
        }

        let value = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        let Some(access_token) = value.access_token else {
            return Err(AuthError::MalformedResponse(
                "response body has no access_token".into(),
            ));
        };

        Ok(Token::new(access_token, value.expires_in.unwrap_or(0)))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[async_trait]
impl AuthApi for OwnerApiClient {
    async fn fetch_token(&self, credentials: &Credentials) -> Result<Token, AuthError> {
        match credentials {
            Credentials::RefreshToken { refresh_token, .. } => {
                info!("Requesting access token via refresh grant");
                let url = format!("{}/oauth2/v3/token", self.auth_base);
                let body = serde_json::json!({
                    "grant_type": "refresh_token",
                    "client_id": SSO_CLIENT_ID,
                    "refresh_token": refresh_token,
                    "scope": SSO_SCOPE,
                });
                self.post_token_request(&url, &body).await
            }
            Credentials::OwnerLogin { email, password } => {
                info!("Requesting access token via owner login");
                let url = format!("{}/oauth/token", self.api_base);
                let body = serde_json::json!({
                    "grant_type": "password",
                    "client_id": OWNER_CLIENT_ID,
                    "client_secret": OWNER_CLIENT_SECRET,
                    "email": email,
                    "password": password,
                });
                self.post_token_request(&url, &body).await
            }
        }
    }
}

#[async_trait]
impl VehicleApi for OwnerApiClient {
    async fn vehicles(&self, access_token: &str) -> Result<Vec<VehicleSummary>, ApiError> {
        let url = format!("{}/api/1/vehicles", self.api_base);
        let payload = self.get_json(&url, access_token).await?;

        let records = payload
            .as_array()
            .ok_or_else(|| ApiError::Parse("vehicle list is not an array".into()))?;

        Ok(records
            .iter()
            .map(|record| VehicleSummary {
                id: record
                    .get("id_s")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                display_name: record
                    .get("display_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                state: record
                    .get("state")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect())
    }

    async fn vehicle(&self, access_token: &str, vehicle_id: &str) -> Result<Value, ApiError> {
        let url = format!("{}/api/1/vehicles/{vehicle_id}", self.api_base);
        self.get_json(&url, access_token).await
    }

    async fn wake_up(&self, access_token: &str, vehicle_id: &str) -> Result<Value, ApiError> {
        let url = format!("{}/api/1/vehicles/{vehicle_id}/wake_up", self.api_base);
        self.post_json(&url, access_token, &Value::Object(Default::default()))
            .await
    }

    async fn data_request(
        &self,
        access_token: &str,
        vehicle_id: &str,
        path: &str,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/api/1/vehicles/{vehicle_id}/{path}", self.api_base);
        self.get_json(&url, access_token).await
    }

    async fn command(
        &self,
        access_token: &str,
        vehicle_id: &str,
        endpoint: &str,
        body: Value,
    ) -> Result<Value, ApiError> {
        let url = format!(
            "{}/api/1/vehicles/{vehicle_id}/command/{endpoint}",
            self.api_base
        );
        self.post_json(&url, access_token, &body).await
    }
}
