//! Tesla Command Gateway Library
//!
//! Token-cached, wake-aware command dispatch against the Tesla Owner API.
//! Hosting glue (the CLI binary, or any other embedder) talks to [`Gateway`];
//! everything below it is seamed with traits so tests can substitute fakes.

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod vin;

use std::sync::Arc;

use serde_json::Value;

use api::{ApiError, OwnerApiClient, VehicleApi, VehicleSummary};
use auth::{AuthApi, AuthError, Credentials, MemoryStore, TokenCache, TokenStore};
use config::GatewayConfig;
use dispatch::{DispatchError, Dispatcher, WakeConfig};

/// Gateway errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The function-call boundary consumed by hosting glue: resolve a token,
/// then wake and dispatch.
pub struct Gateway<C = OwnerApiClient, S = MemoryStore>
where
    C: VehicleApi + AuthApi,
    S: TokenStore,
{
    api: Arc<C>,
    tokens: TokenCache<S>,
    dispatcher: Dispatcher<C>,
}

impl Gateway<OwnerApiClient, MemoryStore> {
    /// Build a gateway against the real Owner API.
    pub fn new(config: &GatewayConfig) -> Result<Self, ApiError> {
        let api = Arc::new(OwnerApiClient::new(&config.api_base, &config.auth_base)?);
        Ok(Self::with_parts(api, TokenCache::new(), config.wake.clone()))
    }
}

impl<C, S> Gateway<C, S>
where
    C: VehicleApi + AuthApi,
    S: TokenStore,
{
    pub fn with_parts(api: Arc<C>, tokens: TokenCache<S>, wake: WakeConfig) -> Self {
        let dispatcher = Dispatcher::new(api.clone(), wake);
        Self {
            api,
            tokens,
            dispatcher,
        }
    }

    /// Resolve a token for `credentials` and dispatch `command`.
    pub async fn run(
        &self,
        credentials: &Credentials,
        command: &str,
        vehicle_id: &str,
        auto_wake_up: bool,
        args: &Value,
    ) -> Result<Value, GatewayError> {
        let access_token = self.tokens.resolve(self.api.as_ref(), credentials).await?;
        Ok(self
            .dispatcher
            .dispatch(command, &access_token, vehicle_id, auto_wake_up, args)
            .await?)
    }

    /// Resolve a token and list the account's vehicles.
    pub async fn vehicles(
        &self,
        credentials: &Credentials,
    ) -> Result<Vec<VehicleSummary>, GatewayError> {
        let access_token = self.tokens.resolve(self.api.as_ref(), credentials).await?;
        Ok(self.dispatcher.list_vehicles(&access_token).await?)
    }
}
