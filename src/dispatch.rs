//! Dispatch Module
//!
//! The wake-and-dispatch protocol: optionally run the bounded wake loop,
//! then forward the requested command to the Owner API.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{ApiError, VehicleApi, VehicleSummary};
use crate::commands::{self, ArgsError, RemoteOp};
use crate::vin;

const STATE_ASLEEP: &str = "asleep";

/// Wake loop tuning.
#[derive(Debug, Clone)]
pub struct WakeConfig {
    /// Wake signals issued before giving up.
    pub max_attempts: u32,
    /// Pause between wake attempts.
    pub poll_interval: Duration,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Forwards commands to the vehicle API, waking the car first when asked.
pub struct Dispatcher<C: VehicleApi> {
    api: Arc<C>,
    wake: WakeConfig,
}

impl<C: VehicleApi> Dispatcher<C> {
    pub fn new(api: Arc<C>, wake: WakeConfig) -> Self {
        Self { api, wake }
    }

    /// Run the wake-up protocol.
    ///
    /// Checks the vehicle state and, while it reports `asleep`, issues a
    /// fresh wake signal per attempt (the vehicle network drops single
    /// signals routinely) with a pause in between, up to the attempt budget.
    /// Exhausting the budget is not an error: the command that follows
    /// sometimes succeeds even when the reported state looks stale, so the
    /// caller proceeds regardless.
    pub async fn wake_up(&self, access_token: &str, vehicle_id: &str) -> Result<(), DispatchError> {
        let record = self.api.vehicle(access_token, vehicle_id).await?;
        if vehicle_state(&record) != Some(STATE_ASLEEP) {
            return Ok(());
        }

        for attempt in 1..=self.wake.max_attempts {
            debug!("Waking vehicle {} (attempt {})", vehicle_id, attempt);
            let response = self.api.wake_up(access_token, vehicle_id).await?;
            if vehicle_state(&response) != Some(STATE_ASLEEP) {
                debug!("Vehicle {} is awake", vehicle_id);
                return Ok(());
            }
            if attempt < self.wake.max_attempts {
                tokio::time::sleep(self.wake.poll_interval).await;
            }
        }

        warn!(
            "Vehicle {} still reports asleep after {} wake attempts, proceeding anyway",
            vehicle_id, self.wake.max_attempts
        );
        Ok(())
    }

    /// Forward a named command, returning the remote payload unmodified.
    ///
    /// An unknown command fails before any network call. Remote failures
    /// surface verbatim and are never retried here; the wake loop is the
    /// only retrying party.
    pub async fn dispatch(
        &self,
        command: &str,
        access_token: &str,
        vehicle_id: &str,
        auto_wake_up: bool,
        args: &Value,
    ) -> Result<Value, DispatchError> {
        let spec = commands::lookup(command)
            .ok_or_else(|| DispatchError::UnknownCommand(command.to_string()))?;

        if auto_wake_up && !spec.wake_exempt {
            self.wake_up(access_token, vehicle_id).await?;
        }

        match &spec.op {
            RemoteOp::Vehicles => {
                let vehicles = self.api.vehicles(access_token).await?;
                serde_json::to_value(vehicles)
                    .map_err(|e| DispatchError::Api(ApiError::Parse(e.to_string())))
            }
            RemoteOp::Vehicle => Ok(self.api.vehicle(access_token, vehicle_id).await?),
            RemoteOp::WakeUp => Ok(self.api.wake_up(access_token, vehicle_id).await?),
            RemoteOp::DataRequest(path) => {
                Ok(self.api.data_request(access_token, vehicle_id, path).await?)
            }
            RemoteOp::Command { endpoint, .. } => {
                let body = commands::build_body(spec, args)?;
                Ok(self
                    .api
                    .command(access_token, vehicle_id, endpoint, body)
                    .await?)
            }
            RemoteOp::Navigation => {
                let body = commands::build_navigation_body(args)?;
                Ok(self
                    .api
                    .command(access_token, vehicle_id, "navigation_request", body)
                    .await?)
            }
            RemoteOp::VinDecode => {
                let record = self.api.vehicle(access_token, vehicle_id).await?;
                match vin::decode_record(&record) {
                    Some(info) => serde_json::to_value(info)
                        .map_err(|e| DispatchError::Api(ApiError::Parse(e.to_string()))),
                    None => Ok(Value::Null),
                }
            }
            RemoteOp::GetModel => {
                let record = self.api.vehicle(access_token, vehicle_id).await?;
                Ok(vin::model_from_record(&record)
                    .map(|model| Value::String(model.to_string()))
                    .unwrap_or(Value::Null))
            }
            RemoteOp::GetPaintColor => {
                let record = self.api.vehicle(access_token, vehicle_id).await?;
                Ok(vin::paint_color_from_record(&record)
                    .map(|color| Value::String(color.to_string()))
                    .unwrap_or(Value::Null))
            }
        }
    }

    /// List vehicles on the account (thin pass-through).
    pub async fn list_vehicles(
        &self,
        access_token: &str,
    ) -> Result<Vec<VehicleSummary>, DispatchError> {
        Ok(self.api.vehicles(access_token).await?)
    }
}

fn vehicle_state(record: &Value) -> Option<&str> {
    record.get("state").and_then(Value::as_str)
}
