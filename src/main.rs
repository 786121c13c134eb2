//! Tesla Gateway - Main Entry Point
//!
//! Thin CLI over the gateway library: reads account settings from the
//! environment, dispatches one command, prints the raw payload as JSON.

use anyhow::{bail, Context, Result};
use tracing::info;

use tesla_gateway::{config::GatewayConfig, logging, Gateway};

const USAGE: &str = "\
Usage: tesla-gateway [--no-wake] <command> [vehicle-id] [json-args]

  tesla-gateway vehicles
  tesla-gateway vehicleData 1234567890
  tesla-gateway setTemps 1234567890 '{\"driver\": 21.5, \"pass\": 20.0}'

Account settings come from the environment:
  TESLA_AUTH_MODE      refresh_token (default) | owner_login
  TESLA_EMAIL          account email
  TESLA_REFRESH_TOKEN  refresh token (refresh_token mode)
  TESLA_PASSWORD       password (owner_login mode)
  TESLA_VEHICLE_ID     default vehicle id
";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut auto_wake_up = true;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--no-wake" => auto_wake_up = false,
            "-h" | "--help" => {
                print!("{USAGE}");
                return Ok(());
            }
            _ => positional.push(arg),
        }
    }

    let Some(command) = positional.first().cloned() else {
        bail!("no command given\n\n{USAGE}");
    };

    let config = GatewayConfig::from_env()?;
    let gateway = Gateway::new(&config).context("failed to build API client")?;

    if command == "vehicles" {
        let vehicles = gateway.vehicles(&config.credentials).await?;
        println!("{}", serde_json::to_string_pretty(&vehicles)?);
        return Ok(());
    }

    let vehicle_id = match positional.get(1).cloned() {
        Some(id) => id,
        None => std::env::var("TESLA_VEHICLE_ID")
            .context("no vehicle id given and TESLA_VEHICLE_ID is not set")?,
    };

    let args = match positional.get(2) {
        Some(raw) => serde_json::from_str(raw).context("command args are not valid JSON")?,
        None => serde_json::json!({}),
    };

    info!("Dispatching {} to vehicle {}", command, vehicle_id);
    let payload = gateway
        .run(&config.credentials, &command, &vehicle_id, auto_wake_up, &args)
        .await?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
