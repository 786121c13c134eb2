//! Command Catalog Module
//!
//! Static mapping from command name to remote operation descriptor. Adding or
//! removing a command is a table change, not a control-flow change.

use serde_json::{Map, Value};

/// Mapping from a caller-supplied argument key to the API body field it
/// populates.
pub struct ArgMap {
    pub source: &'static str,
    pub target: &'static str,
}

/// Body field with a fixed value.
pub enum FixedValue {
    Str(&'static str),
    Bool(bool),
}

/// The remote operation behind a command name.
pub enum RemoteOp {
    /// List all vehicles on the account.
    Vehicles,
    /// Fetch the single vehicle record.
    Vehicle,
    /// Signal a wake-up.
    WakeUp,
    /// Read-only GET under the vehicle, e.g. `data_request/charge_state`.
    DataRequest(&'static str),
    /// POST under `command/` with a body assembled from the descriptor.
    Command {
        endpoint: &'static str,
        fixed: &'static [(&'static str, FixedValue)],
        required: &'static [ArgMap],
        optional: &'static [ArgMap],
    },
    /// Share-to-vehicle navigation request (nested body).
    Navigation,
    /// Local VIN decode of the vehicle record.
    VinDecode,
    /// Local model lookup from the VIN.
    GetModel,
    /// Local paint color lookup from the option codes.
    GetPaintColor,
}

pub struct CommandSpec {
    pub name: &'static str,
    pub op: RemoteOp,
    /// Commands that only touch the vehicle-list record (served while the
    /// car sleeps) or the wake signal itself skip the auto-wake loop.
    pub wake_exempt: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("Missing argument `{arg}` for command `{command}`")]
    Missing {
        command: &'static str,
        arg: &'static str,
    },
}

macro_rules! arg {
    ($key:expr) => {
        ArgMap {
            source: $key,
            target: $key,
        }
    };
    ($source:expr => $target:expr) => {
        ArgMap {
            source: $source,
            target: $target,
        }
    };
}

macro_rules! plain_command {
    ($name:expr, $endpoint:expr) => {
        CommandSpec {
            name: $name,
            op: RemoteOp::Command {
                endpoint: $endpoint,
                fixed: &[],
                required: &[],
                optional: &[],
            },
            wake_exempt: false,
        }
    };
}

macro_rules! args_command {
    ($name:expr, $endpoint:expr, [$($required:expr),*]) => {
        args_command!($name, $endpoint, [$($required),*], [])
    };
    ($name:expr, $endpoint:expr, [$($required:expr),*], [$($optional:expr),*]) => {
        CommandSpec {
            name: $name,
            op: RemoteOp::Command {
                endpoint: $endpoint,
                fixed: &[],
                required: &[$($required),*],
                optional: &[$($optional),*],
            },
            wake_exempt: false,
        }
    };
}

macro_rules! data_request {
    ($name:expr, $path:expr) => {
        CommandSpec {
            name: $name,
            op: RemoteOp::DataRequest($path),
            wake_exempt: false,
        }
    };
}

/// The full catalog, one entry per command name accepted by `dispatch`.
pub static CATALOG: &[CommandSpec] = &[
    CommandSpec {
        name: "vehicles",
        op: RemoteOp::Vehicles,
        wake_exempt: true,
    },
    CommandSpec {
        name: "vehicle",
        op: RemoteOp::Vehicle,
        wake_exempt: true,
    },
    CommandSpec {
        name: "wakeUp",
        op: RemoteOp::WakeUp,
        wake_exempt: true,
    },
    data_request!("vehicleData", "vehicle_data"),
    data_request!("chargeState", "data_request/charge_state"),
    data_request!("climateState", "data_request/climate_state"),
    data_request!("vehicleConfig", "data_request/vehicle_config"),
    data_request!("vehicleState", "data_request/vehicle_state"),
    data_request!("driveState", "data_request/drive_state"),
    data_request!("guiSettings", "data_request/gui_settings"),
    data_request!("mobileEnabled", "mobile_enabled"),
    data_request!("nearbyChargers", "nearby_charging_sites"),
    plain_command!("chargeStandard", "charge_standard"),
    plain_command!("chargeMaxRange", "charge_max_range"),
    plain_command!("doorLock", "door_lock"),
    plain_command!("doorUnlock", "door_unlock"),
    plain_command!("climateStart", "auto_conditioning_start"),
    plain_command!("climateStop", "auto_conditioning_stop"),
    plain_command!("flashLights", "flash_lights"),
    plain_command!("honkHorn", "honk_horn"),
    CommandSpec {
        name: "maxDefrost",
        op: RemoteOp::Command {
            endpoint: "set_preconditioning_max",
            fixed: &[("on", FixedValue::Bool(true))],
            required: &[],
            optional: &[],
        },
        wake_exempt: false,
    },
    plain_command!("mediaTogglePlayback", "media_toggle_playback"),
    plain_command!("mediaPlayNext", "media_next_track"),
    plain_command!("mediaPlayPrevious", "media_prev_track"),
    plain_command!("mediaPlayNextFavorite", "media_next_fav"),
    plain_command!("mediaPlayPreviousFavorite", "media_prev_fav"),
    plain_command!("mediaVolumeUp", "media_volume_up"),
    plain_command!("mediaVolumeDown", "media_volume_down"),
    CommandSpec {
        name: "navigationRequest",
        op: RemoteOp::Navigation,
        wake_exempt: false,
    },
    plain_command!("openChargePort", "charge_port_door_open"),
    CommandSpec {
        name: "openFrunk",
        op: RemoteOp::Command {
            endpoint: "actuate_trunk",
            fixed: &[("which_trunk", FixedValue::Str("front"))],
            required: &[],
            optional: &[],
        },
        wake_exempt: false,
    },
    CommandSpec {
        name: "openTrunk",
        op: RemoteOp::Command {
            endpoint: "actuate_trunk",
            fixed: &[("which_trunk", FixedValue::Str("rear"))],
            required: &[],
            optional: &[],
        },
        wake_exempt: false,
    },
    plain_command!("remoteStart", "remote_start_drive"),
    plain_command!("resetValetPin", "reset_valet_pin"),
    args_command!(
        "scheduleSoftwareUpdate",
        "schedule_software_update",
        [arg!("offset" => "offset_sec")]
    ),
    args_command!(
        "seatHeater",
        "remote_seat_heater_request",
        [arg!("heater"), arg!("level")]
    ),
    args_command!("setChargeLimit", "set_charge_limit", [arg!("amt" => "percent")]),
    args_command!(
        "setChargingAmps",
        "set_charging_amps",
        [arg!("amps" => "charging_amps")]
    ),
    args_command!(
        "setScheduledCharging",
        "set_scheduled_charging",
        [arg!("enable"), arg!("time")]
    ),
    args_command!(
        "setScheduledDeparture",
        "set_scheduled_departure",
        [arg!("enable"), arg!("departure_time")],
        [
            arg!("preconditioning_enabled"),
            arg!("preconditioning_weekdays_only"),
            arg!("off_peak_charging_enabled"),
            arg!("off_peak_charging_weekdays_only"),
            arg!("end_off_peak_time")
        ]
    ),
    args_command!("setSentryMode", "set_sentry_mode", [arg!("onoff" => "on")]),
    args_command!(
        "setTemps",
        "set_temps",
        [arg!("driver" => "driver_temp"), arg!("pass" => "passenger_temp")]
    ),
    args_command!(
        "setValetMode",
        "set_valet_mode",
        [arg!("onoff" => "on"), arg!("pin" => "password")]
    ),
    args_command!("speedLimitActivate", "speed_limit_activate", [arg!("pin")]),
    args_command!(
        "speedLimitDeactivate",
        "speed_limit_deactivate",
        [arg!("pin")]
    ),
    args_command!("speedLimitClearPin", "speed_limit_clear_pin", [arg!("pin")]),
    args_command!(
        "speedLimitSetLimit",
        "speed_limit_set_limit",
        [arg!("limit" => "limit_mph")]
    ),
    plain_command!("startCharge", "charge_start"),
    plain_command!("stopCharge", "charge_stop"),
    args_command!(
        "steeringHeater",
        "remote_steering_wheel_heater_request",
        [arg!("level" => "on")]
    ),
    args_command!("sunRoofControl", "sun_roof_control", [arg!("state")]),
    CommandSpec {
        name: "sunRoofMove",
        op: RemoteOp::Command {
            endpoint: "sun_roof_control",
            fixed: &[("state", FixedValue::Str("move"))],
            required: &[arg!("percent")],
            optional: &[],
        },
        wake_exempt: false,
    },
    args_command!(
        "windowControl",
        "window_control",
        [arg!("command"), arg!("lat"), arg!("lon")]
    ),
    CommandSpec {
        name: "vinDecode",
        op: RemoteOp::VinDecode,
        wake_exempt: true,
    },
    CommandSpec {
        name: "getModel",
        op: RemoteOp::GetModel,
        wake_exempt: true,
    },
    CommandSpec {
        name: "getPaintColor",
        op: RemoteOp::GetPaintColor,
        wake_exempt: true,
    },
];

/// Look up a command by name.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}

fn require<'a>(
    command: &'static str,
    args: &'a Value,
    key: &'static str,
) -> Result<&'a Value, ArgsError> {
    match args.get(key) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ArgsError::Missing { command, arg: key }),
    }
}

/// Assemble the request body for a `RemoteOp::Command` descriptor.
///
/// Required fields must be present and non-null; optional fields are copied
/// when present; anything else in `args` is ignored.
pub fn build_body(spec: &CommandSpec, args: &Value) -> Result<Value, ArgsError> {
    let RemoteOp::Command {
        fixed,
        required,
        optional,
        ..
    } = &spec.op
    else {
        return Ok(Value::Object(Map::new()));
    };

    let mut body = Map::new();

    for (key, value) in fixed.iter() {
        let value = match value {
            FixedValue::Str(s) => Value::String((*s).to_string()),
            FixedValue::Bool(b) => Value::Bool(*b),
        };
        body.insert((*key).to_string(), value);
    }

    for mapping in required.iter() {
        let value = require(spec.name, args, mapping.source)?;
        body.insert(mapping.target.to_string(), value.clone());
    }

    for mapping in optional.iter() {
        if let Some(value) = args.get(mapping.source) {
            if !value.is_null() {
                body.insert(mapping.target.to_string(), value.clone());
            }
        }
    }

    Ok(Value::Object(body))
}

/// Build the share-to-vehicle body for `navigationRequest`.
pub fn build_navigation_body(args: &Value) -> Result<Value, ArgsError> {
    const NAME: &str = "navigationRequest";
    let subject = require(NAME, args, "subject")?;
    let text = require(NAME, args, "text")?;
    let locale = require(NAME, args, "locale")?;

    Ok(serde_json::json!({
        "type": "share_ext_content_raw",
        "value": {
            "android.intent.ACTION": "android.intent.action.SEND",
            "android.intent.TYPE": "text/plain",
            "android.intent.extra.SUBJECT": subject,
            "android.intent.extra.TEXT": text,
        },
        "locale": locale,
        "timestamp_ms": chrono::Utc::now().timestamp_millis(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_finds_known_commands() {
        assert!(lookup("doorLock").is_some());
        assert!(lookup("setTemps").is_some());
        assert!(lookup("vehicles").is_some());
        assert!(lookup("bogusCommand").is_none());
    }

    #[test]
    fn status_and_wake_commands_skip_auto_wake() {
        for name in ["vehicle", "vehicles", "wakeUp", "vinDecode"] {
            assert!(lookup(name).unwrap().wake_exempt, "{name}");
        }
        assert!(!lookup("doorLock").unwrap().wake_exempt);
        assert!(!lookup("vehicleData").unwrap().wake_exempt);
    }

    #[test]
    fn charge_limit_arg_is_renamed() {
        let spec = lookup("setChargeLimit").unwrap();
        let body = build_body(spec, &json!({"amt": 80})).unwrap();
        assert_eq!(body, json!({"percent": 80}));
    }

    #[test]
    fn missing_required_arg_is_rejected() {
        let spec = lookup("setTemps").unwrap();
        let err = build_body(spec, &json!({"driver": 21.0})).unwrap_err();
        let ArgsError::Missing { command, arg } = err;
        assert_eq!(command, "setTemps");
        assert_eq!(arg, "pass");
    }

    #[test]
    fn null_required_arg_counts_as_missing() {
        let spec = lookup("speedLimitActivate").unwrap();
        assert!(build_body(spec, &json!({"pin": null})).is_err());
    }

    #[test]
    fn frunk_and_trunk_use_fixed_bodies() {
        let frunk = build_body(lookup("openFrunk").unwrap(), &json!({})).unwrap();
        assert_eq!(frunk, json!({"which_trunk": "front"}));

        let trunk = build_body(lookup("openTrunk").unwrap(), &json!({})).unwrap();
        assert_eq!(trunk, json!({"which_trunk": "rear"}));
    }

    #[test]
    fn sunroof_move_combines_fixed_state_and_percent() {
        let spec = lookup("sunRoofMove").unwrap();
        let body = build_body(spec, &json!({"percent": 40})).unwrap();
        assert_eq!(body, json!({"state": "move", "percent": 40}));
    }

    #[test]
    fn scheduled_departure_forwards_optional_fields() {
        let spec = lookup("setScheduledDeparture").unwrap();
        let body = build_body(
            spec,
            &json!({
                "enable": true,
                "departure_time": 480,
                "preconditioning_enabled": true,
                "unrelated": "ignored"
            }),
        )
        .unwrap();
        assert_eq!(
            body,
            json!({
                "enable": true,
                "departure_time": 480,
                "preconditioning_enabled": true
            })
        );
    }

    #[test]
    fn navigation_body_is_nested_share_request() {
        let body = build_navigation_body(&json!({
            "subject": "Home",
            "text": "1 Example St",
            "locale": "en-US"
        }))
        .unwrap();

        assert_eq!(body["type"], "share_ext_content_raw");
        assert_eq!(body["value"]["android.intent.extra.TEXT"], "1 Example St");
        assert_eq!(body["locale"], "en-US");
        assert!(body["timestamp_ms"].is_i64());
    }

    #[test]
    fn catalog_names_are_unique() {
        for (i, spec) in CATALOG.iter().enumerate() {
            assert!(
                CATALOG[i + 1..].iter().all(|other| other.name != spec.name),
                "duplicate command name: {}",
                spec.name
            );
        }
    }
}
