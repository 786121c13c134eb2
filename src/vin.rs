//! VIN Decoding Module
//!
//! Local derivations over the vehicle record: model, model year, and paint
//! color. No network calls.

use serde::Serialize;
use serde_json::Value;

/// Decoded VIN fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VinInfo {
    pub vin: String,
    pub make: &'static str,
    pub model: Option<&'static str>,
    pub year: Option<i32>,
    pub serial: Option<String>,
}

/// Model letter at VIN position 4.
fn model_from_code(code: char) -> Option<&'static str> {
    match code.to_ascii_uppercase() {
        'S' => Some("Model S"),
        '3' => Some("Model 3"),
        'X' => Some("Model X"),
        'Y' => Some("Model Y"),
        'R' => Some("Roadster"),
        _ => None,
    }
}

/// Model year code at VIN position 10. The code alphabet skips I, O, Q, U,
/// Z and zero; this covers the years Tesla has shipped.
fn year_from_code(code: char) -> Option<i32> {
    let year = match code.to_ascii_uppercase() {
        '8' => 2008,
        '9' => 2009,
        'A' => 2010,
        'B' => 2011,
        'C' => 2012,
        'D' => 2013,
        'E' => 2014,
        'F' => 2015,
        'G' => 2016,
        'H' => 2017,
        'J' => 2018,
        'K' => 2019,
        'L' => 2020,
        'M' => 2021,
        'N' => 2022,
        'P' => 2023,
        'R' => 2024,
        'S' => 2025,
        _ => return None,
    };
    Some(year)
}

/// Decode a 17-character VIN. Returns `None` for anything shorter.
pub fn decode(vin: &str) -> Option<VinInfo> {
    let chars: Vec<char> = vin.chars().collect();
    if chars.len() != 17 {
        return None;
    }

    Some(VinInfo {
        vin: vin.to_string(),
        make: "Tesla",
        model: model_from_code(chars[3]),
        year: year_from_code(chars[9]),
        serial: Some(chars[11..].iter().collect()),
    })
}

/// Decode the VIN found in a vehicle record.
pub fn decode_record(record: &Value) -> Option<VinInfo> {
    record
        .get("vin")
        .and_then(Value::as_str)
        .and_then(decode)
}

/// Model name from a vehicle record's VIN.
pub fn model_from_record(record: &Value) -> Option<&'static str> {
    decode_record(record).and_then(|info| info.model)
}

/// Paint color from a vehicle record's option codes, `None` when the record
/// carries no recognizable paint code.
pub fn paint_color_from_record(record: &Value) -> Option<&'static str> {
    let codes = record.get("option_codes").and_then(Value::as_str)?;
    codes.split(',').find_map(paint_code_color)
}

fn paint_code_color(code: &str) -> Option<&'static str> {
    let color = match code.trim() {
        "PBCW" | "PPSW" => "white",
        "PBSB" => "black",
        "PMBL" => "obsidian black",
        "PMMB" => "monterey blue",
        "PMNG" => "midnight silver",
        "PMSG" => "green",
        "PMSS" => "silver",
        "PPMR" | "PPSR" => "red",
        "PPSB" => "deep blue",
        "PPTI" => "titanium",
        "PMTG" => "dolphin grey",
        _ => return None,
    };
    Some(color)
}
