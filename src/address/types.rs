// src/address/types.rs
// ExtractedAddress and the strategy result contract (spec §3, §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressSource {
    SavedAddress,
    GoogleMapsLink,
    Coordinates,
    TextGeocoded,
    LlmExtracted,
    LocationShare,
    SmartDefault,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressMetadata {
    pub url: Option<String>,
    pub address_id: Option<String>,
    pub address_type: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub landmark: Option<String>,
    pub road: Option<String>,
    pub house: Option<String>,
    pub floor: Option<String>,
    pub raw_input: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedAddress {
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: AddressSource,
    pub confidence: f32,
    pub metadata: AddressMetadata,
}

/// Coordinate range invariant from spec §3: when lat/lng are set they must
/// satisfy these bounds. Constructors below enforce it at the boundary so
/// an `ExtractedAddress` can never exist out of range.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range"));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("longitude {lng} out of range"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    Success(ExtractedAddress),
    NeedsMoreInfo { clarification_prompt: String, options: Vec<&'static str> },
    Error(String),
}

pub const CLARIFICATION_OPTIONS: &[&str] =
    &["share_location", "full_address", "maps_link", "coordinates"];

pub fn clarification_prompt() -> ExtractionOutcome {
    ExtractionOutcome::NeedsMoreInfo {
        clarification_prompt:
            "I couldn't pin that down — you can share your location, type a full address, \
             paste a Google Maps link, or send coordinates."
                .to_string(),
        options: CLARIFICATION_OPTIONS.to_vec(),
    }
}
