// src/address/mod.rs
// C4: Address Extractor — the ordered pipeline of spec §4.4. First success
// wins; this is the "address-extractor order law" tested in spec §8.3.

pub mod deps;
pub mod strategies;
pub mod types;

use deps::{GeocodingClient, UrlResolver};
use types::{AddressMetadata, AddressSource, ExtractedAddress, ExtractionOutcome};

pub struct AddressPipeline<'a> {
    pub resolver: &'a dyn UrlResolver,
    pub geocoder: &'a dyn GeocodingClient,
    pub llm: &'a dyn crate::llm::LlmClient,
}

impl<'a> AddressPipeline<'a> {
    pub async fn extract(&self, input: &str) -> ExtractionOutcome {
        if let Some(outcome) = strategies::extract_from_maps_url(input, self.resolver, self.geocoder).await {
            if matches!(outcome, ExtractionOutcome::Success(_)) {
                return outcome;
            }
            tracing::debug!("maps-url strategy did not succeed, trying next strategy");
        }

        if let Some(outcome) = strategies::extract_from_coordinates(input) {
            if matches!(outcome, ExtractionOutcome::Success(_)) {
                return outcome;
            }
            tracing::debug!("coordinate strategy did not succeed, trying next strategy");
        }

        if let Some(outcome) = strategies::extract_from_text(input, self.geocoder).await {
            if matches!(outcome, ExtractionOutcome::Success(_)) {
                return outcome;
            }
            tracing::debug!("text-geocoding strategy did not succeed, trying next strategy");
        }

        if let Some(outcome) = strategies::extract_with_llm(input, self.llm, self.geocoder).await {
            if !matches!(outcome, ExtractionOutcome::Error(_)) {
                return outcome;
            }
            tracing::debug!("llm-extraction strategy did not succeed, falling through to clarification");
        }

        types::clarification_prompt()
    }
}

/// Reverse-geocode an address that has coordinates but no formatted text
/// (spec §4.4 "Reverse geocoding"); on failure, falls back to a
/// coordinate-only description rather than propagating the error.
pub async fn reverse_geocode_or_fallback(
    geocoder: &dyn GeocodingClient,
    lat: f64,
    lng: f64,
    module_id: &str,
    zone_id: &str,
) -> ExtractedAddress {
    let address = match geocoder.reverse_geocode(lat, lng, module_id, zone_id).await {
        Ok(geo) => geo.formatted_address,
        Err(e) => {
            tracing::warn!(error = %e, "reverse geocoding failed, using coordinate fallback");
            format!("Location at {lat}, {lng}")
        }
    };

    ExtractedAddress {
        address,
        latitude: Some(lat),
        longitude: Some(lng),
        source: AddressSource::Coordinates,
        confidence: 0.6,
        metadata: AddressMetadata { raw_input: format!("{lat},{lng}"), ..Default::default() },
    }
}

#[derive(Debug, Clone)]
pub struct ServiceAreaVerdict {
    pub valid: bool,
    pub zone_id: Option<i64>,
    pub zone_name: Option<String>,
    pub error: Option<String>,
}

/// `validateServiceableArea(lat, lng)` of spec §4.4.
pub async fn validate_serviceable_area(geocoder: &dyn GeocodingClient, lat: f64, lng: f64) -> ServiceAreaVerdict {
    match geocoder.zone_for(lat, lng).await {
        Ok(zone) => ServiceAreaVerdict { valid: true, zone_id: Some(zone.zone_id), zone_name: Some(zone.zone_name), error: None },
        Err(e) => ServiceAreaVerdict { valid: false, zone_id: None, zone_name: None, error: Some(e.to_string()) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{AddressLlmExtraction, LlmClient};
    use async_trait::async_trait;

    struct FakeResolver(&'static str);
    #[async_trait]
    impl UrlResolver for FakeResolver {
        async fn resolve(&self, _url: &str, _max: u8) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FakeGeocoder;
    #[async_trait]
    impl GeocodingClient for FakeGeocoder {
        async fn geocode_text(&self, _address: &str, _m: &str, _z: &str) -> anyhow::Result<deps::GeocodeResult> {
            Ok(deps::GeocodeResult { lat: 18.5, lng: 73.8, formatted_address: "Somewhere, Pune".to_string() })
        }
        async fn reverse_geocode(&self, lat: f64, lng: f64, _m: &str, _z: &str) -> anyhow::Result<deps::GeocodeResult> {
            Ok(deps::GeocodeResult { lat, lng, formatted_address: "Reverse geocoded place".to_string() })
        }
        async fn zone_for(&self, _lat: f64, _lng: f64) -> anyhow::Result<deps::ZoneResult> {
            Ok(deps::ZoneResult { zone_id: 4, zone_name: "North Zone".to_string() })
        }
    }

    struct FakeLlm;
    #[async_trait]
    impl LlmClient for FakeLlm {
        async fn extract_address(&self, _raw: &str) -> anyhow::Result<AddressLlmExtraction> {
            Ok(AddressLlmExtraction {
                address: "near Koregaon Park road".to_string(),
                landmark: Some("Koregaon Park".to_string()),
                confidence: 0.7,
                needs_clarification: false,
                clarification_question: None,
            })
        }
        async fn chat(&self, _s: &str, _u: &str) -> anyhow::Result<String> {
            Ok("ok".to_string())
        }
    }

    fn pipeline<'a, L: LlmClient>(resolver: &'a FakeResolver, geocoder: &'a FakeGeocoder, llm: &'a L) -> AddressPipeline<'a> {
        AddressPipeline { resolver, geocoder, llm }
    }

    #[tokio::test]
    async fn maps_short_link_wins_over_embedded_text() {
        // S1: short link resolves to a URL carrying @lat,lng — earlier
        // strategy (maps URL) must win even though the raw input also
        // looks like it could carry free text for text-geocoding.
        let resolver = FakeResolver("https://maps.google.com/maps/@18.5204,73.8567,15z");
        let geocoder = FakeGeocoder;
        let llm = FakeLlm;
        let outcome = pipeline(&resolver, &geocoder, &llm).extract("https://maps.app.goo.gl/abc123").await;
        match outcome {
            ExtractionOutcome::Success(a) => {
                assert_eq!(a.source, AddressSource::GoogleMapsLink);
                assert_eq!(a.confidence, 1.0);
                assert_eq!(a.latitude, Some(18.5204));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn raw_coordinates_beat_text_geocoding() {
        let resolver = FakeResolver("unused");
        let geocoder = FakeGeocoder;
        let llm = FakeLlm;
        let outcome = pipeline(&resolver, &geocoder, &llm).extract("18.5204, 73.8567").await;
        assert!(matches!(outcome, ExtractionOutcome::Success(ExtractedAddress { source: AddressSource::Coordinates, .. })));
    }

    #[tokio::test]
    async fn unrecognized_text_falls_through_to_llm_then_clarification() {
        let resolver = FakeResolver("unused");
        let geocoder = FakeGeocoder;
        let llm = FakeLlm;
        let outcome = pipeline(&resolver, &geocoder, &llm).extract("send it over please").await;
        match outcome {
            ExtractionOutcome::Success(a) => assert_eq!(a.source, AddressSource::LlmExtracted),
            other => panic!("expected llm extraction success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fully_unresolvable_input_needs_more_info() {
        struct NoLlm;
        #[async_trait]
        impl LlmClient for NoLlm {
            async fn extract_address(&self, _raw: &str) -> anyhow::Result<AddressLlmExtraction> {
                anyhow::bail!("no llm configured")
            }
            async fn chat(&self, _s: &str, _u: &str) -> anyhow::Result<String> {
                anyhow::bail!("no llm configured")
            }
        }
        let resolver = FakeResolver("unused");
        let geocoder = FakeGeocoder;
        let llm = NoLlm;
        let outcome = pipeline(&resolver, &geocoder, &llm).extract("uh").await;
        assert!(matches!(outcome, ExtractionOutcome::NeedsMoreInfo { .. }));
    }
}
