// src/address/deps.rs
// Narrow capability traits the address pipeline consumes. Production
// implementations call the PHP backend geocode/zone endpoints (spec §6);
// tests substitute fakes, mirroring the teacher's `LlmProvider` trait split
// between a trait object and a concrete reqwest-backed implementation.

use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
}

#[derive(Debug, Clone)]
pub struct ZoneResult {
    pub zone_id: i64,
    pub zone_name: String,
}

#[async_trait]
pub trait GeocodingClient: Send + Sync {
    async fn geocode_text(&self, address: &str, module_id: &str, zone_id: &str) -> anyhow::Result<GeocodeResult>;
    async fn reverse_geocode(&self, lat: f64, lng: f64, module_id: &str, zone_id: &str) -> anyhow::Result<GeocodeResult>;
    async fn zone_for(&self, lat: f64, lng: f64) -> anyhow::Result<ZoneResult>;
}

#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Follow redirects (bounded) and return the final URL.
    async fn resolve(&self, url: &str, max_redirects: u8) -> anyhow::Result<String>;
}

pub struct ReqwestUrlResolver {
    client: reqwest::Client,
}

impl ReqwestUrlResolver {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client"),
        }
    }
}

impl Default for ReqwestUrlResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlResolver for ReqwestUrlResolver {
    async fn resolve(&self, url: &str, max_redirects: u8) -> anyhow::Result<String> {
        let mut current = url.to_string();
        for _ in 0..max_redirects {
            let resp = self.client.get(&current).send().await?;
            if resp.status().is_redirection() {
                if let Some(location) = resp.headers().get(reqwest::header::LOCATION) {
                    current = location.to_str()?.to_string();
                    continue;
                }
            }
            return Ok(current);
        }
        Ok(current)
    }
}

pub struct PhpBackendGeocodingClient {
    client: reqwest::Client,
    base_url: String,
}

impl PhpBackendGeocodingClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(Duration::from_secs(5)).build().expect("reqwest client"),
            base_url,
        }
    }
}

#[async_trait]
impl GeocodingClient for PhpBackendGeocodingClient {
    async fn geocode_text(&self, address: &str, module_id: &str, zone_id: &str) -> anyhow::Result<GeocodeResult> {
        let url = format!("{}/api/v1/config/geocode-api", self.base_url);
        let resp: serde_json::Value = self
            .client
            .get(url)
            .query(&[("address", address)])
            .header("moduleid", module_id)
            .header("zoneid", zone_id)
            .send()
            .await?
            .json()
            .await?;
        parse_geocode_response(resp)
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64, module_id: &str, zone_id: &str) -> anyhow::Result<GeocodeResult> {
        let url = format!("{}/api/v1/config/geocode-api", self.base_url);
        let resp: serde_json::Value = self
            .client
            .get(url)
            .query(&[("lat", lat.to_string()), ("lng", lng.to_string())])
            .header("moduleid", module_id)
            .header("zoneid", zone_id)
            .send()
            .await?
            .json()
            .await?;
        parse_geocode_response(resp)
    }

    async fn zone_for(&self, lat: f64, lng: f64) -> anyhow::Result<ZoneResult> {
        let url = format!("{}/api/v1/config/get-zone-id", self.base_url);
        let resp: serde_json::Value = self
            .client
            .get(url)
            .query(&[("lat", lat.to_string()), ("lng", lng.to_string())])
            .send()
            .await?
            .json()
            .await?;
        parse_zone_response(resp)
    }
}

fn parse_geocode_response(v: serde_json::Value) -> anyhow::Result<GeocodeResult> {
    Ok(GeocodeResult {
        lat: v.get("lat").and_then(|x| x.as_f64()).ok_or_else(|| anyhow::anyhow!("missing lat"))?,
        lng: v.get("lng").and_then(|x| x.as_f64()).ok_or_else(|| anyhow::anyhow!("missing lng"))?,
        formatted_address: v.get("formatted_address").and_then(|x| x.as_str()).unwrap_or_default().to_string(),
    })
}

/// `zone_id` may arrive as a primitive, an array, or a JSON-encoded string
/// array (spec §6); normalize to the first element either way.
fn parse_zone_response(v: serde_json::Value) -> anyhow::Result<ZoneResult> {
    let zone_id_raw = v.get("zone_id").cloned().ok_or_else(|| anyhow::anyhow!("missing zone_id"))?;
    let zone_id = first_zone_id(zone_id_raw)?;
    let zone_name = v.get("zone_name").and_then(|x| x.as_str()).unwrap_or_default().to_string();
    Ok(ZoneResult { zone_id, zone_name })
}

fn first_zone_id(raw: serde_json::Value) -> anyhow::Result<i64> {
    match raw {
        serde_json::Value::Number(n) => n.as_i64().ok_or_else(|| anyhow::anyhow!("zone_id not an integer")),
        serde_json::Value::Array(arr) => {
            let first = arr.into_iter().next().ok_or_else(|| anyhow::anyhow!("empty zone_id array"))?;
            first.as_i64().ok_or_else(|| anyhow::anyhow!("zone_id array element not an integer"))
        }
        serde_json::Value::String(s) => {
            if let Ok(n) = s.parse::<i64>() {
                return Ok(n);
            }
            let parsed: serde_json::Value = serde_json::from_str(&s)?;
            first_zone_id(parsed)
        }
        other => anyhow::bail!("unsupported zone_id shape: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_primitive_zone_id() {
        assert_eq!(first_zone_id(serde_json::json!(7)).unwrap(), 7);
    }

    #[test]
    fn normalizes_array_zone_id() {
        assert_eq!(first_zone_id(serde_json::json!([3, 9])).unwrap(), 3);
    }

    #[test]
    fn normalizes_json_string_array_zone_id() {
        assert_eq!(first_zone_id(serde_json::json!("[5,6]")).unwrap(), 5);
    }
}
