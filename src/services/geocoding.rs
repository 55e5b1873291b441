// src/services/geocoding.rs
// DOCUMENTATION: Free-text geocoding with prioritized provider fallback
// PURPOSE: Resolve addresses to coordinates, masking partial provider failures

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geojson::FeatureCollection;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;

use crate::errors::ProviderFailure;
use crate::models::{Coordinate, GeocodeResult};

/// Per-request deadline for geocoder calls
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(8);

/// Public geocoders require an identifying agent
const USER_AGENT: &str = concat!("homevia-proximity/", env!("CARGO_PKG_VERSION"));

/// One geocoding backend
/// DOCUMENTATION: A provider either yields a parseable first candidate,
/// yields nothing, or fails with a tagged retryable cause. The chain
/// treats the last two identically.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>, ProviderFailure>;
}

/// Nominatim-style provider: JSON array of candidates with lat/lon/display_name
/// DOCUMENTATION: Primary backend. Public instances enforce roughly one
/// request per second, throttled here client-side with a direct limiter.
pub struct NominatimProvider {
    client: Client,
    base_url: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl NominatimProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(NonZeroU32::MIN))),
        }
    }

    /// Parse the candidate array, tolerating string or numeric lat/lon
    /// DOCUMENTATION: Any shape deviation yields None (a soft failure)
    fn parse_body(body: &Value, query: &str) -> Option<GeocodeResult> {
        let first = body.as_array()?.first()?;
        let lat = number_field(first.get("lat")?)?;
        let lon = number_field(first.get("lon")?)?;
        let coordinate = Coordinate::new(lat, lon).ok()?;

        let display_name = first
            .get("display_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(query)
            .to_string();

        Some(GeocodeResult {
            coordinate,
            display_name,
        })
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>, ProviderFailure> {
        self.limiter.until_ready().await;

        let url = format!("{}/search", self.base_url);
        log::debug!("Nominatim lookup: q='{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(GEOCODE_TIMEOUT)
            .send()
            .await
            .map_err(ProviderFailure::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ProviderFailure::Status(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(ProviderFailure::from_reqwest)?;

        Ok(Self::parse_body(&body, query))
    }
}

/// Photon-style provider: GeoJSON FeatureCollection with [lon, lat] points
/// DOCUMENTATION: Fallback backend, typically lower precision but
/// independently operated from the primary
pub struct PhotonProvider {
    client: Client,
    base_url: String,
}

impl PhotonProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn parse_body(body: &Value, query: &str) -> Option<GeocodeResult> {
        let collection: FeatureCollection = serde_json::from_value(body.clone()).ok()?;
        let feature = collection.features.into_iter().next()?;

        let (lon, lat) = match feature.geometry?.value {
            geojson::Value::Point(coords) if coords.len() >= 2 => (coords[0], coords[1]),
            _ => return None,
        };
        let coordinate = Coordinate::new(lat, lon).ok()?;

        // Assemble a readable display name from the feature properties
        let properties = feature.properties.unwrap_or_default();
        let parts: Vec<String> = ["name", "city", "state", "country"]
            .iter()
            .filter_map(|key| properties.get(*key))
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        let display_name = if parts.is_empty() {
            query.to_string()
        } else {
            parts.join(", ")
        };

        Some(GeocodeResult {
            coordinate,
            display_name,
        })
    }
}

#[async_trait]
impl GeocodeProvider for PhotonProvider {
    fn name(&self) -> &str {
        "photon"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>, ProviderFailure> {
        let url = format!("{}/api", self.base_url);
        log::debug!("Photon lookup: q='{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(GEOCODE_TIMEOUT)
            .send()
            .await
            .map_err(ProviderFailure::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ProviderFailure::Status(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(ProviderFailure::from_reqwest)?;

        Ok(Self::parse_body(&body, query))
    }
}

/// Accept a coordinate encoded as either a JSON string or number
fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Ordered list of geocoding backends tried until one succeeds
/// DOCUMENTATION: First parseable result wins; every failure mode
/// (network, timeout, bad status, empty payload) logs a warning and
/// falls through to the next provider. Exhaustion yields None, never
/// an error, so the route layer can render a valid "not found" body.
pub struct GeoProviderChain {
    providers: Vec<Box<dyn GeocodeProvider>>,
}

impl GeoProviderChain {
    pub fn new(primary_url: String, fallback_url: String) -> Self {
        Self {
            providers: vec![
                Box::new(NominatimProvider::new(primary_url)),
                Box::new(PhotonProvider::new(fallback_url)),
            ],
        }
    }

    /// Build a chain from an explicit provider list (used by tests)
    pub fn with_providers(providers: Vec<Box<dyn GeocodeProvider>>) -> Self {
        Self { providers }
    }

    /// Resolve a free-text query to the first usable coordinate
    pub async fn resolve(&self, query: &str) -> Option<GeocodeResult> {
        for provider in &self.providers {
            match provider.geocode(query).await {
                Ok(Some(result)) => {
                    log::info!(
                        "Geocoded '{}' via {} -> ({}, {})",
                        query,
                        provider.name(),
                        result.coordinate.latitude,
                        result.coordinate.longitude
                    );
                    return Some(result);
                }
                Ok(None) => {
                    log::warn!("Geocoder {} returned no result for '{}'", provider.name(), query);
                }
                Err(failure) => {
                    log::warn!("Geocoder {} failed for '{}': {}", provider.name(), query, failure);
                }
            }
        }

        log::warn!("All geocoding providers exhausted for '{}'", query);
        None
    }
}
