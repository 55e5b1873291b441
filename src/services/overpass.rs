// src/services/overpass.rs
// DOCUMENTATION: Spatial query engine over mirrored Overpass-style endpoints
// PURPOSE: Reliably fetch raw points of interest around a coordinate

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{ProviderFailure, ProximityError};
use crate::models::Coordinate;
use crate::services::cache::{CacheStats, TtlCache};

/// Per-endpoint deadline; mirrors differ widely in load
const OVERPASS_TIMEOUT: Duration = Duration::from_secs(12);

/// Full sweeps over the mirror pool before giving up
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Pause between sweeps
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Raw spatial-query response: {elements: [{lat, lon, tags, center?}]}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

/// One provider-native map element
/// DOCUMENTATION: Nodes carry lat/lon directly; ways carry a bounding
/// center instead. Consumed only within one ranking pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassElement {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    pub center: Option<OverpassCenter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    /// Element position: direct lat/lon for nodes, bounding center for ways
    pub fn coordinate(&self) -> Option<Coordinate> {
        let (lat, lon) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(center)) => (center.lat, center.lon),
            _ => return None,
        };
        Coordinate::new(lat, lon).ok()
    }
}

/// One tag-key filter of the spatial query
#[derive(Debug, Clone, Copy)]
pub struct TagSelector {
    pub key: &'static str,
    pub pattern: &'static str,
}

/// Default amenity selectors matched against the category table in the ranker
pub const DEFAULT_SELECTORS: &[TagSelector] = &[
    TagSelector {
        key: "amenity",
        pattern: "^(hospital|clinic|doctors|pharmacy|school|college|university|restaurant|cafe|fast_food|bank|atm|fuel|bus_station)$",
    },
    TagSelector {
        key: "shop",
        pattern: "^(supermarket|convenience|mall|department_store|bakery|greengrocer)$",
    },
    TagSelector {
        key: "leisure",
        pattern: "^(park|playground|fitness_centre|sports_centre)$",
    },
    TagSelector {
        key: "railway",
        pattern: "^(station|halt|tram_stop)$",
    },
    TagSelector {
        key: "highway",
        pattern: "^(bus_stop)$",
    },
];

/// Build one query-language payload for all selectors
/// DOCUMENTATION: Nodes and ways are both queried; `out center` makes the
/// service attach a bounding center to ways so every element is locatable
pub fn build_query(center: &Coordinate, radius_m: u32, selectors: &[TagSelector]) -> String {
    let mut query = String::from("[out:json][timeout:12];\n(\n");
    for selector in selectors {
        for element_kind in ["node", "way"] {
            query.push_str(&format!(
                "  {}[\"{}\"~\"{}\"](around:{},{},{});\n",
                element_kind,
                selector.key,
                selector.pattern,
                radius_m,
                center.latitude,
                center.longitude
            ));
        }
    }
    query.push_str(");\nout center 100;\n");
    query
}

/// Transport executing one spatial query against one endpoint
/// DOCUMENTATION: Seam between the retry loop and the network so the loop
/// itself stays cause-agnostic and testable
#[async_trait]
pub trait OverpassTransport: Send + Sync {
    async fn execute(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<OverpassResponse, ProviderFailure>;
}

/// reqwest-backed transport: POST the raw query string with a bounded timeout
pub struct HttpOverpassTransport {
    client: Client,
}

impl HttpOverpassTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpOverpassTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OverpassTransport for HttpOverpassTransport {
    async fn execute(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<OverpassResponse, ProviderFailure> {
        let response = self
            .client
            .post(endpoint)
            .body(query.to_string())
            .timeout(OVERPASS_TIMEOUT)
            .send()
            .await
            .map_err(ProviderFailure::from_reqwest)?;

        if !response.status().is_success() {
            return Err(ProviderFailure::Status(response.status().as_u16()));
        }

        response
            .json::<OverpassResponse>()
            .await
            .map_err(|e| ProviderFailure::Payload(e.to_string()))
    }
}

/// Fan-out spatial query executor with retry-with-backoff
/// DOCUMENTATION: Sweeps the mirror pool in fixed order; the first 2xx
/// short-circuits everything. Every failure cause (429, 5xx, other 4xx,
/// timeout, network, bad payload) is soft: the sweep continues to the next
/// endpoint, and exhausted rounds sleep a fixed backoff before retrying.
/// Responses are cached in a dedicated instance so repeat queries for the
/// same area skip the fan-out entirely.
pub struct SpatialQueryEngine {
    transport: Arc<dyn OverpassTransport>,
    endpoints: Vec<String>,
    max_retries: u32,
    backoff: Duration,
    cache: TtlCache<Vec<OverpassElement>>,
}

impl SpatialQueryEngine {
    pub fn new(transport: Arc<dyn OverpassTransport>, endpoints: Vec<String>) -> Self {
        Self {
            transport,
            endpoints,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
            cache: TtlCache::new(Duration::from_secs(600), 1000),
        }
    }

    /// Override the retry budget and backoff (tests use millisecond backoff)
    pub fn with_retry_policy(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    /// Replace the response cache configuration
    pub fn with_cache(mut self, ttl: Duration, max_size: usize) -> Self {
        self.cache = TtlCache::new(ttl, max_size);
        self
    }

    /// Execute a radius query, failing only after the full retry budget
    pub async fn query(
        &self,
        center: &Coordinate,
        radius_m: u32,
        selectors: &[TagSelector],
    ) -> Result<Vec<OverpassElement>, ProximityError> {
        let cache_key = format!(
            "spatial:{:.3}:{:.3}:{}",
            center.latitude, center.longitude, radius_m
        );

        if let Some(elements) = self.cache.get(&cache_key).await {
            return Ok(elements);
        }

        let query = build_query(center, radius_m, selectors);
        let mut last_failure: Option<ProviderFailure> = None;

        for round in 0..self.max_retries {
            for endpoint in &self.endpoints {
                match self.transport.execute(endpoint, &query).await {
                    Ok(response) => {
                        log::info!(
                            "Spatial query served by {} ({} elements)",
                            endpoint,
                            response.elements.len()
                        );
                        self.cache.set(cache_key, response.elements.clone()).await;
                        return Ok(response.elements);
                    }
                    Err(failure) => {
                        log::warn!(
                            "Spatial endpoint {} failed on round {}: {}",
                            endpoint,
                            round + 1,
                            failure
                        );
                        last_failure = Some(failure);
                    }
                }
            }

            if round + 1 < self.max_retries {
                tokio::time::sleep(self.backoff).await;
            }
        }

        let cause = last_failure
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no endpoints configured".to_string());
        log::error!(
            "Spatial query exhausted after {} rounds across {} endpoints: {}",
            self.max_retries,
            self.endpoints.len(),
            cause
        );
        Err(ProximityError::SearchExhausted(cause))
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn invalidate_cache(&self, pattern: &str) -> usize {
        self.cache.invalidate(pattern).await
    }

    /// Periodic expiry sweep handle for the response cache
    pub fn start_cache_sweep(&self, interval_seconds: u64) -> tokio::task::JoinHandle<()> {
        crate::services::cache::start_cleanup_task(self.cache.clone(), interval_seconds)
    }
}
