// src/services/proximity.rs
// DOCUMENTATION: Composition root for the proximity features
// PURPOSE: Wire cache -> provider chain / query engine -> ranker into one service

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::errors::ProximityError;
use crate::models::{AmenityCandidate, Coordinate, GeocodeResult};
use crate::services::cache::{start_cleanup_task, CacheStats, TtlCache};
use crate::services::geocoding::GeoProviderChain;
use crate::services::overpass::{
    HttpOverpassTransport, SpatialQueryEngine, DEFAULT_SELECTORS,
};
use crate::services::ranker::AmenityRanker;

/// Hard cap on the search radius; bounds result size and provider load
pub const MAX_RADIUS_KM: f64 = 3.0;

/// Radius used when the client sends none (or junk)
pub const DEFAULT_RADIUS_KM: f64 = 2.0;

/// Period of the background expiry sweeps
const CACHE_SWEEP_SECONDS: u64 = 60;

/// Outcome of a nearby-amenity lookup
/// DOCUMENTATION: Always a valid result set; a degraded lookup carries an
/// empty list and a human-readable message instead of an error
#[derive(Debug, Clone)]
pub struct NearbyLookup {
    pub amenities: Vec<AmenityCandidate>,
    pub search_radius: f64,
    pub message: Option<String>,
}

/// Snapshot of both cache instances, exposed on the admin surface
#[derive(Debug, Serialize, Deserialize)]
pub struct ProximityCacheStats {
    pub amenity: CacheStats,
    pub spatial: CacheStats,
}

/// Per-cache removal counts from a substring invalidation
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheInvalidation {
    pub amenity_removed: usize,
    pub spatial_removed: usize,
}

/// Stateful service instance created once per process
/// DOCUMENTATION: Owns the amenity cache (5 min default) while the engine
/// guards spatial responses with its own instance (10 min default); both
/// are swept by background tasks whose handles main aborts on shutdown
pub struct ProximityService {
    geocoder: GeoProviderChain,
    engine: SpatialQueryEngine,
    amenity_cache: TtlCache<Vec<AmenityCandidate>>,
}

impl ProximityService {
    pub fn from_config(config: &Config) -> Self {
        let geocoder = GeoProviderChain::new(
            config.geocode_primary_url.clone(),
            config.geocode_fallback_url.clone(),
        );
        let engine = SpatialQueryEngine::new(
            Arc::new(HttpOverpassTransport::new()),
            config.overpass_endpoints.clone(),
        )
        .with_cache(
            Duration::from_secs(config.spatial_cache_ttl_secs),
            config.cache_max_entries,
        );
        let amenity_cache = TtlCache::new(
            Duration::from_secs(config.amenity_cache_ttl_secs),
            config.cache_max_entries,
        );

        Self {
            geocoder,
            engine,
            amenity_cache,
        }
    }

    /// Assemble from explicit parts (used by tests)
    pub fn with_components(
        geocoder: GeoProviderChain,
        engine: SpatialQueryEngine,
        amenity_cache: TtlCache<Vec<AmenityCandidate>>,
    ) -> Self {
        Self {
            geocoder,
            engine,
            amenity_cache,
        }
    }

    /// Resolve a free-text address via the provider chain
    /// DOCUMENTATION: None means "not found", never a failure
    pub async fn geocode(&self, query: &str) -> Option<GeocodeResult> {
        self.geocoder.resolve(query).await
    }

    /// Find amenities around a point
    ///
    /// The cache key rounds coordinates to three decimals (~110 m) so
    /// lookups for effectively the same spot share one entry. On
    /// exhaustion of the spatial mirrors the lookup degrades to an empty
    /// successful result and is not cached, so recovery shows immediately.
    pub async fn find_nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> Result<NearbyLookup, ProximityError> {
        let anchor = Coordinate::new(lat, lng)?;
        let radius_km = effective_radius(radius_km);
        let cache_key = format!("nearby:{:.3}:{:.3}:{:.1}", lat, lng, radius_km);

        if let Some(amenities) = self.amenity_cache.get(&cache_key).await {
            return Ok(NearbyLookup {
                amenities,
                search_radius: radius_km,
                message: None,
            });
        }

        let radius_m = (radius_km * 1000.0).round() as u32;
        match self.engine.query(&anchor, radius_m, DEFAULT_SELECTORS).await {
            Ok(elements) => {
                let amenities = AmenityRanker::rank(&anchor, &elements);
                log::info!(
                    "Ranked {} of {} raw elements for ({}, {})",
                    amenities.len(),
                    elements.len(),
                    lat,
                    lng
                );
                self.amenity_cache.set(cache_key, amenities.clone()).await;
                Ok(NearbyLookup {
                    amenities,
                    search_radius: radius_km,
                    message: None,
                })
            }
            Err(ProximityError::SearchExhausted(cause)) => {
                log::error!("Nearby lookup degraded for ({}, {}): {}", lat, lng, cause);
                Ok(NearbyLookup {
                    amenities: Vec::new(),
                    search_radius: radius_km,
                    message: Some("Nearby places temporarily unavailable".to_string()),
                })
            }
            Err(other) => Err(other),
        }
    }

    pub async fn cache_stats(&self) -> ProximityCacheStats {
        ProximityCacheStats {
            amenity: self.amenity_cache.stats().await,
            spatial: self.engine.cache_stats().await,
        }
    }

    pub async fn invalidate(&self, pattern: &str) -> CacheInvalidation {
        CacheInvalidation {
            amenity_removed: self.amenity_cache.invalidate(pattern).await,
            spatial_removed: self.engine.invalidate_cache(pattern).await,
        }
    }

    /// Spawn the periodic expiry sweeps for both cache instances
    /// DOCUMENTATION: Handles must be aborted on shutdown
    pub fn start_cache_sweeps(&self) -> Vec<JoinHandle<()>> {
        vec![
            start_cleanup_task(self.amenity_cache.clone(), CACHE_SWEEP_SECONDS),
            self.engine.start_cache_sweep(CACHE_SWEEP_SECONDS),
        ]
    }
}

/// Clamp the requested radius into the supported range
fn effective_radius(requested: Option<f64>) -> f64 {
    match requested {
        Some(r) if r.is_finite() && r > 0.0 => r.min(MAX_RADIUS_KM),
        _ => DEFAULT_RADIUS_KM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderFailure;
    use crate::services::overpass::{OverpassElement, OverpassResponse, OverpassTransport};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingTransport {
        attempts: AtomicUsize,
        queries: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingTransport {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                attempts: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                attempts: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl OverpassTransport for RecordingTransport {
        async fn execute(
            &self,
            _endpoint: &str,
            query: &str,
        ) -> Result<OverpassResponse, ProviderFailure> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(ProviderFailure::Status(503));
            }
            Ok(OverpassResponse {
                elements: vec![OverpassElement {
                    lat: Some(23.030),
                    lon: Some(72.5586),
                    tags: HashMap::from([
                        ("amenity".to_string(), "pharmacy".to_string()),
                        ("name".to_string(), "Corner Pharmacy".to_string()),
                    ]),
                    center: None,
                }],
            })
        }
    }

    fn service_with(transport: Arc<RecordingTransport>) -> ProximityService {
        let engine = SpatialQueryEngine::new(
            transport,
            vec!["https://mirror.test/api".to_string()],
        )
        .with_retry_policy(2, Duration::from_millis(10));

        ProximityService::with_components(
            GeoProviderChain::with_providers(Vec::new()),
            engine,
            TtlCache::new(Duration::from_secs(300), 1000),
        )
    }

    #[test]
    fn test_effective_radius_clamping() {
        assert_eq!(effective_radius(Some(5.0)), 3.0);
        assert_eq!(effective_radius(Some(3.0)), 3.0);
        assert_eq!(effective_radius(Some(1.5)), 1.5);
        assert_eq!(effective_radius(None), 2.0);
        assert_eq!(effective_radius(Some(-1.0)), 2.0);
        assert_eq!(effective_radius(Some(f64::NAN)), 2.0);
    }

    #[tokio::test]
    async fn test_radius_above_cap_queries_at_3km() {
        let transport = RecordingTransport::ok();
        let service = service_with(transport.clone());

        let lookup = service
            .find_nearby(23.0271, 72.5586, Some(5.0))
            .await
            .unwrap();

        assert_eq!(lookup.search_radius, 3.0);
        let queries = transport.queries.lock().unwrap();
        assert!(queries[0].contains("around:3000"));
    }

    #[tokio::test]
    async fn test_cache_key_rounds_to_three_decimals() {
        let transport = RecordingTransport::ok();
        let service = service_with(transport.clone());

        service
            .find_nearby(23.0271, 72.5586, Some(2.0))
            .await
            .unwrap();
        // Differs only past the third decimal: must share the cache entry
        let second = service
            .find_nearby(23.02712, 72.55861, Some(2.0))
            .await
            .unwrap();

        assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(second.amenities.len(), 1);
    }

    #[tokio::test]
    async fn test_different_radius_is_a_different_entry() {
        let transport = RecordingTransport::ok();
        let service = service_with(transport.clone());

        service
            .find_nearby(23.0271, 72.5586, Some(1.0))
            .await
            .unwrap();
        service
            .find_nearby(23.0271, 72.5586, Some(2.0))
            .await
            .unwrap();

        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_degrades_to_empty_success() {
        let transport = RecordingTransport::failing();
        let service = service_with(transport.clone());

        let lookup = service
            .find_nearby(23.0271, 72.5586, None)
            .await
            .unwrap();

        assert!(lookup.amenities.is_empty());
        assert_eq!(lookup.search_radius, 2.0);
        assert_eq!(
            lookup.message.as_deref(),
            Some("Nearby places temporarily unavailable")
        );

        // Degraded outcomes are not cached: a retry reaches the transport
        let before = transport.attempts.load(Ordering::SeqCst);
        service
            .find_nearby(23.0271, 72.5586, None)
            .await
            .unwrap();
        assert!(transport.attempts.load(Ordering::SeqCst) > before);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_are_rejected() {
        let service = service_with(RecordingTransport::ok());

        assert!(service.find_nearby(91.0, 0.0, None).await.is_err());
        assert!(service.find_nearby(0.0, 200.0, None).await.is_err());
        assert!(service.find_nearby(f64::NAN, 0.0, None).await.is_err());
    }

    #[tokio::test]
    async fn test_cache_stats_and_invalidation_cover_both_instances() {
        let transport = RecordingTransport::ok();
        let service = service_with(transport.clone());

        service
            .find_nearby(23.0271, 72.5586, Some(2.0))
            .await
            .unwrap();

        let stats = service.cache_stats().await;
        assert_eq!(stats.amenity.size, 1);
        assert_eq!(stats.spatial.size, 1);

        let removed = service.invalidate("23.027").await;
        assert_eq!(removed.amenity_removed, 1);
        assert_eq!(removed.spatial_removed, 1);
    }
}
