// src/handlers/geo.rs
// DOCUMENTATION: HTTP handlers for geocoding and nearby-amenity lookups
// PURPOSE: Parse requests, call the proximity service, return responses

use crate::errors::ProximityError;
use crate::models::{GeocodeQuery, GeocodeResponse, NearbyQuery, NearbyResponse};
use crate::services::ProximityService;
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

/// GET /geocode
/// Resolve a free-text address to coordinates
///
/// Provider exhaustion is a valid outcome, not an error: the body carries
/// success:false with a message and the status stays 200
pub async fn geocode(
    service: web::Data<Arc<ProximityService>>,
    query: web::Query<GeocodeQuery>,
) -> Result<impl Responder, ProximityError> {
    if let Err(e) = query.validate() {
        return Err(ProximityError::InvalidInput(e.to_string()));
    }

    let free_text = query.free_text().ok_or_else(|| {
        ProximityError::InvalidInput("At least one of address/city is required".to_string())
    })?;

    match service.geocode(&free_text).await {
        Some(result) => Ok(HttpResponse::Ok().json(GeocodeResponse::found(result))),
        None => Ok(HttpResponse::Ok().json(GeocodeResponse::not_found())),
    }
}

/// GET /nearby
/// Rank amenities around a coordinate
pub async fn nearby(
    service: web::Data<Arc<ProximityService>>,
    query: web::Query<NearbyQuery>,
) -> Result<impl Responder, ProximityError> {
    let (lat, lng) = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
        _ => {
            return Err(ProximityError::InvalidInput(
                "lat and lng are required and must be finite numbers".to_string(),
            ))
        }
    };

    let lookup = service.find_nearby(lat, lng, query.radius).await?;

    Ok(HttpResponse::Ok().json(NearbyResponse {
        success: true,
        total_found: lookup.amenities.len(),
        amenities: lookup.amenities,
        search_radius: lookup.search_radius,
        message: lookup.message,
    }))
}

/// Configuration for geo routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/geocode", web::get().to(geocode))
        .route("/nearby", web::get().to(nearby));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderFailure;
    use crate::services::{
        GeoProviderChain, OverpassElement, OverpassResponse, OverpassTransport,
        SpatialQueryEngine, TtlCache,
    };
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedTransport {
        outcome: Result<Vec<OverpassElement>, u16>,
    }

    #[async_trait]
    impl OverpassTransport for FixedTransport {
        async fn execute(
            &self,
            _endpoint: &str,
            _query: &str,
        ) -> Result<OverpassResponse, ProviderFailure> {
            match &self.outcome {
                Ok(elements) => Ok(OverpassResponse {
                    elements: elements.clone(),
                }),
                Err(status) => Err(ProviderFailure::Status(*status)),
            }
        }
    }

    fn pharmacy_element() -> OverpassElement {
        OverpassElement {
            lat: Some(23.029),
            lon: Some(72.5586),
            tags: HashMap::from([
                ("amenity".to_string(), "pharmacy".to_string()),
                ("name".to_string(), "Corner Pharmacy".to_string()),
            ]),
            center: None,
        }
    }

    fn app_service(outcome: Result<Vec<OverpassElement>, u16>) -> Arc<ProximityService> {
        let engine = SpatialQueryEngine::new(
            Arc::new(FixedTransport { outcome }),
            vec!["https://mirror.test/api".to_string()],
        )
        .with_retry_policy(2, Duration::from_millis(10));

        Arc::new(ProximityService::with_components(
            GeoProviderChain::with_providers(Vec::new()),
            engine,
            TtlCache::new(Duration::from_secs(300), 1000),
        ))
    }

    #[actix_web::test]
    async fn test_nearby_happy_path() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_service(Ok(vec![pharmacy_element()]))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/nearby?lat=23.0271&lng=72.5586&radius=2")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["totalFound"], 1);
        assert_eq!(body["searchRadius"], 2.0);
        assert_eq!(body["amenities"][0]["name"], "Corner Pharmacy");
        assert_eq!(body["amenities"][0]["category"], "pharmacy");
        assert!(body.get("message").is_none());
    }

    #[actix_web::test]
    async fn test_nearby_degrades_to_200_on_mirror_outage() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_service(Err(503))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/nearby?lat=23.0271&lng=72.5586&radius=2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalFound"], 0);
        assert_eq!(body["searchRadius"], 2.0);
        assert_eq!(body["amenities"].as_array().unwrap().len(), 0);
        assert_eq!(body["message"], "Nearby places temporarily unavailable");
    }

    #[actix_web::test]
    async fn test_nearby_missing_coordinates_is_400() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_service(Ok(Vec::new()))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/nearby?lat=23.0271")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_geocode_requires_address_or_city() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_service(Ok(Vec::new()))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/geocode").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_geocode_exhaustion_is_200_not_found() {
        // The chain has no providers, so resolution always exhausts
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_service(Ok(Vec::new()))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/geocode?address=nowhere+lane&city=atlantis")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["coordinates"], serde_json::Value::Null);
        assert_eq!(body["error"], "Address not found");
    }
}
