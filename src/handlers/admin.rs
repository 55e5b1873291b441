// src/handlers/admin.rs
// DOCUMENTATION: Admin handlers for cache operations
// PURPOSE: Expose cache observability and invalidation via REST endpoints

use crate::config::Config;
use crate::errors::ProximityError;
use crate::services::ProximityService;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use std::sync::Arc;

/// Request body for cache invalidation
#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    /// Substring matched against cache keys
    pub pattern: String,
}

/// Verify the X-Admin-Token header against configuration
fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), ProximityError> {
    let provided = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(token) if token == config.admin_token => Ok(()),
        _ => {
            log::warn!("Admin request rejected: bad or missing X-Admin-Token");
            Err(ProximityError::Unauthorized)
        }
    }
}

/// GET /admin/cache/stats
/// Snapshot of both cache instances
pub async fn cache_stats(
    service: web::Data<Arc<ProximityService>>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<impl Responder, ProximityError> {
    verify_admin_token(&req, &config)?;

    let stats = service.cache_stats().await;
    Ok(HttpResponse::Ok().json(stats))
}

/// POST /admin/cache/invalidate
/// Remove every cached entry whose key contains the given substring
///
/// DOCUMENTATION: Used when underlying map data is known to have changed
pub async fn cache_invalidate(
    service: web::Data<Arc<ProximityService>>,
    config: web::Data<Config>,
    req: HttpRequest,
    body: web::Json<InvalidateRequest>,
) -> Result<impl Responder, ProximityError> {
    verify_admin_token(&req, &config)?;

    if body.pattern.trim().is_empty() {
        return Err(ProximityError::InvalidInput(
            "pattern must not be empty".to_string(),
        ));
    }

    log::info!("Admin cache invalidation for pattern '{}'", body.pattern);
    let removed = service.invalidate(&body.pattern).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "removed": removed
    })))
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/cache/stats", web::get().to(cache_stats))
            .route("/cache/invalidate", web::post().to(cache_invalidate)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        GeoProviderChain, HttpOverpassTransport, SpatialQueryEngine, TtlCache,
    };
    use actix_web::{test, App};
    use std::time::Duration;

    fn test_config() -> Config {
        let mut config = Config::from_env();
        config.admin_token = "secret".to_string();
        config
    }

    fn idle_service() -> Arc<ProximityService> {
        let engine = SpatialQueryEngine::new(
            Arc::new(HttpOverpassTransport::new()),
            vec!["https://mirror.test/api".to_string()],
        );
        Arc::new(ProximityService::with_components(
            GeoProviderChain::with_providers(Vec::new()),
            engine,
            TtlCache::new(Duration::from_secs(300), 1000),
        ))
    }

    #[actix_web::test]
    async fn test_stats_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(idle_service()))
                .app_data(web::Data::new(test_config()))
                .configure(config),
        )
        .await;

        let denied = test::TestRequest::get()
            .uri("/admin/cache/stats")
            .to_request();
        let resp = test::call_service(&app, denied).await;
        assert_eq!(resp.status().as_u16(), 401);

        let allowed = test::TestRequest::get()
            .uri("/admin/cache/stats")
            .insert_header(("X-Admin-Token", "secret"))
            .to_request();
        let resp = test::call_service(&app, allowed).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_invalidate_rejects_empty_pattern() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(idle_service()))
                .app_data(web::Data::new(test_config()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/admin/cache/invalidate")
            .insert_header(("X-Admin-Token", "secret"))
            .set_json(serde_json::json!({ "pattern": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }
}
