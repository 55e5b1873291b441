// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, shared state, and start HTTP server

mod config;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::ProximityService;
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting homevia-proximity microservice...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );
    log::info!(
        "Spatial mirrors: {}",
        config.overpass_endpoints.join(", ")
    );

    // 4. Build the shared proximity service
    let service = Arc::new(ProximityService::from_config(&config));
    log::info!(
        "Initialized proximity caches (amenity TTL: {}s, spatial TTL: {}s)",
        config.amenity_cache_ttl_secs,
        config.spatial_cache_ttl_secs
    );

    // Start background expiry sweeps (every 60s)
    let sweepers = service.start_cache_sweeps();
    log::info!("Started cache sweep tasks (interval: 60s)");

    // 5. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();
    let service_clone = service.clone();

    let result = HttpServer::new(move || {
        App::new()
            // Application state (config and proximity service)
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(service_clone.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::geo_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)?
    .run()
    .await;

    // Stop the periodic sweeps so no timer outlives the server
    for handle in sweepers {
        handle.abort();
    }

    result
}
