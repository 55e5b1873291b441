// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use dotenv::dotenv;
use std::env;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Admin authentication token (for cache endpoints)
    pub admin_token: String,

    /// Base URL of the primary geocoder (Nominatim-style)
    pub geocode_primary_url: String,

    /// Base URL of the fallback geocoder (Photon-style)
    pub geocode_fallback_url: String,

    /// Mirror endpoints of the spatial-query service, tried in order
    pub overpass_endpoints: Vec<String>,

    /// TTL for ranked amenity results, in seconds
    pub amenity_cache_ttl_secs: u64,

    /// TTL for raw spatial-query responses, in seconds
    pub spatial_cache_ttl_secs: u64,

    /// Capacity of each cache instance
    pub cache_max_entries: usize,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv().ok();

        Config {
            server_address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8003".to_string())
                .parse()
                .unwrap_or(8003),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "admin-token-dev".to_string()),

            geocode_primary_url: env::var("GEOCODE_PRIMARY_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),

            geocode_fallback_url: env::var("GEOCODE_FALLBACK_URL")
                .unwrap_or_else(|_| "https://photon.komoot.io".to_string()),

            overpass_endpoints: env::var("OVERPASS_ENDPOINTS")
                .unwrap_or_else(|_| {
                    "https://overpass-api.de/api/interpreter,\
                     https://overpass.kumi.systems/api/interpreter,\
                     https://overpass.osm.jp/api/interpreter"
                        .to_string()
                })
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            amenity_cache_ttl_secs: env::var("AMENITY_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),

            spatial_cache_ttl_secs: env::var("SPATIAL_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(600),

            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures application can start safely
    pub fn validate(&self) -> Result<(), String> {
        if self.overpass_endpoints.is_empty() {
            return Err("OVERPASS_ENDPOINTS must list at least one endpoint".to_string());
        }

        if self.geocode_primary_url.is_empty() && self.geocode_fallback_url.is_empty() {
            return Err("At least one geocoder URL is required".to_string());
        }

        if self.admin_token == "admin-token-dev" && self.environment == "production" {
            log::warn!("ADMIN_TOKEN is the development default in production");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = Config::from_env();

        assert!(!config.overpass_endpoints.is_empty());
        assert!(config.validate().is_ok());
        assert!(config.amenity_cache_ttl_secs > 0);
        assert!(config.cache_max_entries > 0);
    }
}
