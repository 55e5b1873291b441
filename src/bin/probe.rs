// src/bin/probe.rs
// Smoke probe for a running homevia-proximity instance: geocodes an
// address, then lists the nearby amenities around the resolved point.

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;

// --- ANSI terminal colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Deserialize, Debug)]
struct HealthBody {
    status: String,
    service: String,
    version: String,
}

#[derive(Deserialize, Debug)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeocodeBody {
    success: bool,
    coordinates: Option<LatLng>,
    display_name: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AmenityBody {
    name: String,
    category: String,
    formatted_distance: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct NearbyBody {
    success: bool,
    amenities: Vec<AmenityBody>,
    search_radius: f64,
    total_found: usize,
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let query: Vec<String> = env::args().skip(1).collect();
    if query.is_empty() {
        bail!("usage: probe <free-text address>  (e.g. probe \"MG Road, Bengaluru\")");
    }
    let address = query.join(" ");

    let base_url =
        env::var("PROXIMITY_URL").unwrap_or_else(|_| "http://127.0.0.1:8003".to_string());
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;

    println!("{}{}Probing {}{}", BOLD, CYAN, base_url, RESET);

    // 1. Health
    let health: HealthBody = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .context("health check failed; is the service running?")?
        .json()
        .await
        .context("health check returned an unexpected body")?;
    println!(
        "{}✓{} {} {} ({})",
        GREEN, RESET, health.service, health.version, health.status
    );

    // 2. Geocode
    let geocode: GeocodeBody = client
        .get(format!("{}/geocode", base_url))
        .query(&[("address", address.as_str())])
        .send()
        .await
        .context("geocode request failed")?
        .json()
        .await
        .context("geocode returned an unexpected body")?;

    let coordinates = match (geocode.success, geocode.coordinates) {
        (true, Some(coordinates)) => {
            println!(
                "{}✓{} Geocoded '{}' -> ({:.4}, {:.4}) {}",
                GREEN,
                RESET,
                address,
                coordinates.lat,
                coordinates.lng,
                geocode.display_name.unwrap_or_default()
            );
            coordinates
        }
        _ => {
            println!(
                "{}✗{} Geocode miss for '{}': {}",
                RED,
                RESET,
                address,
                geocode.error.unwrap_or_else(|| "no detail".to_string())
            );
            return Ok(());
        }
    };

    // 3. Nearby amenities around the resolved point
    let nearby: NearbyBody = client
        .get(format!("{}/nearby", base_url))
        .query(&[
            ("lat", coordinates.lat.to_string()),
            ("lng", coordinates.lng.to_string()),
            ("radius", "2".to_string()),
        ])
        .send()
        .await
        .context("nearby request failed")?
        .json()
        .await
        .context("nearby returned an unexpected body")?;

    if !nearby.success {
        bail!("nearby lookup reported failure");
    }

    if let Some(message) = nearby.message {
        println!("{}!{} {}", YELLOW, RESET, message);
    }

    println!(
        "{}{} amenities within {} km:{}",
        BOLD, nearby.total_found, nearby.search_radius, RESET
    );
    for amenity in nearby.amenities {
        println!(
            "  {}{:<12}{} {:<32} {}",
            CYAN, amenity.category, RESET, amenity.name, amenity.formatted_distance
        );
    }

    Ok(())
}
