// src/models/geo.rs
// DOCUMENTATION: Core geographic data structures
// PURPOSE: Defines coordinate value types and request/response models for the geo endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::ProximityError;
use crate::models::AmenityCandidate;

/// A validated WGS84 point
/// DOCUMENTATION: Immutable value type; construction rejects NaN and
/// out-of-range values so downstream components never see a bad coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ProximityError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(ProximityError::InvalidInput(
                "Coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ProximityError::InvalidInput(format!(
                "Latitude out of range: {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ProximityError::InvalidInput(format!(
                "Longitude out of range: {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Successful geocode outcome
/// DOCUMENTATION: Produced by the provider chain; owned by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub coordinate: Coordinate,
    pub display_name: String,
}

/// Query parameters for GET /geocode
/// DOCUMENTATION: At least one of address/city must be non-empty
#[derive(Debug, Deserialize, Validate)]
pub struct GeocodeQuery {
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 128))]
    pub city: Option<String>,
}

impl GeocodeQuery {
    /// Join the non-empty parts into one free-text provider query
    pub fn free_text(&self) -> Option<String> {
        let parts: Vec<&str> = [self.address.as_deref(), self.city.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Coordinate pair as exposed on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinate> for LatLng {
    fn from(c: Coordinate) -> Self {
        Self {
            lat: c.latitude,
            lng: c.longitude,
        }
    }
}

/// Response body for GET /geocode
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    pub success: bool,
    pub coordinates: Option<LatLng>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeocodeResponse {
    pub fn found(result: GeocodeResult) -> Self {
        Self {
            success: true,
            coordinates: Some(result.coordinate.into()),
            display_name: Some(result.display_name),
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            success: false,
            coordinates: None,
            display_name: None,
            error: Some("Address not found".to_string()),
        }
    }
}

/// Query parameters for GET /nearby
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Search radius in kilometers (default 2, clamped to 3)
    pub radius: Option<f64>,
}

/// Response body for GET /nearby
/// DOCUMENTATION: Always success:true once input validation passes; a
/// degraded lookup carries an empty list plus a human-readable message
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResponse {
    pub success: bool,
    pub amenities: Vec<AmenityCandidate>,
    pub search_radius: f64,
    pub total_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(23.0271, 72.5586).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_free_text_joins_parts() {
        let q = GeocodeQuery {
            address: Some("12 Baker Street".to_string()),
            city: Some("London".to_string()),
        };
        assert_eq!(q.free_text().as_deref(), Some("12 Baker Street, London"));

        let city_only = GeocodeQuery {
            address: None,
            city: Some("Ahmedabad".to_string()),
        };
        assert_eq!(city_only.free_text().as_deref(), Some("Ahmedabad"));
    }

    #[test]
    fn test_free_text_rejects_blank_input() {
        let q = GeocodeQuery {
            address: Some("   ".to_string()),
            city: None,
        };
        assert!(q.free_text().is_none());

        let empty = GeocodeQuery {
            address: None,
            city: None,
        };
        assert!(empty.free_text().is_none());
    }
}
