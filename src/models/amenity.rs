// src/models/amenity.rs
// DOCUMENTATION: Amenity categories and ranked candidate model
// PURPOSE: User-facing classification of raw map points with presentation metadata

use serde::{Deserialize, Serialize};

/// Fixed category table for nearby amenities
/// DOCUMENTATION: Every raw map point is classified into exactly one of
/// these, or dropped. Ordering matters only for map keys; ranking is by
/// distance, never by category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AmenityCategory {
    Hospital,
    Pharmacy,
    School,
    Food,
    Bank,
    Fuel,
    Shopping,
    Leisure,
    Transit,
}

impl AmenityCategory {
    /// Human-readable label, also the display-name fallback for unnamed points
    pub fn label(&self) -> &'static str {
        match self {
            AmenityCategory::Hospital => "Hospital",
            AmenityCategory::Pharmacy => "Pharmacy",
            AmenityCategory::School => "School",
            AmenityCategory::Food => "Restaurant",
            AmenityCategory::Bank => "Bank",
            AmenityCategory::Fuel => "Fuel Station",
            AmenityCategory::Shopping => "Shopping",
            AmenityCategory::Leisure => "Park",
            AmenityCategory::Transit => "Transit Stop",
        }
    }

    /// Icon identifier consumed by the listing frontend
    pub fn icon(&self) -> &'static str {
        match self {
            AmenityCategory::Hospital => "local_hospital",
            AmenityCategory::Pharmacy => "local_pharmacy",
            AmenityCategory::School => "school",
            AmenityCategory::Food => "restaurant",
            AmenityCategory::Bank => "account_balance",
            AmenityCategory::Fuel => "local_gas_station",
            AmenityCategory::Shopping => "shopping_cart",
            AmenityCategory::Leisure => "park",
            AmenityCategory::Transit => "directions_bus",
        }
    }

    /// Color token consumed by the listing frontend
    pub fn color(&self) -> &'static str {
        match self {
            AmenityCategory::Hospital => "#e53935",
            AmenityCategory::Pharmacy => "#43a047",
            AmenityCategory::School => "#1e88e5",
            AmenityCategory::Food => "#fb8c00",
            AmenityCategory::Bank => "#6d4c41",
            AmenityCategory::Fuel => "#546e7a",
            AmenityCategory::Shopping => "#8e24aa",
            AmenityCategory::Leisure => "#2e7d32",
            AmenityCategory::Transit => "#00897b",
        }
    }
}

/// One ranked nearby amenity as returned to the client
/// DOCUMENTATION: Immutable once created; distance_km is always measured
/// from the anchor coordinate of the request that produced the result set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmenityCandidate {
    pub name: String,
    pub category: AmenityCategory,
    pub distance_km: f64,
    pub formatted_distance: String,
    pub icon: String,
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&AmenityCategory::Fuel).unwrap();
        assert_eq!(json, "\"fuel\"");
    }

    #[test]
    fn test_presentation_metadata_is_total() {
        let all = [
            AmenityCategory::Hospital,
            AmenityCategory::Pharmacy,
            AmenityCategory::School,
            AmenityCategory::Food,
            AmenityCategory::Bank,
            AmenityCategory::Fuel,
            AmenityCategory::Shopping,
            AmenityCategory::Leisure,
            AmenityCategory::Transit,
        ];
        for category in all {
            assert!(!category.label().is_empty());
            assert!(!category.icon().is_empty());
            assert!(category.color().starts_with('#'));
        }
    }
}
