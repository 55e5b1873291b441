// src/services/ranker.rs
// DOCUMENTATION: Amenity classification and distance ranking
// PURPOSE: Reduce a noisy raw point set to a small, stable, user-facing list

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::models::{AmenityCandidate, AmenityCategory, Coordinate};
use crate::services::overpass::OverpassElement;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Best representatives retained per category
const PER_CATEGORY_CAP: usize = 2;

/// Global bound on the final list
const MAX_RESULTS: usize = 10;

const AMENITY_RULES: &[(&str, AmenityCategory)] = &[
    ("hospital", AmenityCategory::Hospital),
    ("clinic", AmenityCategory::Hospital),
    ("doctors", AmenityCategory::Hospital),
    ("pharmacy", AmenityCategory::Pharmacy),
    ("school", AmenityCategory::School),
    ("college", AmenityCategory::School),
    ("university", AmenityCategory::School),
    ("restaurant", AmenityCategory::Food),
    ("cafe", AmenityCategory::Food),
    ("fast_food", AmenityCategory::Food),
    ("bank", AmenityCategory::Bank),
    ("atm", AmenityCategory::Bank),
    ("fuel", AmenityCategory::Fuel),
    ("bus_station", AmenityCategory::Transit),
];

const SHOP_RULES: &[(&str, AmenityCategory)] = &[
    ("supermarket", AmenityCategory::Shopping),
    ("convenience", AmenityCategory::Shopping),
    ("mall", AmenityCategory::Shopping),
    ("department_store", AmenityCategory::Shopping),
    ("bakery", AmenityCategory::Shopping),
    ("greengrocer", AmenityCategory::Shopping),
];

const LEISURE_RULES: &[(&str, AmenityCategory)] = &[
    ("park", AmenityCategory::Leisure),
    ("playground", AmenityCategory::Leisure),
    ("fitness_centre", AmenityCategory::Leisure),
    ("sports_centre", AmenityCategory::Leisure),
];

const RAILWAY_RULES: &[(&str, AmenityCategory)] = &[
    ("station", AmenityCategory::Transit),
    ("halt", AmenityCategory::Transit),
    ("tram_stop", AmenityCategory::Transit),
];

const HIGHWAY_RULES: &[(&str, AmenityCategory)] = &[("bus_stop", AmenityCategory::Transit)];

/// Classify raw element tags into a category
/// DOCUMENTATION: Fixed precedence — an explicit amenity tag beats a shop
/// tag, which beats the specialized leisure/railway/highway tags. Points
/// matching no rule are dropped by the ranker.
pub fn classify(tags: &HashMap<String, String>) -> Option<AmenityCategory> {
    let tables: [(&str, &[(&str, AmenityCategory)]); 5] = [
        ("amenity", AMENITY_RULES),
        ("shop", SHOP_RULES),
        ("leisure", LEISURE_RULES),
        ("railway", RAILWAY_RULES),
        ("highway", HIGHWAY_RULES),
    ];

    for (key, rules) in tables {
        if let Some(value) = tags.get(key) {
            if let Some(category) = rules
                .iter()
                .find(|(tag_value, _)| *tag_value == value.as_str())
                .map(|(_, category)| *category)
            {
                return Some(category);
            }
        }
    }

    None
}

/// Great-circle distance between two points in kilometers
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Human-readable distance: meters below 1 km, otherwise km to one decimal
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1} km", km)
    }
}

/// Distance-based amenity ranking
/// DOCUMENTATION: A pure fold with no shared accumulation state, safe
/// under concurrent invocation
pub struct AmenityRanker;

impl AmenityRanker {
    /// Rank raw elements against an anchor point
    ///
    /// Keeps at most two representatives per category (closest wins a
    /// slot; a newcomer replaces the current runner-up only when strictly
    /// closer), then flattens, sorts ascending by distance, and truncates
    /// to the global bound. Total function: unmapped or position-less
    /// points are silently dropped.
    pub fn rank(anchor: &Coordinate, elements: &[OverpassElement]) -> Vec<AmenityCandidate> {
        let by_category = elements.iter().fold(
            BTreeMap::<AmenityCategory, Vec<AmenityCandidate>>::new(),
            |mut acc, element| {
                let category = match classify(&element.tags) {
                    Some(category) => category,
                    None => return acc,
                };
                let position = match element.coordinate() {
                    Some(position) => position,
                    None => return acc,
                };

                let distance_km = haversine_km(anchor, &position);
                let name = element
                    .tags
                    .get("name")
                    .cloned()
                    .unwrap_or_else(|| category.label().to_string());

                let candidate = AmenityCandidate {
                    name,
                    category,
                    distance_km,
                    formatted_distance: format_distance(distance_km),
                    icon: category.icon().to_string(),
                    color: category.color().to_string(),
                };

                let retained = acc.entry(category).or_default();
                if retained.len() < PER_CATEGORY_CAP {
                    retained.push(candidate);
                    retained.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
                } else if distance_km < retained[PER_CATEGORY_CAP - 1].distance_km {
                    retained[PER_CATEGORY_CAP - 1] = candidate;
                    retained.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
                }

                acc
            },
        );

        let mut combined: Vec<AmenityCandidate> =
            by_category.into_values().flatten().collect();
        combined.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        combined.truncate(MAX_RESULTS);
        combined
    }
}
