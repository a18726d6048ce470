//! Offline geocoding and great-circle distance.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude on the haversine sphere.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

pub const KM_PER_MILE: f64 = 1.60934;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Hash of the lower-cased address.
///
/// `DefaultHasher::new()` uses fixed keys, so the value is stable across runs
/// and processes built with the same toolchain. The algorithm is unspecified
/// across Rust releases, so geocodes and synthetic comp sets may shift after
/// a compiler upgrade.
pub fn address_hash(address: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    address.to_lowercase().hash(&mut hasher);
    hasher.finish()
}

/// Deterministic pseudo-geocode inside a rough south-east Australia box
/// (lat -37..-27, lon 144..154).
pub fn geocode(address: &str) -> GeoPoint {
    let h = address_hash(address);
    let lat = -37.0 + (h % 1000) as f64 / 1000.0 * 10.0;
    let lon = 144.0 + ((h >> 10) % 1000) as f64 / 1000.0 * 10.0;
    GeoPoint {
        lat: round6(lat),
        lon: round6(lon),
    }
}

pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let p1 = a.lat.to_radians();
    let p2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlmb = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dlmb / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

pub fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}
