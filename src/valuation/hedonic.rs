//! Closed-form hedonic pricer.

use crate::domain::PropertyFacts;

/// Reference year for building age.
pub const REFERENCE_YEAR: i32 = 2025;

const DEFAULT_SQFT: f64 = 1000.0;
const DEFAULT_YEAR_BUILT: i32 = 2000;

/// Base $/sqft keyed on a city keyword in the address.
pub fn base_psf(address: &str) -> f64 {
    let addr = address.to_lowercase();
    if addr.contains("sydney") {
        9500.0
    } else if addr.contains("melbourne") {
        8000.0
    } else if addr.contains("brisbane") {
        6500.0
    } else {
        6000.0
    }
}

pub fn hedonic_value(facts: &PropertyFacts) -> f64 {
    let sqft = facts.living_area_sqft.unwrap_or(DEFAULT_SQFT);
    let beds = facts.bedrooms.unwrap_or(0.0);
    let baths = facts.bathrooms.unwrap_or(0.0);
    let year = facts.year_built.unwrap_or(DEFAULT_YEAR_BUILT);

    let mut v = base_psf(&facts.address) * sqft;
    v *= 1.0 + 0.05 * beds;
    v *= 1.0 + 0.03 * baths;

    let age = (REFERENCE_YEAR - year).max(0);
    if age > 40 {
        v *= 0.90;
    } else if age > 20 {
        v *= 0.95;
    }
    v
}
