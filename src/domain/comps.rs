//! Comparable-sales types shared by the comps engine and the valuation result.

use serde::{Deserialize, Serialize};

/// A comparable sale as returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableSale {
    pub address: String,
    pub price: f64,
    pub sqft: f64,
    pub lat: f64,
    pub lon: f64,
    pub beds: Option<f64>,
    pub baths: Option<f64>,
    pub months_ago: u32,
    pub year_built: Option<i32>,
    pub source: String,
}

impl ComparableSale {
    pub fn psf(&self) -> Option<f64> {
        (self.price > 0.0 && self.sqft > 0.0).then(|| self.price / self.sqft)
    }
}

/// A comparable sale with its per-request adjustments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedComp {
    #[serde(flatten)]
    pub sale: ComparableSale,
    pub psf_raw: f64,
    pub psf_adj: f64,
    pub distance_km: f64,
    pub similarity: f64,
    pub weight: f64,
}

/// Subject of a comps search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompsQuery {
    pub address: String,
    pub radius_miles: f64,
    pub limit: usize,
    #[serde(alias = "living_area_sqft")]
    pub subject_sqft: f64,
    #[serde(alias = "bedrooms")]
    pub subject_beds: f64,
    #[serde(alias = "bathrooms")]
    pub subject_baths: f64,
}

impl Default for CompsQuery {
    fn default() -> Self {
        Self {
            address: "Unknown Address".to_string(),
            radius_miles: 1.0,
            limit: 8,
            subject_sqft: 1500.0,
            subject_beds: 3.0,
            subject_baths: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompsQuality {
    pub count_in_radius: usize,
    pub count_after_trim: usize,
    pub radius_km: f64,
    pub used_weighted: bool,
    pub psf_spread_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompsSummary {
    pub address: String,
    pub radius_miles: f64,
    pub count: usize,
    pub median_psf: Option<f64>,
    pub weighted_psf: Option<f64>,
    pub estimate_simple: f64,
    pub estimate_weighted: f64,
    pub subject_sqft: f64,
    pub subject_beds: f64,
    pub subject_baths: f64,
    pub quality: CompsQuality,
}

/// Wire shape of the comps engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompsResponse {
    pub status: String,
    pub comps: Vec<AdjustedComp>,
    pub summary: Vec<CompsSummary>,
}
