//! Comparable-sales engine: retrieve, adjust, weight, trim, summarise.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::comps::geo::{GeoPoint, KM_PER_MILE, geocode, haversine_km};
use crate::comps::provider::ProviderChain;
use crate::domain::{
    AdjustedComp, ComparableSale, CompsQuality, CompsQuery, CompsResponse, CompsSummary,
    ValidationIssue,
};
use crate::math::stats::{iqr_bounds, median, weighted_median};
use crate::registry::{Engine, EngineRegistry, without_nulls};

/// Appreciation per month used to bring old sales forward.
const MONTHLY_DRIFT: f64 = 0.002;

/// Most comps a single search returns.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug)]
pub struct CompsEngine {
    chain: ProviderChain,
}

impl CompsEngine {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain }
    }

    pub fn search(&self, query: &CompsQuery) -> CompsResponse {
        let query = normalize_query(query);
        let origin = geocode(&query.address);
        let radius_km = (query.radius_miles * KM_PER_MILE).max(0.05);

        let raw = self
            .chain
            .fetch_all(&query.address, origin, radius_km, query.limit.saturating_mul(2));
        let candidates = select_candidates(raw, origin, radius_km, query.limit);

        let enriched: Vec<AdjustedComp> = candidates
            .into_iter()
            .filter_map(|sale| enrich(sale, origin, &query))
            .collect();
        let count_in_radius = enriched.len();
        let trimmed = trim_outliers(enriched);

        let psfs: Vec<f64> = trimmed.iter().map(|c| c.psf_adj).collect();
        let weights: Vec<f64> = trimmed.iter().map(|c| c.weight).collect();
        let median_psf = median(&psfs);
        let weighted_psf = weighted_median(&psfs, &weights);

        let psf_spread_pct = match (psfs.len() >= 2, median_psf) {
            (true, Some(mid)) => {
                let hi = psfs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let lo = psfs.iter().copied().fold(f64::INFINITY, f64::min);
                Some((hi - lo) / mid.max(1.0))
            }
            _ => None,
        };

        debug!(
            address = %query.address,
            in_radius = count_in_radius,
            after_trim = trimmed.len(),
            "comps search complete"
        );

        let summary = CompsSummary {
            address: query.address.clone(),
            radius_miles: query.radius_miles,
            count: trimmed.len(),
            median_psf,
            weighted_psf,
            estimate_simple: median_psf.unwrap_or(0.0) * query.subject_sqft,
            estimate_weighted: weighted_psf.unwrap_or(0.0) * query.subject_sqft,
            subject_sqft: query.subject_sqft,
            subject_beds: query.subject_beds,
            subject_baths: query.subject_baths,
            quality: CompsQuality {
                count_in_radius,
                count_after_trim: trimmed.len(),
                radius_km,
                used_weighted: weighted_psf.is_some(),
                psf_spread_pct,
            },
        };

        CompsResponse {
            status: "ok".to_string(),
            comps: trimmed,
            summary: vec![summary],
        }
    }
}

impl Engine for CompsEngine {
    fn run(&self, params: &Value, _registry: &EngineRegistry) -> Value {
        let query: CompsQuery = match serde_json::from_value(without_nulls(params)) {
            Ok(q) => q,
            Err(e) => {
                return serde_json::json!({
                    "status": "error",
                    "errors": [ValidationIssue::parse("body", e.to_string())],
                });
            }
        };
        serde_json::to_value(self.search(&query)).unwrap_or(Value::Null)
    }
}

fn normalize_query(query: &CompsQuery) -> CompsQuery {
    let defaults = CompsQuery::default();
    let positive_or = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
    let non_negative_or = |v: f64, d: f64| if v.is_finite() && v >= 0.0 { v } else { d };
    CompsQuery {
        address: if query.address.trim().is_empty() {
            defaults.address
        } else {
            query.address.clone()
        },
        radius_miles: positive_or(query.radius_miles, defaults.radius_miles),
        limit: match query.limit {
            0 => defaults.limit,
            n => n.min(MAX_LIMIT),
        },
        subject_sqft: positive_or(query.subject_sqft, defaults.subject_sqft),
        subject_beds: non_negative_or(query.subject_beds, defaults.subject_beds),
        subject_baths: non_negative_or(query.subject_baths, defaults.subject_baths),
    }
}

/// Dedupe by address (first wins), keep only sales inside the circle, cap at
/// `limit`.
fn select_candidates(
    raw: Vec<ComparableSale>,
    origin: GeoPoint,
    radius_km: f64,
    limit: usize,
) -> Vec<ComparableSale> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|c| seen.insert(c.address.clone()))
        .filter(|c| haversine_km(origin, GeoPoint { lat: c.lat, lon: c.lon }) <= radius_km)
        .take(limit)
        .collect()
}

fn enrich(sale: ComparableSale, origin: GeoPoint, query: &CompsQuery) -> Option<AdjustedComp> {
    let psf_raw = sale.psf()?;
    let distance_km = haversine_km(origin, GeoPoint { lat: sale.lat, lon: sale.lon });
    let sim = similarity(query, &sale);
    let psf_adj = adjust_psf(psf_raw, query, &sale);
    let weight = comp_weight(distance_km, sale.months_ago, sim);
    Some(AdjustedComp {
        sale,
        psf_raw,
        psf_adj,
        distance_km,
        similarity: sim,
        weight,
    })
}

/// Bring a comp's $/sqft to the subject: time drift, size curvature and
/// bed/bath nudges. A comp with unknown beds or baths is not nudged.
pub fn adjust_psf(psf_raw: f64, subject: &CompsQuery, comp: &ComparableSale) -> f64 {
    let s_sqft = subject.subject_sqft.max(1.0);
    let time_mult = (1.0 + MONTHLY_DRIFT).powi(-(comp.months_ago as i32));
    let size_mult = 1.0 + 0.04 * (s_sqft - comp.sqft) / s_sqft;
    let bed_mult = 1.0 + 0.02 * (comp.beds.unwrap_or(subject.subject_beds) - subject.subject_beds);
    let bath_mult =
        1.0 + 0.015 * (comp.baths.unwrap_or(subject.subject_baths) - subject.subject_baths);
    (psf_raw * time_mult * size_mult * bed_mult * bath_mult).max(0.0)
}

/// Bounded 0..1 similarity on size, beds and baths.
pub fn similarity(subject: &CompsQuery, comp: &ComparableSale) -> f64 {
    let s_sqft = subject.subject_sqft;
    let ds = (comp.sqft - s_sqft).abs() / s_sqft.max(1.0);
    let dbed = (comp.beds.unwrap_or(subject.subject_beds) - subject.subject_beds).abs();
    let dbath = (comp.baths.unwrap_or(subject.subject_baths) - subject.subject_baths).abs();
    (1.0 - (0.5 * ds + 0.25 * dbed + 0.25 * dbath)).clamp(0.0, 1.0)
}

/// Distance decay times recency penalty times a similarity factor in 0.5..1.
pub fn comp_weight(distance_km: f64, months_ago: u32, similarity: f64) -> f64 {
    let w_dist = 1.0 / (1.0 + distance_km.max(0.0));
    let w_time = 1.0 / (1.0 + 0.15 * months_ago as f64);
    let w_sim = 0.5 + 0.5 * similarity.clamp(0.0, 1.0);
    w_dist * w_time * w_sim
}

/// Tukey fences on adjusted $/sqft. Never returns an empty set when given a
/// non-empty one.
pub fn trim_outliers(comps: Vec<AdjustedComp>) -> Vec<AdjustedComp> {
    let psfs: Vec<f64> = comps.iter().map(|c| c.psf_adj).collect();
    let (lo, hi) = iqr_bounds(&psfs);
    let kept: Vec<AdjustedComp> = comps
        .iter()
        .filter(|c| lo <= c.psf_adj && c.psf_adj <= hi)
        .cloned()
        .collect();
    if kept.is_empty() { comps } else { kept }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comps::provider::{CompsProvider, SyntheticProvider};
    use crate::error::ProviderError;

    fn sale(address: &str, price: f64, sqft: f64, months_ago: u32) -> ComparableSale {
        ComparableSale {
            address: address.to_string(),
            price,
            sqft,
            lat: -33.0,
            lon: 151.0,
            beds: Some(3.0),
            baths: Some(2.0),
            months_ago,
            year_built: None,
            source: "test".to_string(),
        }
    }

    fn adjusted(psf: f64) -> AdjustedComp {
        AdjustedComp {
            sale: sale("a", psf * 1000.0, 1000.0, 0),
            psf_raw: psf,
            psf_adj: psf,
            distance_km: 0.1,
            similarity: 1.0,
            weight: 1.0,
        }
    }

    struct Fixed(Vec<ComparableSale>);

    impl CompsProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn fetch(&self, _: &str, _: GeoPoint, _: f64, _: usize) -> Result<Vec<ComparableSale>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn identical_comp_is_only_time_adjusted() {
        let q = CompsQuery::default();
        let mut c = sale("x", 1_500_000.0, 1500.0, 10);
        c.beds = Some(3.0);
        c.baths = Some(2.0);
        let adj = adjust_psf(1000.0, &q, &c);
        assert!((adj - 1000.0 * 1.002_f64.powi(-10)).abs() < 1e-9);
        assert_eq!(similarity(&q, &c), 1.0);
    }

    #[test]
    fn weight_decays_with_distance_and_age() {
        let near_new = comp_weight(0.0, 0, 1.0);
        assert!((near_new - 1.0).abs() < 1e-12);
        assert!(comp_weight(1.0, 0, 1.0) < near_new);
        assert!(comp_weight(0.0, 6, 1.0) < near_new);
        assert!((comp_weight(0.0, 0, 0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn trimming_drops_outlier_but_never_empties() {
        let comps: Vec<AdjustedComp> = [10.0, 11.0, 10.5, 9.8, 10.2, 50.0]
            .into_iter()
            .map(adjusted)
            .collect();
        let kept = trim_outliers(comps);
        assert_eq!(kept.len(), 5);
        assert!(kept.iter().all(|c| c.psf_adj < 50.0));

        let single = trim_outliers(vec![adjusted(7.0)]);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn dedupes_by_address_and_respects_limit() {
        let origin = geocode("Subject, Sydney");
        let mut a = sale("Dup", 1_000_000.0, 1000.0, 1);
        a.lat = origin.lat;
        a.lon = origin.lon;
        let chain = ProviderChain::new(vec![
            Box::new(Fixed(vec![a.clone(), a.clone()])),
            Box::new(SyntheticProvider),
        ]);
        let engine = CompsEngine::new(chain);
        let query = CompsQuery {
            address: "Subject, Sydney".to_string(),
            limit: 4,
            ..CompsQuery::default()
        };
        let resp = engine.search(&query);
        assert_eq!(resp.status, "ok");
        assert!(resp.comps.len() <= 4);
        let dups = resp.comps.iter().filter(|c| c.sale.address == "Dup").count();
        assert!(dups <= 1);
    }

    #[test]
    fn huge_limit_is_capped() {
        let engine = CompsEngine::new(ProviderChain::standard(None));
        let resp = engine.search(&CompsQuery {
            address: "2 George St, Sydney NSW".to_string(),
            limit: usize::MAX,
            ..CompsQuery::default()
        });
        assert_eq!(resp.status, "ok");
        assert!(resp.comps.len() <= MAX_LIMIT);
        let capped = normalize_query(&CompsQuery {
            limit: usize::MAX,
            ..CompsQuery::default()
        });
        assert_eq!(capped.limit, MAX_LIMIT);
    }

    #[test]
    fn run_reads_aliases_and_returns_summary() {
        let engine = CompsEngine::new(ProviderChain::standard(None));
        let registry = EngineRegistry::new();
        let out = engine.run(
            &serde_json::json!({
                "address": "5 Queen St, Brisbane QLD",
                "radius_miles": 1.0,
                "limit": 6,
                "living_area_sqft": 1200,
                "bedrooms": null,
            }),
            &registry,
        );
        assert_eq!(out["status"], "ok");
        let summary = &out["summary"][0];
        assert_eq!(summary["subject_sqft"], 1200.0);
        assert_eq!(summary["subject_beds"], 3.0);
        assert!(summary["estimate_weighted"].as_f64().unwrap() > 0.0);
    }
}
