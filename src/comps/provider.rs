//! Comparable-sales sources.
//!
//! Providers are tried in order by [`ProviderChain`]. A provider that errors
//! is logged and skipped; the synthetic provider never fails, so the chain
//! always has something to offer.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::{debug, warn};

use crate::comps::geo::{GeoPoint, KM_PER_DEGREE, address_hash, haversine_km, round6};
use crate::domain::ComparableSale;
use crate::error::ProviderError;

pub trait CompsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `limit` candidates within `radius_km` of `origin`, nearest and
    /// freshest first.
    fn fetch(
        &self,
        address: &str,
        origin: GeoPoint,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<ComparableSale>, ProviderError>;
}

fn sort_by_distance_then_recency(origin: GeoPoint, comps: &mut [ComparableSale]) {
    comps.sort_by(|a, b| {
        let da = haversine_km(origin, GeoPoint { lat: a.lat, lon: a.lon });
        let db = haversine_km(origin, GeoPoint { lat: b.lat, lon: b.lon });
        da.partial_cmp(&db)
            .unwrap_or(Ordering::Equal)
            .then(a.months_ago.cmp(&b.months_ago))
    });
}

/// Seed comps from a CSV file with columns
/// `address,lat,lon,price,sqft,beds,baths,months_ago,year_built`.
///
/// A missing file is not an error: the provider simply has nothing.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CompsProvider for CsvProvider {
    fn name(&self) -> &'static str {
        "local_csv"
    }

    fn fetch(
        &self,
        _address: &str,
        origin: GeoPoint,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<ComparableSale>, ProviderError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "comps seed file not present");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(ProviderError::Open {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let headers = reader
            .headers()
            .map_err(|source| ProviderError::Read {
                path: self.path.clone(),
                source,
            })?
            .clone();
        let header_map = build_header_map(&headers);

        let mut out = Vec::new();
        let mut skipped = 0usize;
        for result in reader.records() {
            let Ok(record) = result else {
                skipped += 1;
                continue;
            };
            let Some(sale) = parse_row(&record, &header_map) else {
                skipped += 1;
                continue;
            };
            let d_km = haversine_km(origin, GeoPoint { lat: sale.lat, lon: sale.lon });
            if d_km <= radius_km {
                out.push(sale);
            }
        }
        if skipped > 0 {
            debug!(path = %self.path.display(), skipped, "skipped malformed comps rows");
        }

        sort_by_distance_then_recency(origin, &mut out);
        out.truncate(limit.max(1));
        Ok(out)
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase(), idx))
        .collect()
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Option<ComparableSale> {
    let field = |name: &str| parse_opt_f64(get_optional(record, header_map, name));

    let lat = field("lat")?;
    let lon = field("lon")?;
    let price = field("price")?;
    let sqft = field("sqft")?.trunc();
    let months_ago = field("months_ago").unwrap_or(0.0).max(0.0) as u32;
    let year_built = field("year_built")
        .map(|y| y as i32)
        .filter(|y| *y > 0);

    Some(ComparableSale {
        address: get_optional(record, header_map, "address")
            .unwrap_or("Unknown")
            .to_string(),
        price,
        sqft,
        lat,
        lon,
        beds: field("beds").map(f64::trunc),
        baths: field("baths"),
        months_ago,
        year_built,
        source: "local_csv".to_string(),
    })
}

/// City-aware deterministic generator so the engine works offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

/// Keeps jittered points strictly inside the search circle after the
/// equirectangular offset and 6-decimal rounding.
const JITTER_MARGIN: f64 = 0.98;

const BEDS: [f64; 4] = [2.0, 3.0, 3.0, 4.0];
const BATHS: [f64; 4] = [1.5, 2.0, 2.0, 2.5];
const YEARS: [i32; 5] = [1990, 2005, 2012, 2018, 2021];

fn city_psf(address: &str) -> (f64, f64) {
    let al = address.to_lowercase();
    if al.contains("sydney") {
        (11_000.0, 900.0)
    } else if al.contains("melbourne") {
        (9_000.0, 800.0)
    } else if al.contains("brisbane") {
        (7_500.0, 700.0)
    } else {
        (6_500.0, 700.0)
    }
}

pub fn synthetic_seed(address: &str, radius_km: f64) -> u64 {
    address_hash(address).wrapping_add((radius_km * 100.0) as u64)
}

impl CompsProvider for SyntheticProvider {
    fn name(&self) -> &'static str {
        "synthetic_stub"
    }

    fn fetch(
        &self,
        address: &str,
        origin: GeoPoint,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<ComparableSale>, ProviderError> {
        let mut rng = StdRng::seed_from_u64(synthetic_seed(address, radius_km));
        let n = limit.clamp(1, 25).max(6);
        let (psf_mean, psf_sd) = city_psf(address);
        let psf_dist = Normal::new(psf_mean, psf_sd)
            .map_err(|e| ProviderError::Unavailable(format!("psf distribution: {e}")))?;
        let cos_lat = origin.lat.abs().to_radians().cos().max(1e-6);

        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let sqft = rng.gen_range(900.0..2300.0_f64).trunc();
            let psf = psf_dist.sample(&mut rng).max(1000.0);
            let price = (psf * sqft).trunc();

            let d_km = rng.gen_range(0.0..=radius_km * JITTER_MARGIN);
            let bearing = rng.gen_range(0.0..std::f64::consts::TAU);
            let dlat = d_km / KM_PER_DEGREE * bearing.cos();
            let dlon = d_km / (KM_PER_DEGREE * cos_lat) * bearing.sin();

            out.push(ComparableSale {
                address: format!("Comp {}, near {address}", i + 1),
                price,
                sqft,
                lat: round6(origin.lat + dlat),
                lon: round6(origin.lon + dlon),
                beds: BEDS.choose(&mut rng).copied(),
                baths: BATHS.choose(&mut rng).copied(),
                months_ago: rng.gen_range(0..=9),
                year_built: YEARS.choose(&mut rng).copied(),
                source: "synthetic_stub".to_string(),
            });
        }

        sort_by_distance_then_recency(origin, &mut out);
        out.truncate(limit.max(1));
        Ok(out)
    }
}

/// Ordered list of providers; results are concatenated in chain order.
pub struct ProviderChain {
    providers: Vec<Box<dyn CompsProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn CompsProvider>>) -> Self {
        Self { providers }
    }

    /// CSV seed file (when configured) followed by the synthetic generator.
    pub fn standard(comps_csv: Option<&Path>) -> Self {
        let mut providers: Vec<Box<dyn CompsProvider>> = Vec::new();
        if let Some(path) = comps_csv {
            providers.push(Box::new(CsvProvider::new(path)));
        }
        providers.push(Box::new(SyntheticProvider));
        Self::new(providers)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn fetch_all(
        &self,
        address: &str,
        origin: GeoPoint,
        radius_km: f64,
        limit: usize,
    ) -> Vec<ComparableSale> {
        let mut raw = Vec::new();
        for provider in &self.providers {
            match provider.fetch(address, origin, radius_km, limit) {
                Ok(got) => {
                    debug!(provider = provider.name(), count = got.len(), "comps fetched");
                    raw.extend(got);
                }
                Err(e) => warn!(provider = provider.name(), error = %e, "comps provider failed; skipping"),
            }
        }
        raw
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.names())
            .finish()
    }
}
