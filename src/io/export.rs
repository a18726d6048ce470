//! Export adjusted comparable sales to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::domain::AdjustedComp;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct CompRow<'a> {
    address: &'a str,
    price: f64,
    sqft: f64,
    beds: Option<f64>,
    baths: Option<f64>,
    year_built: Option<i32>,
    months_ago: u32,
    lat: f64,
    lon: f64,
    distance_km: f64,
    psf_raw: f64,
    psf_adj: f64,
    similarity: f64,
    weight: f64,
    source: &'a str,
}

impl<'a> From<&'a AdjustedComp> for CompRow<'a> {
    fn from(c: &'a AdjustedComp) -> Self {
        let s = &c.sale;
        Self {
            address: &s.address,
            price: s.price,
            sqft: s.sqft,
            beds: s.beds,
            baths: s.baths,
            year_built: s.year_built,
            months_ago: s.months_ago,
            lat: s.lat,
            lon: s.lon,
            distance_km: c.distance_km,
            psf_raw: c.psf_raw,
            psf_adj: c.psf_adj,
            similarity: c.similarity,
            weight: c.weight,
            source: &s.source,
        }
    }
}

/// Write one row per comp, in the order given.
pub fn write_comps_csv(path: &Path, comps: &[AdjustedComp]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    if comps.is_empty() {
        writer
            .write_record([
                "address", "price", "sqft", "beds", "baths", "year_built", "months_ago", "lat",
                "lon", "distance_km", "psf_raw", "psf_adj", "similarity", "weight", "source",
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;
    }
    for comp in comps {
        writer
            .serialize(CompRow::from(comp))
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComparableSale;

    fn comp(address: &str, beds: Option<f64>) -> AdjustedComp {
        AdjustedComp {
            sale: ComparableSale {
                address: address.to_string(),
                price: 900_000.0,
                sqft: 1500.0,
                lat: -33.86,
                lon: 151.2,
                beds,
                baths: Some(2.0),
                months_ago: 3,
                year_built: Some(2005),
                source: "csv_seed".to_string(),
            },
            psf_raw: 600.0,
            psf_adj: 606.0,
            distance_km: 0.4,
            similarity: 0.9,
            weight: 0.7,
        }
    }

    #[test]
    fn header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comps.csv");
        write_comps_csv(&path, &[comp("1 Main St", Some(3.0)), comp("2 High St", None)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("address,price,sqft,beds,baths"));
        assert!(lines[1].starts_with("1 Main St,900000.0,1500.0,3.0,2.0"));
        // Unknown beds stay blank.
        assert!(lines[2].starts_with("2 High St,900000.0,1500.0,,2.0"));
    }

    #[test]
    fn empty_export_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.csv");
        write_comps_csv(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
