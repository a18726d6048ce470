//! End-to-end valuation scenarios through the public engine registry.

use std::path::PathBuf;

use re_valuation::config::EngineConfig;
use re_valuation::registry::{COMPS, EngineRegistry, MARKET_PREDICTION, VALUATION};
use serde_json::{Value, json};

fn offline_config(seed: u64) -> EngineConfig {
    EngineConfig {
        comps_csv: None,
        model_path: PathBuf::from("/nonexistent/artifacts/market_lin.json"),
        seed: Some(seed),
        mc_samples: 3000,
    }
}

fn value(registry: &EngineRegistry, params: &Value) -> Value {
    registry
        .run(VALUATION, params)
        .expect("valuation engine is registered")
}

fn equity_request() -> Value {
    json!({
        "mode": "equity",
        "address": "18 Harbour View Rd, Sydney NSW",
        "bedrooms": 3,
        "bathrooms": 2,
        "living_area_sqft": 1450,
        "year_built": 2015,
        "land_cost": 2_000_000,
        "build_cost": 3_500_000,
        "soft_costs": 600_000,
        "sales_revenue": 8_500_000,
        "debt_outstanding": 500_000,
        "use_comps": true,
        "comps_radius_km": 2.0,
        "progress": {"stage": "structure", "percent": 0.45, "planned_completion_months": 18},
        "sales": {"presold_pct": 0.35, "avg_price_vs_model": 1.02},
        "costs": {"actual_vs_budget": 1.03},
        "liquidity": {"spread_bps": 45, "depth_units": 60_000, "turnover_24h_pct": 2.5},
        "climate_signals": {"enso_phase": "la_nina", "rain_anom_pct": 12},
        "macro": {"discount_rate_delta_bps": 25},
        "demand": {"watchlist_count": 120, "bids_24h": 15, "bid_volume": 900, "ask_volume": 600},
        "tokens_outstanding": 1_000_000
    })
}

#[test]
fn scenario_a_equity_band_is_positive_and_ordered() {
    let registry = EngineRegistry::standard(&offline_config(42));
    let out = value(&registry, &equity_request());

    assert_eq!(out["status"], "done", "{out}");
    assert_eq!(out["mode"], "equity");
    let band = &out["core_valuation"];
    let (low, base, high) = (
        band["low"].as_f64().unwrap(),
        band["base"].as_f64().unwrap(),
        band["high"].as_f64().unwrap(),
    );
    assert!(low.is_finite() && base.is_finite() && high.is_finite());
    assert!(low > 0.0);
    assert!(low <= base && base <= high);

    assert_eq!(out["components"]["comps_source"]["status"], "used");
    assert!(out["components"]["comps_value"].as_f64().unwrap() > 0.0);
    assert_eq!(out["diagnostics"]["samples"], 3000);
    assert!(out["expected_returns"]["equity_dcf"]["irr_annual"].is_number());
    assert_eq!(out["inputs"]["params"]["address"], "18 Harbour View Rd, Sydney NSW");
    assert_eq!(out["token_pricing"]["prediction_overlay"]["mode"], "heuristic");
}

#[test]
fn scenario_a_is_reproducible_for_a_seed() {
    let a = value(&EngineRegistry::standard(&offline_config(7)), &equity_request());
    let b = value(&EngineRegistry::standard(&offline_config(7)), &equity_request());
    assert_eq!(a, b);
}

#[test]
fn scenario_b_credit_ltv() {
    let registry = EngineRegistry::standard(&offline_config(11));
    let out = value(
        &registry,
        &json!({
            "mode": "credit",
            "loan_amount": 800_000,
            "coupon_apr": 0.10,
            "tenor_months": 24,
            "collateral": {"value_override": 1_500_000, "noi_annual": 120_000},
            "covenants": {"max_ltv": 0.6, "min_dscr": 1.2}
        }),
    );

    assert_eq!(out["status"], "done", "{out}");
    let ltv = out["collateral"]["ltv"].as_f64().unwrap();
    assert!((ltv - 0.5333).abs() < 1e-3);
    assert!((out["collateral"]["dscr"].as_f64().unwrap() - 1.5).abs() < 1e-9);
    assert!(out["collateral"]["covenant_check"]["breaches"].as_array().unwrap().is_empty());
    assert_eq!(out["token_pricing"]["prediction_overlay"]["status"], "none");
    assert!((out["expected_returns"]["irr"].as_f64().unwrap() - 0.10).abs() < 1e-4);

    let band = &out["core_valuation"];
    assert!(band["low"].as_f64().unwrap() <= band["base"].as_f64().unwrap());
    assert!(band["base"].as_f64().unwrap() <= band["high"].as_f64().unwrap());
}

#[test]
fn scenario_c_heuristic_fallback() {
    let registry = EngineRegistry::standard(&offline_config(3));
    let out = registry
        .run(
            MARKET_PREDICTION,
            &json!({
                "demand": {"watchlist_count": 300, "bids_24h": 40, "active_users_24h": 90},
                "liquidity": {"spread_bps": 25, "depth_units": 80_000, "turnover_24h_pct": 4},
                "climate_signals": {"rain_anom_pct": 20},
                "macro": {"rate_10y_bp": 420}
            }),
        )
        .unwrap();

    assert_eq!(out["status"], "ok");
    assert_eq!(out["mode"], "heuristic");
    let w = out["forecast_1w"].as_f64().unwrap();
    let m = out["forecast_1m"].as_f64().unwrap();
    assert!(w.is_finite() && m.is_finite());
    assert!(w.abs() < 0.05);
    assert!(m.abs() < 0.1);
    assert!((m - 1.9 * w).abs() < 1e-12);
}

#[test]
fn scenario_d_comps_limit_and_radius() {
    let registry = EngineRegistry::standard(&offline_config(5));
    let out = registry
        .run(
            COMPS,
            &json!({"address": "7 Queen St, Brisbane QLD", "radius_miles": 1.0, "limit": 6}),
        )
        .unwrap();

    assert_eq!(out["status"], "ok");
    let comps = out["comps"].as_array().unwrap();
    assert!(!comps.is_empty());
    assert!(comps.len() <= 6);
    for c in comps {
        assert!(c["distance_km"].as_f64().unwrap() <= 1.60934 + 1e-9, "{c}");
    }
    assert_eq!(out["summary"][0]["count"].as_u64().unwrap() as usize, comps.len());
}

#[test]
fn invalid_request_reports_all_issues() {
    let registry = EngineRegistry::standard(&offline_config(1));
    let out = value(&registry, &json!({"mode": "credit", "coupon_apr": "ten"}));
    assert_eq!(out["status"], "error");
    let locs: Vec<&str> = out["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["loc"].as_str().unwrap())
        .collect();
    assert!(locs.contains(&"coupon_apr"));
    assert!(locs.contains(&"loan_amount"));
    assert!(locs.contains(&"tenor_months"));
}

#[test]
fn equity_runs_without_optional_engines() {
    let mut registry = EngineRegistry::new();
    registry.register(
        VALUATION,
        "Valuation",
        "valuation only",
        re_valuation::valuation::ValuationEngine::new(offline_config(9)),
    );
    let out = value(&registry, &equity_request());
    assert_eq!(out["status"], "done");
    assert_eq!(out["components"]["comps_source"]["status"], "unavailable");
    assert!(out["components"]["comps_value"].is_null());
    assert_eq!(out["token_pricing"]["prediction_overlay"]["status"], "none");
}

#[test]
fn free_function_matches_registry_shape() {
    let registry = EngineRegistry::standard(&offline_config(2));
    let out = re_valuation::valuation::run(
        &json!({"mode": "equity", "address": "1 Test St", "seed": 4}),
        &registry,
    );
    assert_eq!(out["status"], "done");
    assert!(out["core_valuation"]["base"].as_f64().unwrap() > 0.0);
}

#[test]
fn demo_requests_value_cleanly() {
    let registry = EngineRegistry::standard(&offline_config(8));
    let demos = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos");
    for name in ["equity_request.json", "credit_request.json"] {
        let request = re_valuation::io::read_request_json(&demos.join(name)).unwrap();
        let out = value(&registry, &request);
        assert_eq!(out["status"], "done", "{name}: {out}");
    }
}

#[test]
fn scenario_a_literal_request() {
    let registry = EngineRegistry::standard(&offline_config(42));
    let out = value(
        &registry,
        &json!({
            "mode": "equity",
            "address": "123 Test St, Sydney",
            "bedrooms": 3,
            "bathrooms": 2,
            "living_area_sqft": 1500,
            "land_cost": 50000,
            "build_cost": 700000,
            "soft_costs": 150000,
            "sales_revenue": 1600000,
            "discount_rate_equity": 0.12,
            "use_comps": true,
            "comps_radius_km": 1.6,
            "tokens_outstanding": 1000000
        }),
    );

    assert_eq!(out["status"], "done", "{out}");
    let band = &out["core_valuation"];
    let (low, base, high) = (
        band["low"].as_f64().unwrap(),
        band["base"].as_f64().unwrap(),
        band["high"].as_f64().unwrap(),
    );
    assert!(low.is_finite() && base.is_finite() && high.is_finite());
    assert!(low > 0.0);
    assert!(low <= base && base <= high);
    assert_eq!(out["components"]["comps_source"]["status"], "used");
}

#[test]
fn scenario_b_literal_request() {
    let registry = EngineRegistry::standard(&offline_config(11));
    let out = value(
        &registry,
        &json!({
            "mode": "credit",
            "loan_amount": 800000,
            "coupon_apr": 0.10,
            "tenor_months": 24,
            "schedule": "bullet",
            "collateral": {"value_override": 1500000},
            "tokens_outstanding": 500000
        }),
    );

    assert_eq!(out["status"], "done", "{out}");
    let ltv = out["collateral"]["ltv"].as_f64().unwrap();
    assert!((ltv - 0.5333).abs() < 1e-3);
}

#[test]
fn scenario_c_literal_empty_signals() {
    let registry = EngineRegistry::standard(&offline_config(3));
    let out = registry.run(MARKET_PREDICTION, &json!({})).unwrap();

    assert_eq!(out["mode"], "heuristic");
    let w = out["forecast_1w"].as_f64().unwrap();
    let m = out["forecast_1m"].as_f64().unwrap();
    assert!(w.is_finite() && m.is_finite());
    assert!(w.abs() < 0.05);
    assert!(m.abs() < 0.1);
}

#[test]
fn scenario_d_literal_request() {
    let registry = EngineRegistry::standard(&offline_config(5));
    let out = registry
        .run(
            COMPS,
            &json!({"address": "123 Test St, Sydney NSW", "radius_miles": 1.0, "limit": 6}),
        )
        .unwrap();

    assert_eq!(out["status"], "ok");
    let comps = out["comps"].as_array().unwrap();
    assert!(comps.len() <= 6);
    for c in comps {
        assert!(c["distance_km"].as_f64().unwrap() <= 1.0 * 1.60934 + 1e-9, "{c}");
    }
}

#[test]
fn oversized_horizons_are_rejected_not_run() {
    let registry = EngineRegistry::standard(&offline_config(1));
    let out = value(
        &registry,
        &json!({
            "mode": "equity",
            "address": "1 A St",
            "progress": {"planned_completion_months": 1e15}
        }),
    );
    assert_eq!(out["status"], "error");
    assert_eq!(out["errors"][0]["loc"], "progress.planned_completion_months");
    assert_eq!(out["errors"][0]["type"], "value_error");

    let out = value(
        &registry,
        &json!({
            "mode": "credit",
            "loan_amount": 800000,
            "coupon_apr": 0.10,
            "tenor_months": 4294967295u64
        }),
    );
    assert_eq!(out["status"], "error");
    assert_eq!(out["errors"][0]["loc"], "tenor_months");
}

#[test]
fn comps_limit_is_capped() {
    let registry = EngineRegistry::standard(&offline_config(5));
    let out = registry
        .run(
            COMPS,
            &json!({"address": "123 Test St, Sydney NSW", "limit": u64::MAX}),
        )
        .unwrap();
    assert_eq!(out["status"], "ok");
    assert!(out["comps"].as_array().unwrap().len() <= 100);
}

#[test]
fn credit_runs_with_only_the_valuation_engine() {
    let mut registry = EngineRegistry::new();
    registry.register(
        VALUATION,
        "Valuation",
        "valuation only",
        re_valuation::valuation::ValuationEngine::new(offline_config(9)),
    );
    let out = value(
        &registry,
        &json!({
            "mode": "credit",
            "loan_amount": 800000,
            "coupon_apr": 0.10,
            "tenor_months": 24,
            "collateral": {"value_override": 1500000}
        }),
    );
    assert_eq!(out["status"], "done", "{out}");
    assert_eq!(out["token_pricing"]["prediction_overlay"]["status"], "none");
}
