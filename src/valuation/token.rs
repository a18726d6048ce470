//! NAV per token and demand-tilted market price.

use crate::domain::{Liquidity, MarketDemand, Nav};

/// Price elasticity to the demand index.
pub const DEMAND_ALPHA: f64 = 0.6;

const DEMAND_MIN: f64 = 0.7;
const DEMAND_MAX: f64 = 1.5;

/// Demand multiplier around 1.0, clamped to `0.7..=1.5`.
///
/// No demand block means a neutral 1.0 regardless of liquidity.
pub fn demand_index(demand: Option<&MarketDemand>, liquidity: Option<&Liquidity>) -> f64 {
    let Some(demand) = demand else {
        return 1.0;
    };
    let liq = liquidity.cloned().unwrap_or_default();

    let wl = (demand.watchlist_count / 500.0).clamp(0.0, 1.0);
    let bids = (demand.bids_24h / 100.0).clamp(0.0, 1.0);
    let users = (demand.active_users_24h / 200.0).clamp(0.0, 1.0);

    let vol_sum = demand.bid_volume + demand.ask_volume;
    let imbalance = if vol_sum > 0.0 {
        (demand.bid_volume - demand.ask_volume) / vol_sum
    } else {
        0.0
    };
    let imbalance = (imbalance + 1.0) / 2.0;

    let mut boost = 1.0;
    if liq.spread_bps < 30.0 {
        boost += 0.05;
    }
    if liq.depth_units > 50_000.0 {
        boost += 0.05;
    }
    if liq.turnover_24h_pct > 3.0 {
        boost += 0.03;
    }

    let raw = 1.0 + 0.35 * wl + 0.30 * bids + 0.20 * users + 0.15 * imbalance;
    let out = raw * boost * demand.external_index;
    if out.is_finite() {
        out.clamp(DEMAND_MIN, DEMAND_MAX)
    } else {
        1.0
    }
}

/// Equity NAV: value net of debt, never negative.
pub fn equity_nav(value: f64, debt: f64, tokens: u64) -> Nav {
    let nav_equity = (value - debt).max(0.0);
    Nav {
        nav_equity,
        nav_per_token: nav_equity / tokens.max(1) as f64,
    }
}

/// Credit NAV: the token is a slice of the loan's price.
pub fn credit_nav(price: f64, tokens: u64) -> Nav {
    Nav {
        nav_equity: price,
        nav_per_token: price / tokens.max(1) as f64,
    }
}

pub fn market_price(nav_per_token: f64, demand_index: f64) -> f64 {
    (nav_per_token * (1.0 + DEMAND_ALPHA * (demand_index - 1.0))).max(0.0)
}
