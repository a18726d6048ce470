//! Monte Carlo risk bands.
//!
//! Draws are split into fixed-size chunks that run on the rayon pool. Each
//! chunk owns a `StdRng` seeded from one base seed plus its chunk index, so
//! a given base seed reproduces the same samples on any thread count.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};
use rayon::prelude::*;

use crate::domain::Band;
use crate::math::stats::percentiles;

pub const DEFAULT_SAMPLES: usize = 3000;
const CHUNK: usize = 250;
const BAND_QUANTILES: [f64; 3] = [0.10, 0.50, 0.90];

const SALES_VOL: f64 = 0.08;
const COST_VOL: f64 = 0.06;
const DELAY_SD_MONTHS: f64 = 1.0;

const PD_ANNUAL: f64 = 0.02;
pub const LGD: f64 = 0.35;
const RECOVERY_NOISE_SD: f64 = 0.03;
const SPREAD_VOL_BPS: f64 = 50.0;
const CARRY_SHARE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct SimOutcome {
    pub band: Band,
    pub samples: Vec<f64>,
}

impl SimOutcome {
    fn collapsed(value: f64) -> Self {
        Self {
            band: Band::flat(value),
            samples: Vec::new(),
        }
    }

    fn from_samples(samples: Vec<f64>) -> Self {
        let p = percentiles(&samples, &BAND_QUANTILES);
        Self {
            band: Band {
                low: p[0],
                base: p[1],
                high: p[2],
            },
            samples,
        }
    }
}

fn chunk_seed(base: u64, chunk: usize) -> u64 {
    base ^ (chunk as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Run `draw` `n` times across the rayon pool.
fn sample_parallel<F>(n: usize, base_seed: u64, draw: F) -> Vec<f64>
where
    F: Fn(&mut StdRng) -> f64 + Sync,
{
    let chunks = n.div_ceil(CHUNK);
    (0..chunks)
        .into_par_iter()
        .map(|c| {
            let mut rng = StdRng::seed_from_u64(chunk_seed(base_seed, c));
            let len = CHUNK.min(n - c * CHUNK);
            (0..len).map(|_| draw(&mut rng)).collect::<Vec<f64>>()
        })
        .collect::<Vec<Vec<f64>>>()
        .concat()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquitySimParams {
    pub value: f64,
    pub planned_months: f64,
    pub expected_months: f64,
    pub finance_apr: f64,
    pub liquidity_premium: f64,
    pub samples: usize,
}

impl EquitySimParams {
    pub fn baseline_delay(&self) -> f64 {
        (self.expected_months - self.planned_months).max(0.0)
    }
}

/// Sales and cost shocks, stochastic delay carry, then the liquidity premium.
pub fn simulate_equity<R: Rng + ?Sized>(params: &EquitySimParams, rng: &mut R) -> SimOutcome {
    if !(params.value > 0.0) || params.samples == 0 {
        return SimOutcome::collapsed(params.value);
    }
    let (Ok(sales), Ok(cost), Ok(delay)) = (
        LogNormal::new(0.0, SALES_VOL),
        LogNormal::new(0.0, COST_VOL),
        Normal::new(params.baseline_delay(), DELAY_SD_MONTHS),
    ) else {
        return SimOutcome::collapsed(params.value);
    };
    let monthly_carry = params.finance_apr / 12.0;
    let base_seed: u64 = rng.r#gen();

    let samples = sample_parallel(params.samples, base_seed, |rng| {
        let sales_mult = sales.sample(rng);
        let cost_mult = cost.sample(rng);
        let delay_m = delay.sample(rng).max(0.0);
        let v = params.value * sales_mult / cost_mult;
        let v = v * (1.0 - monthly_carry * delay_m);
        (v * (1.0 + params.liquidity_premium)).max(0.0)
    });
    SimOutcome::from_samples(samples)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditSimParams {
    pub par: f64,
    pub coupon_apr: f64,
    pub tenor_months: u32,
    pub samples: usize,
}

impl CreditSimParams {
    pub fn horizon_years(&self) -> f64 {
        self.tenor_months as f64 / 12.0
    }

    /// Probability of default over the life of the loan.
    pub fn path_pd(&self) -> f64 {
        1.0 - (1.0 - PD_ANNUAL).powf(self.horizon_years())
    }
}

/// Default/recovery and spread-shock price paths for a loan at par.
pub fn simulate_credit<R: Rng + ?Sized>(params: &CreditSimParams, rng: &mut R) -> SimOutcome {
    if !(params.par > 0.0) || params.tenor_months == 0 || params.samples == 0 {
        return SimOutcome::collapsed(params.par);
    }
    let (Ok(spread), Ok(recovery_noise)) = (
        Normal::new(0.0, SPREAD_VOL_BPS),
        Normal::new(0.0, RECOVERY_NOISE_SD),
    ) else {
        return SimOutcome::collapsed(params.par);
    };
    let pd_path = params.path_pd();
    let carry = params.coupon_apr * params.horizon_years() * CARRY_SHARE;
    let base_seed: u64 = rng.r#gen();

    let samples = sample_parallel(params.samples, base_seed, |rng| {
        let spread_shock = spread.sample(rng) / 10_000.0;
        let price = if rng.r#gen::<f64>() < pd_path {
            params.par * (1.0 - LGD + recovery_noise.sample(rng)).max(0.0)
        } else {
            params.par * (1.0 - spread_shock + carry)
        };
        price.max(0.0)
    });
    SimOutcome::from_samples(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equity(value: f64) -> EquitySimParams {
        EquitySimParams {
            value,
            planned_months: 12.0,
            expected_months: 13.0,
            finance_apr: 0.12,
            liquidity_premium: 0.0,
            samples: DEFAULT_SAMPLES,
        }
    }

    #[test]
    fn equity_band_is_ordered_and_reproducible() {
        let a = simulate_equity(&equity(1_000_000.0), &mut StdRng::seed_from_u64(11));
        let b = simulate_equity(&equity(1_000_000.0), &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
        assert_eq!(a.samples.len(), DEFAULT_SAMPLES);
        assert!(a.band.is_ordered());
        assert!(a.band.low > 0.0);
        // One month of expected delay at 1%/month carry pulls the median below par.
        assert!(a.band.base < 1_000_000.0 && a.band.base > 900_000.0);
    }

    #[test]
    fn non_positive_value_collapses() {
        let out = simulate_equity(&equity(0.0), &mut StdRng::seed_from_u64(1));
        assert_eq!(out.band, Band::flat(0.0));
        assert!(out.samples.is_empty());
    }

    #[test]
    fn odd_sample_count_is_honoured() {
        let mut p = equity(500.0);
        p.samples = 777;
        let out = simulate_equity(&p, &mut StdRng::seed_from_u64(2));
        assert_eq!(out.samples.len(), 777);
    }

    #[test]
    fn credit_band_around_par() {
        let params = CreditSimParams {
            par: 800_000.0,
            coupon_apr: 0.10,
            tenor_months: 24,
            samples: DEFAULT_SAMPLES,
        };
        assert!((params.path_pd() - (1.0 - 0.98_f64.powi(2))).abs() < 1e-12);
        let out = simulate_credit(&params, &mut StdRng::seed_from_u64(5));
        assert!(out.band.is_ordered());
        // Non-default paths carry 10% * 2y * 0.2 = +4%.
        assert!(out.band.base > 800_000.0 && out.band.base < 900_000.0);
        assert!(out.samples.iter().all(|s| *s >= 0.0));
    }
}
