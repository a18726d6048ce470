//! Engine configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file) and can be overridden by CLI flags:
//!
//! | variable          | default                      |
//! | ----------------- | ---------------------------- |
//! | `REV_COMPS_CSV`   | `data/comps_seed.csv`        |
//! | `REV_MODEL_PATH`  | `artifacts/market_lin.json`  |
//! | `REV_SEED`        | unset (fresh entropy)        |
//! | `REV_MC_SAMPLES`  | `3000`                       |

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::warn;

pub const DEFAULT_COMPS_CSV: &str = "data/comps_seed.csv";
pub const DEFAULT_MODEL_PATH: &str = "artifacts/market_lin.json";
pub const DEFAULT_MC_SAMPLES: usize = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Seed file for the CSV comps provider. `None` disables the provider.
    pub comps_csv: Option<PathBuf>,
    /// Linear market model artifact.
    pub model_path: PathBuf,
    /// Fixed seed for every random draw; `None` draws fresh entropy per call.
    pub seed: Option<u64>,
    /// Draws per Monte Carlo run.
    pub mc_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            comps_csv: Some(PathBuf::from(DEFAULT_COMPS_CSV)),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            seed: None,
            mc_samples: DEFAULT_MC_SAMPLES,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in
    /// production, a map in tests). Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("REV_COMPS_CSV") {
            let trimmed = raw.trim();
            config.comps_csv = if trimmed.is_empty() {
                None
            } else {
                Some(PathBuf::from(trimmed))
            };
        }
        if let Some(raw) = lookup("REV_MODEL_PATH") {
            if !raw.trim().is_empty() {
                config.model_path = PathBuf::from(raw.trim());
            }
        }
        if let Some(raw) = lookup("REV_SEED") {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.seed = Some(seed),
                Err(_) => warn!(value = %raw, "ignoring non-numeric REV_SEED"),
            }
        }
        if let Some(raw) = lookup("REV_MC_SAMPLES") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.mc_samples = n,
                _ => warn!(value = %raw, "ignoring invalid REV_MC_SAMPLES"),
            }
        }

        config
    }

    /// Generator for one call: the request seed wins, then the configured
    /// seed, then fresh entropy.
    pub fn rng_for(&self, request_seed: Option<u64>) -> StdRng {
        match request_seed.or(self.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_nothing_set() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.mc_samples, 3000);
    }

    #[test]
    fn lookup_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("REV_COMPS_CSV", ""),
            ("REV_MODEL_PATH", "/tmp/model.json"),
            ("REV_SEED", "42"),
            ("REV_MC_SAMPLES", "zero"),
        ]
        .into_iter()
        .collect();
        let config = EngineConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.comps_csv, None);
        assert_eq!(config.model_path, PathBuf::from("/tmp/model.json"));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.mc_samples, DEFAULT_MC_SAMPLES);
    }

    #[test]
    fn request_seed_takes_precedence() {
        use rand::Rng;
        let config = EngineConfig {
            seed: Some(1),
            ..EngineConfig::default()
        };
        let a: u64 = config.rng_for(Some(7)).r#gen();
        let b: u64 = StdRng::seed_from_u64(7).r#gen();
        assert_eq!(a, b);
    }
}
