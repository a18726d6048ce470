//! Command-line parsing for the valuation engine.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the valuation math.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rev", version, about = "Tokenized real-estate valuation engine")]
pub struct Cli {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the environment-derived engine configuration.
#[derive(Debug, Args, Clone, Default)]
pub struct EngineArgs {
    /// Comps seed CSV (overrides REV_COMPS_CSV).
    #[arg(long, global = true, value_name = "CSV")]
    pub comps_csv: Option<PathBuf>,

    /// Skip the CSV comps provider and use synthetic comps only.
    #[arg(long, global = true)]
    pub no_comps_csv: bool,

    /// Market model artifact (overrides REV_MODEL_PATH).
    #[arg(long, global = true, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// Seed for every random draw (overrides REV_SEED).
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Monte Carlo draws per valuation (overrides REV_MC_SAMPLES).
    #[arg(long, global = true)]
    pub samples: Option<usize>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Value a project or loan from a JSON request.
    Value(ValueArgs),
    /// Search comparable sales around an address.
    Comps(CompsArgs),
    /// Forecast short-horizon token price drift from a JSON request.
    Predict(PredictArgs),
    /// Fit the linear market model from a CSV history.
    Train(TrainArgs),
    /// List the registered engines.
    Engines(EnginesArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ValueArgs {
    /// Request JSON (an object with `mode` and the valuation inputs).
    #[arg(long, short = 'i', value_name = "JSON")]
    pub input: PathBuf,

    /// Print the raw JSON response instead of the text summary.
    #[arg(long)]
    pub json: bool,

    /// Render an ASCII histogram of the Monte Carlo draws.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,

    /// Write a valuation record (request + result) to this JSON file.
    #[arg(long, value_name = "JSON", requires = "project_id")]
    pub record: Option<PathBuf>,

    /// Project identifier stored in the record.
    #[arg(long)]
    pub project_id: Option<String>,

    /// Fill `macro.rate_10y_bp` from the latest FRED DGS10 print when absent.
    #[arg(long)]
    pub live_rates: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct CompsArgs {
    /// Subject address.
    #[arg(long)]
    pub address: String,

    /// Search radius in miles.
    #[arg(long, default_value_t = 1.0)]
    pub radius_miles: f64,

    /// Maximum comps returned.
    #[arg(long, default_value_t = 8)]
    pub limit: usize,

    /// Subject living area (sqft).
    #[arg(long, default_value_t = 1500.0)]
    pub sqft: f64,

    /// Subject bedrooms.
    #[arg(long, default_value_t = 3.0)]
    pub beds: f64,

    /// Subject bathrooms.
    #[arg(long, default_value_t = 2.0)]
    pub baths: f64,

    /// Print the raw JSON response instead of the table.
    #[arg(long)]
    pub json: bool,

    /// Export the adjusted comps to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Request JSON carrying `demand`, `liquidity`, `climate_signals` and `macro` blocks.
    #[arg(long, short = 'i', value_name = "JSON")]
    pub input: PathBuf,

    /// Print the raw JSON response.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct TrainArgs {
    /// Training history with feature columns plus `fwd_1w` and `fwd_1m`.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    /// Where to write the model artifact (defaults to the configured model path).
    #[arg(long, value_name = "JSON")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct EnginesArgs {
    /// Print the catalogue as JSON.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_with_globals() {
        let cli = Cli::parse_from([
            "rev", "value", "--input", "req.json", "--plot", "--seed", "9", "--samples", "500",
        ]);
        assert_eq!(cli.engine.seed, Some(9));
        assert_eq!(cli.engine.samples, Some(500));
        let Command::Value(args) = cli.command else {
            panic!("expected value");
        };
        assert!(args.plot);
        assert!(!args.json);
        assert_eq!(args.width, 72);
    }

    #[test]
    fn record_requires_project_id() {
        let res = Cli::try_parse_from(["rev", "value", "-i", "req.json", "--record", "out.json"]);
        assert!(res.is_err());
        let ok = Cli::try_parse_from([
            "rev", "value", "-i", "req.json", "--record", "out.json", "--project-id", "p1",
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn comps_defaults() {
        let cli = Cli::parse_from(["rev", "comps", "--address", "1 Main St"]);
        let Command::Comps(args) = cli.command else {
            panic!("expected comps");
        };
        assert_eq!(args.limit, 8);
        assert_eq!(args.radius_miles, 1.0);
    }
}
