//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - resolves the engine configuration
//! - runs the requested pipeline
//! - prints reports/plots and writes optional outputs

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, CompsArgs, EngineArgs, EnginesArgs, PredictArgs, TrainArgs, ValueArgs};
use crate::config::EngineConfig;
use crate::domain::ValuationResponse;
use crate::error::AppError;
use crate::io::{ValuationRecord, write_comps_csv, write_record_json};
use crate::registry::EngineRegistry;

pub mod pipeline;

/// Entry point for the `rev` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing();
    let config = engine_config(&cli.engine, EngineConfig::from_env());

    match cli.command {
        Command::Value(args) => handle_value(args, &config),
        Command::Comps(args) => handle_comps(args, &config),
        Command::Predict(args) => handle_predict(args, &config),
        Command::Train(args) => handle_train(args, &config),
        Command::Engines(args) => handle_engines(args, &config),
    }
}

/// Logs go to stderr so stdout stays machine-readable under `--json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Apply CLI overrides on top of the environment-derived config.
pub fn engine_config(args: &EngineArgs, mut config: EngineConfig) -> EngineConfig {
    if args.no_comps_csv {
        config.comps_csv = None;
    } else if let Some(path) = &args.comps_csv {
        config.comps_csv = Some(path.clone());
    }
    if let Some(path) = &args.model {
        config.model_path = path.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(n) = args.samples {
        config.mc_samples = n;
    }
    config
}

fn handle_value(args: ValueArgs, config: &EngineConfig) -> Result<(), AppError> {
    let run = pipeline::run_value(&args, config)?;

    if args.json {
        println!("{}", to_pretty_json(&run.outcome.response)?);
    }

    let result = match run.outcome.response {
        ValuationResponse::Done(result) => result,
        ValuationResponse::Error { errors } => {
            if !args.json {
                eprint!("{}", crate::report::format_errors(&errors));
            }
            return Err(AppError::new(2, "Valuation request rejected."));
        }
    };

    if !args.json {
        println!("{}", crate::report::format_valuation(&result));
    }
    if args.plot {
        let plot = crate::plot::render_histogram(
            &run.outcome.samples,
            &result.core_valuation,
            args.width,
            args.height,
        );
        // Keep stdout pure JSON when both are requested.
        if args.json {
            eprintln!("{plot}");
        } else {
            println!("{plot}");
        }
    }

    if let (Some(path), Some(project_id)) = (&args.record, &args.project_id) {
        let record = ValuationRecord::new(project_id.clone(), run.request, *result);
        write_record_json(path, &record)?;
    }
    Ok(())
}

fn handle_comps(args: CompsArgs, config: &EngineConfig) -> Result<(), AppError> {
    let response = pipeline::run_comps(&args, config);

    if args.json {
        println!("{}", to_pretty_json(&response)?);
    } else {
        println!("{}", crate::report::format_comps(&response));
    }
    if let Some(path) = &args.export {
        write_comps_csv(path, &response.comps)?;
    }
    Ok(())
}

fn handle_predict(args: PredictArgs, config: &EngineConfig) -> Result<(), AppError> {
    let forecast = pipeline::run_predict(&args, config)?;
    if args.json {
        println!("{}", to_pretty_json(&forecast)?);
    } else {
        print!("{}", crate::report::format_forecast(&forecast));
    }
    Ok(())
}

fn handle_train(args: TrainArgs, config: &EngineConfig) -> Result<(), AppError> {
    let summary = pipeline::run_train(&args, config)?;
    let out = args.out.as_ref().unwrap_or(&config.model_path);
    println!(
        "Trained {} on {} of {} rows -> {}",
        summary.model.version,
        summary.rows_used,
        summary.rows_read,
        out.display()
    );
    println!("Features: {}", summary.model.feats.join(", "));
    Ok(())
}

fn handle_engines(args: EnginesArgs, config: &EngineConfig) -> Result<(), AppError> {
    let engines = EngineRegistry::standard(config).list();
    if args.json {
        println!("{}", to_pretty_json(&engines)?);
    } else {
        print!("{}", crate::report::format_engines(&engines));
    }
    Ok(())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(4, format!("Failed to serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_overrides_environment() {
        let env = EngineConfig {
            seed: Some(1),
            ..EngineConfig::default()
        };
        let args = EngineArgs {
            comps_csv: Some(PathBuf::from("other.csv")),
            no_comps_csv: false,
            model: None,
            seed: Some(7),
            samples: Some(100),
        };
        let cfg = engine_config(&args, env.clone());
        assert_eq!(cfg.comps_csv, Some(PathBuf::from("other.csv")));
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.mc_samples, 100);
        assert_eq!(cfg.model_path, env.model_path);

        let off = EngineArgs {
            no_comps_csv: true,
            ..args
        };
        assert_eq!(engine_config(&off, env).comps_csv, None);
    }

    #[test]
    fn empty_overrides_keep_environment() {
        let env = EngineConfig::default();
        assert_eq!(engine_config(&EngineArgs::default(), env.clone()), env);
    }
}
