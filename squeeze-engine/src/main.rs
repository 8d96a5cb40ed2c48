use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use squeeze_common::config::{expand_path, Config};
use squeeze_common::config_loader::check_modular_files;
use squeeze_common::logging::{generate_run_id, init_from_config};
use squeeze_common::{Error, ResultExt, Validate};
use squeeze_engine::{run_pipeline, EngineConfig, EtfMode, Report, ReportFormat, UniverseLoader, Variant};
use tracing::{info, info_span};

/// Signal screening, constrained long/short portfolios and pair trades.
#[derive(Parser, Debug)]
#[command(name = "squeeze-engine")]
#[command(version)]
#[command(about = "Build a capped long/short portfolio and pair trades from a scored universe.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline over a universe file and print or save the report
    Run {
        /// Universe JSON file (defaults to data.universe_path in config.json)
        #[arg(short, long)]
        universe: Option<String>,

        /// Engine settings file (default: ~/.squeeze/engine.json)
        #[arg(short, long)]
        config: Option<String>,

        /// Start from a named preset (final, lightweight) instead of the defaults
        #[arg(long)]
        preset: Option<Variant>,

        /// Report format (markdown, json)
        #[arg(short, long, default_value = "markdown")]
        format: ReportFormat,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Keep only this sector
        #[arg(long)]
        sector: Option<String>,

        /// Keep only this industry
        #[arg(long)]
        industry: Option<String>,

        /// Minimum signal (inclusive)
        #[arg(long, allow_hyphen_values = true)]
        min_signal: Option<f64>,

        /// ETF handling (include, exclude, only)
        #[arg(long)]
        etf: Option<EtfMode>,

        /// Keep only the first N screened records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the effective engine configuration as JSON
    Config {
        /// Engine settings file (default: ~/.squeeze/engine.json)
        #[arg(short, long)]
        config: Option<String>,

        /// Start from a named preset (final, lightweight)
        #[arg(long)]
        preset: Option<Variant>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if err.downcast_ref::<Error>().is_some_and(Error::is_config) {
                eprintln!("Run `squeeze-engine config` to print the effective engine settings.");
            }
            ExitCode::from(failure_code(&err))
        }
    }
}

/// Typed squeeze errors carry their own code; anything else exits with 1.
fn failure_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<Error>()
        .map_or(1, Error::exit_code)
        .try_into()
        .unwrap_or(1)
}

fn execute(cli: Cli) -> Result<()> {
    let common = Config::load_with_env().map_err(|e| Error::Config(format!("{:#}", e)))?;
    common.validate().context("Invalid config.json")?;
    init_from_config(&common.observability);

    match cli.command {
        Commands::Run {
            universe,
            config,
            preset,
            format,
            output,
            sector,
            industry,
            min_signal,
            etf,
            limit,
        } => {
            let mut engine = load_engine_config(config.as_deref(), preset)?;

            let screen = &mut engine.screen;
            screen.sector = sector.or(screen.sector.take());
            screen.industry = industry.or(screen.industry.take());
            screen.min_signal = min_signal.or(screen.min_signal);
            screen.etf_mode = etf.unwrap_or(screen.etf_mode);
            screen.record_limit = limit.or(screen.record_limit);

            let universe_path = match universe {
                Some(raw) => expand_path(&raw),
                None => common.data.resolved_universe_path().ok_or_else(|| {
                    Error::Config("No universe given: pass --universe or set data.universe_path".into())
                })?,
            };

            let run_id = generate_run_id();
            let span = info_span!("pipeline", run_id = %run_id);
            let _guard = span.enter();

            let (securities, load_report) = UniverseLoader::load_file(&universe_path).context("Failed to load universe")?;
            info!(
                path = %universe_path.display(),
                loaded = load_report.loaded,
                dropped = load_report.dropped,
                defaulted_fields = load_report.defaulted_fields,
                "Universe loaded"
            );

            let result = run_pipeline(&securities, &engine).context("Engine settings rejected")?;
            let report = Report::new(result);

            match output {
                Some(raw) => {
                    let path = report.save_to_file(&expand_path(&raw), format)?;
                    info!(path = %path.display(), format = %format, "Report saved");
                }
                None => println!("{}", report.generate(format)),
            }
        }

        Commands::Config { config, preset } => {
            let engine = load_engine_config(config.as_deref(), preset)?;
            if config.is_none() {
                for (file, present) in check_modular_files(None) {
                    eprintln!("{:<12} {}", file, if present { "found" } else { "missing (defaults)" });
                }
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&engine).context("Failed to serialize engine settings")?
            );
        }
    }

    Ok(())
}

fn load_engine_config(raw_path: Option<&str>, preset: Option<Variant>) -> Result<EngineConfig> {
    let path: Option<PathBuf> = raw_path.map(expand_path);
    let engine = EngineConfig::load(path.as_deref(), preset)
        .map_err(|e| Error::Config(format!("{:#}", e)))?;
    engine.validate().context("Invalid engine settings")?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_code_from_typed_errors() {
        let invalid: anyhow::Error = EngineConfig {
            pairs: squeeze_engine::PairConfig {
                top_k: 0,
                ..Default::default()
            },
            ..Default::default()
        }
        .validate()
        .context("Invalid engine settings")
        .unwrap_err()
        .into();
        assert!(invalid.downcast_ref::<Error>().is_some_and(Error::is_config));
        assert_eq!(failure_code(&invalid), 2);

        let shape: anyhow::Error = UniverseLoader::load_str(r#"{"TICKER": "A"}"#)
            .context("Failed to load universe")
            .unwrap_err()
            .into();
        assert!(!shape.downcast_ref::<Error>().is_some_and(Error::is_config));
        assert_eq!(failure_code(&shape), 3);
    }

    #[test]
    fn test_failure_code_untyped_error() {
        assert_eq!(failure_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_cli_parses_preset_and_overrides() {
        let cli = Cli::try_parse_from([
            "squeeze-engine", "run", "--preset", "light", "--min-signal", "-0.05", "--etf", "exclude",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { preset, min_signal, etf, .. } => {
                assert_eq!(preset, Some(Variant::Lightweight));
                assert_eq!(min_signal, Some(-0.05));
                assert_eq!(etf, Some(EtfMode::Exclude));
            }
            Commands::Config { .. } => panic!("expected run"),
        }
    }
}
