use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nalgebra::Point3;

use scene_anchor::io::{replay, CalibrationConfig};
use scene_anchor::{solve_with, SceneDefinition, SolverParams};

use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "scene-anchor", version, about = "Re-anchor authored scenes onto two observed landmarks")]
struct Cli {
    /// Log level (error, warn, info, debug, trace); falls back to
    /// `SCENE_ANCHOR_LOG`, then `warn`.
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a sample calibration config (sample scene + two captures).
    Sample {
        /// Destination JSON path.
        path: PathBuf,
    },
    /// Replay the captures of a config and write a JSON report.
    Replay {
        /// Calibration config JSON.
        config: PathBuf,
        /// Report path; overrides `output_path` from the config.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Solve a scene for one observed landmark pair and print the result as JSON.
    Solve {
        /// Scene JSON (id, name, landmark1, landmark2, items).
        scene: PathBuf,
        /// Observed landmark 1 as `x,y,z`.
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        l1: Point3<f64>,
        /// Observed landmark 2 as `x,y,z`.
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        l2: Point3<f64>,
        /// Solver settings JSON; defaults apply when omitted.
        #[arg(long)]
        solver: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    if let Err(err) = run(cli.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: Option<LevelFilter>) {
    let level = level
        .or_else(scene_anchor::core::level_from_env)
        .unwrap_or(LevelFilter::Warn);
    if let Err(err) = scene_anchor::core::init_with_level(level) {
        eprintln!("failed to install logger: {err}");
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_level: Option<LevelFilter>) {
    let _ = tracing_log::LogTracer::init();
    scene_anchor::core::init_tracing(false);
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Sample { path } => {
            CalibrationConfig::sample().write_json(&path)?;
            println!("wrote sample config to {}", path.display());
        }
        Command::Replay { config, output } => {
            let cfg = CalibrationConfig::load_json(&config)?;
            let report = replay(&cfg, &config);
            let output_path = output.unwrap_or_else(|| cfg.output_path());
            report.write_json(&output_path)?;
            println!("wrote report JSON to {}", output_path.display());
            if let Some(err) = report.error {
                return Err(err.into());
            }
        }
        Command::Solve {
            scene,
            l1,
            l2,
            solver,
        } => {
            let def = SceneDefinition::from_json_str(&std::fs::read_to_string(&scene)?)?;
            let params = match solver {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
                None => SolverParams::default(),
            };
            let rec = solve_with(&def, l1, l2, &params)?;
            println!("{}", serde_json::to_string_pretty(&rec)?);
        }
    }
    Ok(())
}

fn parse_point(raw: &str) -> Result<Point3<f64>, String> {
    let coords = raw
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in '{raw}': {e}"))?;
    match coords.as_slice() {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got '{raw}'")),
    }
}
