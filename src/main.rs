use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use lunarium::config::{
    load_settings, load_settings_strict, project_paths, write_default_settings, Overrides, Settings,
    ViewKind,
};
use lunarium::model::phase_info;
use lunarium::moon::{real_world_cycle_day, real_world_phase_index, SYNODIC_MONTH_DAYS};
use lunarium::orbit::OrbitKind;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(name = "lunarium")]
#[command(about = "Planetary orbits and moon phases in the terminal")]
struct Cli {
    /// View to open first
    #[arg(long, value_enum)]
    view: Option<ViewKind>,

    /// Orbit motion model
    #[arg(long, value_enum)]
    model: Option<OrbitKind>,

    /// Starting speed multiplier (clamped per view)
    #[arg(long)]
    speed: Option<f64>,

    /// Orbit display scale in percent, 50-150
    #[arg(long)]
    scale: Option<f64>,

    /// Simulated days per lunar cycle
    #[arg(long)]
    cycle_length: Option<f64>,

    /// Cycle day the moon view opens on
    #[arg(long)]
    initial_phase: Option<f64>,

    /// Frame rate cap
    #[arg(long)]
    fps: Option<u32>,

    /// Start with animation paused
    #[arg(long)]
    paused: bool,

    /// Disable colour
    #[arg(long)]
    mono: bool,

    /// Settings file to use instead of the per-user one; must exist
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the default settings file (if none exists) and exit; honours --config
    #[arg(long)]
    init_config: bool,

    /// Append logs to this file; the terminal itself is never logged to
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print today's moon phase and exit
    #[arg(long)]
    print_today: bool,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// `--config` if given, else the per-user settings file.
fn settings_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(project_paths()?.settings_path),
    }
}

fn print_today() {
    let now = Utc::now();
    let index = real_world_phase_index(now);
    let info = phase_info(index);
    println!("{} ({})", info.name, now.format("%Y-%m-%d"));
    println!(
        "Day {:.1} of {:.2}",
        real_world_cycle_day(now),
        SYNODIC_MONTH_DAYS
    );
    println!("{}", info.description);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    if cli.print_today {
        print_today();
        return Ok(());
    }

    if cli.init_config {
        let path = settings_path(&cli)?;
        if write_default_settings(&path)? {
            println!("wrote {}", path.display());
        } else {
            println!("{} already exists", path.display());
        }
        return Ok(());
    }

    let mut settings: Settings = match &cli.config {
        Some(path) => load_settings_strict(path)?,
        None => load_settings(&settings_path(&cli)?),
    };

    settings.apply(&Overrides {
        view: cli.view,
        model: cli.model,
        speed: cli.speed,
        scale: cli.scale,
        cycle_length: cli.cycle_length,
        initial_phase: cli.initial_phase,
        fps: cli.fps,
        paused: cli.paused,
        mono: cli.mono,
    });
    settings.validate().context("invalid settings")?;
    info!(view = ?settings.start_view, model = settings.orbit.model.label(), "starting");

    lunarium::app::run(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_config_targets_explicit_path() {
        let cli = Cli::try_parse_from(["lunarium", "--init-config", "--config", "here.json"]).unwrap();
        assert!(cli.init_config);
        assert_eq!(settings_path(&cli).unwrap(), PathBuf::from("here.json"));
    }

    #[test]
    fn flags_map_onto_overrides() {
        let cli = Cli::try_parse_from([
            "lunarium", "--view", "moon", "--model", "elliptical", "--initial-phase", "14.75",
        ])
        .unwrap();
        assert_eq!(cli.view, Some(ViewKind::Moon));
        assert_eq!(cli.model, Some(OrbitKind::Elliptical));
        assert_eq!(cli.initial_phase, Some(14.75));
    }
}
