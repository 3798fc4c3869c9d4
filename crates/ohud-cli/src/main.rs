// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

mod loader;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ohud_core::chain::{ChainState, NodeRef};
use ohud_core::{
    ConfigManager, GeoPoint, HeadingMode, HudConfig, HudError, LogRouteSink, MarkerRole, Session,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Used when no position is given: Tartu town centre.
const DEFAULT_LAT: f64 = 58.377679;
const DEFAULT_LON: f64 = 26.717398;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog JSON file (targets plus optional permissionMessage)
    #[arg(short, long, env = "OHUD_CATALOG")]
    catalog: Option<PathBuf>,

    /// User latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, default_value_t = DEFAULT_LAT)]
    lat: f64,

    /// User longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true, default_value_t = DEFAULT_LON)]
    lon: f64,

    /// Only consider targets with this tag (repeatable; none = all)
    #[arg(short, long = "tag")]
    tags: Vec<String>,

    /// Move the user to a random point within this many meters first
    #[arg(long)]
    random_offset: Option<f64>,

    /// Seed for --random-offset
    #[arg(long)]
    seed: Option<u64>,

    /// Skip records with bad coordinates instead of failing
    #[arg(long)]
    lenient: bool,

    /// Also list catalog targets outside the chain
    #[arg(long)]
    reveal_all: bool,

    #[arg(long)]
    spoke_angle: Option<f64>,

    #[arg(long)]
    spoke_tolerance: Option<f64>,

    #[arg(long)]
    view_tolerance: Option<f64>,

    #[arg(long, value_enum)]
    heading_mode: Option<HeadingModeArg>,

    /// -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tags present in the catalog
    Tags,
    /// Show the chain for the current position and filter
    Chain,
    /// Tap chain nodes in order (TIER.INDEX) and show the result
    Explore {
        #[arg(long = "tap")]
        taps: Vec<NodeRef>,
    },
    /// Feed heading samples ("none" for a missing sample) and follow the focus
    Heading {
        #[arg(long = "tap")]
        taps: Vec<NodeRef>,
        /// Pin the calibration reference instead of using the first sample
        #[arg(long, allow_hyphen_values = true)]
        calibrate: Option<f64>,
        #[arg(long = "sample", allow_hyphen_values = true)]
        samples: Vec<Sample>,
    },
    /// Print the waypoint list that would be sent to the router
    Route {
        #[arg(long = "tap")]
        taps: Vec<NodeRef>,
        /// Emit the route request as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or reset the stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Reset,
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum HeadingModeArg {
    Calibrated,
    Absolute,
}

impl From<HeadingModeArg> for HeadingMode {
    fn from(arg: HeadingModeArg) -> Self {
        match arg {
            HeadingModeArg::Calibrated => HeadingMode::Calibrated,
            HeadingModeArg::Absolute => HeadingMode::Absolute,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Sample(Option<f64>);

impl FromStr for Sample {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("none") {
            return Ok(Sample(None));
        }
        s.parse::<f64>()
            .map(|v| Sample(Some(v)))
            .map_err(|e| format!("bad heading '{}': {}", s, e))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialise logger")?;

    let config_manager = ConfigManager::new();
    if let Commands::Config { action } = &cli.command {
        return run_config(&config_manager, action);
    }

    let config = apply_overrides(config_manager.load()?, &cli);
    let catalog_path = cli
        .catalog
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No catalog given. Use --catalog or OHUD_CATALOG."))?;
    let loaded = loader::load_catalog(&catalog_path, cli.lenient)?;
    if loaded.skipped > 0 {
        println!("Skipped {} malformed record(s)", loaded.skipped);
    }
    if let Some(message) = &loaded.permission_message {
        log::info!("Catalog permission prompt — {}", message);
    }

    if let Commands::Tags = cli.command {
        for tag in loaded.catalog.tags() {
            println!("{}", tag);
        }
        return Ok(());
    }

    let mut session = Session::new(
        Arc::new(loaded.catalog),
        config,
        GeoPoint::new(cli.lat, cli.lon),
    )?;
    session.set_reveal_all(cli.reveal_all);
    allow_empty(session.set_tag_filter(cli.tags.iter().cloned().collect()))?;

    if let Some(max) = cli.random_offset {
        let mut rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let before = session.reference();
        match session.relocate_randomly(max, &mut rng) {
            Ok(moved) => println!("Relocated to {:.6}, {:.6}", moved.lat, moved.lon),
            Err(HudError::EmptyCandidateSet) => {
                let moved = session.reference();
                if moved != before {
                    println!("Relocated to {:.6}, {:.6}", moved.lat, moved.lon);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    match &cli.command {
        Commands::Chain => print_view(&session),
        Commands::Explore { taps } => {
            apply_taps(&mut session, taps)?;
            print_view(&session);
        }
        Commands::Heading {
            taps,
            calibrate,
            samples,
        } => {
            apply_taps(&mut session, taps)?;
            if let Some(reference) = calibrate {
                session.calibrate(*reference);
            }
            for Sample(raw) in samples {
                let label = raw.map_or("none".to_string(), |h| format!("{:.1}", h));
                match session.on_heading_sample(*raw) {
                    Some(node) => println!(
                        "{:>7} -> focus {} ({})",
                        label,
                        node,
                        node_name(&session, node)
                    ),
                    None => println!("{:>7} -> focus unchanged", label),
                }
            }
            print_view(&session);
        }
        Commands::Route { taps, json } => {
            apply_taps(&mut session, taps)?;
            if *json {
                let request = session.route_request();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&request).context("Failed to serialize route")?
                );
            } else {
                for (i, p) in session.waypoints().iter().enumerate() {
                    println!("{:>2}. {:.6}, {:.6}", i, p.lat, p.lon);
                }
            }
            session.emit_route(&LogRouteSink);
        }
        Commands::Tags | Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(manager: &ConfigManager, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = manager.load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            manager.reset()?;
            println!("Configuration reset: {}", manager.path().display());
        }
        ConfigAction::Path => println!("{}", manager.path().display()),
    }
    Ok(())
}

/// An empty candidate set is a normal outcome here; the view reports it.
fn allow_empty(result: std::result::Result<(), HudError>) -> Result<()> {
    match result {
        Ok(()) | Err(HudError::EmptyCandidateSet) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn apply_overrides(mut config: HudConfig, cli: &Cli) -> HudConfig {
    if let Some(v) = cli.spoke_angle {
        config.spoke_angle_deg = v;
    }
    if let Some(v) = cli.spoke_tolerance {
        config.spoke_tolerance_deg = v;
    }
    if let Some(v) = cli.view_tolerance {
        config.view_tolerance_deg = v;
    }
    if let Some(mode) = cli.heading_mode {
        config.heading_mode = mode.into();
    }
    config
}

fn apply_taps(session: &mut Session, taps: &[NodeRef]) -> Result<()> {
    for &tap in taps {
        let added = session
            .select_node(tap)
            .with_context(|| format!("Tap on {} failed", tap))?;
        println!(
            "Tapped {} ({}): {} new node(s)",
            tap,
            node_name(session, tap),
            added
        );
    }
    Ok(())
}

fn node_name(session: &Session, node: NodeRef) -> String {
    session
        .chain()
        .get(node)
        .map(|n| n.target.name.clone())
        .unwrap_or_default()
}

fn print_view(session: &Session) {
    let state = match session.state() {
        ChainState::Empty => "empty".to_string(),
        ChainState::Rooted => "rooted".to_string(),
        ChainState::Spoked => "spoked".to_string(),
        ChainState::Expanded(depth) => format!("expanded, {} tiers", depth),
    };
    println!("Chain ({}):", state);

    for marker in session.markers() {
        let role = match marker.role {
            MarkerRole::Primary => "[P]",
            MarkerRole::Chain => "[C]",
            MarkerRole::DeeperTier => "[D]",
            MarkerRole::AllRevealed => "[ ]",
        };
        let focus = if marker.focused { "*" } else { " " };
        let node = marker
            .node
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let measured = marker
            .node
            .and_then(|n| session.chain().get(n))
            .map(|n| format!("{:>6.0} m {:>5.1}°", n.distance_m, n.bearing_deg))
            .unwrap_or_default();
        println!(
            "{}{} {:<5} {:<32} {:<10} {}",
            focus, role, node, marker.name, marker.tag, measured
        );
    }

    if session.state() == ChainState::Empty {
        println!("Nothing nearby.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_heading_command_parses_missing_samples() {
        let cli = Cli::try_parse_from([
            "ohud", "--catalog", "c.json", "heading", "--tap", "1.0", "--sample", "350",
            "--sample", "none", "--sample", "-10",
        ])
        .unwrap();
        match cli.command {
            Commands::Heading { taps, samples, .. } => {
                assert_eq!(taps, vec![NodeRef::new(1, 0)]);
                let raw: Vec<Option<f64>> = samples.iter().map(|s| s.0).collect();
                assert_eq!(raw, vec![Some(350.0), None, Some(-10.0)]);
            }
            _ => panic!("expected heading command"),
        }
    }

    #[test]
    fn test_overrides_replace_loaded_values() {
        let cli = Cli::try_parse_from([
            "ohud",
            "--spoke-tolerance",
            "5",
            "--heading-mode",
            "absolute",
            "chain",
        ])
        .unwrap();
        let config = apply_overrides(HudConfig::default(), &cli);
        assert_eq!(config.spoke_tolerance_deg, 5.0);
        assert_eq!(config.heading_mode, HeadingMode::Absolute);
        assert_eq!(config.view_tolerance_deg, HudConfig::default().view_tolerance_deg);
    }

    #[test]
    fn test_bad_sample_is_rejected() {
        assert!("north".parse::<Sample>().is_err());
    }
}
