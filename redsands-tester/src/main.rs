mod report;
mod scenarios;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use redsands_game::constants::{DEFAULT_MAX_TICKS, REPLAY_FRAME_INTERVAL_MS};
use redsands_game::{
    MapLoader, MissionEngine, MissionSession, ReplayPlayer, ReplayUpdate, WorldMap,
    timeline_from_json,
};

use report::MissionReport;
use scenarios::{get_scenario, list_scenarios};

#[derive(Debug, Parser)]
#[command(name = "redsands-tester", version)]
#[command(about = "Headless QA runner for Redsands rover missions - compile, run, and replay")]
struct Args {
    /// Operator script file to compile and run
    #[arg(long)]
    script: Option<PathBuf>,

    /// Mission map JSON file
    #[arg(long)]
    map: Option<PathBuf>,

    /// Built-in scenario to run instead of script/map files
    #[arg(long)]
    scenario: Option<String>,

    /// List built-in scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Recorded timeline JSON to replay (requires --map)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Tick ceiling for a mission run
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,
}

/// Map loader over plain files; the mission name is the path.
struct FileMapLoader;

#[derive(Debug, thiserror::Error)]
enum MapFileError {
    #[error("reading map file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing map file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MapLoader for FileMapLoader {
    type Error = MapFileError;

    fn load_map(&self, mission: &str) -> Result<WorldMap, MapFileError> {
        let json = fs::read_to_string(mission).map_err(|source| MapFileError::Read {
            path: mission.to_string(),
            source,
        })?;
        WorldMap::from_json(&json).map_err(|source| MapFileError::Parse {
            path: mission.to_string(),
            source,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        print_scenarios();
        return Ok(());
    }

    if let Some(timeline_path) = &args.replay {
        let map_path = args
            .map
            .as_deref()
            .context("--replay needs --map for the originating world")?;
        return run_replay(timeline_path, map_path);
    }

    let (label, mut session) = build_session(&args)?;
    info!("running mission `{label}` (max {} ticks)", args.max_ticks);
    let summary = session.run(args.max_ticks);
    debug!(
        "finished after {} ticks with status {}",
        summary.ticks, summary.final_state.status
    );

    let mission_report = MissionReport::from_summary(&label, &summary);
    if args.report == "json" {
        println!("{}", mission_report.to_json()?);
    } else {
        mission_report.print_console(summary.final_state.status);
    }
    Ok(())
}

fn build_session(args: &Args) -> Result<(String, MissionSession)> {
    if let Some(name) = &args.scenario {
        let scenario =
            get_scenario(name).with_context(|| format!("no built-in scenario named `{name}`"))?;
        let map = WorldMap::from_json(scenario.map_json)
            .with_context(|| format!("scenario `{name}` map"))?;
        let routine = redsands_game::compile(scenario.script)
            .with_context(|| format!("scenario `{name}` script"))?;
        let session = MissionSession::new(routine, map)?;
        return Ok((name.clone(), session));
    }

    let (Some(script_path), Some(map_path)) = (&args.script, &args.map) else {
        bail!("provide --scenario NAME, or both --script and --map");
    };
    let source = fs::read_to_string(script_path)
        .with_context(|| format!("reading script {}", script_path.display()))?;
    let engine = MissionEngine::new(FileMapLoader);
    let session = engine.start_mission(&map_path.display().to_string(), &source)?;
    Ok((script_path.display().to_string(), session))
}

fn run_replay(timeline_path: &Path, map_path: &Path) -> Result<()> {
    let timeline_json = fs::read_to_string(timeline_path)
        .with_context(|| format!("reading timeline {}", timeline_path.display()))?;
    let frames = timeline_from_json(&timeline_json)
        .with_context(|| format!("parsing timeline {}", timeline_path.display()))?;
    let map = FileMapLoader.load_map(&map_path.display().to_string())?;

    info!("replaying {} frames", frames.len());
    let mut player = ReplayPlayer::new(frames, map);
    let mut clock_ms = 0;
    while !player.finished() {
        for update in player.poll(clock_ms) {
            print_update(clock_ms, &update);
        }
        clock_ms += REPLAY_FRAME_INTERVAL_MS / 2;
    }
    println!("{} {} frames", "replayed".bold(), player.frames_played());
    Ok(())
}

fn print_update(clock_ms: u64, update: &ReplayUpdate) {
    match update {
        ReplayUpdate::Snapshot(snapshot) => println!(
            "[{clock_ms:>6}ms] ({}, {}) {} fuel {:.0} health {:.0} score {:.0} {}",
            snapshot.x,
            snapshot.z,
            snapshot.direction,
            snapshot.fuel,
            snapshot.health,
            snapshot.score,
            snapshot.status
        ),
        ReplayUpdate::MineralHidden { x, z } => {
            println!("[{clock_ms:>6}ms] {} at ({x}, {z})", "mineral hidden".cyan());
        }
        ReplayUpdate::DamageFlashStarted => {
            println!("[{clock_ms:>6}ms] {}", "damage flash".red());
        }
        ReplayUpdate::DamageFlashEnded => {
            println!("[{clock_ms:>6}ms] damage flash over");
        }
    }
}

fn print_scenarios() {
    println!("{}", "built-in scenarios".bold());
    for scenario in list_scenarios() {
        println!("  {:<12} {}", scenario.name.green(), scenario.description);
    }
}
