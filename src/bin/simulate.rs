//! Headless balance simulator.
//!
//! Drives the engine through the same fixed-step loop a frontend would use
//! and prints a summary of where the run ended up.
//!
//! Usage:
//!   cargo run --bin simulate -- [OPTIONS]
//!
//! Options:
//!   --seconds N        Game seconds to simulate (default: 3600)
//!   --seed N           RNG seed (default: 42)
//!   --cultivate        Channel essence whenever cultivation is unlocked
//!   --config FILE      JSON balance override
//!   --offline-hours H  Apply offline catch-up after the run
//!   --json             Print the summary as JSON

use infinity_warrior::core::config::GameConfig;
use infinity_warrior::core::constants::{MAX_FRAME_MS, MS_PER_HOUR};
use infinity_warrior::core::game_loop::{GameLoop, Simulation};
use infinity_warrior::core::game_state::{ActivityMode, SimulationState, Stat};
use infinity_warrior::core::offline::{apply_offline_progress, OfflineReport};
use infinity_warrior::core::tick::TickEvent;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI Configuration ────────────────────────────────────────────────

struct CliOptions {
    seconds: f64,
    seed: u64,
    cultivate: bool,
    config_path: Option<PathBuf>,
    offline_hours: Option<f64>,
    json: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            seconds: 3600.0,
            seed: 42,
            cultivate: false,
            config_path: None,
            offline_hours: None,
            json: false,
        }
    }
}

fn value_for<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_number<T: std::str::FromStr>(raw: &str, flag: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("{flag} requires a number, got {raw:?}"))
}

fn parse_args(args: &[String]) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seconds" => {
                i += 1;
                options.seconds = parse_number(value_for(args, i, "--seconds")?, "--seconds")?;
            }
            "--seed" => {
                i += 1;
                options.seed = parse_number(value_for(args, i, "--seed")?, "--seed")?;
            }
            "--cultivate" => options.cultivate = true,
            "--config" => {
                i += 1;
                options.config_path = Some(PathBuf::from(value_for(args, i, "--config")?));
            }
            "--offline-hours" => {
                i += 1;
                options.offline_hours = Some(parse_number(
                    value_for(args, i, "--offline-hours")?,
                    "--offline-hours",
                )?);
            }
            "--json" => options.json = true,
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("Unknown argument: {other}")),
        }
        i += 1;
    }
    Ok(Some(options))
}

fn print_usage() {
    eprintln!(
        "Infinity Warrior headless simulator\n\
         \n\
         Usage: simulate [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --seconds N        Game seconds to simulate (default: 3600)\n\
         \x20 --seed N           RNG seed (default: 42)\n\
         \x20 --cultivate        Channel essence whenever cultivation is unlocked\n\
         \x20 --config FILE      JSON balance override\n\
         \x20 --offline-hours H  Apply offline catch-up after the run\n\
         \x20 --json             Print the summary as JSON\n\
         \x20 --help, -h         Show this help"
    );
}

// ── Run Statistics ───────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunTally {
    player_hits: u64,
    enemy_hits: u64,
    spawns: u64,
    chain_misses: u64,
    level_ups: u64,
    prestige_level_ups: u64,
    essence_earned: f64,
}

impl RunTally {
    fn record(&mut self, events: &[TickEvent]) {
        for event in events {
            match event {
                TickEvent::PlayerHit { .. } => self.player_hits += 1,
                TickEvent::EnemyHit { .. } => self.enemy_hits += 1,
                TickEvent::SpawnEnemy { .. } => self.spawns += 1,
                TickEvent::ChainSpawnMiss { .. } => self.chain_misses += 1,
                TickEvent::LevelUp { .. } => self.level_ups += 1,
                TickEvent::PrestigeLevelUp { .. } => self.prestige_level_ups += 1,
                TickEvent::Victory { reward, .. } => self.essence_earned += reward,
                TickEvent::Defeat { .. } | TickEvent::RevealHex { .. } => {}
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LevelSummary {
    stat: Stat,
    level: u32,
    prestige: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    seed: u64,
    simulated_seconds: f64,
    travel_depth: u32,
    best_depth: u32,
    revealed_hexes: u64,
    essence: f64,
    enemies_defeated: u64,
    deaths: u64,
    levels: Vec<LevelSummary>,
    tally: RunTally,
    offline: Option<OfflineReport>,
}

impl Summary {
    fn new(seed: u64, state: &SimulationState, tally: RunTally, offline: Option<OfflineReport>) -> Self {
        let levels = Stat::ALL
            .iter()
            .map(|&stat| {
                let (level, prestige) = match stat {
                    Stat::Strength => (state.run.strength.level, state.persistent.strength_prestige.level),
                    Stat::Endurance => (state.run.endurance.level, state.persistent.endurance_prestige.level),
                    _ => state
                        .run
                        .cultivation(stat)
                        .map(|c| (c.progress.level, c.prestige.level))
                        .unwrap_or_default(),
                };
                LevelSummary { stat, level, prestige }
            })
            .collect();

        Self {
            seed,
            simulated_seconds: state.elapsed_ms / 1000.0,
            travel_depth: state.world.travel_depth,
            best_depth: state.world.best_depth,
            revealed_hexes: state.world.revealed_hexes,
            essence: state.resources.essence,
            enemies_defeated: state.statistics.total_enemies_defeated,
            deaths: state.statistics.total_deaths,
            levels,
            tally,
            offline,
        }
    }

    fn print_text(&self) {
        println!("Seed:             {}", self.seed);
        println!("Simulated:        {:.0}s", self.simulated_seconds);
        println!("Depth:            {} (best {})", self.travel_depth, self.best_depth);
        println!("Hexes revealed:   {}", self.revealed_hexes);
        println!("Essence:          {:.1}", self.essence);
        println!("Enemies defeated: {}", self.enemies_defeated);
        println!("Deaths:           {}", self.deaths);
        println!("Spawns:           {} ({} chain misses)", self.tally.spawns, self.tally.chain_misses);
        println!();
        println!("{:<10} {:>6} {:>9}", "Stat", "Level", "Prestige");
        for row in &self.levels {
            println!("{:<10} {:>6} {:>9}", row.stat.name(), row.level, row.prestige);
        }
        if let Some(report) = &self.offline {
            println!();
            println!(
                "Offline: {}s away, +{} essence, {} channeled, {} level-ups",
                report.away_seconds,
                report.passive_essence_gain,
                report.flow_essence_spent,
                report.total_level_ups
            );
        }
    }
}

/// Cultivate while there is essence to channel, fight otherwise.
fn choose_activity(state: &mut SimulationState) {
    if !state.unlocks.cultivation || state.has_enemy() {
        return;
    }
    let mode = if state.resources.essence >= 1.0 {
        ActivityMode::Cultivation
    } else {
        ActivityMode::Battle
    };
    state.set_activity_mode(mode);
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig, String> {
    match path {
        Some(path) => GameConfig::from_json_file(path)
            .map_err(|err| format!("failed to load {}: {err}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(options.config_path.as_ref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    info!(seed = options.seed, seconds = options.seconds, "starting simulation");

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut sim = Simulation::new(config);
    let mut tally = RunTally::default();

    let target_ms = options.seconds.max(0.0) * 1000.0;
    while sim.state().elapsed_ms < target_ms {
        if options.cultivate {
            choose_activity(sim.state_mut());
        }
        let events = sim.step(MAX_FRAME_MS, &mut rng);
        tally.record(&events);
    }

    let mut state = sim.state().clone();
    let mut offline = None;
    if let Some(hours) = options.offline_hours {
        let outcome = apply_offline_progress(&state, hours * MS_PER_HOUR, sim.config());
        state = outcome.state;
        offline = outcome.report;
    }

    let summary = Summary::new(options.seed, &state, tally, offline);
    if options.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize summary: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        summary.print_text();
    }
    ExitCode::SUCCESS
}
