//! Command line bench: replays inputs against a chart and prints every judgement.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use rvsrg_score::config::EngineConfig;
use rvsrg_score::database::{
    load_replay, load_replay_from_path, replay_exists, replay_hash, save_replay,
};
use rvsrg_score::logic::{VirtualReplayPlayer, summed_score};
use rvsrg_score::models::engine::{load_map, total_judgements};
use rvsrg_score::models::replay::ReplayData;
use rvsrg_score::models::stats::Judgement;
use rvsrg_score::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rvsrg-score")]
#[command(about = "VSRG judgement and scoring bench", version)]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "engine.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a replay and print its score outcome
    VirtualReplay {
        /// Replay file (.json or compressed .r)
        replay: PathBuf,
        /// Chart file (.osu)
        map: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the judgement count and maximum score counter of a chart
    MaxScore {
        /// Chart file (.osu)
        map: PathBuf,
    },
    /// Print the header and input counts of a replay file
    Replay {
        /// Replay file (.json or compressed .r)
        replay: PathBuf,
    },
    /// Compress a JSON replay into the replay store
    BuildReplay {
        /// Replay file (.json)
        input: PathBuf,
        /// Directory the .r file is written to
        out_dir: PathBuf,
        /// Chart the replay was recorded on, stamps its md5
        #[arg(long)]
        map: Option<PathBuf>,
        /// Overwrite an existing replay
        #[arg(long)]
        force: bool,
    },
    /// Print the active judgement windows
    Windows,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // The config loader already logs, so the logger starts at info and takes
    // the configured level once it is known. RUST_LOG overrides both.
    let from_env = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    if !from_env {
        log::set_max_level(LevelFilter::Info);
    }

    let config = match EngineConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config {:?}: {}", args.config, e);
            return ExitCode::FAILURE;
        }
    };

    if !from_env {
        log::set_max_level(config.logging.level_filter().unwrap_or(LevelFilter::Info));
    }

    match run(args.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &EngineConfig) -> Result<()> {
    match command {
        Command::VirtualReplay { replay, map, json } => virtual_replay(&replay, &map, json, config),
        Command::MaxScore { map } => {
            let chart = load_map(&map)?;
            let total = total_judgements(&chart.hit_objects);
            println!("Objects: {}", chart.hit_objects.len());
            println!("Judgements: {}", total);
            println!("Summed score: {}", summed_score(total));
            Ok(())
        }
        Command::Replay { replay } => {
            let data = read_replay(&replay)?;
            println!("Version: {}", data.version);
            println!("Map md5: {}", data.map_md5.as_deref().unwrap_or("-"));
            println!("Inputs: {}", data.inputs.len());
            println!("Presses: {}", data.press_count());
            println!("Releases: {}", data.release_count());
            if let (Some(first), Some(last)) = (data.inputs.first(), data.inputs.last()) {
                println!("Span: {}ms - {}ms", first.time_ms, last.time_ms);
            }
            Ok(())
        }
        Command::BuildReplay {
            input,
            out_dir,
            map,
            force,
        } => build_replay(&input, &out_dir, map.as_deref(), force),
        Command::Windows => {
            for judgement in Judgement::HIT_TIERS {
                if let Some(window) = config.judgement.window_for(judgement) {
                    println!("{judgement}: {window}ms");
                }
            }
            Ok(())
        }
    }
}

fn read_replay(path: &Path) -> Result<ReplayData> {
    if path.extension().is_some_and(|ext| ext == "json") {
        let content = std::fs::read_to_string(path)?;
        ReplayData::from_json(&content)
    } else {
        load_replay_from_path(path)
    }
}

fn build_replay(input: &Path, out_dir: &Path, map: Option<&Path>, force: bool) -> Result<()> {
    let content = std::fs::read_to_string(input)?;
    let mut data = ReplayData::from_json(&content)?;

    if let Some(map) = map {
        let chart = load_map(map)?;
        if !data.matches_chart(&chart.md5) {
            log::warn!(
                "Replay was recorded on {:?}, restamping with {}",
                data.map_md5,
                chart.md5
            );
        }
        data.map_md5 = Some(chart.md5);
    }

    let hash = replay_hash(&data)?;
    if replay_exists(out_dir, &hash) {
        if !force {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("replay {hash} already exists in {out_dir:?}, use --force to overwrite"),
            )));
        }
        log::warn!("Overwriting replay {hash}");
    }

    let path = save_replay(out_dir, &hash, &data)?;
    let written = load_replay(out_dir, &hash)?;
    log::info!("Wrote {} inputs to {:?}", written.inputs.len(), path);
    println!("{}", path.display());

    Ok(())
}

fn virtual_replay(
    replay_path: &Path,
    map_path: &Path,
    json: bool,
    config: &EngineConfig,
) -> Result<()> {
    let chart = load_map(map_path)?;

    let replay = read_replay(replay_path)?;
    if !replay.matches_chart(&chart.md5) {
        log::warn!(
            "Replay was recorded on {:?}, chart is {}",
            replay.map_md5,
            chart.md5
        );
    }

    log::info!(
        "Simulating {} inputs on {} objects",
        replay.inputs.len(),
        chart.hit_objects.len()
    );

    let player = VirtualReplayPlayer::new(&chart.hit_objects, config.judgement)?;
    let result = player.simulate(&replay);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for action in &result.actions {
        println!("{action}");
    }

    let state = &result.state;
    println!();
    println!("Score: {}", state.score);
    println!("Accuracy: {:.2}% ({})", state.accuracy, state.grade());
    println!("Max combo: {}", state.max_combo);
    println!("Health: {}", state.health);
    for (judgement, count) in state.judgements.iter() {
        println!("{judgement}: {count}");
    }
    println!("Ghost taps: {}", result.ghost_taps.len());

    Ok(())
}
