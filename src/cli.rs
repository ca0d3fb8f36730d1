use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::catalog::{catalog_from_path, CardCatalog, CardDefinition};
use crate::combat::{Rng, Side, MAX_ROLL, MIN_ROLL};
use crate::config::{AppConfig, TimingConfig};
use crate::game::Game;
use crate::parallel::{simulate_matchup, MAX_TURNS};
use crate::realtime::play_realtime;
use crate::{logging, server};

const USAGE: &str = "usage: diceduel <serve|cards|play|simulate>";
const PLAY_USAGE: &str = "usage: diceduel play [p1] [p2] [--seed N] [--roll 1-6]";
const DEFAULT_SIMULATIONS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Cards,
    Play,
    Simulate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("cards") => Some(Command::Cards),
        Some("play") => Some(Command::Play),
        Some("simulate") => Some(Command::Simulate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };

    let config = AppConfig::from_env();
    logging::init();
    let (catalog, timing) = catalog_from_path(config.cards_path.as_deref());

    match command {
        Command::Serve => handle_serve(&config, catalog, timing),
        Command::Cards => handle_cards(&catalog),
        Command::Play => handle_play(args, catalog, timing),
        Command::Simulate => handle_simulate(args, &catalog, timing),
    }
}

fn handle_serve(config: &AppConfig, catalog: CardCatalog, timing: TimingConfig) -> i32 {
    server::api::init_state(catalog, timing);
    match server::run_server(&config.bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_cards(catalog: &CardCatalog) -> i32 {
    print_json(&serde_json::json!({ "cards": catalog.cards() }))
}

#[derive(Debug, Default, PartialEq, Eq)]
struct PlayArgs {
    p1: Option<String>,
    p2: Option<String>,
    seed: Option<u64>,
    roll: Option<u8>,
}

fn parse_play_args(args: &[String]) -> Result<PlayArgs, String> {
    let mut parsed = PlayArgs::default();
    let mut iter = args.iter().skip(2);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                parsed.seed = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid seed '{value}'"))?,
                );
            }
            "--roll" => {
                let value = iter.next().ok_or("--roll needs a value")?;
                let roll = value
                    .parse::<u8>()
                    .ok()
                    .filter(|roll| (MIN_ROLL..=MAX_ROLL).contains(roll))
                    .ok_or_else(|| format!("invalid roll '{value}'"))?;
                parsed.roll = Some(roll);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{flag}'")),
            _ if parsed.p1.is_none() => parsed.p1 = Some(arg.clone()),
            _ if parsed.p2.is_none() => parsed.p2 = Some(arg.clone()),
            _ => return Err(format!("unexpected argument '{arg}'")),
        }
    }
    Ok(parsed)
}

/// Resolve a card argument, falling back to `default` when it is absent.
fn resolve_card<'a>(
    catalog: &'a CardCatalog,
    raw: Option<&str>,
    default: &'a CardDefinition,
) -> Result<&'a CardDefinition, String> {
    match raw {
        Some(key) => catalog
            .lookup(key)
            .ok_or_else(|| format!("unknown card '{key}'")),
        None => Ok(default),
    }
}

#[derive(Debug, Serialize)]
struct PlaySummary<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    player: &'a str,
    enemy: &'a str,
    winner: Option<Side>,
}

fn handle_play(args: &[String], catalog: CardCatalog, timing: TimingConfig) -> i32 {
    let parsed = match parse_play_args(args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}\n{PLAY_USAGE}");
            return 2;
        }
    };
    let (player, enemy) = match (
        resolve_card(&catalog, parsed.p1.as_deref(), catalog.default_player()),
        resolve_card(&catalog, parsed.p2.as_deref(), catalog.default_enemy()),
    ) {
        (Ok(player), Ok(enemy)) => (player.id.to_string(), enemy.id.to_string()),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("{err}");
            return 2;
        }
    };

    let rng = parsed.seed.map_or_else(Rng::from_entropy, Rng::new);
    let mut game = Game::from_deep_link(
        Arc::new(catalog),
        timing,
        rng,
        Some(&player),
        Some(&enemy),
    );
    game.set_roll_override(parsed.roll);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return 1;
        }
    };

    let mut failed = false;
    let winner = runtime.block_on(play_realtime(&mut game, MAX_TURNS, |event| {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(err) => {
                eprintln!("failed to serialize event: {err}");
                failed = true;
            }
        }
    }));
    if failed {
        return 1;
    }

    let Some(state) = game.match_state() else {
        eprintln!("match did not start");
        return 1;
    };
    info!("play finished: winner {winner:?}");
    match serde_json::to_string(&PlaySummary {
        kind: "summary",
        player: &state.player().name,
        enemy: &state.enemy().name,
        winner,
    }) {
        Ok(line) => {
            println!("{line}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize summary: {err}");
            1
        }
    }
}

fn handle_simulate(args: &[String], catalog: &CardCatalog, timing: TimingConfig) -> i32 {
    let player = resolve_card(catalog, args.get(2).map(String::as_str), catalog.default_player());
    let enemy = resolve_card(catalog, args.get(3).map(String::as_str), catalog.default_enemy());
    let (player, enemy) = match (player, enemy) {
        (Ok(player), Ok(enemy)) => (player, enemy),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let matches = parse_usize_arg(args.get(4), "matches", DEFAULT_SIMULATIONS);
    let seed = parse_u64_arg(args.get(5), "seed", 7);

    let report = simulate_matchup(player, enemy, timing, matches, seed);
    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}

fn parse_usize_arg(raw: Option<&String>, name: &str, default: usize) -> usize {
    raw.and_then(|value| value.parse::<usize>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
