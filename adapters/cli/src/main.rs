#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Gravetide session.
//!
//! A scripted pilot holds the attack control and strafes in a circle while
//! the simulation steps at a fixed 60 Hz. Card offers are always answered
//! with the first card. At the end a single summary line reports how the
//! run went.

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::{Context, Result};
use clap::Parser;
use gravetide_core::tuning::Tuning;
use gravetide_core::{EventKind, PlayerInput};
use gravetide_rendering::Scene;
use gravetide_runtime::{Phase, Session};

const FRAME: f32 = 1.0 / 60.0;

const EVENT_KINDS: [EventKind; 12] = [
    EventKind::WaveStarted,
    EventKind::WaveCompleted,
    EventKind::EnemyDefeated,
    EventKind::ProjectileHit,
    EventKind::PlayerAttacked,
    EventKind::PlayerDamaged,
    EventKind::PlayerLevelUp,
    EventKind::AllyDamaged,
    EventKind::AllyHit,
    EventKind::ArmyUnitAdded,
    EventKind::CardApplied,
    EventKind::GameOver,
];

#[derive(Parser, Debug)]
#[command(name = "gravetide")]
#[command(about = "Runs a headless Gravetide session with a scripted pilot")]
struct Cli {
    /// Seed for the run; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Seconds of simulated play
    #[arg(long, default_value_t = 120.0)]
    duration: f32,
    /// TOML file overriding parts of the default tuning
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Log every simulation event as it is emitted
    #[arg(long)]
    verbose: bool,
}

/// Entry point for the Gravetide command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        let _ = logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let tuning = match &cli.tuning {
        Some(path) => load_tuning(path)?,
        None => Tuning::default(),
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    log::info!("starting run with seed {seed}");

    let mut session = Session::new(tuning, seed);
    let kills = count_events(&mut session, EventKind::EnemyDefeated);
    let waves_cleared = count_events(&mut session, EventKind::WaveCompleted);
    if cli.verbose {
        log_events(&mut session);
    }

    let frames = (cli.duration / FRAME).ceil() as u64;
    for frame in 0..frames {
        if matches!(session.phase(), Phase::ChoosingCard { .. }) {
            if let Err(error) = session.choose_card(0) {
                log::warn!("card pick rejected: {error}");
            }
        }
        if session.is_over() {
            break;
        }
        session.frame(autopilot(frame), FRAME);
    }

    let scene = Scene::compose(session.world(), &session.wave_snapshot());
    let outcome = match session.phase() {
        Phase::Over { reason } => format!("defeated ({reason:?})"),
        _ => String::from("survived"),
    };
    println!(
        "run complete after {:.0}s: {} waves cleared, {} kills, level {}, army {}/{}, {}",
        session.game_time(),
        *waves_cleared.borrow(),
        *kills.borrow(),
        scene.hud.level,
        scene.hud.army_size,
        scene.hud.army_capacity,
        outcome
    );

    session.teardown();
    Ok(())
}

fn load_tuning(path: &Path) -> Result<Tuning> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read tuning file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parse tuning file {}", path.display()))
}

/// Holds the attack control and strafes in a slow circle around the arena.
fn autopilot(frame: u64) -> PlayerInput {
    let angle = frame as f32 * 0.02;
    PlayerInput {
        move_x: angle.cos(),
        move_y: angle.sin(),
        attack_held: true,
    }
}

fn count_events(session: &mut Session, kind: EventKind) -> Rc<RefCell<u32>> {
    let counter = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&counter);
    let _ = session.bus_mut().on(kind, move |_| {
        *sink.borrow_mut() += 1;
    });
    counter
}

fn log_events(session: &mut Session) {
    for kind in EVENT_KINDS {
        let _ = session.bus_mut().on(kind, |event| {
            log::debug!("{event:?}");
        });
    }
}
