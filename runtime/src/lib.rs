#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session driver that runs one Gravetide playthrough frame by frame.
//!
//! [`Session`] owns the world, the event bus, and every system, and advances
//! them in a fixed order each frame: wave scheduling and spawning, the player
//! fire gate, target acquisition, group movement updates, projectile culling,
//! the collision passes, defeat settlement, the army sweep, and finally
//! healing. Level-ups gathered during a frame pause the run in
//! [`Phase::ChoosingCard`] until [`Session::choose_card`] resumes it; a
//! defeat latches [`Phase::Over`] and every later frame is ignored.

use std::error::Error;
use std::fmt;

use gravetide_core::tuning::Tuning;
use gravetide_core::{
    CardKind, DefeatRecord, EventBus, GameEvent, GameOverReason, PlayerInput,
};
use gravetide_system_cards::CardSystem;
use gravetide_system_collision::CollisionResolver;
use gravetide_system_waves::{WaveScheduler, WaveSnapshot};
use gravetide_world::World;

/// Keeps the card stream decorrelated from the spawn stream when both are
/// derived from the same run seed.
const CARD_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Lifecycle state of a running session.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    /// The simulation advances on every frame.
    Running,
    /// The simulation is paused until the player picks an upgrade card.
    ChoosingCard {
        /// Cards currently offered.
        offer: Vec<CardKind>,
    },
    /// The run ended. Frames received afterwards are ignored.
    Over {
        /// How the run ended.
        reason: GameOverReason,
    },
}

/// Why a call to [`Session::choose_card`] was rejected.
#[derive(Debug, PartialEq, Eq)]
pub enum CardChoiceError {
    /// No card offer is pending.
    NotChoosing,
    /// The index does not address a card in the pending offer.
    OutOfRange {
        /// Index passed by the caller.
        index: usize,
        /// Number of cards in the pending offer.
        offered: usize,
    },
}

impl fmt::Display for CardChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotChoosing => write!(f, "no card offer is pending"),
            Self::OutOfRange { index, offered } => {
                write!(f, "card index {index} is outside the offer of {offered}")
            }
        }
    }
}

impl Error for CardChoiceError {}

/// Gate between the attack control and the player's projectile.
///
/// The timer starts at the cooldown so the first press of a run fires
/// immediately, and rearms on every attempt. The threshold is read off the
/// player each frame so cooldown upgrades take effect mid-run.
#[derive(Clone, Copy, Debug)]
struct FireControl {
    timer: f32,
}

impl FireControl {
    fn ready(cooldown: f32) -> Self {
        Self { timer: cooldown }
    }
}

/// One full playthrough: world state, systems, and the frame pipeline.
#[derive(Debug)]
pub struct Session {
    world: World,
    bus: EventBus,
    scheduler: WaveScheduler,
    cards: CardSystem,
    resolver: CollisionResolver,
    defeats: Vec<DefeatRecord>,
    fire: FireControl,
    phase: Phase,
    pending_offers: u32,
    game_time: f32,
}

impl Session {
    /// Creates a session over a fresh world.
    ///
    /// The seed fixes both random streams, so two sessions built from the
    /// same tuning and seed replay identically under identical input.
    #[must_use]
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let scheduler = WaveScheduler::new(&tuning, seed);
        let fire = FireControl::ready(tuning.player.attack_cooldown);
        Self {
            world: World::new(tuning),
            bus: EventBus::new(),
            scheduler,
            cards: CardSystem::new(seed ^ CARD_STREAM),
            resolver: CollisionResolver::new(),
            defeats: Vec::new(),
            fire,
            phase: Phase::Running,
            pending_offers: 0,
            game_time: 0.0,
        }
    }

    /// Read access to the simulation state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The event bus, for registering observers.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Seconds of wall time handed to the session so far, before clamping.
    #[must_use]
    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    /// Wave progress for presentation.
    #[must_use]
    pub fn wave_snapshot(&self) -> WaveSnapshot {
        self.scheduler.snapshot()
    }

    /// Whether the run has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Over { .. })
    }

    /// Advances the simulation by one frame.
    ///
    /// Does nothing while a card choice is pending or after the run ended.
    /// `dt` is credited to [`Session::game_time`] in full but integration is
    /// capped at the tuned maximum frame delta.
    pub fn frame(&mut self, input: PlayerInput, dt: f32) {
        if self.phase != Phase::Running {
            return;
        }

        self.game_time += dt;
        let dt = dt.min(self.world.tuning().session.max_frame_delta);

        self.scheduler
            .update(dt, self.world.enemies().len(), &mut self.bus);
        if let Some(order) = self.scheduler.try_spawn() {
            let _ = self.world.spawn_enemy(order.archetype, order.x, order.y);
        }

        self.fire.timer += dt;
        if input.attack_held && self.fire.timer >= self.world.player().attack_cooldown {
            self.fire.timer = 0.0;
            if let Some((x, y, vx, vy)) = self.world.fire_player_projectile() {
                self.bus.emit(&GameEvent::PlayerAttacked { x, y, vx, vy });
            }
        }
        self.world.update_player(input, dt);

        self.world.refresh_enemy_targets();
        self.world.refresh_ally_targets();

        self.world.update_army(dt);
        self.world.update_enemies(dt);
        self.world.update_projectiles(dt);
        self.world.cull_out_of_bounds();
        self.world.clamp_army();

        let game_over =
            self.resolver
                .resolve(self.world.combatants(), &mut self.bus, &mut self.defeats);

        let levels = self.settle_defeats();

        self.world.sweep_army();
        self.world.apply_aura_and_regen(dt);

        if let Some(reason) = game_over {
            log::info!(
                "run over after {:.1}s at wave {}: {:?}",
                self.game_time,
                self.scheduler.wave(),
                reason
            );
            self.phase = Phase::Over { reason };
            return;
        }

        if levels > 0 {
            log::info!("player reached level {}", self.world.player().level);
            self.pending_offers += levels;
        }
        self.open_next_offer();
    }

    /// Applies one card from the pending offer and resumes the run.
    ///
    /// Stacked level-ups queue further offers, so the session may move
    /// straight into another [`Phase::ChoosingCard`]. Returns the card that
    /// was applied.
    pub fn choose_card(&mut self, index: usize) -> Result<CardKind, CardChoiceError> {
        let Phase::ChoosingCard { offer } = &self.phase else {
            return Err(CardChoiceError::NotChoosing);
        };
        let Some(card) = offer.get(index).copied() else {
            return Err(CardChoiceError::OutOfRange {
                index,
                offered: offer.len(),
            });
        };

        let _ = self.cards.apply(card, self.world.player_mut(), &mut self.bus);
        log::info!(
            "card {:?} applied at level {}",
            card,
            self.world.player().level
        );
        self.phase = Phase::Running;
        self.open_next_offer();
        Ok(card)
    }

    /// Ends the session, dropping every bus subscription.
    pub fn teardown(&mut self) {
        self.bus.clear();
    }

    /// Settles every defeat recorded by the collision passes, in order:
    /// experience first, then conversion while a slot is free. Returns the
    /// number of levels gained.
    fn settle_defeats(&mut self) -> u32 {
        let mut levels = 0;
        for index in 0..self.defeats.len() {
            let record = self.defeats[index];
            levels += self
                .world
                .grant_experience(record.experience as f32, &mut self.bus);
            if let Some((ally, army_size)) = self.world.try_convert(&record) {
                log::info!(
                    "{:?} {} enlisted as ally {} ({} in the army)",
                    record.archetype,
                    record.enemy.get(),
                    ally.get(),
                    army_size
                );
                self.bus.emit(&GameEvent::ArmyUnitAdded {
                    ally,
                    archetype: record.archetype,
                    army_size,
                });
            }
        }
        self.defeats.clear();
        levels
    }

    /// Opens the next queued card offer, skipping offers the library can no
    /// longer fill. Leaves the session running when nothing is pending.
    fn open_next_offer(&mut self) {
        while self.pending_offers > 0 {
            self.pending_offers -= 1;
            let count = self.world.tuning().session.cards_per_offer as usize;
            let level = self.world.player().level;
            let offer = self.cards.generate_offer(count, level, self.world.player());
            if offer.is_empty() {
                continue;
            }
            self.phase = Phase::ChoosingCard { offer };
            return;
        }
    }
}
