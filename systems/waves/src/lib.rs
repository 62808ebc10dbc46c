#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave state machine and spawn scheduling.
//!
//! The scheduler alternates between a countdown toward the next wave and an
//! in-progress phase that issues spawn orders on a fixed interval. All
//! randomness flows through one seeded stream, so two schedulers built with
//! the same seed and driven identically issue identical orders.

use gravetide_core::tuning::{Tuning, WaveTuning};
use gravetide_core::{Archetype, EventBus, GameEvent};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Instruction to create one enemy, issued by the scheduler and executed by
/// the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnOrder {
    /// Archetype to stamp the enemy with.
    pub archetype: Archetype,
    /// Horizontal spawn position, just outside the arena.
    pub x: f32,
    /// Vertical spawn position, just outside the arena.
    pub y: f32,
}

/// Wave state copied out for observers such as renderers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveSnapshot {
    /// One-based index of the current wave, zero before the first.
    pub wave: u32,
    /// Indicates whether a wave is currently issuing or draining.
    pub in_progress: bool,
    /// Seconds until the next wave starts, zero while one is in progress.
    pub time_until_next: f32,
}

/// Drives wave progression and decides where and what to spawn.
#[derive(Debug)]
pub struct WaveScheduler {
    tuning: WaveTuning,
    arena_width: f32,
    arena_height: f32,
    rng: ChaCha8Rng,
    wave: u32,
    timer: f32,
    spawn_timer: f32,
    wave_elapsed: f32,
    in_progress: bool,
    spawned: u32,
    quota: u32,
}

impl WaveScheduler {
    /// Creates a scheduler counting down toward the first wave.
    #[must_use]
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            tuning: tuning.waves.clone(),
            arena_width: tuning.arena.width,
            arena_height: tuning.arena.height,
            rng: ChaCha8Rng::seed_from_u64(seed),
            wave: 0,
            timer: tuning.waves.first_wave_delay,
            spawn_timer: 0.0,
            wave_elapsed: 0.0,
            in_progress: false,
            spawned: 0,
            quota: 0,
        }
    }

    /// One-based index of the current wave, zero before the first.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Indicates whether a wave is currently issuing or draining.
    #[must_use]
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Seconds until the next wave starts.
    #[must_use]
    pub fn time_until_next_wave(&self) -> f32 {
        self.timer.max(0.0)
    }

    /// Copies the observable wave state.
    #[must_use]
    pub fn snapshot(&self) -> WaveSnapshot {
        WaveSnapshot {
            wave: self.wave,
            in_progress: self.in_progress,
            time_until_next: if self.in_progress {
                0.0
            } else {
                self.time_until_next_wave()
            },
        }
    }

    /// Advances wave timers, starting and completing waves as they come due.
    ///
    /// `enemies_remaining` is the raw size of the world's enemy collection.
    /// Corpses count until the world sweeps them, so completion can lag one
    /// frame behind the final kill.
    pub fn update(&mut self, dt: f32, enemies_remaining: usize, bus: &mut EventBus) {
        self.timer -= dt;
        self.spawn_timer += dt;
        if !self.in_progress {
            if self.timer <= 0.0 {
                self.start_wave(bus);
            }
            return;
        }

        self.wave_elapsed += dt;
        let drained = enemies_remaining == 0 && self.spawned >= self.quota;
        let expired = self
            .tuning
            .max_wave_duration
            .map_or(false, |limit| self.wave_elapsed >= limit);
        if drained || expired {
            self.end_wave(bus);
        }
    }

    /// Issues the next spawn order if the interval elapsed and the wave
    /// still has quota. The interval rearms only when an order is issued,
    /// so a gated frame retries immediately once the wave opens.
    pub fn try_spawn(&mut self) -> Option<SpawnOrder> {
        if self.spawn_timer < self.tuning.spawn_interval {
            return None;
        }
        if !self.in_progress || self.spawned >= self.quota {
            return None;
        }
        let order = self.roll_spawn();
        self.spawned += 1;
        self.spawn_timer = 0.0;
        Some(order)
    }

    fn start_wave(&mut self, bus: &mut EventBus) {
        self.wave += 1;
        self.spawned = 0;
        self.wave_elapsed = 0.0;
        self.in_progress = true;
        let exponent = self.wave.saturating_sub(1) as i32;
        self.quota = (f64::from(self.tuning.enemies_per_wave)
            * f64::from(self.tuning.growth).powi(exponent))
        .floor() as u32;
        log::info!("wave {} started, {} enemies inbound", self.wave, self.quota);
        bus.emit(&GameEvent::WaveStarted {
            wave: self.wave,
            enemy_count: self.quota,
        });
    }

    fn end_wave(&mut self, bus: &mut EventBus) {
        self.in_progress = false;
        self.timer = self.tuning.time_between_waves;
        log::info!("wave {} completed", self.wave);
        bus.emit(&GameEvent::WaveCompleted { wave: self.wave });
    }

    /// Rolls edge, position along it, and archetype, in that order.
    fn roll_spawn(&mut self) -> SpawnOrder {
        let padding = self.tuning.edge_padding;
        let side = (self.rng.gen::<f32>() * 4.0) as u32;
        let (x, y) = match side {
            0 => (self.rng.gen::<f32>() * self.arena_width, -padding),
            1 => (
                self.arena_width + padding,
                self.rng.gen::<f32>() * self.arena_height,
            ),
            2 => (
                self.rng.gen::<f32>() * self.arena_width,
                self.arena_height + padding,
            ),
            _ => (-padding, self.rng.gen::<f32>() * self.arena_height),
        };
        let archetype = self.roll_archetype();
        SpawnOrder { archetype, x, y }
    }

    /// Difficulty policy keyed on the wave index. The roll is drawn before
    /// the wave branch; warrior-only waves discard it.
    fn roll_archetype(&mut self) -> Archetype {
        let roll = self.rng.gen::<f32>();
        if self.wave <= 2 {
            Archetype::Warrior
        } else if self.wave <= 5 {
            if roll < 0.6 {
                Archetype::Warrior
            } else {
                Archetype::Assassin
            }
        } else if self.wave <= 8 {
            if roll < 0.4 {
                Archetype::Warrior
            } else if roll < 0.7 {
                Archetype::Assassin
            } else {
                Archetype::Shaman
            }
        } else if roll < 0.3 {
            Archetype::Warrior
        } else if roll < 0.5 {
            Archetype::Assassin
        } else if roll < 0.75 {
            Archetype::Shaman
        } else {
            Archetype::Tank
        }
    }
}
