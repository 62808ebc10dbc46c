use std::collections::BTreeSet;

use gravetide_core::tuning::{PlayerTuning, Tuning};
use gravetide_core::{CardKind, EventBus, GameEvent, PlayerInput};

use crate::ally::Ally;
use crate::Body;

/// The player-controlled character.
///
/// Stats start from [`PlayerTuning`] and drift over a run as upgrade cards
/// mutate them. There is exactly one player per run; it never respawns.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Movement state.
    pub body: Body,
    /// Upper bound for [`Player::health`].
    pub max_health: f32,
    /// Current health. The player is defeated when this reaches zero.
    pub health: f32,
    /// Damage carried by each player projectile.
    pub damage: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Seconds between shots while the attack control is held.
    pub attack_cooldown: f32,
    /// Army slots granted before score is taken into account.
    pub base_army_capacity: u32,
    /// Score accumulated over the run; widens the army through
    /// [`Player::army_capacity`].
    pub points: f32,
    /// Multiplier applied to every experience grant.
    pub points_multiplier: f32,
    /// Current level, starting at one.
    pub level: u32,
    /// Experience gathered toward the next level.
    pub experience: f32,
    /// Experience required to reach the next level.
    pub experience_to_next: f32,
    /// Health restored per second once regeneration cards are applied.
    pub health_regen: f32,
    /// Set once the healing aura has been unlocked by a card.
    pub healing_unlocked: bool,
    /// Extra aura radius granted by cards, in world units.
    pub aura_radius_bonus: f32,
    /// Cards already applied this run. Each card's effect lands at most
    /// once no matter how often it is offered.
    pub applied_cards: BTreeSet<CardKind>,
}

impl Player {
    /// Creates the player centered in the arena with baseline stats.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        let size = tuning.player.size;
        Self {
            body: Body::new(
                tuning.arena.width / 2.0,
                tuning.arena.height / 2.0,
                size,
                size,
            ),
            max_health: tuning.player.max_health,
            health: tuning.player.max_health,
            damage: tuning.player.damage,
            speed: tuning.player.speed,
            attack_cooldown: tuning.player.attack_cooldown,
            base_army_capacity: tuning.player.base_army_capacity,
            points: 0.0,
            points_multiplier: 1.0,
            level: 1,
            experience: 0.0,
            experience_to_next: tuning.player.experience_to_level,
            health_regen: 0.0,
            healing_unlocked: false,
            aura_radius_bonus: 0.0,
            applied_cards: BTreeSet::new(),
        }
    }

    /// Applies one frame of movement from the sampled input.
    ///
    /// The input vector is normalized first, so diagonal movement is no
    /// faster than movement along an axis.
    pub fn update(&mut self, input: PlayerInput, dt: f32) {
        let magnitude = (input.move_x * input.move_x + input.move_y * input.move_y).sqrt();
        if magnitude > 0.0 {
            self.body.vx = input.move_x / magnitude * self.speed;
            self.body.vy = input.move_y / magnitude * self.speed;
        } else {
            self.body.vx = 0.0;
            self.body.vy = 0.0;
        }
        self.body.integrate(dt);
    }

    /// Army slots currently available, widening with score.
    #[must_use]
    pub fn army_capacity(&self, tuning: &PlayerTuning) -> u32 {
        self.base_army_capacity + (self.points * tuning.capacity_per_point).floor() as u32
    }

    /// Radius of the healing aura, growing with maximum health and card
    /// bonuses.
    #[must_use]
    pub fn aura_radius(&self, tuning: &PlayerTuning) -> f32 {
        tuning.aura_base_radius
            + self.max_health * tuning.aura_radius_per_health
            + self.aura_radius_bonus
    }

    /// Health per second the aura restores to each ally inside it.
    #[must_use]
    pub fn aura_power(&self, tuning: &PlayerTuning) -> f32 {
        tuning.aura_base_power + self.max_health * tuning.aura_power_per_health
    }

    /// Heals every wounded ally inside the aura, if it has been unlocked.
    pub fn apply_healing_aura(&self, allies: &mut [Ally], dt: f32, tuning: &PlayerTuning) {
        if !self.healing_unlocked {
            return;
        }
        let radius_sq = {
            let radius = self.aura_radius(tuning);
            radius * radius
        };
        let power = self.aura_power(tuning);
        let (center_x, center_y) = self.body.center();
        for ally in allies.iter_mut() {
            if !ally.body.active || ally.health >= ally.max_health {
                continue;
            }
            let (ally_x, ally_y) = ally.body.center();
            let dx = ally_x - center_x;
            let dy = ally_y - center_y;
            if dx * dx + dy * dy <= radius_sq {
                ally.heal(power * dt);
            }
        }
    }

    /// Ticks passive health regeneration.
    pub fn regenerate(&mut self, dt: f32) {
        if self.health_regen > 0.0 {
            self.health = (self.health + self.health_regen * dt).min(self.max_health);
        }
    }

    /// Removes health and deactivates the player at zero.
    pub fn take_damage(&mut self, amount: f32) {
        self.health -= amount;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.body.active = false;
        }
    }

    /// Restores health up to the maximum.
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Adds experience, cascading through as many level-ups as the total
    /// covers. One event is emitted per level gained; the number of levels
    /// gained is returned.
    pub fn add_experience(
        &mut self,
        amount: f32,
        tuning: &PlayerTuning,
        bus: &mut EventBus,
    ) -> u32 {
        self.experience += amount * self.points_multiplier;
        let mut levels_gained = 0;
        while self.experience >= self.experience_to_next {
            self.level += 1;
            self.experience = (self.experience - self.experience_to_next).max(0.0);
            self.experience_to_next = (self.experience_to_next * tuning.level_growth).floor();
            if self.experience_to_next == 0.0 {
                self.experience_to_next = tuning.experience_to_level;
            }
            bus.emit(&GameEvent::PlayerLevelUp { level: self.level });
            levels_gained += 1;
        }
        levels_gained
    }
}
