#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gravetide.
//!
//! The [`World`] owns the player, both projectile-throwing factions, and the
//! converted army, and exposes one method per phase of the fixed frame
//! order. A driver calls those phases in sequence every frame; systems that
//! need simultaneous mutable access to several collections borrow them
//! through [`Combatants`]. Read-only consumers such as renderers go through
//! [`query`] instead.

use gravetide_core::tuning::{ArenaTuning, Tuning};
use gravetide_core::{
    AllyId, Archetype, Bounds, DefeatRecord, EnemyId, EventBus, PlayerInput, ProjectileSource,
    Rect,
};

mod ally;
mod enemy;
mod player;
mod projectile;

pub use self::ally::{Ally, AllyMode};
pub use self::enemy::{Enemy, TargetRef};
pub use self::player::Player;
pub use self::projectile::Projectile;

/// Shared movement state carried by every simulated entity.
///
/// Positions are rectangle top-left corners; velocity is applied explicitly
/// through [`Body::integrate`] so behaviors control when motion happens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Position and extent of the entity.
    pub rect: Rect,
    /// Horizontal velocity in world units per second.
    pub vx: f32,
    /// Vertical velocity in world units per second.
    pub vy: f32,
    /// Entities become inactive when destroyed and are swept afterwards.
    pub active: bool,
}

impl Body {
    /// Creates a stationary, active body at the provided position.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            rect: Rect::new(x, y, width, height),
            vx: 0.0,
            vy: 0.0,
            active: true,
        }
    }

    /// Advances the position by one velocity step.
    pub fn integrate(&mut self, dt: f32) {
        self.rect.x += self.vx * dt;
        self.rect.y += self.vy * dt;
    }

    /// Center point of the body.
    #[must_use]
    pub const fn center(&self) -> (f32, f32) {
        (self.rect.center_x(), self.rect.center_y())
    }

    /// Pushes the body back inside the arena, zeroing only the velocity
    /// component that points out of it.
    pub fn confine(&mut self, arena: &ArenaTuning) {
        let margin = arena.confine_margin;
        if self.rect.x < margin {
            self.rect.x = margin;
            self.vx = self.vx.max(0.0);
        }
        if self.rect.x + self.rect.width > arena.width - margin {
            self.rect.x = arena.width - self.rect.width - margin;
            self.vx = self.vx.min(0.0);
        }
        if self.rect.y < margin {
            self.rect.y = margin;
            self.vy = self.vy.max(0.0);
        }
        if self.rect.y + self.rect.height > arena.height - margin {
            self.rect.y = arena.height - self.rect.height - margin;
            self.vy = self.vy.min(0.0);
        }
    }
}

/// Represents the authoritative Gravetide world state.
#[derive(Debug)]
pub struct World {
    tuning: Tuning,
    bounds: Bounds,
    player: Player,
    enemies: Vec<Enemy>,
    army: Vec<Ally>,
    player_projectiles: Vec<Projectile>,
    ally_projectiles: Vec<Projectile>,
    enemy_projectiles: Vec<Projectile>,
    next_enemy_id: u32,
    next_ally_id: u32,
}

impl World {
    /// Creates a new world with the player centered in the arena.
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        let bounds = Bounds::new(tuning.arena.width, tuning.arena.height, tuning.arena.padding);
        let player = Player::new(&tuning);
        Self {
            bounds,
            player,
            enemies: Vec::new(),
            army: Vec::new(),
            player_projectiles: Vec::new(),
            ally_projectiles: Vec::new(),
            enemy_projectiles: Vec::new(),
            next_enemy_id: 0,
            next_ally_id: 0,
            tuning,
        }
    }

    /// Balance sheet this world was built with.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Playfield that confines the player and expires projectiles.
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Read-only access to the player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable access to the player, used by upgrade-card effects.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Enemies currently in the arena, including this frame's unswept
    /// corpses.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Allied units escorting the player.
    #[must_use]
    pub fn army(&self) -> &[Ally] {
        &self.army
    }

    /// Projectiles fired by the player.
    #[must_use]
    pub fn player_projectiles(&self) -> &[Projectile] {
        &self.player_projectiles
    }

    /// Projectiles fired by converted shamans.
    #[must_use]
    pub fn ally_projectiles(&self) -> &[Projectile] {
        &self.ally_projectiles
    }

    /// Projectiles fired by enemy shamans.
    #[must_use]
    pub fn enemy_projectiles(&self) -> &[Projectile] {
        &self.enemy_projectiles
    }

    /// Army slots currently available to the player.
    #[must_use]
    pub fn army_capacity(&self) -> u32 {
        self.player.army_capacity(&self.tuning.player)
    }

    /// Borrows every combat collection at once for the collision sweep.
    pub fn combatants(&mut self) -> Combatants<'_> {
        Combatants {
            player: &mut self.player,
            enemies: &mut self.enemies,
            army: &mut self.army,
            player_projectiles: &mut self.player_projectiles,
            ally_projectiles: &mut self.ally_projectiles,
            enemy_projectiles: &mut self.enemy_projectiles,
        }
    }

    /// Applies movement input to the player and clamps it into the arena.
    pub fn update_player(&mut self, input: PlayerInput, dt: f32) {
        self.player.update(input, dt);
        self.bounds.clamp(&mut self.player.body.rect);
    }

    /// Lets every enemy reacquire the closest target, and lets active
    /// shamans fire at theirs.
    pub fn refresh_enemy_targets(&mut self) {
        let Self {
            player,
            enemies,
            army,
            enemy_projectiles,
            tuning,
            ..
        } = self;
        for enemy in enemies.iter_mut() {
            enemy.find_closest_target(player, army);
            if enemy.archetype == Archetype::Shaman && enemy.body.active {
                if let Some(projectile) = enemy.try_fire(player, army, tuning) {
                    enemy_projectiles.push(projectile);
                }
            }
        }
    }

    /// Lets idle melee allies scan for an enemy to engage.
    ///
    /// Escorting shamans never enter [`AllyMode::Follow`]; they pick their
    /// own targets when they fire during [`World::update_army`].
    pub fn refresh_ally_targets(&mut self) {
        let Self {
            army,
            enemies,
            tuning,
            ..
        } = self;
        for ally in army.iter_mut() {
            if ally.mode == AllyMode::Follow && !enemies.is_empty() {
                ally.find_nearest_enemy(enemies, &tuning.allies);
            }
        }
    }

    /// Updates every allied unit, highest index first.
    ///
    /// Each unit sees the already-updated positions of higher-index
    /// neighbors when computing separation, so flock shapes settle the same
    /// way every run. Projectiles fired by escorting shamans are collected
    /// into the ally group.
    pub fn update_army(&mut self, dt: f32) {
        let Self {
            player,
            enemies,
            army,
            ally_projectiles,
            tuning,
            ..
        } = self;
        for index in (0..army.len()).rev() {
            let (before, rest) = army.split_at_mut(index);
            let Some((ally, after)) = rest.split_first_mut() else {
                continue;
            };
            if let Some(projectile) = ally.update(dt, player, enemies, before, after, tuning) {
                ally_projectiles.push(projectile);
            }
        }
    }

    /// Removes enemy corpses, then updates the survivors.
    pub fn update_enemies(&mut self, dt: f32) {
        let Self {
            player,
            enemies,
            army,
            tuning,
            ..
        } = self;
        enemies.retain(|enemy| enemy.body.active);
        for enemy in enemies.iter_mut() {
            enemy.update(dt, player, army, tuning);
        }
    }

    /// Removes spent projectiles, then flies the rest forward.
    pub fn update_projectiles(&mut self, dt: f32) {
        for group in [
            &mut self.player_projectiles,
            &mut self.ally_projectiles,
            &mut self.enemy_projectiles,
        ] {
            group.retain(|projectile| projectile.body.active);
            for projectile in group.iter_mut() {
                projectile.update(dt);
            }
        }
    }

    /// Marks projectiles that left the playfield as spent.
    pub fn cull_out_of_bounds(&mut self) {
        let bounds = self.bounds;
        for group in [
            &mut self.player_projectiles,
            &mut self.enemy_projectiles,
            &mut self.ally_projectiles,
        ] {
            for projectile in group.iter_mut() {
                if bounds.is_out_of_bounds(&projectile.body.rect) {
                    projectile.body.active = false;
                }
            }
        }
    }

    /// Clamps every allied unit back into the playfield.
    pub fn clamp_army(&mut self) {
        let bounds = self.bounds;
        for ally in self.army.iter_mut() {
            bounds.clamp(&mut ally.body.rect);
        }
    }

    /// Removes allied units that died during the collision sweep.
    pub fn sweep_army(&mut self) {
        self.army.retain(|ally| ally.body.active && ally.health > 0.0);
    }

    /// Runs the player's healing aura over the army, then passive
    /// regeneration.
    pub fn apply_aura_and_regen(&mut self, dt: f32) {
        let Self {
            player,
            army,
            tuning,
            ..
        } = self;
        player.apply_healing_aura(army, dt, &tuning.player);
        player.regenerate(dt);
    }

    /// Spawns an enemy already locked onto the player.
    pub fn spawn_enemy(&mut self, archetype: Archetype, x: f32, y: f32) -> EnemyId {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        let mut enemy = Enemy::spawn(id, archetype, x, y, &self.tuning.enemies);
        enemy.target = Some(TargetRef::Player);
        self.enemies.push(enemy);
        id
    }

    /// Converts a defeated enemy into an allied unit if a slot is free.
    ///
    /// The new ally keeps the source archetype, size, and speed, carries a
    /// reduced share of its damage, and starts at full health. Returns the
    /// assigned id and the army size after conversion.
    pub fn try_convert(&mut self, record: &DefeatRecord) -> Option<(AllyId, u32)> {
        if self.army.len() as u32 >= self.army_capacity() {
            return None;
        }
        let id = AllyId::new(self.next_ally_id);
        self.next_ally_id = self.next_ally_id.wrapping_add(1);
        self.army
            .push(Ally::from_defeated(id, record, &self.tuning.allies));
        Some((id, self.army.len() as u32))
    }

    /// Credits experience to the player, emitting one level-up event per
    /// level gained. Returns how many levels were gained.
    pub fn grant_experience(&mut self, amount: f32, bus: &mut EventBus) -> u32 {
        self.player
            .add_experience(amount, &self.tuning.player, bus)
    }

    /// Fires a player projectile at the nearest active enemy.
    ///
    /// With no enemy to aim at the shot falls back to a fixed offset ahead
    /// of the player. Returns the projectile's origin and velocity, or
    /// `None` when the aim direction degenerates to zero length.
    pub fn fire_player_projectile(&mut self) -> Option<(f32, f32, f32, f32)> {
        let (center_x, center_y) = self.player.body.center();
        let mut aim: Option<(f32, f32)> = None;
        let mut min_distance_sq = f32::INFINITY;
        for enemy in &self.enemies {
            if !enemy.body.active {
                continue;
            }
            let (enemy_x, enemy_y) = enemy.body.center();
            let dx = enemy_x - center_x;
            let dy = enemy_y - center_y;
            let distance_sq = dx * dx + dy * dy;
            if distance_sq < min_distance_sq {
                min_distance_sq = distance_sq;
                aim = Some((enemy_x, enemy_y));
            }
        }
        let (target_x, target_y) = aim.unwrap_or((
            self.player.body.rect.x + 100.0,
            self.player.body.rect.y,
        ));

        let dx = target_x - center_x;
        let dy = target_y - center_y;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude == 0.0 {
            return None;
        }

        let speed = self.tuning.projectiles.player_speed;
        let vx = dx / magnitude * speed;
        let vy = dy / magnitude * speed;
        let half = self.tuning.projectiles.size / 2.0;
        let projectile = Projectile::new(
            center_x - half,
            center_y - half,
            vx,
            vy,
            self.player.damage,
            ProjectileSource::Player,
            &self.tuning.projectiles,
        );
        let origin = (projectile.body.rect.x, projectile.body.rect.y);
        self.player_projectiles.push(projectile);
        Some((origin.0, origin.1, vx, vy))
    }
}

/// Mutable borrows of every combat collection, handed to the collision
/// sweep so all five passes can run without re-borrowing the world.
pub struct Combatants<'a> {
    /// The player.
    pub player: &'a mut Player,
    /// Enemies, including unswept corpses.
    pub enemies: &'a mut Vec<Enemy>,
    /// Allied units.
    pub army: &'a mut Vec<Ally>,
    /// Projectiles fired by the player.
    pub player_projectiles: &'a mut Vec<Projectile>,
    /// Projectiles fired by converted shamans.
    pub ally_projectiles: &'a mut Vec<Projectile>,
    /// Projectiles fired by enemy shamans.
    pub enemy_projectiles: &'a mut Vec<Projectile>,
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;

    /// Player health as a fraction of its maximum.
    #[must_use]
    pub fn player_health_fraction(world: &World) -> f32 {
        let player = world.player();
        if player.max_health > 0.0 {
            player.health / player.max_health
        } else {
            0.0
        }
    }

    /// Number of enemies still alive.
    #[must_use]
    pub fn active_enemies(world: &World) -> usize {
        world
            .enemies()
            .iter()
            .filter(|enemy| enemy.body.active)
            .count()
    }

    /// Number of allied units in the army.
    #[must_use]
    pub fn army_size(world: &World) -> usize {
        world.army().len()
    }

    /// Number of projectiles currently in flight across all factions.
    #[must_use]
    pub fn airborne_projectiles(world: &World) -> usize {
        world.player_projectiles().len()
            + world.ally_projectiles().len()
            + world.enemy_projectiles().len()
    }
}
