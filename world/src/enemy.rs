use gravetide_core::tuning::{ArenaTuning, EnemyTuning, Tuning};
use gravetide_core::{AllyId, Archetype, EnemyId, ProjectileSource};

use crate::ally::Ally;
use crate::player::Player;
use crate::projectile::Projectile;
use crate::Body;

/// Which combatant an enemy is currently locked onto.
///
/// Targets are held by id, never by reference. Movement and firing re-check
/// the target's liveness through the world every frame, so a stale id
/// behaves exactly like a dead target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetRef {
    /// The enemy pursues the player.
    Player,
    /// The enemy pursues the allied unit with this id.
    Ally(AllyId),
}

/// A hostile unit stamped from one of the four archetype profiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    /// Identifier assigned at spawn, unique for the run.
    pub id: EnemyId,
    /// Profile the enemy was stamped with.
    pub archetype: Archetype,
    /// Movement state.
    pub body: Body,
    /// Upper bound for [`Enemy::health`].
    pub max_health: f32,
    /// Current health. The enemy dies at zero.
    pub health: f32,
    /// Damage dealt per melee strike or carried per projectile.
    pub damage: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Experience rewarded when defeated.
    pub experience: u32,
    /// Center distance at which melee strikes connect.
    pub attack_range: f32,
    /// Seconds between melee strikes.
    pub attack_cooldown: f32,
    /// Seconds since the last melee strike.
    pub attack_timer: f32,
    /// Seconds since the last projectile. Starts ready so shamans open
    /// fire as soon as they acquire a target.
    pub fire_timer: f32,
    /// Combatant currently pursued, if any.
    pub target: Option<TargetRef>,
}

impl Enemy {
    /// Stamps a new enemy from the archetype's profile.
    #[must_use]
    pub fn spawn(
        id: EnemyId,
        archetype: Archetype,
        x: f32,
        y: f32,
        tuning: &EnemyTuning,
    ) -> Self {
        let profile = tuning.profile(archetype);
        let size = tuning.base_size * profile.size_multiplier;
        Self {
            id,
            archetype,
            body: Body::new(x, y, size, size),
            max_health: profile.health,
            health: profile.health,
            damage: profile.damage,
            speed: profile.speed,
            experience: profile.experience,
            attack_range: profile.attack_range,
            attack_cooldown: profile.attack_cooldown,
            attack_timer: 0.0,
            fire_timer: tuning.shaman_projectile_cooldown,
            target: None,
        }
    }

    /// Center of the current target plus whether it is still alive, or
    /// `None` when no target is held or the targeted ally is gone.
    fn target_center(&self, player: &Player, allies: &[Ally]) -> Option<(f32, f32, bool)> {
        match self.target {
            None => None,
            Some(TargetRef::Player) => {
                let (x, y) = player.body.center();
                Some((x, y, player.body.active && player.health > 0.0))
            }
            Some(TargetRef::Ally(id)) => allies
                .iter()
                .find(|ally| ally.id == id)
                .map(|ally| {
                    let (x, y) = ally.body.center();
                    (x, y, ally.body.active && ally.health > 0.0)
                }),
        }
    }

    /// Ticks combat timers and moves according to the archetype's behavior.
    pub fn update(&mut self, dt: f32, player: &Player, allies: &[Ally], tuning: &Tuning) {
        self.attack_timer += dt;
        if self.archetype == Archetype::Shaman {
            self.fire_timer += dt;
        }
        if self.target.is_none() {
            return;
        }
        let Some((target_x, target_y, alive)) = self.target_center(player, allies) else {
            self.drop_target();
            return;
        };
        if !alive {
            self.drop_target();
            return;
        }
        if self.archetype == Archetype::Shaman {
            self.keep_distance(dt, target_x, target_y, tuning);
        } else {
            self.chase(dt, target_x, target_y, &tuning.arena);
        }
    }

    fn drop_target(&mut self) {
        self.target = None;
        self.body.vx = 0.0;
        self.body.vy = 0.0;
    }

    /// Melee movement: close until the target is inside attack range, then
    /// hold position.
    fn chase(&mut self, dt: f32, target_x: f32, target_y: f32, arena: &ArenaTuning) {
        let (center_x, center_y) = self.body.center();
        let dx = target_x - center_x;
        let dy = target_y - center_y;
        let distance_sq = dx * dx + dy * dy;
        let range_sq = self.attack_range * self.attack_range;
        if distance_sq > range_sq {
            let distance = distance_sq.sqrt();
            self.body.vx = dx / distance * self.speed;
            self.body.vy = dy / distance * self.speed;
            self.body.integrate(dt);
        } else {
            self.body.vx = 0.0;
            self.body.vy = 0.0;
        }
        self.body.confine(arena);
    }

    /// Shaman movement: flee below the preferred distance, drift closer at
    /// half speed when too far, hold in between.
    fn keep_distance(&mut self, dt: f32, target_x: f32, target_y: f32, tuning: &Tuning) {
        let (center_x, center_y) = self.body.center();
        let dx = target_x - center_x;
        let dy = target_y - center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance < tuning.enemies.shaman_preferred_distance {
            // Overlapping centers degenerate; retreat along a fixed axis.
            let (away_x, away_y) = if distance > 0.0 {
                (-dx / distance, -dy / distance)
            } else {
                (1.0, 0.0)
            };
            self.body.vx = away_x * self.speed;
            self.body.vy = away_y * self.speed;
            self.body.integrate(dt);
        } else if distance > self.attack_range {
            self.body.vx = dx / distance * self.speed * 0.5;
            self.body.vy = dy / distance * self.speed * 0.5;
            self.body.integrate(dt);
        } else {
            self.body.vx = 0.0;
            self.body.vy = 0.0;
        }
        self.body.confine(&tuning.arena);
    }

    /// Locks onto the closest active combatant, preferring the player on
    /// ties. Keeps the current target when nothing is in reach.
    pub fn find_closest_target(&mut self, player: &Player, allies: &[Ally]) {
        let (center_x, center_y) = self.body.center();
        let mut closest: Option<TargetRef> = None;
        let mut min_distance_sq = f32::INFINITY;
        if player.body.active {
            let (x, y) = player.body.center();
            let dx = x - center_x;
            let dy = y - center_y;
            min_distance_sq = dx * dx + dy * dy;
            closest = Some(TargetRef::Player);
        }
        for ally in allies {
            if !ally.body.active {
                continue;
            }
            let (x, y) = ally.body.center();
            let dx = x - center_x;
            let dy = y - center_y;
            let distance_sq = dx * dx + dy * dy;
            if distance_sq < min_distance_sq {
                min_distance_sq = distance_sq;
                closest = Some(TargetRef::Ally(ally.id));
            }
        }
        if closest.is_some() {
            self.target = closest;
        }
    }

    /// Launches a projectile at the current target if this is a shaman with
    /// a live target and a ready cooldown. The cooldown rearms only when a
    /// projectile actually launches.
    pub fn try_fire(
        &mut self,
        player: &Player,
        allies: &[Ally],
        tuning: &Tuning,
    ) -> Option<Projectile> {
        if self.archetype != Archetype::Shaman {
            return None;
        }
        let Some((target_x, target_y, alive)) = self.target_center(player, allies) else {
            self.target = None;
            return None;
        };
        if !alive {
            self.target = None;
            return None;
        }
        if self.fire_timer < tuning.enemies.shaman_projectile_cooldown {
            return None;
        }
        let (center_x, center_y) = self.body.center();
        let dx = target_x - center_x;
        let dy = target_y - center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance == 0.0 {
            return None;
        }
        self.fire_timer = 0.0;
        let speed = tuning.enemies.shaman_projectile_speed;
        Some(Projectile::new(
            center_x,
            center_y,
            dx / distance * speed,
            dy / distance * speed,
            self.damage,
            ProjectileSource::Enemy,
            &tuning.projectiles,
        ))
    }

    /// Reports whether a melee strike would land right now. Range is
    /// measured center to center and includes the boundary.
    #[must_use]
    pub fn can_attack(&self, player: &Player, allies: &[Ally]) -> bool {
        let Some((target_x, target_y, _)) = self.target_center(player, allies) else {
            return false;
        };
        let (center_x, center_y) = self.body.center();
        let dx = target_x - center_x;
        let dy = target_y - center_y;
        let distance_sq = dx * dx + dy * dy;
        distance_sq <= self.attack_range * self.attack_range
            && self.attack_timer >= self.attack_cooldown
    }

    /// Commits a melee strike, rearming the cooldown. Returns whether the
    /// strike landed.
    pub fn attack(&mut self, player: &Player, allies: &[Ally]) -> bool {
        if self.can_attack(player, allies) {
            self.attack_timer = 0.0;
            true
        } else {
            false
        }
    }

    /// Removes health and reports whether this killed the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health -= amount;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.body.active = false;
            return true;
        }
        false
    }
}
