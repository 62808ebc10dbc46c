use gravetide_core::tuning::{AllyTuning, Tuning};
use gravetide_core::{AllyId, Archetype, DefeatRecord, EnemyId, ProjectileSource};

use crate::enemy::Enemy;
use crate::player::Player;
use crate::projectile::Projectile;
use crate::Body;

/// Behavior state an allied unit is in.
///
/// The mode is committed when the unit updates and read back by target
/// acquisition on the next frame, so a melee unit whose target just died
/// follows for one full frame before it may re-engage. Shamans enter
/// [`AllyMode::Escort`] at conversion and never leave it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllyMode {
    /// Trailing the player with no enemy engaged.
    Follow,
    /// Engaging a locked enemy.
    Attack,
    /// Trailing the player while firing over the flock; shamans only.
    Escort,
}

/// A defeated enemy fighting for the player.
///
/// Allies inherit the archetype, size, and speed of the enemy they were
/// converted from, with damage scaled down. Melee archetypes alternate
/// between escorting and engaging; shamans always escort and fire over the
/// flock on their own cooldown.
#[derive(Clone, Debug, PartialEq)]
pub struct Ally {
    /// Identifier assigned at conversion, unique for the run.
    pub id: AllyId,
    /// Archetype carried over from the defeated enemy.
    pub archetype: Archetype,
    /// Movement state.
    pub body: Body,
    /// Upper bound for [`Ally::health`].
    pub max_health: f32,
    /// Current health. The ally dies at zero.
    pub health: f32,
    /// Damage dealt per melee strike or carried per projectile.
    pub damage: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Seconds since the last melee strike.
    pub attack_timer: f32,
    /// Seconds since the last projectile. Starts ready so converted
    /// shamans fire as soon as an enemy is in reach.
    pub fire_timer: f32,
    /// Behavior state committed by the last update.
    pub mode: AllyMode,
    /// Enemy currently engaged, if any.
    pub target: Option<EnemyId>,
    /// Horizontal coordinate of the smoothed escort point.
    pub follow_x: f32,
    /// Vertical coordinate of the smoothed escort point.
    pub follow_y: f32,
}

impl Ally {
    /// Builds an ally from the stat snapshot of a defeated enemy.
    #[must_use]
    pub fn from_defeated(id: AllyId, record: &DefeatRecord, tuning: &AllyTuning) -> Self {
        Self {
            id,
            archetype: record.archetype,
            body: Body::new(record.x, record.y, record.width, record.height),
            max_health: record.max_health,
            health: record.max_health,
            damage: (record.damage * tuning.damage_scale).floor(),
            speed: record.speed,
            attack_timer: 0.0,
            fire_timer: tuning.shaman_fire_cooldown,
            mode: if record.archetype == Archetype::Shaman {
                AllyMode::Escort
            } else {
                AllyMode::Follow
            },
            target: None,
            follow_x: record.x,
            follow_y: record.y,
        }
    }

    /// Runs one frame of behavior.
    ///
    /// `before` and `after` are the army slices on either side of this
    /// unit, used for separation. Shamans may return a projectile to add
    /// to the ally group.
    pub fn update(
        &mut self,
        dt: f32,
        player: &Player,
        enemies: &mut [Enemy],
        before: &[Ally],
        after: &[Ally],
        tuning: &Tuning,
    ) -> Option<Projectile> {
        self.attack_timer += dt;
        if self.archetype == Archetype::Shaman {
            self.fire_timer += dt;
            self.mode = AllyMode::Escort;
            self.target = None;
            self.follow_owner(dt, player, before, after, &tuning.allies);
            return self.try_fire(enemies, tuning);
        }

        let target_alive = self
            .target
            .and_then(|id| enemies.iter().find(|enemy| enemy.id == id))
            .map_or(false, |enemy| enemy.body.active);
        if target_alive {
            self.mode = AllyMode::Attack;
            self.attack_target(dt, enemies, &tuning.allies);
        } else {
            self.mode = AllyMode::Follow;
            self.target = None;
            self.follow_owner(dt, player, before, after, &tuning.allies);
        }
        None
    }

    /// Close on the locked enemy and strike once in range and off cooldown.
    /// Kills are silent; the defeat pipeline only runs for projectiles.
    fn attack_target(&mut self, dt: f32, enemies: &mut [Enemy], tuning: &AllyTuning) {
        let Some(target_id) = self.target else {
            self.body.vx = 0.0;
            self.body.vy = 0.0;
            return;
        };
        let Some(enemy) = enemies.iter_mut().find(|enemy| enemy.id == target_id) else {
            self.target = None;
            self.body.vx = 0.0;
            self.body.vy = 0.0;
            return;
        };
        if !enemy.body.active {
            self.target = None;
            self.body.vx = 0.0;
            self.body.vy = 0.0;
            return;
        }

        let (target_x, target_y) = enemy.body.center();
        let (center_x, center_y) = self.body.center();
        let dx = target_x - center_x;
        let dy = target_y - center_y;
        let distance_sq = dx * dx + dy * dy;
        let range_sq = tuning.attack_range * tuning.attack_range;
        if distance_sq > range_sq {
            let distance = distance_sq.sqrt();
            self.body.vx = dx / distance * self.speed;
            self.body.vy = dy / distance * self.speed;
            self.body.integrate(dt);
        } else {
            self.body.vx = 0.0;
            self.body.vy = 0.0;
            if self.attack_timer >= tuning.attack_cooldown {
                let died = enemy.take_damage(self.damage);
                self.attack_timer = 0.0;
                if died {
                    self.target = None;
                }
            }
        }
    }

    /// Trail the player through a smoothed escort point, spreading out from
    /// flock neighbors.
    fn follow_owner(
        &mut self,
        dt: f32,
        player: &Player,
        before: &[Ally],
        after: &[Ally],
        tuning: &AllyTuning,
    ) {
        let (owner_x, owner_y) = player.body.center();
        self.follow_x += (owner_x - self.follow_x) * tuning.follow_smoothing;
        self.follow_y += (owner_y - self.follow_y) * tuning.follow_smoothing;

        let (center_x, center_y) = self.body.center();
        let dx = self.follow_x - center_x;
        let dy = self.follow_y - center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        let (separation_x, separation_y) = self.separation(before, after, tuning);

        if distance > tuning.follow_distance {
            self.body.vx = dx / distance * self.speed + separation_x;
            self.body.vy = dy / distance * self.speed + separation_y;
        } else {
            self.body.vx = separation_x;
            self.body.vy = separation_y;
        }
        self.body.integrate(dt);
    }

    /// Averaged push away from every active neighbor inside the separation
    /// radius, stronger the closer the neighbor.
    fn separation(&self, before: &[Ally], after: &[Ally], tuning: &AllyTuning) -> (f32, f32) {
        let (center_x, center_y) = self.body.center();
        let radius_sq = tuning.separation_radius * tuning.separation_radius;
        let mut push_x = 0.0;
        let mut push_y = 0.0;
        let mut neighbors = 0;
        for other in before.iter().chain(after.iter()) {
            if !other.body.active {
                continue;
            }
            let (other_x, other_y) = other.body.center();
            let dx = center_x - other_x;
            let dy = center_y - other_y;
            let distance_sq = dx * dx + dy * dy;
            if distance_sq > 0.0 && distance_sq < radius_sq {
                let distance = distance_sq.sqrt();
                let force =
                    tuning.separation_force * (1.0 - distance / tuning.separation_radius);
                push_x += dx / distance * force;
                push_y += dy / distance * force;
                neighbors += 1;
            }
        }
        if neighbors > 0 {
            push_x /= neighbors as f32;
            push_y /= neighbors as f32;
        }
        (push_x, push_y)
    }

    /// Locks onto the nearest active enemy inside detection range, or
    /// clears the lock when none qualifies.
    pub fn find_nearest_enemy(&mut self, enemies: &[Enemy], tuning: &AllyTuning) {
        let (center_x, center_y) = self.body.center();
        let mut nearest = None;
        let mut min_distance = f32::INFINITY;
        for enemy in enemies {
            if !enemy.body.active {
                continue;
            }
            let (enemy_x, enemy_y) = enemy.body.center();
            let dx = enemy_x - center_x;
            let dy = enemy_y - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance < min_distance && distance < tuning.detection_range {
                min_distance = distance;
                nearest = Some(enemy.id);
            }
        }
        self.target = nearest;
    }

    /// Fires at the nearest detectable enemy once the cooldown is ready.
    /// The cooldown rearms only when a projectile actually launches.
    fn try_fire(&mut self, enemies: &[Enemy], tuning: &Tuning) -> Option<Projectile> {
        if self.fire_timer < tuning.allies.shaman_fire_cooldown {
            return None;
        }
        let (center_x, center_y) = self.body.center();
        let mut nearest: Option<(f32, f32)> = None;
        let mut min_distance = f32::INFINITY;
        for enemy in enemies {
            if !enemy.body.active {
                continue;
            }
            let (enemy_x, enemy_y) = enemy.body.center();
            let dx = enemy_x - center_x;
            let dy = enemy_y - center_y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance < min_distance && distance < tuning.allies.detection_range {
                min_distance = distance;
                nearest = Some((enemy_x, enemy_y));
            }
        }
        let (target_x, target_y) = nearest?;

        let dx = target_x - center_x;
        let dy = target_y - center_y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance == 0.0 {
            return None;
        }
        self.fire_timer = 0.0;
        let speed = tuning.allies.shaman_projectile_speed;
        Some(Projectile::new(
            center_x,
            center_y,
            dx / distance * speed,
            dy / distance * speed,
            self.damage,
            ProjectileSource::Ally,
            &tuning.projectiles,
        ))
    }

    /// Restores health up to the maximum. Dead allies stay dead.
    pub fn heal(&mut self, amount: f32) {
        if !self.body.active {
            return;
        }
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Removes health and reports whether this killed the ally. Damage to
    /// an already dead ally is ignored.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.body.active {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.body.active = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use gravetide_core::tuning::Tuning;
    use gravetide_core::{AllyId, Archetype, DefeatRecord, EnemyId};

    use super::{Ally, AllyMode};
    use crate::enemy::Enemy;
    use crate::player::Player;

    fn record(archetype: Archetype, x: f32, y: f32) -> DefeatRecord {
        DefeatRecord {
            enemy: EnemyId::new(7),
            archetype,
            x,
            y,
            width: 28.0,
            height: 28.0,
            max_health: 30.0,
            damage: 8.0,
            speed: 80.0,
            experience: 10,
        }
    }

    fn ally(archetype: Archetype, x: f32, y: f32, tuning: &Tuning) -> Ally {
        Ally::from_defeated(AllyId::new(1), &record(archetype, x, y), &tuning.allies)
    }

    #[test]
    fn conversion_floors_scaled_damage() {
        let tuning = Tuning::default();
        let converted = ally(Archetype::Warrior, 0.0, 0.0, &tuning);

        assert_eq!(converted.damage, 5.0);
        assert_eq!(converted.health, 30.0);
        assert_eq!(converted.mode, AllyMode::Follow);
    }

    #[test]
    fn escort_closes_distant_gaps() {
        let tuning = Tuning::default();
        let player = Player::new(&tuning);
        let (px, py) = player.body.center();

        // The escort point trails from the spawn position, so the unit only
        // starts moving once the point has drifted ahead of it.
        let mut escort = ally(Archetype::Warrior, px - 400.0, py, &tuning);
        let before = escort.body.rect.x;
        for _ in 0..40 {
            let _ = escort.update(0.1, &player, &mut [], &[], &[], &tuning);
        }

        assert!(escort.body.rect.x > before + 100.0);
    }

    #[test]
    fn escort_rests_inside_follow_distance() {
        let tuning = Tuning::default();
        let player = Player::new(&tuning);
        let (px, py) = player.body.center();

        let mut escort = ally(Archetype::Warrior, px - 30.0 - 14.0, py - 14.0, &tuning);
        escort.follow_x = px;
        escort.follow_y = py;
        let _ = escort.update(0.1, &player, &mut [], &[], &[], &tuning);

        assert_eq!(escort.body.vx, 0.0);
        assert_eq!(escort.body.vy, 0.0);
    }

    #[test]
    fn crowded_escorts_push_apart() {
        let tuning = Tuning::default();
        let player = Player::new(&tuning);
        let (px, py) = player.body.center();

        let mut escort = ally(Archetype::Warrior, px - 14.0, py - 14.0, &tuning);
        escort.follow_x = px;
        escort.follow_y = py;
        // Centers sit half a separation radius apart, so the push carries
        // half the separation force.
        let neighbor = ally(Archetype::Warrior, px - 14.0 + 20.0, py - 14.0, &tuning);

        let _ = escort.update(0.1, &player, &mut [], &[neighbor], &[], &tuning);
        assert_eq!(escort.body.vx, -40.0, "pushed away from the neighbor");
        assert_eq!(escort.body.vy, 0.0);
    }

    #[test]
    fn engaged_ally_strikes_and_forgets_dead_targets() {
        let tuning = Tuning::default();
        let player = Player::new(&tuning);
        let mut enemies = vec![Enemy::spawn(
            EnemyId::new(3),
            Archetype::Warrior,
            100.0,
            100.0,
            &tuning.enemies,
        )];
        enemies[0].health = 4.0;

        let mut attacker = ally(Archetype::Warrior, 100.0, 100.0, &tuning);
        attacker.target = Some(EnemyId::new(3));
        attacker.attack_timer = 2.0;

        let _ = attacker.update(0.016, &player, &mut enemies, &[], &[], &tuning);
        assert_eq!(attacker.mode, AllyMode::Attack);
        assert_eq!(attacker.attack_timer, 0.0);
        assert!(!enemies[0].body.active);
        assert_eq!(attacker.target, None);
    }

    #[test]
    fn strikes_wait_for_the_cooldown() {
        let tuning = Tuning::default();
        let player = Player::new(&tuning);
        let mut enemies = vec![Enemy::spawn(
            EnemyId::new(3),
            Archetype::Warrior,
            100.0,
            100.0,
            &tuning.enemies,
        )];

        let mut attacker = ally(Archetype::Warrior, 100.0, 100.0, &tuning);
        attacker.target = Some(EnemyId::new(3));

        let _ = attacker.update(0.016, &player, &mut enemies, &[], &[], &tuning);
        assert_eq!(enemies[0].health, 30.0);
        assert_eq!(attacker.target, Some(EnemyId::new(3)));
    }

    #[test]
    fn detection_range_bounds_target_acquisition() {
        let tuning = Tuning::default();
        let far = Enemy::spawn(
            EnemyId::new(5),
            Archetype::Warrior,
            500.0,
            0.0,
            &tuning.enemies,
        );

        let mut scout = ally(Archetype::Warrior, 0.0, 0.0, &tuning);
        scout.target = Some(EnemyId::new(99));
        scout.find_nearest_enemy(&[far.clone()], &tuning.allies);
        assert_eq!(scout.target, None, "beyond detection range");

        let near = Enemy::spawn(
            EnemyId::new(6),
            Archetype::Warrior,
            200.0,
            0.0,
            &tuning.enemies,
        );
        scout.find_nearest_enemy(&[far, near], &tuning.allies);
        assert_eq!(scout.target, Some(EnemyId::new(6)));
    }

    #[test]
    fn converted_shaman_fires_while_escorting() {
        let tuning = Tuning::default();
        let player = Player::new(&tuning);
        let mut enemies = vec![Enemy::spawn(
            EnemyId::new(4),
            Archetype::Warrior,
            300.0,
            100.0,
            &tuning.enemies,
        )];

        let mut shaman = ally(Archetype::Shaman, 100.0, 100.0, &tuning);
        let projectile = shaman.update(0.016, &player, &mut enemies, &[], &[], &tuning);

        assert_eq!(shaman.mode, AllyMode::Escort);
        assert_eq!(shaman.fire_timer, 0.0);
        let Some(projectile) = projectile else {
            panic!("escorting shaman should have fired");
        };
        assert!(projectile.body.vx > 0.0);
        assert_eq!(projectile.damage, 5.0);

        // No second shot until the cooldown rearms.
        assert!(shaman
            .update(0.016, &player, &mut enemies, &[], &[], &tuning)
            .is_none());
    }

    #[test]
    fn dead_allies_ignore_healing_and_damage() {
        let tuning = Tuning::default();
        let mut casualty = ally(Archetype::Warrior, 0.0, 0.0, &tuning);
        assert!(casualty.take_damage(30.0));

        casualty.heal(50.0);
        assert_eq!(casualty.health, 0.0);
        assert!(!casualty.take_damage(10.0));
    }
}
