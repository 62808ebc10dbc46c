#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Contact resolution for one simulation frame.
//!
//! The resolver runs five passes in a fixed order: player projectiles
//! against enemies, ally projectiles against enemies, melee enemies against
//! the player, melee enemies against the army, and enemy projectiles
//! against player and army. Later passes observe the casualties of earlier
//! ones within the same frame.

use gravetide_core::{DamageCause, DefeatRecord, EventBus, GameEvent, GameOverReason};
use gravetide_world::{Ally, Combatants, Enemy, Player, Projectile, TargetRef};

/// Resolves all five collision passes over borrowed world collections.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    projectile_contacts: Vec<(usize, usize)>,
    player_contacts: Vec<usize>,
}

impl CollisionResolver {
    /// Creates a resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the five passes and reports the first defeat reason, if any.
    ///
    /// Every enemy killed by a projectile is appended to `defeats` so the
    /// caller can run experience grants and conversion afterwards. Melee
    /// kills by allies never reach this pipeline.
    pub fn resolve(
        &mut self,
        combatants: Combatants<'_>,
        bus: &mut EventBus,
        defeats: &mut Vec<DefeatRecord>,
    ) -> Option<GameOverReason> {
        let Combatants {
            player,
            enemies,
            army,
            player_projectiles,
            ally_projectiles,
            enemy_projectiles,
        } = combatants;

        self.resolve_player_projectiles(player_projectiles, enemies, bus, defeats);
        resolve_ally_projectiles(ally_projectiles, enemies, bus, defeats);
        let mut game_over = self.resolve_melee_on_player(enemies, player, army, bus);
        resolve_melee_on_army(enemies, player, army, bus);
        let by_projectile = resolve_enemy_projectiles(enemy_projectiles, player, army, bus);
        if game_over.is_none() {
            game_over = by_projectile;
        }
        game_over
    }

    /// Pass one. Contacts are collected first and resolved afterwards, so
    /// two projectiles overlapping the same enemy this frame both register
    /// before either lands; a pair whose projectile or enemy died during
    /// resolution is dropped without spending the projectile.
    fn resolve_player_projectiles(
        &mut self,
        projectiles: &mut [Projectile],
        enemies: &mut [Enemy],
        bus: &mut EventBus,
        defeats: &mut Vec<DefeatRecord>,
    ) {
        self.projectile_contacts.clear();
        for (projectile_index, projectile) in projectiles.iter().enumerate() {
            if !projectile.body.active {
                continue;
            }
            for (enemy_index, enemy) in enemies.iter().enumerate() {
                if !enemy.body.active {
                    continue;
                }
                if projectile.body.rect.overlaps(&enemy.body.rect) {
                    self.projectile_contacts.push((projectile_index, enemy_index));
                }
            }
        }

        for &(projectile_index, enemy_index) in &self.projectile_contacts {
            let projectile = &mut projectiles[projectile_index];
            let enemy = &mut enemies[enemy_index];
            if !projectile.body.active || !enemy.body.active {
                continue;
            }
            strike_enemy(projectile, enemy, bus, defeats);
        }
    }

    /// Pass three. Contact enemies strike the player when their own attack
    /// gate opens; the gate measures range to the enemy's current target,
    /// which is not necessarily the player it is standing on.
    fn resolve_melee_on_player(
        &mut self,
        enemies: &mut [Enemy],
        player: &mut Player,
        army: &[Ally],
        bus: &mut EventBus,
    ) -> Option<GameOverReason> {
        self.player_contacts.clear();
        for (enemy_index, enemy) in enemies.iter().enumerate() {
            if !enemy.body.active {
                continue;
            }
            if enemy.body.rect.overlaps(&player.body.rect) {
                self.player_contacts.push(enemy_index);
            }
        }

        let mut game_over = None;
        for &enemy_index in &self.player_contacts {
            let enemy = &mut enemies[enemy_index];
            if !enemy.attack(player, army) {
                continue;
            }
            player.take_damage(enemy.damage);
            bus.emit(&GameEvent::PlayerDamaged {
                damage: enemy.damage,
                health_after: player.health,
                cause: DamageCause::EnemyContact { enemy: enemy.id },
            });
            if !player.body.active {
                bus.emit(&GameEvent::GameOver {
                    reason: GameOverReason::Defeated,
                });
                if game_over.is_none() {
                    game_over = Some(GameOverReason::Defeated);
                }
            }
        }
        game_over
    }
}

/// Pass two. Each ally projectile spends itself on the first active enemy
/// it overlaps.
fn resolve_ally_projectiles(
    projectiles: &mut [Projectile],
    enemies: &mut [Enemy],
    bus: &mut EventBus,
    defeats: &mut Vec<DefeatRecord>,
) {
    for projectile in projectiles.iter_mut() {
        if !projectile.body.active {
            continue;
        }
        for enemy in enemies.iter_mut() {
            if !enemy.body.active {
                continue;
            }
            if projectile.body.rect.overlaps(&enemy.body.rect) {
                strike_enemy(projectile, enemy, bus, defeats);
                break;
            }
        }
    }
}

/// Pass four. Contact enemies strike overlapped allies through the same
/// attack gate as pass three; a single enemy keeps scanning the whole army
/// even after landing a strike, though its rearmed cooldown blocks further
/// hits this frame.
fn resolve_melee_on_army(
    enemies: &mut [Enemy],
    player: &Player,
    army: &mut [Ally],
    bus: &mut EventBus,
) {
    for enemy_index in 0..enemies.len() {
        if !enemies[enemy_index].body.active {
            continue;
        }
        for ally_index in 0..army.len() {
            if !army[ally_index].body.active {
                continue;
            }
            if !enemies[enemy_index]
                .body
                .rect
                .overlaps(&army[ally_index].body.rect)
            {
                continue;
            }
            if !enemies[enemy_index].attack(player, army) {
                continue;
            }
            let damage = enemies[enemy_index].damage;
            let died = army[ally_index].take_damage(damage);
            bus.emit(&GameEvent::AllyDamaged {
                enemy: enemies[enemy_index].id,
                ally: army[ally_index].id,
                damage,
                died,
            });
            if died && enemies[enemy_index].target == Some(TargetRef::Ally(army[ally_index].id)) {
                enemies[enemy_index].target = None;
            }
        }
    }
}

/// Pass five. Enemy projectiles test the player first, then fall through
/// to the army. Impact is a circle test around the projectile's stored
/// position.
fn resolve_enemy_projectiles(
    projectiles: &mut [Projectile],
    player: &mut Player,
    army: &mut [Ally],
    bus: &mut EventBus,
) -> Option<GameOverReason> {
    let mut game_over = None;
    for projectile in projectiles.iter_mut() {
        if !projectile.body.active {
            continue;
        }
        let radius = projectile.body.rect.width / 2.0;
        if player.body.active
            && player.body.rect.intersects_circle(
                projectile.body.rect.x,
                projectile.body.rect.y,
                radius,
            )
        {
            projectile.body.active = false;
            player.take_damage(projectile.damage);
            bus.emit(&GameEvent::PlayerDamaged {
                damage: projectile.damage,
                health_after: player.health,
                cause: DamageCause::EnemyProjectile,
            });
            if !player.body.active {
                bus.emit(&GameEvent::GameOver {
                    reason: GameOverReason::DefeatedByProjectile,
                });
                if game_over.is_none() {
                    game_over = Some(GameOverReason::DefeatedByProjectile);
                }
            }
            continue;
        }
        for ally in army.iter_mut() {
            if !ally.body.active {
                continue;
            }
            if ally.body.rect.intersects_circle(
                projectile.body.rect.x,
                projectile.body.rect.y,
                radius,
            ) {
                projectile.body.active = false;
                let died = ally.take_damage(projectile.damage);
                bus.emit(&GameEvent::AllyHit {
                    ally: ally.id,
                    damage: projectile.damage,
                    died,
                });
                break;
            }
        }
    }
    game_over
}

/// Spends a projectile on an enemy, announcing the defeat before the hit.
fn strike_enemy(
    projectile: &mut Projectile,
    enemy: &mut Enemy,
    bus: &mut EventBus,
    defeats: &mut Vec<DefeatRecord>,
) {
    projectile.body.active = false;
    let died = enemy.take_damage(projectile.damage);
    if died {
        defeats.push(defeat_record(enemy));
        bus.emit(&GameEvent::EnemyDefeated {
            enemy: enemy.id,
            archetype: enemy.archetype,
            x: enemy.body.rect.x,
            y: enemy.body.rect.y,
            experience: enemy.experience,
        });
    }
    bus.emit(&GameEvent::ProjectileHit {
        source: projectile.source,
        target: enemy.id,
        damage: projectile.damage,
        x: projectile.body.rect.x,
        y: projectile.body.rect.y,
    });
}

fn defeat_record(enemy: &Enemy) -> DefeatRecord {
    DefeatRecord {
        enemy: enemy.id,
        archetype: enemy.archetype,
        x: enemy.body.rect.x,
        y: enemy.body.rect.y,
        width: enemy.body.rect.width,
        height: enemy.body.rect.height,
        max_health: enemy.max_health,
        damage: enemy.damage,
        speed: enemy.speed,
        experience: enemy.experience,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use gravetide_core::tuning::Tuning;
    use gravetide_core::{
        Archetype, DamageCause, DefeatRecord, EnemyId, EventBus, EventKind, GameEvent,
        GameOverReason, ProjectileSource,
    };
    use gravetide_world::{Projectile, World};

    use super::CollisionResolver;

    fn world() -> World {
        World::new(Tuning::default())
    }

    fn recorded(bus: &mut EventBus, kinds: &[EventKind]) -> Rc<RefCell<Vec<GameEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        for &kind in kinds {
            let sink = Rc::clone(&events);
            let _ = bus.on(kind, move |event| sink.borrow_mut().push(event.clone()));
        }
        events
    }

    fn projectile_at(
        world: &World,
        x: f32,
        y: f32,
        damage: f32,
        source: ProjectileSource,
    ) -> Projectile {
        Projectile::new(x, y, 0.0, 0.0, damage, source, &world.tuning().projectiles)
    }

    #[test]
    fn player_projectile_defeat_reports_before_the_hit() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();
        let events = recorded(
            &mut bus,
            &[EventKind::EnemyDefeated, EventKind::ProjectileHit],
        );

        let id = world.spawn_enemy(Archetype::Warrior, 100.0, 100.0);
        let shot = projectile_at(&world, 110.0, 110.0, 30.0, ProjectileSource::Player);
        world.combatants().player_projectiles.push(shot);

        let mut resolver = CollisionResolver::new();
        let outcome = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        assert_eq!(outcome, None);
        assert!(!world.player_projectiles()[0].body.active);
        assert!(!world.enemies()[0].body.active);
        assert_eq!(defeats.len(), 1);
        assert_eq!(defeats[0].enemy, id);
        assert_eq!(defeats[0].max_health, 30.0);

        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], GameEvent::EnemyDefeated { .. }));
        assert!(matches!(events[1], GameEvent::ProjectileHit { .. }));
    }

    #[test]
    fn second_projectile_survives_a_corpse_contact() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();

        let _ = world.spawn_enemy(Archetype::Warrior, 100.0, 100.0);
        for _ in 0..2 {
            let shot = projectile_at(&world, 110.0, 110.0, 30.0, ProjectileSource::Player);
            world.combatants().player_projectiles.push(shot);
        }

        let mut resolver = CollisionResolver::new();
        let _ = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        // Both contacts were collected, but the kill spends only the first.
        assert!(!world.player_projectiles()[0].body.active);
        assert!(world.player_projectiles()[1].body.active);
        assert_eq!(defeats.len(), 1);
    }

    #[test]
    fn ally_projectile_stops_at_the_first_enemy() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();

        let _ = world.spawn_enemy(Archetype::Warrior, 100.0, 100.0);
        let _ = world.spawn_enemy(Archetype::Warrior, 104.0, 100.0);
        let volley = projectile_at(&world, 102.0, 102.0, 5.0, ProjectileSource::Ally);
        world.combatants().ally_projectiles.push(volley);

        let mut resolver = CollisionResolver::new();
        let _ = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        assert_eq!(world.enemies()[0].health, 25.0);
        assert_eq!(world.enemies()[1].health, 30.0);
        assert!(!world.ally_projectiles()[0].body.active);
    }

    #[test]
    fn contact_strike_damages_the_player_once_per_cooldown() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();
        let events = recorded(&mut bus, &[EventKind::PlayerDamaged]);

        let (px, py) = world.player().body.center();
        let _ = world.spawn_enemy(Archetype::Warrior, px - 14.0, py - 14.0);
        world.combatants().enemies[0].attack_timer = 1.0;

        let mut resolver = CollisionResolver::new();
        let first = resolver.resolve(world.combatants(), &mut bus, &mut defeats);
        assert_eq!(first, None);
        assert_eq!(world.player().health, 95.0);

        // The cooldown has not recovered; the second frame is harmless.
        let second = resolver.resolve(world.combatants(), &mut bus, &mut defeats);
        assert_eq!(second, None);
        assert_eq!(world.player().health, 95.0);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        let GameEvent::PlayerDamaged { damage, health_after, cause } = events[0] else {
            panic!("expected a player damage event");
        };
        assert_eq!(damage, 5.0);
        assert_eq!(health_after, 95.0);
        assert!(matches!(cause, DamageCause::EnemyContact { .. }));
    }

    #[test]
    fn lethal_contact_ends_the_run() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();
        let events = recorded(&mut bus, &[EventKind::GameOver]);

        let (px, py) = world.player().body.center();
        let _ = world.spawn_enemy(Archetype::Warrior, px - 14.0, py - 14.0);
        {
            let combatants = world.combatants();
            combatants.enemies[0].attack_timer = 1.0;
            combatants.player.health = 3.0;
        }

        let mut resolver = CollisionResolver::new();
        let outcome = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        assert_eq!(outcome, Some(GameOverReason::Defeated));
        assert!(!world.player().body.active);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn engaged_enemy_strikes_the_overlapped_ally() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();
        let events = recorded(&mut bus, &[EventKind::AllyDamaged]);

        let record = DefeatRecord {
            enemy: EnemyId::new(50),
            archetype: Archetype::Warrior,
            x: 100.0,
            y: 100.0,
            width: 28.0,
            height: 28.0,
            max_health: 4.0,
            damage: 5.0,
            speed: 80.0,
            experience: 10,
        };
        let Some((ally_id, _)) = world.try_convert(&record) else {
            panic!("conversion should succeed with a free slot");
        };
        let _ = world.spawn_enemy(Archetype::Warrior, 104.0, 100.0);
        {
            let combatants = world.combatants();
            combatants.enemies[0].attack_timer = 1.0;
            combatants.enemies[0].target =
                Some(gravetide_world::TargetRef::Ally(ally_id));
        }

        let mut resolver = CollisionResolver::new();
        let _ = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        let GameEvent::AllyDamaged { ally, died, .. } = events[0] else {
            panic!("expected an ally damage event");
        };
        assert_eq!(ally, ally_id);
        assert!(died, "four health cannot survive a warrior strike");
        // Killing its own target releases the lock.
        assert_eq!(world.enemies()[0].target, None);
        assert!(defeats.is_empty(), "melee kills skip the defeat pipeline");
    }

    #[test]
    fn enemy_projectile_prefers_the_player() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();
        let events = recorded(&mut bus, &[EventKind::PlayerDamaged]);

        let record = DefeatRecord {
            enemy: EnemyId::new(50),
            archetype: Archetype::Warrior,
            x: world.player().body.rect.x - 4.0,
            y: world.player().body.rect.y - 4.0,
            width: 28.0,
            height: 28.0,
            max_health: 30.0,
            damage: 5.0,
            speed: 80.0,
            experience: 10,
        };
        let _ = world.try_convert(&record);

        let (px, py) = world.player().body.center();
        let bolt = projectile_at(&world, px, py, 7.0, ProjectileSource::Enemy);
        world.combatants().enemy_projectiles.push(bolt);

        let mut resolver = CollisionResolver::new();
        let _ = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        assert_eq!(world.player().health, 93.0);
        assert_eq!(world.army()[0].health, 30.0);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn enemy_projectile_falls_through_to_the_army() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();
        let events = recorded(&mut bus, &[EventKind::AllyHit]);

        let record = DefeatRecord {
            enemy: EnemyId::new(50),
            archetype: Archetype::Warrior,
            x: 100.0,
            y: 100.0,
            width: 28.0,
            height: 28.0,
            max_health: 30.0,
            damage: 5.0,
            speed: 80.0,
            experience: 10,
        };
        let _ = world.try_convert(&record);

        let bolt = projectile_at(&world, 110.0, 110.0, 7.0, ProjectileSource::Enemy);
        world.combatants().enemy_projectiles.push(bolt);

        let mut resolver = CollisionResolver::new();
        let _ = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        assert_eq!(world.player().health, 100.0);
        assert_eq!(world.army()[0].health, 23.0);
        assert!(!world.enemy_projectiles()[0].body.active);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        let GameEvent::AllyHit { died, .. } = events[0] else {
            panic!("expected an ally hit event");
        };
        assert!(!died);
    }

    #[test]
    fn lethal_projectile_reports_its_own_reason() {
        let mut world = world();
        let mut bus = EventBus::new();
        let mut defeats = Vec::new();

        world.combatants().player.health = 2.0;
        let (px, py) = world.player().body.center();
        let bolt = projectile_at(&world, px, py, 7.0, ProjectileSource::Enemy);
        world.combatants().enemy_projectiles.push(bolt);

        let mut resolver = CollisionResolver::new();
        let outcome = resolver.resolve(world.combatants(), &mut bus, &mut defeats);

        assert_eq!(outcome, Some(GameOverReason::DefeatedByProjectile));
    }
}
