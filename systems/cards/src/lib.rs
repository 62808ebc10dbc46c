#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Upgrade card offers and effects.
//!
//! On every level up the player is offered a handful of cards drawn from a
//! fixed library. A rarity tier is rolled per slot from level-dependent
//! weights, then a card of that tier is picked uniformly from whatever the
//! offer has not claimed yet. Applying a card mutates the player once; the
//! player's applied set makes repeat applications silent no-ops.

use gravetide_core::{CardKind, EventBus, GameEvent, Rarity};
use gravetide_world::Player;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Every card in the game, in offer-filter order.
pub const LIBRARY: [CardKind; 16] = [
    CardKind::DarkFire,
    CardKind::InfernalFlames,
    CardKind::SpectralCalling,
    CardKind::ShadowLegion,
    CardKind::NecroticVigor,
    CardKind::VitalEssence,
    CardKind::Frenzy,
    CardKind::ArcaneStorm,
    CardKind::PhantomStep,
    CardKind::SpectralWind,
    CardKind::SoulHarvest,
    CardKind::Regeneration,
    CardKind::UltimatePower,
    CardKind::BloodAwakening,
    CardKind::VitalBond,
    CardKind::SoulMaster,
];

/// Rolls card offers and applies card effects to the player.
#[derive(Debug)]
pub struct CardSystem {
    rng: ChaCha8Rng,
}

impl CardSystem {
    /// Creates a card system with its own seeded roll stream.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws an offer of up to `count` distinct cards for the given level.
    ///
    /// Each slot rolls a rarity and picks uniformly among cards of that
    /// tier not yet in the offer whose gate condition holds. The offer
    /// ends early when a roll finds no candidate, so it may come up short.
    pub fn generate_offer(&mut self, count: usize, level: u32, player: &Player) -> Vec<CardKind> {
        let mut offer: Vec<CardKind> = Vec::new();
        while offer.len() < count {
            let rarity = self.roll_rarity(level);
            let pool: Vec<CardKind> = LIBRARY
                .iter()
                .copied()
                .filter(|card| {
                    !offer.contains(card)
                        && card.rarity() == rarity
                        && condition_holds(*card, player)
                })
                .collect();
            if pool.is_empty() {
                break;
            }
            let index = (self.rng.gen::<f32>() * pool.len() as f32) as usize;
            offer.push(pool[index]);
        }
        offer
    }

    /// Applies a card's effect to the player, exactly once per run.
    ///
    /// Returns whether the effect landed. A card already in the player's
    /// applied set is skipped silently, without an event.
    pub fn apply(&mut self, card: CardKind, player: &mut Player, bus: &mut EventBus) -> bool {
        if player.applied_cards.contains(&card) {
            return false;
        }
        apply_effect(card, player);
        let _ = player.applied_cards.insert(card);
        bus.emit(&GameEvent::CardApplied { card });
        true
    }

    /// Rolls a rarity tier from the level's weight table.
    fn roll_rarity(&mut self, level: u32) -> Rarity {
        let weights = rarity_weights(level);
        let total: f32 = weights.iter().map(|&(_, weight)| weight).sum();
        let mut roll = self.rng.gen::<f32>() * total;
        for &(rarity, weight) in &weights {
            roll -= weight;
            if roll <= 0.0 {
                return rarity;
            }
        }
        Rarity::Common
    }
}

/// Weight table for the four rarity tiers, shifting twice as the player
/// levels.
fn rarity_weights(level: u32) -> [(Rarity, f32); 4] {
    if level >= 10 {
        [
            (Rarity::Common, 30.0),
            (Rarity::Rare, 40.0),
            (Rarity::Epic, 20.0),
            (Rarity::Legendary, 10.0),
        ]
    } else if level >= 5 {
        [
            (Rarity::Common, 45.0),
            (Rarity::Rare, 35.0),
            (Rarity::Epic, 15.0),
            (Rarity::Legendary, 5.0),
        ]
    } else {
        [
            (Rarity::Common, 60.0),
            (Rarity::Rare, 25.0),
            (Rarity::Epic, 12.0),
            (Rarity::Legendary, 3.0),
        ]
    }
}

/// Gate conditions for cards that depend on player state.
fn condition_holds(card: CardKind, player: &Player) -> bool {
    match card {
        CardKind::BloodAwakening => !player.healing_unlocked,
        CardKind::VitalBond => player.healing_unlocked,
        _ => true,
    }
}

fn apply_effect(card: CardKind, player: &mut Player) {
    match card {
        CardKind::DarkFire => player.damage += 5.0,
        CardKind::InfernalFlames => player.damage += 15.0,
        CardKind::SpectralCalling => player.base_army_capacity += 3,
        CardKind::ShadowLegion => player.base_army_capacity += 8,
        CardKind::NecroticVigor => {
            player.max_health += 25.0;
            player.health = (player.health + 25.0).min(player.max_health);
        }
        CardKind::VitalEssence => {
            player.max_health += 50.0;
            player.health = player.max_health;
        }
        CardKind::Frenzy => player.attack_cooldown *= 0.8,
        CardKind::ArcaneStorm => player.attack_cooldown *= 0.6,
        CardKind::PhantomStep => player.speed *= 1.15,
        CardKind::SpectralWind => player.speed *= 1.30,
        CardKind::SoulHarvest => player.points_multiplier *= 1.5,
        CardKind::Regeneration => player.health_regen += 2.0,
        CardKind::UltimatePower => {
            player.damage = (player.damage * 1.1).floor();
            player.max_health = (player.max_health * 1.1).floor();
            player.speed *= 1.1;
            player.attack_cooldown *= 0.9;
            player.base_army_capacity += 2;
        }
        CardKind::BloodAwakening => player.healing_unlocked = true,
        CardKind::VitalBond => player.aura_radius_bonus += 40.0,
        CardKind::SoulMaster => player.base_army_capacity += 2,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use gravetide_core::tuning::Tuning;
    use gravetide_core::{CardKind, EventBus, EventKind, GameEvent};
    use gravetide_world::Player;

    use super::CardSystem;

    fn player() -> Player {
        Player::new(&Tuning::default())
    }

    #[test]
    fn offers_never_repeat_a_card() {
        let mut system = CardSystem::new(11);
        let player = player();

        for _ in 0..20 {
            let offer = system.generate_offer(3, 1, &player);
            assert!(offer.len() <= 3);
            for (index, card) in offer.iter().enumerate() {
                assert!(!offer[..index].contains(card));
            }
        }
    }

    #[test]
    fn oversized_requests_come_up_short() {
        let mut system = CardSystem::new(3);
        let player = player();

        // A locked aura keeps one rare out of reach, and the first rarity
        // roll that finds its tier exhausted ends the offer early.
        let offer = system.generate_offer(super::LIBRARY.len(), 12, &player);
        assert!(offer.len() < super::LIBRARY.len());
    }

    #[test]
    fn aura_cards_respect_their_gates() {
        let mut locked = player();
        let mut unlocked = player();
        unlocked.healing_unlocked = true;

        for seed in 0..24 {
            let mut system = CardSystem::new(seed);
            let offer = system.generate_offer(4, 12, &locked);
            assert!(!offer.contains(&CardKind::VitalBond));

            let mut system = CardSystem::new(seed);
            let offer = system.generate_offer(4, 12, &unlocked);
            assert!(!offer.contains(&CardKind::BloodAwakening));
        }
    }

    #[test]
    fn same_seed_rolls_the_same_offer() {
        let player = player();
        let mut left = CardSystem::new(42);
        let mut right = CardSystem::new(42);

        assert_eq!(
            left.generate_offer(3, 7, &player),
            right.generate_offer(3, 7, &player),
        );
    }

    #[test]
    fn damage_cards_stack_additively() {
        let mut system = CardSystem::new(0);
        let mut bus = EventBus::new();
        let mut player = player();

        assert!(system.apply(CardKind::DarkFire, &mut player, &mut bus));
        assert!(system.apply(CardKind::InfernalFlames, &mut player, &mut bus));
        assert_eq!(player.damage, 28.0);
    }

    #[test]
    fn vigor_raises_the_cap_before_healing() {
        let mut system = CardSystem::new(0);
        let mut bus = EventBus::new();
        let mut player = player();
        player.health = 90.0;

        assert!(system.apply(CardKind::NecroticVigor, &mut player, &mut bus));
        assert_eq!(player.max_health, 125.0);
        assert_eq!(player.health, 115.0);
    }

    #[test]
    fn essence_heals_to_the_new_cap() {
        let mut system = CardSystem::new(0);
        let mut bus = EventBus::new();
        let mut player = player();
        player.health = 12.0;

        assert!(system.apply(CardKind::VitalEssence, &mut player, &mut bus));
        assert_eq!(player.max_health, 150.0);
        assert_eq!(player.health, 150.0);
    }

    #[test]
    fn ultimate_power_floors_damage_and_health() {
        let mut system = CardSystem::new(0);
        let mut bus = EventBus::new();
        let mut player = player();
        player.damage = 15.0;
        player.health = 40.0;

        assert!(system.apply(CardKind::UltimatePower, &mut player, &mut bus));
        assert_eq!(player.damage, 16.0, "sixteen and a half, truncated");
        assert_eq!(player.max_health, 110.0);
        assert_eq!(player.health, 40.0, "current health is left alone");
        assert!((player.speed - 132.0).abs() < 1e-3);
        assert!((player.attack_cooldown - 0.54).abs() < 1e-6);
        assert_eq!(player.base_army_capacity, 3);
    }

    #[test]
    fn aura_unlock_and_extension() {
        let mut system = CardSystem::new(0);
        let mut bus = EventBus::new();
        let mut player = player();

        assert!(system.apply(CardKind::BloodAwakening, &mut player, &mut bus));
        assert!(player.healing_unlocked);

        assert!(system.apply(CardKind::VitalBond, &mut player, &mut bus));
        assert_eq!(player.aura_radius_bonus, 40.0);
    }

    #[test]
    fn repeat_applications_are_silent() {
        let mut system = CardSystem::new(0);
        let mut bus = EventBus::new();
        let events = Rc::new(RefCell::new(0_u32));
        let seen = Rc::clone(&events);
        let _ = bus.on(EventKind::CardApplied, move |event| {
            if let GameEvent::CardApplied { .. } = event {
                *seen.borrow_mut() += 1;
            }
        });

        let mut player = player();
        assert!(system.apply(CardKind::PhantomStep, &mut player, &mut bus));
        let boosted = player.speed;

        assert!(!system.apply(CardKind::PhantomStep, &mut player, &mut bus));
        assert_eq!(player.speed, boosted);
        assert_eq!(*events.borrow(), 1);
    }

    #[test]
    fn cooldown_cards_compound() {
        let mut system = CardSystem::new(0);
        let mut bus = EventBus::new();
        let mut player = player();

        assert!(system.apply(CardKind::Frenzy, &mut player, &mut bus));
        assert!(system.apply(CardKind::ArcaneStorm, &mut player, &mut bus));
        assert!((player.attack_cooldown - 0.288).abs() < 1e-6);
    }
}
