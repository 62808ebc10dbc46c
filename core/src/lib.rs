#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gravetide engine.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative world, and the simulation systems: entity identifiers, the
//! archetype and upgrade-card taxonomies, planar geometry primitives, and the
//! synchronous [`EventBus`] that fans simulation events out to observers.
//! Systems mutate world state directly under the driver's fixed frame order
//! and publish [`GameEvent`] values describing what happened; collaborators
//! such as rendering, scoring, or logging consume those events without ever
//! mutating simulation state.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod tuning;

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an allied unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllyId(u32);

impl AllyId {
    /// Creates a new ally identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behavior and stat template stamped onto enemies and allied units.
///
/// The archetype is immutable after creation. It selects the stat profile at
/// spawn time, drives the melee-versus-ranged behavior branch, and doubles as
/// the rendering hint consumed by adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Baseline melee chaser.
    Warrior,
    /// Oversized bruiser that trades speed for health and reach.
    Tank,
    /// Ranged caster that keeps its distance and lobs projectiles.
    Shaman,
    /// Fast, fragile melee striker.
    Assassin,
}

/// Faction that launched a projectile, selecting which collision rules apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileSource {
    /// Fired by the player's attack controller.
    Player,
    /// Fired by a shaman enemy; may only strike the player or allies.
    Enemy,
    /// Fired by a converted shaman ally; may only strike enemies.
    Ally,
}

/// Cause recorded when the player loses health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageCause {
    /// A melee enemy struck the player on contact.
    EnemyContact {
        /// Identifier of the enemy that landed the strike.
        enemy: EnemyId,
    },
    /// A shaman projectile hit the player.
    EnemyProjectile,
}

/// Terminal outcome reported when the player is defeated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// The player's health was exhausted by melee contact.
    Defeated,
    /// The player's health was exhausted by a shaman projectile.
    DefeatedByProjectile,
}

/// Stat snapshot captured the moment a projectile defeats an enemy.
///
/// Conversion into an allied unit happens after the collision sweep, once
/// the defeated enemy may already have been removed, so the record carries
/// everything needed to build the ally by value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefeatRecord {
    /// Identifier the enemy had while alive.
    pub enemy: EnemyId,
    /// Archetype the conversion preserves.
    pub archetype: Archetype,
    /// Horizontal position of the corpse.
    pub x: f32,
    /// Vertical position of the corpse.
    pub y: f32,
    /// Width of the corpse rectangle.
    pub width: f32,
    /// Height of the corpse rectangle.
    pub height: f32,
    /// Maximum health of the enemy; converted allies start at this value.
    pub max_health: f32,
    /// Damage the enemy dealt, scaled down during conversion.
    pub damage: f32,
    /// Movement speed the ally inherits unchanged.
    pub speed: f32,
    /// Experience awarded for the defeat.
    pub experience: u32,
}

/// Sampled player intent delivered by the input collaborator each frame.
///
/// The movement vector is free-form; the simulation normalizes it before
/// applying speed, so magnitudes above one do not grant extra velocity.
/// `attack_held` carries level-triggered semantics: the simulation fires
/// whenever it is set and the attack cooldown has elapsed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerInput {
    /// Horizontal movement intent, positive toward increasing x.
    pub move_x: f32,
    /// Vertical movement intent, positive toward increasing y.
    pub move_y: f32,
    /// Indicates whether the attack control is currently pressed.
    pub attack_held: bool,
}

/// Rarity tier attached to an upgrade card, weighting how often it appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    /// Baseline tier forming the bulk of every offer pool.
    Common,
    /// Uncommon tier with stronger numeric effects.
    Rare,
    /// High tier reserved for build-defining upgrades.
    Epic,
    /// Top tier that appears only a few percent of the time.
    Legendary,
}

/// Upgrade cards offered to the player on level up.
///
/// Each card mutates the player exactly once per run; re-applying an already
/// applied card is a silent no-op. Cards gated on aura state only enter the
/// offer pool while their gate condition holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardKind {
    /// Adds a small amount of projectile damage.
    DarkFire,
    /// Adds a large amount of projectile damage.
    InfernalFlames,
    /// Raises base army capacity by three.
    SpectralCalling,
    /// Raises base army capacity by eight.
    ShadowLegion,
    /// Raises maximum health and heals the same amount.
    NecroticVigor,
    /// Raises maximum health substantially and restores it in full.
    VitalEssence,
    /// Shortens the attack cooldown by twenty percent.
    Frenzy,
    /// Shortens the attack cooldown by forty percent.
    ArcaneStorm,
    /// Raises movement speed by fifteen percent.
    PhantomStep,
    /// Raises movement speed by thirty percent.
    SpectralWind,
    /// Multiplies experience gains by half again.
    SoulHarvest,
    /// Grants passive health regeneration.
    Regeneration,
    /// Improves damage, health, speed, attack rate, and capacity at once.
    UltimatePower,
    /// Unlocks the healing aura; offered only while it is locked.
    BloodAwakening,
    /// Extends the healing aura radius; offered only once unlocked.
    VitalBond,
    /// Raises base army capacity by two.
    SoulMaster,
}

impl CardKind {
    /// Rarity tier the card is drawn from.
    #[must_use]
    pub const fn rarity(&self) -> Rarity {
        match self {
            CardKind::DarkFire
            | CardKind::SpectralCalling
            | CardKind::NecroticVigor
            | CardKind::Frenzy
            | CardKind::PhantomStep => Rarity::Common,
            CardKind::InfernalFlames
            | CardKind::VitalEssence
            | CardKind::SpectralWind
            | CardKind::VitalBond => Rarity::Rare,
            CardKind::ShadowLegion
            | CardKind::ArcaneStorm
            | CardKind::SoulHarvest
            | CardKind::BloodAwakening
            | CardKind::SoulMaster => Rarity::Epic,
            CardKind::Regeneration | CardKind::UltimatePower => Rarity::Legendary,
        }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Horizontal coordinate of the left edge.
    pub x: f32,
    /// Vertical coordinate of the top edge.
    pub y: f32,
    /// Horizontal extent of the rectangle.
    pub width: f32,
    /// Vertical extent of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Creates a new rectangle from its top-left corner and extent.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Coordinate of the left edge.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.x
    }

    /// Coordinate of the right edge.
    #[must_use]
    pub const fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Coordinate of the top edge.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.y
    }

    /// Coordinate of the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Horizontal coordinate of the rectangle center.
    #[must_use]
    pub const fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Vertical coordinate of the rectangle center.
    #[must_use]
    pub const fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Reports whether this rectangle overlaps another.
    ///
    /// Edge contact counts as an overlap, so rectangles that merely touch
    /// still collide.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() < other.left()
            || self.left() > other.right()
            || self.bottom() < other.top()
            || self.top() > other.bottom())
    }

    /// Reports whether a circle intersects this rectangle.
    ///
    /// Uses the closest-point method: the circle center is clamped into the
    /// rectangle and the squared distance compared against the squared
    /// radius. The comparison is strict, so tangent contact does not count.
    #[must_use]
    pub fn intersects_circle(&self, center_x: f32, center_y: f32, radius: f32) -> bool {
        let closest_x = center_x.min(self.right()).max(self.x);
        let closest_y = center_y.min(self.bottom()).max(self.y);
        let distance_x = center_x - closest_x;
        let distance_y = center_y - closest_y;
        distance_x * distance_x + distance_y * distance_y < radius * radius
    }
}

/// Rectangular playfield that confines simulation entities.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    width: f32,
    height: f32,
    padding: f32,
}

impl Bounds {
    /// Creates a new playfield description.
    #[must_use]
    pub const fn new(width: f32, height: f32, padding: f32) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    /// Total width of the playfield in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Total height of the playfield in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Inset applied to every edge when clamping or testing containment.
    #[must_use]
    pub const fn padding(&self) -> f32 {
        self.padding
    }

    /// Clamps a rectangle's position into the padded playfield.
    ///
    /// Only the position is adjusted; velocity is left untouched.
    pub fn clamp(&self, rect: &mut Rect) {
        let min_x = self.padding;
        let min_y = self.padding;
        let max_x = self.width - rect.width - self.padding;
        let max_y = self.height - rect.height - self.padding;
        rect.x = rect.x.min(max_x).max(min_x);
        rect.y = rect.y.min(max_y).max(min_y);
    }

    /// Reports whether a rectangle lies fully inside the padded playfield.
    #[must_use]
    pub fn contains(&self, rect: &Rect) -> bool {
        rect.x >= self.padding
            && rect.y >= self.padding
            && rect.right() <= self.width - self.padding
            && rect.bottom() <= self.height - self.padding
    }

    /// Reports whether any part of a rectangle escapes the padded playfield.
    #[must_use]
    pub fn is_out_of_bounds(&self, rect: &Rect) -> bool {
        !self.contains(rect)
    }

    /// Samples a uniform position that keeps an entity of the given extent
    /// fully inside the padded playfield.
    #[must_use]
    pub fn random_position<R: Rng>(
        &self,
        entity_width: f32,
        entity_height: f32,
        rng: &mut R,
    ) -> (f32, f32) {
        let x = self.padding + rng.gen::<f32>() * (self.width - entity_width - self.padding * 2.0);
        let y =
            self.padding + rng.gen::<f32>() * (self.height - entity_height - self.padding * 2.0);
        (x, y)
    }
}

/// Events published by the simulation for observers to react to.
///
/// Payloads are value snapshots captured at emission time; they never carry
/// references into simulation collections, so observers cannot hold dangling
/// handles to removed entities.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Announces that a new wave began issuing spawns.
    WaveStarted {
        /// One-based index of the wave that started.
        wave: u32,
        /// Total number of enemies the wave will spawn.
        enemy_count: u32,
    },
    /// Announces that a wave exhausted its quota and no enemies remain.
    WaveCompleted {
        /// One-based index of the wave that completed.
        wave: u32,
    },
    /// Confirms that a projectile reduced an enemy's health to zero.
    EnemyDefeated {
        /// Identifier of the defeated enemy.
        enemy: EnemyId,
        /// Archetype the enemy was stamped with at spawn.
        archetype: Archetype,
        /// Horizontal position of the enemy at the moment of defeat.
        x: f32,
        /// Vertical position of the enemy at the moment of defeat.
        y: f32,
        /// Experience reward granted for the defeat.
        experience: u32,
    },
    /// Confirms that a player or ally projectile struck an enemy.
    ProjectileHit {
        /// Faction that launched the projectile.
        source: ProjectileSource,
        /// Identifier of the enemy that was struck.
        target: EnemyId,
        /// Damage applied by the impact.
        damage: f32,
        /// Horizontal position of the projectile at impact.
        x: f32,
        /// Vertical position of the projectile at impact.
        y: f32,
    },
    /// Announces that the player fired a projectile.
    PlayerAttacked {
        /// Horizontal spawn position of the projectile.
        x: f32,
        /// Vertical spawn position of the projectile.
        y: f32,
        /// Horizontal velocity of the projectile.
        vx: f32,
        /// Vertical velocity of the projectile.
        vy: f32,
    },
    /// Reports that the player lost health.
    PlayerDamaged {
        /// Amount of health removed.
        damage: f32,
        /// Player health remaining after the damage was applied.
        health_after: f32,
        /// What inflicted the damage.
        cause: DamageCause,
    },
    /// Announces that the player accumulated enough experience to level up.
    PlayerLevelUp {
        /// Level the player just reached.
        level: u32,
    },
    /// Reports that a melee enemy struck an allied unit.
    AllyDamaged {
        /// Identifier of the attacking enemy.
        enemy: EnemyId,
        /// Identifier of the ally that was struck.
        ally: AllyId,
        /// Amount of health removed.
        damage: f32,
        /// Indicates whether the strike killed the ally.
        died: bool,
    },
    /// Reports that a shaman projectile struck an allied unit.
    AllyHit {
        /// Identifier of the ally that was struck.
        ally: AllyId,
        /// Amount of health removed.
        damage: f32,
        /// Indicates whether the impact killed the ally.
        died: bool,
    },
    /// Confirms that a defeated enemy was converted into an allied unit.
    ArmyUnitAdded {
        /// Identifier assigned to the new ally.
        ally: AllyId,
        /// Archetype carried over from the defeated enemy.
        archetype: Archetype,
        /// Army size after the conversion.
        army_size: u32,
    },
    /// Confirms that an upgrade card mutated the player.
    CardApplied {
        /// Card whose effect was applied.
        card: CardKind,
    },
    /// Announces that the player was defeated and the run ended.
    GameOver {
        /// How the defeat happened.
        reason: GameOverReason,
    },
}

impl GameEvent {
    /// Subscription key matching this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            GameEvent::WaveStarted { .. } => EventKind::WaveStarted,
            GameEvent::WaveCompleted { .. } => EventKind::WaveCompleted,
            GameEvent::EnemyDefeated { .. } => EventKind::EnemyDefeated,
            GameEvent::ProjectileHit { .. } => EventKind::ProjectileHit,
            GameEvent::PlayerAttacked { .. } => EventKind::PlayerAttacked,
            GameEvent::PlayerDamaged { .. } => EventKind::PlayerDamaged,
            GameEvent::PlayerLevelUp { .. } => EventKind::PlayerLevelUp,
            GameEvent::AllyDamaged { .. } => EventKind::AllyDamaged,
            GameEvent::AllyHit { .. } => EventKind::AllyHit,
            GameEvent::ArmyUnitAdded { .. } => EventKind::ArmyUnitAdded,
            GameEvent::CardApplied { .. } => EventKind::CardApplied,
            GameEvent::GameOver { .. } => EventKind::GameOver,
        }
    }
}

/// Discriminant used to subscribe to one family of [`GameEvent`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// Matches [`GameEvent::WaveStarted`].
    WaveStarted,
    /// Matches [`GameEvent::WaveCompleted`].
    WaveCompleted,
    /// Matches [`GameEvent::EnemyDefeated`].
    EnemyDefeated,
    /// Matches [`GameEvent::ProjectileHit`].
    ProjectileHit,
    /// Matches [`GameEvent::PlayerAttacked`].
    PlayerAttacked,
    /// Matches [`GameEvent::PlayerDamaged`].
    PlayerDamaged,
    /// Matches [`GameEvent::PlayerLevelUp`].
    PlayerLevelUp,
    /// Matches [`GameEvent::AllyDamaged`].
    AllyDamaged,
    /// Matches [`GameEvent::AllyHit`].
    AllyHit,
    /// Matches [`GameEvent::ArmyUnitAdded`].
    ArmyUnitAdded,
    /// Matches [`GameEvent::CardApplied`].
    CardApplied,
    /// Matches [`GameEvent::GameOver`].
    GameOver,
}

/// Token returned by [`EventBus::on`] used to unsubscribe a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u32);

impl HandlerId {
    /// Creates a new handler token with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the token.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

type BoxedHandler = Box<dyn FnMut(&GameEvent)>;

/// Synchronous publish/subscribe channel fanning simulation events out to
/// observers.
///
/// Handlers registered for an [`EventKind`] run immediately and in
/// registration order whenever a matching event is emitted; there is no
/// queuing and no error isolation. Dispatch is single-threaded and handlers
/// must not emit further events. [`EventBus::clear`] drops every
/// subscription at simulation teardown.
#[derive(Default)]
pub struct EventBus {
    handlers: BTreeMap<EventKind, Vec<(HandlerId, BoxedHandler)>>,
    next_handler: u32,
}

impl EventBus {
    /// Creates an event bus with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event kind and returns its token.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let id = HandlerId::new(self.next_handler);
        self.next_handler = self.next_handler.wrapping_add(1);
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Removes a previously registered handler.
    ///
    /// Returns `true` when the token matched a live subscription.
    pub fn off(&mut self, kind: EventKind, handler: HandlerId) -> bool {
        match self.handlers.get_mut(&kind) {
            Some(entries) => match entries.iter().position(|(id, _)| *id == handler) {
                Some(index) => {
                    let _ = entries.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Invokes every handler subscribed to the event's kind, in registration
    /// order.
    pub fn emit(&mut self, event: &GameEvent) {
        if let Some(entries) = self.handlers.get_mut(&event.kind()) {
            for (_, handler) in entries.iter_mut() {
                handler(event);
            }
        }
    }

    /// Number of handlers currently subscribed to one event kind.
    #[must_use]
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Drops every subscription.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscriptions: usize = self.handlers.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("subscriptions", &subscriptions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde::{de::DeserializeOwned, Serialize};

    use super::{
        Archetype, Bounds, CardKind, EnemyId, EventBus, EventKind, GameEvent, Rarity, Rect,
    };

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn enemy_id_round_trips_through_bincode() {
        assert_round_trip(&EnemyId::new(42));
    }

    #[test]
    fn archetype_round_trips_through_bincode() {
        assert_round_trip(&Archetype::Shaman);
    }

    #[test]
    fn card_kind_round_trips_through_bincode() {
        assert_round_trip(&CardKind::BloodAwakening);
    }

    #[test]
    fn card_rarity_mapping_matches_library() {
        assert_eq!(CardKind::DarkFire.rarity(), Rarity::Common);
        assert_eq!(CardKind::InfernalFlames.rarity(), Rarity::Rare);
        assert_eq!(CardKind::ShadowLegion.rarity(), Rarity::Epic);
        assert_eq!(CardKind::Regeneration.rarity(), Rarity::Legendary);
        assert_eq!(CardKind::UltimatePower.rarity(), Rarity::Legendary);
    }

    #[test]
    fn rect_overlap_counts_edge_contact() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&b), "touching edges should collide");
        assert!(b.overlaps(&a), "overlap test should be symmetric");
    }

    #[test]
    fn rect_overlap_rejects_separated_rectangles() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.5, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn circle_rect_uses_closest_point() {
        let rect = Rect::new(0.0, 0.0, 8.0, 8.0);
        // Closest point to (10, 10) is the corner (8, 8): squared distance 8
        // against squared radius 25.
        assert!(rect.intersects_circle(10.0, 10.0, 5.0));
    }

    #[test]
    fn circle_rect_tangent_contact_misses() {
        let rect = Rect::new(0.0, 0.0, 8.0, 8.0);
        // Closest point to (13, 4) is (8, 4), exactly one radius away; the
        // strict comparison keeps tangent contact from registering.
        assert!(!rect.intersects_circle(13.0, 4.0, 5.0));
    }

    #[test]
    fn bounds_clamp_respects_padding() {
        let bounds = Bounds::new(100.0, 100.0, 10.0);
        let mut rect = Rect::new(-50.0, 95.0, 20.0, 20.0);
        bounds.clamp(&mut rect);
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.y, 70.0);
    }

    #[test]
    fn bounds_containment_requires_full_inclusion() {
        let bounds = Bounds::new(100.0, 100.0, 0.0);
        let inside = Rect::new(10.0, 10.0, 20.0, 20.0);
        let straddling = Rect::new(90.0, 10.0, 20.0, 20.0);
        assert!(bounds.contains(&inside));
        assert!(bounds.is_out_of_bounds(&straddling));
    }

    #[test]
    fn bounds_random_position_stays_inside() {
        let bounds = Bounds::new(200.0, 150.0, 5.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..64 {
            let (x, y) = bounds.random_position(16.0, 16.0, &mut rng);
            let rect = Rect::new(x, y, 16.0, 16.0);
            assert!(
                bounds.contains(&rect),
                "sampled position should stay inside the padded field"
            );
        }
    }

    #[test]
    fn event_bus_dispatches_in_registration_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        let _ = bus.on(EventKind::WaveStarted, move |_| first.borrow_mut().push(1));
        let second = Rc::clone(&seen);
        let _ = bus.on(EventKind::WaveStarted, move |_| second.borrow_mut().push(2));

        bus.emit(&GameEvent::WaveStarted {
            wave: 1,
            enemy_count: 5,
        });
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn event_bus_ignores_other_kinds() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0_u32));

        let counter = Rc::clone(&seen);
        let _ = bus.on(EventKind::WaveCompleted, move |_| *counter.borrow_mut() += 1);

        bus.emit(&GameEvent::WaveStarted {
            wave: 1,
            enemy_count: 5,
        });
        assert_eq!(*seen.borrow(), 0);

        bus.emit(&GameEvent::WaveCompleted { wave: 1 });
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn event_bus_off_unregisters_exactly_one_handler() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        let keep = bus.on(EventKind::GameOver, move |_| first.borrow_mut().push(1));
        let second = Rc::clone(&seen);
        let drop = bus.on(EventKind::GameOver, move |_| second.borrow_mut().push(2));

        assert!(bus.off(EventKind::GameOver, drop));
        assert!(!bus.off(EventKind::GameOver, drop), "token already removed");
        assert_eq!(bus.handler_count(EventKind::GameOver), 1);

        bus.emit(&GameEvent::GameOver {
            reason: super::GameOverReason::Defeated,
        });
        assert_eq!(*seen.borrow(), vec![1]);
        let _ = keep;
    }

    #[test]
    fn event_bus_clear_drops_all_subscriptions() {
        let mut bus = EventBus::new();
        let _ = bus.on(EventKind::WaveStarted, |_| {});
        let _ = bus.on(EventKind::GameOver, |_| {});
        bus.clear();
        assert_eq!(bus.handler_count(EventKind::WaveStarted), 0);
        assert_eq!(bus.handler_count(EventKind::GameOver), 0);
    }
}
