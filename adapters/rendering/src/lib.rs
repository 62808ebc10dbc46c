#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gravetide adapters.
//!
//! [`Scene::compose`] reads the world and produces a flat draw list plus a
//! HUD snapshot. Nothing here touches a canvas; backends consume the scene
//! through [`RenderingBackend`] and own the actual drawing.

use anyhow::Result as AnyResult;
use glam::Vec2;
use gravetide_core::{Archetype, ProjectileSource};
use gravetide_system_waves::WaveSnapshot;
use gravetide_world::{Body, World};
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// The game's fixed paint palette.
pub mod palette {
    use super::Color;

    /// Clear color behind the arena.
    pub const BACKGROUND: Color = Color::from_rgb_u8(0x0a, 0x0a, 0x0a);
    /// The necromancer.
    pub const PLAYER: Color = Color::from_rgb_u8(0x8b, 0x00, 0xff);
    /// Baseline melee chaser.
    pub const WARRIOR: Color = Color::from_rgb_u8(0x4a, 0x78, 0x32);
    /// Oversized bruiser.
    pub const TANK: Color = Color::from_rgb_u8(0x2d, 0x4d, 0x1f);
    /// Robed caster.
    pub const SHAMAN: Color = Color::from_rgb_u8(0x6b, 0x44, 0x23);
    /// Fast striker.
    pub const ASSASSIN: Color = Color::from_rgb_u8(0x7a, 0x9b, 0x6c);
    /// Player projectile bolt.
    pub const PLAYER_PROJECTILE: Color = Color::from_rgb_u8(0xbd, 0x00, 0xff);
    /// Enemy shaman projectile.
    pub const ENEMY_PROJECTILE: Color = Color::from_rgb_u8(0xff, 0x00, 0x00);
    /// Converted shaman projectile.
    pub const ALLY_PROJECTILE: Color = Color::from_rgb_u8(0x00, 0xff, 0xff);
}

/// Which sprite a scene instance should be drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    /// The player.
    Player,
    /// A live enemy of the given archetype.
    Enemy(Archetype),
    /// A converted unit of the given archetype.
    Ally(Archetype),
    /// A projectile attributed to the given source.
    Projectile(ProjectileSource),
}

impl SpriteKind {
    /// Paint color for this sprite.
    ///
    /// Converted units keep their source archetype's paint, washed out to
    /// read as spectral.
    #[must_use]
    pub fn color(self) -> Color {
        match self {
            Self::Player => palette::PLAYER,
            Self::Enemy(archetype) => archetype_color(archetype),
            Self::Ally(archetype) => archetype_color(archetype).lighten(0.45),
            Self::Projectile(ProjectileSource::Player) => palette::PLAYER_PROJECTILE,
            Self::Projectile(ProjectileSource::Enemy) => palette::ENEMY_PROJECTILE,
            Self::Projectile(ProjectileSource::Ally) => palette::ALLY_PROJECTILE,
        }
    }
}

fn archetype_color(archetype: Archetype) -> Color {
    match archetype {
        Archetype::Warrior => palette::WARRIOR,
        Archetype::Tank => palette::TANK,
        Archetype::Shaman => palette::SHAMAN,
        Archetype::Assassin => palette::ASSASSIN,
    }
}

/// One rectangle to draw, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstance {
    /// Left edge in world units.
    pub x: f32,
    /// Top edge in world units.
    pub y: f32,
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
    /// Sprite to draw.
    pub kind: SpriteKind,
}

impl SpriteInstance {
    /// Creates a new sprite instance.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32, kind: SpriteKind) -> Self {
        Self {
            x,
            y,
            width,
            height,
            kind,
        }
    }

    /// Top-left corner as a vector.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Width and height as a vector.
    #[must_use]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    fn from_body(body: &Body, kind: SpriteKind) -> Self {
        Self::new(
            body.rect.x,
            body.rect.y,
            body.rect.width,
            body.rect.height,
            kind,
        )
    }
}

/// Player and run statistics shown alongside the arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudSnapshot {
    /// Current player health.
    pub health: f32,
    /// Player health ceiling.
    pub max_health: f32,
    /// Current player level.
    pub level: u32,
    /// Experience gathered toward the next level.
    pub experience: f32,
    /// Experience required for the next level.
    pub experience_to_next: f32,
    /// One-based wave index, zero before the first wave.
    pub wave: u32,
    /// Units currently in the army.
    pub army_size: u32,
    /// Army slots currently available.
    pub army_capacity: u32,
    /// Score accumulated over the run.
    pub score: u32,
}

impl HudSnapshot {
    /// Fill fraction for the health bar.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Fill fraction for the experience bar.
    #[must_use]
    pub fn experience_fraction(&self) -> f32 {
        if self.experience_to_next <= 0.0 {
            return 0.0;
        }
        (self.experience / self.experience_to_next).clamp(0.0, 1.0)
    }
}

/// Flat draw list plus HUD data for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Solid color used to clear the frame.
    pub background: Color,
    /// Sprites in paint order, rearmost first.
    pub instances: Vec<SpriteInstance>,
    /// Statistics shown alongside the arena.
    pub hud: HudSnapshot,
}

impl Scene {
    /// Reads the world into a draw list.
    ///
    /// Projectiles are painted below units, enemies below the army, and the
    /// player last. Inactive bodies are skipped; a defeated enemy vanishes
    /// from the scene even while the simulation still carries its record.
    #[must_use]
    pub fn compose(world: &World, wave: &WaveSnapshot) -> Self {
        let player = world.player();
        let mut instances = Vec::new();

        for projectile in world.player_projectiles() {
            if projectile.body.active {
                instances.push(SpriteInstance::from_body(
                    &projectile.body,
                    SpriteKind::Projectile(projectile.source),
                ));
            }
        }
        for projectile in world.ally_projectiles() {
            if projectile.body.active {
                instances.push(SpriteInstance::from_body(
                    &projectile.body,
                    SpriteKind::Projectile(projectile.source),
                ));
            }
        }
        for projectile in world.enemy_projectiles() {
            if projectile.body.active {
                instances.push(SpriteInstance::from_body(
                    &projectile.body,
                    SpriteKind::Projectile(projectile.source),
                ));
            }
        }
        for enemy in world.enemies() {
            if enemy.body.active {
                instances.push(SpriteInstance::from_body(
                    &enemy.body,
                    SpriteKind::Enemy(enemy.archetype),
                ));
            }
        }
        for ally in world.army() {
            if ally.body.active {
                instances.push(SpriteInstance::from_body(
                    &ally.body,
                    SpriteKind::Ally(ally.archetype),
                ));
            }
        }
        if player.body.active {
            instances.push(SpriteInstance::from_body(&player.body, SpriteKind::Player));
        }

        Self {
            background: palette::BACKGROUND,
            instances,
            hud: HudSnapshot {
                health: player.health,
                max_health: player.max_health,
                level: player.level,
                experience: player.experience,
                experience_to_next: player.experience_to_next,
                wave: wave.wave,
                army_size: world.army().len() as u32,
                army_capacity: world.army_capacity(),
                score: player.points as u32,
            },
        }
    }
}

/// Rendering backend capable of presenting Gravetide scenes.
pub trait RenderingBackend {
    /// Runs the backend until it is requested to exit.
    ///
    /// The `update_scene` closure receives the frame delta and may replace
    /// the scene contents before each draw, letting adapters re-compose from
    /// fresh world snapshots.
    fn run<F>(self, scene: Scene, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut Scene) + 'static;
}
