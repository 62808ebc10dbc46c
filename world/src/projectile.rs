use gravetide_core::tuning::ProjectileTuning;
use gravetide_core::ProjectileSource;

use crate::Body;

/// A projectile in flight, owned by one of the three firing factions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    /// Movement state. The rectangle is anchored at its top-left corner.
    pub body: Body,
    /// Faction that launched the projectile.
    pub source: ProjectileSource,
    /// Damage applied on impact.
    pub damage: f32,
    /// Seconds this projectile has been in flight.
    pub age: f32,
    /// Flight time after which the projectile expires on its own.
    pub lifetime: f32,
}

impl Projectile {
    /// Creates a projectile already moving at the provided velocity.
    #[must_use]
    pub fn new(
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        damage: f32,
        source: ProjectileSource,
        tuning: &ProjectileTuning,
    ) -> Self {
        let mut body = Body::new(x, y, tuning.size, tuning.size);
        body.vx = vx;
        body.vy = vy;
        Self {
            body,
            source,
            damage,
            age: 0.0,
            lifetime: tuning.lifetime,
        }
    }

    /// Flies the projectile forward and expires it once its lifetime runs
    /// out.
    pub fn update(&mut self, dt: f32) {
        self.body.integrate(dt);
        self.age += dt;
        if self.age >= self.lifetime {
            self.body.active = false;
        }
    }
}
