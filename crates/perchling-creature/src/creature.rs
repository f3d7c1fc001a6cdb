//! Per-creature lifecycle state machine and kinematics
//!
//! A creature flies in from an off-screen origin, perches on its anchor's
//! perch curve at a fixed parameter, runs idle actions, and escapes back
//! toward its origin when scared. All integration is scaled by delta-time.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use crate::config::MotionConfig;
use crate::species::SpeciesProfile;
use crate::types::{CreatureKind, EntityId, IdleAction, Lifecycle};

/// One autonomous creature bound (weakly) to an anchor
#[derive(Debug, Clone)]
pub struct Creature {
    pub id: EntityId,
    /// Weak reference, re-resolved against the tracker every tick
    pub anchor_id: String,
    pub species: Arc<SpeciesProfile>,
    /// Fixed position along the perch curve in [0, 1]
    pub perch_t: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Off-screen spawn point, reused as the escape destination
    pub origin: Vec2,
    pub size: f32,
    pub lifecycle: Lifecycle,
    pub idle: IdleAction,
    /// Horizontal draw direction: 1.0 faces right, -1.0 faces left
    pub facing: f32,
    pub flap_phase: f32,
    flap_speed: f32,
    wobble_phase: f32,
    action_timer: f32,
    /// Fallback steering point while the anchor has not appeared yet
    wander: Vec2,
    drop_timer: f32,
    pending_drop: bool,
}

impl Creature {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        anchor_id: String,
        species: Arc<SpeciesProfile>,
        perch_t: f32,
        origin: Vec2,
        wander: Vec2,
        size: f32,
        cfg: &MotionConfig,
        rng: &mut impl Rng,
    ) -> Self {
        // Smaller creatures flap faster
        let flap_speed = species.flap_speed * (15.0 / size).clamp(0.3, 3.0);
        let drop_timer = sample_drop_timer(cfg, rng);
        Self {
            id: EntityId::new(),
            anchor_id,
            species,
            perch_t: perch_t.clamp(0.0, 1.0),
            position: origin,
            velocity: Vec2::ZERO,
            origin,
            size,
            lifecycle: Lifecycle::FlyingIn,
            idle: IdleAction::Idle,
            facing: 1.0,
            flap_phase: rng.random::<f32>() * std::f32::consts::TAU,
            flap_speed,
            wobble_phase: rng.random::<f32>() * std::f32::consts::TAU,
            action_timer: rng.random::<f32>() * 1.5,
            wander,
            drop_timer,
            pending_drop: false,
        }
    }

    pub fn kind(&self) -> CreatureKind {
        self.species.kind
    }

    /// Force the creature to flee; absorbing, ignored once flying away
    pub fn scare(&mut self) {
        if self.lifecycle != Lifecycle::FlyingAway {
            self.lifecycle = Lifecycle::FlyingAway;
        }
    }

    /// Consume the pending dropped-item flag set by the drop timer
    pub fn take_drop(&mut self) -> bool {
        std::mem::take(&mut self.pending_drop)
    }

    /// Advance the creature by `dt` seconds against the resolved perch point
    ///
    /// `perch` is the sampled point for this creature's `perch_t`, already
    /// validated finite by the caller; `None` means the anchor does not
    /// resolve this tick.
    pub fn update(&mut self, dt: f32, perch: Option<Vec2>, cfg: &MotionConfig, rng: &mut impl Rng) {
        self.flap_phase += self.flap_speed * dt;
        self.wobble_phase += cfg.wobble_rate * dt;

        match self.lifecycle {
            Lifecycle::FlyingIn => self.update_flying_in(dt, perch, cfg),
            Lifecycle::Perched => self.update_perched(dt, perch, cfg, rng),
            Lifecycle::FlyingAway => self.update_flying_away(dt, cfg),
        }
    }

    fn update_flying_in(&mut self, dt: f32, perch: Option<Vec2>, cfg: &MotionConfig) {
        let target = match perch {
            Some(p) => Vec2::new(p.x, p.y - self.feet_offset()),
            // Anchor not resolvable yet: drift toward the wandering fallback
            None => self.wander,
        };
        let to_target = target - self.position;
        let dist = to_target.length();

        let speed = if perch.is_some() {
            (cfg.approach_rate * dist).min(cfg.max_speed)
        } else {
            cfg.wander_speed
        };
        self.velocity = to_target.normalize_or_zero() * speed;
        self.velocity.y += self.flap_phase.sin() * cfg.flap_bob;
        self.position += self.velocity * dt;
        self.facing = if self.velocity.x >= 0.0 { 1.0 } else { -1.0 };

        if perch.is_some() && dist < self.size * cfg.arrive_factor {
            self.lifecycle = Lifecycle::Perched;
            self.velocity = Vec2::ZERO;
        }
    }

    fn update_perched(
        &mut self,
        dt: f32,
        perch: Option<Vec2>,
        cfg: &MotionConfig,
        rng: &mut impl Rng,
    ) {
        let Some(target) = perch else {
            // The anchor vanished from the snapshot while we were bound to it
            self.scare();
            return;
        };

        self.action_timer -= dt;
        if self.action_timer <= 0.0 {
            self.pick_idle_action(cfg, rng);
        }

        if self.kind() == CreatureKind::Bird {
            self.drop_timer -= dt;
            if self.drop_timer <= 0.0 {
                self.pending_drop = true;
                self.drop_timer = sample_drop_timer(cfg, rng);
            }
        }

        // Re-anchor smoothly; snapping would read as teleportation when the
        // subject moves
        let blend = 1.0 - (-cfg.perch_rate * dt).exp();
        let rest_y = target.y - self.feet_offset() * 1.07;
        self.position.x += (target.x - self.position.x) * blend;

        if self.velocity.y < 0.0 || self.position.y < rest_y {
            // Mid-hop: ballistic until we settle back onto the perch
            self.position.y += self.velocity.y * dt;
            self.velocity.y += cfg.hop_gravity * dt;
            if self.position.y >= rest_y {
                self.position.y = rest_y;
                self.velocity.y = 0.0;
            }
        } else {
            self.position.y += (rest_y - self.position.y) * blend;
        }

        self.facing = if self.perch_t < 0.5 { 1.0 } else { -1.0 };
        if self.idle == IdleAction::LookBack {
            self.facing = -self.facing;
        }
    }

    fn update_flying_away(&mut self, dt: f32, cfg: &MotionConfig) {
        let dir = (self.origin - self.position).normalize_or_zero();
        self.velocity += dir * cfg.escape_accel * dt;

        let speed = self.velocity.length();
        if speed > cfg.escape_speed {
            self.velocity *= cfg.escape_speed / speed;
        }
        // Correct a velocity that still points back on-screen so the creature
        // visibly exits instead of orbiting; use the capped magnitude
        if self.velocity.dot(dir) <= 0.0 && dir != Vec2::ZERO {
            self.velocity = dir * self.velocity.length().max(cfg.escape_speed * 0.25);
        }

        let perp = Vec2::new(-dir.y, dir.x);
        let wobble = perp * self.wobble_phase.sin() * cfg.escape_wobble;
        self.position += (self.velocity + wobble) * dt;
        self.facing = if self.velocity.x >= 0.0 { 1.0 } else { -1.0 };
    }

    fn pick_idle_action(&mut self, cfg: &MotionConfig, rng: &mut impl Rng) {
        if self.kind() == CreatureKind::Butterfly {
            self.idle = IdleAction::Flutter;
            self.action_timer = rng.random_range(1.0..3.0);
            return;
        }
        let roll = rng.random::<f32>();
        if roll < 0.05 {
            self.idle = IdleAction::Hop;
            self.action_timer = 0.33;
            self.velocity.y = -cfg.hop_impulse;
        } else if roll < 0.25 {
            self.idle = IdleAction::Peck;
            self.action_timer = 0.6;
        } else if roll < 0.45 {
            self.idle = IdleAction::LookBack;
            self.action_timer = 1.3;
        } else if roll < 0.6 {
            self.idle = IdleAction::Fluff;
            self.action_timer = 0.66;
        } else {
            self.idle = IdleAction::Idle;
            self.action_timer = 1.0 + rng.random::<f32>() * 1.7;
        }
    }

    fn feet_offset(&self) -> f32 {
        self.size * 1.5
    }

    /// True once the creature sits outside the viewport by `margin` pixels
    pub fn is_outside(&self, viewport: Vec2, margin: f32) -> bool {
        self.position.x < -margin
            || self.position.x > viewport.x + margin
            || self.position.y < -margin
            || self.position.y > viewport.y + margin
    }
}

/// Next drop delay; tolerates presets with a collapsed or inverted range
fn sample_drop_timer(cfg: &MotionConfig, rng: &mut impl Rng) -> f32 {
    let (min, max) = cfg.drop_interval;
    if max > min {
        rng.random_range(min..max)
    } else {
        min.max(0.0)
    }
}
