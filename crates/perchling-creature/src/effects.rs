//! Ephemeral anchor-attached effects
//!
//! Short-lived visual entities with lifecycles independent of creatures:
//! items dropped onto an anchor, the transformation triggered when a hand
//! reaches one, the secondary sparkle plus convergent particle burst it
//! leaves behind, and gesture-held effects that grow while sustained.

use glam::Vec2;
use rand::Rng;

use crate::config::EffectConfig;
use crate::traits::AnchorLookup;
use crate::types::EntityId;

/// Lifecycle tag of an ephemeral effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectPhase {
    /// Tracking its anchor at a fixed offset
    Attached,
    /// Shrinking and fading after an interactor reached it
    Transforming,
    /// Detached, fading out in place
    Released,
}

/// What the effect represents visually
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Item dropped by a perched creature
    Dropping,
    /// Secondary effect left behind by a completed transformation
    Sparkle,
    /// Effect grown while an external sustained gesture persists
    Held,
}

/// A short-lived anchor-attached visual entity
#[derive(Debug, Clone)]
pub struct EphemeralEffect {
    pub id: EntityId,
    /// Weak reference; a stale id means the effect detaches and fades
    pub anchor_id: String,
    /// Offset from the anchor centroid, fixed at creation time
    pub offset: Vec2,
    pub position: Vec2,
    pub opacity: f32,
    pub scale: f32,
    pub phase: EffectPhase,
    pub kind: EffectKind,
    age: f32,
    sustained: bool,
}

/// One burst particle converging toward its transformation point
#[derive(Debug, Clone)]
pub struct BurstParticle {
    pub id: EntityId,
    pub position: Vec2,
    pub size: f32,
    velocity: Vec2,
    target: Vec2,
}

/// An anchor that can trigger transformations (typically a hand)
#[derive(Debug, Clone)]
pub struct Interactor {
    pub anchor_id: String,
    pub position: Vec2,
    pub radius: f32,
}

/// Owns all live effects and burst particles
pub struct EffectPipeline {
    effects: Vec<EphemeralEffect>,
    particles: Vec<BurstParticle>,
    cfg: EffectConfig,
}

impl EffectPipeline {
    pub fn new(cfg: EffectConfig) -> Self {
        Self {
            effects: Vec::new(),
            particles: Vec::new(),
            cfg,
        }
    }

    pub fn effects(&self) -> impl Iterator<Item = &EphemeralEffect> {
        self.effects.iter()
    }

    pub fn particles(&self) -> impl Iterator<Item = &BurstParticle> {
        self.particles.iter()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Create a dropped-item effect at `point`, attached to `anchor_id`
    ///
    /// The offset from the anchor's current centroid is captured once and
    /// never recomputed.
    pub fn drop_at(&mut self, anchor_id: &str, point: Vec2, centroid: Vec2) -> EntityId {
        let effect = EphemeralEffect {
            id: EntityId::new(),
            anchor_id: anchor_id.to_string(),
            offset: point - centroid,
            position: point,
            opacity: 1.0,
            scale: 1.0,
            phase: EffectPhase::Attached,
            kind: EffectKind::Dropping,
            age: 0.0,
            sustained: false,
        };
        let id = effect.id;
        self.effects.push(effect);
        log::debug!("Dropped effect {} on anchor '{}'", id, anchor_id);
        id
    }

    /// Create a held effect that grows while the sustaining gesture persists
    pub fn begin_held(&mut self, anchor_id: &str, centroid: Vec2, offset: Vec2) -> EntityId {
        let effect = EphemeralEffect {
            id: EntityId::new(),
            anchor_id: anchor_id.to_string(),
            offset,
            position: centroid + offset,
            opacity: 1.0,
            scale: 0.2,
            phase: EffectPhase::Attached,
            kind: EffectKind::Held,
            age: 0.0,
            sustained: true,
        };
        let id = effect.id;
        self.effects.push(effect);
        id
    }

    /// Keep a held effect alive for this tick; without a sustain call it
    /// detaches and fades on the next update
    pub fn sustain(&mut self, id: EntityId) {
        if let Some(effect) = self.effects.iter_mut().find(|e| e.id == id) {
            effect.sustained = true;
        }
    }

    /// Whether any held effect is attached to `anchor_id`
    pub fn held_on(&self, anchor_id: &str) -> Option<EntityId> {
        self.effects
            .iter()
            .find(|e| {
                e.kind == EffectKind::Held
                    && e.phase == EffectPhase::Attached
                    && e.anchor_id == anchor_id
            })
            .map(|e| e.id)
    }

    /// Advance all effects and particles one tick against the anchor snapshot
    pub fn update(
        &mut self,
        dt: f32,
        anchors: &impl AnchorLookup,
        interactors: &[Interactor],
        rng: &mut impl Rng,
    ) {
        let mut bursts: Vec<(String, Vec2, Vec2)> = Vec::new();

        for effect in &mut self.effects {
            effect.age += dt;
            match effect.phase {
                EffectPhase::Attached => {
                    match anchors.centroid(&effect.anchor_id).filter(|c| c.is_finite()) {
                        Some(centroid) => effect.position = centroid + effect.offset,
                        // Anchor gone: fade out independently, frozen in place
                        None => {
                            effect.phase = EffectPhase::Released;
                            continue;
                        }
                    }

                    match effect.kind {
                        EffectKind::Dropping => {
                            let touched = interactors.iter().any(|i| {
                                i.anchor_id != effect.anchor_id
                                    && (i.position - effect.position).length() < i.radius
                            });
                            if touched {
                                effect.phase = EffectPhase::Transforming;
                            }
                        }
                        EffectKind::Held => {
                            if effect.sustained {
                                effect.scale = (effect.scale + self.cfg.held_grow * dt)
                                    .min(self.cfg.held_max_scale);
                            } else {
                                effect.phase = EffectPhase::Released;
                            }
                            effect.sustained = false;
                        }
                        EffectKind::Sparkle => {
                            if effect.age > self.cfg.sparkle_life {
                                effect.phase = EffectPhase::Released;
                            }
                        }
                    }
                }
                EffectPhase::Transforming => {
                    effect.scale -= self.cfg.transform_shrink * dt;
                    effect.opacity = (effect.opacity - self.cfg.transform_shrink * dt).max(0.1);
                    if effect.scale <= 0.0 {
                        bursts.push((
                            effect.anchor_id.clone(),
                            effect.position,
                            effect.offset,
                        ));
                    }
                }
                EffectPhase::Released => {
                    effect.opacity -= self.cfg.release_fade * dt;
                }
            }
        }

        self.effects
            .retain(|e| e.opacity > 0.0 && !(e.phase == EffectPhase::Transforming && e.scale <= 0.0));

        for (anchor_id, point, offset) in bursts {
            self.spawn_burst(&anchor_id, point, offset, rng);
        }

        for particle in &mut self.particles {
            // Ballistic convergence: pull grows with distance, size shrinks
            particle.velocity += (particle.target - particle.position) * self.cfg.converge_rate * dt;
            particle.position += particle.velocity * dt;
            particle.size -= particle.size * self.cfg.particle_shrink * dt;
        }
        self.particles
            .retain(|p| p.size > 0.4 && (p.position - p.target).length() > 1.0);
    }

    /// Secondary sparkle plus a ring of particles converging on `point`
    fn spawn_burst(&mut self, anchor_id: &str, point: Vec2, offset: Vec2, rng: &mut impl Rng) {
        self.effects.push(EphemeralEffect {
            id: EntityId::new(),
            anchor_id: anchor_id.to_string(),
            offset,
            position: point,
            opacity: 1.0,
            scale: 0.6,
            phase: EffectPhase::Attached,
            kind: EffectKind::Sparkle,
            age: 0.0,
            sustained: false,
        });

        for _ in 0..self.cfg.burst_count {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let radius = self.cfg.burst_radius * (0.5 + rng.random::<f32>() * 0.5);
            let position = point + Vec2::new(angle.cos(), angle.sin()) * radius;
            // Slight tangential kick so particles spiral in rather than beeline
            let tangent = Vec2::new(-angle.sin(), angle.cos());
            self.particles.push(BurstParticle {
                id: EntityId::new(),
                position,
                size: 2.0 + rng.random::<f32>() * 2.0,
                velocity: tangent * (20.0 + rng.random::<f32>() * 20.0),
                target: point,
            });
        }
        log::debug!(
            "Transformation burst on anchor '{}': {} particles",
            anchor_id,
            self.cfg.burst_count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[derive(Default)]
    struct MapAnchors {
        centroids: AHashMap<String, Vec2>,
    }

    impl MapAnchors {
        fn with(pairs: &[(&str, Vec2)]) -> Self {
            Self {
                centroids: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
            }
        }
    }

    impl AnchorLookup for MapAnchors {
        fn centroid(&self, anchor_id: &str) -> Option<Vec2> {
            self.centroids.get(anchor_id).copied()
        }
        fn perch_point(&self, anchor_id: &str, _t: f32) -> Option<Vec2> {
            self.centroid(anchor_id)
        }
        fn missing_frames(&self, anchor_id: &str) -> Option<u32> {
            self.centroids.get(anchor_id).map(|_| 0)
        }
        fn span(&self, anchor_id: &str) -> Option<f32> {
            self.centroids.get(anchor_id).map(|_| 100.0)
        }
    }

    #[test]
    fn test_attached_effect_tracks_anchor_with_fixed_offset() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(20);
        let mut pipeline = EffectPipeline::new(EffectConfig::default());
        pipeline.drop_at("Head", Vec2::new(110.0, 90.0), Vec2::new(100.0, 100.0));

        let anchors = MapAnchors::with(&[("Head", Vec2::new(150.0, 130.0))]);
        pipeline.update(1.0 / 60.0, &anchors, &[], &mut rng);

        let effect = pipeline.effects().next().unwrap();
        assert_eq!(effect.position, Vec2::new(160.0, 120.0));
    }

    #[test]
    fn test_lost_anchor_releases_and_fades() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(21);
        let mut pipeline = EffectPipeline::new(EffectConfig::default());
        pipeline.drop_at("Head", Vec2::new(110.0, 90.0), Vec2::new(100.0, 100.0));

        let empty = MapAnchors::default();
        pipeline.update(1.0 / 60.0, &empty, &[], &mut rng);
        assert_eq!(pipeline.effects().next().unwrap().phase, EffectPhase::Released);

        for _ in 0..120 {
            pipeline.update(1.0 / 60.0, &empty, &[], &mut rng);
        }
        assert_eq!(pipeline.effect_count(), 0);
    }

    #[test]
    fn test_interactor_transforms_then_bursts() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(22);
        let cfg = EffectConfig::default();
        let burst_count = cfg.burst_count;
        let mut pipeline = EffectPipeline::new(cfg);
        pipeline.drop_at("Head", Vec2::new(100.0, 100.0), Vec2::new(100.0, 100.0));

        let anchors = MapAnchors::with(&[("Head", Vec2::new(100.0, 100.0))]);
        let hand = Interactor {
            anchor_id: "Hand_0".into(),
            position: Vec2::new(105.0, 100.0),
            radius: 80.0,
        };

        pipeline.update(1.0 / 60.0, &anchors, &[hand.clone()], &mut rng);
        assert_eq!(
            pipeline.effects().next().unwrap().phase,
            EffectPhase::Transforming
        );

        // Run until the transformation completes
        for _ in 0..120 {
            pipeline.update(1.0 / 60.0, &anchors, &[hand.clone()], &mut rng);
            if pipeline.particle_count() > 0 {
                break;
            }
        }
        assert_eq!(pipeline.particle_count(), burst_count);
        assert!(pipeline
            .effects()
            .any(|e| e.kind == EffectKind::Sparkle && e.phase == EffectPhase::Attached));
        assert!(!pipeline.effects().any(|e| e.kind == EffectKind::Dropping));
    }

    #[test]
    fn test_own_anchor_does_not_trigger_transformation() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(23);
        let mut pipeline = EffectPipeline::new(EffectConfig::default());
        pipeline.drop_at("Hand_0", Vec2::new(100.0, 100.0), Vec2::new(100.0, 100.0));

        let anchors = MapAnchors::with(&[("Hand_0", Vec2::new(100.0, 100.0))]);
        let same_hand = Interactor {
            anchor_id: "Hand_0".into(),
            position: Vec2::new(100.0, 100.0),
            radius: 80.0,
        };
        pipeline.update(1.0 / 60.0, &anchors, &[same_hand], &mut rng);
        assert_eq!(pipeline.effects().next().unwrap().phase, EffectPhase::Attached);
    }

    #[test]
    fn test_particles_converge_and_terminate() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(24);
        let mut pipeline = EffectPipeline::new(EffectConfig::default());
        let point = Vec2::new(200.0, 200.0);
        pipeline.spawn_burst("Head", point, Vec2::ZERO, &mut rng);
        assert!(pipeline.particle_count() > 0);

        let anchors = MapAnchors::with(&[("Head", point)]);
        let mean_dist = |p: &EffectPipeline| -> f32 {
            p.particles()
                .map(|p| (p.position - point).length())
                .sum::<f32>()
                / p.particle_count().max(1) as f32
        };
        let initial = mean_dist(&pipeline);

        // Half a second of convergence pulls the swarm inward
        for _ in 0..30 {
            pipeline.update(1.0 / 60.0, &anchors, &[], &mut rng);
        }
        assert!(pipeline.particle_count() > 0);
        assert!(mean_dist(&pipeline) < initial);

        // Shrinking self-terminates every particle
        for _ in 0..(60 * 20) {
            pipeline.update(1.0 / 60.0, &anchors, &[], &mut rng);
            if pipeline.particle_count() == 0 {
                break;
            }
        }
        assert_eq!(pipeline.particle_count(), 0, "particles never terminated");
    }

    #[test]
    fn test_held_effect_grows_then_fades_on_release() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(25);
        let mut pipeline = EffectPipeline::new(EffectConfig::default());
        let anchors = MapAnchors::with(&[("Hand_0", Vec2::new(100.0, 100.0))]);

        let id = pipeline.begin_held("Hand_0", Vec2::new(100.0, 100.0), Vec2::new(0.0, -20.0));
        let start_scale = pipeline.effects().next().unwrap().scale;

        for _ in 0..60 {
            pipeline.sustain(id);
            pipeline.update(1.0 / 60.0, &anchors, &[], &mut rng);
        }
        let grown = pipeline.effects().next().unwrap().scale;
        assert!(grown > start_scale);
        assert!(grown <= EffectConfig::default().held_max_scale);

        // Stop sustaining: detaches and fades out
        pipeline.update(1.0 / 60.0, &anchors, &[], &mut rng);
        assert_eq!(pipeline.effects().next().unwrap().phase, EffectPhase::Released);
        for _ in 0..180 {
            pipeline.update(1.0 / 60.0, &anchors, &[], &mut rng);
        }
        assert_eq!(pipeline.effect_count(), 0);
    }
}
