//! The per-frame stage: one cooperative tick over the whole pipeline
//!
//! Single-threaded by contract. Each tick runs strictly in order: ingest
//! observations, age/evict anchors, evaluate spawn triggers against the
//! resulting snapshot, update creatures and effects against that same
//! snapshot, filter out departed entities, return to the caller for
//! rendering. The stage is the only writer of anchor/creature/effect state.

use ahash::{AHashMap, AHashSet};
use glam::Vec2;
use rand::Rng;

use perchling_creature::{
    AnchorLookup, AssetRegistry, CreatureKind, CreatureManager, CreatureView, EffectPipeline,
    EffectView, EntityId, Interactor, ParticleView, SpawnThrottle, SpeciesCatalog,
};

use crate::config::StageConfig;
use crate::curve::AnchorCategory;
use crate::events::AnchorEvent;
use crate::tracker::{AnchorObservation, AnchorTracker};

/// External semantic trigger for one frame
///
/// The detection of smiles, fists and held gestures happens in the external
/// perception collaborator; the stage treats these purely as trigger inputs.
#[derive(Debug, Clone)]
pub enum SemanticSignal {
    /// A sustained positive signal authorizes a spawn attempt on this anchor
    SpawnTrigger {
        anchor_id: String,
        kind: CreatureKind,
    },
    /// Scare creatures bound to an anchor, or all of them when `None`
    Scare { anchor_id: Option<String> },
    /// A held gesture sustains (or starts) a growing effect on this anchor
    HeldGesture { anchor_id: String },
    /// Place a dropped-item effect at a world point on this anchor
    DropItem { anchor_id: String, point: Vec2 },
}

/// Everything the outside world feeds into one tick
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Seconds since the previous tick; capped by `StageConfig::max_delta_time`
    pub dt: f32,
    pub observations: Vec<AnchorObservation>,
    pub signals: Vec<SemanticSignal>,
}

/// Owns the tracker, the creature population and the effect pipeline
pub struct Stage {
    tracker: AnchorTracker,
    creatures: CreatureManager,
    effects: EffectPipeline,
    throttle: SpawnThrottle,
    catalog: SpeciesCatalog,
    cfg: StageConfig,
    viewport: Vec2,
    /// Anchors that already received their first-trigger burst
    bursted: AHashSet<String>,
    /// Active held effect per anchor
    held: AHashMap<String, EntityId>,
}

impl Stage {
    pub fn new(cfg: StageConfig, catalog: SpeciesCatalog, viewport: Vec2) -> Self {
        Self {
            tracker: AnchorTracker::new(cfg.tracker.clone(), cfg.curve.clone()),
            creatures: CreatureManager::new(cfg.spawn.clone()),
            effects: EffectPipeline::new(cfg.effects.clone()),
            throttle: SpawnThrottle::new(),
            catalog,
            cfg,
            viewport,
            bursted: AHashSet::new(),
            held: AHashMap::new(),
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn tracker(&self) -> &AnchorTracker {
        &self.tracker
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.count()
    }

    pub fn live_creature_count(&self) -> usize {
        self.creatures.live_count()
    }

    /// Public per-creature state for the external renderer
    pub fn creature_views(&self) -> Vec<CreatureView> {
        self.creatures.iter().map(CreatureView::from).collect()
    }

    /// Public per-effect state for the external renderer
    pub fn effect_views(&self) -> Vec<EffectView> {
        self.effects.effects().map(EffectView::from).collect()
    }

    /// Public particle state for the external renderer
    pub fn particle_views(&self) -> Vec<ParticleView> {
        self.effects.particles().map(ParticleView::from).collect()
    }

    /// Run one frame. Returns the anchor events emitted this tick, for
    /// external telemetry; the stage has already applied them internally.
    pub fn tick(
        &mut self,
        frame: FrameInput,
        assets: &impl AssetRegistry,
        rng: &mut impl Rng,
    ) -> Vec<AnchorEvent> {
        // A stall must not integrate as one giant step
        let dt = frame.dt.clamp(0.0, self.cfg.max_delta_time);

        // Phase 1: ingest all observations for the frame
        for obs in frame.observations {
            self.tracker.ingest(obs);
        }

        // Phase 2: age and evict anchors not observed this frame
        self.tracker.tick();
        let events = self.tracker.drain_events();

        // Phase 3: spawn triggers against the fresh snapshot
        self.throttle.tick(dt);
        for signal in frame.signals {
            self.apply_signal(signal, assets, rng);
        }

        // Disturbance and loss scare bound creatures; loss also re-arms the
        // anchor's first-trigger burst for a future reappearance
        for event in &events {
            match event {
                AnchorEvent::Disturbed { anchor_id, .. } => {
                    self.creatures.scare(Some(anchor_id));
                }
                AnchorEvent::Lost { anchor_id, .. } => {
                    self.creatures.scare(Some(anchor_id));
                    self.bursted.remove(anchor_id);
                    self.held.remove(anchor_id);
                }
            }
        }

        // Phase 4: update creatures and effects against the same snapshot
        let drops = self.creatures.update(
            dt,
            &self.tracker,
            self.viewport,
            &self.cfg.motion,
            rng,
        );
        for drop in drops {
            if let Some(centroid) = AnchorLookup::centroid(&self.tracker, &drop.anchor_id) {
                self.effects.drop_at(&drop.anchor_id, drop.position, centroid);
            }
        }

        let interactors = self.hand_interactors();
        self.effects.update(dt, &self.tracker, &interactors, rng);

        // Phase 5: hand control back to the caller for rendering
        events
    }

    fn apply_signal(
        &mut self,
        signal: SemanticSignal,
        assets: &impl AssetRegistry,
        rng: &mut impl Rng,
    ) {
        match signal {
            SemanticSignal::SpawnTrigger { anchor_id, kind } => {
                let Some(anchor) = self.tracker.get(&anchor_id) else {
                    return;
                };
                let scale = anchor_scale(anchor.category, anchor.span);

                if !self.bursted.contains(&anchor_id) {
                    self.bursted.insert(anchor_id.clone());
                    // The burst takes the spawn slot too; follow-up triggers
                    // wait out a full interval
                    let _ = self.throttle.try_acquire(&self.cfg.spawn, rng);
                    self.creatures.spawn_burst(
                        &anchor_id,
                        kind,
                        &self.catalog,
                        assets,
                        self.viewport,
                        scale,
                        &self.cfg.motion,
                        rng,
                    );
                } else if self.throttle.try_acquire(&self.cfg.spawn, rng) {
                    if let Err(err) = self.creatures.try_spawn(
                        &anchor_id,
                        kind,
                        &self.catalog,
                        assets,
                        self.viewport,
                        scale,
                        None,
                        &self.cfg.motion,
                        rng,
                    ) {
                        log::warn!("Spawn rejected for anchor '{}': {}", anchor_id, err);
                    }
                }
            }
            SemanticSignal::Scare { anchor_id } => {
                self.creatures.scare(anchor_id.as_deref());
                match anchor_id {
                    Some(id) => {
                        self.bursted.remove(&id);
                    }
                    None => self.bursted.clear(),
                }
            }
            SemanticSignal::HeldGesture { anchor_id } => {
                let Some(centroid) = AnchorLookup::centroid(&self.tracker, &anchor_id) else {
                    return;
                };
                match self.held.get(&anchor_id).copied() {
                    Some(id) if self.effects.held_on(&anchor_id) == Some(id) => {
                        self.effects.sustain(id);
                    }
                    _ => {
                        let span = AnchorLookup::span(&self.tracker, &anchor_id).unwrap_or(100.0);
                        let id =
                            self.effects
                                .begin_held(&anchor_id, centroid, Vec2::new(0.0, -span * 0.3));
                        self.held.insert(anchor_id, id);
                    }
                }
            }
            SemanticSignal::DropItem { anchor_id, point } => {
                if let Some(centroid) = AnchorLookup::centroid(&self.tracker, &anchor_id) {
                    self.effects.drop_at(&anchor_id, point, centroid);
                }
            }
        }
    }

    /// Hand anchors act as interactors for attached effects
    fn hand_interactors(&self) -> Vec<Interactor> {
        self.tracker
            .iter()
            .filter(|a| a.category == AnchorCategory::Hand)
            .map(|a| Interactor {
                anchor_id: a.id.clone(),
                position: a.centroid,
                radius: a.span.max(80.0) * self.cfg.effects.interact_factor,
            })
            .collect()
    }
}

/// Anchor span to creature size factor: a hand around 100px wide maps to
/// 0.75, head perchers are halved
fn anchor_scale(category: AnchorCategory, span: f32) -> f32 {
    let base = span.max(50.0) / 100.0 * 0.75;
    match category {
        AnchorCategory::Head => base * 0.5,
        _ => base,
    }
}
