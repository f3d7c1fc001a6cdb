//! Creature population management and spawn control
//!
//! Capacity is enforced at spawn time only: a pair that is at its limit
//! rejects new spawns, but creatures already alive are never retroactively
//! culled. The global randomized spawn interval lives in [`SpawnThrottle`]
//! and is applied by the caller to trigger signals, not inside `try_spawn`.

use ahash::AHashMap;
use glam::Vec2;
use rand::Rng;
use thiserror::Error;

use crate::config::{MotionConfig, SpawnConfig};
use crate::creature::Creature;
use crate::species::{SpeciesCatalog, SpeciesError};
use crate::traits::{AnchorLookup, AssetRegistry};
use crate::types::{CreatureKind, EntityId, Lifecycle};

/// Why a spawn attempt was rejected
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("live population for anchor '{anchor}' is at capacity ({capacity})")]
    AtCapacity { anchor: String, capacity: usize },
    #[error("global population cap reached ({0})")]
    PopulationCap(usize),
    #[error("species catalog has no profiles of the requested kind")]
    NoSpecies,
    #[error("species profile rejected: {0}")]
    InvalidProfile(#[from] SpeciesError),
    #[error("assets for species '{0}' are not ready")]
    AssetsNotReady(String),
}

/// A dropped-item request produced by a perched creature this tick
#[derive(Debug, Clone)]
pub struct DropRequest {
    pub anchor_id: String,
    pub position: Vec2,
}

/// Manages the live creature population
pub struct CreatureManager {
    creatures: AHashMap<EntityId, Creature>,
    cfg: SpawnConfig,
}

impl CreatureManager {
    pub fn new(cfg: SpawnConfig) -> Self {
        Self {
            creatures: AHashMap::new(),
            cfg,
        }
    }

    pub fn count(&self) -> usize {
        self.creatures.len()
    }

    /// Creatures that have not yet left (anything but FlyingAway)
    pub fn live_count(&self) -> usize {
        self.creatures
            .values()
            .filter(|c| c.lifecycle != Lifecycle::FlyingAway)
            .count()
    }

    /// Live creatures of `kind` bound to `anchor_id`
    pub fn live_count_for(&self, anchor_id: &str, kind: CreatureKind) -> usize {
        self.creatures
            .values()
            .filter(|c| {
                c.lifecycle != Lifecycle::FlyingAway
                    && c.kind() == kind
                    && c.anchor_id == anchor_id
            })
            .count()
    }

    pub fn get(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Attempt to create one creature bound to `anchor_id`
    ///
    /// `anchor_scale` converts the anchor's on-screen span into a size factor;
    /// `perch_t` pins the perch parameter (bursts), otherwise it is sampled.
    #[allow(clippy::too_many_arguments)]
    pub fn try_spawn(
        &mut self,
        anchor_id: &str,
        kind: CreatureKind,
        catalog: &SpeciesCatalog,
        assets: &impl AssetRegistry,
        viewport: Vec2,
        anchor_scale: f32,
        perch_t: Option<f32>,
        motion: &MotionConfig,
        rng: &mut impl Rng,
    ) -> Result<EntityId, SpawnError> {
        if self.live_count() >= self.cfg.max_population {
            return Err(SpawnError::PopulationCap(self.cfg.max_population));
        }
        if self.live_count_for(anchor_id, kind) >= self.cfg.per_anchor_capacity {
            return Err(SpawnError::AtCapacity {
                anchor: anchor_id.to_string(),
                capacity: self.cfg.per_anchor_capacity,
            });
        }

        let species = catalog
            .choose_of_kind(kind, rng)
            .ok_or(SpawnError::NoSpecies)?;
        species.validate()?;
        if let Some(asset) = &species.asset {
            if !assets.is_ready(asset) {
                return Err(SpawnError::AssetsNotReady(species.name.clone()));
            }
        }

        let origin = self.edge_origin(viewport, rng);
        let wander = viewport * 0.5;
        let size = species.sample_size(anchor_scale, rng);
        let t = perch_t.unwrap_or_else(|| 0.05 + rng.random::<f32>() * 0.9);
        let creature = Creature::new(
            anchor_id.to_string(),
            species,
            t,
            origin,
            wander,
            size,
            motion,
            rng,
        );
        let id = creature.id;
        self.creatures.insert(id, creature);

        log::info!(
            "Spawned {:?} creature {} for anchor '{}'. Population: {}/{}",
            kind,
            id,
            anchor_id,
            self.live_count(),
            self.cfg.max_population
        );
        Ok(id)
    }

    /// First-trigger burst at fixed perch parameters; capacity still binds
    /// per call. Returns the number of creatures actually created.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_burst(
        &mut self,
        anchor_id: &str,
        kind: CreatureKind,
        catalog: &SpeciesCatalog,
        assets: &impl AssetRegistry,
        viewport: Vec2,
        anchor_scale: f32,
        motion: &MotionConfig,
        rng: &mut impl Rng,
    ) -> usize {
        let offsets = self.cfg.burst_offsets.clone();
        offsets
            .iter()
            .filter(|&&t| {
                self.try_spawn(
                    anchor_id,
                    kind,
                    catalog,
                    assets,
                    viewport,
                    anchor_scale,
                    Some(t),
                    motion,
                    rng,
                )
                .is_ok()
            })
            .count()
    }

    /// Scare creatures bound to `anchor_id`, or every creature when `None`
    pub fn scare(&mut self, anchor_id: Option<&str>) {
        for creature in self.creatures.values_mut() {
            if anchor_id.is_none_or(|id| creature.anchor_id == id) {
                creature.scare();
            }
        }
    }

    /// Advance every creature one tick against the anchor snapshot
    ///
    /// Returns dropped-item requests for the effect pipeline.
    pub fn update(
        &mut self,
        dt: f32,
        anchors: &impl AnchorLookup,
        viewport: Vec2,
        motion: &MotionConfig,
        rng: &mut impl Rng,
    ) -> Vec<DropRequest> {
        let mut drops = Vec::new();

        let ids: Vec<EntityId> = self.creatures.keys().copied().collect();
        for id in ids {
            let Some(creature) = self.creatures.get_mut(&id) else {
                continue;
            };
            let perch = resolve_perch(anchors, &creature.anchor_id, creature.perch_t);
            creature.update(dt, perch, motion, rng);

            if creature.lifecycle == Lifecycle::Perched && creature.take_drop() {
                if let Some(position) = perch {
                    drops.push(DropRequest {
                        anchor_id: creature.anchor_id.clone(),
                        position,
                    });
                }
            }
        }

        self.repel_perched_siblings(dt, motion);

        let before = self.creatures.len();
        let margin = self.cfg.edge_margin;
        self.creatures
            .retain(|_, c| !(c.lifecycle == Lifecycle::FlyingAway && c.is_outside(viewport, margin)));
        let removed = before - self.creatures.len();
        if removed > 0 {
            log::debug!("Removed {} departed creatures", removed);
        }

        drops
    }

    /// Pairwise perch-parameter repulsion between perched birds sharing an
    /// anchor. O(n^2) over perched creatures, fine below ~100 entities.
    fn repel_perched_siblings(&mut self, dt: f32, motion: &MotionConfig) {
        let perched: Vec<(EntityId, String, f32, f32)> = self
            .creatures
            .values()
            .filter(|c| c.lifecycle == Lifecycle::Perched && c.kind() == CreatureKind::Bird)
            .map(|c| (c.id, c.anchor_id.clone(), c.perch_t, c.size))
            .collect();

        let mut pushes: AHashMap<EntityId, f32> = AHashMap::new();
        for (i, (id_a, anchor_a, t_a, size_a)) in perched.iter().enumerate() {
            for (id_b, anchor_b, t_b, size_b) in perched.iter().skip(i + 1) {
                if anchor_a != anchor_b {
                    continue;
                }
                let separation = (t_a - t_b).abs();
                let needed = (size_a + size_b) / motion.repulse_sep_scale;
                if separation >= needed {
                    continue;
                }
                let magnitude = (needed - separation) * motion.repulse_rate * dt;
                let sign = if t_a >= t_b { 1.0 } else { -1.0 };
                *pushes.entry(*id_a).or_default() += sign * magnitude;
                *pushes.entry(*id_b).or_default() -= sign * magnitude;
            }
        }

        for (id, push) in pushes {
            if let Some(creature) = self.creatures.get_mut(&id) {
                creature.perch_t = (creature.perch_t + push).clamp(0.0, 1.0);
            }
        }
    }

    /// Random off-screen origin along the top, left or right edge
    ///
    /// Origins sit beyond the removal margin so an escaping creature that
    /// homes on its origin always crosses the removal line on the way.
    fn edge_origin(&self, viewport: Vec2, rng: &mut impl Rng) -> Vec2 {
        let margin = self.cfg.edge_margin * 1.5;
        match rng.random_range(0..3u8) {
            0 => Vec2::new(rng.random::<f32>() * viewport.x, -margin),
            1 => Vec2::new(-margin, rng.random::<f32>() * viewport.y * 0.5),
            _ => Vec2::new(viewport.x + margin, rng.random::<f32>() * viewport.y * 0.5),
        }
    }
}

fn resolve_perch(anchors: &impl AnchorLookup, anchor_id: &str, t: f32) -> Option<Vec2> {
    anchors.perch_point(anchor_id, t).filter(|p| p.is_finite())
}

/// Global randomized minimum interval between spawns
///
/// Prevents bursts even when several anchors become eligible in the same
/// tick; capacity checks remain per-call in `try_spawn`.
#[derive(Debug, Default)]
pub struct SpawnThrottle {
    cooldown: f32,
}

impl SpawnThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    /// Take the spawn slot for this interval if it is free
    pub fn try_acquire(&mut self, cfg: &SpawnConfig, rng: &mut impl Rng) -> bool {
        if self.cooldown > 0.0 {
            return false;
        }
        self.cooldown = cfg.min_interval + rng.random::<f32>() * cfg.interval_jitter;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::SpeciesProfile;
    use crate::traits::AlwaysReady;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    struct NoAnchors;

    impl AnchorLookup for NoAnchors {
        fn centroid(&self, _: &str) -> Option<Vec2> {
            None
        }
        fn perch_point(&self, _: &str, _: f32) -> Option<Vec2> {
            None
        }
        fn missing_frames(&self, _: &str) -> Option<u32> {
            None
        }
        fn span(&self, _: &str) -> Option<f32> {
            None
        }
    }

    fn catalog() -> SpeciesCatalog {
        let mut catalog = SpeciesCatalog::new();
        catalog.push(SpeciesProfile::bird("sparrow"));
        catalog.push(SpeciesProfile::butterfly("monarch"));
        catalog
    }

    fn spawn_cfg(capacity: usize) -> SpawnConfig {
        SpawnConfig {
            per_anchor_capacity: capacity,
            ..SpawnConfig::default()
        }
    }

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    #[test]
    fn test_capacity_holds_under_burst_calls() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(10);
        let mut manager = CreatureManager::new(spawn_cfg(3));
        let catalog = catalog();
        let motion = MotionConfig::default();

        let mut spawned = 0;
        for _ in 0..5 {
            if manager
                .try_spawn(
                    "Hand_0",
                    CreatureKind::Bird,
                    &catalog,
                    &AlwaysReady,
                    VIEWPORT,
                    1.0,
                    None,
                    &motion,
                    &mut rng,
                )
                .is_ok()
            {
                spawned += 1;
            }
        }

        assert_eq!(spawned, 3);
        assert_eq!(manager.live_count_for("Hand_0", CreatureKind::Bird), 3);
        assert!(manager.live_count_for("Hand_0", CreatureKind::Bird) <= 3);
    }

    #[test]
    fn test_capacity_is_per_anchor_and_kind() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let mut manager = CreatureManager::new(spawn_cfg(2));
        let catalog = catalog();
        let motion = MotionConfig::default();

        for anchor in ["Hand_0", "Hand_1"] {
            for kind in [CreatureKind::Bird, CreatureKind::Butterfly] {
                for _ in 0..4 {
                    let _ = manager.try_spawn(
                        anchor,
                        kind,
                        &catalog,
                        &AlwaysReady,
                        VIEWPORT,
                        1.0,
                        None,
                        &motion,
                        &mut rng,
                    );
                }
                assert_eq!(manager.live_count_for(anchor, kind), 2);
            }
        }
        assert_eq!(manager.count(), 8);
    }

    #[test]
    fn test_global_population_cap() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(12);
        let cfg = SpawnConfig {
            per_anchor_capacity: 100,
            max_population: 5,
            ..SpawnConfig::default()
        };
        let mut manager = CreatureManager::new(cfg);
        let catalog = catalog();
        let motion = MotionConfig::default();

        for i in 0..10 {
            let anchor = format!("Hand_{i}");
            let _ = manager.try_spawn(
                &anchor,
                CreatureKind::Bird,
                &catalog,
                &AlwaysReady,
                VIEWPORT,
                1.0,
                None,
                &motion,
                &mut rng,
            );
        }
        assert_eq!(manager.count(), 5);

        let err = manager
            .try_spawn(
                "Hand_x",
                CreatureKind::Bird,
                &catalog,
                &AlwaysReady,
                VIEWPORT,
                1.0,
                None,
                &motion,
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(err, SpawnError::PopulationCap(5)));
    }

    #[test]
    fn test_invalid_profile_rejected_at_spawn() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(13);
        let mut manager = CreatureManager::new(spawn_cfg(5));
        let mut catalog = SpeciesCatalog::new();
        let mut broken = SpeciesProfile::bird("broken");
        broken.base_size = -1.0;
        catalog.push(broken);
        let motion = MotionConfig::default();

        let err = manager
            .try_spawn(
                "Head",
                CreatureKind::Bird,
                &catalog,
                &AlwaysReady,
                VIEWPORT,
                1.0,
                None,
                &motion,
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(err, SpawnError::InvalidProfile(_)));
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_empty_catalog_is_no_species() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(14);
        let mut manager = CreatureManager::new(spawn_cfg(5));
        let motion = MotionConfig::default();

        let err = manager
            .try_spawn(
                "Head",
                CreatureKind::Bird,
                &SpeciesCatalog::new(),
                &AlwaysReady,
                VIEWPORT,
                1.0,
                None,
                &motion,
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(err, SpawnError::NoSpecies));
    }

    #[test]
    fn test_burst_uses_fixed_offsets() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(15);
        let mut manager = CreatureManager::new(spawn_cfg(10));
        let catalog = catalog();
        let motion = MotionConfig::default();

        let spawned = manager.spawn_burst(
            "Hand_0",
            CreatureKind::Bird,
            &catalog,
            &AlwaysReady,
            VIEWPORT,
            1.0,
            &motion,
            &mut rng,
        );
        assert_eq!(spawned, 5);

        let mut offsets: Vec<f32> = manager.iter().map(|c| c.perch_t).collect();
        offsets.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(offsets, vec![0.1, 0.3, 0.5, 0.7, 0.9]);
    }

    #[test]
    fn test_scare_is_anchor_scoped() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(16);
        let mut manager = CreatureManager::new(spawn_cfg(5));
        let catalog = catalog();
        let motion = MotionConfig::default();

        for anchor in ["Hand_0", "Head"] {
            manager
                .try_spawn(
                    anchor,
                    CreatureKind::Bird,
                    &catalog,
                    &AlwaysReady,
                    VIEWPORT,
                    1.0,
                    None,
                    &motion,
                    &mut rng,
                )
                .unwrap();
        }

        manager.scare(Some("Hand_0"));
        for creature in manager.iter() {
            if creature.anchor_id == "Hand_0" {
                assert_eq!(creature.lifecycle, Lifecycle::FlyingAway);
            } else {
                assert_ne!(creature.lifecycle, Lifecycle::FlyingAway);
            }
        }

        manager.scare(None);
        assert!(manager.iter().all(|c| c.lifecycle == Lifecycle::FlyingAway));
    }

    #[test]
    fn test_departed_creatures_are_removed() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(17);
        let mut manager = CreatureManager::new(spawn_cfg(5));
        let catalog = catalog();
        let motion = MotionConfig::default();

        manager
            .try_spawn(
                "Hand_0",
                CreatureKind::Bird,
                &catalog,
                &AlwaysReady,
                VIEWPORT,
                1.0,
                None,
                &motion,
                &mut rng,
            )
            .unwrap();
        manager.scare(None);

        for _ in 0..(60 * 20) {
            manager.update(1.0 / 60.0, &NoAnchors, VIEWPORT, &motion, &mut rng);
            if manager.count() == 0 {
                break;
            }
        }
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_scared_creature_on_screen_is_eventually_removed() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(28);
        let mut manager = CreatureManager::new(spawn_cfg(5));
        let catalog = catalog();
        let motion = MotionConfig::default();

        let id = manager
            .try_spawn(
                "Hand_0",
                CreatureKind::Bird,
                &catalog,
                &AlwaysReady,
                VIEWPORT,
                1.0,
                None,
                &motion,
                &mut rng,
            )
            .unwrap();
        // Scared mid-screen, far from its spawn origin
        manager.creatures.get_mut(&id).unwrap().position = VIEWPORT * 0.5;
        manager.scare(Some("Hand_0"));

        for _ in 0..(60 * 120) {
            manager.update(1.0 / 60.0, &NoAnchors, VIEWPORT, &motion, &mut rng);
            if manager.count() == 0 {
                break;
            }
        }
        assert_eq!(manager.count(), 0, "fleeing creature parked off-screen");
    }

    #[test]
    fn test_spawn_origins_lie_beyond_the_removal_margin() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(29);
        let cfg = spawn_cfg(1);
        let margin = cfg.edge_margin;
        let mut manager = CreatureManager::new(cfg);
        let catalog = catalog();
        let motion = MotionConfig::default();

        for i in 0..20 {
            let anchor = format!("Hand_{i}");
            manager
                .try_spawn(
                    &anchor,
                    CreatureKind::Bird,
                    &catalog,
                    &AlwaysReady,
                    VIEWPORT,
                    1.0,
                    None,
                    &motion,
                    &mut rng,
                )
                .unwrap();
        }
        for creature in manager.iter() {
            assert!(
                creature.is_outside(VIEWPORT, margin),
                "origin {} is inside the removal margin",
                creature.origin
            );
        }
    }

    #[test]
    fn test_repulsion_spreads_perched_siblings() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(18);
        let mut manager = CreatureManager::new(spawn_cfg(5));
        let catalog = catalog();
        let motion = MotionConfig::default();

        let a = manager
            .try_spawn(
                "Hand_0",
                CreatureKind::Bird,
                &catalog,
                &AlwaysReady,
                VIEWPORT,
                1.0,
                Some(0.50),
                &motion,
                &mut rng,
            )
            .unwrap();
        let b = manager
            .try_spawn(
                "Hand_0",
                CreatureKind::Bird,
                &catalog,
                &AlwaysReady,
                VIEWPORT,
                1.0,
                Some(0.51),
                &motion,
                &mut rng,
            )
            .unwrap();

        for id in [a, b] {
            manager.creatures.get_mut(&id).unwrap().lifecycle = Lifecycle::Perched;
        }

        for _ in 0..60 {
            manager.repel_perched_siblings(1.0 / 60.0, &motion);
        }

        let t_a = manager.get(a).unwrap().perch_t;
        let t_b = manager.get(b).unwrap().perch_t;
        let needed = (manager.get(a).unwrap().size + manager.get(b).unwrap().size)
            / motion.repulse_sep_scale;
        assert!((t_a - t_b).abs() >= needed * 0.9);
        assert!((0.0..=1.0).contains(&t_a));
        assert!((0.0..=1.0).contains(&t_b));
    }

    #[test]
    fn test_throttle_enforces_interval() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(19);
        let cfg = SpawnConfig::default();
        let mut throttle = SpawnThrottle::new();

        assert!(throttle.try_acquire(&cfg, &mut rng));
        assert!(!throttle.try_acquire(&cfg, &mut rng));

        // Under the minimum interval: still throttled
        throttle.tick(cfg.min_interval * 0.5);
        assert!(!throttle.try_acquire(&cfg, &mut rng));

        // Past minimum plus maximum jitter: free again
        throttle.tick(cfg.min_interval + cfg.interval_jitter);
        assert!(throttle.try_acquire(&cfg, &mut rng));
    }
}
