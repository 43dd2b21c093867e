//! Particle engine: the four entity pools and everything that spawns into them.
//!
//! The engine is the only writer of its pools. Renderers get [`PoolSnapshot`]s,
//! which are computed views and cannot reach back into live entities.

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::rc::Rc;

use crate::config::{AmbientMode, EngineConfig};
use crate::model::{Color, Entity, EntityId, EntityKind, Fade, Link, Motion, PoolSnapshot, Vec2, Visual};
use crate::state::ambient::{AmbientField, drift_links};
use crate::state::pool::{IdSource, Pool};
use crate::state::rng::{JsRandom, RandomSource};
use crate::state::viewport::Viewport;

/// Spawn requests held back until the viewport has a size.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Deferred {
    Trail(Vec2, Color),
    Burst(Vec2, Color),
    Push(Vec2),
}

pub struct ParticleEngine {
    config: Rc<EngineConfig>,
    trail: Pool<Entity>,
    bursts: Pool<Entity>,
    ripples: Pool<Entity>,
    ambient: Pool<Entity>,
    field: AmbientField,
    viewport: Viewport,
    ids: IdSource,
    rng: Box<dyn RandomSource>,
    now: f64,
    last_advance: Option<f64>,
    repulsor: Option<Vec2>,
    deferred: VecDeque<Deferred>,
}

impl ParticleEngine {
    pub fn new(config: Rc<EngineConfig>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            trail: Pool::new(config.trail.capacity),
            bursts: Pool::new(config.burst.glyph_capacity),
            ripples: Pool::new(config.burst.ripple_capacity),
            ambient: Pool::new(config.ambient.capacity),
            field: AmbientField::new(config.ambient.mode),
            config,
            viewport: Viewport::default(),
            ids: IdSource::default(),
            rng,
            now: 0.0,
            last_advance: None,
            repulsor: None,
            deferred: VecDeque::new(),
        }
    }

    pub fn with_js_random(config: Rc<EngineConfig>) -> Self {
        Self::new(config, Box::new(JsRandom))
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        if viewport.is_laid_out() {
            let cfg = Rc::clone(&self.config);
            self.field.resize(viewport, &cfg.ambient, &mut self.ambient);
        }
    }

    /// Point the drift field shies away from; `None` when the pointer is hidden.
    pub fn set_repulsor(&mut self, at: Option<Vec2>) {
        self.repulsor = at.filter(|p| p.is_finite());
    }

    pub fn spawn_trail_glyph(&mut self, at: Vec2, color: Color) -> Option<EntityId> {
        if !self.accepts(at, Deferred::Trail(at, color)) {
            return None;
        }
        let cfg = Rc::clone(&self.config);
        let trail = &cfg.trail;
        let i = self.rng.index(trail.glyphs.len().max(1));
        let entity = Entity {
            id: self.ids.next_id(),
            kind: EntityKind::TrailGlyph,
            origin: at,
            position: at,
            motion: Motion::Drift { from: trail.start_offset, to: trail.end_offset },
            born_at: self.now,
            ttl_ms: trail.ttl_ms,
            visual: Visual::Glyph { text: trail.glyphs.get(i).cloned().unwrap_or_default(), size: trail.font_px },
            fade: Fade::EaseOut { opacity: (trail.start_opacity, 0.0), scale: (1.0, trail.end_scale) },
            color,
        };
        let id = entity.id;
        self.trail.push(entity);
        Some(id)
    }

    /// Always the full radial batch plus the full ripple set; a full pool evicts
    /// older entities rather than shrinking the burst.
    pub fn spawn_click_burst(&mut self, at: Vec2, color: Color) -> Vec<EntityId> {
        if !self.accepts(at, Deferred::Burst(at, color)) {
            return Vec::new();
        }
        let cfg = Rc::clone(&self.config);
        let burst = &cfg.burst;
        let mut spawned = Vec::with_capacity(burst.glyph_count + burst.ripple_count);

        let n = burst.glyph_count.max(1) as f64;
        for i in 0..burst.glyph_count {
            let jitter = self.rng.range(-1.0, 1.0) * burst.angle_jitter_deg;
            let angle = i as f64 * TAU / n + jitter.to_radians();
            let distance = burst.min_distance + self.rng.next_f64() * burst.distance_jitter;
            let k = self.rng.index(burst.keywords.len().max(1));
            let entity = Entity {
                id: self.ids.next_id(),
                kind: EntityKind::BurstGlyph,
                origin: at,
                position: at,
                motion: Motion::Radial { angle, distance },
                born_at: self.now,
                ttl_ms: burst.glyph_ttl_ms,
                visual: Visual::Glyph { text: burst.keywords.get(k).cloned().unwrap_or_default(), size: burst.font_px },
                fade: Fade::EaseOut { opacity: (1.0, 0.0), scale: (1.0, burst.end_scale) },
                color,
            };
            spawned.push(entity.id);
            self.bursts.push(entity);
        }

        for i in 0..burst.ripple_count {
            let delay_ms = i as f64 * burst.ripple_stagger_ms;
            let entity = Entity {
                id: self.ids.next_id(),
                kind: EntityKind::Ripple,
                origin: at,
                position: at,
                motion: Motion::Anchored,
                born_at: self.now,
                ttl_ms: delay_ms + burst.ripple_duration_ms,
                visual: Visual::Ring {
                    max_radius: burst.ripple_base_radius + burst.ripple_radius_step * i as f64,
                    delay_ms,
                },
                fade: Fade::Linear { opacity: (burst.ripple_start_opacity, 0.0), scale: (1.0, 1.0) },
                color,
            };
            spawned.push(entity.id);
            self.ripples.push(entity);
        }
        spawned
    }

    /// One ambient particle, independent of pointer state. `None` when ambient is
    /// off, the viewport has no size yet, or every rain column is occupied.
    pub fn spawn_ambient_particle(&mut self) -> Option<EntityId> {
        if !self.viewport.is_laid_out() {
            return None;
        }
        let cfg = Rc::clone(&self.config);
        self.field.spawn_one(
            self.now,
            self.viewport,
            &cfg.ambient,
            &mut self.ambient,
            self.rng.as_mut(),
            &mut self.ids,
        )
    }

    /// Drift mode click response: extra dots at `at`.
    pub fn push_ambient(&mut self, at: Vec2) -> usize {
        if self.field.mode() != AmbientMode::Drift || !self.accepts(at, Deferred::Push(at)) {
            return 0;
        }
        let cfg = Rc::clone(&self.config);
        self.field.push_at(
            at,
            self.now,
            self.viewport,
            &cfg.ambient,
            &mut self.ambient,
            self.rng.as_mut(),
            &mut self.ids,
        )
    }

    /// Age every pool to `now`. Time never runs backwards; a stalled frame is
    /// treated as at most `max_frame_dt_ms` of motion.
    pub fn advance(&mut self, now: f64) {
        let now = if now.is_finite() { now.max(self.now) } else { self.now };
        let dt_ms = match self.last_advance {
            Some(last) => (now - last).clamp(0.0, self.config.max_frame_dt_ms.max(0.0)),
            None => 0.0,
        };
        self.last_advance = Some(now);
        self.now = now;

        self.trail.retire_expired(now);
        self.bursts.retire_expired(now);
        self.ripples.retire_expired(now);

        if !self.viewport.is_laid_out() {
            return;
        }
        let cfg = Rc::clone(&self.config);
        self.field.age(
            now,
            dt_ms,
            self.viewport,
            &cfg.ambient,
            &mut self.ambient,
            self.rng.as_mut(),
            self.repulsor,
        );
        self.ambient.retire_expired(now);
        self.flush_deferred();
    }

    /// Ambient spawn policy for this frame. Call after pointer-driven spawns.
    pub fn run_ambient_policy(&mut self) {
        if !self.viewport.is_laid_out() {
            return;
        }
        let cfg = Rc::clone(&self.config);
        self.field.spawn_due(
            self.now,
            self.viewport,
            &cfg.ambient,
            &mut self.ambient,
            self.rng.as_mut(),
            &mut self.ids,
        );
    }

    pub fn pool(&self, kind: EntityKind) -> &Pool<Entity> {
        match kind {
            EntityKind::TrailGlyph => &self.trail,
            EntityKind::BurstGlyph => &self.bursts,
            EntityKind::Ripple => &self.ripples,
            EntityKind::Ambient => &self.ambient,
        }
    }

    /// Render-ready views of every pool at the current time, background first.
    pub fn snapshot(&self) -> Vec<PoolSnapshot> {
        [EntityKind::Ambient, EntityKind::TrailGlyph, EntityKind::BurstGlyph, EntityKind::Ripple]
            .into_iter()
            .map(|kind| PoolSnapshot {
                kind,
                entities: self.pool(kind).iter().map(|e| e.view(self.now)).collect(),
            })
            .collect()
    }

    pub fn links(&self) -> Vec<Link> {
        match self.field.mode() {
            AmbientMode::Drift => drift_links(&self.ambient, &self.config.ambient.drift),
            _ => Vec::new(),
        }
    }

    pub fn ambient_stepped(&self) -> bool {
        self.field.stepped()
    }

    pub fn entity_count(&self) -> usize {
        self.trail.len() + self.bursts.len() + self.ripples.len() + self.ambient.len()
    }

    pub fn pending_spawns(&self) -> usize {
        self.deferred.len()
    }

    pub fn clear(&mut self) {
        self.trail.clear();
        self.bursts.clear();
        self.ripples.clear();
        self.ambient.clear();
        self.deferred.clear();
    }

    /// Non-finite points are dropped; without a laid-out viewport the request is
    /// parked and replayed on the next frame that has one.
    fn accepts(&mut self, at: Vec2, request: Deferred) -> bool {
        if !at.is_finite() {
            log::debug!("dropping spawn at non-finite point {:?}", at);
            return false;
        }
        if self.viewport.is_laid_out() {
            return true;
        }
        if self.deferred.len() >= self.config.max_pending_events {
            self.deferred.pop_front();
        }
        log::debug!("viewport not laid out, deferring {:?}", request);
        self.deferred.push_back(request);
        false
    }

    fn flush_deferred(&mut self) {
        while let Some(request) = self.deferred.pop_front() {
            match request {
                Deferred::Trail(at, color) => {
                    self.spawn_trail_glyph(at, color);
                }
                Deferred::Burst(at, color) => {
                    self.spawn_click_burst(at, color);
                }
                Deferred::Push(at) => {
                    self.push_ambient(at);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::model::Shape;
    use crate::state::rng::SequenceRandom;

    const CYAN: Color = Color::rgb(0x00, 0xE5, 0xFF);

    fn engine_with(config: EngineConfig, rng: SequenceRandom) -> ParticleEngine {
        let mut engine = ParticleEngine::new(Rc::new(config), Box::new(rng));
        engine.set_viewport(Viewport::new(1280.0, 800.0));
        engine
    }

    fn quiet() -> EngineConfig {
        let mut cfg = EngineConfig::preset(Profile::Subtle);
        cfg.ambient.mode = AmbientMode::None;
        cfg
    }

    #[test]
    fn trail_pool_never_exceeds_capacity() {
        let mut engine = engine_with(quiet(), SequenceRandom::constant(0.3));
        let mut last = None;
        for i in 0..50 {
            last = engine.spawn_trail_glyph(Vec2::new(i as f64, 10.0), CYAN);
            assert!(engine.pool(EntityKind::TrailGlyph).len() <= 6);
        }
        let newest = engine.pool(EntityKind::TrailGlyph).iter().last().map(|e| e.id);
        assert_eq!(newest, last);
    }

    #[test]
    fn trail_glyph_carries_color_and_fresh_age() {
        let mut engine = engine_with(quiet(), SequenceRandom::constant(0.0));
        engine.advance(1_000.0);
        let react = Color::rgb(0x61, 0xDA, 0xFB);
        engine.spawn_trail_glyph(Vec2::new(100.0, 100.0), react);
        let glyph = engine.pool(EntityKind::TrailGlyph).iter().next().unwrap();
        assert_eq!(glyph.color, react);
        assert_eq!(glyph.born_at, 1_000.0);
        assert_eq!(glyph.visual, Visual::Glyph { text: "<".into(), size: 14.0 });
    }

    #[test]
    fn burst_keeps_its_shape_when_pools_are_full() {
        let mut engine = engine_with(quiet(), SequenceRandom::new(vec![0.2, 0.7, 0.4]));
        for _ in 0..20 {
            engine.spawn_click_burst(Vec2::new(300.0, 300.0), CYAN);
        }
        assert_eq!(engine.pool(EntityKind::BurstGlyph).len(), 64);
        assert_eq!(engine.pool(EntityKind::Ripple).len(), 16);

        let ids = engine.spawn_click_burst(Vec2::new(500.0, 500.0), CYAN);
        assert_eq!(ids.len(), 8 + 2);
        let live: Vec<EntityId> = engine
            .pool(EntityKind::BurstGlyph)
            .iter()
            .chain(engine.pool(EntityKind::Ripple).iter())
            .map(|e| e.id)
            .collect();
        assert!(ids.iter().all(|id| live.contains(id)));
    }

    #[test]
    fn burst_is_radial_with_staggered_ripples() {
        // 0.5 means zero angle jitter and a 60 px throw.
        let mut engine = engine_with(quiet(), SequenceRandom::constant(0.5));
        let origin = Vec2::new(400.0, 400.0);
        engine.spawn_click_burst(origin, CYAN);
        let ends: Vec<Vec2> = engine
            .pool(EntityKind::BurstGlyph)
            .iter()
            .map(|e| e.view(e.born_at + e.ttl_ms).position)
            .collect();
        for (i, end) in ends.iter().enumerate() {
            let expected = origin + Vec2::from_angle(i as f64 * TAU / 8.0) * 60.0;
            assert!(end.distance(expected) < 1e-9, "glyph {i} landed at {end:?}");
        }
        let rings: Vec<(f64, f64)> = engine
            .pool(EntityKind::Ripple)
            .iter()
            .map(|e| match e.visual {
                Visual::Ring { max_radius, delay_ms } => (max_radius, delay_ms),
                _ => panic!("ripple without a ring"),
            })
            .collect();
        assert_eq!(rings, vec![(40.0, 0.0), (55.0, 100.0)]);
        let last = engine.pool(EntityKind::Ripple).iter().last().unwrap();
        assert_eq!(last.ttl_ms, 600.0);
        assert_eq!(last.view(50.0).shape, Shape::Ring { radius: 0.0 });
    }

    #[test]
    fn expired_entities_never_come_back() {
        let mut engine = engine_with(quiet(), SequenceRandom::constant(0.5));
        engine.advance(0.0);
        let id = engine.spawn_trail_glyph(Vec2::new(50.0, 50.0), CYAN).unwrap();
        let present = |engine: &ParticleEngine| {
            engine.snapshot().iter().any(|p| p.entities.iter().any(|v| v.id == id))
        };
        engine.advance(599.0);
        assert!(present(&engine));
        for t in [600.0, 700.0, 5_000.0] {
            engine.advance(t);
            assert!(!present(&engine));
        }
    }

    #[test]
    fn clock_does_not_run_backwards() {
        let mut engine = engine_with(quiet(), SequenceRandom::constant(0.5));
        engine.advance(500.0);
        engine.advance(100.0);
        engine.advance(f64::NAN);
        assert_eq!(engine.now(), 500.0);
    }

    #[test]
    fn zero_viewport_defers_spawns() {
        let mut engine = ParticleEngine::new(Rc::new(quiet()), Box::new(SequenceRandom::constant(0.5)));
        assert_eq!(engine.spawn_trail_glyph(Vec2::new(10.0, 10.0), CYAN), None);
        assert!(engine.spawn_click_burst(Vec2::new(10.0, 10.0), CYAN).is_empty());
        engine.advance(16.0);
        assert_eq!(engine.entity_count(), 0);
        assert_eq!(engine.pending_spawns(), 2);

        engine.set_viewport(Viewport::new(800.0, 600.0));
        engine.advance(32.0);
        assert_eq!(engine.pending_spawns(), 0);
        assert_eq!(engine.pool(EntityKind::TrailGlyph).len(), 1);
        assert_eq!(engine.pool(EntityKind::BurstGlyph).len(), 8);
        assert!(engine.pool(EntityKind::TrailGlyph).iter().all(|e| e.born_at == 32.0));
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let mut engine = engine_with(quiet(), SequenceRandom::constant(0.5));
        assert_eq!(engine.spawn_trail_glyph(Vec2::new(f64::NAN, 1.0), CYAN), None);
        assert!(engine.spawn_click_burst(Vec2::new(1.0, f64::INFINITY), CYAN).is_empty());
        assert_eq!(engine.entity_count(), 0);
        assert_eq!(engine.pending_spawns(), 0);
    }

    #[test]
    fn rain_fills_columns_through_the_policy() {
        let mut engine = ParticleEngine::new(
            Rc::new(EngineConfig::preset(Profile::MatrixRain)),
            Box::new(SequenceRandom::constant(0.5)),
        );
        engine.set_viewport(Viewport::new(140.0, 70.0));
        engine.advance(0.0);
        engine.run_ambient_policy();
        assert_eq!(engine.pool(EntityKind::Ambient).len(), 10);
        assert_eq!(engine.spawn_ambient_particle(), None);
        assert!(engine.links().is_empty());
    }

    #[test]
    fn drift_field_links_and_pushes() {
        let mut cfg = EngineConfig::preset(Profile::Subtle);
        cfg.ambient.drift.count = 3;
        // A constant source stacks every dot on the same spot.
        let mut engine = engine_with(cfg, SequenceRandom::constant(0.5));
        engine.advance(0.0);
        engine.run_ambient_policy();
        assert_eq!(engine.pool(EntityKind::Ambient).len(), 3);
        let links = engine.links();
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| (l.opacity - 0.2).abs() < 1e-9));

        assert_eq!(engine.push_ambient(Vec2::new(20.0, 20.0)), 4);
        assert_eq!(engine.pool(EntityKind::Ambient).len(), 7);
        assert!(engine.spawn_ambient_particle().is_some());
    }

    #[test]
    fn ambient_off_spawns_nothing() {
        let mut engine = engine_with(quiet(), SequenceRandom::constant(0.5));
        engine.advance(0.0);
        engine.run_ambient_policy();
        assert_eq!(engine.spawn_ambient_particle(), None);
        assert_eq!(engine.push_ambient(Vec2::new(1.0, 1.0)), 0);
        assert_eq!(engine.entity_count(), 0);
    }
}
