//! Per-frame driver tying the pointer tracker to the particle engine.
//!
//! Frame order: springs, then pool aging, then this frame's spawns, then the
//! ambient policy. Anything spawned in a frame therefore starts at age zero.

use std::rc::Rc;

use crate::config::EngineConfig;
use crate::model::{FrameSnapshot, Vec2};
use crate::state::engine::ParticleEngine;
use crate::state::interactable::TargetNode;
use crate::state::pointer::{PointerEvent, PointerTracker};
use crate::state::rng::{JsRandom, RandomSource};
use crate::state::viewport::{DeviceProfile, Viewport};

pub struct FxScene {
    config: Rc<EngineConfig>,
    tracker: PointerTracker,
    engine: ParticleEngine,
    last_frame: Option<f64>,
}

impl FxScene {
    pub fn new(config: Rc<EngineConfig>, device: DeviceProfile, rng: Box<dyn RandomSource>) -> Self {
        Self {
            tracker: PointerTracker::new(Rc::clone(&config), device),
            engine: ParticleEngine::new(Rc::clone(&config), rng),
            config,
            last_frame: None,
        }
    }

    pub fn with_js_random(config: Rc<EngineConfig>, device: DeviceProfile) -> Self {
        Self::new(config, device, Box::new(JsRandom))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    pub fn engine(&self) -> &ParticleEngine {
        &self.engine
    }

    pub fn should_disable(&self) -> bool {
        self.tracker.should_disable()
    }

    pub fn set_device(&mut self, device: DeviceProfile) {
        self.tracker.set_device(device);
        if self.tracker.should_disable() {
            self.engine.clear();
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.engine.set_viewport(viewport);
    }

    pub fn on_raw_move(&mut self, x: f64, y: f64) {
        self.tracker.on_raw_move(x, y);
    }

    pub fn on_hover_target<T: TargetNode + Clone>(&mut self, target: &T) {
        self.tracker.on_hover_target(target);
    }

    pub fn clear_hover(&mut self) {
        self.tracker.clear_hover();
    }

    pub fn on_press(&mut self) {
        self.tracker.on_press();
    }

    pub fn on_release(&mut self) {
        self.tracker.on_release();
    }

    pub fn on_pointer_leave_viewport(&mut self) {
        self.tracker.on_pointer_leave_viewport();
    }

    pub fn on_pointer_enter_viewport(&mut self) {
        self.tracker.on_pointer_enter_viewport();
    }

    /// One display frame at host timestamp `now` (milliseconds).
    pub fn tick(&mut self, now: f64) {
        if self.tracker.should_disable() {
            self.last_frame = Some(now);
            return;
        }
        let dt_s = match self.last_frame {
            Some(last) if now.is_finite() => (now - last).clamp(0.0, self.config.max_frame_dt_ms.max(0.0)) / 1000.0,
            _ => 0.0,
        };
        if now.is_finite() {
            self.last_frame = Some(now);
        }

        self.tracker.advance(dt_s);
        let state = self.tracker.state();
        self.engine.set_repulsor(state.is_visible.then_some(state.smoothed_position));
        self.engine.advance(now);

        let accent = self.tracker.accent();
        for event in self.tracker.drain_events() {
            match event {
                PointerEvent::TrailPoint(at) => {
                    self.engine.spawn_trail_glyph(at, accent);
                }
                PointerEvent::Click(at) => {
                    self.engine.spawn_click_burst(at, accent);
                    self.engine.push_ambient(at);
                }
            }
        }
        self.engine.run_ambient_policy();
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        if self.tracker.should_disable() {
            return FrameSnapshot::empty(self.engine.now(), self.tracker.accent());
        }
        FrameSnapshot {
            now: self.engine.now(),
            cursor: self.tracker.cursor_view(),
            pools: self.engine.snapshot(),
            links: self.engine.links(),
            ambient_stepped: self.engine.ambient_stepped(),
        }
    }

    /// Smoothed cursor position, if the cursor is on screen.
    pub fn cursor_position(&self) -> Option<Vec2> {
        let state = self.tracker.state();
        state.is_visible.then_some(state.smoothed_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AmbientMode, Profile};
    use crate::model::{Color, EntityKind};
    use crate::state::interactable::CATEGORY_ATTR;
    use crate::state::interactable::tests::FakeNode;
    use crate::state::rng::SequenceRandom;

    fn scene(config: EngineConfig, device: DeviceProfile) -> FxScene {
        let mut scene = FxScene::new(Rc::new(config), device, Box::new(SequenceRandom::constant(0.5)));
        scene.set_viewport(Viewport::new(device.viewport_width, 900.0));
        scene
    }

    fn no_ambient() -> EngineConfig {
        let mut cfg = EngineConfig::preset(Profile::Subtle);
        cfg.ambient.mode = AmbientMode::None;
        cfg
    }

    #[test]
    fn mobile_never_spawns() {
        let mut s = scene(EngineConfig::preset(Profile::Hero), DeviceProfile::touch(390.0));
        assert!(s.should_disable());
        for frame in 0..120 {
            let t = frame as f64 * 16.0;
            s.on_raw_move(t, t);
            if frame % 10 == 0 {
                s.on_press();
                s.on_release();
            }
            s.tick(t);
        }
        assert_eq!(s.engine().entity_count(), 0);
        let snap = s.snapshot();
        assert!(snap.cursor.hidden);
        assert_eq!(snap.entity_count(), 0);
    }

    #[test]
    fn hovered_category_colors_the_next_trail_glyph() {
        let mut s = scene(no_ambient(), DeviceProfile::desktop(1440.0));
        s.tick(0.0);
        s.on_raw_move(100.0, 100.0);
        let link = FakeNode::new("SPAN").inside(FakeNode::new("A").attr(CATEGORY_ATTR, "react"));
        s.on_hover_target(&link);
        s.on_raw_move(145.0, 100.0);
        s.tick(16.0);

        let snap = s.snapshot();
        let trail = snap.pool(EntityKind::TrailGlyph).unwrap();
        assert_eq!(trail.entities.len(), 1);
        assert_eq!(trail.entities[0].color.to_hex(), "#61DAFB");
        assert_eq!(snap.cursor.label.as_deref(), Some("react"));
        assert!(snap.cursor.interactive);
    }

    #[test]
    fn leaving_the_viewport_hides_the_cursor() {
        let mut s = scene(no_ambient(), DeviceProfile::desktop(1440.0));
        s.on_raw_move(300.0, 200.0);
        s.tick(0.0);
        assert!(!s.snapshot().cursor.hidden);
        s.on_pointer_leave_viewport();
        s.tick(16.0);
        let cursor = s.snapshot().cursor;
        assert!(cursor.hidden);
        assert_eq!(cursor.ring_opacity, 0.0);
        assert_eq!(s.cursor_position(), None);
    }

    #[test]
    fn spawns_start_at_age_zero() {
        let mut s = scene(no_ambient(), DeviceProfile::desktop(1440.0));
        s.on_raw_move(0.0, 0.0);
        s.tick(0.0);
        s.on_raw_move(200.0, 0.0);
        s.on_press();
        s.on_release();
        s.tick(5_000.0);
        let snap = s.snapshot();
        let trail = snap.pool(EntityKind::TrailGlyph).unwrap();
        assert_eq!(trail.entities.len(), 5);
        assert!(trail.entities.iter().all(|v| (v.opacity - 0.8).abs() < 1e-9));
        let burst = snap.pool(EntityKind::BurstGlyph).unwrap();
        assert_eq!(burst.entities.len(), 8);
        assert!(burst.entities.iter().all(|v| v.opacity == 1.0 && v.scale == 1.0));
    }

    #[test]
    fn click_pushes_drift_dots() {
        let mut cfg = EngineConfig::preset(Profile::Subtle);
        cfg.ambient.drift.count = 10;
        let mut s = scene(cfg, DeviceProfile::desktop(1440.0));
        s.on_raw_move(400.0, 400.0);
        s.tick(0.0);
        assert_eq!(s.engine().pool(EntityKind::Ambient).len(), 10);
        s.on_press();
        s.on_release();
        s.tick(16.0);
        assert_eq!(s.engine().pool(EntityKind::Ambient).len(), 14);
        assert_eq!(s.engine().pool(EntityKind::Ripple).len(), 2);
    }

    #[test]
    fn shrinking_below_the_gate_clears_everything() {
        let mut s = scene(EngineConfig::preset(Profile::Hero), DeviceProfile::desktop(1440.0));
        s.tick(0.0);
        assert!(s.engine().entity_count() > 0);
        s.set_device(DeviceProfile::desktop(600.0));
        s.tick(16.0);
        assert_eq!(s.engine().entity_count(), 0);
        assert_eq!(s.snapshot(), FrameSnapshot::empty(0.0, Color::rgb(0x00, 0xE5, 0xFF)));
    }

    #[test]
    fn negative_frame_gap_cap_freezes_motion_instead_of_panicking() {
        let cfg = EngineConfig { max_frame_dt_ms: -1.0, ..no_ambient() };
        let mut s = scene(cfg, DeviceProfile::desktop(1440.0));
        s.on_raw_move(10.0, 10.0);
        s.tick(0.0);
        s.on_raw_move(400.0, 300.0);
        s.tick(16.0);
        assert_eq!(s.engine().now(), 16.0);
        assert_eq!(s.cursor_position(), Some(Vec2::new(10.0, 10.0)));
    }
}
