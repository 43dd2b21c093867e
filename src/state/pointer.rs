//! Pointer tracker: raw device samples in, smoothed and classified pointer state out.
//!
//! Input handlers only record intent. Raw samples overwrite each other until the
//! next frame, so the springs only ever chase the latest one, and the springs
//! advance in [`PointerTracker::advance`] once per display frame. Trail points
//! and clicks are queued for the frame driver to turn into spawns.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::model::{Color, CursorView, PointerState, Vec2};
use crate::state::interactable::{TargetNode, classify};
use crate::state::spring::Spring2;
use crate::state::viewport::DeviceProfile;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// The pointer travelled another `threshold_px` since the last checkpoint.
    TrailPoint(Vec2),
    /// Press followed by release, at the raw position of the release.
    Click(Vec2),
}

pub struct PointerTracker {
    config: Rc<EngineConfig>,
    state: PointerState,
    cursor: Spring2,
    ring: Spring2,
    has_sample: bool,
    /// Set until the first sample after (re)entering; that sample snaps the springs.
    snap_pending: bool,
    checkpoint: Option<Vec2>,
    events: VecDeque<PointerEvent>,
    disabled: bool,
}

impl PointerTracker {
    pub fn new(config: Rc<EngineConfig>, device: DeviceProfile) -> Self {
        let disabled = config.gate.should_disable(&device);
        Self {
            cursor: Spring2::new(config.cursor_spring, Vec2::ZERO),
            ring: Spring2::new(config.ring_spring, Vec2::ZERO),
            config,
            state: PointerState::default(),
            has_sample: false,
            snap_pending: true,
            checkpoint: None,
            events: VecDeque::new(),
            disabled,
        }
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Touch devices, reduced motion and small viewports get no overlay at all.
    pub fn should_disable(&self) -> bool {
        self.disabled
    }

    /// Re-evaluate the disable gate, e.g. after a resize.
    pub fn set_device(&mut self, device: DeviceProfile) {
        let disabled = self.config.gate.should_disable(&device);
        if disabled && !self.disabled {
            log::info!("pointer overlay disabled for {:?}", device);
            self.state = PointerState::default();
            self.has_sample = false;
            self.snap_pending = true;
            self.checkpoint = None;
            self.events.clear();
        }
        self.disabled = disabled;
    }

    pub fn on_raw_move(&mut self, x: f64, y: f64) {
        if self.disabled {
            return;
        }
        let p = Vec2::new(x, y);
        if !p.is_finite() {
            log::debug!("dropping non-finite pointer sample ({x}, {y})");
            return;
        }
        self.state.raw_position = p;
        if self.snap_pending {
            self.cursor.snap(p);
            self.ring.snap(p);
            self.state.smoothed_position = p;
            self.state.ring_position = p;
            self.state.is_visible = true;
            self.checkpoint = Some(p);
            self.snap_pending = false;
            self.has_sample = true;
            return;
        }
        self.walk_checkpoint(p);
    }

    /// Emit one trail point per `threshold_px` travelled along the chord from the
    /// checkpoint to `p`, so density does not depend on the sampling rate.
    fn walk_checkpoint(&mut self, p: Vec2) {
        let threshold = self.config.trail.threshold_px;
        let Some(start) = self.checkpoint else {
            self.checkpoint = Some(p);
            return;
        };
        let distance = start.distance(p);
        if distance < threshold {
            return;
        }
        let dir = (p - start) * (1.0 / distance);
        let steps = (distance / threshold).floor() as usize;
        let emitted = steps.min(self.config.max_pending_events);
        for k in 1..=emitted {
            self.queue(PointerEvent::TrailPoint(start + dir * (threshold * k as f64)));
        }
        self.checkpoint = Some(if emitted < steps { p } else { start + dir * (threshold * steps as f64) });
    }

    pub fn on_hover_target<T: TargetNode + Clone>(&mut self, target: &T) {
        if self.disabled {
            return;
        }
        let class = classify(target, &self.config.categories);
        self.state.is_interactive = class.interactive;
        self.state.category = class.category;
        self.state.category_color = class.category_color;
    }

    pub fn clear_hover(&mut self) {
        self.state.is_interactive = false;
        self.state.category = None;
        self.state.category_color = None;
    }

    pub fn on_press(&mut self) {
        if self.disabled {
            return;
        }
        self.state.is_pressed = true;
    }

    pub fn on_release(&mut self) {
        if self.disabled || !self.state.is_pressed {
            return;
        }
        self.state.is_pressed = false;
        if self.has_sample && self.state.is_visible {
            self.queue(PointerEvent::Click(self.state.raw_position));
        }
    }

    pub fn on_pointer_leave_viewport(&mut self) {
        self.state.is_visible = false;
        self.snap_pending = true;
    }

    pub fn on_pointer_enter_viewport(&mut self) {
        if self.disabled {
            return;
        }
        // After a leave the springs still hold the exit point; the next
        // sample snaps them and shows the cursor.
        if self.has_sample && !self.snap_pending {
            self.state.is_visible = true;
        }
    }

    /// Advance both springs toward the latest raw sample.
    pub fn advance(&mut self, dt_s: f64) {
        if self.disabled || !self.has_sample {
            return;
        }
        let target = self.state.raw_position;
        self.cursor.step(target, dt_s);
        self.ring.step(target, dt_s);
        self.state.smoothed_position = self.cursor.position();
        self.state.ring_position = self.ring.position();
    }

    pub fn drain_events(&mut self) -> Vec<PointerEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Category color of the hovered element, or the default accent.
    pub fn accent(&self) -> Color {
        self.state.category_color.unwrap_or(self.config.default_accent)
    }

    pub fn cursor_view(&self) -> CursorView {
        let color = self.accent();
        if self.disabled || !self.state.is_visible {
            return CursorView::hidden(color);
        }
        let s = &self.state;
        let scale = if s.is_pressed {
            self.config.pressed_scale
        } else if s.is_interactive {
            self.config.interactive_scale
        } else {
            1.0
        };
        CursorView {
            hidden: false,
            position: s.smoothed_position,
            ring_position: s.ring_position,
            scale,
            ring_scale: if s.is_interactive { self.config.ring_hover_scale } else { 1.0 },
            ring_opacity: self.config.ring_opacity,
            tilt_deg: if s.is_pressed { self.config.pressed_tilt_deg } else { 0.0 },
            color,
            label: s.category.clone(),
            interactive: s.is_interactive,
            pressed: s.is_pressed,
        }
    }

    fn queue(&mut self, event: PointerEvent) {
        if self.events.len() >= self.config.max_pending_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}
