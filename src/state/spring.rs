//! Damped spring integrator for the cursor and ring followers.
//!
//! The spring is advanced once per display frame with the frame's elapsed time,
//! split into fixed-size substeps so the result does not depend on frame rate.

use crate::config::SpringConfig;
use crate::model::Vec2;

/// Upper bound on one integration substep, in seconds.
const MAX_STEP_S: f64 = 1.0 / 240.0;
const MAX_SUBSTEPS: usize = 2048;
/// Below this offset (px) and speed (px/s) the spring snaps onto its target.
pub const REST_DELTA: f64 = 0.01;
pub const REST_SPEED: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
    pub value: f64,
    pub velocity: f64,
    config: SpringConfig,
}

impl Spring {
    pub fn new(config: SpringConfig, value: f64) -> Self {
        Self { value, velocity: 0.0, config }
    }

    pub fn snap(&mut self, value: f64) {
        self.value = value;
        self.velocity = 0.0;
    }

    pub fn is_at_rest(&self, target: f64) -> bool {
        self.value == target && self.velocity == 0.0
    }

    pub fn step(&mut self, target: f64, dt_s: f64) {
        if !(dt_s > 0.0) || !target.is_finite() {
            return;
        }
        let SpringConfig { stiffness, damping, mass } = self.config;
        let omega = (stiffness / mass).sqrt();
        let mut h_max = MAX_STEP_S.min(0.25 / omega);
        if damping > 0.0 {
            h_max = h_max.min(0.5 * mass / damping);
        }
        let n = ((dt_s / h_max).ceil() as usize).clamp(1, MAX_SUBSTEPS);
        let h = dt_s / n as f64;
        for _ in 0..n {
            let force = -stiffness * (self.value - target) - damping * self.velocity;
            self.velocity += force / mass * h;
            self.value += self.velocity * h;
        }
        if (self.value - target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED {
            self.snap(target);
        }
    }
}

/// Two independent axes sharing one config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring2 {
    x: Spring,
    y: Spring,
}

impl Spring2 {
    pub fn new(config: SpringConfig, at: Vec2) -> Self {
        Self {
            x: Spring::new(config, at.x),
            y: Spring::new(config, at.y),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x.value, self.y.value)
    }

    pub fn snap(&mut self, at: Vec2) {
        self.x.snap(at.x);
        self.y.snap(at.y);
    }

    pub fn step(&mut self, target: Vec2, dt_s: f64) {
        self.x.step(target.x, dt_s);
        self.y.step(target.y, dt_s);
    }

    pub fn is_at_rest(&self, target: Vec2) -> bool {
        self.x.is_at_rest(target.x) && self.y.is_at_rest(target.y)
    }
}
