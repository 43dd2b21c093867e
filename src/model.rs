//! Core data models for the pointer effects engine.
//! Plain data shared by the pointer tracker, the particle engine and the renderer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

use crate::error::{FxError, Result};
use crate::util::{clamp01, ease_out, lerp};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_angle(radians: f64) -> Self {
        Self::new(radians.cos(), radians.sin())
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }

    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        Vec2::new(lerp(self.x, other.x, t), lerp(self.y, other.y, t))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// sRGB color, serialized as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Accepts `#RRGGBB` and `#RGB`, case-insensitive.
    pub fn parse_hex(s: &str) -> Result<Color> {
        let invalid = || FxError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |pair: &str| u8::from_str_radix(pair, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Color::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Ok(Color::rgb(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn css_rgba(&self, alpha: f64) -> String {
        format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, clamp01(alpha))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = FxError;
    fn try_from(value: String) -> Result<Self> {
        Color::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> String {
        c.to_hex()
    }
}

/// Current interaction snapshot, mutated only by the pointer tracker.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PointerState {
    pub raw_position: Vec2,
    /// Spring-interpolated cursor position; lags `raw_position`.
    pub smoothed_position: Vec2,
    /// Slower follower used by the outer ring.
    pub ring_position: Vec2,
    pub is_interactive: bool,
    pub category: Option<String>,
    /// `None` when no category is hovered or the category is unknown.
    pub category_color: Option<Color>,
    pub is_pressed: bool,
    /// False until the first sample and while the pointer is outside the viewport.
    pub is_visible: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    TrailGlyph,
    BurstGlyph,
    Ripple,
    Ambient,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Offset from the origin, eased from `from` to `to` over the lifetime.
    Drift { from: Vec2, to: Vec2 },
    /// Outward travel along `angle` (radians) for `distance` pixels.
    Radial { angle: f64, distance: f64 },
    Anchored,
    /// Column fall, one `cell` per rain step. Drawing snaps to `cell` rows.
    Fall { cell: f64 },
    /// Free movement with edge bounce, integrated by the engine.
    Wander { velocity: Vec2 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Visual {
    Glyph { text: String, size: f64 },
    /// Expanding ring; invisible until `delay_ms` has elapsed.
    Ring { max_radius: f64, delay_ms: f64 },
    Dot { radius: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Fade {
    Linear { opacity: (f64, f64), scale: (f64, f64) },
    EaseOut { opacity: (f64, f64), scale: (f64, f64) },
    Pulse { min_opacity: f64, max_opacity: f64, period_ms: f64, phase: f64 },
    Constant { opacity: f64 },
}

/// A transient visual unit owned by one pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub origin: Vec2,
    /// Live position for engine-integrated motions (`Fall`, `Wander`); equals `origin` otherwise.
    pub position: Vec2,
    pub motion: Motion,
    pub born_at: f64,
    pub ttl_ms: f64,
    pub visual: Visual,
    pub fade: Fade,
    pub color: Color,
}

impl Entity {
    pub fn age(&self, now: f64) -> f64 {
        (now - self.born_at).max(0.0)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.born_at >= self.ttl_ms
    }

    /// Lifetime progress in [0, 1]. Delayed rings report 0 until their delay has passed.
    pub fn progress(&self, now: f64) -> f64 {
        let age = self.age(now);
        match self.visual {
            Visual::Ring { delay_ms, .. } => {
                let span = (self.ttl_ms - delay_ms).max(f64::EPSILON);
                clamp01((age - delay_ms) / span)
            }
            _ => clamp01(age / self.ttl_ms.max(f64::EPSILON)),
        }
    }

    /// Everything the renderer needs at `now`, with no further computation.
    pub fn view(&self, now: f64) -> EntityView {
        let t = self.progress(now);
        let (opacity, scale, eased) = match &self.fade {
            Fade::Linear { opacity, scale } => {
                (lerp(opacity.0, opacity.1, t), lerp(scale.0, scale.1, t), t)
            }
            Fade::EaseOut { opacity, scale } => {
                let e = ease_out(t);
                (lerp(opacity.0, opacity.1, e), lerp(scale.0, scale.1, e), e)
            }
            Fade::Pulse { min_opacity, max_opacity, period_ms, phase } => {
                let cycle = self.age(now) / period_ms.max(f64::EPSILON);
                let wave = 0.5 + 0.5 * (std::f64::consts::TAU * cycle + phase).sin();
                (lerp(*min_opacity, *max_opacity, wave), 1.0, t)
            }
            Fade::Constant { opacity } => (*opacity, 1.0, t),
        };
        let opacity = match self.visual {
            Visual::Ring { delay_ms, .. } if self.age(now) < delay_ms => 0.0,
            _ => clamp01(opacity),
        };
        let position = match &self.motion {
            Motion::Drift { from, to } => self.origin + from.lerp(*to, eased),
            Motion::Radial { angle, distance } => {
                self.origin + Vec2::from_angle(*angle) * (distance * eased)
            }
            Motion::Anchored => self.origin,
            Motion::Fall { cell, .. } if *cell > 0.0 => {
                Vec2::new(self.position.x, (self.position.y / cell).floor() * cell)
            }
            Motion::Fall { .. } | Motion::Wander { .. } => self.position,
        };
        let shape = match &self.visual {
            Visual::Glyph { text, size } => Shape::Glyph { text: text.clone(), size: *size },
            Visual::Ring { max_radius, .. } => Shape::Ring { radius: max_radius * t },
            Visual::Dot { radius } => Shape::Dot { radius: *radius },
        };
        EntityView { id: self.id, kind: self.kind, position, opacity, scale, color: self.color, shape }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Shape {
    Glyph { text: String, size: f64 },
    Ring { radius: f64 },
    Dot { radius: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub opacity: f64,
    pub scale: f64,
    pub color: Color,
    pub shape: Shape,
}

/// Cursor overlay state handed to the renderer once per frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CursorView {
    /// Explicit hidden flag; renderers must not draw a stale position when set.
    pub hidden: bool,
    pub position: Vec2,
    pub ring_position: Vec2,
    pub scale: f64,
    pub ring_scale: f64,
    pub ring_opacity: f64,
    pub tilt_deg: f64,
    pub color: Color,
    /// Hovered category name, drawn as a tooltip.
    pub label: Option<String>,
    pub interactive: bool,
    pub pressed: bool,
}

impl CursorView {
    pub fn hidden(color: Color) -> Self {
        Self {
            hidden: true,
            position: Vec2::ZERO,
            ring_position: Vec2::ZERO,
            scale: 1.0,
            ring_scale: 1.0,
            ring_opacity: 0.0,
            tilt_deg: 0.0,
            color,
            label: None,
            interactive: false,
            pressed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoolSnapshot {
    pub kind: EntityKind,
    pub entities: Vec<EntityView>,
}

/// Line between two nearby drift dots.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Link {
    pub a: Vec2,
    pub b: Vec2,
    pub opacity: f64,
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub now: f64,
    pub cursor: CursorView,
    pub pools: Vec<PoolSnapshot>,
    pub links: Vec<Link>,
    /// True on frames where the rain advanced one step.
    pub ambient_stepped: bool,
}

impl FrameSnapshot {
    pub fn empty(now: f64, accent: Color) -> Self {
        Self {
            now,
            cursor: CursorView::hidden(accent),
            pools: Vec::new(),
            links: Vec::new(),
            ambient_stepped: false,
        }
    }

    pub fn pool(&self, kind: EntityKind) -> Option<&PoolSnapshot> {
        self.pools.iter().find(|p| p.kind == kind)
    }

    pub fn entity_count(&self) -> usize {
        self.pools.iter().map(|p| p.entities.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(born_at: f64, ttl_ms: f64) -> Entity {
        Entity {
            id: EntityId(1),
            kind: EntityKind::TrailGlyph,
            origin: Vec2::new(100.0, 100.0),
            position: Vec2::new(100.0, 100.0),
            motion: Motion::Drift { from: Vec2::new(-5.0, -5.0), to: Vec2::new(-5.0, -20.0) },
            born_at,
            ttl_ms,
            visual: Visual::Glyph { text: "{".into(), size: 14.0 },
            fade: Fade::EaseOut { opacity: (0.8, 0.0), scale: (1.0, 0.5) },
            color: Color::rgb(0, 229, 255),
        }
    }

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::parse_hex("#61DAFB").unwrap(), Color::rgb(0x61, 0xDA, 0xFB));
        assert_eq!(Color::parse_hex("#61dafb").unwrap().to_hex(), "#61DAFB");
        assert_eq!(Color::parse_hex("#fff").unwrap(), Color::rgb(255, 255, 255));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["61DAFB", "#61DAF", "#+1DAFB", "#GGGGGG", ""] {
            assert!(Color::parse_hex(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(0x31, 0x78, 0xC6)).unwrap();
        assert_eq!(json, "\"#3178C6\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(0x31, 0x78, 0xC6));
    }

    #[test]
    fn expiry_is_inclusive_of_ttl() {
        let e = glyph(1000.0, 600.0);
        assert!(!e.is_expired(1599.0));
        assert!(e.is_expired(1600.0));
    }

    #[test]
    fn trail_view_starts_at_offset_and_fades_out() {
        let e = glyph(0.0, 600.0);
        let start = e.view(0.0);
        assert_eq!(start.position, Vec2::new(95.0, 95.0));
        assert!((start.opacity - 0.8).abs() < 1e-9);
        let end = e.view(600.0);
        assert_eq!(end.position, Vec2::new(95.0, 80.0));
        assert_eq!(end.opacity, 0.0);
        assert!((end.scale - 0.5).abs() < 1e-9);
    }

    #[test]
    fn delayed_ring_is_invisible_before_its_delay() {
        let mut e = glyph(0.0, 600.0);
        e.kind = EntityKind::Ripple;
        e.motion = Motion::Anchored;
        e.visual = Visual::Ring { max_radius: 55.0, delay_ms: 100.0 };
        e.fade = Fade::Linear { opacity: (0.6, 0.0), scale: (1.0, 1.0) };
        let early = e.view(50.0);
        assert_eq!(early.opacity, 0.0);
        assert_eq!(early.shape, Shape::Ring { radius: 0.0 });
        let mid = e.view(350.0);
        assert_eq!(mid.shape, Shape::Ring { radius: 27.5 });
        assert!((mid.opacity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn fall_view_snaps_to_rows() {
        let mut e = glyph(0.0, 10_000.0);
        e.kind = EntityKind::Ambient;
        e.motion = Motion::Fall { cell: 14.0 };
        e.position = Vec2::new(28.0, 33.0);
        assert_eq!(e.view(10.0).position, Vec2::new(28.0, 28.0));
    }
}
