//! Engine configuration.
//!
//! One parameterised [`EngineConfig`] replaces per-variant cursor and background
//! components. Presets come from [`Profile`]; JSON overrides are merged over the
//! defaults field by field because every section is `#[serde(default)]`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::{FxError, Result};
use crate::model::{Color, Vec2};
use crate::state::viewport::DeviceProfile;

const CYAN: Color = Color::rgb(0x00, 0xE5, 0xFF);
const PURPLE: Color = Color::rgb(0x8B, 0x5C, 0xF6);
const GREEN: Color = Color::rgb(0x00, 0xFF, 0x9C);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    Subtle,
    Hero,
    Dense,
    MatrixRain,
}

impl Profile {
    pub const ALL: [Profile; 4] = [Profile::Subtle, Profile::Hero, Profile::Dense, Profile::MatrixRain];

    pub fn label(self) -> &'static str {
        match self {
            Profile::Subtle => "Subtle",
            Profile::Hero => "Hero",
            Profile::Dense => "Dense",
            Profile::MatrixRain => "Matrix Rain",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl SpringConfig {
    pub const CURSOR: SpringConfig = SpringConfig { stiffness: 450.0, damping: 25.0, mass: 0.5 };
    pub const RING: SpringConfig = SpringConfig { stiffness: 200.0, damping: 30.0, mass: 0.8 };

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.stiffness > 0.0 && self.mass > 0.0 && self.damping >= 0.0) {
            return Err(FxError::InvalidConfig(format!(
                "{name}: stiffness and mass must be > 0 and damping >= 0"
            )));
        }
        Ok(())
    }
}

/// A spring section as it appears in JSON: any missing field keeps the preset
/// value of the spring it overrides.
#[derive(Default, Deserialize)]
#[serde(default)]
struct SpringPatch {
    stiffness: Option<f64>,
    damping: Option<f64>,
    mass: Option<f64>,
}

impl SpringPatch {
    fn over(self, base: SpringConfig) -> SpringConfig {
        SpringConfig {
            stiffness: self.stiffness.unwrap_or(base.stiffness),
            damping: self.damping.unwrap_or(base.damping),
            mass: self.mass.unwrap_or(base.mass),
        }
    }
}

fn cursor_spring_over_preset<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<SpringConfig, D::Error> {
    Ok(SpringPatch::deserialize(de)?.over(SpringConfig::CURSOR))
}

fn ring_spring_over_preset<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<SpringConfig, D::Error> {
    Ok(SpringPatch::deserialize(de)?.over(SpringConfig::RING))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Pixels of travel between trail glyphs.
    pub threshold_px: f64,
    pub capacity: usize,
    pub ttl_ms: f64,
    pub glyphs: Vec<String>,
    pub font_px: f64,
    pub start_opacity: f64,
    pub end_scale: f64,
    pub start_offset: Vec2,
    pub end_offset: Vec2,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            threshold_px: 40.0,
            capacity: 6,
            ttl_ms: 600.0,
            glyphs: ["<", ">", "/", "{", "}", "(", ")", ";", "0", "1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            font_px: 14.0,
            start_opacity: 0.8,
            end_scale: 0.5,
            start_offset: Vec2::new(-5.0, -5.0),
            end_offset: Vec2::new(-5.0, -20.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub glyph_count: usize,
    pub glyph_capacity: usize,
    pub glyph_ttl_ms: f64,
    pub angle_jitter_deg: f64,
    pub min_distance: f64,
    pub distance_jitter: f64,
    pub font_px: f64,
    pub end_scale: f64,
    pub keywords: Vec<String>,
    pub ripple_count: usize,
    pub ripple_capacity: usize,
    pub ripple_duration_ms: f64,
    pub ripple_stagger_ms: f64,
    pub ripple_base_radius: f64,
    pub ripple_radius_step: f64,
    pub ripple_start_opacity: f64,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            glyph_count: 8,
            glyph_capacity: 64,
            glyph_ttl_ms: 600.0,
            angle_jitter_deg: 20.0,
            min_distance: 40.0,
            distance_jitter: 40.0,
            font_px: 12.0,
            end_scale: 0.5,
            keywords: [
                "const", "let", "function", "return", "async", "await", "import", "export",
                "class", "=>", "if", "else", "useState", "useEffect", "props", "render", "null",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ripple_count: 2,
            ripple_capacity: 16,
            ripple_duration_ms: 500.0,
            ripple_stagger_ms: 100.0,
            ripple_base_radius: 40.0,
            ripple_radius_step: 15.0,
            ripple_start_opacity: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbientMode {
    #[default]
    None,
    MatrixRain,
    Drift,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainConfig {
    pub cell_px: f64,
    pub step_ms: f64,
    pub per_column_cap: usize,
    /// Chance per step, once past the bottom edge, that a drop restarts at the top.
    pub respawn_probability: f64,
    pub ttl_ms: f64,
    pub alphabet: String,
    pub palette: Vec<Color>,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            cell_px: 14.0,
            step_ms: 50.0,
            per_column_cap: 1,
            respawn_probability: 0.025,
            ttl_ms: 30_000.0,
            alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789<>/{}[]();:=+-%*@#$!?".to_string(),
            palette: vec![CYAN, PURPLE, GREEN],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub count: usize,
    /// Pixels per millisecond.
    pub speed: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub min_opacity: f64,
    pub max_opacity: f64,
    pub pulse_ms: f64,
    pub lifetime_ms: f64,
    pub link_distance: f64,
    pub link_opacity: f64,
    pub link_color: Color,
    pub repulse_radius: f64,
    /// Pixels per millisecond at the pointer, falling off to zero at `repulse_radius`.
    pub repulse_speed: f64,
    pub push_quantity: usize,
    pub palette: Vec<Color>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            count: 60,
            speed: 0.06,
            min_radius: 1.0,
            max_radius: 3.0,
            min_opacity: 0.1,
            max_opacity: 0.5,
            pulse_ms: 3_000.0,
            lifetime_ms: 20_000.0,
            link_distance: 150.0,
            link_opacity: 0.2,
            link_color: CYAN,
            repulse_radius: 150.0,
            repulse_speed: 0.4,
            push_quantity: 4,
            palette: vec![CYAN, PURPLE, GREEN],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub mode: AmbientMode,
    pub capacity: usize,
    pub rain: RainConfig,
    pub drift: DriftConfig,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            mode: AmbientMode::Drift,
            capacity: 512,
            rain: RainConfig::default(),
            drift: DriftConfig::default(),
        }
    }
}

/// Decides when the whole overlay is switched off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisableGate {
    pub disable_on_coarse_pointer: bool,
    pub disable_on_reduced_motion: bool,
    /// Viewports at or below this width get no overlay.
    pub min_viewport_width: f64,
}

impl Default for DisableGate {
    fn default() -> Self {
        Self {
            disable_on_coarse_pointer: true,
            disable_on_reduced_motion: true,
            min_viewport_width: 768.0,
        }
    }
}

impl DisableGate {
    pub fn should_disable(&self, device: &DeviceProfile) -> bool {
        (self.disable_on_coarse_pointer && device.coarse_pointer)
            || (self.disable_on_reduced_motion && device.reduced_motion)
            || device.viewport_width <= self.min_viewport_width
    }
}

/// Category name to accent color. Lookups ignore ASCII case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPalette {
    colors: BTreeMap<String, Color>,
}

impl CategoryPalette {
    pub fn new() -> Self {
        Self { colors: BTreeMap::new() }
    }

    pub fn insert(&mut self, name: &str, color: Color) {
        self.colors.insert(name.to_ascii_lowercase(), color);
    }

    pub fn lookup(&self, name: &str) -> Option<Color> {
        if let Some(c) = self.colors.get(name) {
            return Some(*c);
        }
        let wanted = name.trim();
        self.colors
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
            .map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for CategoryPalette {
    fn default() -> Self {
        let mut palette = CategoryPalette::new();
        for (name, hex) in [
            ("React", (0x61, 0xDA, 0xFB)),
            ("Next.js", (0xFF, 0xFF, 0xFF)),
            ("TypeScript", (0x31, 0x78, 0xC6)),
            ("JavaScript", (0xF7, 0xDF, 0x1E)),
            ("Node.js", (0x33, 0x99, 0x33)),
            ("Python", (0x37, 0x76, 0xAB)),
            ("Tailwind CSS", (0x06, 0xB6, 0xD4)),
            ("Tailwind", (0x06, 0xB6, 0xD4)),
            ("Framer Motion", (0xFF, 0x00, 0x55)),
            ("Firebase", (0xFF, 0xCA, 0x28)),
            ("MongoDB", (0x47, 0xA2, 0x48)),
            ("PostgreSQL", (0x41, 0x69, 0xE1)),
            ("AWS", (0xFF, 0x99, 0x00)),
            ("Docker", (0x24, 0x96, 0xED)),
            ("Flutter", (0x02, 0x56, 0x9B)),
            ("Three.js", (0xFF, 0xFF, 0xFF)),
            ("Rust", (0xDE, 0xA5, 0x84)),
        ] {
            palette.insert(name, Color::rgb(hex.0, hex.1, hex.2));
        }
        palette
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(deserialize_with = "cursor_spring_over_preset")]
    pub cursor_spring: SpringConfig,
    #[serde(deserialize_with = "ring_spring_over_preset")]
    pub ring_spring: SpringConfig,
    pub trail: TrailConfig,
    pub burst: BurstConfig,
    pub ambient: AmbientConfig,
    pub gate: DisableGate,
    pub categories: CategoryPalette,
    pub default_accent: Color,
    pub interactive_scale: f64,
    pub pressed_scale: f64,
    pub ring_hover_scale: f64,
    pub ring_opacity: f64,
    pub pressed_tilt_deg: f64,
    /// Longest frame gap fed to the springs (tab switches, breakpoints).
    pub max_frame_dt_ms: f64,
    pub max_pending_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cursor_spring: SpringConfig::CURSOR,
            ring_spring: SpringConfig::RING,
            trail: TrailConfig::default(),
            burst: BurstConfig::default(),
            ambient: AmbientConfig::default(),
            gate: DisableGate::default(),
            categories: CategoryPalette::default(),
            default_accent: CYAN,
            interactive_scale: 1.4,
            pressed_scale: 0.8,
            ring_hover_scale: 1.3,
            ring_opacity: 0.4,
            pressed_tilt_deg: 10.0,
            max_frame_dt_ms: 100.0,
            max_pending_events: 64,
        }
    }
}

impl EngineConfig {
    pub fn preset(profile: Profile) -> Self {
        let mut cfg = EngineConfig::default();
        match profile {
            Profile::Subtle => {}
            Profile::Hero => {
                cfg.ambient.drift.count = 80;
            }
            Profile::Dense => {
                cfg.ambient.drift.count = 100;
                cfg.trail.threshold_px = 24.0;
                cfg.trail.capacity = 12;
                cfg.burst.ripple_count = 3;
            }
            Profile::MatrixRain => {
                cfg.ambient.mode = AmbientMode::MatrixRain;
                cfg.ambient.capacity = 1024;
            }
        }
        cfg
    }

    /// Parse a JSON document over the defaults and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: EngineConfig = serde_json::from_str(json).inspect_err(|err| {
            log::warn!("rejecting effects config: {err}");
        })?;
        cfg.validate().inspect_err(|err| {
            log::warn!("rejecting effects config: {err}");
        })?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(FxError::InvalidConfig(msg.to_string()));
        self.cursor_spring.validate("cursor_spring")?;
        self.ring_spring.validate("ring_spring")?;
        if !(self.trail.threshold_px > 0.0) {
            return fail("trail.threshold_px must be > 0");
        }
        if self.trail.capacity == 0 || self.burst.glyph_capacity == 0 || self.burst.ripple_capacity == 0 {
            return fail("pool capacities must be >= 1");
        }
        if self.burst.glyph_capacity < self.burst.glyph_count {
            return fail("burst.glyph_capacity must hold a full burst");
        }
        if self.burst.ripple_capacity < self.burst.ripple_count {
            return fail("burst.ripple_capacity must hold a full set of ripples");
        }
        if !(self.trail.ttl_ms > 0.0 && self.burst.glyph_ttl_ms > 0.0 && self.burst.ripple_duration_ms > 0.0) {
            return fail("ttl values must be > 0");
        }
        if self.trail.glyphs.is_empty() || self.burst.keywords.is_empty() {
            return fail("glyph sets must not be empty");
        }
        match self.ambient.mode {
            AmbientMode::None => {}
            AmbientMode::MatrixRain => {
                let rain = &self.ambient.rain;
                if !(rain.cell_px > 0.0 && rain.step_ms > 0.0 && rain.ttl_ms > 0.0) {
                    return fail("ambient.rain cell, step and ttl must be > 0");
                }
                if rain.per_column_cap == 0 || rain.alphabet.is_empty() || rain.palette.is_empty() {
                    return fail("ambient.rain needs a column cap, an alphabet and a palette");
                }
                if !(0.0..=1.0).contains(&rain.respawn_probability) {
                    return fail("ambient.rain.respawn_probability must be within [0, 1]");
                }
            }
            AmbientMode::Drift => {
                let drift = &self.ambient.drift;
                if drift.palette.is_empty() || !(drift.lifetime_ms > 0.0) {
                    return fail("ambient.drift needs a palette and a positive lifetime");
                }
                if drift.min_radius > drift.max_radius || drift.min_opacity > drift.max_opacity {
                    return fail("ambient.drift ranges must be ordered min <= max");
                }
            }
        }
        if self.ambient.mode != AmbientMode::None && self.ambient.capacity == 0 {
            return fail("ambient.capacity must be >= 1");
        }
        if self.max_pending_events == 0 {
            return fail("max_pending_events must be >= 1");
        }
        if !(self.max_frame_dt_ms.is_finite() && self.max_frame_dt_ms >= 0.0) {
            return fail("max_frame_dt_ms must be finite and >= 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_validates() {
        for p in Profile::ALL {
            EngineConfig::preset(p).validate().unwrap();
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "trail": { "threshold_px": 25.0 }, "ambient": { "mode": "matrix-rain" } }"#)
            .unwrap();
        assert_eq!(cfg.trail.threshold_px, 25.0);
        assert_eq!(cfg.trail.capacity, 6);
        assert_eq!(cfg.ambient.mode, AmbientMode::MatrixRain);
        assert_eq!(cfg.cursor_spring, SpringConfig::CURSOR);
    }

    #[test]
    fn partial_spring_keeps_its_own_preset() {
        let cfg = EngineConfig::from_json(r#"{ "cursor_spring": { "stiffness": 300.0 }, "ring_spring": { "mass": 1.2 } }"#)
            .unwrap();
        assert_eq!(cfg.cursor_spring, SpringConfig { stiffness: 300.0, ..SpringConfig::CURSOR });
        assert_eq!(cfg.ring_spring, SpringConfig { mass: 1.2, ..SpringConfig::RING });

        let cfg = EngineConfig::from_json(r#"{ "ring_spring": {} }"#).unwrap();
        assert_eq!(cfg.ring_spring, SpringConfig::RING);
        assert_eq!(cfg.cursor_spring, SpringConfig::CURSOR);
    }

    #[test]
    fn frame_gap_cap_must_be_finite_and_non_negative() {
        let err = EngineConfig::from_json(r#"{ "max_frame_dt_ms": -1.0 }"#).unwrap_err();
        assert!(matches!(err, FxError::InvalidConfig(_)));
        let cfg = EngineConfig { max_frame_dt_ms: f64::INFINITY, ..EngineConfig::default() };
        assert!(matches!(cfg.validate(), Err(FxError::InvalidConfig(_))));
        EngineConfig::from_json(r#"{ "max_frame_dt_ms": 0.0 }"#).unwrap();
    }

    #[test]
    fn burst_must_fit_its_pool() {
        let err = EngineConfig::from_json(r#"{ "burst": { "glyph_count": 10, "glyph_capacity": 4 } }"#)
            .unwrap_err();
        assert!(matches!(err, FxError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(EngineConfig::from_json("{ nope"), Err(FxError::Config(_))));
        assert!(matches!(
            EngineConfig::from_json(r##"{ "default_accent": "#12" }"##),
            Err(FxError::Config(_))
        ));
    }

    #[test]
    fn palette_lookup_ignores_case() {
        let palette = CategoryPalette::default();
        assert_eq!(palette.lookup("react"), Some(Color::rgb(0x61, 0xDA, 0xFB)));
        assert_eq!(palette.lookup("REACT"), Some(Color::rgb(0x61, 0xDA, 0xFB)));
        assert_eq!(palette.lookup("Next.js"), Some(Color::rgb(0xFF, 0xFF, 0xFF)));
        assert_eq!(palette.lookup("cobol"), None);
    }

    #[test]
    fn gate_disables_touch_small_and_reduced_motion() {
        let gate = DisableGate::default();
        let desktop = DeviceProfile { coarse_pointer: false, reduced_motion: false, viewport_width: 1440.0 };
        assert!(!gate.should_disable(&desktop));
        assert!(gate.should_disable(&DeviceProfile { coarse_pointer: true, ..desktop }));
        assert!(gate.should_disable(&DeviceProfile { reduced_motion: true, ..desktop }));
        assert!(gate.should_disable(&DeviceProfile { viewport_width: 768.0, ..desktop }));
    }
}
