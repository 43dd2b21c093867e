//! Ambient background field.
//!
//! Two spawn policies share the ambient pool:
//! - matrix rain: one falling glyph per column, advanced a whole cell per step.
//!   Past the bottom edge a drop restarts at the top only when a random gate
//!   passes, so columns do not repeat in lockstep.
//! - drift: slow dots that bounce off the edges, shy away from the pointer and
//!   respawn elsewhere when their lifetime runs out.
//!
//! Neither policy looks at pointer state except the drift repulsor.

use crate::config::{AmbientConfig, AmbientMode, DriftConfig, RainConfig};
use crate::model::{Color, Entity, EntityId, EntityKind, Fade, Link, Motion, Vec2, Visual};
use crate::state::pool::{IdSource, Pool};
use crate::state::rng::RandomSource;
use crate::state::viewport::Viewport;

/// Steps replayed after a stall; anything beyond is dropped.
const MAX_CATCH_UP_STEPS: usize = 8;

#[derive(Clone, Debug)]
pub struct AmbientField {
    mode: AmbientMode,
    columns: usize,
    last_step: Option<f64>,
    stepped: bool,
    seeded: bool,
}

impl AmbientField {
    pub fn new(mode: AmbientMode) -> Self {
        Self { mode, columns: 0, last_step: None, stepped: false, seeded: false }
    }

    pub fn mode(&self) -> AmbientMode {
        self.mode
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// True when the last `age` call advanced the rain.
    pub fn stepped(&self) -> bool {
        self.stepped
    }

    pub fn resize(&mut self, viewport: Viewport, cfg: &AmbientConfig, pool: &mut Pool<Entity>) {
        match self.mode {
            AmbientMode::None => {}
            AmbientMode::MatrixRain => {
                self.columns = (viewport.width / cfg.rain.cell_px).floor().max(0.0) as usize;
                pool.retain(|e| e.position.x < viewport.width);
            }
            AmbientMode::Drift => {
                pool.retain(|e| {
                    e.position.x >= 0.0
                        && e.position.y >= 0.0
                        && e.position.x <= viewport.width
                        && e.position.y <= viewport.height
                });
            }
        }
    }

    /// Move, wrap or expire live particles. Runs after the other pools have aged.
    #[allow(clippy::too_many_arguments)]
    pub fn age(
        &mut self,
        now: f64,
        dt_ms: f64,
        viewport: Viewport,
        cfg: &AmbientConfig,
        pool: &mut Pool<Entity>,
        rng: &mut dyn RandomSource,
        repulsor: Option<Vec2>,
    ) {
        self.stepped = false;
        match self.mode {
            AmbientMode::None => {}
            AmbientMode::MatrixRain => self.age_rain(now, viewport, &cfg.rain, pool, rng),
            AmbientMode::Drift => age_drift(now, dt_ms, viewport, &cfg.drift, pool, rng, repulsor),
        }
    }

    fn age_rain(
        &mut self,
        now: f64,
        viewport: Viewport,
        cfg: &RainConfig,
        pool: &mut Pool<Entity>,
        rng: &mut dyn RandomSource,
    ) {
        let Some(last) = self.last_step else {
            self.last_step = Some(now);
            return;
        };
        let due = ((now - last) / cfg.step_ms).floor();
        if !(due >= 1.0) {
            return;
        }
        let steps = if due as usize > MAX_CATCH_UP_STEPS {
            self.last_step = Some(now);
            MAX_CATCH_UP_STEPS
        } else {
            self.last_step = Some(last + due * cfg.step_ms);
            due as usize
        };
        for _ in 0..steps {
            for e in pool.iter_mut() {
                let Motion::Fall { cell } = e.motion else {
                    continue;
                };
                e.position.y += cell;
                if let Visual::Glyph { text, .. } = &mut e.visual {
                    *text = random_char(&cfg.alphabet, rng);
                }
                e.color = pick_color(&cfg.palette, rng, e.color);
                if e.position.y > viewport.height && rng.next_f64() < cfg.respawn_probability {
                    e.position.y = cell;
                    e.origin = e.position;
                    e.born_at = now;
                }
            }
        }
        pool.retire_expired(now);
        self.stepped = true;
    }

    /// Spawn policy, run once per frame after aging and pointer-driven spawns.
    pub fn spawn_due(
        &mut self,
        now: f64,
        viewport: Viewport,
        cfg: &AmbientConfig,
        pool: &mut Pool<Entity>,
        rng: &mut dyn RandomSource,
        ids: &mut IdSource,
    ) {
        match self.mode {
            AmbientMode::None => {}
            AmbientMode::MatrixRain => {
                if self.seeded && !self.stepped {
                    return;
                }
                self.seeded = true;
                let rain = &cfg.rain;
                for column in self.open_columns(viewport, rain, pool) {
                    pool.push(rain_drop(ids.next_id(), column, now, rain, rng));
                }
            }
            AmbientMode::Drift => {
                let live = pool.iter().filter(|e| matches!(e.motion, Motion::Wander { .. })).count();
                for _ in live..cfg.drift.count.min(pool.capacity()) {
                    pool.push(drift_dot(ids.next_id(), now, viewport, &cfg.drift, rng, None));
                }
                self.seeded = true;
            }
        }
    }

    /// Spawn a single particle: a drop in a random column with room, or one drift dot.
    pub fn spawn_one(
        &mut self,
        now: f64,
        viewport: Viewport,
        cfg: &AmbientConfig,
        pool: &mut Pool<Entity>,
        rng: &mut dyn RandomSource,
        ids: &mut IdSource,
    ) -> Option<EntityId> {
        let entity = match self.mode {
            AmbientMode::None => return None,
            AmbientMode::MatrixRain => {
                let open = self.open_columns(viewport, &cfg.rain, pool);
                if open.is_empty() {
                    return None;
                }
                let column = open[rng.index(open.len())];
                rain_drop(ids.next_id(), column, now, &cfg.rain, rng)
            }
            AmbientMode::Drift => drift_dot(ids.next_id(), now, viewport, &cfg.drift, rng, None),
        };
        let id = entity.id;
        pool.push(entity);
        Some(id)
    }

    /// Drift only: add `push_quantity` dots at `at`.
    #[allow(clippy::too_many_arguments)]
    pub fn push_at(
        &mut self,
        at: Vec2,
        now: f64,
        viewport: Viewport,
        cfg: &AmbientConfig,
        pool: &mut Pool<Entity>,
        rng: &mut dyn RandomSource,
        ids: &mut IdSource,
    ) -> usize {
        if self.mode != AmbientMode::Drift {
            return 0;
        }
        for _ in 0..cfg.drift.push_quantity {
            pool.push(drift_dot(ids.next_id(), now, viewport, &cfg.drift, rng, Some(at)));
        }
        cfg.drift.push_quantity
    }

    /// Columns below their cap whose newest drop has cleared the spacing band.
    fn open_columns(&self, viewport: Viewport, cfg: &RainConfig, pool: &Pool<Entity>) -> Vec<usize> {
        let cap = cfg.per_column_cap.max(1);
        let mut occupancy = vec![(0usize, f64::INFINITY); self.columns];
        for e in pool.iter() {
            if let Motion::Fall { cell } = e.motion {
                let column = (e.position.x / cell).round() as usize;
                if let Some(slot) = occupancy.get_mut(column) {
                    slot.0 += 1;
                    slot.1 = slot.1.min(e.position.y);
                }
            }
        }
        let spacing = viewport.height / cap as f64;
        occupancy
            .iter()
            .enumerate()
            .filter(|(_, (count, top))| *count < cap && (*count == 0 || *top >= spacing))
            .map(|(column, _)| column)
            .collect()
    }
}

fn random_char(alphabet: &str, rng: &mut dyn RandomSource) -> String {
    let n = alphabet.chars().count();
    if n == 0 {
        return String::new();
    }
    alphabet.chars().nth(rng.index(n)).map(String::from).unwrap_or_default()
}

fn pick_color(palette: &[Color], rng: &mut dyn RandomSource, fallback: Color) -> Color {
    if palette.is_empty() {
        return fallback;
    }
    palette[rng.index(palette.len())]
}

fn rain_drop(id: EntityId, column: usize, now: f64, cfg: &RainConfig, rng: &mut dyn RandomSource) -> Entity {
    let cell = cfg.cell_px;
    let at = Vec2::new(column as f64 * cell, cell);
    Entity {
        id,
        kind: EntityKind::Ambient,
        origin: at,
        position: at,
        motion: Motion::Fall { cell },
        born_at: now,
        ttl_ms: cfg.ttl_ms,
        visual: Visual::Glyph { text: random_char(&cfg.alphabet, rng), size: cell },
        fade: Fade::Constant { opacity: 1.0 },
        color: pick_color(&cfg.palette, rng, Color::rgb(0x00, 0xE5, 0xFF)),
    }
}

fn drift_dot(
    id: EntityId,
    now: f64,
    viewport: Viewport,
    cfg: &DriftConfig,
    rng: &mut dyn RandomSource,
    at: Option<Vec2>,
) -> Entity {
    let at = at.unwrap_or_else(|| {
        Vec2::new(rng.range(0.0, viewport.width), rng.range(0.0, viewport.height))
    });
    let heading = rng.range(0.0, std::f64::consts::TAU);
    let speed = cfg.speed * rng.range(0.2, 1.0);
    Entity {
        id,
        kind: EntityKind::Ambient,
        origin: at,
        position: at,
        motion: Motion::Wander { velocity: Vec2::from_angle(heading) * speed },
        born_at: now,
        ttl_ms: cfg.lifetime_ms * rng.range(0.75, 1.25),
        visual: Visual::Dot { radius: rng.range(cfg.min_radius, cfg.max_radius) },
        fade: Fade::Pulse {
            min_opacity: cfg.min_opacity,
            max_opacity: cfg.max_opacity,
            period_ms: cfg.pulse_ms * rng.range(0.7, 1.3),
            phase: rng.range(0.0, std::f64::consts::TAU),
        },
        color: pick_color(&cfg.palette, rng, cfg.link_color),
    }
}

fn age_drift(
    now: f64,
    dt_ms: f64,
    viewport: Viewport,
    cfg: &DriftConfig,
    pool: &mut Pool<Entity>,
    rng: &mut dyn RandomSource,
    repulsor: Option<Vec2>,
) {
    // Dots pushed by clicks are surplus; they retire instead of cycling.
    let live = pool.iter().filter(|e| matches!(e.motion, Motion::Wander { .. })).count();
    let mut surplus = live.saturating_sub(cfg.count);
    let mut retired: Vec<EntityId> = Vec::new();
    for e in pool.iter_mut() {
        if !matches!(e.motion, Motion::Wander { .. }) {
            continue;
        }
        if e.is_expired(now) {
            if surplus > 0 {
                surplus -= 1;
                retired.push(e.id);
            } else {
                *e = drift_dot(e.id, now, viewport, cfg, rng, None);
            }
            continue;
        }
        let Motion::Wander { velocity } = &mut e.motion else {
            continue;
        };
        let mut pos = e.position + *velocity * dt_ms;
        if let Some(r) = repulsor {
            let d = pos.distance(r);
            if d > 1e-6 && d < cfg.repulse_radius {
                let away = (pos - r) * (1.0 / d);
                pos = pos + away * (cfg.repulse_speed * (1.0 - d / cfg.repulse_radius) * dt_ms);
            }
        }
        bounce(&mut pos, velocity, viewport);
        e.position = pos;
    }
    if !retired.is_empty() {
        pool.retain(|e| !retired.contains(&e.id));
    }
}

fn bounce(pos: &mut Vec2, vel: &mut Vec2, viewport: Viewport) {
    if pos.x < 0.0 {
        pos.x = -pos.x;
        vel.x = vel.x.abs();
    } else if pos.x > viewport.width {
        pos.x = 2.0 * viewport.width - pos.x;
        vel.x = -vel.x.abs();
    }
    if pos.y < 0.0 {
        pos.y = -pos.y;
        vel.y = vel.y.abs();
    } else if pos.y > viewport.height {
        pos.y = 2.0 * viewport.height - pos.y;
        vel.y = -vel.y.abs();
    }
    pos.x = pos.x.clamp(0.0, viewport.width);
    pos.y = pos.y.clamp(0.0, viewport.height);
}

/// Pairs of drift dots closer than `link_distance`, fading with distance.
pub fn drift_links(pool: &Pool<Entity>, cfg: &DriftConfig) -> Vec<Link> {
    let dots: Vec<Vec2> = pool
        .iter()
        .filter(|e| matches!(e.motion, Motion::Wander { .. }))
        .map(|e| e.position)
        .collect();
    let mut links = Vec::new();
    if !(cfg.link_distance > 0.0) {
        return links;
    }
    for (i, a) in dots.iter().enumerate() {
        for b in &dots[i + 1..] {
            let d = a.distance(*b);
            if d < cfg.link_distance {
                links.push(Link {
                    a: *a,
                    b: *b,
                    opacity: cfg.link_opacity * (1.0 - d / cfg.link_distance),
                    color: cfg.link_color,
                });
            }
        }
    }
    links
}
