//! Canvas 2D drawing of a [`FrameSnapshot`].
//!
//! Two stacked canvases: the background holds the ambient field, the overlay
//! holds the cursor, trail, bursts and ripples. Both read the snapshot only.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::config::AmbientMode;
use crate::error::{FxError, Result};
use crate::model::{CursorView, EntityKind, EntityView, FrameSnapshot, Link, Shape};

const CURSOR_GLYPH: &str = "< \u{2022} >";
const CURSOR_FONT_PX: f64 = 16.0;
const RING_RADIUS: f64 = 20.0;
const LABEL_OFFSET: (f64, f64) = (20.0, 25.0);
const RAIN_FADE: &str = "rgba(10,10,10,0.05)";
const FONT_FAMILY: &str = "ui-monospace, 'JetBrains Mono', monospace";

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| FxError::Dom("canvas has no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| FxError::Dom("2d context has an unexpected type".into()))?;
        Ok(Self { canvas, ctx })
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.canvas.set_width(width.max(0.0) as u32);
        self.canvas.set_height(height.max(0.0) as u32);
    }

    fn size(&self) -> (f64, f64) {
        (self.canvas.width() as f64, self.canvas.height() as f64)
    }
}

/// The pair of canvases a session draws into. Either may be absent.
pub struct FxCanvases {
    background: Option<CanvasSurface>,
    overlay: Option<CanvasSurface>,
    mode: AmbientMode,
}

impl FxCanvases {
    pub fn none() -> Self {
        Self { background: None, overlay: None, mode: AmbientMode::None }
    }

    pub fn new(background: HtmlCanvasElement, overlay: HtmlCanvasElement, mode: AmbientMode) -> Result<Self> {
        Ok(Self {
            background: Some(CanvasSurface::new(background)?),
            overlay: Some(CanvasSurface::new(overlay)?),
            mode,
        })
    }

    pub fn resize(&self, width: f64, height: f64) {
        for surface in [&self.background, &self.overlay].into_iter().flatten() {
            surface.resize(width, height);
        }
    }

    pub fn draw(&self, snapshot: &FrameSnapshot) {
        if let Some(bg) = &self.background {
            draw_background(bg, self.mode, snapshot);
        }
        if let Some(fg) = &self.overlay {
            draw_overlay(fg, snapshot);
        }
    }

    /// Wipe both canvases, e.g. when the session stops.
    pub fn clear(&self) {
        for surface in [&self.background, &self.overlay].into_iter().flatten() {
            let (w, h) = surface.size();
            surface.ctx.clear_rect(0.0, 0.0, w, h);
        }
    }
}

fn draw_background(surface: &CanvasSurface, mode: AmbientMode, snapshot: &FrameSnapshot) {
    let ctx = &surface.ctx;
    let (w, h) = surface.size();
    let ambient = snapshot.pool(EntityKind::Ambient).map(|p| p.entities.as_slice()).unwrap_or(&[]);
    match mode {
        AmbientMode::None => {}
        AmbientMode::MatrixRain => {
            // The canvas keeps its pixels between steps; the fade leaves the tails.
            if !snapshot.ambient_stepped {
                return;
            }
            ctx.set_fill_style_str(RAIN_FADE);
            ctx.fill_rect(0.0, 0.0, w, h);
            ctx.set_text_baseline("top");
            ctx.set_text_align("left");
            for view in ambient {
                if let Shape::Glyph { text, size } = &view.shape {
                    ctx.set_font(&format!("{size}px {FONT_FAMILY}"));
                    ctx.set_fill_style_str(&view.color.css_rgba(view.opacity));
                    ctx.fill_text(text, view.position.x, view.position.y).ok();
                }
            }
        }
        AmbientMode::Drift => {
            ctx.clear_rect(0.0, 0.0, w, h);
            draw_links(ctx, &snapshot.links);
            for view in ambient {
                if let Shape::Dot { radius } = view.shape {
                    ctx.begin_path();
                    ctx.set_fill_style_str(&view.color.css_rgba(view.opacity));
                    ctx.arc(view.position.x, view.position.y, radius, 0.0, TAU).ok();
                    ctx.fill();
                }
            }
        }
    }
}

fn draw_links(ctx: &CanvasRenderingContext2d, links: &[Link]) {
    ctx.set_line_width(1.0);
    for link in links {
        ctx.begin_path();
        ctx.set_stroke_style_str(&link.color.css_rgba(link.opacity));
        ctx.move_to(link.a.x, link.a.y);
        ctx.line_to(link.b.x, link.b.y);
        ctx.stroke();
    }
}

fn draw_overlay(surface: &CanvasSurface, snapshot: &FrameSnapshot) {
    let ctx = &surface.ctx;
    let (w, h) = surface.size();
    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for kind in [EntityKind::Ripple, EntityKind::TrailGlyph, EntityKind::BurstGlyph] {
        let Some(pool) = snapshot.pool(kind) else {
            continue;
        };
        for view in &pool.entities {
            draw_entity(ctx, view);
        }
    }
    if !snapshot.cursor.hidden {
        draw_cursor(ctx, &snapshot.cursor);
    }
}

fn draw_entity(ctx: &CanvasRenderingContext2d, view: &EntityView) {
    if view.opacity <= 0.0 {
        return;
    }
    let color = view.color.css_rgba(view.opacity);
    match &view.shape {
        Shape::Glyph { text, size } => {
            ctx.save();
            ctx.translate(view.position.x, view.position.y).ok();
            ctx.scale(view.scale, view.scale).ok();
            ctx.set_font(&format!("{size}px {FONT_FAMILY}"));
            ctx.set_fill_style_str(&color);
            ctx.fill_text(text, 0.0, 0.0).ok();
            ctx.restore();
        }
        Shape::Ring { radius } => {
            if *radius <= 0.0 {
                return;
            }
            ctx.begin_path();
            ctx.set_line_width(2.0);
            ctx.set_stroke_style_str(&color);
            ctx.arc(view.position.x, view.position.y, *radius, 0.0, TAU).ok();
            ctx.stroke();
        }
        Shape::Dot { radius } => {
            ctx.begin_path();
            ctx.set_fill_style_str(&color);
            ctx.arc(view.position.x, view.position.y, *radius, 0.0, TAU).ok();
            ctx.fill();
        }
    }
}

fn draw_cursor(ctx: &CanvasRenderingContext2d, cursor: &CursorView) {
    // Dashed ring on the slow follower.
    ctx.save();
    ctx.begin_path();
    ctx.set_line_width(1.0);
    ctx.set_stroke_style_str(&cursor.color.css_rgba(cursor.ring_opacity));
    let dash = js_sys::Array::of2(&JsValue::from_f64(4.0), &JsValue::from_f64(4.0));
    ctx.set_line_dash(&dash).ok();
    ctx.arc(
        cursor.ring_position.x,
        cursor.ring_position.y,
        RING_RADIUS * cursor.ring_scale,
        0.0,
        TAU,
    )
    .ok();
    ctx.stroke();
    ctx.restore();

    ctx.save();
    ctx.translate(cursor.position.x, cursor.position.y).ok();
    ctx.rotate(cursor.tilt_deg.to_radians()).ok();
    ctx.scale(cursor.scale, cursor.scale).ok();
    ctx.set_font(&format!("bold {CURSOR_FONT_PX}px {FONT_FAMILY}"));
    ctx.set_fill_style_str(&cursor.color.to_hex());
    ctx.fill_text(CURSOR_GLYPH, 0.0, 0.0).ok();
    ctx.restore();

    if let Some(label) = &cursor.label {
        ctx.save();
        ctx.set_text_align("left");
        ctx.set_text_baseline("top");
        ctx.set_font(&format!("12px {FONT_FAMILY}"));
        ctx.set_fill_style_str(&cursor.color.to_hex());
        ctx.fill_text(
            &format!("<{label}/>"),
            cursor.position.x + LABEL_OFFSET.0,
            cursor.position.y + LABEL_OFFSET.1,
        )
        .ok();
        ctx.restore();
    }
}
