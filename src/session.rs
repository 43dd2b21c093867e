//! Owned listener / frame-loop handle.
//!
//! [`TrackingSession::start`] attaches every DOM listener and starts the
//! animation-frame loop; dropping the session (or calling [`TrackingSession::stop`])
//! removes all of them. A disabled device gets a session that holds nothing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::render::{AnimationFrame, request_animation_frame};
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, MouseEvent, Window};

use crate::error::{FxError, Result};
use crate::render::FxCanvases;
use crate::state::scene::FxScene;
use crate::state::viewport::{DeviceProfile, Viewport};

type SharedScene = Rc<RefCell<FxScene>>;

pub struct TrackingSession {
    listeners: Vec<EventListener>,
    frame: Rc<RefCell<Option<AnimationFrame>>>,
    running: Rc<Cell<bool>>,
    scene: SharedScene,
    canvases: Rc<FxCanvases>,
}

/// Read what the browser says about the input device and viewport.
pub fn detect_device(window: &Window) -> DeviceProfile {
    let matches = |query: &str| {
        window
            .match_media(query)
            .ok()
            .flatten()
            .map(|mql| mql.matches())
            .unwrap_or(false)
    };
    DeviceProfile {
        coarse_pointer: matches("(pointer: coarse)"),
        reduced_motion: matches("(prefers-reduced-motion: reduce)"),
        viewport_width: window_size(window).width,
    }
}

fn window_size(window: &Window) -> Viewport {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(width, height)
}

impl TrackingSession {
    pub fn start(scene: SharedScene, canvases: FxCanvases) -> Result<Self> {
        let canvases = Rc::new(canvases);
        let mut session = Self {
            listeners: Vec::new(),
            frame: Rc::new(RefCell::new(None)),
            running: Rc::new(Cell::new(false)),
            scene: Rc::clone(&scene),
            canvases: Rc::clone(&canvases),
        };
        if scene.borrow().should_disable() {
            log::info!("pointer effects disabled on this device; no listeners attached");
            return Ok(session);
        }

        let window = web_sys::window().ok_or_else(|| FxError::Dom("no window".into()))?;
        let document = window.document().ok_or_else(|| FxError::Dom("no document".into()))?;
        let root = document
            .document_element()
            .ok_or_else(|| FxError::Dom("no document element".into()))?;

        let size = window_size(&window);
        canvases.resize(size.width, size.height);
        scene.borrow_mut().set_viewport(size);

        let s = Rc::clone(&scene);
        session.listeners.push(EventListener::new(&window, "mousemove", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            s.borrow_mut().on_raw_move(event.client_x() as f64, event.client_y() as f64);
        }));

        let s = Rc::clone(&scene);
        session.listeners.push(EventListener::new(&document, "mouseover", move |event: &Event| {
            let target = event.target().and_then(|t| t.dyn_into::<Element>().ok());
            let mut scene = s.borrow_mut();
            match target {
                Some(element) => scene.on_hover_target(&element),
                None => scene.clear_hover(),
            }
        }));

        let s = Rc::clone(&scene);
        session.listeners.push(EventListener::new(&window, "mousedown", move |_event: &Event| {
            s.borrow_mut().on_press();
        }));

        let s = Rc::clone(&scene);
        session.listeners.push(EventListener::new(&window, "mouseup", move |_event: &Event| {
            s.borrow_mut().on_release();
        }));

        let s = Rc::clone(&scene);
        session.listeners.push(EventListener::new(&root, "mouseleave", move |_event: &Event| {
            let mut scene = s.borrow_mut();
            scene.on_pointer_leave_viewport();
            scene.clear_hover();
        }));

        let s = Rc::clone(&scene);
        session.listeners.push(EventListener::new(&root, "mouseenter", move |_event: &Event| {
            s.borrow_mut().on_pointer_enter_viewport();
        }));

        let s = Rc::clone(&scene);
        let c = Rc::clone(&canvases);
        let w = window.clone();
        session.listeners.push(EventListener::new(&window, "resize", move |_event: &Event| {
            let size = window_size(&w);
            c.resize(size.width, size.height);
            s.borrow_mut().set_viewport(size);
            apply_device(&s, &c, detect_device(&w));
        }));

        session.running.set(true);
        set_native_cursor("none");
        schedule_frame(
            Rc::clone(&session.frame),
            Rc::clone(&session.running),
            scene,
            canvases,
        );
        log::info!("pointer effects started with {} listeners", session.listeners.len());
        Ok(session)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_active(&self) -> bool {
        self.running.get()
    }

    /// Re-evaluate the disable gate for a new device reading, the same way a
    /// window resize does.
    pub fn apply_device(&self, device: DeviceProfile) {
        if self.is_active() {
            apply_device(&self.scene, &self.canvases, device);
        }
    }

    pub fn stop(self) {
        log::info!("pointer effects stopping, releasing {} listeners", self.listeners.len());
        drop(self);
    }

    fn release(&mut self) {
        if self.running.replace(false) {
            set_native_cursor("");
        }
        // Dropping the handle cancels the pending frame callback.
        self.frame.borrow_mut().take();
        self.listeners.clear();
        self.canvases.clear();
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Disabled scenes show the native cursor and an empty overlay; enabled ones
/// hide the native cursor behind the drawn one.
fn apply_device(scene: &SharedScene, canvases: &FxCanvases, device: DeviceProfile) {
    let (was_disabled, disabled) = {
        let mut scene = scene.borrow_mut();
        let was_disabled = scene.should_disable();
        scene.set_device(device);
        (was_disabled, scene.should_disable())
    };
    if disabled && !was_disabled {
        canvases.clear();
        log::info!("pointer effects paused for this device");
    } else if was_disabled && !disabled {
        log::info!("pointer effects resumed");
    }
    set_native_cursor(if disabled { "" } else { "none" });
}

pub fn set_native_cursor(value: &str) {
    let body = web_sys::window().and_then(|w| w.document()).and_then(|d| d.body());
    if let Some(body) = body {
        let _ = body.style().set_property("cursor", value);
    }
}

/// One frame: tick the scene, draw it, book the next frame. A disabled scene
/// does no work but keeps the loop booked so a later resize can resume it.
fn schedule_frame(
    frame: Rc<RefCell<Option<AnimationFrame>>>,
    running: Rc<Cell<bool>>,
    scene: SharedScene,
    canvases: Rc<FxCanvases>,
) {
    let slot = Rc::clone(&frame);
    let handle = request_animation_frame(move |now| {
        if !running.get() {
            return;
        }
        {
            let mut scene = scene.borrow_mut();
            if !scene.should_disable() {
                scene.tick(now);
                canvases.draw(&scene.snapshot());
            }
        }
        schedule_frame(slot, running, scene, canvases);
    });
    *frame.borrow_mut() = Some(handle);
}
