#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use pointer_fx::config::{EngineConfig, Profile};
use pointer_fx::render::FxCanvases;
use pointer_fx::session::TrackingSession;
use pointer_fx::state::{DeviceProfile, FxScene, SequenceRandom};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn scene(device: DeviceProfile) -> Rc<RefCell<FxScene>> {
    let config = Rc::new(EngineConfig::preset(Profile::Subtle));
    Rc::new(RefCell::new(FxScene::new(config, device, Box::new(SequenceRandom::constant(0.5)))))
}

#[wasm_bindgen_test]
fn desktop_session_attaches_and_releases_listeners() {
    let session = TrackingSession::start(scene(DeviceProfile::desktop(1440.0)), FxCanvases::none()).unwrap();
    assert_eq!(session.listener_count(), 7);
    assert!(session.is_active());
    session.stop();
}

#[wasm_bindgen_test]
fn touch_device_attaches_nothing() {
    let shared = scene(DeviceProfile::touch(390.0));
    let session = TrackingSession::start(Rc::clone(&shared), FxCanvases::none()).unwrap();
    assert_eq!(session.listener_count(), 0);
    assert!(!session.is_active());
    assert_eq!(shared.borrow().engine().entity_count(), 0);
}

#[wasm_bindgen_test]
fn dropped_session_releases_the_scene() {
    let shared = scene(DeviceProfile::desktop(1440.0));
    let session = TrackingSession::start(Rc::clone(&shared), FxCanvases::none()).unwrap();
    assert!(Rc::strong_count(&shared) > 1);
    drop(session);
    // Listener closures and the pending frame held the only other references.
    assert_eq!(Rc::strong_count(&shared), 1);
}

fn body_cursor() -> String {
    let body = web_sys::window().and_then(|w| w.document()).and_then(|d| d.body()).unwrap();
    body.style().get_property_value("cursor").unwrap()
}

#[wasm_bindgen_test]
fn narrowing_below_the_gate_restores_the_native_cursor() {
    let shared = scene(DeviceProfile::desktop(1440.0));
    let session = TrackingSession::start(Rc::clone(&shared), FxCanvases::none()).unwrap();
    assert_eq!(body_cursor(), "none");

    session.apply_device(DeviceProfile::desktop(600.0));
    assert!(shared.borrow().should_disable());
    assert_eq!(body_cursor(), "");
    let paused_at = shared.borrow().engine().now();

    session.apply_device(DeviceProfile::desktop(1440.0));
    assert!(!shared.borrow().should_disable());
    assert_eq!(body_cursor(), "none");
    assert_eq!(shared.borrow().engine().now(), paused_at);

    drop(session);
    assert_eq!(body_cursor(), "");
}
