use std::cell::RefCell;
use std::rc::Rc;

use web_sys::HtmlCanvasElement;
use yew::prelude::*;

use crate::config::EngineConfig;
use crate::error::{FxError, Result};
use crate::render::FxCanvases;
use crate::session::{TrackingSession, detect_device};
use crate::state::scene::FxScene;

#[derive(Properties, PartialEq, Clone)]
pub struct FxLayerProps {
    pub config: Rc<EngineConfig>,
}

/// Mounts the two effect canvases and owns the tracking session. A new config
/// tears the running session down and starts a fresh one.
#[function_component]
pub fn FxLayer(props: &FxLayerProps) -> Html {
    let background_ref = use_node_ref();
    let overlay_ref = use_node_ref();

    {
        let background_ref = background_ref.clone();
        let overlay_ref = overlay_ref.clone();
        use_effect_with(props.config.clone(), move |config| {
            let session = match start_layer(Rc::clone(config), &background_ref, &overlay_ref) {
                Ok(session) => Some(session),
                Err(err) => {
                    log::warn!("pointer effects unavailable: {err}");
                    None
                }
            };
            move || {
                if let Some(session) = session {
                    session.stop();
                }
            }
        });
    }

    html! {
        <>
            <canvas ref={background_ref}
                style="position:fixed; inset:0; width:100vw; height:100vh; pointer-events:none; z-index:0;" />
            <canvas ref={overlay_ref}
                style="position:fixed; inset:0; width:100vw; height:100vh; pointer-events:none; z-index:9999;" />
        </>
    }
}

fn start_layer(config: Rc<EngineConfig>, background: &NodeRef, overlay: &NodeRef) -> Result<TrackingSession> {
    let window = web_sys::window().ok_or_else(|| FxError::Dom("no window".into()))?;
    let device = detect_device(&window);
    let scene = Rc::new(RefCell::new(FxScene::with_js_random(Rc::clone(&config), device)));
    let canvases = match (background.cast::<HtmlCanvasElement>(), overlay.cast::<HtmlCanvasElement>()) {
        (Some(bg), Some(fg)) => FxCanvases::new(bg, fg, config.ambient.mode)?,
        _ => return Err(FxError::Dom("effect canvases are not mounted".into())),
    };
    TrackingSession::start(scene, canvases)
}
