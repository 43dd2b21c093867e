use std::rc::Rc;

use yew::prelude::*;

use super::{effects_panel::EffectsPanel, fx_layer::FxLayer};
use crate::config::{EngineConfig, Profile};

const PROFILE_KEY: &str = "pfx_profile";
const ENABLED_KEY: &str = "pfx_enabled";

const STACK: [(&str, &str); 6] = [
    ("React", "UI components and hooks"),
    ("TypeScript", "Typed front-end code"),
    ("Rust", "WebAssembly core"),
    ("Node.js", "APIs and tooling"),
    ("Docker", "Build and deploy"),
    ("PostgreSQL", "Storage"),
];

fn storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn load_profile() -> Profile {
    storage()
        .and_then(|s| s.get_item(PROFILE_KEY).ok().flatten())
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or(Profile::Hero)
}

fn load_enabled() -> bool {
    storage()
        .and_then(|s| s.get_item(ENABLED_KEY).ok().flatten())
        .map(|v| v != "0")
        .unwrap_or(true)
}

#[function_component(App)]
pub fn app() -> Html {
    let profile = use_state(load_profile);
    let enabled = use_state(load_enabled);
    let config = use_memo(*profile, |p| EngineConfig::preset(*p));

    // Persist choices
    {
        let p = *profile;
        let on = *enabled;
        use_effect_with((p, on), move |_| {
            if let Some(store) = storage() {
                if let Ok(raw) = serde_json::to_string(&p) {
                    let _ = store.set_item(PROFILE_KEY, &raw);
                }
                let _ = store.set_item(ENABLED_KEY, if on { "1" } else { "0" });
            }
            || ()
        });
    }

    let on_select = {
        let profile = profile.clone();
        Callback::from(move |p: Profile| profile.set(p))
    };
    let on_toggle = {
        let enabled = enabled.clone();
        Callback::from(move |_| enabled.set(!*enabled))
    };

    let chips = STACK.iter().map(|(name, blurb)| {
        html! {
            <li data-tech={*name} style="list-style:none; padding:12px 14px; border:1px solid #30363d; border-radius:10px; background:#161b22;">
                <div style="font-weight:600;">{ *name }</div>
                <div style="font-size:12px; opacity:0.7;">{ *blurb }</div>
            </li>
        }
    });

    html! {
        <div style="min-height:100vh; background:#0a0a0a; color:#c9d1d9; font-family:ui-monospace, monospace;">
            if *enabled {
                <FxLayer config={Rc::clone(&config)} />
            }
            <main style="position:relative; z-index:1; max-width:880px; margin:0 auto; padding:96px 24px; display:flex; flex-direction:column; gap:32px;">
                <header style="display:flex; flex-direction:column; gap:12px;">
                    <h1 style="margin:0; font-size:40px; color:#00E5FF;">{"<pointer-fx />"}</h1>
                    <p style="margin:0; opacity:0.8;">
                        {"Move the pointer to leave a code trail, click for a burst, hover the stack to tint the cursor."}
                    </p>
                    <div style="display:flex; gap:12px;">
                        <a href="#stack" style="color:#8B5CF6;">{"See the stack"}</a>
                        <button style="padding:6px 14px; border-radius:6px; border:1px solid #00FF9C; background:transparent; color:#00FF9C;">
                            {"Say hello"}
                        </button>
                    </div>
                </header>
                <section id="stack">
                    <h2 style="font-size:20px;">{"Stack"}</h2>
                    <ul style="display:grid; grid-template-columns:repeat(auto-fill, minmax(200px, 1fr)); gap:12px; padding:0;">
                        { for chips }
                    </ul>
                </section>
                <section data-cursor="pointer" style="padding:20px; border:1px dashed #30363d; border-radius:12px;">
                    {"This card opts into the interactive cursor without being a link."}
                </section>
            </main>
            <EffectsPanel profile={*profile} on_select={on_select} enabled={*enabled} on_toggle={on_toggle} />
        </div>
    }
}
