use yew::prelude::*;

use crate::config::Profile;

#[derive(Properties, PartialEq, Clone)]
pub struct EffectsPanelProps {
    pub profile: Profile,
    pub on_select: Callback<Profile>,
    pub enabled: bool,
    pub on_toggle: Callback<()>,
}

#[function_component]
pub fn EffectsPanel(props: &EffectsPanelProps) -> Html {
    let toggle_cb = {
        let cb = props.on_toggle.clone();
        Callback::from(move |_| cb.emit(()))
    };

    let buttons = Profile::ALL.iter().map(|&profile| {
        let cb = props.on_select.clone();
        let selected = profile == props.profile;
        let style = if selected {
            "padding:4px 10px; border-radius:6px; border:1px solid #00E5FF; background:#00E5FF22; color:#00E5FF;"
        } else {
            "padding:4px 10px; border-radius:6px; border:1px solid #30363d; background:#161b22; color:#c9d1d9;"
        };
        html! {
            <button style={style} disabled={!props.enabled} onclick={Callback::from(move |_| cb.emit(profile))}>
                { profile.label() }
            </button>
        }
    });

    html! {<div style="position:fixed; right:16px; bottom:16px; z-index:10000; background:#0d1117e6; border:1px solid #30363d; border-radius:10px; padding:10px 12px; display:flex; flex-direction:column; gap:8px; font-size:12px;">
        <label style="display:flex; align-items:center; gap:8px;" data-cursor="pointer">
            <input type="checkbox" checked={props.enabled} onclick={toggle_cb} />
            <span>{"Pointer effects"}</span>
        </label>
        <div style="display:flex; gap:6px; flex-wrap:wrap;">
            { for buttons }
        </div>
    </div>}
}
