use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct HelpOverlayProps {
    pub show: bool,
    pub hide_help: Callback<()>,
}

#[function_component(HelpOverlay)]
pub fn help_overlay(props: &HelpOverlayProps) -> Html {
    if !props.show {
        return html! {};
    }
    let hide_cb = props.hide_help.clone();
    let hide_btn = Callback::from(move |_| hide_cb.emit(()));
    html! {
        <div style="position:absolute; top:50%; left:50%; transform:translate(-50%, -50%); background:rgba(0,0,0,0.87); border:2px solid #30363d; padding:28px 36px; border-radius:14px; max-width:520px; width:90%; box-shadow:0 0 0 1px #1a1f24, 0 6px 18px rgba(0,0,0,0.6); font-size:14px; line-height:1.4;">
            <h2 style="margin:0 0 12px 0; font-size:22px; color:#58a6ff; text-align:center;">{"Touch Atlas"}</h2>
            <p style="margin:4px 0 10px 0; text-align:center; opacity:0.85;">{"A touch-first map. One finger pans, two fingers pinch."}</p>
            <ul style="margin:0 0 12px 18px; padding:0; list-style:disc; display:flex; flex-direction:column; gap:4px;">
                <li>{"Drag with one finger to pan the map."}</li>
                <li>{"Pinch with two fingers to zoom; the spot between them stays put."}</li>
                <li>{"Double-tap to zoom one level in on that spot."}</li>
                <li>{"Hold a finger still for a second to drop a marker."}</li>
                <li>{"Press 'G' to toggle the grid; buttons zoom on desktop."}</li>
            </ul>
            <div style="display:flex; gap:12px; justify-content:center; margin-top:8px;">
                <button onclick={hide_btn}>{"Got it"}</button>
            </div>
        </div>
    }
}
