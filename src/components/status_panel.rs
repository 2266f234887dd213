use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct StatusPanelProps {
    pub marker_count: usize,
    pub last_gesture: String,
    pub navigating: bool,
}

#[function_component]
pub fn StatusPanel(props: &StatusPanelProps) -> Html {
    let row_style = "display:flex; align-items:center; gap:8px;";
    let label_style = "flex:1; font-weight:500;";
    let value_style =
        "min-width:70px; text-align:right; font-variant-numeric:tabular-nums; font-weight:600;";
    let nav = if props.navigating { "moving" } else { "idle" };
    let nav_color = if props.navigating { "#58a6ff" } else { "#8b949e" };
    html! {
        <div style="position:absolute; top:12px; left:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:10px 14px; min-width:210px; display:flex; flex-direction:column; gap:8px; font-size:14px;">
            <div style={row_style}>
                <span style={format!("{} color:{};", label_style, nav_color)}>{"View"}</span>
                <span style={format!("{} color:{};", value_style, nav_color)}>{ nav }</span>
            </div>
            <div style={row_style}>
                <span style={format!("{} color:#f85149;", label_style)}>{"Markers"}</span>
                <span style={format!("{} color:#f85149;", value_style)}>{ props.marker_count }</span>
            </div>
            if !props.last_gesture.is_empty() {
                <div style="font-size:12px; opacity:0.7;">{ props.last_gesture.clone() }</div>
            }
        </div>
    }
}
