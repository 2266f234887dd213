use super::map_view::MapView;
use crate::model::{MapAction, MapExtent, MapState, Marker};
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    let map_state = use_reducer(|| {
        MapState::new_basic(MapExtent {
            width: 64,
            height: 64,
        })
    });
    let show_grid = use_state(|| {
        if let Some(win) = web_sys::window() {
            if let Ok(Some(store)) = win.local_storage() {
                if let Ok(Some(v)) = store.get_item("ta_setting_show_grid") {
                    return !(v == "0" || v == "false");
                }
            }
        }
        true
    });

    // Load persisted markers once
    {
        let map_state = map_state.clone();
        use_effect_with((), move |_| {
            if let Some(win) = web_sys::window() {
                if let Ok(Some(store)) = win.local_storage() {
                    if let Ok(Some(raw)) = store.get_item("ta_markers") {
                        if let Ok(markers) = serde_json::from_str::<Vec<Marker>>(&raw) {
                            if !markers.is_empty() {
                                map_state.dispatch(MapAction::SetMarkers { markers });
                            }
                        }
                    }
                }
            }
            || ()
        });
    }
    // Persist markers on every document change
    {
        let map_state = map_state.clone();
        use_effect_with(map_state.version, move |_| {
            if let Some(win) = web_sys::window() {
                if let Ok(Some(store)) = win.local_storage() {
                    if let Ok(s) = serde_json::to_string(&map_state.markers) {
                        let _ = store.set_item("ta_markers", &s);
                    }
                }
            }
            || ()
        });
    }
    // Persist the grid toggle
    {
        let flag = *show_grid;
        use_effect_with(flag, move |_| {
            if let Some(win) = web_sys::window() {
                if let Ok(Some(store)) = win.local_storage() {
                    let _ = store.set_item("ta_setting_show_grid", if flag { "1" } else { "0" });
                }
            }
            || ()
        });
    }

    let on_toggle_grid = {
        let show_grid = show_grid.clone();
        Callback::from(move |_| show_grid.set(!*show_grid))
    };
    let on_clear_markers = {
        let map_state = map_state.clone();
        Callback::from(move |_| map_state.dispatch(MapAction::ClearMarkers))
    };
    let toggle_grid_click = {
        let cb = on_toggle_grid.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let clear_markers_click = {
        let cb = on_clear_markers.clone();
        Callback::from(move |_| cb.emit(()))
    };

    html! {
        <div id="root" style="width:100vw; height:100vh; display:flex; flex-direction:column; background:#0e1116; color:#c9d1d9;">
            <div id="top-bar" style="display:flex; align-items:center; gap:12px; padding:8px 12px; border-bottom:1px solid #30363d;">
                <span style="font-weight:600; font-size:16px;">{"Touch Atlas"}</span>
                <span style="flex:1;"></span>
                <label style="display:flex; align-items:center; gap:4px; font-size:13px;">
                    <input type="checkbox" checked={*show_grid} onclick={toggle_grid_click} />
                    {"Grid"}
                </label>
                <button onclick={clear_markers_click}>{"Clear markers"}</button>
            </div>
            <div style="flex:1; position:relative;">
                <MapView
                    map_state={map_state.clone()}
                    show_grid={*show_grid}
                    on_toggle_grid={on_toggle_grid}
                />
            </div>
        </div>
    }
}
