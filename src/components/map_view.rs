use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, KeyboardEvent, TouchEvent};
use yew::prelude::*;

use crate::model::{MapAction, MapState, ScreenPoint, SceneAnimation, WorldPoint};
use crate::state::{GestureConfig, GestureRecognizer, MapCamera, MapViewport, TouchTracker};
use crate::util::{clog, format_world};

use super::{
    help_overlay::HelpOverlay, status_panel::StatusPanel, zoom_controls::ZoomControls,
};

#[derive(Properties, PartialEq, Clone)]
pub struct MapViewProps {
    pub map_state: UseReducerHandle<MapState>,
    pub show_grid: bool,
    pub on_toggle_grid: Callback<()>,
}

fn now_secs() -> f64 {
    js_sys::Date::now() / 1000.0
}

#[function_component(MapView)]
pub fn map_view(props: &MapViewProps) -> Html {
    let canvas_ref = use_node_ref();
    let extent = props.map_state.extent;
    let camera = use_mut_ref(|| MapCamera::new(extent));
    let tracker = use_mut_ref(TouchTracker::new);
    let recognizer = use_mut_ref(|| GestureRecognizer::new(GestureConfig::default()));
    let draw_ref = use_mut_ref(|| None::<Rc<dyn Fn()>>);
    let map_state_ref = use_mut_ref(|| props.map_state.clone());
    let show_grid_flag = use_mut_ref(|| true);
    let navigating = use_state(|| false);
    let last_gesture = use_state(String::new);
    let show_help = use_state(|| {
        if let Some(win) = web_sys::window() {
            if let Ok(Some(store)) = win.local_storage() {
                // Show only if the key is absent.
                return store.get_item("ta_help_seen").ok().flatten().is_none();
            }
        }
        true
    });

    // Effect: sync the grid toggle into the draw flag
    {
        let flag = props.show_grid;
        let show_grid_flag_ref = show_grid_flag.clone();
        let draw_ref = draw_ref.clone();
        use_effect_with(flag, move |_| {
            *show_grid_flag_ref.borrow_mut() = flag;
            if let Some(f) = &*draw_ref.borrow() {
                f();
            }
            || ()
        });
    }
    // Effect: refresh the reducer handle on every document version
    {
        let map_state_ref = map_state_ref.clone();
        let current_handle = props.map_state.clone();
        let version = props.map_state.version;
        use_effect_with(version, move |_| {
            *map_state_ref.borrow_mut() = current_handle;
            || ()
        });
    }

    // Main mount effect (listeners, gesture wiring, render loop)
    {
        let canvas_ref = canvas_ref.clone();
        let camera = camera.clone();
        let tracker = tracker.clone();
        let recognizer = recognizer.clone();
        let draw_ref_setup = draw_ref.clone();
        let map_state_ref = map_state_ref.clone();
        let show_grid_flag = show_grid_flag.clone();
        let navigating = navigating.clone();
        let last_gesture = last_gesture.clone();
        let on_toggle_grid = props.on_toggle_grid.clone();

        use_effect_with((), move |_| {
            let window = web_sys::window().expect("no global `window` exists");
            let document = window.document().expect("should have a document on window");
            let canvas: HtmlCanvasElement = canvas_ref
                .cast::<HtmlCanvasElement>()
                .expect("canvas_ref not attached to a canvas element");

            let compute_and_apply_canvas_size = {
                let canvas = canvas.clone();
                let document = document.clone();
                let window = window.clone();
                let camera = camera.clone();
                move || {
                    let nav_height: f64 = document
                        .get_element_by_id("top-bar")
                        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                        .map(|el| el.client_height() as f64)
                        .unwrap_or(0.0);
                    let width = window
                        .inner_width()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(800.0);
                    let height = window
                        .inner_height()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(600.0)
                        - nav_height;
                    canvas.set_width(width.max(0.0) as u32);
                    canvas.set_height(height.max(0.0) as u32);
                    camera.borrow_mut().set_viewport_size(width.max(1.0), height.max(1.0));
                }
            };
            compute_and_apply_canvas_size();

            // Gesture event wiring (subscription order matters to no one here,
            // but the HUD reads nicer when the flag flips before the label).
            {
                let mut rec = recognizer.borrow_mut();
                {
                    let navigating = navigating.clone();
                    rec.subscribe_interaction_started(Callback::from(move |_| {
                        navigating.set(true);
                    }));
                }
                {
                    let navigating = navigating.clone();
                    rec.subscribe_interaction_ended(Callback::from(move |_| {
                        navigating.set(false);
                    }));
                }
                {
                    let last_gesture = last_gesture.clone();
                    rec.subscribe_double_tap(Callback::from(move |loc: WorldPoint| {
                        clog(&format!("double-tap at {}", format_world(&loc)));
                        last_gesture.set(format!("double-tap {}", format_world(&loc)));
                    }));
                }
                {
                    let last_gesture = last_gesture.clone();
                    let map_state_ref = map_state_ref.clone();
                    rec.subscribe_tap_and_hold(Callback::from(move |loc: WorldPoint| {
                        clog(&format!("tap-and-hold at {}", format_world(&loc)));
                        map_state_ref
                            .borrow()
                            .dispatch(MapAction::PlaceMarker { pos: loc });
                        last_gesture.set(format!("marker {}", format_world(&loc)));
                    }));
                }
            }

            // Build draw closure and store in draw_ref
            let draw_closure: Rc<dyn Fn()> = {
                let canvas = canvas.clone();
                let camera = camera.clone();
                let map_state_ref = map_state_ref.clone();
                let show_grid_flag = show_grid_flag.clone();
                let recognizer = recognizer.clone();
                Rc::new(move || {
                    if !canvas.is_connected() {
                        return;
                    }
                    let ctx = match canvas.get_context("2d").ok().flatten() {
                        Some(c) => c.dyn_into::<CanvasRenderingContext2d>().unwrap(),
                        None => return,
                    };
                    let w = canvas.width() as f64;
                    let h = canvas.height() as f64;
                    let cam = camera.borrow();
                    let s = cam.scale_px();
                    let handle = map_state_ref.borrow();
                    let ms = (**handle).clone();

                    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
                    ctx.set_fill_style_str("#0e1116");
                    ctx.fill_rect(0.0, 0.0, w, h);
                    ctx.set_transform(s, 0.0, 0.0, s, cam.offset_x, cam.offset_y).ok();

                    let ew = ms.extent.width as f64;
                    let eh = ms.extent.height as f64;
                    ctx.set_fill_style_str("#161b22");
                    ctx.fill_rect(0.0, 0.0, ew, eh);
                    let line_w = (1.0 / s).max(0.001);
                    if *show_grid_flag.borrow() {
                        ctx.set_stroke_style_str("#2f3641");
                        ctx.set_line_width(line_w);
                        for x in 0..=ms.extent.width {
                            ctx.begin_path();
                            ctx.move_to(x as f64, 0.0);
                            ctx.line_to(x as f64, eh);
                            ctx.stroke();
                        }
                        for y in 0..=ms.extent.height {
                            ctx.begin_path();
                            ctx.move_to(0.0, y as f64);
                            ctx.line_to(ew, y as f64);
                            ctx.stroke();
                        }
                    }
                    ctx.set_stroke_style_str("#58a6ff");
                    ctx.set_line_width(line_w * 2.0);
                    ctx.stroke_rect(0.0, 0.0, ew, eh);

                    // Landmarks and markers in screen space so dots and
                    // labels keep their size across zoom levels.
                    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
                    ctx.set_font("12px sans-serif");
                    for lm in &ms.landmarks {
                        let p = cam.world_to_screen(lm.pos);
                        ctx.set_fill_style_str("#d4af37");
                        ctx.begin_path();
                        ctx.arc(p.x, p.y, 4.0, 0.0, std::f64::consts::PI * 2.0).ok();
                        ctx.fill();
                        ctx.fill_text(&lm.name, p.x + 7.0, p.y + 4.0).ok();
                    }
                    for m in &ms.markers {
                        let p = cam.world_to_screen(m.pos);
                        ctx.set_fill_style_str("#f85149");
                        ctx.begin_path();
                        ctx.move_to(p.x, p.y);
                        ctx.line_to(p.x - 6.0, p.y - 14.0);
                        ctx.line_to(p.x + 6.0, p.y - 14.0);
                        ctx.close_path();
                        ctx.fill();
                    }

                    // HUD
                    ctx.set_fill_style_str("#8b949e");
                    let hud = if recognizer.borrow().is_interacting() {
                        format!("z={:.2}  •", cam.zoom)
                    } else {
                        format!("z={:.2}", cam.zoom)
                    };
                    ctx.fill_text(&hud, 10.0, h - 10.0).ok();
                })
            };
            *draw_ref_setup.borrow_mut() = Some(draw_closure.clone());
            (draw_closure)();

            // Touch listeners feed the tracker; the RAF loop consumes it.
            let canvas_pos = {
                let canvas = canvas.clone();
                move |t: &web_sys::Touch| {
                    let rect = canvas.get_bounding_client_rect();
                    ScreenPoint {
                        x: t.client_x() as f64 - rect.left(),
                        y: t.client_y() as f64 - rect.top(),
                    }
                }
            };
            let touch_start_cb = {
                let tracker = tracker.clone();
                let canvas_pos = canvas_pos.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let changed = e.changed_touches();
                    let now = now_secs();
                    for i in 0..changed.length() {
                        if let Some(t) = changed.item(i) {
                            tracker.borrow_mut().begin(t.identifier(), canvas_pos(&t), now);
                        }
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            let touch_move_cb = {
                let tracker = tracker.clone();
                let canvas_pos = canvas_pos.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let changed = e.changed_touches();
                    for i in 0..changed.length() {
                        if let Some(t) = changed.item(i) {
                            tracker.borrow_mut().moved(t.identifier(), canvas_pos(&t));
                        }
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            let touch_end_cb = {
                let tracker = tracker.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let changed = e.changed_touches();
                    for i in 0..changed.length() {
                        if let Some(t) = changed.item(i) {
                            tracker.borrow_mut().end(t.identifier());
                        }
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            let touch_cancel_cb = {
                let tracker = tracker.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let changed = e.changed_touches();
                    for i in 0..changed.length() {
                        if let Some(t) = changed.item(i) {
                            tracker.borrow_mut().cancel(t.identifier());
                        }
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                )
                .ok();
            canvas
                .add_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                )
                .ok();
            canvas
                .add_event_listener_with_callback("touchend", touch_end_cb.as_ref().unchecked_ref())
                .ok();
            canvas
                .add_event_listener_with_callback(
                    "touchcancel",
                    touch_cancel_cb.as_ref().unchecked_ref(),
                )
                .ok();

            let keydown_cb = {
                Closure::wrap(Box::new(move |e: KeyboardEvent| {
                    if e.code() == "KeyG" {
                        e.prevent_default();
                        on_toggle_grid.emit(());
                    }
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback("keydown", keydown_cb.as_ref().unchecked_ref())
                .ok();

            let resize_cb = {
                let compute_and_apply_canvas_size = compute_and_apply_canvas_size.clone();
                let draw_ref = draw_ref_setup.clone();
                Closure::wrap(Box::new(move |_e: web_sys::Event| {
                    compute_and_apply_canvas_size();
                    if let Some(f) = &*draw_ref.borrow() {
                        f();
                    }
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref())
                .ok();

            // RAF loop: snapshot -> recognize -> advance camera -> draw.
            let raf_id = Rc::new(RefCell::new(None));
            {
                let raf_id_clone = raf_id.clone();
                let draw_ref_loop = draw_ref_setup.clone();
                let window_loop = window.clone();
                let tracker = tracker.clone();
                let recognizer = recognizer.clone();
                let camera = camera.clone();
                let closure_cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>> =
                    Rc::new(RefCell::new(None));
                let closure_cell_clone = closure_cell.clone();
                *closure_cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                    let now = now_secs();
                    let dpi = window_loop.device_pixel_ratio().max(1.0);
                    let snapshot = tracker.borrow_mut().snapshot();
                    {
                        let mut cam = camera.borrow_mut();
                        recognizer.borrow_mut().update(&snapshot, now, dpi, &mut *cam);
                        cam.tick(now);
                    }
                    if let Some(f) = &*draw_ref_loop.borrow() {
                        f();
                    }
                    if let Ok(id) = window_loop.request_animation_frame(
                        closure_cell_clone
                            .borrow()
                            .as_ref()
                            .unwrap()
                            .as_ref()
                            .unchecked_ref(),
                    ) {
                        *raf_id_clone.borrow_mut() = Some(id);
                    }
                })
                    as Box<dyn FnMut()>));
                if let Ok(id) = window.request_animation_frame(
                    closure_cell
                        .borrow()
                        .as_ref()
                        .unwrap()
                        .as_ref()
                        .unchecked_ref(),
                ) {
                    *raf_id.borrow_mut() = Some(id);
                }
            }

            // Cleanup
            let window_clone = window.clone();
            move || {
                let _ = canvas.remove_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchend",
                    touch_end_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchcancel",
                    touch_cancel_cb.as_ref().unchecked_ref(),
                );
                let _ = window_clone.remove_event_listener_with_callback(
                    "keydown",
                    keydown_cb.as_ref().unchecked_ref(),
                );
                let _ = window_clone.remove_event_listener_with_callback(
                    "resize",
                    resize_cb.as_ref().unchecked_ref(),
                );
                if let Some(id) = *raf_id.borrow() {
                    let _ = window_clone.cancel_animation_frame(id);
                }
                let _keep_alive = (
                    &touch_start_cb,
                    &touch_move_cb,
                    &touch_end_cb,
                    &touch_cancel_cb,
                    &keydown_cb,
                    &resize_cb,
                );
            }
        });
    }

    let zoom_by = |delta: f64| {
        let camera = camera.clone();
        Callback::from(move |_| {
            let mut cam = camera.borrow_mut();
            let center = cam.center();
            let zoom = cam.zoom + delta;
            cam.set_scene(center, zoom, SceneAnimation::Linear, 150.0);
        })
    };
    let on_center = {
        let camera = camera.clone();
        Callback::from(move |_| {
            let mut cam = camera.borrow_mut();
            let mid = cam.world_midpoint();
            cam.set_scene(mid, 3.0, SceneAnimation::Linear, 300.0);
        })
    };
    let hide_help = {
        let show_help = show_help.clone();
        Callback::from(move |_| {
            if let Some(win) = web_sys::window() {
                if let Ok(Some(store)) = win.local_storage() {
                    let _ = store.set_item("ta_help_seen", "1");
                }
            }
            show_help.set(false);
        })
    };

    html! {
        <div style="position:relative; width:100%; height:100%;">
            <canvas ref={canvas_ref} style="display:block; touch-action:none;"></canvas>
            <StatusPanel
                marker_count={props.map_state.markers.len()}
                last_gesture={(*last_gesture).clone()}
                navigating={*navigating}
            />
            <ZoomControls
                on_zoom_in={zoom_by(1.0)}
                on_zoom_out={zoom_by(-1.0)}
                on_center={on_center}
            />
            <HelpOverlay show={*show_help} hide_help={hide_help} />
        </div>
    }
}
