// Small shared helpers.

use crate::model::WorldPoint;
use wasm_bindgen::JsValue;

pub fn clog(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

pub fn format_world(p: &WorldPoint) -> String {
    format!("({:.1}, {:.1})", p.x, p.y)
}
