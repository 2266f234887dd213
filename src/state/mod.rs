pub mod camera;
pub mod gesture;
pub mod touch;

pub use camera::MapCamera;
pub use gesture::{GestureConfig, GestureRecognizer, MapViewport, SurfaceRaycaster};
pub use touch::{TouchPhase, TouchSample, TouchTracker};
