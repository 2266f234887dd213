//! Core data models for the touch atlas: geometry shared by the camera and
//! the gesture recognizer, plus the map document (landmarks and user markers).

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use yew::Reducible;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn distance_to(&self, other: &ScreenPoint) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &ScreenPoint) -> ScreenPoint {
        ScreenPoint {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

/// Vertical ray through the world plane. The camera is top-down orthographic,
/// so a ray is fully described by the plane point it passes through.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ray {
    pub plane: WorldPoint,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub location: WorldPoint,
    pub altitude_m: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneAnimation {
    Jump,
    Linear,
}

/// Deterministic terrain height so raycast hits carry a real altitude.
pub fn surface_altitude_m(x: f64, y: f64) -> f64 {
    40.0 * (x * 0.11).sin() * (y * 0.07).cos() + 60.0 * (x * 0.023).cos() * (y * 0.031).sin()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapExtent {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub pos: WorldPoint,
    pub name: String,
}

/// User-placed marker (dropped by tap-and-hold).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub pos: WorldPoint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapState {
    pub extent: MapExtent,
    pub landmarks: Vec<Landmark>,
    pub markers: Vec<Marker>,
    /// Bumped on every reducer change so effects can depend on it.
    pub version: u64,
}

impl MapState {
    pub fn new_basic(extent: MapExtent) -> Self {
        // Deterministic landmark spread (no RNG so tests stay host-runnable).
        let names = [
            "Aster Ridge",
            "Basalt Gate",
            "Cinder Flats",
            "Drift Hollow",
            "Ember Shoals",
            "Fallow Spire",
            "Gale Steppe",
            "Haven Cross",
        ];
        let w = extent.width as f64;
        let h = extent.height as f64;
        let landmarks = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let fx = ((i * 37 + 11) % 89) as f64 / 89.0;
                let fy = ((i * 53 + 29) % 97) as f64 / 97.0;
                Landmark {
                    pos: WorldPoint {
                        x: (0.1 + 0.8 * fx) * w,
                        y: (0.1 + 0.8 * fy) * h,
                    },
                    name: (*name).to_string(),
                }
            })
            .collect();
        Self {
            extent,
            landmarks,
            markers: Vec::new(),
            version: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub enum MapAction {
    PlaceMarker { pos: WorldPoint },
    ClearMarkers,
    /// Replace markers wholesale (used when restoring persisted state).
    SetMarkers { markers: Vec<Marker> },
}

impl Reducible for MapState {
    type Action = MapAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut new = (*self).clone();
        match action {
            MapAction::PlaceMarker { pos } => {
                new.markers.push(Marker { pos });
            }
            MapAction::ClearMarkers => {
                if new.markers.is_empty() {
                    return self;
                }
                new.markers.clear();
            }
            MapAction::SetMarkers { markers } => {
                new.markers = markers;
            }
        }
        new.version = new.version.wrapping_add(1);
        Rc::new(new)
    }
}
