//! Top-down map camera: world/screen transform, surface raycasting against
//! the world extent, and animated scene transitions.

use crate::model::{
    surface_altitude_m, MapExtent, Ray, SceneAnimation, ScreenPoint, SurfaceHit, WorldPoint,
};
use crate::state::gesture::{MapViewport, SurfaceRaycaster};

/// Pixels per world unit at zoom level 1.
pub const TILE_PX: f64 = 32.0;

#[derive(Clone, Copy, Debug)]
struct SceneTransition {
    from_center: WorldPoint,
    to_center: WorldPoint,
    from_zoom: f64,
    to_zoom: f64,
    started_at: f64,
    duration_secs: f64,
}

#[derive(Clone, Debug)]
pub struct MapCamera {
    pub extent: MapExtent,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    viewport_w: f64,
    viewport_h: f64,
    transition: Option<SceneTransition>,
    /// Last tick time; timestamps transitions started between ticks.
    now_secs: f64,
}

impl MapCamera {
    pub fn new(extent: MapExtent) -> Self {
        let mut cam = Self {
            extent,
            zoom: 3.0,
            min_zoom: 1.0,
            max_zoom: 8.0,
            offset_x: 0.0,
            offset_y: 0.0,
            viewport_w: 800.0,
            viewport_h: 600.0,
            transition: None,
            now_secs: 0.0,
        };
        cam.center_on(WorldPoint {
            x: extent.width as f64 * 0.5,
            y: extent.height as f64 * 0.5,
        });
        cam
    }

    /// Linear map scale in pixels per world unit.
    pub fn scale_px(&self) -> f64 {
        TILE_PX * (self.zoom - 1.0).exp2()
    }

    pub fn set_viewport_size(&mut self, w: f64, h: f64) {
        let center = self.center();
        self.viewport_w = w.max(1.0);
        self.viewport_h = h.max(1.0);
        self.center_on(center);
    }

    pub fn screen_to_world(&self, p: ScreenPoint) -> WorldPoint {
        let s = self.scale_px();
        WorldPoint {
            x: (p.x - self.offset_x) / s,
            y: (p.y - self.offset_y) / s,
        }
    }

    pub fn world_to_screen(&self, w: WorldPoint) -> ScreenPoint {
        let s = self.scale_px();
        ScreenPoint {
            x: w.x * s + self.offset_x,
            y: w.y * s + self.offset_y,
        }
    }

    pub fn center(&self) -> WorldPoint {
        self.screen_to_world(ScreenPoint {
            x: self.viewport_w * 0.5,
            y: self.viewport_h * 0.5,
        })
    }

    pub fn center_on(&mut self, c: WorldPoint) {
        let s = self.scale_px();
        self.offset_x = self.viewport_w * 0.5 - c.x * s;
        self.offset_y = self.viewport_h * 0.5 - c.y * s;
    }

    pub fn world_midpoint(&self) -> WorldPoint {
        WorldPoint {
            x: self.extent.width as f64 * 0.5,
            y: self.extent.height as f64 * 0.5,
        }
    }

    /// Advance time and any active scene transition. Call once per frame.
    pub fn tick(&mut self, now_secs: f64) {
        self.now_secs = now_secs;
        if let Some(t) = self.transition {
            let k = if t.duration_secs > 0.0 {
                ((now_secs - t.started_at) / t.duration_secs).clamp(0.0, 1.0)
            } else {
                1.0
            };
            self.zoom = t.from_zoom + (t.to_zoom - t.from_zoom) * k;
            self.center_on(WorldPoint {
                x: t.from_center.x + (t.to_center.x - t.from_center.x) * k,
                y: t.from_center.y + (t.to_center.y - t.from_center.y) * k,
            });
            if k >= 1.0 {
                self.transition = None;
            }
        }
    }
}

impl SurfaceRaycaster for MapCamera {
    fn screen_point_to_ray(&self, p: ScreenPoint) -> Ray {
        Ray {
            plane: self.screen_to_world(p),
        }
    }

    fn raycast(&self, ray: Ray) -> Option<SurfaceHit> {
        let p = ray.plane;
        let inside = p.x >= 0.0
            && p.y >= 0.0
            && p.x <= self.extent.width as f64
            && p.y <= self.extent.height as f64;
        inside.then_some(SurfaceHit {
            location: p,
            altitude_m: surface_altitude_m(p.x, p.y),
        })
    }
}

impl MapViewport for MapCamera {
    fn zoom_level(&self) -> f64 {
        self.zoom
    }

    fn set_zoom_level(&mut self, zoom: f64) {
        // Direct steering always wins over a running transition.
        self.transition = None;
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    fn min_zoom_level(&self) -> f64 {
        self.min_zoom
    }

    fn max_zoom_level(&self) -> f64 {
        self.max_zoom
    }

    fn set_scene(&mut self, center: WorldPoint, zoom: f64, kind: SceneAnimation, duration_ms: f64) {
        let zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        match kind {
            SceneAnimation::Jump => {
                self.transition = None;
                self.zoom = zoom;
                self.center_on(center);
            }
            SceneAnimation::Linear => {
                self.transition = Some(SceneTransition {
                    from_center: self.center(),
                    to_center: center,
                    from_zoom: self.zoom,
                    to_zoom: zoom,
                    started_at: self.now_secs,
                    duration_secs: (duration_ms / 1000.0).max(0.0),
                });
            }
        }
    }

    fn pan_and_zoom(&mut self, ray: Ray, target: WorldPoint, _target_altitude_m: f64, damping: f64) {
        self.transition = None;
        let s = self.scale_px();
        let desired_x = self.offset_x + (ray.plane.x - target.x) * s;
        let desired_y = self.offset_y + (ray.plane.y - target.y) * s;
        let d = damping.clamp(0.0, 1.0);
        self.offset_x = desired_x * (1.0 - d) + self.offset_x * d;
        self.offset_y = desired_y * (1.0 - d) + self.offset_y * d;
    }
}
