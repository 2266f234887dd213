//! Multi-touch gesture recognition: pan, pinch-zoom, double-tap-zoom and
//! tap-and-hold, evaluated once per rendering frame from a touch snapshot.
//!
//! The recognizer owns no scene of its own; it talks to the camera through
//! the [`SurfaceRaycaster`] and [`MapViewport`] seams and reports discrete
//! gestures through per-event subscriber lists.

use crate::model::{Ray, SceneAnimation, ScreenPoint, SurfaceHit, WorldPoint};
use crate::state::touch::{TouchPhase, TouchSample};
use yew::Callback;

/// Screen-to-world hit testing.
pub trait SurfaceRaycaster {
    fn screen_point_to_ray(&self, p: ScreenPoint) -> Ray;
    /// None = the ray missed the map surface.
    fn raycast(&self, ray: Ray) -> Option<SurfaceHit>;
}

/// The mutable view the recognizer steers.
pub trait MapViewport {
    fn zoom_level(&self) -> f64;
    fn set_zoom_level(&mut self, zoom: f64);
    fn min_zoom_level(&self) -> f64;
    fn max_zoom_level(&self) -> f64;
    /// Recenter on `center` at `zoom`, optionally animated.
    fn set_scene(&mut self, center: WorldPoint, zoom: f64, kind: SceneAnimation, duration_ms: f64);
    /// Move the view so `target` sits where `ray` currently points.
    /// `damping` in [0, 1]; 0 pins exactly this frame.
    fn pan_and_zoom(&mut self, ray: Ray, target: WorldPoint, target_altitude_m: f64, damping: f64);
}

/// Tunable thresholds. Defaults give the stock map feel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Seconds a stationary finger must rest before tap-and-hold fires.
    pub tap_and_hold_secs: f64,
    /// Movement slop in logical pixels; multiplied by the DPI scale factor.
    pub movement_threshold_px: f64,
    /// Finger-spread growth (or shrink) ratio that confirms a pinch.
    pub pinch_start_ratio: f64,
    /// Zoom levels added by a double tap.
    pub double_tap_zoom_delta: f64,
    /// Duration of the double-tap recenter animation.
    pub double_tap_anim_ms: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_and_hold_secs: 1.0,
            movement_threshold_px: 5.0,
            pinch_start_ratio: 1.05,
            double_tap_zoom_delta: 1.0,
            double_tap_anim_ms: 150.0,
        }
    }
}

/// Recognizer memory carried between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractionState {
    /// True once a pan or pinch crossed its start threshold.
    pub is_interacting: bool,
    /// World anchor pinned under the fingers for the whole gesture.
    pub target_world: WorldPoint,
    pub target_altitude_m: f64,
    /// Touch count seen last frame; any change re-derives the anchor.
    pub last_touch_count: usize,
    /// Reference screen position at gesture start, for the movement slop.
    pub initial_touch_screen: ScreenPoint,
    /// Two-finger spread at the pinch baseline; 0.0 = no baseline yet.
    pub initial_finger_spread_px: f64,
    /// Viewport linear scale snapshotted with the baseline (2^(zoom - 1)).
    pub initial_scale_at_pinch_start: f64,
    /// When the current hold candidate began; None = not tracking.
    pub tap_hold_started_at: Option<f64>,
}

pub struct GestureRecognizer {
    pub config: GestureConfig,
    state: InteractionState,
    on_interaction_started: Vec<Callback<()>>,
    on_interaction_ended: Vec<Callback<()>>,
    on_double_tap: Vec<Callback<WorldPoint>>,
    on_tap_and_hold: Vec<Callback<WorldPoint>>,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: InteractionState::default(),
            on_interaction_started: Vec::new(),
            on_interaction_ended: Vec::new(),
            on_double_tap: Vec::new(),
            on_tap_and_hold: Vec::new(),
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_interacting(&self) -> bool {
        self.state.is_interacting
    }

    pub fn subscribe_interaction_started(&mut self, cb: Callback<()>) {
        self.on_interaction_started.push(cb);
    }

    pub fn subscribe_interaction_ended(&mut self, cb: Callback<()>) {
        self.on_interaction_ended.push(cb);
    }

    pub fn subscribe_double_tap(&mut self, cb: Callback<WorldPoint>) {
        self.on_double_tap.push(cb);
    }

    pub fn subscribe_tap_and_hold(&mut self, cb: Callback<WorldPoint>) {
        self.on_tap_and_hold.push(cb);
    }

    /// One call per rendering frame. With more than two fingers down the
    /// extra samples still count towards transitions, but only the first
    /// two shape the gesture.
    pub fn update<S>(&mut self, touches: &[TouchSample], now_secs: f64, dpi_scale: f64, scene: &mut S)
    where
        S: SurfaceRaycaster + MapViewport,
    {
        // Idle frame: wind everything down.
        if touches.is_empty() {
            if self.state.is_interacting {
                self.state.is_interacting = false;
                self.end_interaction();
            }
            self.state.initial_finger_spread_px = 0.0;
            self.state.last_touch_count = 0;
            self.state.tap_hold_started_at = None;
            return;
        }

        let move_slop_px = self.config.movement_threshold_px * dpi_scale;
        // The raw count drives transitions; only the first two samples
        // drive the reference point and spread.
        let touch_count = touches.len();
        let (reference, spread_px) = if touch_count >= 2 {
            (
                touches[0].screen.midpoint(&touches[1].screen),
                touches[0].screen.distance_to(&touches[1].screen),
            )
        } else {
            (touches[0].screen, 0.0)
        };

        if touch_count == 1 {
            let touch = &touches[0];
            // A single finger cannot pinch.
            self.state.initial_finger_spread_px = 0.0;

            // Double tap: zoom one level in around the tapped spot.
            if touch.phase == TouchPhase::Ended && touch.tap_count > 1 {
                if let Some(hit) = scene.raycast(scene.screen_point_to_ray(touch.screen)) {
                    let zoom = (scene.zoom_level() + self.config.double_tap_zoom_delta)
                        .clamp(scene.min_zoom_level(), scene.max_zoom_level());
                    // New level lands right away; the recenter animates.
                    scene.set_zoom_level(zoom);
                    scene.set_scene(
                        hit.location,
                        zoom,
                        SceneAnimation::Linear,
                        self.config.double_tap_anim_ms,
                    );
                    for cb in &self.on_double_tap {
                        cb.emit(hit.location);
                    }
                }
                self.state.tap_hold_started_at = None;
                // Force target re-acquisition on the next touch frame.
                self.state.last_touch_count = 0;
                return;
            }

            if self.state.is_interacting {
                // Mid-pan fingers never hold.
                self.state.tap_hold_started_at = None;
            } else {
                match touch.phase {
                    TouchPhase::Began => self.state.tap_hold_started_at = Some(now_secs),
                    TouchPhase::Ended | TouchPhase::Canceled => {
                        self.state.tap_hold_started_at = None
                    }
                    TouchPhase::Moved | TouchPhase::Stationary => {
                        if let Some(started_at) = self.state.tap_hold_started_at {
                            let moved = touch.screen.distance_to(&self.state.initial_touch_screen);
                            if moved <= move_slop_px
                                && now_secs - started_at >= self.config.tap_and_hold_secs
                            {
                                // A miss just suppresses the event this frame.
                                if let Some(hit) =
                                    scene.raycast(scene.screen_point_to_ray(touch.screen))
                                {
                                    for cb in &self.on_tap_and_hold {
                                        cb.emit(hit.location);
                                    }
                                    // At most once per hold.
                                    self.state.tap_hold_started_at = None;
                                }
                            }
                        }
                    }
                }
            }
        } else {
            // Pinches never hold.
            self.state.tap_hold_started_at = None;
        }

        if touch_count != self.state.last_touch_count {
            // Touch count changed: (re)acquire the world anchor under the
            // reference point. The old anchor is discarded either way.
            match scene.raycast(scene.screen_point_to_ray(reference)) {
                Some(hit) => {
                    self.state.target_world = hit.location;
                    self.state.target_altitude_m = hit.altitude_m;
                    self.state.initial_finger_spread_px = 0.0;
                    self.state.initial_touch_screen = reference;
                    self.state.last_touch_count = touch_count;
                }
                None => {
                    if self.state.is_interacting {
                        self.state.is_interacting = false;
                        self.end_interaction();
                        self.state.last_touch_count = 0;
                    }
                    // Otherwise leave last_touch_count alone so acquisition
                    // retries next frame.
                }
            }
            return;
        }

        // Steady state: same touch count as last frame, anchor acquired.
        if spread_px > 0.0 && self.state.initial_finger_spread_px == 0.0 {
            self.state.initial_finger_spread_px = spread_px;
            self.state.initial_scale_at_pinch_start = (scene.zoom_level() - 1.0).exp2();
        }
        let spread_ratio = (self.state.initial_finger_spread_px > 0.0)
            .then(|| spread_px / self.state.initial_finger_spread_px);

        if !self.state.is_interacting {
            let stretched =
                spread_ratio.is_some_and(|r| r.max(1.0 / r) > self.config.pinch_start_ratio);
            let moved =
                reference.distance_to(&self.state.initial_touch_screen) > move_slop_px;
            if stretched || moved {
                self.state.is_interacting = true;
                for cb in &self.on_interaction_started {
                    cb.emit(());
                }
            }
        }

        if self.state.is_interacting {
            // Zoom first so the pan below pins against the current-frame zoom.
            if let Some(ratio) = spread_ratio {
                let scale = ratio * self.state.initial_scale_at_pinch_start;
                let zoom =
                    (scale.log2() + 1.0).clamp(scene.min_zoom_level(), scene.max_zoom_level());
                scene.set_zoom_level(zoom);
            }
            let ray = scene.screen_point_to_ray(reference);
            scene.pan_and_zoom(ray, self.state.target_world, self.state.target_altitude_m, 0.0);
        }
    }

    fn end_interaction(&self) {
        for cb in &self.on_interaction_ended {
            cb.emit(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Flat test scene: world = screen / 10, hits unless `miss` is set.
    struct Scene {
        zoom: f64,
        min: f64,
        max: f64,
        miss: bool,
        zoom_writes: Vec<f64>,
        scene_calls: Vec<(WorldPoint, f64, SceneAnimation, f64)>,
        pan_calls: Vec<(Ray, WorldPoint, f64, f64)>,
    }

    impl Scene {
        fn new(zoom: f64) -> Self {
            Self {
                zoom,
                min: 1.0,
                max: 10.0,
                miss: false,
                zoom_writes: Vec::new(),
                scene_calls: Vec::new(),
                pan_calls: Vec::new(),
            }
        }
    }

    impl SurfaceRaycaster for Scene {
        fn screen_point_to_ray(&self, p: ScreenPoint) -> Ray {
            Ray {
                plane: WorldPoint {
                    x: p.x * 0.1,
                    y: p.y * 0.1,
                },
            }
        }

        fn raycast(&self, ray: Ray) -> Option<SurfaceHit> {
            (!self.miss).then_some(SurfaceHit {
                location: ray.plane,
                altitude_m: 12.5,
            })
        }
    }

    impl MapViewport for Scene {
        fn zoom_level(&self) -> f64 {
            self.zoom
        }

        fn set_zoom_level(&mut self, zoom: f64) {
            self.zoom = zoom;
            self.zoom_writes.push(zoom);
        }

        fn min_zoom_level(&self) -> f64 {
            self.min
        }

        fn max_zoom_level(&self) -> f64 {
            self.max
        }

        fn set_scene(&mut self, center: WorldPoint, zoom: f64, kind: SceneAnimation, ms: f64) {
            self.zoom = zoom;
            self.scene_calls.push((center, zoom, kind, ms));
        }

        fn pan_and_zoom(&mut self, ray: Ray, target: WorldPoint, alt: f64, damping: f64) {
            self.pan_calls.push((ray, target, alt, damping));
        }
    }

    fn touch(x: f64, y: f64, phase: TouchPhase, tap_count: u32) -> TouchSample {
        TouchSample {
            id: 0,
            screen: ScreenPoint { x, y },
            phase,
            tap_count,
        }
    }

    fn touch2(x: f64, y: f64, phase: TouchPhase) -> TouchSample {
        TouchSample {
            id: 1,
            screen: ScreenPoint { x, y },
            phase,
            tap_count: 1,
        }
    }

    fn touch3(x: f64, y: f64, phase: TouchPhase) -> TouchSample {
        TouchSample {
            id: 2,
            screen: ScreenPoint { x, y },
            phase,
            tap_count: 1,
        }
    }

    fn recognizer_with_log(
        log: &Rc<RefCell<Vec<&'static str>>>,
    ) -> GestureRecognizer {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let l = log.clone();
        rec.subscribe_interaction_started(Callback::from(move |_| l.borrow_mut().push("started")));
        let l = log.clone();
        rec.subscribe_interaction_ended(Callback::from(move |_| l.borrow_mut().push("ended")));
        rec
    }

    #[test]
    fn stationary_hold_fires_exactly_once() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let holds = Rc::new(RefCell::new(Vec::new()));
        let h = holds.clone();
        rec.subscribe_tap_and_hold(Callback::from(move |loc| h.borrow_mut().push(loc)));
        let mut scene = Scene::new(4.0);

        rec.update(&[touch(100.0, 100.0, TouchPhase::Began, 1)], 0.0, 1.0, &mut scene);
        let mut t = 0.1;
        while t < 0.95 {
            rec.update(&[touch(100.0, 100.0, TouchPhase::Stationary, 1)], t, 1.0, &mut scene);
            t += 0.1;
        }
        assert!(holds.borrow().is_empty());

        rec.update(&[touch(100.0, 100.0, TouchPhase::Stationary, 1)], 1.0, 1.0, &mut scene);
        assert_eq!(holds.borrow().len(), 1);
        assert_eq!(holds.borrow()[0], WorldPoint { x: 10.0, y: 10.0 });

        // Still stationary: no second event.
        rec.update(&[touch(100.0, 100.0, TouchPhase::Stationary, 1)], 2.0, 1.0, &mut scene);
        assert_eq!(holds.borrow().len(), 1);
    }

    #[test]
    fn hold_miss_suppresses_the_frame_then_retries() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let holds = Rc::new(RefCell::new(Vec::new()));
        let h = holds.clone();
        rec.subscribe_tap_and_hold(Callback::from(move |loc| h.borrow_mut().push(loc)));
        let mut scene = Scene::new(4.0);

        rec.update(&[touch(50.0, 50.0, TouchPhase::Began, 1)], 0.0, 1.0, &mut scene);
        rec.update(&[touch(50.0, 50.0, TouchPhase::Stationary, 1)], 0.5, 1.0, &mut scene);

        // Surface misses at fire time: suppressed, but the hold stays armed.
        scene.miss = true;
        rec.update(&[touch(50.0, 50.0, TouchPhase::Stationary, 1)], 1.2, 1.0, &mut scene);
        assert!(holds.borrow().is_empty());

        scene.miss = false;
        rec.update(&[touch(50.0, 50.0, TouchPhase::Stationary, 1)], 1.3, 1.0, &mut scene);
        assert_eq!(holds.borrow().len(), 1);
    }

    #[test]
    fn hold_does_not_fire_mid_pan() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let holds = Rc::new(RefCell::new(Vec::new()));
        let h = holds.clone();
        rec.subscribe_tap_and_hold(Callback::from(move |loc| h.borrow_mut().push(loc)));
        let mut scene = Scene::new(4.0);

        rec.update(&[touch(100.0, 100.0, TouchPhase::Began, 1)], 0.0, 1.0, &mut scene);
        rec.update(&[touch(130.0, 100.0, TouchPhase::Moved, 1)], 0.1, 1.0, &mut scene);
        assert!(rec.is_interacting());
        rec.update(&[touch(130.0, 100.0, TouchPhase::Stationary, 1)], 1.5, 1.0, &mut scene);
        assert!(holds.borrow().is_empty());
    }

    #[test]
    fn double_tap_recenters_and_zooms_one_level() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let taps = Rc::new(RefCell::new(Vec::new()));
        let t = taps.clone();
        rec.subscribe_double_tap(Callback::from(move |loc| t.borrow_mut().push(loc)));
        let mut scene = Scene::new(5.0);

        rec.update(&[touch(80.0, 40.0, TouchPhase::Ended, 2)], 0.0, 1.0, &mut scene);

        assert_eq!(taps.borrow().len(), 1);
        assert_eq!(taps.borrow()[0], WorldPoint { x: 8.0, y: 4.0 });
        assert_eq!(scene.scene_calls.len(), 1);
        let (center, zoom, kind, ms) = scene.scene_calls[0];
        assert_eq!(center, WorldPoint { x: 8.0, y: 4.0 });
        assert_eq!(zoom, 6.0);
        assert_eq!(kind, SceneAnimation::Linear);
        assert_eq!(ms, 150.0);
        // The level itself is written directly, before the recenter.
        assert_eq!(scene.zoom_writes, vec![6.0]);
        assert_eq!(rec.state().last_touch_count, 0);
        assert!(rec.state().tap_hold_started_at.is_none());
    }

    #[test]
    fn double_tap_zoom_is_clamped_to_max() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let mut scene = Scene::new(9.6);
        rec.update(&[touch(80.0, 40.0, TouchPhase::Ended, 3)], 0.0, 1.0, &mut scene);
        assert_eq!(scene.zoom_writes, vec![10.0]);
        assert_eq!(scene.scene_calls[0].1, 10.0);
    }

    #[test]
    fn double_tap_over_a_miss_does_nothing() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let taps = Rc::new(RefCell::new(Vec::new()));
        let t = taps.clone();
        rec.subscribe_double_tap(Callback::from(move |loc| t.borrow_mut().push(loc)));
        let mut scene = Scene::new(5.0);
        scene.miss = true;
        rec.update(&[touch(80.0, 40.0, TouchPhase::Ended, 2)], 0.0, 1.0, &mut scene);
        assert!(taps.borrow().is_empty());
        assert!(scene.scene_calls.is_empty());
    }

    #[test]
    fn interaction_ended_fires_once_across_idle_frames() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(4.0);

        rec.update(&[touch(100.0, 100.0, TouchPhase::Began, 1)], 0.0, 1.0, &mut scene);
        rec.update(&[touch(140.0, 100.0, TouchPhase::Moved, 1)], 0.1, 1.0, &mut scene);
        assert_eq!(*log.borrow(), vec!["started"]);

        rec.update(&[], 0.2, 1.0, &mut scene);
        rec.update(&[], 0.3, 1.0, &mut scene);
        rec.update(&[], 0.4, 1.0, &mut scene);
        assert_eq!(*log.borrow(), vec!["started", "ended"]);
    }

    #[test]
    fn movement_threshold_is_strict() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(4.0);
        let dpi = 2.0; // slop = 10 px

        rec.update(&[touch(100.0, 100.0, TouchPhase::Began, 1)], 0.0, dpi, &mut scene);
        rec.update(&[touch(110.0, 100.0, TouchPhase::Moved, 1)], 0.1, dpi, &mut scene);
        assert!(!rec.is_interacting());
        assert!(scene.pan_calls.is_empty());

        rec.update(&[touch(110.0001, 100.0, TouchPhase::Moved, 1)], 0.2, dpi, &mut scene);
        assert!(rec.is_interacting());
        assert_eq!(*log.borrow(), vec!["started"]);
        assert_eq!(scene.pan_calls.len(), 1);
        let (_, target, alt, damping) = scene.pan_calls[0];
        assert_eq!(target, WorldPoint { x: 10.0, y: 10.0 });
        assert_eq!(alt, 12.5);
        assert_eq!(damping, 0.0);
    }

    #[test]
    fn spread_ratio_two_adds_one_zoom_level() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(5.0);

        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Began, 1),
                touch2(200.0, 100.0, TouchPhase::Began),
            ],
            0.0,
            1.0,
            &mut scene,
        );
        // Baseline frame: spread 100 px, viewport scale snapshot 2^(5-1).
        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Stationary, 1),
                touch2(200.0, 100.0, TouchPhase::Stationary),
            ],
            0.1,
            1.0,
            &mut scene,
        );
        assert!(!rec.is_interacting());
        assert_eq!(rec.state().initial_finger_spread_px, 100.0);
        assert_eq!(rec.state().initial_scale_at_pinch_start, 16.0);

        // Symmetric spread to 200 px: midpoint unchanged, ratio 2.0.
        rec.update(
            &[
                touch(50.0, 100.0, TouchPhase::Moved, 1),
                touch2(250.0, 100.0, TouchPhase::Moved),
            ],
            0.2,
            1.0,
            &mut scene,
        );
        assert_eq!(*log.borrow(), vec!["started"]);
        assert_eq!(scene.zoom, 6.0);
        assert_eq!(scene.pan_calls.len(), 1);
        // Anchor acquired at the two-finger midpoint on the transition frame.
        assert_eq!(scene.pan_calls[0].1, WorldPoint { x: 15.0, y: 10.0 });
    }

    #[test]
    fn pinch_in_starts_interaction_too() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(5.0);

        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Began, 1),
                touch2(300.0, 100.0, TouchPhase::Began),
            ],
            0.0,
            1.0,
            &mut scene,
        );
        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Stationary, 1),
                touch2(300.0, 100.0, TouchPhase::Stationary),
            ],
            0.1,
            1.0,
            &mut scene,
        );
        // Shrink to 80% of the baseline: starts and zooms out.
        rec.update(
            &[
                touch(120.0, 100.0, TouchPhase::Moved, 1),
                touch2(280.0, 100.0, TouchPhase::Moved),
            ],
            0.2,
            1.0,
            &mut scene,
        );
        assert_eq!(*log.borrow(), vec!["started"]);
        assert!(scene.zoom < 5.0);
    }

    #[test]
    fn jitter_below_both_thresholds_never_starts() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(5.0);

        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Began, 1),
                touch2(200.0, 100.0, TouchPhase::Began),
            ],
            0.0,
            1.0,
            &mut scene,
        );
        for i in 1..20 {
            let wiggle = if i % 2 == 0 { 1.0 } else { -1.0 };
            rec.update(
                &[
                    touch(100.0 - wiggle, 100.0, TouchPhase::Moved, 1),
                    touch2(200.0 + wiggle, 100.0, TouchPhase::Moved),
                ],
                i as f64 * 0.016,
                1.0,
                &mut scene,
            );
        }
        assert!(!rec.is_interacting());
        assert!(log.borrow().is_empty());
        assert!(scene.zoom_writes.is_empty());
        assert!(scene.pan_calls.is_empty());
    }

    #[test]
    fn zoom_writes_stay_clamped_for_extreme_ratios() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(5.0);

        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Began, 1),
                touch2(200.0, 100.0, TouchPhase::Began),
            ],
            0.0,
            1.0,
            &mut scene,
        );
        let spreads = [100.0, 5000.0, 20000.0, 40.0, 2.0, 100.0];
        for (i, spread) in spreads.iter().enumerate() {
            let half = spread * 0.5;
            rec.update(
                &[
                    touch(150.0 - half, 100.0, TouchPhase::Moved, 1),
                    touch2(150.0 + half, 100.0, TouchPhase::Moved),
                ],
                0.1 + i as f64 * 0.1,
                1.0,
                &mut scene,
            );
        }
        assert!(!scene.zoom_writes.is_empty());
        for z in &scene.zoom_writes {
            assert!(*z >= scene.min && *z <= scene.max, "zoom {z} out of bounds");
        }
    }

    #[test]
    fn adding_a_finger_mid_pan_reacquires_the_anchor() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(5.0);

        rec.update(&[touch(100.0, 100.0, TouchPhase::Began, 1)], 0.0, 1.0, &mut scene);
        rec.update(&[touch(140.0, 100.0, TouchPhase::Moved, 1)], 0.1, 1.0, &mut scene);
        assert!(rec.is_interacting());
        assert_eq!(rec.state().target_world, WorldPoint { x: 10.0, y: 10.0 });

        // Second finger lands: fresh raycast from the new midpoint.
        rec.update(
            &[
                touch(140.0, 100.0, TouchPhase::Stationary, 1),
                touch2(240.0, 200.0, TouchPhase::Began),
            ],
            0.2,
            1.0,
            &mut scene,
        );
        assert!(rec.is_interacting());
        assert_eq!(rec.state().target_world, WorldPoint { x: 19.0, y: 15.0 });
        assert_eq!(rec.state().initial_finger_spread_px, 0.0);
        assert_eq!(rec.state().last_touch_count, 2);
        assert_eq!(*log.borrow(), vec!["started"]);
    }

    #[test]
    fn lifting_from_three_to_two_fingers_reacquires_the_anchor() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(5.0);

        // Three fingers down; the first two form the reference midpoint.
        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Began, 1),
                touch2(200.0, 100.0, TouchPhase::Began),
                touch3(600.0, 100.0, TouchPhase::Began),
            ],
            0.0,
            1.0,
            &mut scene,
        );
        assert_eq!(rec.state().last_touch_count, 3);
        assert_eq!(rec.state().target_world, WorldPoint { x: 15.0, y: 10.0 });
        rec.update(
            &[
                touch(100.0, 100.0, TouchPhase::Stationary, 1),
                touch2(200.0, 100.0, TouchPhase::Stationary),
                touch3(600.0, 100.0, TouchPhase::Stationary),
            ],
            0.1,
            1.0,
            &mut scene,
        );
        rec.update(
            &[
                touch(110.0, 110.0, TouchPhase::Moved, 1),
                touch2(210.0, 110.0, TouchPhase::Moved),
                touch3(610.0, 110.0, TouchPhase::Moved),
            ],
            0.2,
            1.0,
            &mut scene,
        );
        assert!(rec.is_interacting());

        // The first finger lifts: the survivors' midpoint moves a long way,
        // so the anchor and the pinch baseline must be re-derived.
        rec.update(
            &[
                touch2(210.0, 110.0, TouchPhase::Stationary),
                touch3(610.0, 110.0, TouchPhase::Stationary),
            ],
            0.3,
            1.0,
            &mut scene,
        );
        assert!(rec.is_interacting());
        assert_eq!(rec.state().last_touch_count, 2);
        assert_eq!(rec.state().target_world, WorldPoint { x: 41.0, y: 11.0 });
        assert_eq!(rec.state().initial_finger_spread_px, 0.0);

        // Next frame pans against the fresh anchor, not the stale one.
        rec.update(
            &[
                touch2(210.0, 110.0, TouchPhase::Stationary),
                touch3(610.0, 110.0, TouchPhase::Stationary),
            ],
            0.4,
            1.0,
            &mut scene,
        );
        let (ray, target, _, _) = *scene.pan_calls.last().unwrap();
        assert_eq!(target, WorldPoint { x: 41.0, y: 11.0 });
        assert_eq!(ray.plane, WorldPoint { x: 41.0, y: 11.0 });
        assert_eq!(*log.borrow(), vec!["started"]);
    }

    #[test]
    fn raycast_miss_on_transition_ends_the_interaction() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recognizer_with_log(&log);
        let mut scene = Scene::new(5.0);

        rec.update(&[touch(100.0, 100.0, TouchPhase::Began, 1)], 0.0, 1.0, &mut scene);
        rec.update(&[touch(140.0, 100.0, TouchPhase::Moved, 1)], 0.1, 1.0, &mut scene);
        assert!(rec.is_interacting());

        scene.miss = true;
        rec.update(
            &[
                touch(140.0, 100.0, TouchPhase::Stationary, 1),
                touch2(240.0, 200.0, TouchPhase::Began),
            ],
            0.2,
            1.0,
            &mut scene,
        );
        assert!(!rec.is_interacting());
        assert_eq!(rec.state().last_touch_count, 0);
        assert_eq!(*log.borrow(), vec!["started", "ended"]);
    }

    #[test]
    fn subscribers_run_in_subscription_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let o = order.clone();
        rec.subscribe_interaction_started(Callback::from(move |_| o.borrow_mut().push(1)));
        let o = order.clone();
        rec.subscribe_interaction_started(Callback::from(move |_| o.borrow_mut().push(2)));
        let mut scene = Scene::new(4.0);

        rec.update(&[touch(100.0, 100.0, TouchPhase::Began, 1)], 0.0, 1.0, &mut scene);
        rec.update(&[touch(140.0, 100.0, TouchPhase::Moved, 1)], 0.1, 1.0, &mut scene);
        assert_eq!(*order.borrow(), vec![1, 2]);
    }
}
