//! Per-pointer touch tracking: turns DOM touch events into the per-frame
//! snapshots the gesture recognizer consumes. DOM touches carry no phase or
//! tap count, so both are synthesized here.

use crate::model::ScreenPoint;

/// Lifecycle of one finger within a frame snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Canceled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchSample {
    pub id: i32,
    pub screen: ScreenPoint,
    pub phase: TouchPhase,
    /// 1 for a lone tap, 2+ for quick repeat taps at the same spot.
    pub tap_count: u32,
}

/// Max gap between two taps that still counts as a repeat.
const TAP_REPEAT_WINDOW_SECS: f64 = 0.35;
/// Max distance between two taps that still counts as a repeat.
const TAP_REPEAT_RADIUS_PX: f64 = 40.0;

#[derive(Clone, Copy, Debug)]
struct TapMemory {
    at: f64,
    pos: ScreenPoint,
    count: u32,
}

#[derive(Clone, Copy, Debug)]
struct PointerSlot {
    id: i32,
    pos: ScreenPoint,
    /// Position reported in the previous snapshot; None before the first.
    reported: Option<ScreenPoint>,
    tap_count: u32,
    /// Ended/Canceled pending delivery in exactly one more snapshot.
    done: Option<TouchPhase>,
    order: u64,
}

#[derive(Debug, Default)]
pub struct TouchTracker {
    slots: Vec<PointerSlot>,
    next_order: u64,
    last_tap: Option<TapMemory>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, id: i32, pos: ScreenPoint, now_secs: f64) {
        if self.slots.iter().any(|s| s.id == id) {
            return;
        }
        let count = match self.last_tap {
            Some(t)
                if now_secs - t.at <= TAP_REPEAT_WINDOW_SECS
                    && pos.distance_to(&t.pos) <= TAP_REPEAT_RADIUS_PX =>
            {
                t.count + 1
            }
            _ => 1,
        };
        self.last_tap = Some(TapMemory {
            at: now_secs,
            pos,
            count,
        });
        self.slots.push(PointerSlot {
            id,
            pos,
            reported: None,
            tap_count: count,
            done: None,
            order: self.next_order,
        });
        self.next_order += 1;
    }

    pub fn moved(&mut self, id: i32, pos: ScreenPoint) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id && s.done.is_none()) {
            slot.pos = pos;
        }
    }

    pub fn end(&mut self, id: i32) {
        self.finish(id, TouchPhase::Ended);
    }

    pub fn cancel(&mut self, id: i32) {
        self.finish(id, TouchPhase::Canceled);
    }

    fn finish(&mut self, id: i32, phase: TouchPhase) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id && s.done.is_none()) {
            slot.done = Some(phase);
        }
    }

    /// One call per rendering frame. Ended/Canceled pointers appear in the
    /// returned snapshot once and are dropped afterwards.
    pub fn snapshot(&mut self) -> Vec<TouchSample> {
        self.slots.sort_by_key(|s| s.order);
        let samples = self
            .slots
            .iter_mut()
            .map(|slot| {
                let phase = match (slot.done, slot.reported) {
                    (Some(done), _) => done,
                    (None, None) => TouchPhase::Began,
                    (None, Some(prev)) if prev != slot.pos => TouchPhase::Moved,
                    (None, Some(_)) => TouchPhase::Stationary,
                };
                slot.reported = Some(slot.pos);
                TouchSample {
                    id: slot.id,
                    screen: slot.pos,
                    phase,
                    tap_count: slot.tap_count,
                }
            })
            .collect();
        self.slots.retain(|s| s.done.is_none());
        samples
    }
}
