//! Pointer stream classification for service nodes.
//!
//! ```text
//! Idle --down--> Pressed --up--> Click            (+ DragEnd on a node)
//!                Pressed --move > threshold--> Dragging --up--> DragEnd
//!                Pressed --long press timer--> RelationBuildStart
//! ```
//!
//! The long-press timer is a scheduled transition: it is checked against
//! the timestamp of every incoming event and by [`GestureMachine::tick`],
//! and dropped by a release or by a drag start.

use std::time::{Duration, Instant};

use eframe::egui::{Pos2, Vec2};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { pos: Pos2, at: Instant },
    Move { pos: Pos2, at: Instant },
    Up { pos: Pos2, at: Instant },
    /// Click synthesized by the platform after a release.
    Click { pos: Pos2 },
    DoubleClick { pos: Pos2 },
}

/// What the pointer is over when a gesture starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HitTarget {
    pub service_id: String,
    pub pending: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Press { service_id: Option<String> },
    /// `service_id` is `None` for a click on the empty canvas.
    Click { service_id: Option<String>, pos: Pos2 },
    DoubleClick { service_id: String },
    DragStart { service_id: String },
    /// Screen-space movement since the previous drag event.
    Drag { service_id: String, delta: Vec2 },
    DragEnd { service_id: String },
    Pan { delta: Vec2 },
    RelationBuildStart { service_id: String },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureTuning {
    pub long_press_delay: Duration,
    pub long_press_tolerance: f32,
    pub drag_threshold: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LongPressTimer {
    deadline: Instant,
}

#[derive(Clone, Debug, PartialEq)]
enum GestureState {
    Idle,
    Pressed {
        target: Option<String>,
        origin: Pos2,
        last: Pos2,
        long_press: Option<LongPressTimer>,
    },
    Dragging {
        target: Option<String>,
        last: Pos2,
    },
}

#[derive(Debug)]
pub struct GestureMachine {
    tuning: GestureTuning,
    state: GestureState,
}

impl GestureMachine {
    pub fn new(tuning: GestureTuning) -> Self {
        Self {
            tuning,
            state: GestureState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// When the pending long press fires, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            GestureState::Pressed {
                long_press: Some(timer),
                ..
            } => Some(timer.deadline),
            _ => None,
        }
    }

    pub fn cancel_long_press(&mut self) {
        if let GestureState::Pressed { long_press, .. } = &mut self.state
            && long_press.take().is_some()
        {
            debug!("long press cancelled");
        }
    }

    /// Drop a press or drag on a service that no longer exists.
    pub fn forget(&mut self, service_id: &str) {
        let tracked = match &self.state {
            GestureState::Pressed { target, .. } | GestureState::Dragging { target, .. } => {
                target.as_deref() == Some(service_id)
            }
            GestureState::Idle => false,
        };
        if tracked {
            self.state = GestureState::Idle;
        }
    }

    pub fn tick(&mut self, now: Instant) -> Vec<Gesture> {
        let mut gestures = Vec::new();
        self.fire_due_long_press(now, &mut gestures);
        gestures
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        hit: impl Fn(Pos2) -> Option<HitTarget>,
    ) -> Vec<Gesture> {
        let mut gestures = Vec::new();

        match event {
            PointerEvent::Down { pos, at } => {
                let target = hit(pos);
                let long_press = target
                    .as_ref()
                    .filter(|target| !target.pending)
                    .map(|_| LongPressTimer {
                        deadline: at + self.tuning.long_press_delay,
                    });
                let service_id = target.map(|target| target.service_id);

                gestures.push(Gesture::Press {
                    service_id: service_id.clone(),
                });
                self.state = GestureState::Pressed {
                    target: service_id,
                    origin: pos,
                    last: pos,
                    long_press,
                };
            }
            PointerEvent::Move { pos, at } => {
                self.fire_due_long_press(at, &mut gestures);
                self.pointer_moved(pos, &mut gestures);
            }
            PointerEvent::Up { pos, at } => {
                self.fire_due_long_press(at, &mut gestures);
                self.pointer_released(pos, &mut gestures);
            }
            PointerEvent::Click { pos } => {
                gestures.push(Gesture::Click {
                    service_id: hit(pos).map(|target| target.service_id),
                    pos,
                });
            }
            PointerEvent::DoubleClick { pos } => {
                if let Some(target) = hit(pos) {
                    gestures.push(Gesture::DoubleClick {
                        service_id: target.service_id,
                    });
                }
            }
        }

        gestures
    }

    fn fire_due_long_press(&mut self, now: Instant, gestures: &mut Vec<Gesture>) {
        let tolerance = self.tuning.long_press_tolerance;
        let GestureState::Pressed {
            target: Some(service_id),
            origin,
            last,
            long_press,
        } = &mut self.state
        else {
            return;
        };
        let Some(timer) = *long_press else {
            return;
        };
        if now < timer.deadline {
            return;
        }

        *long_press = None;
        let travel = ((last.x - origin.x).abs() + (last.y - origin.y).abs()) / 2.0;
        if travel > tolerance {
            debug!(service_id = %service_id, travel, "long press dropped: pointer moved");
            return;
        }

        debug!(service_id = %service_id, "long press");
        gestures.push(Gesture::RelationBuildStart {
            service_id: service_id.clone(),
        });
    }

    fn pointer_moved(&mut self, pos: Pos2, gestures: &mut Vec<Gesture>) {
        match &mut self.state {
            GestureState::Idle => {}
            GestureState::Pressed {
                target,
                origin,
                last,
                ..
            } => {
                *last = pos;
                if (pos - *origin).length() <= self.tuning.drag_threshold {
                    return;
                }

                let target = target.take();
                let delta = pos - *origin;
                match &target {
                    Some(service_id) => {
                        gestures.push(Gesture::DragStart {
                            service_id: service_id.clone(),
                        });
                        gestures.push(Gesture::Drag {
                            service_id: service_id.clone(),
                            delta,
                        });
                    }
                    None => gestures.push(Gesture::Pan { delta }),
                }
                self.state = GestureState::Dragging { target, last: pos };
            }
            GestureState::Dragging { target, last } => {
                let delta = pos - *last;
                *last = pos;
                match target {
                    Some(service_id) => gestures.push(Gesture::Drag {
                        service_id: service_id.clone(),
                        delta,
                    }),
                    None => gestures.push(Gesture::Pan { delta }),
                }
            }
        }
    }

    fn pointer_released(&mut self, pos: Pos2, gestures: &mut Vec<Gesture>) {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => {}
            GestureState::Pressed { target, .. } => {
                if let Some(service_id) = &target {
                    gestures.push(Gesture::DragEnd {
                        service_id: service_id.clone(),
                    });
                }
                gestures.push(Gesture::Click {
                    service_id: target,
                    pos,
                });
            }
            GestureState::Dragging { target, .. } => {
                if let Some(service_id) = target {
                    gestures.push(Gesture::DragEnd { service_id });
                }
            }
        }
    }
}
