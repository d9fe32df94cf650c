//! Gesture Recognition
//!
//! Turns raw pointer input into drag gestures without depending on any
//! input library. A mouse drag activates after a minimum travel distance,
//! a touch drag after a press-and-hold delay with a small movement
//! tolerance, so taps, clicks and scrolls never start a drag.

use std::time::Duration;

/// Input device class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Phase of a raw pointer sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One raw pointer sample, timestamped relative to an arbitrary origin
#[derive(Clone, Copy, Debug)]
pub struct PointerInput {
    pub kind: PointerKind,
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
    pub at: Duration,
}

/// Recognized drag gesture event
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    Start,
    Move { dx: f64, dy: f64 },
    End,
    Cancel,
}

/// Produces drag gestures from raw pointer input
pub trait GestureRecognizer: Send {
    fn feed(&mut self, input: &PointerInput) -> Option<GestureEvent>;
    fn reset(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    /// Pointer is down but the activation constraint is not met yet
    Pending { x: f64, y: f64, at: Duration },
    Dragging { x: f64, y: f64 },
}

/// Mouse-style sensor: activates after the pointer travels far enough
pub struct PointerSensor {
    activation_distance: f64,
    phase: Phase,
}

impl PointerSensor {
    /// Activation distance used by the board views
    pub const DEFAULT_DISTANCE: f64 = 8.0;

    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance,
            phase: Phase::Idle,
        }
    }
}

impl Default for PointerSensor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DISTANCE)
    }
}

impl GestureRecognizer for PointerSensor {
    fn feed(&mut self, input: &PointerInput) -> Option<GestureEvent> {
        if input.kind != PointerKind::Mouse {
            return None;
        }
        match (self.phase, input.phase) {
            (Phase::Idle, PointerPhase::Down) => {
                self.phase = Phase::Pending {
                    x: input.x,
                    y: input.y,
                    at: input.at,
                };
                None
            }
            (Phase::Pending { x, y, .. }, PointerPhase::Move) => {
                let travelled = ((input.x - x).powi(2) + (input.y - y).powi(2)).sqrt();
                if travelled >= self.activation_distance {
                    self.phase = Phase::Dragging {
                        x: input.x,
                        y: input.y,
                    };
                    Some(GestureEvent::Start)
                } else {
                    None
                }
            }
            (Phase::Dragging { x, y }, PointerPhase::Move) => {
                self.phase = Phase::Dragging {
                    x: input.x,
                    y: input.y,
                };
                Some(GestureEvent::Move {
                    dx: input.x - x,
                    dy: input.y - y,
                })
            }
            (Phase::Dragging { .. }, PointerPhase::Up) => {
                self.phase = Phase::Idle;
                Some(GestureEvent::End)
            }
            (Phase::Dragging { .. }, PointerPhase::Cancel) => {
                self.phase = Phase::Idle;
                Some(GestureEvent::Cancel)
            }
            // Releasing before activation is a click, not a drag
            (Phase::Pending { .. }, PointerPhase::Up | PointerPhase::Cancel) => {
                self.phase = Phase::Idle;
                None
            }
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

/// Touch sensor: activates after a press-and-hold delay, provided the
/// finger stayed within the movement tolerance
pub struct TouchSensor {
    delay: Duration,
    tolerance: f64,
    phase: Phase,
}

impl TouchSensor {
    /// Press-and-hold delay used by the calendar view
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(250);
    /// Allowed finger drift while waiting for the delay
    pub const DEFAULT_TOLERANCE: f64 = 5.0;

    pub fn new(delay: Duration, tolerance: f64) -> Self {
        Self {
            delay,
            tolerance,
            phase: Phase::Idle,
        }
    }
}

impl Default for TouchSensor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY, Self::DEFAULT_TOLERANCE)
    }
}

impl GestureRecognizer for TouchSensor {
    fn feed(&mut self, input: &PointerInput) -> Option<GestureEvent> {
        if input.kind != PointerKind::Touch {
            return None;
        }
        match (self.phase, input.phase) {
            (Phase::Idle, PointerPhase::Down) => {
                self.phase = Phase::Pending {
                    x: input.x,
                    y: input.y,
                    at: input.at,
                };
                None
            }
            (Phase::Pending { x, y, at }, PointerPhase::Move) => {
                let drift = ((input.x - x).powi(2) + (input.y - y).powi(2)).sqrt();
                if drift > self.tolerance {
                    // Moved too far too early: this is a scroll
                    self.phase = Phase::Idle;
                    None
                } else if input.at.saturating_sub(at) >= self.delay {
                    self.phase = Phase::Dragging {
                        x: input.x,
                        y: input.y,
                    };
                    Some(GestureEvent::Start)
                } else {
                    None
                }
            }
            (Phase::Dragging { x, y }, PointerPhase::Move) => {
                self.phase = Phase::Dragging {
                    x: input.x,
                    y: input.y,
                };
                Some(GestureEvent::Move {
                    dx: input.x - x,
                    dy: input.y - y,
                })
            }
            (Phase::Dragging { .. }, PointerPhase::Up) => {
                self.phase = Phase::Idle;
                Some(GestureEvent::End)
            }
            (Phase::Dragging { .. }, PointerPhase::Cancel) => {
                self.phase = Phase::Idle;
                Some(GestureEvent::Cancel)
            }
            (Phase::Pending { .. }, PointerPhase::Up | PointerPhase::Cancel) => {
                self.phase = Phase::Idle;
                None
            }
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

/// A set of recognizers; the first one that produces an event wins
pub struct SensorSet {
    sensors: Vec<Box<dyn GestureRecognizer>>,
}

impl SensorSet {
    pub fn new(sensors: Vec<Box<dyn GestureRecognizer>>) -> Self {
        Self { sensors }
    }

    /// Mouse + touch sensors with the defaults used across the views
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(PointerSensor::default()),
            Box::new(TouchSensor::default()),
        ])
    }

    pub fn feed(&mut self, input: &PointerInput) -> Option<GestureEvent> {
        self.sensors.iter_mut().find_map(|s| s.feed(input))
    }

    pub fn reset(&mut self) {
        for sensor in &mut self.sensors {
            sensor.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: PointerKind, phase: PointerPhase, x: f64, y: f64, ms: u64) -> PointerInput {
        PointerInput {
            kind,
            phase,
            x,
            y,
            at: Duration::from_millis(ms),
        }
    }

    #[test]
    fn mouse_click_does_not_start_drag() {
        let mut sensor = PointerSensor::default();
        assert_eq!(
            sensor.feed(&sample(PointerKind::Mouse, PointerPhase::Down, 0.0, 0.0, 0)),
            None
        );
        assert_eq!(
            sensor.feed(&sample(PointerKind::Mouse, PointerPhase::Move, 3.0, 2.0, 10)),
            None
        );
        assert_eq!(
            sensor.feed(&sample(PointerKind::Mouse, PointerPhase::Up, 3.0, 2.0, 20)),
            None
        );
    }

    #[test]
    fn mouse_drag_starts_after_distance() {
        let mut sensor = PointerSensor::default();
        sensor.feed(&sample(PointerKind::Mouse, PointerPhase::Down, 0.0, 0.0, 0));
        assert_eq!(
            sensor.feed(&sample(PointerKind::Mouse, PointerPhase::Move, 10.0, 0.0, 10)),
            Some(GestureEvent::Start)
        );
        assert_eq!(
            sensor.feed(&sample(PointerKind::Mouse, PointerPhase::Up, 10.0, 0.0, 20)),
            Some(GestureEvent::End)
        );
    }

    #[test]
    fn touch_hold_starts_drag_within_tolerance() {
        let mut sensor = TouchSensor::default();
        sensor.feed(&sample(PointerKind::Touch, PointerPhase::Down, 0.0, 0.0, 0));
        // Small drift before the delay elapses
        assert_eq!(
            sensor.feed(&sample(PointerKind::Touch, PointerPhase::Move, 2.0, 1.0, 100)),
            None
        );
        assert_eq!(
            sensor.feed(&sample(PointerKind::Touch, PointerPhase::Move, 2.0, 2.0, 300)),
            Some(GestureEvent::Start)
        );
    }

    #[test]
    fn touch_swipe_is_a_scroll() {
        let mut sensor = TouchSensor::default();
        sensor.feed(&sample(PointerKind::Touch, PointerPhase::Down, 0.0, 0.0, 0));
        assert_eq!(
            sensor.feed(&sample(PointerKind::Touch, PointerPhase::Move, 0.0, 40.0, 50)),
            None
        );
        // Holding afterwards must not start a drag either
        assert_eq!(
            sensor.feed(&sample(PointerKind::Touch, PointerPhase::Move, 0.0, 41.0, 400)),
            None
        );
    }

    #[test]
    fn sensor_set_routes_by_kind() {
        let mut sensors = SensorSet::standard();
        sensors.feed(&sample(PointerKind::Touch, PointerPhase::Down, 0.0, 0.0, 0));
        assert_eq!(
            sensors.feed(&sample(PointerKind::Touch, PointerPhase::Move, 0.0, 0.0, 300)),
            Some(GestureEvent::Start)
        );
        sensors.reset();
        sensors.feed(&sample(PointerKind::Mouse, PointerPhase::Down, 0.0, 0.0, 0));
        assert_eq!(
            sensors.feed(&sample(PointerKind::Mouse, PointerPhase::Move, 9.0, 0.0, 5)),
            Some(GestureEvent::Start)
        );
    }
}
