// Pointer sensor: raw pointer input -> drag events
//
// A press only becomes a drag once the pointer has travelled more than the
// activation distance from where it went down. Releasing before that is a
// click, which never reaches the drag controller.

use crate::config::DEFAULT_ACTIVATION_DISTANCE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Receiver of the events a pointer framework produces
pub trait DragHandler {
    fn on_drag_start(&mut self, lead_id: &str);
    fn on_drag_over(&mut self, stage_id: Option<&str>);
    fn on_drop(&mut self);
    fn on_cancel(&mut self);
    /// Press and release without enough movement to count as a drag
    fn on_click(&mut self, lead_id: &str);
}

#[derive(Debug, Clone, PartialEq)]
enum SensorState {
    Released,
    Pressed {
        lead_id: String,
        origin: Point,
        over: Option<String>,
    },
    Active {
        over: Option<String>,
    },
}

#[derive(Debug)]
pub struct PointerSensor {
    activation_distance: f64,
    state: SensorState,
}

impl Default for PointerSensor {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl PointerSensor {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance,
            state: SensorState::Released,
        }
    }

    pub fn activation_distance(&self) -> f64 {
        self.activation_distance
    }

    /// Whether a press has turned into a drag
    pub fn is_active(&self) -> bool {
        matches!(self.state, SensorState::Active { .. })
    }

    /// Pointer pressed on a lead card. Ignored while another press is in progress.
    pub fn pointer_down(&mut self, lead_id: &str, at: Point) {
        if self.state != SensorState::Released {
            return;
        }
        self.state = SensorState::Pressed {
            lead_id: lead_id.to_string(),
            origin: at,
            over: None,
        };
    }

    /// Pointer moved to `at`, currently over drop target `over` (if any)
    pub fn pointer_move<H: DragHandler + ?Sized>(&mut self, at: Point, over: Option<&str>, handler: &mut H) {
        match &mut self.state {
            SensorState::Released => {}
            SensorState::Pressed { lead_id, origin, over: pressed_over } => {
                if origin.distance_to(at) > self.activation_distance {
                    let lead_id = std::mem::take(lead_id);
                    handler.on_drag_start(&lead_id);
                    handler.on_drag_over(over);
                    self.state = SensorState::Active {
                        over: over.map(str::to_string),
                    };
                } else {
                    *pressed_over = over.map(str::to_string);
                }
            }
            SensorState::Active { over: current } => {
                if current.as_deref() != over {
                    *current = over.map(str::to_string);
                    handler.on_drag_over(over);
                }
            }
        }
    }

    /// Pointer released: a drop when dragging, a click otherwise
    pub fn pointer_up<H: DragHandler + ?Sized>(&mut self, handler: &mut H) {
        match std::mem::replace(&mut self.state, SensorState::Released) {
            SensorState::Released => {}
            SensorState::Pressed { lead_id, .. } => handler.on_click(&lead_id),
            SensorState::Active { .. } => handler.on_drop(),
        }
    }

    /// Gesture interrupted (escape key, pointer capture lost, ...)
    pub fn abort<H: DragHandler + ?Sized>(&mut self, handler: &mut H) {
        if let SensorState::Active { .. } = std::mem::replace(&mut self.state, SensorState::Released) {
            handler.on_cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl DragHandler for Recorder {
        fn on_drag_start(&mut self, lead_id: &str) {
            self.events.push(format!("start:{}", lead_id));
        }
        fn on_drag_over(&mut self, stage_id: Option<&str>) {
            self.events.push(format!("over:{}", stage_id.unwrap_or("-")));
        }
        fn on_drop(&mut self) {
            self.events.push("drop".to_string());
        }
        fn on_cancel(&mut self) {
            self.events.push("cancel".to_string());
        }
        fn on_click(&mut self, lead_id: &str) {
            self.events.push(format!("click:{}", lead_id));
        }
    }

    #[test]
    fn test_distance() {
        assert_eq!(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_small_movement_is_click() {
        let mut sensor = PointerSensor::default();
        let mut rec = Recorder::default();

        sensor.pointer_down("L1", Point::new(10.0, 10.0));
        sensor.pointer_move(Point::new(14.0, 13.0), Some("s2"), &mut rec);
        sensor.pointer_move(Point::new(18.0, 10.0), Some("s2"), &mut rec); // exactly 8px
        sensor.pointer_up(&mut rec);

        assert_eq!(rec.events, vec!["click:L1"]);
    }

    #[test]
    fn test_movement_past_threshold_is_drag() {
        let mut sensor = PointerSensor::new(8.0);
        let mut rec = Recorder::default();

        sensor.pointer_down("L1", Point::new(0.0, 0.0));
        sensor.pointer_move(Point::new(9.0, 0.0), Some("s1"), &mut rec);
        assert!(sensor.is_active());
        sensor.pointer_move(Point::new(200.0, 0.0), Some("s2"), &mut rec);
        sensor.pointer_move(Point::new(201.0, 0.0), Some("s2"), &mut rec);
        sensor.pointer_up(&mut rec);

        assert_eq!(rec.events, vec!["start:L1", "over:s1", "over:s2", "drop"]);
        assert!(!sensor.is_active());
    }

    #[test]
    fn test_abort_cancels_active_drag() {
        let mut sensor = PointerSensor::default();
        let mut rec = Recorder::default();

        sensor.pointer_down("L1", Point::new(0.0, 0.0));
        sensor.pointer_move(Point::new(50.0, 0.0), Some("s2"), &mut rec);
        sensor.abort(&mut rec);
        sensor.pointer_up(&mut rec);

        assert_eq!(rec.events, vec!["start:L1", "over:s2", "cancel"]);
    }

    #[test]
    fn test_abort_before_activation_is_silent() {
        let mut sensor = PointerSensor::default();
        let mut rec = Recorder::default();

        sensor.pointer_down("L1", Point::new(0.0, 0.0));
        sensor.abort(&mut rec);
        sensor.pointer_up(&mut rec);

        assert!(rec.events.is_empty());
    }

    #[test]
    fn test_second_press_ignored() {
        let mut sensor = PointerSensor::new(0.0);
        let mut rec = Recorder::default();

        sensor.pointer_down("L1", Point::new(0.0, 0.0));
        sensor.pointer_down("L2", Point::new(0.0, 0.0));
        sensor.pointer_move(Point::new(1.0, 0.0), None, &mut rec);
        sensor.pointer_up(&mut rec);

        assert_eq!(rec.events, vec!["start:L1", "over:-", "drop"]);
    }
}
