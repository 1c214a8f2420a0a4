use tracing::{debug, info};

use crate::detector::state::{CaptureEvent, DetectorState};
use crate::detector::window::{Observation, ObservationWindow};

/// Whether `value` is at least `threshold` away from `current`.
/// Zero readings never count as variation.
fn is_variation(value: Observation, current: Observation, threshold: u32) -> bool {
    if value == 0 {
        return false;
    }
    let (value, current, threshold) = (value as u64, current as u64, threshold as u64);
    value + threshold <= current || value >= current + threshold
}

/// One decision step over a full window. Returns the next state and the event to emit, if any.
pub fn transition(
    state: DetectorState,
    window: &ObservationWindow,
    threshold: u32,
) -> (DetectorState, Option<CaptureEvent>) {
    let current = match window.current() {
        Ok(current) if window.is_full() => current,
        _ => return (state, None),
    };

    match state {
        DetectorState::Idle => {
            if window
                .iter()
                .any(|value| is_variation(value, current, threshold))
            {
                (DetectorState::HandsPresent, None)
            } else {
                (DetectorState::Idle, None)
            }
        }
        DetectorState::HandsPresent => {
            if window.iter().all(|value| value == current) {
                (DetectorState::Idle, Some(CaptureEvent))
            } else {
                (DetectorState::HandsPresent, None)
            }
        }
    }
}

/// Debounced two-state machine deciding when hands have left the frame.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    state: DetectorState,
    variability_threshold: u32,
}

impl StabilityDetector {
    pub fn new(variability_threshold: u32) -> Self {
        Self {
            state: DetectorState::Idle,
            variability_threshold,
        }
    }

    /// Call once after every push into `window`.
    pub fn evaluate(&mut self, window: &ObservationWindow) -> Option<CaptureEvent> {
        if !window.is_full() {
            debug!(
                "Warming up: {}/{} observations",
                window.len(),
                window.capacity()
            );
            return None;
        }

        let (next, event) = transition(self.state, window, self.variability_threshold);
        match (self.state, next) {
            (DetectorState::Idle, DetectorState::HandsPresent) => {
                info!("Object count is changing, hands entered the frame");
            }
            (DetectorState::HandsPresent, DetectorState::Idle) => {
                info!("Object count settled at {:?}, requesting capture", window.current().ok());
            }
            _ => {}
        }
        self.state = next;
        event
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_window(values: &[u32]) -> ObservationWindow {
        let mut window = ObservationWindow::new(values.len()).unwrap();
        for &value in values {
            window.push_observation(value);
        }
        window
    }

    #[test]
    fn partial_window_never_transitions() {
        let mut window = ObservationWindow::new(4).unwrap();
        window.push_observation(1);
        window.push_observation(9);
        let (state, event) = transition(DetectorState::Idle, &window, 2);
        assert_eq!(state, DetectorState::Idle);
        assert!(event.is_none());
    }

    #[test]
    fn large_swing_enters_hands_present() {
        let window = full_window(&[2, 2, 2, 5]);
        let (state, event) = transition(DetectorState::Idle, &window, 2);
        assert_eq!(state, DetectorState::HandsPresent);
        assert!(event.is_none());
    }

    #[test]
    fn swing_above_current_enters_hands_present() {
        let window = full_window(&[4, 1, 1, 1]);
        let (state, _) = transition(DetectorState::Idle, &window, 2);
        assert_eq!(state, DetectorState::HandsPresent);
    }

    #[test]
    fn small_jitter_stays_idle() {
        let window = full_window(&[3, 4, 3, 2, 3]);
        let (state, event) = transition(DetectorState::Idle, &window, 2);
        assert_eq!(state, DetectorState::Idle);
        assert!(event.is_none());
    }

    #[test]
    fn zero_history_is_not_variation() {
        let window = full_window(&[0, 0, 0, 3]);
        let (state, _) = transition(DetectorState::Idle, &window, 2);
        assert_eq!(state, DetectorState::Idle);
    }

    #[test]
    fn low_current_does_not_underflow() {
        let window = full_window(&[1, 1, 0, 0]);
        let (state, _) = transition(DetectorState::Idle, &window, 2);
        assert_eq!(state, DetectorState::Idle);

        let window = full_window(&[2, 1, 0, 0]);
        let (state, _) = transition(DetectorState::Idle, &window, 2);
        assert_eq!(state, DetectorState::HandsPresent);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let window = full_window(&[u32::MAX, u32::MAX, u32::MAX - 1]);
        let (state, _) = transition(DetectorState::Idle, &window, u32::MAX);
        assert_eq!(state, DetectorState::Idle);
    }

    #[test]
    fn uniform_window_fires_from_hands_present() {
        let window = full_window(&[5, 5, 5]);
        let (state, event) = transition(DetectorState::HandsPresent, &window, 2);
        assert_eq!(state, DetectorState::Idle);
        assert_eq!(event, Some(CaptureEvent));
    }

    #[test]
    fn settling_at_zero_still_fires() {
        let window = full_window(&[0, 0, 0]);
        let (state, event) = transition(DetectorState::HandsPresent, &window, 2);
        assert_eq!(state, DetectorState::Idle);
        assert_eq!(event, Some(CaptureEvent));
    }

    #[test]
    fn any_difference_keeps_hands_present() {
        let window = full_window(&[5, 5, 4, 5]);
        let (state, event) = transition(DetectorState::HandsPresent, &window, 2);
        assert_eq!(state, DetectorState::HandsPresent);
        assert!(event.is_none());
    }

    #[test]
    fn threshold_of_one_is_maximally_sensitive() {
        let window = full_window(&[2, 3, 3]);
        let (state, _) = transition(DetectorState::Idle, &window, 1);
        assert_eq!(state, DetectorState::HandsPresent);

        let window = full_window(&[0, 3, 3]);
        let (state, _) = transition(DetectorState::Idle, &window, 1);
        assert_eq!(state, DetectorState::Idle);
    }

    #[test]
    fn evaluate_updates_owned_state() {
        let mut detector = StabilityDetector::new(2);
        let mut window = ObservationWindow::new(2).unwrap();

        window.push_observation(1);
        assert!(detector.evaluate(&window).is_none());
        window.push_observation(4);
        assert!(detector.evaluate(&window).is_none());
        assert_eq!(detector.state(), DetectorState::HandsPresent);

        window.push_observation(4);
        assert_eq!(detector.evaluate(&window), Some(CaptureEvent));
        assert_eq!(detector.state(), DetectorState::Idle);

        detector.reset();
        assert_eq!(detector.state(), DetectorState::Idle);
    }
}
