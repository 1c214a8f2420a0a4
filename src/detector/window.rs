use std::collections::VecDeque;

use crate::error::DetectorError;

/// Number of objects detected in one processed frame.
pub type Observation = u32;

/// Rolling window over the most recent object counts, oldest first.
#[derive(Debug, Clone)]
pub struct ObservationWindow {
    history: VecDeque<Observation>,
    capacity: usize,
}

impl ObservationWindow {
    pub fn new(capacity: usize) -> Result<Self, DetectorError> {
        if capacity == 0 {
            return Err(DetectorError::InvalidConfig(
                "Window size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Validate a raw count coming from the object detector.
    pub fn validate(count: i64) -> Result<Observation, DetectorError> {
        Observation::try_from(count).map_err(|_| DetectorError::InvalidObservation(count))
    }

    /// Push a raw count as the newest entry, evicting the oldest once the window is full.
    /// A rejected count leaves the window untouched.
    pub fn push(&mut self, count: i64) -> Result<(), DetectorError> {
        let observation = Self::validate(count)?;
        self.push_observation(observation);
        Ok(())
    }

    pub fn push_observation(&mut self, observation: Observation) {
        if self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(observation);
    }

    pub fn is_full(&self) -> bool {
        self.history.len() == self.capacity
    }

    pub fn current(&self) -> Result<Observation, DetectorError> {
        self.history.back().copied().ok_or(DetectorError::EmptyWindow)
    }

    pub fn snapshot(&self) -> Vec<Observation> {
        self.history.iter().copied().collect()
    }

    /// Oldest to newest, without copying.
    pub fn iter(&self) -> impl Iterator<Item = Observation> + '_ {
        self.history.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
