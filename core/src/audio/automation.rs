//! Scheduled gain automation
//!
//! A small subset of the Web Audio `AudioParam` timeline: a gain can be set at
//! a point in time or ramped linearly towards a target. The renderer samples
//! the timeline with [`GainParam::value_at`] while the chime scheduler writes
//! to it from another task, so the timeline sits behind a shared lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::AudioError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum GainEvent {
    SetValue { value: f32, time: f64 },
    LinearRamp { value: f32, time: f64 },
}

impl GainEvent {
    fn time(&self) -> f64 {
        match *self {
            GainEvent::SetValue { time, .. } | GainEvent::LinearRamp { time, .. } => time,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            GainEvent::SetValue { value, .. } | GainEvent::LinearRamp { value, .. } => value,
        }
    }
}

#[derive(Debug)]
struct Timeline {
    /// Intrinsic value used before the first scheduled event
    value: f32,
    /// Sorted by time; events sharing a time keep insertion order
    events: Vec<GainEvent>,
    connected: bool,
}

impl Timeline {
    fn insert(&mut self, event: GainEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }

    fn value_at(&self, t: f64) -> f32 {
        if !self.connected {
            return 0.0;
        }

        let next = self.events.partition_point(|e| e.time() <= t);
        let Some(prev) = next.checked_sub(1).map(|i| self.events[i]) else {
            return self.value;
        };

        match self.events.get(next) {
            Some(&GainEvent::LinearRamp { value, time }) => {
                let span = time - prev.time();
                if span <= 0.0 {
                    return value;
                }
                let progress = ((t - prev.time()) / span) as f32;
                prev.value() + (value - prev.value()) * progress
            }
            _ => prev.value(),
        }
    }
}

/// A volume controller with a schedulable automation timeline.
///
/// Cloning yields another handle to the same timeline; the scheduler keeps
/// one and the renderer keeps the other.
#[derive(Debug, Clone)]
pub struct GainParam {
    timeline: Arc<Mutex<Timeline>>,
}

impl GainParam {
    pub fn new(value: f32) -> Self {
        Self {
            timeline: Arc::new(Mutex::new(Timeline {
                value,
                events: Vec::new(),
                connected: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Timeline> {
        // The timeline holds plain numbers, a panicked writer cannot leave it torn
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the intrinsic value and drop every scheduled event.
    pub fn set_value(&self, value: f32) {
        let mut timeline = self.lock();
        timeline.value = value;
        timeline.events.clear();
    }

    pub fn set_value_at_time(&self, value: f32, time: f64) {
        self.lock().insert(GainEvent::SetValue { value, time });
    }

    /// Ramp linearly from the preceding event so that `value` is reached at `time`.
    pub fn linear_ramp_to_value_at_time(&self, value: f32, time: f64) {
        self.lock().insert(GainEvent::LinearRamp { value, time });
    }

    /// Drop every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&self, time: f64) {
        self.lock().events.retain(|e| e.time() < time);
    }

    /// Gain at context time `t`. A disconnected gain is silent.
    pub fn value_at(&self, t: f64) -> f32 {
        self.lock().value_at(t)
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn disconnect(&self) -> Result<(), AudioError> {
        let mut timeline = self.lock();
        if !timeline.connected {
            return Err(AudioError::AlreadyDisconnected { node: "gain" });
        }
        timeline.connected = false;
        timeline.events.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn intrinsic_value_before_first_event() {
        let gain = GainParam::new(0.4);
        assert!(approx(gain.value_at(0.0), 0.4));
        assert!(approx(gain.value_at(100.0), 0.4));
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let gain = GainParam::new(0.0);
        gain.set_value_at_time(0.0, 1.0);
        gain.linear_ramp_to_value_at_time(0.6, 1.1);
        gain.linear_ramp_to_value_at_time(0.0, 1.25);

        assert!(approx(gain.value_at(1.0), 0.0));
        assert!(approx(gain.value_at(1.05), 0.3));
        assert!(approx(gain.value_at(1.1), 0.6));
        assert!(approx(gain.value_at(1.175), 0.3));
        assert!(approx(gain.value_at(1.25), 0.0));
        assert!(approx(gain.value_at(2.0), 0.0));
    }

    #[test]
    fn cancel_drops_future_events_only() {
        let gain = GainParam::new(0.0);
        gain.set_value_at_time(0.2, 0.0);
        gain.linear_ramp_to_value_at_time(1.0, 2.0);
        gain.cancel_scheduled_values(1.0);

        // The ramp ending at 2.0 is gone, the value holds the last set point
        assert!(approx(gain.value_at(1.5), 0.2));
        assert!(approx(gain.value_at(3.0), 0.2));
    }

    #[test]
    fn disconnected_gain_is_silent() {
        let gain = GainParam::new(0.4);
        gain.disconnect().unwrap();
        assert!(!gain.is_connected());
        assert_eq!(gain.value_at(0.0), 0.0);
    }

    #[test]
    fn second_disconnect_reports_error() {
        let gain = GainParam::new(0.4);
        gain.disconnect().unwrap();
        assert!(matches!(
            gain.disconnect(),
            Err(AudioError::AlreadyDisconnected { node: "gain" })
        ));
    }

    #[test]
    fn clones_share_one_timeline() {
        let gain = GainParam::new(0.0);
        let renderer_side = gain.clone();
        gain.set_value(0.7);
        assert!(approx(renderer_side.value_at(0.0), 0.7));
    }
}
