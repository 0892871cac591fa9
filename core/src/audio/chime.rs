//! Two-tone chime envelope and pulse repetition
//!
//! One pulse shapes both tone gains over 0.4 s:
//!
//! ```text
//! gain
//! 0.6 ┤   /\                high tone
//! 0.5 ┤  /  \      /\       low tone
//!     │ /    \    /  \
//! 0.0 ┼/──────\──/────\──────▶ t
//!     0   0.1 0.15 0.25  0.4
//! ```
//!
//! Pulses repeat on a fixed cadence until the sound is stopped, the pulse
//! budget is used up, or the repetition callback reports the sound is gone.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::GainParam;

pub const HIGH_TONE_PEAK: f32 = 0.6;
pub const HIGH_TONE_PEAK_AT: f64 = 0.10;
pub const HIGH_TONE_END: f64 = 0.25;

pub const LOW_TONE_PEAK: f32 = 0.5;
pub const LOW_TONE_ONSET: f64 = 0.15;
pub const LOW_TONE_PEAK_AT: f64 = 0.25;

/// Both tones are back at zero this long after the pulse started
pub const PULSE_LENGTH: f64 = 0.40;

/// Schedule one envelope on both tone gains, starting at context time `t`.
///
/// Anything still scheduled from an earlier pulse is cancelled first.
pub fn schedule_pulse(high: &GainParam, low: &GainParam, t: f64) {
    high.cancel_scheduled_values(t);
    low.cancel_scheduled_values(t);

    high.set_value_at_time(0.0, t);
    low.set_value_at_time(0.0, t);

    high.linear_ramp_to_value_at_time(HIGH_TONE_PEAK, t + HIGH_TONE_PEAK_AT);
    high.linear_ramp_to_value_at_time(0.0, t + HIGH_TONE_END);

    low.linear_ramp_to_value_at_time(0.0, t + LOW_TONE_ONSET);
    low.linear_ramp_to_value_at_time(LOW_TONE_PEAK, t + LOW_TONE_PEAK_AT);
    low.linear_ramp_to_value_at_time(0.0, t + PULSE_LENGTH);
}

/// Spawn the repetition of an already-started chime.
///
/// Waits `interval`, then calls `pulse`, at most `repeats` times. The token
/// is checked before every pulse; `pulse` returns `false` when the sound it
/// belongs to is no longer registered, which ends the task as well.
pub fn spawn_repeating<F>(
    interval: Duration,
    repeats: u32,
    stopped: CancellationToken,
    mut pulse: F,
) -> JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    tokio::spawn(async move {
        for _ in 0..repeats {
            tokio::select! {
                biased;
                _ = stopped.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }

            if stopped.is_cancelled() || !pulse() {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    /// Sample a gain over one pulse and return the time of its maximum
    fn peak_time(gain: &GainParam, start: f64) -> f64 {
        (0..=400)
            .map(|ms| start + ms as f64 / 1000.0)
            .fold((start, f32::MIN), |best, t| {
                let value = gain.value_at(t);
                if value > best.1 { (t, value) } else { best }
            })
            .0
    }

    #[test]
    fn high_tone_peaks_before_low_tone() {
        let high = GainParam::new(0.0);
        let low = GainParam::new(0.0);
        schedule_pulse(&high, &low, 2.0);

        let high_peak = peak_time(&high, 2.0);
        let low_peak = peak_time(&low, 2.0);
        assert!(high_peak < low_peak, "{high_peak} should precede {low_peak}");
        assert!(approx(high.value_at(2.0 + HIGH_TONE_PEAK_AT), HIGH_TONE_PEAK));
        assert!(approx(low.value_at(2.0 + LOW_TONE_PEAK_AT), LOW_TONE_PEAK));
    }

    #[test]
    fn low_tone_silent_until_onset() {
        let high = GainParam::new(0.0);
        let low = GainParam::new(0.0);
        schedule_pulse(&high, &low, 0.0);

        assert_eq!(low.value_at(0.05), 0.0);
        assert_eq!(low.value_at(LOW_TONE_ONSET), 0.0);
        assert!(low.value_at(0.2) > 0.0);
    }

    #[test]
    fn both_tones_silent_before_next_pulse() {
        let high = GainParam::new(0.0);
        let low = GainParam::new(0.0);
        schedule_pulse(&high, &low, 0.0);

        for t in [PULSE_LENGTH, 0.8, 1.2, 1.49] {
            assert_eq!(high.value_at(t), 0.0);
            assert_eq!(low.value_at(t), 0.0);
        }
    }

    #[test]
    fn rescheduling_replaces_pending_envelope() {
        let high = GainParam::new(0.0);
        let low = GainParam::new(0.0);
        schedule_pulse(&high, &low, 0.0);
        // A second pulse issued mid-envelope restarts from silence
        schedule_pulse(&high, &low, 0.2);

        assert_eq!(high.value_at(0.2), 0.0);
        assert!(approx(high.value_at(0.3), HIGH_TONE_PEAK));
        assert!(approx(low.value_at(0.45), LOW_TONE_PEAK));
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_task_honours_budget() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let task = spawn_repeating(
            Duration::from_millis(1500),
            2,
            CancellationToken::new(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            },
        );

        task.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_prevents_reschedule() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let stopped = CancellationToken::new();
        let task = spawn_repeating(Duration::from_millis(1500), 10, stopped.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        tokio::time::sleep(Duration::from_millis(1600)).await;
        stopped.cancel();
        task.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_sound_ends_repetition() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let task = spawn_repeating(
            Duration::from_millis(10),
            10,
            CancellationToken::new(),
            move || counter.fetch_add(1, Ordering::SeqCst) < 2,
        );

        task.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
