//! Synthesis context backed by the default output device via rodio
//!
//! The device is opened on a dedicated thread when the context is first
//! resumed; `rodio::OutputStream` is not `Send`, so that thread owns it for
//! the rest of the session and only the stream handle is shared. Each tone is
//! a sine [`Source`] that samples its gain automation once per render quantum.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use super::{AudioError, ContextState, GainParam, SynthesisContext, ToneNode};

const SAMPLE_RATE: u32 = 48_000;

/// Samples rendered between two reads of the gain automation
const RENDER_QUANTUM: u64 = 128;

pub struct RodioContext {
    epoch: Instant,
    output: Mutex<Option<OutputStreamHandle>>,
    /// Serializes resume handshakes so only one device thread is spawned
    opening: tokio::sync::Mutex<()>,
}

impl RodioContext {
    /// Create a suspended context. No device is touched until `resume`.
    pub fn new() -> Result<Self, AudioError> {
        Ok(Self {
            epoch: Instant::now(),
            output: Mutex::new(None),
            opening: tokio::sync::Mutex::new(()),
        })
    }

    fn output(&self) -> MutexGuard<'_, Option<OutputStreamHandle>> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Open the default device on its own thread and hand back the stream handle.
async fn open_default_output() -> Result<OutputStreamHandle, AudioError> {
    let (tx, rx) = tokio::sync::oneshot::channel();

    std::thread::Builder::new()
        .name("orderbell-audio".to_string())
        .spawn(move || match OutputStream::try_default() {
            Ok((stream, handle)) => {
                if tx.send(Ok(handle)).is_err() {
                    return;
                }
                // The stream must outlive every sink created from its handle
                let _stream = stream;
                loop {
                    std::thread::park();
                }
            }
            Err(err) => {
                let _ = tx.send(Err(AudioError::NoDevice(err)));
            }
        })
        .map_err(|_| AudioError::DeviceThreadGone)?;

    rx.await.map_err(|_| AudioError::DeviceThreadGone)?
}

impl SynthesisContext for RodioContext {
    type Tone = RodioTone;

    fn state(&self) -> ContextState {
        if self.output().is_some() {
            ContextState::Running
        } else {
            ContextState::Suspended
        }
    }

    async fn resume(&self) -> Result<(), AudioError> {
        let _opening = self.opening.lock().await;
        if self.output().is_some() {
            return Ok(());
        }

        let handle = open_default_output().await?;
        *self.output() = Some(handle);
        tracing::info!("Audio output device opened");
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn start_tone(
        &self,
        frequency: f32,
        gain: &GainParam,
        master: &GainParam,
    ) -> Result<RodioTone, AudioError> {
        let handle = self.output().clone().ok_or(AudioError::NotRunning {
            state: ContextState::Suspended,
        })?;
        let sink =
            Sink::try_new(&handle).map_err(|source| AudioError::StartTone { frequency, source })?;

        let stopped = Arc::new(AtomicBool::new(false));
        sink.append(ToneSource {
            phase: 0.0,
            phase_step: frequency / SAMPLE_RATE as f32,
            started_at: self.current_time(),
            rendered: 0,
            level: 0.0,
            gain: gain.clone(),
            master: master.clone(),
            stopped: Arc::clone(&stopped),
        });

        Ok(RodioTone {
            sink: Some(sink),
            stopped,
        })
    }
}

/// A playing sine tone
pub struct RodioTone {
    sink: Option<Sink>,
    stopped: Arc<AtomicBool>,
}

impl ToneNode for RodioTone {
    fn stop(&mut self) -> Result<(), AudioError> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Err(AudioError::AlreadyStopped { node: "tone" });
        }
        if let Some(sink) = &self.sink {
            sink.stop();
        }
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), AudioError> {
        // Dropping the sink detaches it from the mixer
        match self.sink.take() {
            Some(_) => Ok(()),
            None => Err(AudioError::AlreadyDisconnected { node: "tone" }),
        }
    }
}

/// Sine generator scaled by `gain * master`
struct ToneSource {
    phase: f32,
    phase_step: f32,
    /// Context time of the first sample
    started_at: f64,
    rendered: u64,
    level: f32,
    gain: GainParam,
    master: GainParam,
    stopped: Arc<AtomicBool>,
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.stopped.load(Ordering::Relaxed) {
            return None;
        }

        if self.rendered % RENDER_QUANTUM == 0 {
            let t = self.started_at + self.rendered as f64 / SAMPLE_RATE as f64;
            self.level = self.gain.value_at(t) * self.master.value_at(t);
        }

        let sample = (self.phase * TAU).sin() * self.level;
        self.phase = (self.phase + self.phase_step).fract();
        self.rendered += 1;
        Some(sample)
    }
}

impl Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(gain: f32, master: f32) -> (ToneSource, Arc<AtomicBool>) {
        let stopped = Arc::new(AtomicBool::new(false));
        let source = ToneSource {
            phase: 0.0,
            phase_step: 880.0 / SAMPLE_RATE as f32,
            started_at: 0.0,
            rendered: 0,
            level: 0.0,
            gain: GainParam::new(gain),
            master: GainParam::new(master),
            stopped: Arc::clone(&stopped),
        };
        (source, stopped)
    }

    #[test]
    fn silent_gain_renders_silence() {
        let (source, _) = source(0.0, 0.4);
        assert!(source.take(1024).all(|s| s == 0.0));
    }

    #[test]
    fn output_is_bounded_by_gain_product() {
        let (source, _) = source(0.5, 0.4);
        let peak = source.take(4096).fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.15 && peak <= 0.2 + 1e-6, "peak {peak}");
    }

    #[test]
    fn stopped_source_ends() {
        let (mut source, stopped) = source(0.5, 0.4);
        assert!(source.next().is_some());
        stopped.store(true, Ordering::Relaxed);
        assert!(source.next().is_none());
    }

    #[test]
    fn suspended_context_refuses_tones() {
        let context = RodioContext::new().unwrap();
        assert_eq!(context.state(), ContextState::Suspended);
        let result = context.start_tone(880.0, &GainParam::new(0.0), &GainParam::new(0.4));
        assert!(matches!(result, Err(AudioError::NotRunning { .. })));
    }
}
