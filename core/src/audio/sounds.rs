//! Order notification sounds
//!
//! Keeps a registry of currently chiming orders, at most one chime per order
//! key. Every operation here is best-effort: failures are logged and the
//! caller only ever observes that audio plays or does not.
//!
//! # Lifecycle
//!
//! 1. `play(id)` with a running context and no entry for the key → chime
//!    graph built, first pulse scheduled, entry registered
//! 2. The chime pulses on its cadence until its pulse budget is used up
//! 3. `stop(id)`, `stop_all()` or the auto-stop cap → timers cancelled,
//!    nodes released, entry removed

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use hashbrown::HashMap;
use orderbell_types::ChimeSettings;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::chime::{self, schedule_pulse};
use super::{
    AudioError, AudioLifecycle, ChimeEvent, ContextState, GainParam, InteractionGate, StopReason,
    SynthesisContext, ToneNode, UserGesture,
};

/// Live synthesis graph of one chiming order
struct ActiveSound<T: ToneNode> {
    /// Distinguishes successive chimes registered under the same key
    generation: u64,
    high_tone: T,
    low_tone: T,
    high_gain: GainParam,
    low_gain: GainParam,
    master_gain: GainParam,
    stopped: CancellationToken,
    pulse_task: Option<JoinHandle<()>>,
    auto_stop_task: Option<JoinHandle<()>>,
}

impl<T: ToneNode> ActiveSound<T> {
    /// Cancel both timers, then release every node.
    ///
    /// Each node is released on its own so one failure cannot keep the
    /// others alive.
    fn teardown(mut self, key: &str) {
        self.stopped.cancel();
        if let Some(task) = self.pulse_task.take() {
            task.abort();
        }
        if let Some(task) = self.auto_stop_task.take() {
            task.abort();
        }

        release_tone(&mut self.high_tone, key, "high tone");
        release_tone(&mut self.low_tone, key, "low tone");
        release_gains(&self.high_gain, &self.low_gain, &self.master_gain, key);
    }
}

fn release_gains(high: &GainParam, low: &GainParam, master: &GainParam, key: &str) {
    for (node, gain) in [("high gain", high), ("low gain", low), ("master gain", master)] {
        if let Err(err) = gain.disconnect() {
            tracing::warn!(order = key, node, error = %err, "Failed to disconnect gain");
        }
    }
}

fn release_tone<T: ToneNode>(tone: &mut T, key: &str, node: &'static str) {
    if let Err(err) = tone.stop() {
        tracing::warn!(order = key, node, error = %err, "Failed to stop tone");
    }
    if let Err(err) = tone.disconnect() {
        tracing::warn!(order = key, node, error = %err, "Failed to disconnect tone");
    }
}

/// Registry shared between the engine and its background tasks
struct SoundRegistry<T: ToneNode> {
    sounds: Mutex<HashMap<String, ActiveSound<T>>>,
    events: broadcast::Sender<ChimeEvent>,
}

impl<T: ToneNode> SoundRegistry<T> {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ActiveSound<T>>> {
        self.sounds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ChimeEvent) {
        // No subscribers is the normal case
        let _ = self.events.send(event);
    }

    fn holds(&self, key: &str, generation: u64) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|sound| sound.generation == generation)
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Remove and tear down the sound under `key`, whatever its generation.
    fn stop(&self, key: &str, reason: StopReason) {
        let removed = self.lock().remove(key);
        if let Some(sound) = removed {
            self.finish(key, sound, reason);
        }
    }

    /// Like `stop`, but only if `key` still belongs to `generation`.
    fn stop_generation(&self, key: &str, generation: u64, reason: StopReason) {
        let removed = {
            let mut sounds = self.lock();
            match sounds.get(key) {
                Some(sound) if sound.generation == generation => sounds.remove(key),
                _ => None,
            }
        };
        if let Some(sound) = removed {
            self.finish(key, sound, reason);
        }
    }

    fn finish(&self, key: &str, sound: ActiveSound<T>, reason: StopReason) {
        // The entry is already out of the registry, so teardown errors cannot leave it dangling
        sound.teardown(key);
        tracing::debug!(order = key, ?reason, "Notification sound stopped");
        self.emit(ChimeEvent::Stopped {
            key: key.to_string(),
            reason,
        });
    }
}

/// Plays and stops the per-order notification chime.
///
/// Dropping the engine stops every chime it still owns.
pub struct NotificationSounds<C: SynthesisContext> {
    lifecycle: Arc<AudioLifecycle<C>>,
    gate: InteractionGate,
    settings: ChimeSettings,
    registry: Arc<SoundRegistry<C::Tone>>,
    next_generation: AtomicU64,
}

impl<C: SynthesisContext> NotificationSounds<C> {
    pub fn new(lifecycle: AudioLifecycle<C>, settings: ChimeSettings) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            lifecycle: Arc::new(lifecycle),
            gate: InteractionGate::new(),
            settings,
            registry: Arc::new(SoundRegistry {
                sounds: Mutex::new(HashMap::new()),
                events,
            }),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &ChimeSettings {
        &self.settings
    }

    pub fn lifecycle(&self) -> &Arc<AudioLifecycle<C>> {
        &self.lifecycle
    }

    /// Subscribe to chime start/pulse/stop events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChimeEvent> {
        self.registry.events.subscribe()
    }

    /// Resume audio on the first gesture received on `gestures`.
    ///
    /// Safe to call repeatedly; see [`InteractionGate::arm`].
    pub fn arm_interaction_gate(
        &self,
        gestures: broadcast::Receiver<UserGesture>,
    ) -> Option<JoinHandle<()>> {
        self.gate.arm(Arc::clone(&self.lifecycle), gestures)
    }

    pub fn has_user_interacted(&self) -> bool {
        self.gate.has_interacted()
    }

    pub fn active_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_active(&self, id: impl Display) -> bool {
        self.registry.lock().contains_key(&id.to_string())
    }

    /// Start the chime for `id` unless one is already playing.
    ///
    /// Returns silently when audio is unavailable or the context is not
    /// running; setup failures are logged as warnings.
    pub async fn play(&self, id: impl Display) {
        if !self.settings.enabled {
            return;
        }
        let key = id.to_string();

        let Some(context) = self.lifecycle.ensure_ready().await else {
            return;
        };
        let state = context.state();
        if state != ContextState::Running {
            tracing::debug!(order = %key, %state, "Audio context not running, skipping chime");
            return;
        }

        if let Err(err) = self.start_chime(&context, &key) {
            tracing::warn!(order = %key, error = %err, "Failed to play notification sound");
        }
    }

    /// Build the graph and register it.
    ///
    /// The registry lock is held from the emptiness check to the insert so
    /// two concurrent `play` calls for one key cannot both build a graph.
    fn start_chime(&self, context: &Arc<C>, key: &str) -> Result<(), AudioError> {
        let mut sounds = self.registry.lock();
        if sounds.contains_key(key) {
            return Ok(());
        }

        let high_gain = GainParam::new(0.0);
        let low_gain = GainParam::new(0.0);
        let master_gain = GainParam::new(self.settings.master_gain);

        let mut high_tone =
            context.start_tone(self.settings.high_tone_hz, &high_gain, &master_gain)?;
        let low_tone = match context.start_tone(self.settings.low_tone_hz, &low_gain, &master_gain)
        {
            Ok(tone) => tone,
            Err(err) => {
                release_tone(&mut high_tone, key, "high tone");
                release_gains(&high_gain, &low_gain, &master_gain, key);
                return Err(err);
            }
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let stopped = CancellationToken::new();

        schedule_pulse(&high_gain, &low_gain, context.current_time());
        self.registry.emit(ChimeEvent::Started {
            key: key.to_string(),
        });
        self.registry.emit(ChimeEvent::Pulse {
            key: key.to_string(),
            index: 0,
        });

        let pulse_task = chime::spawn_repeating(
            self.settings.pulse_interval(),
            self.settings.max_pulses().saturating_sub(1),
            stopped.clone(),
            pulse_callback(
                Arc::downgrade(&self.registry),
                Arc::clone(context),
                key.to_string(),
                generation,
                high_gain.clone(),
                low_gain.clone(),
            ),
        );

        let auto_stop_task = {
            let registry = Arc::downgrade(&self.registry);
            let key = key.to_string();
            let cap = self.settings.auto_stop();
            tokio::spawn(async move {
                tokio::time::sleep(cap).await;
                if let Some(registry) = registry.upgrade() {
                    registry.stop_generation(&key, generation, StopReason::Expired);
                }
            })
        };

        sounds.insert(
            key.to_string(),
            ActiveSound {
                generation,
                high_tone,
                low_tone,
                high_gain,
                low_gain,
                master_gain,
                stopped,
                pulse_task: Some(pulse_task),
                auto_stop_task: Some(auto_stop_task),
            },
        );
        tracing::debug!(order = key, generation, "Notification sound started");
        Ok(())
    }

    /// Stop the chime for `id`. A no-op when nothing is playing for it.
    pub fn stop(&self, id: impl Display) {
        self.registry.stop(&id.to_string(), StopReason::Requested);
    }

    /// Stop every chime.
    pub fn stop_all(&self) {
        // Snapshot first: stopping removes from the map being walked
        for key in self.registry.keys() {
            self.registry.stop(&key, StopReason::Requested);
        }
    }
}

impl<C: SynthesisContext> Drop for NotificationSounds<C> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Pulse callback for one chime: reschedules only while the registry
/// still holds this exact generation.
fn pulse_callback<C: SynthesisContext>(
    registry: Weak<SoundRegistry<C::Tone>>,
    context: Arc<C>,
    key: String,
    generation: u64,
    high_gain: GainParam,
    low_gain: GainParam,
) -> impl FnMut() -> bool + Send + 'static {
    let mut index = 0;
    move || {
        let Some(registry) = registry.upgrade() else {
            return false;
        };
        if !registry.holds(&key, generation) {
            return false;
        }

        index += 1;
        schedule_pulse(&high_gain, &low_gain, context.current_time());
        registry.emit(ChimeEvent::Pulse {
            key: key.clone(),
            index,
        });
        true
    }
}
