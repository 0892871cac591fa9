use orderbell_core::audio::{ChimeEvent, DeviceSounds, UserGesture};
use orderbell_core::context::{AppConfig, AppConfigExt};
use orderbell_core::hours::{HoursBook, TomlHoursSource};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

/// Holds all shared state for the CLI application.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<AppConfig>>,
    pub sounds: Arc<DeviceSounds>,
    /// Every entered line is published here; the first one unlocks audio.
    gestures: broadcast::Sender<UserGesture>,
    pub hours: Arc<RwLock<HoursBook>>,
}

impl CliContext {
    /// Must be called from within the tokio runtime.
    pub fn new() -> Self {
        let config = AppConfig::load();

        let hours = match config.hours_path() {
            Some(path) => HoursBook::load(Box::new(TomlHoursSource::new(path))),
            None => HoursBook::with_defaults(),
        };

        let sounds = Arc::new(DeviceSounds::with_default_device(config.chime.clone()));
        let (gestures, _) = broadcast::channel(16);
        sounds.arm_interaction_gate(gestures.subscribe());

        Self {
            config: Arc::new(RwLock::new(config)),
            sounds,
            gestures,
            hours: Arc::new(RwLock::new(hours)),
        }
    }

    pub fn gesture(&self, gesture: UserGesture) {
        // No receiver once the gate has unlocked
        let _ = self.gestures.send(gesture);
    }

    /// Log chime lifecycle events until the engine goes away.
    pub fn spawn_event_log(&self) -> JoinHandle<()> {
        let mut events = self.sounds.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ChimeEvent::Started { key }) => tracing::info!(%key, "Chime started"),
                    Ok(ChimeEvent::Pulse { key, index }) => {
                        tracing::debug!(%key, index, "Chime pulse")
                    }
                    Ok(ChimeEvent::Stopped { key, reason }) => {
                        tracing::info!(%key, ?reason, "Chime stopped")
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Chime event log lagged")
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
