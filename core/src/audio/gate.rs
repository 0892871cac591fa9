//! One-shot user interaction gate
//!
//! Audio output may only start after the user has touched the dashboard.
//! The gate listens for the first click, key press or touch, resumes the
//! context from that gesture, then unsubscribes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::{AudioLifecycle, ContextState, SynthesisContext};

/// Gestures that count as user interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserGesture {
    Click,
    KeyPress,
    TouchStart,
}

#[derive(Debug, Default)]
pub struct InteractionGate {
    interacted: Arc<AtomicBool>,
    armed: Arc<AtomicBool>,
}

impl InteractionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture has already unlocked audio
    pub fn has_interacted(&self) -> bool {
        self.interacted.load(Ordering::Acquire)
    }

    /// Start listening for the first gesture.
    ///
    /// Returns `None` when audio was already unlocked or a listener is
    /// already armed. A gesture that fails to bring the context to
    /// `Running` leaves the gate listening for the next one.
    pub fn arm<C: SynthesisContext>(
        &self,
        lifecycle: Arc<AudioLifecycle<C>>,
        mut gestures: broadcast::Receiver<UserGesture>,
    ) -> Option<JoinHandle<()>> {
        if self.has_interacted() || self.armed.swap(true, Ordering::AcqRel) {
            return None;
        }

        let interacted = Arc::clone(&self.interacted);
        let armed = Arc::clone(&self.armed);

        Some(tokio::spawn(async move {
            loop {
                match gestures.recv().await {
                    Ok(gesture) => {
                        let running = lifecycle
                            .ensure_ready()
                            .await
                            .is_some_and(|context| context.state() == ContextState::Running);

                        if running {
                            interacted.store(true, Ordering::Release);
                            tracing::debug!(?gesture, "Audio unlocked by user gesture");
                            break;
                        }
                        tracing::debug!(?gesture, "Gesture did not unlock audio, still listening");
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            // Dropping the receiver unsubscribes from the remaining gestures
            armed.store(false, Ordering::Release);
        }))
    }
}
