//! Synthesis context and its lifecycle
//!
//! The context is the shared audio output every chime renders into. Desktop
//! and browser audio stacks refuse to start output before the user has
//! interacted with the application, so the context is created lazily and
//! resumed on demand; see [`InteractionGate`](super::InteractionGate).

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{AudioError, GainParam};

/// Run state of a synthesis context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not producing output (no device yet, or resume refused)
    Suspended,
    Running,
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// A started tone generator routed into the context output
pub trait ToneNode: Send + 'static {
    /// Stop producing samples.
    fn stop(&mut self) -> Result<(), AudioError>;

    /// Detach from the output graph.
    fn disconnect(&mut self) -> Result<(), AudioError>;
}

/// Shared audio output used to generate and route tones.
pub trait SynthesisContext: Send + Sync + 'static {
    type Tone: ToneNode;

    fn state(&self) -> ContextState;

    /// Try to move a suspended context to `Running`.
    ///
    /// This is the only operation that waits on the audio subsystem.
    fn resume(&self) -> impl Future<Output = Result<(), AudioError>> + Send;

    /// Context clock in seconds. Gain automation is scheduled against it.
    fn current_time(&self) -> f64;

    /// Start a sine generator at `frequency` whose output passes through
    /// `gain` and then `master` before reaching the device.
    fn start_tone(
        &self,
        frequency: f32,
        gain: &GainParam,
        master: &GainParam,
    ) -> Result<Self::Tone, AudioError>;
}

type ContextFactory<C> = Box<dyn Fn() -> Result<C, AudioError> + Send + Sync>;

/// Lazily creates and resumes the single synthesis context.
///
/// A policy-free environment can pass a factory whose context starts out
/// `Running`; the gate then has nothing to unlock.
pub struct AudioLifecycle<C: SynthesisContext> {
    factory: ContextFactory<C>,
    context: Mutex<Option<Arc<C>>>,
}

impl<C: SynthesisContext> AudioLifecycle<C> {
    pub fn new(factory: impl Fn() -> Result<C, AudioError> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            context: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<C>>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The context, if it has been created already.
    pub fn context(&self) -> Option<Arc<C>> {
        self.slot().clone()
    }

    fn get_or_create(&self) -> Result<Arc<C>, AudioError> {
        let mut slot = self.slot();
        if let Some(context) = slot.as_ref() {
            return Ok(Arc::clone(context));
        }
        let context = Arc::new((self.factory)()?);
        *slot = Some(Arc::clone(&context));
        Ok(context)
    }

    /// Create the context if needed and try to resume it when suspended.
    ///
    /// Never fails: `None` means audio is unavailable, and a context that
    /// refused to resume is returned as-is for the caller to inspect.
    pub async fn ensure_ready(&self) -> Option<Arc<C>> {
        let context = match self.get_or_create() {
            Ok(context) => context,
            Err(err) => {
                tracing::debug!(error = %err, "Audio context unavailable");
                return None;
            }
        };

        if context.state() == ContextState::Suspended {
            if let Err(err) = context.resume().await {
                tracing::debug!(error = %err, "Audio context resume refused");
            }
        }

        Some(context)
    }
}
