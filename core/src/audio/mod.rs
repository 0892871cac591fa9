//! Order notification audio
//!
//! This module provides:
//! - **Context lifecycle**: lazy creation and resume of the shared output
//! - **Interaction gate**: unlocks audio on the first user gesture
//! - **Chime**: the two-tone pulse envelope and its repetition
//! - **Sounds**: the per-order registry behind `play` / `stop` / `stop_all`
//!
//! # Architecture
//!
//! ```text
//!   high tone ──▶ high gain ──┐
//!                             ├──▶ master gain ──▶ SynthesisContext output
//!   low tone  ──▶ low gain  ──┘
//! ```
//!
//! Only the tone gains are automated; the master gain holds a fixed level.

mod automation;
pub mod chime;
mod context;
mod error;
mod events;
mod gate;
pub mod rodio_backend;
mod sounds;


pub use automation::GainParam;
pub use context::{AudioLifecycle, ContextState, SynthesisContext, ToneNode};
pub use error::AudioError;
pub use events::{ChimeEvent, StopReason};
pub use gate::{InteractionGate, UserGesture};
pub use rodio_backend::{RodioContext, RodioTone};
pub use sounds::NotificationSounds;

/// Engine wired to the default output device
pub type DeviceSounds = NotificationSounds<RodioContext>;

impl DeviceSounds {
    /// Engine whose context opens the default device on first resume.
    pub fn with_default_device(settings: orderbell_types::ChimeSettings) -> Self {
        NotificationSounds::new(AudioLifecycle::new(RodioContext::new), settings)
    }
}
