//! Error types for audio operations

use thiserror::Error;

/// Errors raised while building or tearing down a chime graph.
///
/// These never leave the sound engine: `NotificationSounds` logs them and
/// degrades to silence.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice(#[source] rodio::StreamError),

    #[error("audio output thread exited before the device was opened")]
    DeviceThreadGone,

    #[error("audio context is {state}, playback requires a running context")]
    NotRunning { state: super::ContextState },

    #[error("failed to start tone at {frequency} Hz")]
    StartTone {
        frequency: f32,
        #[source]
        source: rodio::PlayError,
    },

    #[error("{node} was already stopped")]
    AlreadyStopped { node: &'static str },

    #[error("{node} was already disconnected")]
    AlreadyDisconnected { node: &'static str },
}
