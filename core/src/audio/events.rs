//! Chime lifecycle events for dashboard integration
//!
//! The engine returns nothing from `play`/`stop`; collaborators that want to
//! mirror a chime visually (card glow, badge) subscribe to these instead.

/// Why a chime ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop` or `stop_all` was called
    Requested,
    /// The auto-stop cap elapsed
    Expired,
}

/// Events emitted by `NotificationSounds`
#[derive(Debug, Clone, PartialEq)]
pub enum ChimeEvent {
    Started {
        key: String,
    },

    /// One envelope was scheduled; `index` starts at 0
    Pulse {
        key: String,
        index: u32,
    },

    Stopped {
        key: String,
        reason: StopReason,
    },
}
