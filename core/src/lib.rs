pub mod audio;
pub mod context;
pub mod hours;
pub mod orders;

// Re-exports for convenience
pub use audio::{
    AudioError, ChimeEvent, DeviceSounds, InteractionGate, NotificationSounds, StopReason,
    UserGesture,
};
pub use context::{AppConfig, AppConfigExt, ChimeSettings, ConfigError, KitchenSettings};
pub use hours::{HoursBook, HoursError, HoursSource, OpeningHour, TomlHoursSource};
pub use orders::{KitchenOrder, OrderItem, OrderStatus, OrderTimers, TimerSweep};
