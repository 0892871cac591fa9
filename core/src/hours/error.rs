//! Error types for opening hours

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HoursError {
    #[error("failed to read opening hours from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse opening hours in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize opening hours")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write opening hours to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid day of week {day} (expected 0-6)")]
    InvalidDay { day: u8 },
}

impl HoursError {
    /// The hours file does not exist yet
    pub fn is_missing(&self) -> bool {
        matches!(self, HoursError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
