//! Where the weekly schedule is stored

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{HoursError, OpeningHour};

/// Backing store for the weekly schedule
pub trait HoursSource: Send + Sync {
    /// Fetch every stored day, ordered by `day_of_week`.
    fn fetch(&self) -> Result<Vec<OpeningHour>, HoursError>;

    /// Replace the stored schedule.
    fn store(&self, week: &[OpeningHour]) -> Result<(), HoursError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WeekFile {
    #[serde(default)]
    days: Vec<OpeningHour>,
}

/// Schedule kept as `[[days]]` tables in a TOML file
#[derive(Debug, Clone)]
pub struct TomlHoursSource {
    path: PathBuf,
}

impl TomlHoursSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HoursSource for TomlHoursSource {
    fn fetch(&self) -> Result<Vec<OpeningHour>, HoursError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| HoursError::Read {
            path: self.path.clone(),
            source,
        })?;
        let file: WeekFile = toml::from_str(&raw).map_err(|source| HoursError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let mut days = file.days;
        if let Some(bad) = days.iter().find(|d| d.day_of_week > 6) {
            return Err(HoursError::InvalidDay {
                day: bad.day_of_week,
            });
        }
        days.sort_by_key(|d| d.day_of_week);
        Ok(days)
    }

    fn store(&self, week: &[OpeningHour]) -> Result<(), HoursError> {
        let file = WeekFile {
            days: week.to_vec(),
        };
        let raw = toml::to_string_pretty(&file)?;
        std::fs::write(&self.path, raw).map_err(|source| HoursError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hours::default_week;

    #[test]
    fn reads_days_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hours.toml");
        std::fs::write(
            &path,
            r#"
[[days]]
day_of_week = 2
day_name = "Tuesday"
open_time_evening = "19:00"
close_time_evening = "22:00"

[[days]]
day_of_week = 0
day_name = "Sunday"
is_closed = true
"#,
        )
        .unwrap();

        let days = TomlHoursSource::new(&path).fetch().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day_name, "Sunday");
        assert!(days[0].is_closed);
        assert_eq!(days[1].open_time_evening, "19:00");
        assert_eq!(days[1].open_time_lunch, "");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TomlHoursSource::new(dir.path().join("nope.toml"))
            .fetch()
            .unwrap_err();
        assert!(matches!(err, HoursError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hours.toml");
        std::fs::write(&path, "[[days]]\nday_of_week = \"monday\"\n").unwrap();
        let err = TomlHoursSource::new(&path).fetch().unwrap_err();
        assert!(matches!(err, HoursError::Parse { .. }));
    }

    #[test]
    fn out_of_range_day_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hours.toml");
        std::fs::write(&path, "[[days]]\nday_of_week = 7\n").unwrap();
        let err = TomlHoursSource::new(&path).fetch().unwrap_err();
        assert!(matches!(err, HoursError::InvalidDay { day: 7 }));
    }

    #[test]
    fn store_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let source = TomlHoursSource::new(dir.path().join("hours.toml"));

        source.store(&default_week()).unwrap();
        let days = source.fetch().unwrap();

        assert_eq!(days.len(), 7);
        assert_eq!(days[0].day_of_week, 0);
        assert_eq!(days[0].close_time_evening, "23:30");
    }
}
