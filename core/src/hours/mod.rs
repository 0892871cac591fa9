//! Restaurant opening hours
//!
//! A week is up to seven [`OpeningHour`] rows, each with an optional lunch
//! and evening window. Times are compared as `HH:MM` strings, so seconds in
//! stored values are ignored and both window ends are inclusive.

mod error;
mod source;

use chrono::{Datelike, Local, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub use error::HoursError;
pub use source::{HoursSource, TomlHoursSource};

/// One day of the weekly schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHour {
    /// 0 = Sunday
    pub day_of_week: u8,
    #[serde(default)]
    pub day_name: String,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub open_time_lunch: String,
    #[serde(default)]
    pub close_time_lunch: String,
    #[serde(default)]
    pub open_time_evening: String,
    #[serde(default)]
    pub close_time_evening: String,
}

impl OpeningHour {
    fn lunch(&self) -> Option<(&str, &str)> {
        window(&self.open_time_lunch, &self.close_time_lunch)
    }

    fn evening(&self) -> Option<(&str, &str)> {
        window(&self.open_time_evening, &self.close_time_evening)
    }
}

/// `HH:MM` prefix of a stored time
fn minutes_of(time: &str) -> &str {
    time.get(..5).unwrap_or(time)
}

fn window<'a>(open: &'a str, close: &'a str) -> Option<(&'a str, &'a str)> {
    (!open.is_empty() && !close.is_empty()).then(|| (minutes_of(open), minutes_of(close)))
}

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Schedule used when no stored hours are available: every evening 18:30-23:30.
pub fn default_week() -> Vec<OpeningHour> {
    DAY_NAMES
        .iter()
        .enumerate()
        .map(|(day, name)| OpeningHour {
            day_of_week: day as u8,
            day_name: (*name).to_string(),
            is_closed: false,
            open_time_lunch: String::new(),
            close_time_lunch: String::new(),
            open_time_evening: "18:30".to_string(),
            close_time_evening: "23:30".to_string(),
        })
        .collect()
}

/// Whether the schedule has the restaurant open on `weekday` at `time`.
pub fn is_open_at(schedule: &[OpeningHour], weekday: Weekday, time: NaiveTime) -> bool {
    if schedule.is_empty() {
        return false;
    }

    let day = weekday.num_days_from_sunday() as u8;
    let Some(today) = schedule.iter().find(|d| d.day_of_week == day) else {
        tracing::debug!(day, "No schedule found for day");
        return false;
    };

    if today.is_closed {
        tracing::debug!(day = %today.day_name, "Restaurant closed all day");
        return false;
    }

    let now = format!("{:02}:{:02}", time.hour(), time.minute());
    let inside = |(open, close): (&str, &str)| now.as_str() >= open && now.as_str() <= close;

    if today.lunch().is_some_and(inside) || today.evening().is_some_and(inside) {
        return true;
    }

    tracing::debug!(day = %today.day_name, time = %now, "Outside operating hours");
    false
}

/// The loaded schedule plus where it came from
pub struct HoursBook {
    source: Option<Box<dyn HoursSource>>,
    schedule: Vec<OpeningHour>,
}

impl HoursBook {
    /// Load the schedule, falling back to [`default_week`] if the source fails.
    pub fn load(source: Box<dyn HoursSource>) -> Self {
        let schedule = fetch_or_default(source.as_ref());
        Self {
            source: Some(source),
            schedule,
        }
    }

    /// Book with the fallback week and nowhere to save edits
    pub fn with_defaults() -> Self {
        Self {
            source: None,
            schedule: default_week(),
        }
    }

    pub fn schedule(&self) -> &[OpeningHour] {
        &self.schedule
    }

    pub fn reload(&mut self) {
        if let Some(source) = &self.source {
            self.schedule = fetch_or_default(source.as_ref());
        }
    }

    /// Insert or replace the row for `row.day_of_week` and persist the week.
    pub fn save_row(&mut self, row: OpeningHour) -> Result<(), HoursError> {
        if row.day_of_week > 6 {
            return Err(HoursError::InvalidDay {
                day: row.day_of_week,
            });
        }

        match self
            .schedule
            .iter_mut()
            .find(|d| d.day_of_week == row.day_of_week)
        {
            Some(existing) => *existing = row,
            None => {
                self.schedule.push(row);
                self.schedule.sort_by_key(|d| d.day_of_week);
            }
        }

        if let Some(source) = &self.source {
            source.store(&self.schedule)?;
            tracing::info!("Opening hours saved");
        }
        Ok(())
    }

    pub fn is_open_at(&self, weekday: Weekday, time: NaiveTime) -> bool {
        is_open_at(&self.schedule, weekday, time)
    }

    pub fn is_open_now(&self) -> bool {
        let now = Local::now();
        self.is_open_at(now.weekday(), now.time())
    }
}

fn fetch_or_default(source: &dyn HoursSource) -> Vec<OpeningHour> {
    match source.fetch() {
        Ok(days) => days,
        Err(err) if err.is_missing() => {
            tracing::debug!(error = %err, "No stored opening hours yet, using defaults");
            default_week()
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to load opening hours, using defaults");
            default_week()
        }
    }
}
