//! Patch schedule parsing and due-check.
//!
//! Schedules are matched on the UTC wall clock at minute granularity: a
//! schedule is due only while the current UTC hour and minute equal the
//! configured time, so the scanner must run at least once a minute.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

const DEFAULT_FREQUENCY: &str = "weekly";
const DEFAULT_TIME: &str = "02:00";
const DEFAULT_DAY_OF_WEEK: &str = "sun";
const DEFAULT_DAY_OF_MONTH: u32 = 1;

/// Patch schedule read from a feature link's inline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchScheduleConfig {
    pub frequency: String,
    pub time: String,
    pub day_of_week: Option<String>,
    pub day_of_month: Option<u32>,
}

impl Default for PatchScheduleConfig {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY.to_string(),
            time: DEFAULT_TIME.to_string(),
            day_of_week: None,
            day_of_month: None,
        }
    }
}

impl PatchScheduleConfig {
    /// Read `scheduleFrequency`, `scheduleTime`, `scheduleDayOfWeek` and
    /// `scheduleDayOfMonth`. Missing or mistyped keys fall back to defaults.
    pub fn from_inline_settings(settings: Option<&serde_json::Value>) -> Self {
        let mut config = Self::default();
        let Some(settings) = settings else {
            return config;
        };

        let text = |key: &str| {
            settings
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(frequency) = text("scheduleFrequency") {
            config.frequency = frequency;
        }
        if let Some(time) = text("scheduleTime") {
            config.time = time;
        }
        config.day_of_week = text("scheduleDayOfWeek");
        config.day_of_month = settings.get("scheduleDayOfMonth").and_then(|v| {
            v.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        });

        config
    }

    /// Target hour and minute. `None` when the time does not parse.
    pub fn target_time(&self) -> Option<(u32, u32)> {
        let mut parts = self.time.trim().split(':');
        let hour: u32 = parts.next()?.trim().parse().ok()?;
        let minute: u32 = parts.next()?.trim().parse().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0).map(|_| (hour, minute))
    }

    /// Weekday of a weekly schedule, from the first three letters of the configured day.
    pub fn target_weekday(&self) -> Option<Weekday> {
        let day = self
            .day_of_week
            .as_deref()
            .unwrap_or(DEFAULT_DAY_OF_WEEK)
            .to_ascii_lowercase();
        match day.get(..3)? {
            "sun" => Some(Weekday::Sun),
            "mon" => Some(Weekday::Mon),
            "tue" => Some(Weekday::Tue),
            "wed" => Some(Weekday::Wed),
            "thu" => Some(Weekday::Thu),
            "fri" => Some(Weekday::Fri),
            "sat" => Some(Weekday::Sat),
            _ => None,
        }
    }

    /// Whether the schedule fires at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let Some((hour, minute)) = self.target_time() else {
            return false;
        };
        if now.hour() != hour || now.minute() != minute {
            return false;
        }

        match self.frequency.as_str() {
            "daily" => true,
            "weekly" => self.target_weekday() == Some(now.weekday()),
            "monthly" => now.day() == self.day_of_month.unwrap_or(DEFAULT_DAY_OF_MONTH),
            _ => false,
        }
    }

    /// Start of the schedule window containing `now`, in UTC.
    ///
    /// Daily windows start at midnight, weekly ones at midnight of the most
    /// recent Sunday and monthly ones at midnight of the 1st.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let start = match self.frequency.as_str() {
            "daily" => today,
            "weekly" => today - Duration::days(i64::from(today.weekday().num_days_from_sunday())),
            "monthly" => today.with_day(1)?,
            _ => return None,
        };
        Some(start.and_time(NaiveTime::MIN).and_utc())
    }
}
