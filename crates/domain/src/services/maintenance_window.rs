//! Maintenance window evaluation.
//!
//! Windows are evaluated on the wall clock of the settings' timezone: the
//! current instant is converted to local civil time and compared against a
//! window that starts at local midnight (daily), local midnight of the most
//! recent Sunday (weekly), local midnight of the 1st (monthly) or at an
//! explicit start (once). The start is inclusive and the end exclusive.
//!
//! A `once` start carrying an offset is taken as its UTC date-time and
//! compared against the local wall clock without zone conversion.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::models::{MaintenanceSettings, MaintenanceWindowStatus, Recurrence};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Evaluate `settings` at the current time.
pub fn is_maintenance_window_active(settings: &MaintenanceSettings) -> MaintenanceWindowStatus {
    is_maintenance_window_active_at(settings, Utc::now())
}

/// Evaluate `settings` at `now`. Pure apart from the invalid-timezone warning.
pub fn is_maintenance_window_active_at(
    settings: &MaintenanceSettings,
    now: DateTime<Utc>,
) -> MaintenanceWindowStatus {
    let zone = resolve_zone(&settings.timezone);
    let local_now = wall_clock(zone, now);

    let Some(window_start) = window_start(settings, local_now) else {
        return MaintenanceWindowStatus::INACTIVE;
    };
    let Some(window_end) =
        window_start.checked_add_signed(Duration::hours(i64::from(settings.duration_hours)))
    else {
        return MaintenanceWindowStatus::INACTIVE;
    };

    if window_start <= local_now && local_now < window_end {
        MaintenanceWindowStatus {
            active: true,
            suppress_alerts: settings.suppress_alerts,
            suppress_patching: settings.suppress_patching,
            suppress_automations: settings.suppress_automations,
            suppress_scripts: settings.suppress_scripts,
        }
    } else {
        MaintenanceWindowStatus::INACTIVE
    }
}

/// `None` stands for UTC: either no zone was configured or it did not parse.
/// Zone names match case-insensitively.
fn resolve_zone(timezone: &str) -> Option<Tz> {
    if timezone.is_empty() {
        return None;
    }
    match Tz::from_str_insensitive(timezone) {
        Ok(tz) => Some(tz),
        Err(e) => {
            warn!(timezone = %timezone, error = %e, "Invalid maintenance timezone, evaluating in UTC");
            None
        }
    }
}

fn wall_clock(zone: Option<Tz>, instant: DateTime<Utc>) -> NaiveDateTime {
    match zone {
        Some(tz) => instant.with_timezone(&tz).naive_local(),
        None => instant.naive_utc(),
    }
}

fn window_start(settings: &MaintenanceSettings, local_now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = local_now.date();
    match Recurrence::parse(&settings.recurrence)? {
        Recurrence::Once => parse_once_start(settings.window_start.as_deref()?),
        Recurrence::Daily => Some(today.and_time(NaiveTime::MIN)),
        Recurrence::Weekly => {
            let since_sunday = i64::from(today.weekday().num_days_from_sunday());
            Some((today - Duration::days(since_sunday)).and_time(NaiveTime::MIN))
        }
        Recurrence::Monthly => today.with_day(1).map(|first| first.and_time(NaiveTime::MIN)),
    }
}

/// Start of a one-off window.
///
/// Values with an offset yield their UTC date-time; values without one are
/// read as written. A bare date means midnight.
fn parse_once_start(value: &str) -> Option<NaiveDateTime> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}
