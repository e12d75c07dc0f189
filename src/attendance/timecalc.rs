use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::attendance::schedule::get_schedule_in_minutes;
use crate::manila;
use crate::model::attendance::DailyAttendanceRecord;
use crate::model::schedule::WorkSchedule;

/// Legacy single-pair records carry no session tag, so a punch is treated as
/// morning or afternoon by which side of Manila noon it falls on.
const NOON_MINUTE: i64 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Present,
    Late,
    Absent,
}

/// Lateness for display, resolving the schedule from the record's user.
/// Returns "-" when there is nothing to report.
pub fn calculate_late(record: &DailyAttendanceRecord) -> String {
    let schedule = get_schedule_in_minutes(record.user.employee_type.as_deref());
    calculate_late_with(record, &schedule)
}

/// Lateness against an explicit schedule. Total; never panics.
///
/// A stored positive `late_minutes` is authoritative and skips recomputation.
/// Dual-session IN fields are summed per half-day; the legacy `time_in` is
/// consulted only when both dual-session fields are absent.
pub fn calculate_late_with(record: &DailyAttendanceRecord, schedule: &WorkSchedule) -> String {
    if record.is_absent {
        return "-".to_string();
    }
    if let Some(minutes) = record.late_minutes {
        if minutes > 0 {
            return format_minutes(minutes);
        }
    }

    let mut total: i64 = 0;
    if let Some(t) = record.morning_time_in {
        total += minutes_after(t, schedule.morning_start);
    }
    if let Some(t) = record.afternoon_time_in {
        total += minutes_after(t, schedule.afternoon_start);
    }
    if record.morning_time_in.is_none() && record.afternoon_time_in.is_none() {
        if let Some(t) = record.time_in {
            let start = if (manila::manila_minute_of_day(t) as i64) < NOON_MINUTE {
                schedule.morning_start
            } else {
                schedule.afternoon_start
            };
            total += minutes_after(t, start);
        }
    }

    if total <= 0 {
        "-".to_string()
    } else {
        format_minutes(total)
    }
}

/// Undertime for display, resolving the schedule from the record's user.
pub fn calculate_undertime(record: &DailyAttendanceRecord) -> String {
    let schedule = get_schedule_in_minutes(record.user.employee_type.as_deref());
    calculate_undertime_with(record, &schedule)
}

/// Undertime against an explicit schedule: minutes left before the scheduled
/// end of each half-day. Staying late is ignored, never credited.
pub fn calculate_undertime_with(record: &DailyAttendanceRecord, schedule: &WorkSchedule) -> String {
    if record.is_absent {
        return "-".to_string();
    }
    if let Some(minutes) = record.undertime_minutes {
        if minutes > 0 {
            return format_minutes(minutes);
        }
    }

    let mut total: i64 = 0;
    if let Some(t) = record.morning_time_out {
        total += minutes_before(t, schedule.morning_end);
    }
    if let Some(t) = record.afternoon_time_out {
        total += minutes_before(t, schedule.afternoon_end);
    }
    if record.morning_time_out.is_none() && record.afternoon_time_out.is_none() {
        if let Some(t) = record.time_out {
            let end = if (manila::manila_minute_of_day(t) as i64) < NOON_MINUTE {
                schedule.morning_end
            } else {
                schedule.afternoon_end
            };
            total += minutes_before(t, end);
        }
    }

    if total <= 0 {
        "-".to_string()
    } else {
        format_minutes(total)
    }
}

/// Hours on the clock for a record of either shape. Prefers the stored
/// value; dual-session pairs are summed, the legacy pair is the fallback.
pub fn worked_hours(record: &DailyAttendanceRecord) -> Option<f64> {
    if let Some(hours) = record.hours_worked {
        return Some(hours);
    }

    let mut millis: i64 = 0;
    millis += session_millis(record.morning_time_in, record.morning_time_out);
    millis += session_millis(record.afternoon_time_in, record.afternoon_time_out);
    if millis == 0 {
        millis = session_millis(record.time_in, record.time_out);
    }

    if millis > 0 {
        let hours = millis as f64 / 3_600_000.0;
        Some((hours * 100.0).round() / 100.0)
    } else {
        None
    }
}

/// Coarse classification for dashboards and report cells.
pub fn day_status(record: &DailyAttendanceRecord) -> DayStatus {
    if record.is_absent {
        DayStatus::Absent
    } else if record.is_late {
        DayStatus::Late
    } else {
        DayStatus::Present
    }
}

/// "1h 5m" above an hour, "5m" below.
pub fn format_minutes(total: i64) -> String {
    let hours = total / 60;
    let minutes = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn minutes_after(t: DateTime<Utc>, scheduled_start: u32) -> i64 {
    (manila::manila_minute_of_day(t) as i64 - scheduled_start as i64).max(0)
}

fn minutes_before(t: DateTime<Utc>, scheduled_end: u32) -> i64 {
    (scheduled_end as i64 - manila::manila_minute_of_day(t) as i64).max(0)
}

fn session_millis(time_in: Option<DateTime<Utc>>, time_out: Option<DateTime<Utc>>) -> i64 {
    match (time_in, time_out) {
        (Some(i), Some(o)) if o > i => (o - i).num_milliseconds(),
        _ => 0,
    }
}
