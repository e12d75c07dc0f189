use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::model::schedule::WorkSchedule;

/// 08:00-12:00 / 13:00-17:00, the standard office day. Applied whenever the
/// employee type is missing or not in the table.
pub const DEFAULT_SCHEDULE: WorkSchedule = WorkSchedule {
    morning_start: 480,
    morning_end: 720,
    afternoon_start: 780,
    afternoon_end: 1020,
};

static SCHEDULES: Lazy<HashMap<&'static str, WorkSchedule>> = Lazy::new(|| {
    HashMap::from([
        ("regular", DEFAULT_SCHEDULE),
        ("probationary", DEFAULT_SCHEDULE),
        // Part-timers work a short afternoon, ending 15:00.
        (
            "part-time",
            WorkSchedule {
                morning_start: 480,
                morning_end: 720,
                afternoon_start: 780,
                afternoon_end: 900,
            },
        ),
        // Field staff start and end an hour later.
        (
            "field",
            WorkSchedule {
                morning_start: 540,
                morning_end: 780,
                afternoon_start: 840,
                afternoon_end: 1080,
            },
        ),
    ])
});

/// Resolves the work-day boundaries for an employee type. Unknown and absent
/// types fall back to the default schedule; lookup is case-insensitive.
pub fn get_schedule_in_minutes(employee_type: Option<&str>) -> WorkSchedule {
    employee_type
        .and_then(|t| SCHEDULES.get(t.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(DEFAULT_SCHEDULE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_resolve() {
        assert_eq!(get_schedule_in_minutes(Some("part-time")).afternoon_end, 900);
        assert_eq!(get_schedule_in_minutes(Some("field")).morning_start, 540);
        assert_eq!(get_schedule_in_minutes(Some("Regular")), DEFAULT_SCHEDULE);
    }

    #[test]
    fn unknown_or_missing_type_falls_back() {
        assert_eq!(get_schedule_in_minutes(Some("consultant")), DEFAULT_SCHEDULE);
        assert_eq!(get_schedule_in_minutes(None), DEFAULT_SCHEDULE);
    }
}
