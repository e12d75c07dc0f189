use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::ToSchema;

use crate::manila;
use crate::model::attendance::{AttendanceStatus, DailyAttendanceRecord, UserInfo};
use crate::model::punch::{PunchRow, PunchType};

/// Lateness policy for punch-derived records: fixed 08:00 plus 15 minutes of
/// grace, regardless of the employee-type schedule. The calculator in
/// `timecalc` applies the schedule with no grace instead; the two policies
/// are kept divergent on purpose, pending a product decision.
pub const WORKDAY_START_HOUR: u32 = 8;
pub const LATE_GRACE_MINUTES: u32 = 15;

/// Row selection for a fetch. `start`/`end` are inclusive UTC instants,
/// normally the Manila day bounds of the requested date range.
#[derive(Debug, Clone, Default)]
pub struct PunchFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub user_id: Option<u64>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub limit: u32,
    #[schema(example = 57)]
    pub total: i64,
    #[schema(example = 3)]
    pub pages: i64,
}

/// Output of one aggregation pass. `diagnostics` is the side channel for
/// rows that needed a substituted value; callers log it, the batch itself
/// never fails on a bad row.
#[derive(Debug)]
pub struct Aggregated {
    pub records: Vec<DailyAttendanceRecord>,
    pub pagination: Option<Pagination>,
    pub unique_employees: i64,
    pub diagnostics: Vec<String>,
}

/// Fetches punches joined with user attributes, bounded to whole Manila
/// calendar days. Punches are immutable once written, so a plain read needs
/// no transaction; fetch errors surface to the caller.
pub async fn fetch_punch_rows(pool: &MySqlPool, filter: &PunchFilter) -> Result<Vec<PunchRow>> {
    let mut conditions: Vec<&str> = Vec::new();

    if filter.start.is_some() {
        conditions.push("p.timestamp >= ?");
    }
    if filter.end.is_some() {
        conditions.push("p.timestamp <= ?");
    }
    if filter.user_id.is_some() {
        conditions.push("p.user_id = ?");
    }
    if filter.department.is_some() {
        conditions.push("u.department = ?");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT p.user_id, p.timestamp, p.punch_type, \
                u.first_name, u.last_name, u.employee_code, u.department, u.position, u.employee_type \
         FROM punches p \
         JOIN users u ON u.id = p.user_id \
         {} ORDER BY p.timestamp ASC",
        where_clause
    );
    debug!(sql = %sql, filter = ?filter, "Fetching punch rows");

    let mut query = sqlx::query_as::<_, PunchRow>(&sql);
    if let Some(start) = filter.start {
        query = query.bind(start);
    }
    if let Some(end) = filter.end {
        query = query.bind(end);
    }
    if let Some(user_id) = filter.user_id {
        query = query.bind(user_id);
    }
    if let Some(department) = &filter.department {
        query = query.bind(department);
    }

    query
        .fetch_all(pool)
        .await
        .context("failed to fetch punch rows")
}

/// Groups punches into one record per (user, Manila day) and paginates.
/// Ordering is day descending, then last name, first name, user id — stable
/// across repeated calls against an unchanging punch log.
pub fn aggregate_punches(rows: &[PunchRow], page: u32, limit: u32) -> Aggregated {
    let page = page.max(1);
    let (mut groups, unique_employees) = group_rows(rows);
    sort_groups(&mut groups);

    let total = groups.len() as i64;
    let pages = if limit == 0 {
        0
    } else {
        (total + limit as i64 - 1) / limit as i64
    };
    let offset = ((page - 1) as usize).saturating_mul(limit as usize);

    let mut diagnostics = Vec::new();
    let records = groups
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .map(|g| derive_record(g, &mut diagnostics))
        .collect();

    Aggregated {
        records,
        pagination: Some(Pagination {
            page,
            limit,
            total,
            pages,
        }),
        unique_employees,
        diagnostics,
    }
}

/// Unpaginated variant used by exports and the employee dashboard.
pub fn aggregate_all_punches(rows: &[PunchRow]) -> Aggregated {
    let (mut groups, unique_employees) = group_rows(rows);
    sort_groups(&mut groups);

    let mut diagnostics = Vec::new();
    let records = groups
        .into_iter()
        .map(|g| derive_record(g, &mut diagnostics))
        .collect();

    Aggregated {
        records,
        pagination: None,
        unique_employees,
        diagnostics,
    }
}

struct DayGroup {
    user_id: u64,
    day_key: String,
    time_in: Option<DateTime<Utc>>,
    time_out: Option<DateTime<Utc>>,
    in_count: u32,
    out_count: u32,
    user: UserInfo,
}

fn group_rows(rows: &[PunchRow]) -> (Vec<DayGroup>, i64) {
    let mut groups: BTreeMap<(u64, String), DayGroup> = BTreeMap::new();

    for row in rows {
        let day_key = manila::manila_date_key(row.timestamp);
        let group = groups
            .entry((row.user_id, day_key.clone()))
            .or_insert_with(|| DayGroup {
                user_id: row.user_id,
                day_key,
                time_in: None,
                time_out: None,
                in_count: 0,
                out_count: 0,
                user: UserInfo {
                    first_name: row.first_name.clone(),
                    last_name: row.last_name.clone(),
                    employee_code: row.employee_code.clone(),
                    department: row.department.clone(),
                    position: row.position.clone(),
                    employee_type: row.employee_type.clone(),
                },
            });

        // First IN opens the day, last OUT closes it; anything between is
        // only counted.
        match row.punch_type {
            PunchType::In => {
                group.in_count += 1;
                group.time_in = Some(group.time_in.map_or(row.timestamp, |t| t.min(row.timestamp)));
            }
            PunchType::Out => {
                group.out_count += 1;
                group.time_out =
                    Some(group.time_out.map_or(row.timestamp, |t| t.max(row.timestamp)));
            }
        }
    }

    let unique: BTreeSet<u64> = groups.keys().map(|(user_id, _)| *user_id).collect();
    (groups.into_values().collect(), unique.len() as i64)
}

fn sort_groups(groups: &mut [DayGroup]) {
    groups.sort_by(|a, b| {
        b.day_key
            .cmp(&a.day_key)
            .then_with(|| a.user.last_name.cmp(&b.user.last_name))
            .then_with(|| a.user.first_name.cmp(&b.user.first_name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

fn derive_record(group: DayGroup, diagnostics: &mut Vec<String>) -> DailyAttendanceRecord {
    let day = resolve_day_date(&group.day_key, group.user_id, diagnostics);

    // A pair where OUT precedes or equals IN means clock skew or a punch
    // missing across the day boundary; no hours rather than a bogus value.
    let hours_worked = match (group.time_in, group.time_out) {
        (Some(time_in), Some(time_out)) if time_out > time_in => {
            let hours = (time_out - time_in).num_milliseconds() as f64 / 3_600_000.0;
            Some((hours * 100.0).round() / 100.0)
        }
        _ => None,
    };

    let is_late = group
        .time_in
        .is_some_and(|t| manila::is_late_in_manila(t, WORKDAY_START_HOUR, LATE_GRACE_MINUTES));

    DailyAttendanceRecord {
        id: format!("punch:{}:{}", group.user_id, group.day_key),
        user_id: group.user_id,
        date: manila::date_at_utc_noon(day),
        time_in: group.time_in,
        time_out: group.time_out,
        morning_time_in: None,
        morning_time_out: None,
        afternoon_time_in: None,
        afternoon_time_out: None,
        hours_worked,
        is_late,
        is_absent: group.time_in.is_none(),
        late_minutes: None,
        undertime_minutes: None,
        in_count: group.in_count,
        out_count: group.out_count,
        status: AttendanceStatus::Approved,
        user: group.user,
    }
}

/// Best-effort day resolution: a malformed day key must not sink the whole
/// batch, so the row lands on today's Manila day and the problem goes into
/// the diagnostics list for the caller to log.
fn resolve_day_date(day_key: &str, user_id: u64, diagnostics: &mut Vec<String>) -> NaiveDate {
    match manila::parse_day_key(day_key) {
        Some(day) => day,
        None => {
            diagnostics.push(format!(
                "unparseable day key {day_key:?} for user {user_id}, substituting today"
            ));
            manila::manila_date(Utc::now())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn row(user_id: u64, ts: &str, punch_type: PunchType) -> PunchRow {
        named_row(user_id, "Juan", "Dela Cruz", ts, punch_type)
    }

    fn named_row(
        user_id: u64,
        first: &str,
        last: &str,
        ts: &str,
        punch_type: PunchType,
    ) -> PunchRow {
        PunchRow {
            user_id,
            timestamp: utc(ts),
            punch_type,
            first_name: first.to_string(),
            last_name: last.to_string(),
            employee_code: Some(format!("EMP-{user_id:04}")),
            department: Some("Accounting".to_string()),
            position: None,
            employee_type: Some("regular".to_string()),
        }
    }

    #[test]
    fn full_day_scenario() {
        // 08:05 and 16:05 Manila on 2024-03-04.
        let rows = vec![
            row(1, "2024-03-04T00:05:00Z", PunchType::In),
            row(1, "2024-03-04T08:05:00Z", PunchType::Out),
        ];
        let out = aggregate_punches(&rows, 1, 20);
        assert_eq!(out.records.len(), 1);

        let record = &out.records[0];
        assert_eq!(record.id, "punch:1:2024-03-04");
        assert_eq!(record.date, utc("2024-03-04T12:00:00Z"));
        assert_eq!(record.time_in, Some(utc("2024-03-04T00:05:00Z")));
        assert_eq!(record.time_out, Some(utc("2024-03-04T08:05:00Z")));
        assert_eq!(record.hours_worked, Some(8.0));
        assert!(!record.is_late, "08:05 is inside the 15-minute grace");
        assert!(!record.is_absent);
        assert_eq!(record.status, AttendanceStatus::Approved);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn one_record_per_user_and_manila_day() {
        // Punches straddling 16:00Z belong to two different Manila days.
        let rows = vec![
            row(1, "2024-03-04T01:00:00Z", PunchType::In),
            row(1, "2024-03-04T09:00:00Z", PunchType::Out),
            row(1, "2024-03-04T16:30:00Z", PunchType::In),
            row(2, "2024-03-04T01:00:00Z", PunchType::In),
        ];
        let out = aggregate_all_punches(&rows);
        assert_eq!(out.records.len(), 3);

        let mut keys: Vec<(u64, DateTime<Utc>)> = out
            .records
            .iter()
            .map(|r| (r.user_id, r.date))
            .collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before, "duplicate (user, day) key emitted");
        assert_eq!(out.unique_employees, 2);
    }

    #[test]
    fn multiple_sessions_collapse_to_first_in_last_out() {
        let rows = vec![
            row(1, "2024-03-04T00:00:00Z", PunchType::In),
            row(1, "2024-03-04T04:00:00Z", PunchType::Out),
            row(1, "2024-03-04T05:00:00Z", PunchType::In),
            row(1, "2024-03-04T09:00:00Z", PunchType::Out),
        ];
        let out = aggregate_all_punches(&rows);
        let record = &out.records[0];
        assert_eq!(record.time_in, Some(utc("2024-03-04T00:00:00Z")));
        assert_eq!(record.time_out, Some(utc("2024-03-04T09:00:00Z")));
        assert_eq!(record.in_count, 2);
        assert_eq!(record.out_count, 2);
        assert_eq!(record.hours_worked, Some(9.0));
    }

    #[test]
    fn out_only_day_is_absent_with_no_hours() {
        let rows = vec![
            row(1, "2024-03-04T09:00:00Z", PunchType::Out),
            row(1, "2024-03-04T10:00:00Z", PunchType::Out),
        ];
        let out = aggregate_all_punches(&rows);
        let record = &out.records[0];
        assert!(record.is_absent);
        assert!(!record.is_late);
        assert_eq!(record.hours_worked, None);
        assert_eq!(record.out_count, 2);
    }

    #[test]
    fn out_before_in_yields_no_hours() {
        let rows = vec![
            row(1, "2024-03-04T09:00:00Z", PunchType::In),
            row(1, "2024-03-04T01:00:00Z", PunchType::Out),
        ];
        let out = aggregate_all_punches(&rows);
        let record = &out.records[0];
        assert_eq!(record.hours_worked, None);
        assert!(!record.is_absent);
    }

    #[test]
    fn late_threshold_is_fixed_0815_manila() {
        // 08:16 Manila: one minute past the grace boundary.
        let late = vec![row(1, "2024-03-04T00:16:00Z", PunchType::In)];
        assert!(aggregate_all_punches(&late).records[0].is_late);

        // 08:15 exactly is still on time.
        let on_time = vec![row(1, "2024-03-04T00:15:00Z", PunchType::In)];
        assert!(!aggregate_all_punches(&on_time).records[0].is_late);
    }

    #[test]
    fn orders_day_desc_then_name_asc() {
        let rows = vec![
            named_row(1, "Ana", "Reyes", "2024-03-04T01:00:00Z", PunchType::In),
            named_row(2, "Ben", "Cruz", "2024-03-04T01:00:00Z", PunchType::In),
            named_row(3, "Carla", "Cruz", "2024-03-04T01:00:00Z", PunchType::In),
            named_row(1, "Ana", "Reyes", "2024-03-05T01:00:00Z", PunchType::In),
        ];
        let out = aggregate_all_punches(&rows);
        let order: Vec<(String, u64)> = out
            .records
            .iter()
            .map(|r| (r.user.last_name.clone(), r.user_id))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Reyes".to_string(), 1), // newest day first
                ("Cruz".to_string(), 2),
                ("Cruz".to_string(), 3),
                ("Reyes".to_string(), 1),
            ]
        );
    }

    #[test]
    fn pagination_slices_and_counts() {
        let mut rows = Vec::new();
        for day in 1..=5 {
            rows.push(row(1, &format!("2024-03-0{day}T01:00:00Z"), PunchType::In));
        }
        let out = aggregate_punches(&rows, 2, 2);
        let pagination = out.pagination.unwrap();
        assert_eq!(pagination.total, 5);
        assert_eq!(pagination.pages, 3);
        assert_eq!(out.records.len(), 2);
        // Day desc: page 2 of 2-per-page holds days 3 and 2.
        assert_eq!(out.records[0].date, utc("2024-03-03T12:00:00Z"));
        assert_eq!(out.records[1].date, utc("2024-03-02T12:00:00Z"));
        assert_eq!(out.unique_employees, 1);
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let rows = vec![row(1, "2024-03-04T01:00:00Z", PunchType::In)];
        let out = aggregate_punches(&rows, 9, 20);
        assert!(out.records.is_empty());
        assert_eq!(out.pagination.unwrap().total, 1);
    }

    #[test]
    fn bad_day_key_substitutes_today_and_reports() {
        let mut diagnostics = Vec::new();
        let day = resolve_day_date("garbage", 7, &mut diagnostics);
        assert_eq!(day, manila::manila_date(Utc::now()));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("garbage"));
        assert!(diagnostics[0].contains('7'));
    }

    #[test]
    fn empty_input_is_an_empty_batch() {
        let out = aggregate_punches(&[], 1, 20);
        assert!(out.records.is_empty());
        assert_eq!(out.unique_employees, 0);
        assert_eq!(out.pagination.unwrap().total, 0);
    }
}
