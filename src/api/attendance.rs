use actix_web::{
    HttpResponse, Responder,
    error::{ErrorBadRequest, ErrorInternalServerError},
    web,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::attendance::aggregate::{
    Pagination, PunchFilter, aggregate_all_punches, aggregate_punches, fetch_punch_rows,
};
use crate::attendance::timecalc::{self, DayStatus};
use crate::manila;
use crate::model::attendance::DailyAttendanceRecord;
use crate::model::punch::PunchType;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceQuery {
    /// First Manila calendar day, "yyyy-MM-dd".
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub start_date: Option<String>,

    /// Last Manila calendar day, "yyyy-MM-dd".
    #[schema(example = "2024-03-31", value_type = String, format = "date")]
    pub end_date: Option<String>,

    #[schema(example = 42)]
    pub user_id: Option<u64>,

    #[schema(example = "Accounting")]
    pub department: Option<String>,

    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 20)]
    pub limit: Option<u32>,
}

/// An attendance record plus the display columns the admin and employee
/// tables render: lateness, undertime, status and Manila-local times.
#[derive(Serialize, ToSchema)]
pub struct AttendanceRecordView {
    #[serde(flatten)]
    pub record: DailyAttendanceRecord,

    #[schema(example = "10m")]
    pub late: String,

    #[schema(example = "-")]
    pub undertime: String,

    pub day_status: DayStatus,

    #[schema(example = 8.0, nullable = true)]
    pub hours: Option<f64>,

    #[schema(example = "Mar 04, 2024")]
    pub date_label: String,

    /// Explicit-offset ISO rendering, e.g. "2024-03-04T08:05:00.000+08:00".
    #[schema(nullable = true)]
    pub time_in_iso: Option<String>,

    #[schema(nullable = true)]
    pub time_out_iso: Option<String>,
}

impl From<DailyAttendanceRecord> for AttendanceRecordView {
    fn from(record: DailyAttendanceRecord) -> Self {
        let late = timecalc::calculate_late(&record);
        let undertime = timecalc::calculate_undertime(&record);
        let day_status = timecalc::day_status(&record);
        let hours = timecalc::worked_hours(&record);
        let date_label = manila::format_manila(record.date, "%b %d, %Y");
        let time_in_iso = record.time_in.map(manila::format_manila_iso);
        let time_out_iso = record.time_out.map(manila::format_manila_iso);
        Self {
            record,
            late,
            undertime,
            day_status,
            hours,
            date_label,
            time_in_iso,
            time_out_iso,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub records: Vec<AttendanceRecordView>,
    pub pagination: Pagination,
    #[schema(example = 12)]
    pub unique_employees: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceAllResponse {
    pub records: Vec<AttendanceRecordView>,
    #[schema(example = 12)]
    pub unique_employees: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct PunchRequest {
    #[schema(example = 42)]
    pub user_id: u64,
}

impl AttendanceQuery {
    /// Widens the requested dates to whole Manila calendar days.
    fn filter(&self) -> actix_web::Result<PunchFilter> {
        let start = match &self.start_date {
            Some(s) => Some(manila::manila_start_of_day(
                manila::parse_manila_local(s)
                    .ok_or_else(|| ErrorBadRequest(format!("invalid start_date {s:?}")))?,
            )),
            None => None,
        };
        let end = match &self.end_date {
            Some(s) => Some(manila::manila_end_of_day(
                manila::parse_manila_local(s)
                    .ok_or_else(|| ErrorBadRequest(format!("invalid end_date {s:?}")))?,
            )),
            None => None,
        };
        Ok(PunchFilter {
            start,
            end,
            user_id: self.user_id,
            department: self.department.clone(),
        })
    }
}

/// Paginated daily attendance derived from the punch log
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(
        ("start_date" = Option<String>, Query, description = "First Manila calendar day, yyyy-MM-dd"),
        ("end_date" = Option<String>, Query, description = "Last Manila calendar day, yyyy-MM-dd"),
        ("user_id" = Option<u64>, Query, description = "Restrict to one user"),
        ("department" = Option<String>, Query, description = "Restrict to a department"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Records per page")
    ),
    responses(
        (status = 200, description = "One record per (user, Manila day)", body = AttendanceListResponse),
        (status = 400, description = "Unparseable date filter"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let rows = fetch_punch_rows(pool.get_ref(), &query.filter()?)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch punch rows");
            ErrorInternalServerError("Database error")
        })?;

    let out = aggregate_punches(&rows, page, limit);
    for diagnostic in &out.diagnostics {
        warn!(%diagnostic, "Attendance aggregation substituted a value");
    }

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        records: out.records.into_iter().map(Into::into).collect(),
        pagination: out.pagination.unwrap_or(Pagination {
            page,
            limit,
            total: 0,
            pages: 0,
        }),
        unique_employees: out.unique_employees,
    }))
}

/// Unpaginated attendance, for exports and dashboards
#[utoipa::path(
    get,
    path = "/api/v1/attendance/all",
    params(
        ("start_date" = Option<String>, Query, description = "First Manila calendar day, yyyy-MM-dd"),
        ("end_date" = Option<String>, Query, description = "Last Manila calendar day, yyyy-MM-dd"),
        ("user_id" = Option<u64>, Query, description = "Restrict to one user"),
        ("department" = Option<String>, Query, description = "Restrict to a department")
    ),
    responses(
        (status = 200, description = "All matching records", body = AttendanceAllResponse),
        (status = 400, description = "Unparseable date filter"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_all_attendance(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let rows = fetch_punch_rows(pool.get_ref(), &query.filter()?)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch punch rows");
            ErrorInternalServerError("Database error")
        })?;

    let out = aggregate_all_punches(&rows);
    for diagnostic in &out.diagnostics {
        warn!(%diagnostic, "Attendance aggregation substituted a value");
    }

    Ok(HttpResponse::Ok().json(AttendanceAllResponse {
        records: out.records.into_iter().map(Into::into).collect(),
        unique_employees: out.unique_employees,
    }))
}

/// Punch in
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch-in",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Punched in", body = Object, example = json!({
            "message": "Punched in"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn punch_in(
    pool: web::Data<MySqlPool>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<impl Responder> {
    record_punch(pool.get_ref(), payload.user_id, PunchType::In).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Punched in" })))
}

/// Punch out
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch-out",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Punched out", body = Object, example = json!({
            "message": "Punched out"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn punch_out(
    pool: web::Data<MySqlPool>,
    payload: web::Json<PunchRequest>,
) -> actix_web::Result<impl Responder> {
    record_punch(pool.get_ref(), payload.user_id, PunchType::Out).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Punched out" })))
}

// The punch log is append-only: no same-day uniqueness, multi-session days
// are expected and collapsed later by the aggregator.
async fn record_punch(
    pool: &MySqlPool,
    user_id: u64,
    punch_type: PunchType,
) -> actix_web::Result<()> {
    sqlx::query("INSERT INTO punches (user_id, timestamp, punch_type) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(Utc::now())
        .bind(punch_type)
        .execute(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id, punch = %punch_type, "Failed to record punch");
            ErrorInternalServerError("Internal Server Error")
        })?;
    Ok(())
}
