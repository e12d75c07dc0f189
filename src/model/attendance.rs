use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Approval state of a stored attendance day. Punch-derived records skip the
/// approval workflow entirely and are always `Approved`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    #[schema(example = "Maria")]
    pub first_name: String,

    #[schema(example = "Santos")]
    pub last_name: String,

    #[schema(example = "EMP-0012", nullable = true)]
    pub employee_code: Option<String>,

    #[schema(example = "Accounting", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Payroll Officer", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "regular", nullable = true)]
    pub employee_type: Option<String>,
}

/// One attendance day for one user, keyed by (user, Manila calendar day).
///
/// Two shapes flow through here: legacy single-session records carrying only
/// `time_in`/`time_out`, and dual-session records with separate morning and
/// afternoon pairs. Punch-derived records always use the legacy pair.
/// `late_minutes`/`undertime_minutes` are precomputed values from the
/// materialized table; when present and positive they take precedence over
/// recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyAttendanceRecord {
    /// Synthetic composite key, e.g. "punch:42:2024-03-04". Derived records
    /// have no identity beyond the grouping key.
    #[schema(example = "punch:42:2024-03-04")]
    pub id: String,

    #[schema(example = 42)]
    pub user_id: u64,

    /// The Manila calendar day, rendered at noon UTC of that date so viewer
    /// timezones cannot roll it to an adjacent day.
    #[schema(example = "2024-03-04T12:00:00Z", value_type = String, format = "date-time")]
    pub date: DateTime<Utc>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub time_in: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub time_out: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub morning_time_in: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub morning_time_out: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub afternoon_time_in: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub afternoon_time_out: Option<DateTime<Utc>>,

    #[schema(example = 8.0, nullable = true)]
    pub hours_worked: Option<f64>,

    #[schema(example = false)]
    pub is_late: bool,

    #[schema(example = false)]
    pub is_absent: bool,

    #[schema(example = 10, nullable = true)]
    pub late_minutes: Option<i64>,

    #[schema(example = 20, nullable = true)]
    pub undertime_minutes: Option<i64>,

    /// Raw punch counts for the day, kept for audit display only.
    #[schema(example = 2)]
    pub in_count: u32,

    #[schema(example = 2)]
    pub out_count: u32,

    pub status: AttendanceStatus,

    pub user: UserInfo,
}
