use crate::api::attendance::{
    AttendanceAllResponse, AttendanceListResponse, AttendanceQuery, AttendanceRecordView,
    PunchRequest,
};
use crate::attendance::aggregate::Pagination;
use crate::attendance::timecalc::DayStatus;
use crate::model::attendance::{AttendanceStatus, DailyAttendanceRecord, UserInfo};
use crate::model::punch::PunchType;
use crate::model::schedule::WorkSchedule;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timekeeping API",
        version = "1.0.0",
        description = r#"
## Manila Timekeeping Service

Derives daily attendance from an append-only clock-punch log, under a fixed
Manila (UTC+8) wall clock.

### 🔹 Key Features
- **Punch Capture**
  - Append IN/OUT punches for a user
- **Attendance Aggregation**
  - One record per (user, Manila calendar day) with first-IN/last-OUT,
    hours worked, lateness and absence flags
- **Time Accounting**
  - Lateness and undertime computed against per-employee-type schedules

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::list_attendance,
        crate::api::attendance::list_all_attendance,
        crate::api::attendance::punch_in,
        crate::api::attendance::punch_out
    ),
    components(
        schemas(
            AttendanceQuery,
            AttendanceListResponse,
            AttendanceAllResponse,
            AttendanceRecordView,
            DayStatus,
            PunchRequest,
            DailyAttendanceRecord,
            AttendanceStatus,
            UserInfo,
            Pagination,
            PunchType,
            WorkSchedule
        )
    ),
    tags(
        (name = "Attendance", description = "Punch capture and attendance aggregation APIs"),
    )
)]
pub struct ApiDoc;
