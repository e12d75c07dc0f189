use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Direction of a clock punch. Stored as "IN"/"OUT" in the punch log.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
    sqlx::Type,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PunchType {
    In,
    Out,
}

/// One punch joined with the attributes of the user who made it. Punches are
/// append-only; this row is read-only to the aggregation code.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PunchRow {
    pub user_id: u64,
    pub timestamp: DateTime<Utc>,
    pub punch_type: PunchType,
    pub first_name: String,
    pub last_name: String,
    pub employee_code: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub employee_type: Option<String>,
}
