use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Work-day boundaries for one employee type, as minutes past Manila
/// midnight, each in [0, 1440).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "morning_start": 480,
    "morning_end": 720,
    "afternoon_start": 780,
    "afternoon_end": 1020
}))]
pub struct WorkSchedule {
    #[schema(example = 480)]
    pub morning_start: u32,

    #[schema(example = 720)]
    pub morning_end: u32,

    #[schema(example = 780)]
    pub afternoon_start: u32,

    #[schema(example = 1020)]
    pub afternoon_end: u32,
}
