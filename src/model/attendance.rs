use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::timezone::{combine_utc, to_display};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// One row per user and UTC calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    pub attendance_date: NaiveDate,
    pub check_in_time: NaiveTime,
    /// `None` until the user checks out.
    pub check_out_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }

    pub fn check_in_at(&self) -> DateTime<Utc> {
        combine_utc(self.attendance_date, self.check_in_time)
    }

    pub fn worked_minutes(&self) -> Option<i64> {
        self.check_out_time
            .map(|out| worked_minutes(self.check_in_time, out))
    }

    pub fn into_response(self, zone: FixedOffset) -> AttendanceResponse {
        let check_in_display = to_display(self.check_in_at(), zone);
        let check_out_display = self.check_out_time.map(|out| {
            let mut at = combine_utc(self.attendance_date, out);
            if out < self.check_in_time {
                at += chrono::Duration::days(1);
            }
            to_display(at, zone)
        });

        AttendanceResponse {
            worked_minutes: self.worked_minutes(),
            id: self.id,
            user_id: self.user_id,
            attendance_date: self.attendance_date,
            check_in_time: self.check_in_time,
            check_out_time: self.check_out_time,
            check_in_display,
            check_out_display,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Minutes between check-in and check-out. A check-out earlier than the
/// check-in crossed UTC midnight.
pub fn worked_minutes(check_in: NaiveTime, check_out: NaiveTime) -> i64 {
    let diff = (check_out - check_in).num_minutes();
    if diff < 0 { diff + MINUTES_PER_DAY } else { diff }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 10,
    "user_id": 1,
    "attendance_date": "2024-03-01",
    "check_in_time": "01:58:00",
    "check_out_time": "11:02:00",
    "check_in_display": "2024-03-01 08:58:00 +07:00",
    "check_out_display": "2024-03-01 18:02:00 +07:00",
    "worked_minutes": 544,
    "created_at": "2024-03-01T01:58:00Z",
    "updated_at": "2024-03-01T11:02:00Z"
}))]
pub struct AttendanceResponse {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub attendance_date: NaiveDate,
    /// UTC time of day
    #[schema(value_type = String)]
    pub check_in_time: NaiveTime,
    /// UTC time of day, null while checked in
    #[schema(value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
    pub check_in_display: String,
    pub check_out_display: Option<String>,
    pub worked_minutes: Option<i64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// Admin correction of a row. Absent fields are left unchanged;
/// `clear_check_out` re-opens the day.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(value_type = Option<String>, format = "date", example = "2024-03-01")]
    pub attendance_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "02:00:00")]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "11:00:00")]
    pub check_out_time: Option<NaiveTime>,
    #[serde(default)]
    pub clear_check_out: bool,
}
