//! Check-in/check-out and attendance reporting.
//!
//! A user has at most one row per UTC calendar day. The unique index
//! `ux_attendance_user_date` is the authority for that rule: concurrent
//! check-ins race on the insert and the loser gets a conflict.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, conflict_as},
    model::attendance::{Attendance, AttendanceResponse, UpdateAttendance, worked_minutes},
    service::user,
    utils::{
        db_utils::{Filter, FilterValue},
        pagination::{Paginated, Pagination},
    },
};

const ALREADY_CHECKED_IN: &str = "Already checked in today";
const NO_OPEN_CHECK_IN: &str = "No active check-in found for today";
const DAY_TAKEN: &str = "User already has an attendance record for that date";

const SELECT_ATTENDANCE: &str = r#"
    SELECT id, user_id, attendance_date, check_in_time, check_out_time, created_at, updated_at
    FROM attendance a
"#;

/// What a punch does given today's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchAction {
    CheckIn,
    CheckOut(u64),
    AlreadyComplete,
}

pub fn next_action(today: Option<&Attendance>) -> PunchAction {
    match today {
        None => PunchAction::CheckIn,
        Some(row) if row.is_open() => PunchAction::CheckOut(row.id),
        Some(_) => PunchAction::AlreadyComplete,
    }
}

/// Yesterday's row still open less than 24 hours after its check-in.
///
/// A check-out at `time` today lands earlier in the day than the check-in, so
/// the row reads as a shift across UTC midnight. Older open rows are stale.
pub fn overnight_open(yesterday: Option<&Attendance>, time: NaiveTime) -> Option<&Attendance> {
    yesterday.filter(|row| row.is_open() && time < row.check_in_time)
}

/// Today's row decides; with none, an overnight row from yesterday is closed first.
pub fn punch_action(
    today: Option<&Attendance>,
    yesterday: Option<&Attendance>,
    time: NaiveTime,
) -> PunchAction {
    if today.is_none() {
        if let Some(row) = overnight_open(yesterday, time) {
            return PunchAction::CheckOut(row.id);
        }
    }
    next_action(today)
}

/// Check-out time to store for an automatic punch.
///
/// `00:00:00` is the legacy "not checked out" marker that startup repair
/// clears, so a punch at exactly midnight is recorded one second later.
pub fn stored_check_out(time: NaiveTime) -> NaiveTime {
    if time == NaiveTime::MIN {
        time + Duration::seconds(1)
    } else {
        time
    }
}

#[derive(Debug)]
pub enum PunchOutcome {
    CheckedIn(Attendance),
    CheckedOut(Attendance),
}

/// UTC day and second-precision time of day, matching the DATE/TIME columns.
pub fn split_instant(now: DateTime<Utc>) -> (NaiveDate, NaiveTime) {
    let time = now.time();
    let time = time.with_nanosecond(0).unwrap_or(time);
    (now.date_naive(), time)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AppResult<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::InvalidInput("'from' must not be after 'to'".into()));
            }
        }
        Ok(Self { from, to })
    }

    fn apply(&self, filter: &mut Filter) {
        if let Some(from) = self.from {
            filter.and("a.attendance_date >= ?", [FilterValue::Date(from)]);
        }
        if let Some(to) = self.to {
            filter.and("a.attendance_date <= ?", [FilterValue::Date(to)]);
        }
    }
}

pub async fn find_for_day(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> AppResult<Option<Attendance>> {
    let row = sqlx::query_as::<_, Attendance>(&format!(
        "{} WHERE a.user_id = ? AND a.attendance_date = ?",
        SELECT_ATTENDANCE
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Today's and yesterday's rows for `user_id`, in that order.
async fn recent_rows(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> AppResult<(Option<Attendance>, Option<Attendance>)> {
    let Some(yesterday) = date.pred_opt() else {
        return Ok((find_for_day(pool, user_id, date).await?, None));
    };

    let rows = sqlx::query_as::<_, Attendance>(&format!(
        "{} WHERE a.user_id = ? AND a.attendance_date IN (?, ?) ORDER BY a.attendance_date DESC",
        SELECT_ATTENDANCE
    ))
    .bind(user_id)
    .bind(date)
    .bind(yesterday)
    .fetch_all(pool)
    .await?;

    let mut today = None;
    let mut previous = None;
    for row in rows {
        if row.attendance_date == date {
            today = Some(row);
        } else {
            previous = Some(row);
        }
    }
    Ok((today, previous))
}

/// Today's row, or yesterday's when it is still open overnight.
pub async fn today(
    pool: &MySqlPool,
    user_id: u64,
    now: DateTime<Utc>,
) -> AppResult<Option<Attendance>> {
    let (date, time) = split_instant(now);
    let (today, yesterday) = recent_rows(pool, user_id, date).await?;
    if today.is_some() {
        return Ok(today);
    }
    Ok(overnight_open(yesterday.as_ref(), time).cloned())
}

pub async fn check_in(pool: &MySqlPool, user_id: u64, now: DateTime<Utc>) -> AppResult<Attendance> {
    let (date, time) = split_instant(now);

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (user_id, attendance_date, check_in_time, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(time)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(conflict_as(ALREADY_CHECKED_IN))?;

    info!(user_id, date = %date, "Checked in");
    get(pool, result.last_insert_id()).await
}

async fn close_row(pool: &MySqlPool, id: u64, now: DateTime<Utc>) -> AppResult<Attendance> {
    let (_, time) = split_instant(now);

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out_time = ?, updated_at = ?
        WHERE id = ?
        AND check_out_time IS NULL
        "#,
    )
    .bind(stored_check_out(time))
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    // a concurrent check-out got there first
    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(NO_OPEN_CHECK_IN.into()));
    }

    let row = get(pool, id).await?;
    info!(user_id = row.user_id, date = %row.attendance_date, "Checked out");
    Ok(row)
}

/// Closes today's open row, or yesterday's when the shift crossed midnight.
pub async fn check_out(pool: &MySqlPool, user_id: u64, now: DateTime<Utc>) -> AppResult<Attendance> {
    let (date, time) = split_instant(now);
    let (today, yesterday) = recent_rows(pool, user_id, date).await?;

    match punch_action(today.as_ref(), yesterday.as_ref(), time) {
        PunchAction::CheckOut(id) => close_row(pool, id, now).await,
        PunchAction::CheckIn | PunchAction::AlreadyComplete => {
            Err(AppError::Conflict(NO_OPEN_CHECK_IN.into()))
        }
    }
}

/// Check in when there is nothing open, otherwise check out.
pub async fn punch(pool: &MySqlPool, user_id: u64, now: DateTime<Utc>) -> AppResult<PunchOutcome> {
    let (date, time) = split_instant(now);
    let (today, yesterday) = recent_rows(pool, user_id, date).await?;

    match punch_action(today.as_ref(), yesterday.as_ref(), time) {
        PunchAction::CheckIn => check_in(pool, user_id, now).await.map(PunchOutcome::CheckedIn),
        PunchAction::CheckOut(id) => close_row(pool, id, now).await.map(PunchOutcome::CheckedOut),
        PunchAction::AlreadyComplete => Err(AppError::Conflict(
            "Attendance for today is already complete".into(),
        )),
    }
}

pub async fn history(
    pool: &MySqlPool,
    user_id: u64,
    range: DateRange,
    pagination: Pagination,
) -> AppResult<Paginated<Attendance>> {
    let mut filter = Filter::new();
    filter.and("a.user_id = ?", [FilterValue::U64(user_id)]);
    range.apply(&mut filter);

    let count_sql = format!("SELECT COUNT(*) FROM attendance a{}", filter.where_sql());
    let total = filter
        .bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql))
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "{}{} ORDER BY a.attendance_date DESC LIMIT ? OFFSET ?",
        SELECT_ATTENDANCE,
        filter.where_sql()
    );
    let rows = filter
        .bind_as(sqlx::query_as::<_, Attendance>(&data_sql))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    Ok(Paginated::new(rows, pagination, total))
}

#[derive(Debug, Default)]
pub struct DetailedFilter {
    pub user_id: Option<u64>,
    pub department_id: Option<u64>,
    pub range: DateRange,
    pub open_only: bool,
    pub search: Option<String>,
}

impl DetailedFilter {
    fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(id) = self.user_id {
            filter.and("a.user_id = ?", [FilterValue::U64(id)]);
        }
        if let Some(id) = self.department_id {
            filter.and("u.department_id = ?", [FilterValue::U64(id)]);
        }
        self.range.apply(&mut filter);
        if self.open_only {
            filter.and("a.check_out_time IS NULL", std::iter::empty());
        }
        if let Some(search) = &self.search {
            filter.search(&["u.first_name", "u.last_name", "u.email"], search);
        }
        filter
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DetailedRow {
    id: u64,
    user_id: u64,
    attendance_date: NaiveDate,
    check_in_time: NaiveTime,
    check_out_time: Option<NaiveTime>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    first_name: String,
    last_name: String,
    email: String,
    department_id: Option<u64>,
    department_name: Option<String>,
}

/// Attendance row with the owner's name and department.
#[derive(Debug, Serialize, ToSchema)]
pub struct DetailedAttendance {
    #[serde(flatten)]
    pub attendance: AttendanceResponse,
    #[schema(example = "Jane Doe")]
    pub user_name: String,
    pub email: String,
    pub department_id: Option<u64>,
    pub department_name: Option<String>,
}

impl DetailedRow {
    fn into_detailed(self, zone: FixedOffset) -> DetailedAttendance {
        let attendance = Attendance {
            id: self.id,
            user_id: self.user_id,
            attendance_date: self.attendance_date,
            check_in_time: self.check_in_time,
            check_out_time: self.check_out_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        DetailedAttendance {
            attendance: attendance.into_response(zone),
            user_name: format!("{} {}", self.first_name, self.last_name),
            email: self.email,
            department_id: self.department_id,
            department_name: self.department_name,
        }
    }
}

pub async fn detailed(
    pool: &MySqlPool,
    filter: &DetailedFilter,
    pagination: Pagination,
    zone: FixedOffset,
) -> AppResult<Paginated<DetailedAttendance>> {
    let filter = filter.to_filter();
    let from = r#"
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        LEFT JOIN departments d ON d.id = u.department_id
    "#;

    let count_sql = format!("SELECT COUNT(*) {}{}", from, filter.where_sql());
    debug!(sql = %count_sql, args = ?filter.args(), "Counting attendance");
    let total = filter
        .bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql))
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        r#"
        SELECT
            a.id, a.user_id, a.attendance_date, a.check_in_time, a.check_out_time,
            a.created_at, a.updated_at,
            u.first_name, u.last_name, u.email, u.department_id,
            d.name AS department_name
        {}{}
        ORDER BY a.attendance_date DESC, a.check_in_time DESC
        LIMIT ? OFFSET ?
        "#,
        from,
        filter.where_sql()
    );
    let rows = filter
        .bind_as(sqlx::query_as::<_, DetailedRow>(&data_sql))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(pool)
        .await?;

    Ok(Paginated::new(rows, pagination, total).map(|row| row.into_detailed(zone)))
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct AttendanceSummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    /// Active users
    pub total_users: i64,
    /// Users with a row for the day
    pub present: i64,
    pub checked_out: i64,
    pub still_in: i64,
    pub absent: i64,
}

impl AttendanceSummary {
    pub fn from_counts(date: NaiveDate, total_users: i64, present: i64, checked_out: i64) -> Self {
        Self {
            date,
            total_users,
            present,
            checked_out,
            still_in: (present - checked_out).max(0),
            absent: (total_users - present).max(0),
        }
    }
}

pub async fn summary(pool: &MySqlPool, date: NaiveDate) -> AppResult<AttendanceSummary> {
    let total_users = user::count(pool).await?;

    let (present, checked_out) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COUNT(a.check_out_time)
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.attendance_date = ? AND u.is_active = TRUE
        "#,
    )
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(AttendanceSummary::from_counts(date, total_users, present, checked_out))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub user_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub department_name: Option<String>,
    pub check_in_time: NaiveTime,
    pub check_out_time: Option<NaiveTime>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserAttendanceReport {
    pub user_id: u64,
    #[schema(example = "Jane Doe")]
    pub user_name: String,
    pub department_name: Option<String>,
    /// Days with a check-in
    pub days_present: i64,
    /// Days still missing a check-out
    pub open_days: i64,
    pub total_worked_minutes: i64,
    /// Average over closed days
    pub average_worked_minutes: Option<i64>,
}

/// Folds attendance rows into one line per user, keeping first-seen order.
pub fn build_report(rows: Vec<ReportRow>) -> Vec<UserAttendanceReport> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut reports: Vec<UserAttendanceReport> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.user_id).or_insert_with(|| {
            reports.push(UserAttendanceReport {
                user_id: row.user_id,
                user_name: format!("{} {}", row.first_name, row.last_name),
                department_name: row.department_name.clone(),
                days_present: 0,
                open_days: 0,
                total_worked_minutes: 0,
                average_worked_minutes: None,
            });
            reports.len() - 1
        });

        let report = &mut reports[slot];
        report.days_present += 1;
        match row.check_out_time {
            Some(out) => report.total_worked_minutes += worked_minutes(row.check_in_time, out),
            None => report.open_days += 1,
        }
    }

    for report in &mut reports {
        let closed = report.days_present - report.open_days;
        if closed > 0 {
            report.average_worked_minutes = Some(report.total_worked_minutes / closed);
        }
    }

    reports
}

pub async fn report(
    pool: &MySqlPool,
    range: DateRange,
    department_id: Option<u64>,
) -> AppResult<Vec<UserAttendanceReport>> {
    let mut filter = Filter::new();
    range.apply(&mut filter);
    if let Some(id) = department_id {
        filter.and("u.department_id = ?", [FilterValue::U64(id)]);
    }

    let sql = format!(
        r#"
        SELECT a.user_id, u.first_name, u.last_name, d.name AS department_name,
               a.check_in_time, a.check_out_time
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        LEFT JOIN departments d ON d.id = u.department_id
        {}
        ORDER BY u.last_name, u.first_name, a.user_id, a.attendance_date
        "#,
        filter.where_sql()
    );
    let rows = filter
        .bind_as(sqlx::query_as::<_, ReportRow>(&sql))
        .fetch_all(pool)
        .await?;

    Ok(build_report(rows))
}

pub async fn get(pool: &MySqlPool, id: u64) -> AppResult<Attendance> {
    sqlx::query_as::<_, Attendance>(&format!("{} WHERE a.id = ?", SELECT_ATTENDANCE))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance".into()))
}

/// Resulting (date, check-in, check-out) after an admin correction.
pub fn apply_correction(
    existing: &Attendance,
    changes: &UpdateAttendance,
) -> AppResult<(NaiveDate, NaiveTime, Option<NaiveTime>)> {
    if changes.clear_check_out && changes.check_out_time.is_some() {
        return Err(AppError::InvalidInput(
            "Use either check_out_time or clear_check_out, not both".into(),
        ));
    }

    if changes.check_out_time == Some(NaiveTime::MIN) {
        return Err(AppError::InvalidInput(
            "check_out_time 00:00:00 is reserved; use 00:00:01 or clear_check_out".into(),
        ));
    }

    let date = changes.attendance_date.unwrap_or(existing.attendance_date);
    let check_in = changes.check_in_time.unwrap_or(existing.check_in_time);
    let check_out = if changes.clear_check_out {
        None
    } else {
        changes.check_out_time.or(existing.check_out_time)
    };

    Ok((date, check_in, check_out))
}

pub async fn update(pool: &MySqlPool, id: u64, changes: UpdateAttendance) -> AppResult<Attendance> {
    let existing = get(pool, id).await?;
    let (date, check_in, check_out) = apply_correction(&existing, &changes)?;

    sqlx::query(
        r#"
        UPDATE attendance
        SET attendance_date = ?, check_in_time = ?, check_out_time = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(date)
    .bind(check_in)
    .bind(check_out)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .map_err(conflict_as(DAY_TAKEN))?;

    info!(attendance_id = id, user_id = existing.user_id, "Attendance corrected");
    get(pool, id).await
}

pub async fn delete(pool: &MySqlPool, id: u64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Attendance".into()));
    }
    info!(attendance_id = id, "Attendance deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn row(id: u64, check_out: Option<NaiveTime>) -> Attendance {
        let now = Utc::now();
        Attendance {
            id,
            user_id: 1,
            attendance_date: day(1),
            check_in_time: t(2, 0),
            check_out_time: check_out,
            created_at: now,
            updated_at: now,
        }
    }

    fn report_row(user_id: u64, name: &str, check_in: NaiveTime, out: Option<NaiveTime>) -> ReportRow {
        ReportRow {
            user_id,
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            department_name: Some("Engineering".to_string()),
            check_in_time: check_in,
            check_out_time: out,
        }
    }

    #[test]
    fn no_row_means_check_in() {
        assert_eq!(next_action(None), PunchAction::CheckIn);
    }

    #[test]
    fn open_row_means_check_out() {
        assert_eq!(next_action(Some(&row(9, None))), PunchAction::CheckOut(9));
    }

    #[test]
    fn closed_row_is_complete() {
        assert_eq!(
            next_action(Some(&row(9, Some(t(11, 0))))),
            PunchAction::AlreadyComplete
        );
    }

    #[test]
    fn split_instant_drops_subseconds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 58).unwrap()
            + chrono::Duration::milliseconds(750);
        let (date, time) = split_instant(now);
        assert_eq!(date, day(1));
        assert_eq!(time, NaiveTime::from_hms_opt(23, 59, 58).unwrap());
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(DateRange::new(Some(day(5)), Some(day(1))).is_err());
        assert!(DateRange::new(Some(day(1)), Some(day(1))).is_ok());
        assert!(DateRange::new(None, Some(day(1))).is_ok());
    }

    #[test]
    fn detailed_filter_builds_conditions() {
        let filter = DetailedFilter {
            department_id: Some(4),
            range: DateRange::new(Some(day(1)), Some(day(31))).unwrap(),
            open_only: true,
            ..Default::default()
        }
        .to_filter();

        assert_eq!(
            filter.where_sql(),
            " WHERE 1=1 AND u.department_id = ? AND a.attendance_date >= ? \
             AND a.attendance_date <= ? AND a.check_out_time IS NULL"
        );
        assert_eq!(filter.args().len(), 3);
    }

    #[test]
    fn summary_counts_absent_and_still_in() {
        let s = AttendanceSummary::from_counts(day(1), 10, 7, 5);
        assert_eq!((s.still_in, s.absent), (2, 3));
    }

    #[test]
    fn summary_never_goes_negative() {
        // inactive users with rows can push present above the active total
        let s = AttendanceSummary::from_counts(day(1), 2, 3, 3);
        assert_eq!((s.still_in, s.absent), (0, 0));
    }

    #[test]
    fn report_groups_by_user() {
        let rows = vec![
            report_row(1, "Ann", t(2, 0), Some(t(10, 0))),
            report_row(1, "Ann", t(2, 0), Some(t(11, 0))),
            report_row(1, "Ann", t(2, 0), None),
            report_row(2, "Bob", t(22, 0), Some(t(6, 0))),
        ];

        let report = build_report(rows);
        assert_eq!(report.len(), 2);

        let ann = &report[0];
        assert_eq!(ann.user_name, "Ann Tester");
        assert_eq!(ann.days_present, 3);
        assert_eq!(ann.open_days, 1);
        assert_eq!(ann.total_worked_minutes, 17 * 60);
        assert_eq!(ann.average_worked_minutes, Some(510));

        let bob = &report[1];
        assert_eq!(bob.total_worked_minutes, 8 * 60);
        assert_eq!(bob.average_worked_minutes, Some(480));
    }

    #[test]
    fn report_of_only_open_days_has_no_average() {
        let report = build_report(vec![report_row(3, "Cy", t(2, 0), None)]);
        assert_eq!(report[0].average_worked_minutes, None);
        assert_eq!(report[0].total_worked_minutes, 0);
    }

    #[test]
    fn correction_keeps_unspecified_fields() {
        let existing = row(1, Some(t(11, 0)));
        let changes = UpdateAttendance {
            check_in_time: Some(t(1, 30)),
            ..Default::default()
        };
        assert_eq!(
            apply_correction(&existing, &changes).unwrap(),
            (day(1), t(1, 30), Some(t(11, 0)))
        );
    }

    #[test]
    fn correction_can_reopen_day() {
        let existing = row(1, Some(t(11, 0)));
        let changes = UpdateAttendance {
            clear_check_out: true,
            ..Default::default()
        };
        assert_eq!(apply_correction(&existing, &changes).unwrap().2, None);
    }

    #[test]
    fn correction_rejects_contradicting_check_out() {
        let existing = row(1, None);
        let changes = UpdateAttendance {
            check_out_time: Some(t(9, 0)),
            clear_check_out: true,
            ..Default::default()
        };
        assert!(apply_correction(&existing, &changes).is_err());
    }

    #[test]
    fn correction_rejects_midnight_check_out() {
        let existing = row(1, None);
        let changes = UpdateAttendance {
            check_out_time: Some(NaiveTime::MIN),
            ..Default::default()
        };
        let err = apply_correction(&existing, &changes).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let changes = UpdateAttendance {
            check_out_time: Some(NaiveTime::from_hms_opt(0, 0, 1).unwrap()),
            ..Default::default()
        };
        assert!(apply_correction(&existing, &changes).is_ok());
    }

    #[test]
    fn midnight_punch_is_stored_one_second_later() {
        assert_eq!(
            stored_check_out(NaiveTime::MIN),
            NaiveTime::from_hms_opt(0, 0, 1).unwrap()
        );
        assert_eq!(stored_check_out(t(17, 30)), t(17, 30));
    }

    #[test]
    fn overnight_shift_is_checked_out_next_day() {
        // checked in 22:00 yesterday, nothing today yet
        let mut yesterday = row(4, None);
        yesterday.check_in_time = t(22, 0);

        assert_eq!(
            punch_action(None, Some(&yesterday), t(6, 0)),
            PunchAction::CheckOut(4)
        );
        assert_eq!(overnight_open(Some(&yesterday), t(6, 0)).map(|r| r.id), Some(4));
    }

    #[test]
    fn stale_open_row_from_yesterday_is_ignored() {
        // more than 24h since the check-in
        let mut yesterday = row(4, None);
        yesterday.check_in_time = t(8, 0);
        assert_eq!(punch_action(None, Some(&yesterday), t(9, 0)), PunchAction::CheckIn);

        let closed = row(5, Some(t(23, 0)));
        assert_eq!(punch_action(None, Some(&closed), t(1, 0)), PunchAction::CheckIn);
    }

    #[test]
    fn today_row_takes_precedence_over_yesterday() {
        let mut yesterday = row(4, None);
        yesterday.check_in_time = t(22, 0);

        assert_eq!(
            punch_action(Some(&row(9, None)), Some(&yesterday), t(6, 0)),
            PunchAction::CheckOut(9)
        );
        assert_eq!(
            punch_action(Some(&row(9, Some(t(5, 0)))), Some(&yesterday), t(6, 0)),
            PunchAction::AlreadyComplete
        );
    }
}
