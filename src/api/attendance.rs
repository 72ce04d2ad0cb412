use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::{AppError, AppResult},
    model::attendance::{AttendanceResponse, UpdateAttendance},
    service::attendance::{self as attendance_service, DateRange, DetailedFilter, PunchOutcome},
    utils::pagination::Pagination,
};
use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// First day, inclusive (YYYY-MM-DD)
    #[param(value_type = Option<String>, example = "2024-03-01")]
    pub from: Option<NaiveDate>,
    /// Last day, inclusive (YYYY-MM-DD)
    #[param(value_type = Option<String>, example = "2024-03-31")]
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DetailedQuery {
    pub user_id: Option<u64>,
    pub department_id: Option<u64>,
    #[param(value_type = Option<String>, example = "2024-03-01")]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, example = "2024-03-31")]
    pub to: Option<NaiveDate>,
    /// Only rows without a check-out
    pub open_only: Option<bool>,
    /// Matches name or e-mail
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Defaults to the current UTC day
    #[param(value_type = Option<String>, example = "2024-03-01")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Defaults to 30 days before `to`
    #[param(value_type = Option<String>, example = "2024-03-01")]
    pub from: Option<NaiveDate>,
    /// Defaults to the current UTC day
    #[param(value_type = Option<String>, example = "2024-03-31")]
    pub to: Option<NaiveDate>,
    pub department_id: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PunchResponse {
    pub action: PunchKind,
    pub attendance: AttendanceResponse,
}

/// Report window: `to` defaults to today, `from` to 30 days earlier.
pub fn report_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<DateRange> {
    let to = to.unwrap_or(today);
    let from = match from {
        Some(from) => from,
        None => to
            .checked_sub_signed(Duration::days(30))
            .ok_or_else(|| AppError::InvalidInput(format!("'to' date {} is out of range", to)))?,
    };
    DateRange::new(Some(from), Some(to))
}

/// Check in for the current UTC day
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in", body = AttendanceResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 409, description = "Already checked in today", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let row = attendance_service::check_in(pool.get_ref(), auth.user_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(row.into_response(config.display_offset)))
}

/// Check out of today's open attendance, or yesterday's overnight one
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out", body = AttendanceResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 409, description = "No active check-in found for today", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let row = attendance_service::check_out(pool.get_ref(), auth.user_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(row.into_response(config.display_offset)))
}

/// Check in if nothing is open, otherwise check out
#[utoipa::path(
    post,
    path = "/api/attendance/punch",
    responses(
        (status = 200, description = "Action taken and resulting record", body = PunchResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 409, description = "Today's attendance is already complete", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let (action, row) = match attendance_service::punch(pool.get_ref(), auth.user_id, Utc::now())
        .await?
    {
        PunchOutcome::CheckedIn(row) => (PunchKind::CheckIn, row),
        PunchOutcome::CheckedOut(row) => (PunchKind::CheckOut, row),
    };

    Ok(HttpResponse::Ok().json(PunchResponse {
        action,
        attendance: row.into_response(config.display_offset),
    }))
}

/// Today's record of the signed-in user (or an overnight one still open), `null` before check-in
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record or null", body = AttendanceResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let row = attendance_service::today(pool.get_ref(), auth.user_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(row.map(|r| r.into_response(config.display_offset))))
}

/// Attendance history of the signed-in user
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Paginated history, newest first", body = crate::utils::pagination::AttendancePage),
        (status = 400, description = "Invalid date range", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<HistoryQuery>,
) -> AppResult<HttpResponse> {
    let range = DateRange::new(query.from, query.to)?;
    let pagination = Pagination::from_query(query.page, query.per_page);
    let zone = config.display_offset;

    let page = attendance_service::history(pool.get_ref(), auth.user_id, range, pagination).await?;
    Ok(HttpResponse::Ok().json(page.map(|r| r.into_response(zone))))
}

/// Detailed attendance across users (admin)
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(DetailedQuery),
    responses(
        (status = 200, description = "Paginated attendance with user details", body = crate::utils::pagination::DetailedAttendancePage),
        (status = 400, description = "Invalid date range", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_detailed(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DetailedQuery>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let query = query.into_inner();
    let filter = DetailedFilter {
        user_id: query.user_id,
        department_id: query.department_id,
        range: DateRange::new(query.from, query.to)?,
        open_only: query.open_only.unwrap_or(false),
        search: query.search,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let page =
        attendance_service::detailed(pool.get_ref(), &filter, pagination, config.display_offset)
            .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Daily counts: present, checked out, still in, absent (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Summary for the day", body = crate::service::attendance::AttendanceSummary),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SummaryQuery>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = attendance_service::summary(pool.get_ref(), date).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Per-user totals over a date range (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "One line per user", body = [crate::service::attendance::UserAttendanceReport]),
        (status = 400, description = "Invalid date range", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let range = report_range(query.from, query.to, Utc::now().date_naive())?;
    let lines = attendance_service::report(pool.get_ref(), range, query.department_id).await?;
    Ok(HttpResponse::Ok().json(lines))
}

/// Get one attendance record (admin)
#[utoipa::path(
    get,
    path = "/api/attendance/{attendance_id}",
    params(("attendance_id" = u64, Path, description = "Attendance ID")),
    responses(
        (status = 200, description = "Attendance record", body = AttendanceResponse),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 404, description = "Attendance not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let row = attendance_service::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(row.into_response(config.display_offset)))
}

/// Correct an attendance record (admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}",
    params(("attendance_id" = u64, Path, description = "Attendance ID")),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Updated record", body = AttendanceResponse),
        (status = 400, description = "Invalid correction", body = crate::error::ErrorResponse),
        (status = 404, description = "Attendance not found", body = crate::error::ErrorResponse),
        (status = 409, description = "User already has a record for that date", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<UpdateAttendance>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let row =
        attendance_service::update(pool.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(row.into_response(config.display_offset)))
}

/// Delete an attendance record (admin)
#[utoipa::path(
    delete,
    path = "/api/attendance/{attendance_id}",
    params(("attendance_id" = u64, Path, description = "Attendance ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 404, description = "Attendance not found", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    attendance_service::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn report_range_defaults_to_last_thirty_days() {
        let range = report_range(None, None, day(3, 31)).unwrap();
        assert_eq!(range.from, Some(day(3, 1)));
        assert_eq!(range.to, Some(day(3, 31)));
    }

    #[test]
    fn report_range_respects_explicit_bounds() {
        let range = report_range(Some(day(1, 1)), Some(day(1, 15)), day(3, 31)).unwrap();
        assert_eq!((range.from, range.to), (Some(day(1, 1)), Some(day(1, 15))));
    }

    #[test]
    fn report_range_rejects_dates_too_early_to_default_from() {
        let earliest = NaiveDate::MIN;
        let err = report_range(None, Some(earliest), day(3, 31)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // an explicit `from` needs no arithmetic
        assert!(report_range(Some(earliest), Some(earliest), day(3, 31)).is_ok());
    }

    #[test]
    fn report_range_rejects_from_after_to() {
        assert!(report_range(Some(day(2, 1)), Some(day(1, 1)), day(3, 31)).is_err());
    }
}
