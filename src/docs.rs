use crate::api::attendance::{PunchKind, PunchResponse};
use crate::api::health::{DbHealthResponse, HealthResponse};
use crate::error::ErrorResponse;
use crate::model::attendance::{AttendanceResponse, UpdateAttendance};
use crate::model::department::{CreateDepartment, DepartmentResponse, UpdateDepartment};
use crate::model::user::{ChangePassword, CreateUser, UpdateUser, UserResponse};
use crate::model::user_role::{CreateUserRole, UserRoleResponse};
use crate::model::user_type::{UserType, UserTypeRow};
use crate::models::{LoginReqDto, MessageResponse, TokenPair};
use crate::service::attendance::{AttendanceSummary, DetailedAttendance, UserAttendanceReport};
use crate::utils::pagination::{
    AttendancePage, DepartmentPage, DetailedAttendancePage, UserPage, UserRolePage,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Users belong to a department and hold a job role. Each user has at most one
attendance record per day: the first punch checks in, the second checks out.

### Time handling
All times are stored in UTC. Every attendance response also carries
`check_in_display` / `check_out_display`, rendered in the configured display
zone as `YYYY-MM-DD HH:MM:SS ±HH:MM`.

### Security
Endpoints under `/api` require a **JWT Bearer** access token from
`/auth/login`. Administrative endpoints require an admin account.

### Response format
- JSON bodies; errors are `{ "error": CODE, "message": ... }`
- List endpoints are paginated with `page` and `per_page`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::me,
        crate::api::user::change_password,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,
        crate::api::user_type::list_user_types,

        crate::api::department::list_departments,
        crate::api::department::create_department,
        crate::api::department::get_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::user_role::list_roles,
        crate::api::user_role::create_role,
        crate::api::user_role::get_role,
        crate::api::user_role::update_role,
        crate::api::user_role::delete_role,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::punch,
        crate::api::attendance::today,
        crate::api::attendance::my_history,
        crate::api::attendance::list_detailed,
        crate::api::attendance::summary,
        crate::api::attendance::report,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::health::health,
        crate::api::health::health_db
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            LoginReqDto,
            TokenPair,
            UserType,
            UserTypeRow,
            UserResponse,
            CreateUser,
            UpdateUser,
            ChangePassword,
            UserPage,
            DepartmentResponse,
            CreateDepartment,
            UpdateDepartment,
            DepartmentPage,
            UserRoleResponse,
            CreateUserRole,
            UserRolePage,
            AttendanceResponse,
            UpdateAttendance,
            AttendancePage,
            DetailedAttendance,
            DetailedAttendancePage,
            AttendanceSummary,
            UserAttendanceReport,
            PunchKind,
            PunchResponse,
            HealthResponse,
            DbHealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Users", description = "User accounts and profiles"),
        (name = "Departments", description = "Department management"),
        (name = "Roles", description = "Job role management"),
        (name = "Attendance", description = "Daily check-in and check-out"),
        (name = "Health", description = "Liveness and readiness checks"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_attendance_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/attendance/punch"));
        assert!(paths.contains_key("/api/attendance/{attendance_id}"));
        assert!(paths.contains_key("/auth/login"));
        assert!(paths.contains_key("/health"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
