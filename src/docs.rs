use crate::api::dashboard::UserTotals;
use crate::api::reports::ReportResponse;
use crate::api::settings::ExpectedStartBody;
use crate::api::users::CreateUser;
use crate::auth::handlers::LoginResponse;
use crate::export::ReportRow;
use crate::model::attendance::AttendanceRecord;
use crate::model::user::User;
use crate::models::LoginReqDto;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asistencia API",
        version = "0.1.0",
        description = r#"
## Employee attendance tracking

Secretaries and couriers stamp their own **check-in**, **lunch start**,
**lunch end** and **check-out**. Worked time, lateness against the
configured expected start, and presence are computed on read, so the
status panel, the daily report and the exports always agree.

### Roles
- **Administrador**: users, expected start, reports and exports
- **Secretario** / **Motorizado**: own attendance

All `/api` endpoints require a JWT bearer token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::attendance::today,
        crate::api::attendance::record_transition,

        crate::api::settings::get_expected_start,
        crate::api::settings::put_expected_start,

        crate::api::reports::list_reports,
        crate::api::reports::search_history,
        crate::api::reports::export_xlsx,
        crate::api::reports::export_print,

        crate::api::dashboard::summary,
        crate::api::dashboard::recent,

        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::update_user,
        crate::api::users::delete_user
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            AttendanceRecord,
            ExpectedStartBody,
            ReportRow,
            ReportResponse,
            UserTotals,
            User,
            CreateUser
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Attendance", description = "Own attendance stamps and status"),
        (name = "Settings", description = "Expected start time"),
        (name = "Reports", description = "Daily reports, history and exports"),
        (name = "Dashboard", description = "Administrator overview"),
        (name = "Users", description = "User management"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}
