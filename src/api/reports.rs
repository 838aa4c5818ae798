use crate::{
    api::error::ApiError,
    auth::auth::AuthUser,
    config::Config,
    export::{self, ReportEntry, ReportRow},
    model::attendance::AttendanceRecord,
    utils::settings_cache,
};
use actix_web::{
    HttpResponse, Responder,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

const DAILY_LIMIT: i64 = 300;
const HISTORY_LIMIT: i64 = 360;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Day to report; today when omitted
    #[param(example = "2026-03-02", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    /// Only this role (Secretario, Motorizado)
    #[param(example = "Motorizado")]
    pub role: Option<String>,
    /// Case-insensitive name search
    #[param(example = "ana")]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// National id number (cédula)
    #[param(example = "0102030405")]
    pub identification: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub data: Vec<ReportRow>,
    pub expected_start: String,
    pub total: usize,
}

/// User joined with their (possibly missing) record for one date.
#[derive(Debug, FromRow)]
struct ReportSource {
    user_id: u64,
    name: String,
    rol: String,
    identification: String,
    id: Option<u64>,
    date: Option<NaiveDate>,
    enter: Option<String>,
    exit: Option<String>,
    lunch_start: Option<String>,
    lunch_end: Option<String>,
}

impl ReportSource {
    fn into_entry(self, fallback_date: NaiveDate) -> ReportEntry {
        ReportEntry {
            name: self.name,
            rol: self.rol,
            identification: self.identification,
            record: AttendanceRecord {
                id: self.id.unwrap_or_default(),
                user_id: self.user_id,
                date: self.date.unwrap_or(fallback_date),
                enter: self.enter,
                exit: self.exit,
                lunch_start: self.lunch_start,
                lunch_end: self.lunch_end,
            },
        }
    }
}

const SOURCE_COLUMNS: &str = r#"
    u.id AS user_id, u.name, u.rol, u.identification,
    a.id, a.date, a.enter, a.`exit`, a.lunch_start, a.lunch_end
"#;

/// Every attendance-tracked user for `date`; users without a row are
/// reported absent.
async fn daily_entries(pool: &MySqlPool, date: NaiveDate, query: &ReportQuery) -> Result<Vec<ReportEntry>, sqlx::Error> {
    let mut sql = format!(
        r#"
        SELECT {}
        FROM users u
        LEFT JOIN attendance a ON a.user_id = u.id AND a.date = ?
        WHERE u.rol IN ('Secretario', 'Motorizado')
        "#,
        SOURCE_COLUMNS
    );

    if query.role.is_some() {
        sql.push_str(" AND u.rol = ?");
    }
    if query.search.is_some() {
        sql.push_str(" AND LOWER(u.name) LIKE ?");
    }
    sql.push_str(" ORDER BY u.name LIMIT ?");

    debug!(sql = %sql, %date, "Fetching daily report");

    let mut q = sqlx::query_as::<_, ReportSource>(&sql).bind(date);
    if let Some(role) = &query.role {
        q = q.bind(role.clone());
    }
    if let Some(search) = &query.search {
        q = q.bind(format!("%{}%", search.trim().to_lowercase()));
    }

    let rows = q.bind(DAILY_LIMIT).fetch_all(pool).await?;

    Ok(rows.into_iter().map(|r| r.into_entry(date)).collect())
}

async fn build_rows(
    pool: &MySqlPool,
    config: &Config,
    entries: &[ReportEntry],
) -> Result<(Vec<ReportRow>, String), ApiError> {
    let expected = settings_cache::expected_start(pool, config.default_expected_start).await?;
    let now = Local::now().naive_local();

    let rows = entries
        .iter()
        .map(|entry| ReportRow::build(entry, expected, now))
        .collect();

    Ok((rows, expected.to_string()))
}

async fn daily_rows(
    pool: &MySqlPool,
    config: &Config,
    query: &ReportQuery,
) -> Result<(NaiveDate, Vec<ReportRow>, String), ApiError> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    let entries = daily_entries(pool, date, query).await?;
    let (rows, expected) = build_rows(pool, config, &entries).await?;
    Ok((date, rows, expected))
}

fn attachment(filename: String) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    }
}

/// Daily attendance report
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "One row per tracked user", body = ReportResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn list_reports(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (_, data, expected_start) = daily_rows(pool.get_ref(), config.get_ref(), &query).await?;

    Ok(HttpResponse::Ok().json(ReportResponse {
        total: data.len(),
        data,
        expected_start,
    }))
}

/// Attendance history of one employee by identification number
#[utoipa::path(
    get,
    path = "/api/reports/search",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Newest first", body = ReportResponse),
        (status = 400, description = "Identification missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn search_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let identification = query.identification.trim();
    if identification.is_empty() {
        return Err(ApiError::BadRequest("Identification is required".into()).into());
    }

    let sources = sqlx::query_as::<_, ReportSource>(&format!(
        r#"
        SELECT {}
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE u.identification = ?
        ORDER BY a.date DESC
        LIMIT ?
        "#,
        SOURCE_COLUMNS
    ))
    .bind(identification)
    .bind(HISTORY_LIMIT)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    let today = Local::now().date_naive();
    let entries: Vec<_> = sources.into_iter().map(|s| s.into_entry(today)).collect();
    let (data, expected_start) = build_rows(pool.get_ref(), config.get_ref(), &entries).await?;

    Ok(HttpResponse::Ok().json(ReportResponse {
        total: data.len(),
        data,
        expected_start,
    }))
}

/// Download the daily report as a spreadsheet
#[utoipa::path(
    get,
    path = "/api/reports/export/xlsx",
    params(ReportQuery),
    responses(
        (status = 200, description = "xlsx workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn export_xlsx(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (date, rows, _) = daily_rows(pool.get_ref(), config.get_ref(), &query).await?;

    let bytes = export::xlsx::to_xlsx(&rows).map_err(|e| {
        error!(error = %e, %date, "Failed to generate spreadsheet");
        ApiError::Export(e.to_string())
    })?;

    Ok(HttpResponse::Ok()
        .content_type(export::xlsx::CONTENT_TYPE)
        .insert_header(attachment(format!("reporte-{}.xlsx", date)))
        .body(bytes))
}

/// Printable daily report
#[utoipa::path(
    get,
    path = "/api/reports/export/print",
    params(ReportQuery),
    responses(
        (status = 200, description = "HTML document ready to print", content_type = "text/html"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn export_print(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (_, rows, _) = daily_rows(pool.get_ref(), config.get_ref(), &query).await?;

    Ok(HttpResponse::Ok()
        .content_type(export::html::CONTENT_TYPE)
        .body(export::html::to_printable_html(&rows)))
}
