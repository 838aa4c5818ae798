use crate::{
    api::error::{ApiError, is_duplicate},
    auth::auth::AuthUser,
    config::Config,
    model::attendance::{AttendanceRecord, Transition, TransitionError},
    utils::{settings_cache, time_calc},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{debug, info};

const RECORD_COLUMNS: &str = "id, user_id, date, enter, `exit`, lunch_start, lunch_end";

#[derive(Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub expected_start: String,
    pub record: Option<AttendanceRecord>,
    pub summary: time_calc::AttendanceSummary,
}

pub async fn fetch_record(
    pool: &MySqlPool,
    user_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {} FROM attendance WHERE user_id = ? AND date = ?",
        RECORD_COLUMNS
    ))
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

async fn today_response(
    pool: &MySqlPool,
    config: &Config,
    user_id: u64,
    now: NaiveDateTime,
) -> Result<TodayResponse, ApiError> {
    let date = now.date();
    let record = fetch_record(pool, user_id, date).await?;
    let expected = settings_cache::expected_start(pool, config.default_expected_start).await?;

    // A missing row reads the same as an empty one: absent, not started.
    let empty = AttendanceRecord::new(user_id, date);
    let summary = time_calc::summarize(record.as_ref().unwrap_or(&empty), expected, now);

    Ok(TodayResponse {
        date,
        expected_start: expected.to_string(),
        record,
        summary,
    })
}

/// Today's attendance for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's record with worked time, lateness and presence", body = Object, example = json!({
            "date": "2026-03-02",
            "expected_start": "07:00",
            "record": {
                "id": 1, "user_id": 12, "date": "2026-03-02",
                "enter": "07:15", "exit": null, "lunch_start": "12:00", "lunch_end": null
            },
            "summary": {
                "worked": { "hours": 5, "minutes": 5 },
                "worked_label": "5h 5m",
                "worked_clock": "5:05",
                "lateness": { "status": "late", "minutes": 15 },
                "late_minutes": 15,
                "lateness_label": "15 minutos",
                "presence": "present",
                "presence_label": "Presente",
                "on_break": true
            }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_tracked()?;

    let response = today_response(pool.get_ref(), config.get_ref(), auth.user_id, Local::now().naive_local()).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Stamp check-in, lunch start, lunch end or check-out
#[utoipa::path(
    post,
    path = "/api/attendance/{transition}",
    params(
        ("transition", Path, description = "One of enter, lunch-start, lunch-end, exit")
    ),
    responses(
        (status = 200, description = "Stamp recorded; today's status returned", body = Object),
        (status = 400, description = "Transition not allowed now", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Stamp recorded concurrently", body = Object),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record_transition(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_tracked()?;

    let transition = Transition::from_str(&path.into_inner())
        .map_err(|_| ApiError::NotFound("Unknown attendance transition".into()))?;

    let now = Local::now().naive_local();
    let date = now.date();
    let stamp = now.format("%H:%M").to_string();
    let user_id = auth.user_id;

    let record = fetch_record(pool.get_ref(), user_id, date).await.map_err(ApiError::from)?;
    transition.check(record.as_ref()).map_err(ApiError::from)?;

    debug!(user_id, %transition, %stamp, "Recording attendance stamp");

    let written = match (transition, record) {
        (Transition::Enter, None) => {
            let result = sqlx::query("INSERT INTO attendance (user_id, date, enter) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(date)
                .bind(&stamp)
                .execute(pool.get_ref())
                .await;

            match result {
                Ok(res) => res.rows_affected(),
                // Another request created today's row first
                Err(e) if is_duplicate(&e) => {
                    return Err(ApiError::from(TransitionError::AlreadyCheckedIn).into());
                }
                Err(e) => return Err(ApiError::from(e).into()),
            }
        }
        (transition, _) => {
            let column = transition.column();
            sqlx::query(&format!(
                "UPDATE attendance SET `{0}` = ? WHERE user_id = ? AND date = ? AND `{0}` IS NULL",
                column
            ))
            .bind(&stamp)
            .bind(user_id)
            .bind(date)
            .execute(pool.get_ref())
            .await
            .map_err(ApiError::from)?
            .rows_affected()
        }
    };

    if written == 0 {
        return Err(ApiError::Conflict(format!("{} already recorded", transition)).into());
    }

    info!(user_id, email = %auth.email, %transition, %stamp, "Attendance stamp recorded");

    let response = today_response(pool.get_ref(), config.get_ref(), user_id, now).await?;

    Ok(HttpResponse::Ok().json(response))
}
