use crate::{api::error::ApiError, auth::auth::AuthUser, model::role::Role, model::user::User};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Serialize;
use sqlx::MySqlPool;
use std::str::FromStr;
use utoipa::ToSchema;

const RECENT_LIMIT: i64 = 10;

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct UserTotals {
    #[schema(example = 14)]
    pub total: i64,
    #[schema(example = 9)]
    pub motorizados: i64,
    #[schema(example = 4)]
    pub secretarios: i64,
}

impl UserTotals {
    /// Fold `(rol, count)` pairs; unknown roles count toward the total only.
    fn from_counts(counts: &[(String, i64)]) -> Self {
        counts.iter().fold(Self::default(), |mut acc, (rol, n)| {
            acc.total += n;
            match Role::from_str(rol) {
                Ok(Role::Motorizado) => acc.motorizados += n,
                Ok(Role::Secretario) => acc.secretarios += n,
                _ => {}
            }
            acc
        })
    }
}

/// User counts per role
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    responses(
        (status = 200, description = "Totals", body = UserTotals),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn summary(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let counts = sqlx::query_as::<_, (String, i64)>("SELECT rol, COUNT(*) FROM users GROUP BY rol")
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(UserTotals::from_counts(&counts)))
}

/// Users who checked in today
#[utoipa::path(
    get,
    path = "/api/dashboard/recent",
    responses(
        (status = 200, description = "Up to ten users", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn recent(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.email, u.identification, u.rol, u.state, u.created_at
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date = ? AND a.enter IS NOT NULL
        ORDER BY a.enter DESC
        LIMIT ?
        "#,
    )
    .bind(Local::now().date_naive())
    .bind(RECENT_LIMIT)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(users))
}
