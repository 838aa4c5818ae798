use crate::{
    api::error::{ApiError, is_duplicate},
    auth::{auth::AuthUser, password::hash_password},
    model::{role::Role, user::User},
    utils::{
        db_utils::{build_update_sql, execute_update},
        email_cache, email_filter,
    },
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{error, info};
use utoipa::ToSchema;

/// Columns an administrator may change through `PUT /users/{id}`.
const UPDATABLE_COLUMNS: &[&str] = &["name", "email", "identification", "rol", "state"];

fn default_state() -> bool {
    true
}

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Luis Pérez")]
    pub name: String,
    #[schema(example = "luis@empresa.com")]
    pub email: String,
    /// National id number (cédula); also the initial password when none is given
    #[schema(example = "0911111111")]
    pub identification: String,
    #[schema(example = "secret", nullable = true)]
    pub password: Option<String>,
    #[schema(example = "Motorizado", value_type = String)]
    pub role: Role,
    #[serde(default = "default_state")]
    #[schema(example = true)]
    pub state: bool,
}

impl CreateUser {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(ApiError::BadRequest("A valid email is required".into()));
        }
        if self.identification.trim().is_empty() {
            return Err(ApiError::BadRequest("Identification is required".into()));
        }
        Ok(())
    }
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    // 1️⃣ Cuckoo filter — fast negative
    if !email_filter::might_exist(email) {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if email_cache::is_taken(email).await {
        return false;
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)")
        .bind(email_filter::normalize(email))
        .fetch_one(pool)
        .await
        .unwrap_or(true); // fail-safe

    !exists
}

/// Move the "taken" mark from `old` to `new` after an email change.
async fn move_email_reservation(old: &str, new: &str) {
    if email_filter::normalize(old) != email_filter::normalize(new) {
        email_filter::remove(old);
        email_cache::forget(old).await;
    }
    email_filter::insert(new);
    email_cache::mark_taken(new).await;
}

/// Reject payloads whose `rol` is not a known role or whose `state` is not a flag.
fn validate_update(payload: &Value) -> Result<(), ApiError> {
    if let Some(rol) = payload.get("rol") {
        let known = rol.as_str().map(Role::from_str).is_some_and(|r| r.is_ok());
        if !known {
            return Err(ApiError::BadRequest("Unknown role".into()));
        }
    }
    if let Some(state) = payload.get("state") {
        if !state.is_boolean() {
            return Err(ApiError::BadRequest("State must be true or false".into()));
        }
    }
    Ok(())
}

/// List users
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Newest first", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(auth: AuthUser, pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, identification, rol, state, created_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(users))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = Object, example = json!({
            "message": "User created successfully"
        })),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    payload.validate()?;

    let email = email_filter::normalize(&payload.email);

    if !is_email_available(&email, pool.get_ref()).await {
        return Err(ApiError::Conflict("Email already registered".into()).into());
    }

    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(payload.identification.trim());

    let hashed = hash_password(password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, identification, password, rol, state, created_at)
        VALUES (?, ?, ?, ?, ?, ?, NOW())
        "#,
    )
    .bind(payload.name.trim())
    .bind(&email)
    .bind(payload.identification.trim())
    .bind(hashed)
    .bind(payload.role.as_ref())
    .bind(payload.state)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            email_filter::insert(&email);
            email_cache::mark_taken(&email).await;
            info!(admin_id = auth.user_id, %email, role = payload.role.as_ref(), "User created");

            Ok(HttpResponse::Created().json(json!({
                "message": "User created successfully"
            })))
        }
        Err(e) if is_duplicate(&e) => Err(ApiError::Conflict("Email already registered".into()).into()),
        Err(e) => Err(ApiError::from(e).into()),
    }
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(
        ("user_id", Path, description = "User ID")
    ),
    request_body(content = Object, description = "Any of name, email, identification, rol, state"),
    responses(
        (status = 200, description = "User updated", body = Object, example = json!({
            "message": "User updated successfully"
        })),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let mut payload = body.into_inner();
    validate_update(&payload)?;

    if let Some(email) = payload.get_mut("email") {
        let normalized = email.as_str().map(email_filter::normalize).unwrap_or_default();
        if !normalized.contains('@') {
            return Err(ApiError::BadRequest("A valid email is required".into()).into());
        }
        *email = Value::String(normalized);
    }

    let previous_email = if payload.get("email").is_some() {
        sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(ApiError::from)?
    } else {
        None
    };

    let update = build_update_sql("users", &payload, UPDATABLE_COLUMNS, "id", user_id)?;

    let affected = match execute_update(pool.get_ref(), update).await {
        Ok(n) => n,
        Err(e) if is_duplicate(&e) => {
            return Err(ApiError::Conflict("Email already registered".into()).into());
        }
        Err(e) => return Err(ApiError::from(e).into()),
    };

    if affected == 0 {
        return Err(ApiError::NotFound("User not found".into()).into());
    }

    if let Some(email) = payload.get("email").and_then(Value::as_str) {
        match previous_email.as_deref() {
            Some(old) => move_email_reservation(old, email).await,
            None => {
                email_filter::insert(email);
                email_cache::mark_taken(email).await;
            }
        }
    }

    info!(admin_id = auth.user_id, user_id, "User updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "User updated successfully"
    })))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(
        ("user_id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::from)?;

    email_filter::remove(&email);
    email_cache::forget(&email).await;

    info!(admin_id = auth.user_id, user_id, "User deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: &str, identification: &str) -> CreateUser {
        serde_json::from_value(json!({
            "name": "Luis",
            "email": email,
            "identification": identification,
            "role": "Motorizado"
        }))
        .unwrap()
    }

    #[test]
    fn new_users_default_to_active() {
        let user = create("luis@empresa.com", "0911111111");
        assert!(user.state);
        assert_eq!(user.role, Role::Motorizado);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn rejects_bad_create_payloads() {
        assert!(create("not-an-email", "0911111111").validate().is_err());
        assert!(create("luis@empresa.com", "  ").validate().is_err());
    }

    #[test]
    fn unknown_role_in_create_fails_to_deserialize() {
        let parsed: Result<CreateUser, _> = serde_json::from_value(json!({
            "name": "X", "email": "x@y.z", "identification": "1", "role": "Hr"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn update_checks_role_and_state() {
        assert!(validate_update(&json!({ "rol": "Secretario" })).is_ok());
        assert!(validate_update(&json!({ "rol": "Jefe" })).is_err());
        assert!(validate_update(&json!({ "rol": 1 })).is_err());
        assert!(validate_update(&json!({ "state": "yes" })).is_err());
        assert!(validate_update(&json!({ "name": "Ana", "state": false })).is_ok());
    }

    #[actix_web::test]
    async fn changed_email_frees_the_old_address() {
        let old = "renamed.before@empresa.com";
        let new = "renamed.after@empresa.com";
        email_filter::insert(old);
        email_cache::mark_taken(old).await;

        move_email_reservation(old, new).await;

        assert!(!email_cache::is_taken(old).await);
        assert!(email_cache::is_taken(new).await);
        assert!(email_filter::might_exist(new));

        let pool = MySqlPool::connect_lazy("mysql://localhost/unused").unwrap();
        assert!(is_email_available(old, &pool).await);
    }

    #[actix_web::test]
    async fn unchanged_email_stays_taken() {
        let email = "same.address@empresa.com";
        email_cache::mark_taken(email).await;

        move_email_reservation(email, " Same.Address@empresa.com ").await;

        assert!(email_cache::is_taken(email).await);
        assert!(email_filter::might_exist(email));
    }

    #[actix_web::test]
    async fn unknown_emails_are_available_without_a_query() {
        // The filter answers before the pool is touched.
        let pool = MySqlPool::connect_lazy("mysql://localhost/unused").unwrap();
        assert!(is_email_available("never.seen.before@empresa.com", &pool).await);
    }
}
