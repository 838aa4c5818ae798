use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::warn;

use crate::model::settings::{ExpectedStart, Settings};

const SETTINGS_ID: u64 = 1;

/// Expected start is read on every status refresh. Refreshed on every
/// administrator write.
static EXPECTED_START: Lazy<Cache<u64, ExpectedStart>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1)
        .time_to_live(Duration::from_secs(300))
        .build()
});

/// Current expected start. Falls back to `default` when the row is
/// missing or unreadable.
pub async fn expected_start(pool: &MySqlPool, default: ExpectedStart) -> Result<ExpectedStart, sqlx::Error> {
    if let Some(cached) = EXPECTED_START.get(&SETTINGS_ID).await {
        return Ok(cached);
    }

    let row = sqlx::query_as::<_, Settings>("SELECT id, enter FROM settings WHERE id = ?")
        .bind(SETTINGS_ID)
        .fetch_optional(pool)
        .await?;

    let value = match row {
        Some(settings) => settings.enter.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Stored expected start unreadable, using default");
            default
        }),
        None => default,
    };

    EXPECTED_START.insert(SETTINGS_ID, value).await;
    Ok(value)
}

pub async fn save_expected_start(pool: &MySqlPool, value: ExpectedStart) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO settings (id, enter) VALUES (?, ?)
        ON DUPLICATE KEY UPDATE enter = VALUES(enter)
        "#,
    )
    .bind(SETTINGS_ID)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    EXPECTED_START.insert(SETTINGS_ID, value).await;
    Ok(())
}
