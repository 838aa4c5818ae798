use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::utils::email_filter::normalize;

/// true => email is TAKEN. Only taken emails are stored.
pub static EMAIL_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(50_000)
        .time_to_live(Duration::from_secs(86400))
        .build()
});

pub async fn mark_taken(email: &str) {
    EMAIL_CACHE.insert(normalize(email), true).await;
}

pub async fn forget(email: &str) {
    EMAIL_CACHE.invalidate(&normalize(email)).await;
}

pub async fn is_taken(email: &str) -> bool {
    EMAIL_CACHE.get(&normalize(email)).await.unwrap_or(false)
}

async fn batch_mark(emails: &[String]) {
    let futures: Vec<_> = emails
        .iter()
        .map(|e| EMAIL_CACHE.insert(normalize(e), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load emails of users who checked in during the last `days` days
pub async fn warmup_email_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT DISTINCT u.email
        FROM users u
        JOIN attendance a ON a.user_id = u.id
        WHERE a.date >= CURDATE() - INTERVAL ? DAY
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row?;
        batch.push(email);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Email cache warmup complete: {} active users (last {} days)",
        total_count,
        days
    );

    Ok(())
}
