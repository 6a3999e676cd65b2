use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::leave::LeaveType;

/// Leave types by id. Writes to `leave_types` must call [`invalidate`].
pub static LEAVE_TYPE_CACHE: Lazy<Cache<u64, LeaveType>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(1_000)
        .time_to_live(Duration::from_secs(3600))
        .build()
});

/// Cached lookup falling back to the database; `None` when no such type exists.
pub async fn get(pool: &MySqlPool, id: u64) -> sqlx::Result<Option<LeaveType>> {
    if let Some(hit) = LEAVE_TYPE_CACHE.get(&id).await {
        return Ok(Some(hit));
    }

    let found = sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, max_days_per_year FROM leave_types WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if let Some(leave_type) = &found {
        LEAVE_TYPE_CACHE.insert(id, leave_type.clone()).await;
    }

    Ok(found)
}

pub async fn put(leave_type: LeaveType) {
    LEAVE_TYPE_CACHE.insert(leave_type.id, leave_type).await;
}

pub async fn invalidate(id: u64) {
    LEAVE_TYPE_CACHE.invalidate(&id).await;
}

/// Load every leave type into the cache
pub async fn warmup_leave_type_cache(pool: &MySqlPool) -> Result<()> {
    let mut stream = sqlx::query_as::<_, LeaveType>(
        "SELECT id, name, max_days_per_year FROM leave_types ORDER BY id",
    )
    .fetch(pool);

    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        put(row?).await;
        total_count += 1;
    }

    tracing::info!(total_count, "Leave type cache warmup complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn put_then_invalidate() {
        let id = 9_000_001;
        put(LeaveType {
            id,
            name: "Sick".into(),
            max_days_per_year: 14,
        })
        .await;
        assert_eq!(
            LEAVE_TYPE_CACHE.get(&id).await.map(|t| t.max_days_per_year),
            Some(14)
        );

        invalidate(id).await;
        assert!(LEAVE_TYPE_CACHE.get(&id).await.is_none());
    }
}
