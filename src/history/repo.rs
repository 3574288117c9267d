use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::scan::dto::ScanResult;

use super::dto::ScanHistoryEntry;

pub async fn insert_scan(db: &PgPool, scan: &ScanResult) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO food_scan_history
            (analysis_id, food_name, calories, protein, carbs, fat,
             fiber, sugar, sodium, confidence, portion_size, weight_grams)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(scan.analysis_id)
    .bind(&scan.name)
    .bind(scan.calories)
    .bind(scan.protein)
    .bind(scan.carbs)
    .bind(scan.fat)
    .bind(scan.fiber)
    .bind(scan.sugar)
    .bind(scan.sodium)
    .bind(scan.confidence)
    .bind(&scan.portion_size)
    .bind(scan.weight_grams)
    .execute(db)
    .await
    .context("insert scan history")?;
    Ok(())
}

pub async fn list_recent(
    db: &PgPool,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ScanHistoryEntry>> {
    let rows = sqlx::query_as::<_, ScanHistoryEntry>(
        r#"
        SELECT analysis_id, food_name, calories, protein, carbs, fat,
               fiber, sugar, sodium, confidence, portion_size, weight_grams,
               created_at
        FROM food_scan_history
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list scan history")?;
    Ok(rows)
}

/// Returns false when no row matched.
pub async fn delete_scan(db: &PgPool, analysis_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM food_scan_history
        WHERE analysis_id = $1
        "#,
    )
    .bind(analysis_id)
    .execute(db)
    .await
    .context("delete scan history entry")?;
    Ok(result.rows_affected() > 0)
}
