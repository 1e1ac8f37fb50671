use sqlx::PgPool;

use crate::db::models::LedgerUser;

/// Look a member up by Discord username or in-game name.
pub async fn find_user(pool: &PgPool, name: &str) -> anyhow::Result<Option<LedgerUser>> {
    let user = sqlx::query_as::<_, LedgerUser>(
        r#"
        SELECT id, discord_user_id, username, ign_username
        FROM users
        WHERE username = $1 OR ign_username = $1
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn is_signed_up(pool: &PgPool, discord_user_id: &str) -> anyhow::Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE discord_user_id = $1")
        .bind(discord_user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn create_user(
    pool: &PgPool,
    discord_user_id: &str,
    username: &str,
    ign_username: &str,
) -> anyhow::Result<LedgerUser> {
    let user = sqlx::query_as::<_, LedgerUser>(
        r#"
        INSERT INTO users (discord_user_id, username, ign_username)
        VALUES ($1, $2, $3)
        RETURNING id, discord_user_id, username, ign_username
        "#,
    )
    .bind(discord_user_id)
    .bind(username)
    .bind(ign_username)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

/// Returns whether a row was deleted.
pub async fn delete_user(pool: &PgPool, discord_user_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE discord_user_id = $1")
        .bind(discord_user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Credit `amount` to every user in one transaction.
pub async fn add_splits(pool: &PgPool, user_ids: &[i64], amount: f64, added_by: &str) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    for user_id in user_ids {
        sqlx::query(
            "INSERT INTO loot_splits (user_id, split_amount, split_date, added_by_user_id) VALUES ($1, $2, NOW(), $3)",
        )
        .bind(user_id)
        .bind(amount)
        .bind(added_by)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn user_total(pool: &PgPool, user_id: i64) -> anyhow::Result<Option<f64>> {
    let row: Option<(f64,)> = sqlx::query_as("SELECT total_amount FROM user_totals WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(total,)| total))
}

/// Pay out the user's whole current balance; returns the amount paid.
pub async fn record_payout(pool: &PgPool, user_id: i64, added_by: &str) -> anyhow::Result<f64> {
    let mut tx = pool.begin().await?;
    let (total,): (f64,) =
        sqlx::query_as("SELECT COALESCE((SELECT total_amount FROM user_totals WHERE user_id = $1), 0)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
    sqlx::query(
        "INSERT INTO payouts (user_id, payout_amount, payout_date, added_by_user_id) VALUES ($1, $2, NOW(), $3)",
    )
    .bind(user_id)
    .bind(total)
    .bind(added_by)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(total)
}
