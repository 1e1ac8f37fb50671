/// A member signed up for loot splits.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LedgerUser {
    pub id: i64,
    pub discord_user_id: String,
    pub username: String,
    pub ign_username: String,
}
