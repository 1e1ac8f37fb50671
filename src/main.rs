mod battle;
mod commands;
mod config;
mod countdown;
mod db;
mod deposits;
mod error;
mod handlers;
mod pagination;
mod sheets;
mod tasks;
mod ui;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use serenity::all::{Client, GatewayIntents};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::countdown::Boards;
use crate::handlers::Handler;
use crate::sheets::SheetsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::init_pool(&config.database_url)?;
    if let Err(e) = db::migrate(&pool).await {
        tracing::error!("ledger database unavailable, ledger commands will fail: {e:#}");
    }

    let boards = Boards::open(config.general.clone(), config.world_boss.clone()).await;
    let http_client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
    let sheets = SheetsClient::new(http_client.clone(), &config.sheets);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;
    let handler = Handler::new(config.clone(), boards, pool, sheets, http_client);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    client.start().await?;
    Ok(())
}
