pub mod reactions;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::all::{Context, EventHandler, Message, Reaction, ReactionType, Ready};
use serenity::async_trait;
use sqlx::PgPool;

use crate::config::Config;
use crate::countdown::surface::CANCEL_EMOJI;
use crate::countdown::{Boards, ChatSurface, SerenityChat};
use crate::sheets::SheetsClient;

pub struct Handler {
    pub config: Arc<Config>,
    pub boards: Boards,
    pub pool: PgPool,
    pub sheets: SheetsClient,
    pub http_client: reqwest::Client,
    restored: AtomicBool,
}

impl Handler {
    pub fn new(
        config: Arc<Config>,
        boards: Boards,
        pool: PgPool,
        sheets: SheetsClient,
        http_client: reqwest::Client,
    ) -> Self {
        Self { config, boards, pool, sheets, http_client, restored: AtomicBool::new(false) }
    }
}

pub fn chat_surface(ctx: &Context) -> Arc<dyn ChatSurface> {
    Arc::new(SerenityChat::new(ctx.http.clone()))
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected");

        // ready fires again after every reconnect; tasks only need restoring once
        if self.restored.swap(true, Ordering::SeqCst) {
            return;
        }
        let boards = self.boards.clone();
        let chat = chat_surface(&ctx);
        tokio::spawn(async move {
            let count = crate::tasks::restore_countdowns(&boards, chat).await;
            tracing::info!(count, "countdowns restored");
        });
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.id == ctx.cache.current_user().id {
            if let Err(e) = msg.react(&ctx.http, ReactionType::Unicode(CANCEL_EMOJI.to_string())).await {
                tracing::debug!(message = %msg.id, "could not add cleanup reaction: {e}");
            }
            return;
        }
        if msg.author.bot {
            return;
        }
        crate::commands::dispatch(self, &ctx, &msg).await;
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        if let Err(e) = reactions::handle(self, &ctx, &reaction).await {
            tracing::error!(message = %reaction.message_id, "reaction handling failed: {e:#}");
        }
    }
}
