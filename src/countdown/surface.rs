use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{ChannelId, GuildId, MessageId, ReactionType};
use serenity::builder::{CreateAllowedMentions, CreateMessage, EditMessage};
use serenity::http::Http;

use crate::countdown::record::permalink;
use crate::countdown::render::SummaryView;
use crate::ui::embeds;
use crate::utils::is_not_found;

pub const CANCEL_EMOJI: &str = "❌";

/// A message the bot just posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posted {
    pub message: MessageId,
    pub permalink: String,
}

/// The part of the chat platform the countdown boards talk to.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    async fn announce(
        &self,
        guild: Option<GuildId>,
        channel: ChannelId,
        reply_to: Option<MessageId>,
        content: &str,
    ) -> anyhow::Result<Posted>;

    async fn post_summary(&self, channel: ChannelId, view: &SummaryView) -> anyhow::Result<MessageId>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> anyhow::Result<()>;

    async fn edit_message(&self, channel: ChannelId, message: MessageId, content: &str) -> anyhow::Result<()>;

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> anyhow::Result<()>;

    /// Whether a bot wrote `message`; `None` once the message is gone.
    async fn author_is_bot(&self, channel: ChannelId, message: MessageId) -> anyhow::Result<Option<bool>>;
}

pub struct SerenityChat {
    http: Arc<Http>,
}

impl SerenityChat {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatSurface for SerenityChat {
    async fn announce(
        &self,
        guild: Option<GuildId>,
        channel: ChannelId,
        reply_to: Option<MessageId>,
        content: &str,
    ) -> anyhow::Result<Posted> {
        let mut builder = CreateMessage::new().content(content);
        if let Some(original) = reply_to {
            builder = builder
                .reference_message((channel, original))
                .allowed_mentions(CreateAllowedMentions::new().replied_user(true));
        }
        let msg = channel.send_message(&self.http, builder).await?;
        Ok(Posted {
            message: msg.id,
            permalink: permalink(guild, channel, msg.id),
        })
    }

    async fn post_summary(&self, channel: ChannelId, view: &SummaryView) -> anyhow::Result<MessageId> {
        let msg = channel
            .send_message(&self.http, CreateMessage::new().embed(embeds::summary_embed(view)))
            .await?;
        Ok(msg.id)
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> anyhow::Result<()> {
        channel.delete_message(&self.http, message).await?;
        Ok(())
    }

    async fn edit_message(&self, channel: ChannelId, message: MessageId, content: &str) -> anyhow::Result<()> {
        channel
            .edit_message(&self.http, message, EditMessage::new().content(content))
            .await?;
        Ok(())
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> anyhow::Result<()> {
        channel
            .create_reaction(&self.http, message, ReactionType::Unicode(emoji.to_string()))
            .await?;
        Ok(())
    }

    async fn author_is_bot(&self, channel: ChannelId, message: MessageId) -> anyhow::Result<Option<bool>> {
        match channel.message(&self.http, message).await {
            Ok(msg) => Ok(Some(msg.author.bot)),
            Err(e) => {
                let e = anyhow::Error::from(e);
                if is_not_found(&e) {
                    Ok(None)
                } else {
                    Err(e)
                }
            }
        }
    }
}
