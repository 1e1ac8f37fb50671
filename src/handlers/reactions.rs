use serenity::all::{ChannelId, Context, MessageId, Reaction, ReactionType, UserId};

use crate::countdown::surface::CANCEL_EMOJI;
use crate::countdown::{Boards, CancelOutcome, ChatSurface};
use crate::handlers::{chat_surface, Handler};
use crate::pagination::{self, Direction};
use crate::utils::is_not_found;

/// What a reaction asks for, before looking at any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    /// ❌: cancel the countdown it marks (initiator only) and delete the bot message.
    Dismiss,
    Turn(Direction),
    Ignore,
}

pub fn classify(emoji: &ReactionType, by_bot: bool) -> ReactionAction {
    if by_bot {
        return ReactionAction::Ignore;
    }
    let ReactionType::Unicode(s) = emoji else {
        return ReactionAction::Ignore;
    };
    if s == CANCEL_EMOJI {
        return ReactionAction::Dismiss;
    }
    Direction::from_emoji(s).map_or(ReactionAction::Ignore, ReactionAction::Turn)
}

pub async fn handle(h: &Handler, ctx: &Context, reaction: &Reaction) -> anyhow::Result<()> {
    let Some(user) = reaction.user_id else {
        return Ok(());
    };
    let by_bot = user == ctx.cache.current_user().id || reaction.member.as_ref().is_some_and(|m| m.user.bot);
    let chat = chat_surface(ctx);

    match classify(&reaction.emoji, by_bot) {
        ReactionAction::Ignore => Ok(()),
        ReactionAction::Turn(dir) => {
            if !pagination::is_pager(reaction.message_id) {
                return Ok(());
            }
            if let Some(content) = pagination::turn(reaction.message_id, user, dir) {
                chat.edit_message(reaction.channel_id, reaction.message_id, &content).await?;
            }
            if let Err(e) = reaction.delete(&ctx.http).await {
                tracing::debug!(message = %reaction.message_id, "could not remove page reaction: {e}");
            }
            Ok(())
        }
        ReactionAction::Dismiss => {
            dismiss(&h.boards, chat.as_ref(), reaction.channel_id, reaction.message_id, user).await
        }
    }
}

/// ❌ from `user`: cancel the countdown announced by `message` if they started it, then
/// delete `message` if a bot wrote it. The two happen independently.
pub async fn dismiss(
    boards: &Boards,
    chat: &dyn ChatSurface,
    channel: ChannelId,
    message: MessageId,
    user: UserId,
) -> anyhow::Result<()> {
    for board in boards.all() {
        match board.request_cancel(message, user).await {
            CancelOutcome::Signalled => {
                tracing::info!(board = board.kind().name(), %message, %user, "countdown cancelled by reaction");
            }
            CancelOutcome::NotInitiator => {
                tracing::debug!(%message, %user, "cancel ignored, not the initiator");
            }
            CancelOutcome::NotRunning => {
                // restored but not re-armed yet: retire it here
                tracing::warn!(%message, "tracked countdown has no running task, removing it");
                if board.remove(message).await.is_ok() {
                    board.refresh_summary(chat, channel).await?;
                }
            }
            CancelOutcome::NotTracked => {}
        }
    }
    delete_if_bot_authored(chat, channel, message).await
}

async fn delete_if_bot_authored(chat: &dyn ChatSurface, channel: ChannelId, message: MessageId) -> anyhow::Result<()> {
    if chat.author_is_bot(channel, message).await? != Some(true) {
        return Ok(());
    }
    if let Err(e) = chat.delete_message(channel, message).await {
        if !is_not_found(&e) {
            return Err(e);
        }
    }
    tracing::debug!(%message, "bot message dismissed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::board::tests::config_in;
    use crate::countdown::lifecycle::{self, LifecycleState, StartRequest};
    use crate::countdown::record::{CountdownRecord, Initiator};
    use crate::countdown::surface::fake::FakeChat;
    use crate::countdown::BoardKind;
    use chrono::{Duration, Utc};
    use serenity::all::GuildId;
    use std::sync::Arc;

    fn unicode(s: &str) -> ReactionType {
        ReactionType::Unicode(s.to_string())
    }

    #[test]
    fn cross_dismisses_and_arrows_turn() {
        assert_eq!(classify(&unicode("❌"), false), ReactionAction::Dismiss);
        assert_eq!(classify(&unicode("⬅️"), false), ReactionAction::Turn(Direction::Back));
        assert_eq!(classify(&unicode("➡️"), false), ReactionAction::Turn(Direction::Forward));
        assert_eq!(classify(&unicode("👍"), false), ReactionAction::Ignore);
    }

    #[test]
    fn bot_reactions_are_ignored() {
        assert_eq!(classify(&unicode("❌"), true), ReactionAction::Ignore);
        assert_eq!(classify(&unicode("➡️"), true), ReactionAction::Ignore);
    }

    async fn open_boards(dir: &std::path::Path) -> Boards {
        Boards::open(config_in(dir, BoardKind::General), config_in(dir, BoardKind::WorldBoss)).await
    }

    const CHANNEL: ChannelId = ChannelId::new(500);

    fn request(initiator: u64) -> StartRequest {
        StartRequest {
            guild: Some(GuildId::new(1)),
            channel: CHANNEL,
            reply_to: None,
            initiator: UserId::new(initiator),
            expires_at: Utc::now() + Duration::minutes(30),
            label: "Castle".into(),
        }
    }

    #[tokio::test]
    async fn stranger_cross_deletes_the_announcement_but_keeps_the_countdown() {
        let dir = tempfile::tempdir().unwrap();
        let boards = open_boards(dir.path()).await;
        let fake = Arc::new(FakeChat::new());
        let chat: Arc<dyn ChatSurface> = fake.clone();
        let task = lifecycle::start(&boards.general, &chat, request(5)).await.unwrap();
        let id = boards.general.records().await[0].id;

        dismiss(&boards, chat.as_ref(), CHANNEL, id, UserId::new(7)).await.unwrap();

        assert_eq!(fake.text_of(id), None);
        assert!(boards.general.contains(id).await);
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test]
    async fn initiator_cross_cancels_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let boards = open_boards(dir.path()).await;
        let fake = Arc::new(FakeChat::new());
        let chat: Arc<dyn ChatSurface> = fake.clone();
        let task = lifecycle::start(&boards.general, &chat, request(5)).await.unwrap();
        let id = boards.general.records().await[0].id;

        dismiss(&boards, chat.as_ref(), CHANNEL, id, UserId::new(5)).await.unwrap();

        assert_eq!(fake.text_of(id), None);
        assert_eq!(task.await.unwrap(), LifecycleState::Cancelled);
        assert!(!boards.general.contains(id).await);
        assert!(fake.live_summaries()[0].entries.is_empty());
    }

    #[tokio::test]
    async fn cross_on_untracked_messages_only_removes_bot_ones() {
        let dir = tempfile::tempdir().unwrap();
        let boards = open_boards(dir.path()).await;
        let fake = FakeChat::new();
        let bot_reply = fake.announce(None, CHANNEL, None, "No logs found for the user.").await.unwrap().message;
        let human = fake.post_from_user(CHANNEL, "#log ann");

        dismiss(&boards, &fake, CHANNEL, bot_reply, UserId::new(7)).await.unwrap();
        dismiss(&boards, &fake, CHANNEL, human, UserId::new(7)).await.unwrap();
        dismiss(&boards, &fake, CHANNEL, MessageId::new(1), UserId::new(7)).await.unwrap();

        assert_eq!(fake.text_of(bot_reply), None);
        assert_eq!(fake.text_of(human).as_deref(), Some("#log ann"));
        assert!(boards.general.records().await.is_empty());
    }

    #[tokio::test]
    async fn initiator_cross_on_an_unarmed_countdown_still_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let boards = open_boards(dir.path()).await;
        let fake = FakeChat::new();
        let id = fake.announce(None, CHANNEL, None, "Countdown will end").await.unwrap().message;
        boards
            .world_boss
            .add(CountdownRecord {
                id,
                expires_at: Utc::now() + Duration::hours(2),
                initiator: Initiator::User(UserId::new(5)),
                label: String::new(),
                permalink: None,
            })
            .await
            .unwrap();

        dismiss(&boards, &fake, CHANNEL, id, UserId::new(5)).await.unwrap();

        assert!(!boards.world_boss.contains(id).await);
        assert_eq!(fake.text_of(id), None);
        assert!(fake.live_summaries()[0].entries.is_empty());
    }
}
