use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, MessageId, UserId};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::countdown::board::{Board, CancelSource};
use crate::countdown::record::{CountdownRecord, Initiator};
use crate::countdown::render::{announcement, ENDED};
use crate::countdown::surface::{ChatSurface, CANCEL_EMOJI};
use crate::error::CountdownError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Pending,
    Active,
    Expired,
    Cancelled,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Expired | LifecycleState::Cancelled)
    }
}

/// An accepted start command, already validated.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub guild: Option<GuildId>,
    pub channel: ChannelId,
    pub reply_to: Option<MessageId>,
    pub initiator: UserId,
    pub expires_at: DateTime<Utc>,
    pub label: String,
}

/// Announce, persist and track a new countdown. Returns the lifecycle task handle,
/// which resolves to the terminal state.
pub async fn start(
    board: &Arc<Board>,
    chat: &Arc<dyn ChatSurface>,
    req: StartRequest,
) -> anyhow::Result<JoinHandle<LifecycleState>> {
    if req.expires_at <= Utc::now() {
        return Err(CountdownError::NotInFuture.into());
    }

    let text = announcement(board.kind(), req.expires_at);
    let posted = chat.announce(req.guild, req.channel, req.reply_to, &text).await?;
    if let Err(e) = chat.react(req.channel, posted.message, CANCEL_EMOJI).await {
        tracing::warn!(message = %posted.message, "failed to add cancel reaction: {e:#}");
    }

    let record = CountdownRecord {
        id: posted.message,
        expires_at: req.expires_at,
        initiator: Initiator::User(req.initiator),
        label: req.label,
        permalink: Some(posted.permalink),
    };
    // armed before the record is visible, so a cancel can never find it unarmed
    let cancel = board.arm(record.id);
    if let Err(e) = board.add(record.clone()).await {
        board.disarm(record.id);
        let _ = chat.delete_message(req.channel, record.id).await;
        return Err(e.into());
    }
    tracing::info!(
        board = board.kind().name(),
        message = %record.id,
        expires_at = %record.expires_at,
        "countdown started"
    );

    if let Err(e) = board.refresh_summary(chat.as_ref(), req.channel).await {
        tracing::error!(board = board.kind().name(), "summary refresh failed: {e:#}");
    }

    Ok(run(board.clone(), chat.clone(), record, req.channel, cancel))
}

/// Run the lifecycle of a record restored from the snapshot.
pub fn spawn(
    board: Arc<Board>,
    chat: Arc<dyn ChatSurface>,
    record: CountdownRecord,
    channel: ChannelId,
) -> JoinHandle<LifecycleState> {
    let cancel = board.arm(record.id);
    run(board, chat, record, channel, cancel)
}

fn run(
    board: Arc<Board>,
    chat: Arc<dyn ChatSurface>,
    record: CountdownRecord,
    channel: ChannelId,
    cancel: oneshot::Receiver<CancelSource>,
) -> JoinHandle<LifecycleState> {
    let poll = board.config().poll_interval;
    tokio::spawn(async move {
        let mut task = Lifecycle { board, chat, record, channel, state: LifecycleState::Pending };
        task.advance(LifecycleState::Active);
        let outcome = wait(task.record.expires_at, poll, cancel).await;
        task.advance(outcome);
        task.retire().await;
        task.state
    })
}

struct Lifecycle {
    board: Arc<Board>,
    chat: Arc<dyn ChatSurface>,
    record: CountdownRecord,
    channel: ChannelId,
    state: LifecycleState,
}

impl Lifecycle {
    fn advance(&mut self, next: LifecycleState) {
        tracing::debug!(
            board = self.board.kind().name(),
            message = %self.record.id,
            from = ?self.state,
            to = ?next,
            "countdown transition"
        );
        self.state = next;
    }

    /// Same cleanup for both terminal states. Nothing here may fail the task.
    async fn retire(&self) {
        debug_assert!(self.state.is_terminal());
        let id = self.record.id;
        self.board.disarm(id);

        match self.board.remove(id).await {
            Ok(_) => {
                if let Err(e) = self.board.refresh_summary(self.chat.as_ref(), self.channel).await {
                    tracing::error!(board = self.board.kind().name(), "summary refresh failed: {e:#}");
                }
            }
            // removed by position while we were waiting; whoever did that refreshed
            Err(CountdownError::NotTracked(_)) => {
                tracing::debug!(message = %id, "countdown already removed");
            }
            Err(e) => tracing::error!(message = %id, "failed to retire countdown: {e}"),
        }

        if let Err(e) = self.chat.edit_message(self.channel, id, ENDED).await {
            tracing::warn!(message = %id, "could not mark announcement as ended: {e:#}");
        }
        tracing::info!(board = self.board.kind().name(), message = %id, state = ?self.state, "countdown finished");
    }
}

/// Sleep in `poll`-sized steps until `expires_at`, returning early on cancellation.
async fn wait(
    expires_at: DateTime<Utc>,
    poll: Duration,
    mut cancel: oneshot::Receiver<CancelSource>,
) -> LifecycleState {
    loop {
        let remaining = match (expires_at - Utc::now()).to_std() {
            Ok(d) if !d.is_zero() => d,
            _ => return LifecycleState::Expired,
        };
        tokio::select! {
            signal = &mut cancel => {
                if let Ok(source) = signal {
                    tracing::debug!(?source, "countdown cancel signal");
                }
                // a dropped sender means the board let go of this record
                return LifecycleState::Cancelled;
            }
            _ = tokio::time::sleep(remaining.min(poll)) => {}
        }
    }
}
