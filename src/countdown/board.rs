use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serenity::all::{ChannelId, MessageId, UserId};
use tokio::sync::{oneshot, Mutex};

use crate::countdown::record::CountdownRecord;
use crate::countdown::registry::{PositionOrder, Registry};
use crate::countdown::render::render_summary;
use crate::countdown::store::CountdownStore;
use crate::countdown::surface::ChatSurface;
use crate::error::CountdownError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardKind {
    General,
    WorldBoss,
}

impl BoardKind {
    pub fn name(self) -> &'static str {
        match self {
            BoardKind::General => "general",
            BoardKind::WorldBoss => "world_boss",
        }
    }

    pub fn link_glyph(self) -> &'static str {
        match self {
            BoardKind::General => "",
            BoardKind::WorldBoss => "🌎 ",
        }
    }
}

/// How a start request turns into an expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationPolicy {
    /// `HH:MM` from now.
    Relative,
    /// A UTC date and time plus a fixed window.
    FixedWindow { hours: i64 },
}

#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub kind: BoardKind,
    pub allowed_channels: HashSet<ChannelId>,
    pub store_path: PathBuf,
    pub duration: DurationPolicy,
    pub members_only: bool,
    pub poll_interval: Duration,
}

/// Why a lifecycle task was told to stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelSource {
    Reaction,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Signalled,
    NotTracked,
    NotInitiator,
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRef {
    pub channel: ChannelId,
    pub message: MessageId,
}

#[derive(Debug, Default)]
struct BoardState {
    registry: Registry,
    summary: Option<SummaryRef>,
}

/// One countdown board. Every read or write of the registry, the snapshot file and the
/// summary pointer goes through this type, under one lock.
pub struct Board {
    config: BoardConfig,
    store: CountdownStore,
    state: Mutex<BoardState>,
    signals: DashMap<MessageId, oneshot::Sender<CancelSource>>,
}

impl Board {
    pub async fn open(config: BoardConfig) -> Self {
        let store = CountdownStore::new(config.store_path.clone());
        let records = store.load().await;
        tracing::info!(board = config.kind.name(), count = records.len(), "countdown board loaded");
        Self {
            config,
            store,
            state: Mutex::new(BoardState {
                registry: Registry::from_records(records),
                summary: None,
            }),
            signals: DashMap::new(),
        }
    }

    pub fn kind(&self) -> BoardKind {
        self.config.kind
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn allows(&self, channel: ChannelId) -> bool {
        self.config.allowed_channels.contains(&channel)
    }

    /// Some channel of this board, for records whose announcement channel is unknown.
    pub fn fallback_channel(&self) -> Option<ChannelId> {
        self.config.allowed_channels.iter().min().copied()
    }

    /// Insert and persist. If the snapshot can't be written the insert is undone.
    pub async fn add(&self, record: CountdownRecord) -> Result<(), CountdownError> {
        let mut state = self.state.lock().await;
        let id = record.id;
        state.registry.add(record, Utc::now())?;
        if let Err(e) = self.store.save(state.registry.iter()).await {
            let _ = state.registry.remove(id);
            return Err(e);
        }
        Ok(())
    }

    /// Remove and persist. A failed write is logged; memory stays authoritative and
    /// the next successful write catches the file up.
    pub async fn remove(&self, id: MessageId) -> Result<CountdownRecord, CountdownError> {
        let mut state = self.state.lock().await;
        let removed = state.registry.remove(id)?;
        self.persist_logged(&state.registry).await;
        Ok(removed)
    }

    /// Remove the `index`-th countdown as displayed in the summary (1-based) and stop
    /// its lifecycle task.
    pub async fn remove_by_position(&self, index: usize) -> Result<CountdownRecord, CountdownError> {
        let mut state = self.state.lock().await;
        let removed = state.registry.remove_by_position(index, PositionOrder::Expiry)?;
        self.persist_logged(&state.registry).await;
        drop(state);
        self.signal(removed.id, CancelSource::Command);
        Ok(removed)
    }

    async fn persist_logged(&self, registry: &Registry) {
        if let Err(e) = self.store.save(registry.iter()).await {
            tracing::error!(board = self.config.kind.name(), "{e}");
        }
    }

    /// Snapshot of the active countdowns, ascending by expiry.
    pub async fn records(&self) -> Vec<CountdownRecord> {
        let state = self.state.lock().await;
        state.registry.list_sorted().cloned().collect()
    }

    pub async fn contains(&self, id: MessageId) -> bool {
        self.state.lock().await.registry.get(id).is_some()
    }

    #[cfg(test)]
    pub async fn summary(&self) -> Option<SummaryRef> {
        self.state.lock().await.summary
    }

    /// Replace the board's summary with a fresh render posted in `channel`.
    /// A previous summary that is already gone is logged and skipped.
    pub async fn refresh_summary(&self, chat: &dyn ChatSurface, channel: ChannelId) -> anyhow::Result<MessageId> {
        let mut state = self.state.lock().await;
        if let Some(prev) = state.summary.take() {
            if let Err(e) = chat.delete_message(prev.channel, prev.message).await {
                tracing::warn!(
                    board = self.config.kind.name(),
                    message = %prev.message,
                    "existing list message not found: {e}"
                );
            }
        }
        let view = render_summary(self.config.kind, state.registry.list_sorted());
        let message = chat.post_summary(channel, &view).await?;
        state.summary = Some(SummaryRef { channel, message });
        Ok(message)
    }

    /// Register a lifecycle task for `id`; the receiver fires when it must stop early.
    pub fn arm(&self, id: MessageId) -> oneshot::Receiver<CancelSource> {
        let (tx, rx) = oneshot::channel();
        self.signals.insert(id, tx);
        rx
    }

    pub fn disarm(&self, id: MessageId) {
        self.signals.remove(&id);
    }

    fn signal(&self, id: MessageId, source: CancelSource) -> bool {
        match self.signals.remove(&id) {
            Some((_, tx)) => tx.send(source).is_ok(),
            None => false,
        }
    }

    /// Cancel a tracked countdown on behalf of `user`, who must be its initiator.
    pub async fn request_cancel(&self, id: MessageId, user: UserId) -> CancelOutcome {
        {
            let state = self.state.lock().await;
            match state.registry.get(id) {
                None => return CancelOutcome::NotTracked,
                Some(r) if !r.initiator.matches(user) => return CancelOutcome::NotInitiator,
                Some(_) => {}
            }
        }
        if self.signal(id, CancelSource::Reaction) {
            CancelOutcome::Signalled
        } else {
            CancelOutcome::NotRunning
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::countdown::record::Initiator;
    use crate::countdown::render::EMPTY_SUMMARY;
    use crate::countdown::store::CountdownStore;
    use crate::countdown::surface::fake::FakeChat;
    use chrono::Duration as ChronoDuration;

    pub fn config_in(dir: &std::path::Path, kind: BoardKind) -> BoardConfig {
        BoardConfig {
            kind,
            allowed_channels: [ChannelId::new(500)].into_iter().collect(),
            store_path: dir.join(format!("{}.json", kind.name())),
            duration: DurationPolicy::Relative,
            members_only: false,
            poll_interval: Duration::from_millis(50),
        }
    }

    fn rec(id: u64, minutes: i64, owner: u64) -> CountdownRecord {
        CountdownRecord {
            id: MessageId::new(id),
            expires_at: Utc::now() + ChronoDuration::minutes(minutes),
            initiator: Initiator::User(UserId::new(owner)),
            label: String::new(),
            permalink: None,
        }
    }

    #[tokio::test]
    async fn add_is_visible_in_memory_and_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::open(config_in(dir.path(), BoardKind::General)).await;

        board.add(rec(10, 30, 1)).await.unwrap();

        assert!(board.contains(MessageId::new(10)).await);
        let on_disk = CountdownStore::new(&board.config().store_path).load().await;
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].id, MessageId::new(10));
    }

    #[tokio::test]
    async fn bad_position_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::open(config_in(dir.path(), BoardKind::General)).await;
        board.add(rec(1, 30, 1)).await.unwrap();
        board.add(rec(2, 10, 1)).await.unwrap();

        let err = board.remove_by_position(5).await.unwrap_err();
        assert!(matches!(err, CountdownError::InvalidPosition { index: 5, len: 2 }));
        assert_eq!(board.records().await.len(), 2);

        let gone = board.remove_by_position(1).await.unwrap();
        assert_eq!(gone.id, MessageId::new(2));
        let on_disk = CountdownStore::new(&board.config().store_path).load().await;
        assert_eq!(on_disk.iter().map(|r| r.id.get()).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn reopening_restores_the_board() {
        let dir = tempfile::tempdir().unwrap();
        {
            let board = Board::open(config_in(dir.path(), BoardKind::WorldBoss)).await;
            board.add(rec(3, 60, 1)).await.unwrap();
            board.add(rec(4, 5, 1)).await.unwrap();
        }
        let board = Board::open(config_in(dir.path(), BoardKind::WorldBoss)).await;
        let ids: Vec<u64> = board.records().await.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[tokio::test]
    async fn refresh_twice_leaves_one_identical_summary() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::open(config_in(dir.path(), BoardKind::General)).await;
        let chat = FakeChat::new();
        board.add(rec(1, 30, 1)).await.unwrap();

        board.refresh_summary(&chat, ChannelId::new(500)).await.unwrap();
        let first = chat.live_summaries();
        board.refresh_summary(&chat, ChannelId::new(500)).await.unwrap();
        let second = chat.live_summaries();

        assert_eq!(first.len(), 1);
        assert_eq!(second, first);
        assert_eq!(chat.summaries_posted.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(chat.live.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn refresh_survives_a_deleted_summary() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::open(config_in(dir.path(), BoardKind::General)).await;
        let chat = FakeChat::new();

        let old = board.refresh_summary(&chat, ChannelId::new(500)).await.unwrap();
        chat.delete_message(ChannelId::new(500), old).await.unwrap();
        let new = board.refresh_summary(&chat, ChannelId::new(501)).await.unwrap();

        assert_ne!(old, new);
        let live = chat.live_summaries();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].description, EMPTY_SUMMARY);
        assert_eq!(board.summary().await.unwrap().channel, ChannelId::new(501));
    }

    #[tokio::test]
    async fn only_the_initiator_can_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::open(config_in(dir.path(), BoardKind::General)).await;
        board.add(rec(9, 30, 42)).await.unwrap();

        assert_eq!(board.request_cancel(MessageId::new(8), UserId::new(42)).await, CancelOutcome::NotTracked);
        assert_eq!(board.request_cancel(MessageId::new(9), UserId::new(7)).await, CancelOutcome::NotInitiator);
        assert_eq!(board.request_cancel(MessageId::new(9), UserId::new(42)).await, CancelOutcome::NotRunning);

        let mut rx = board.arm(MessageId::new(9));
        assert_eq!(board.request_cancel(MessageId::new(9), UserId::new(42)).await, CancelOutcome::Signalled);
        assert_eq!(rx.try_recv().unwrap(), CancelSource::Reaction);
    }
}
