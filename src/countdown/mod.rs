//! Countdown boards: timed announcements tracked per board, persisted to a JSON
//! snapshot and mirrored by a single summary message.

pub mod board;
pub mod lifecycle;
pub mod record;
pub mod registry;
pub mod render;
pub mod store;
pub mod surface;

use std::sync::Arc;

use serenity::all::MessageId;

pub use board::{Board, BoardConfig, BoardKind, CancelOutcome, DurationPolicy};
pub use surface::{ChatSurface, SerenityChat};

/// The two independent boards the bot runs.
#[derive(Clone)]
pub struct Boards {
    pub general: Arc<Board>,
    pub world_boss: Arc<Board>,
}

impl Boards {
    pub async fn open(general: BoardConfig, world_boss: BoardConfig) -> Self {
        Self {
            general: Arc::new(Board::open(general).await),
            world_boss: Arc::new(Board::open(world_boss).await),
        }
    }

    pub fn all(&self) -> [&Arc<Board>; 2] {
        [&self.general, &self.world_boss]
    }

    pub fn get(&self, kind: BoardKind) -> &Arc<Board> {
        match kind {
            BoardKind::General => &self.general,
            BoardKind::WorldBoss => &self.world_boss,
        }
    }

    /// Which board tracks this announcement, if any.
    pub async fn tracking(&self, id: MessageId) -> Option<&Arc<Board>> {
        for board in self.all() {
            if board.contains(id).await {
                return Some(board);
            }
        }
        None
    }
}
