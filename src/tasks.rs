use std::sync::Arc;

use crate::countdown::lifecycle;
use crate::countdown::{Boards, ChatSurface};

/// Give every persisted countdown of both boards a running lifecycle task again.
/// Records that ran out while the bot was offline expire on their first poll.
pub async fn restore_countdowns(boards: &Boards, chat: Arc<dyn ChatSurface>) -> usize {
    let mut restored = 0;
    for board in boards.all() {
        for record in board.records().await {
            let Some(channel) = record.channel().or_else(|| board.fallback_channel()) else {
                tracing::warn!(board = board.kind().name(), message = %record.id, "no channel to restore countdown in");
                continue;
            };
            tracing::debug!(board = board.kind().name(), message = %record.id, %channel, "restoring countdown");
            lifecycle::spawn(board.clone(), chat.clone(), record, channel);
            restored += 1;
        }
    }
    restored
}
