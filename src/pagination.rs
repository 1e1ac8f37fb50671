use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serenity::all::{MessageId, UserId};

pub const BACK_EMOJI: &str = "⬅️";
pub const FORWARD_EMOJI: &str = "➡️";
const SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// Split `text` into pages of at most `max_size` characters, breaking only between
/// lines. A line longer than `max_size` on its own is cut at the boundary.
/// Always returns at least one page.
pub fn paginate(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);
    let mut pages: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    // no line written to `current` yet
    let mut fresh = true;

    for line in text.split('\n') {
        let mut chars: Vec<char> = line.chars().collect();

        while chars.len() > max_size {
            if !fresh {
                pages.push(std::mem::take(&mut current));
                current_len = 0;
                fresh = true;
            }
            let rest = chars.split_off(max_size);
            pages.push(chars.into_iter().collect());
            chars = rest;
        }

        let needed = if fresh { chars.len() } else { current_len + 1 + chars.len() };
        if needed > max_size {
            pages.push(std::mem::take(&mut current));
            current_len = 0;
            fresh = true;
        }
        if !fresh {
            current.push('\n');
            current_len += 1;
        }
        current.extend(chars.iter());
        current_len += chars.len();
        fresh = false;
    }

    pages.push(current);
    pages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

impl Direction {
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            BACK_EMOJI => Some(Direction::Back),
            FORWARD_EMOJI => Some(Direction::Forward),
            _ => None,
        }
    }
}

/// Next page index, clamped to `[0, page_count - 1]`.
pub fn navigate(current: usize, page_count: usize, dir: Direction) -> usize {
    let last = page_count.saturating_sub(1);
    match dir {
        Direction::Back => current.saturating_sub(1).min(last),
        Direction::Forward => (current + 1).min(last),
    }
}

/// A paged message owned by the user who asked for it.
#[derive(Debug, Clone)]
pub struct Pager {
    pages: Vec<String>,
    current: usize,
    owner: UserId,
}

impl Pager {
    pub fn new(pages: Vec<String>, owner: UserId) -> Self {
        let pages = if pages.is_empty() { vec![String::new()] } else { pages };
        Self { pages, current: 0, owner }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns whether the page changed.
    pub fn turn(&mut self, dir: Direction) -> bool {
        let next = navigate(self.current, self.pages.len(), dir);
        let changed = next != self.current;
        self.current = next;
        changed
    }

    pub fn render(&self) -> String {
        format!(
            "```Page {}/{}\n{}```",
            self.current + 1,
            self.pages.len(),
            self.pages[self.current]
        )
    }
}

static PAGERS: Lazy<DashMap<MessageId, Pager>> = Lazy::new(DashMap::new);

/// Track a pager posted as `message`; the session is dropped after a while.
pub fn register(message: MessageId, pager: Pager) {
    PAGERS.insert(message, pager);
    tokio::spawn(async move {
        tokio::time::sleep(SESSION_TTL).await;
        PAGERS.remove(&message);
    });
}

/// Turn the pager on `message` for `user`. Returns the new content when the user owns
/// the pager and the page actually changed.
pub fn turn(message: MessageId, user: UserId, dir: Direction) -> Option<String> {
    let mut entry = PAGERS.get_mut(&message)?;
    let pager = entry.value_mut();
    if pager.owner() != user || !pager.turn(dir) {
        return None;
    }
    Some(pager.render())
}

pub fn is_pager(message: MessageId) -> bool {
    PAGERS.contains_key(&message)
}
