use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, GuildId, MessageId, UserId};

/// Who started a countdown.
///
/// Snapshots store the numeric user id. Older snapshot files carry a display name
/// instead; those records can still be removed by position but no reaction can
/// cancel them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initiator {
    User(UserId),
    Legacy(String),
}

impl Initiator {
    pub fn matches(&self, user: UserId) -> bool {
        matches!(self, Initiator::User(id) if *id == user)
    }

    pub fn to_stored(&self) -> String {
        match self {
            Initiator::User(id) => id.get().to_string(),
            Initiator::Legacy(name) => name.clone(),
        }
    }

    pub fn from_stored(raw: &str) -> Self {
        match raw.trim().parse::<u64>() {
            Ok(id) if id != 0 => Initiator::User(UserId::new(id)),
            _ => Initiator::Legacy(raw.to_string()),
        }
    }
}

/// One active countdown, keyed by the id of its announcement message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownRecord {
    pub id: MessageId,
    pub expires_at: DateTime<Utc>,
    pub initiator: Initiator,
    pub label: String,
    pub permalink: Option<String>,
}

impl CountdownRecord {
    /// Channel of the announcement, recovered from the permalink.
    pub fn channel(&self) -> Option<ChannelId> {
        self.permalink.as_deref().and_then(parse_permalink).map(|(channel, _)| channel)
    }
}

pub fn permalink(guild: Option<GuildId>, channel: ChannelId, message: MessageId) -> String {
    let scope = guild.map(|g| g.get().to_string()).unwrap_or_else(|| "@me".to_string());
    format!("https://discord.com/channels/{}/{}/{}", scope, channel.get(), message.get())
}

/* ".../channels/<guild|@me>/<channel>/<message>" -> (channel, message) */
pub fn parse_permalink(link: &str) -> Option<(ChannelId, MessageId)> {
    let rest = link.split("/channels/").nth(1)?;
    let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
    match parts.as_slice() {
        [_scope, channel, message] => {
            let channel: u64 = channel.parse().ok().filter(|v| *v != 0)?;
            let message: u64 = message.parse().ok().filter(|v| *v != 0)?;
            Some((ChannelId::new(channel), MessageId::new(message)))
        }
        _ => None,
    }
}
