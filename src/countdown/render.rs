use chrono::{DateTime, Utc};

use crate::countdown::board::BoardKind;
use crate::countdown::record::CountdownRecord;

pub const SUMMARY_TITLE: &str = "Active Countdowns";
pub const EMPTY_SUMMARY: &str = "No countdowns currently active.";
pub const ENDED: &str = "Content ended!";
const LIST_HEADER: &str = "_List of ongoing countdowns:_  \n 😵‍💫";
// Discord caps an embed at 25 fields
const MAX_FIELDS: usize = 25;

/// Board state as a message: the summary embed, independent of the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub title: String,
    pub description: String,
    pub entries: Vec<SummaryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub name: String,
    pub value: String,
}

/// `records` must already be in display order (ascending expiry).
pub fn render_summary<'a>(
    kind: BoardKind,
    records: impl IntoIterator<Item = &'a CountdownRecord>,
) -> SummaryView {
    let records: Vec<&CountdownRecord> = records.into_iter().collect();
    if records.is_empty() {
        return SummaryView {
            title: SUMMARY_TITLE.to_string(),
            description: EMPTY_SUMMARY.to_string(),
            entries: Vec::new(),
        };
    }

    let shown = if records.len() > MAX_FIELDS { MAX_FIELDS - 1 } else { records.len() };
    let mut entries: Vec<SummaryEntry> = records
        .iter()
        .take(shown)
        .enumerate()
        .map(|(i, r)| render_entry(kind, i + 1, r))
        .collect();
    if records.len() > shown {
        entries.push(SummaryEntry {
            name: "…".to_string(),
            value: format!("... and {} more", records.len() - shown),
        });
    }

    SummaryView {
        title: SUMMARY_TITLE.to_string(),
        description: LIST_HEADER.to_string(),
        entries,
    }
}

fn render_entry(kind: BoardKind, position: usize, r: &CountdownRecord) -> SummaryEntry {
    let info = if r.label.trim().is_empty() {
        format!("Content: {position}")
    } else {
        format!("**{}**", r.label.trim())
    };
    let link = match &r.permalink {
        Some(url) => format!("[{}{}]({})", kind.link_glyph(), info, url),
        None => info,
    };
    let when = format!(
        "{} `📅 {}`  `🕦 {} UTC`",
        relative_tag(r.expires_at),
        r.expires_at.format("%A"),
        r.expires_at.format("%H:%M")
    );
    SummaryEntry {
        name: format!("Countdown {position}"),
        value: format!("{link}\n{when}"),
    }
}

/// Discord renders `<t:..:R>` client-side as "in 2 hours", so the text itself is stable.
pub fn relative_tag(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

pub fn announcement(kind: BoardKind, expires_at: DateTime<Utc>) -> String {
    match kind {
        BoardKind::General => format!(
            "Countdown will end: {}  `🕦 {}`  `📅 {}` UTC",
            relative_tag(expires_at),
            expires_at.format("%H:%M"),
            expires_at.format("%A")
        ),
        BoardKind::WorldBoss => format!(
            "Countdown will end: {} ({} UTC)",
            relative_tag(expires_at),
            expires_at.format("%Y-%m-%d `%H:%M:%S`")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::record::Initiator;
    use chrono::TimeZone;
    use serenity::all::{MessageId, UserId};

    fn rec(id: u64, hour: u32, label: &str, link: bool) -> CountdownRecord {
        CountdownRecord {
            id: MessageId::new(id),
            expires_at: Utc.with_ymd_and_hms(2030, 3, 4, hour, 5, 0).unwrap(),
            initiator: Initiator::User(UserId::new(3)),
            label: label.to_string(),
            permalink: link.then(|| format!("https://discord.com/channels/1/2/{id}")),
        }
    }

    #[test]
    fn empty_board_renders_fixed_message() {
        let view = render_summary(BoardKind::General, std::iter::empty());
        assert_eq!(view.description, EMPTY_SUMMARY);
        assert!(view.entries.is_empty());
    }

    #[test]
    fn entries_follow_given_order_with_labels_and_links() {
        let a = rec(1, 9, "", true);
        let b = rec(2, 14, "Castle run", false);
        let view = render_summary(BoardKind::General, [&a, &b]);

        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].name, "Countdown 1");
        assert!(view.entries[0]
            .value
            .starts_with("[Content: 1](https://discord.com/channels/1/2/1)\n"));
        assert!(view.entries[0].value.contains("`📅 Monday`  `🕦 09:05 UTC`"));
        assert!(view.entries[1].value.starts_with("**Castle run**\n"));
    }

    #[test]
    fn world_boss_links_carry_globe() {
        let a = rec(1, 9, "Hydra", true);
        let view = render_summary(BoardKind::WorldBoss, [&a]);
        assert!(view.entries[0].value.starts_with("[🌎 **Hydra**]("));
    }

    #[test]
    fn rendering_is_deterministic() {
        let recs = [rec(1, 9, "x", true), rec(2, 10, "", true)];
        assert_eq!(
            render_summary(BoardKind::General, recs.iter()),
            render_summary(BoardKind::General, recs.iter())
        );
    }

    #[test]
    fn oversized_boards_are_capped_at_field_limit() {
        let recs: Vec<CountdownRecord> = (1..=30).map(|i| rec(i, 9, "", false)).collect();
        let view = render_summary(BoardKind::General, recs.iter());
        assert_eq!(view.entries.len(), MAX_FIELDS);
        assert_eq!(view.entries.last().unwrap().value, "... and 6 more");
    }

    #[test]
    fn announcements_differ_per_board() {
        let at = Utc.with_ymd_and_hms(2030, 3, 4, 18, 0, 0).unwrap();
        let ts = at.timestamp();
        assert_eq!(
            announcement(BoardKind::General, at),
            format!("Countdown will end: <t:{ts}:R>  `🕦 18:00`  `📅 Monday` UTC")
        );
        assert_eq!(
            announcement(BoardKind::WorldBoss, at),
            format!("Countdown will end: <t:{ts}:R> (2030-03-04 `18:00:00` UTC)")
        );
    }
}
