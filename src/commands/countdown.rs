use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serenity::all::{Context, Message};

use crate::commands::{require_role, split_word};
use crate::countdown::lifecycle::{self, StartRequest};
use crate::countdown::{BoardKind, DurationPolicy};
use crate::error::{CountdownError, InputError};
use crate::handlers::{chat_surface, Handler};

const MEMBERS_ONLY: &str = "Sorry, only members or trials can use this command.";
const MAX_HOURS: i64 = 24 * 365;

fn usage(kind: BoardKind) -> &'static str {
    match kind {
        BoardKind::General => "content_in <HH:MM> [label]",
        BoardKind::WorldBoss => "wb <YYYY-MM-DD> <HH:MM> [label]",
    }
}

/// `content_in` / `wb`: start a countdown on the board of `kind`.
pub async fn start(h: &Handler, ctx: &Context, msg: &Message, kind: BoardKind, args: &str) -> anyhow::Result<()> {
    let board = h.boards.get(kind);
    if !board.allows(msg.channel_id) {
        return Err(InputError::WrongChannel.into());
    }
    if board.config().members_only {
        require_role(ctx, msg, &h.config.roles.members, MEMBERS_ONLY).await?;
    }

    let (expires_at, label) = parse_start(board.config().duration, args, Utc::now()).map_err(|e| match e {
        InputError::Usage(_) => InputError::Usage(usage(kind)),
        other => other,
    })?;

    let req = StartRequest {
        guild: msg.guild_id,
        channel: msg.channel_id,
        reply_to: Some(msg.id),
        initiator: msg.author.id,
        expires_at,
        label,
    };
    match lifecycle::start(board, &chat_surface(ctx), req).await {
        Ok(_task) => Ok(()),
        Err(e) if matches!(e.downcast_ref::<CountdownError>(), Some(CountdownError::NotInFuture)) => {
            Err(InputError::NotInFuture.into())
        }
        Err(e) => Err(e),
    }
}

/// `remove` / `remove_wb`: drop the n-th countdown as listed in the summary.
pub async fn remove(h: &Handler, ctx: &Context, msg: &Message, kind: BoardKind, args: &str) -> anyhow::Result<()> {
    let board = h.boards.get(kind);
    if board.config().members_only {
        require_role(ctx, msg, &h.config.roles.members, MEMBERS_ONLY).await?;
    }
    let index = parse_index(args)?;

    let removed = match board.remove_by_position(index).await {
        Ok(r) => r,
        Err(CountdownError::InvalidPosition { .. }) => return Err(InputError::BadIndex.into()),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(board = kind.name(), message = %removed.id, by = %msg.author.id, "countdown removed by position");

    board.refresh_summary(chat_surface(ctx).as_ref(), msg.channel_id).await?;
    Ok(())
}

/// Expiry and label of a start request under `policy`.
pub fn parse_start(
    policy: DurationPolicy,
    args: &str,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, String), InputError> {
    let (expires_at, label) = match policy {
        DurationPolicy::Relative => {
            let (time, label) = split_word(args).ok_or(InputError::Usage(""))?;
            (now + parse_relative(time)?, label)
        }
        DurationPolicy::FixedWindow { hours } => {
            let (date, rest) = split_word(args).ok_or(InputError::Usage(""))?;
            let (time, label) = split_word(rest).ok_or(InputError::Usage(""))?;
            (parse_utc(date, time)? + Duration::hours(hours), label)
        }
    };
    if expires_at <= now {
        return Err(InputError::NotInFuture);
    }
    Ok((expires_at, label.trim().to_string()))
}

/// `HH:MM` as a duration. Hours may exceed a day.
pub fn parse_relative(raw: &str) -> Result<Duration, InputError> {
    let (h, m) = raw.split_once(':').ok_or(InputError::BadTime)?;
    let digits = |s: &str| !s.is_empty() && s.len() <= 4 && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(h) || !digits(m) {
        return Err(InputError::BadTime);
    }
    let hours: i64 = h.parse().map_err(|_| InputError::BadTime)?;
    let minutes: i64 = m.parse().map_err(|_| InputError::BadTime)?;
    if minutes >= 60 || hours > MAX_HOURS {
        return Err(InputError::BadTime);
    }
    Ok(Duration::hours(hours) + Duration::minutes(minutes))
}

/// `YYYY-MM-DD` and `HH:MM`, read as UTC.
pub fn parse_utc(date: &str, time: &str) -> Result<DateTime<Utc>, InputError> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| InputError::BadDate)?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| InputError::BadDate)?;
    Ok(date.and_time(time).and_utc())
}

fn parse_index(args: &str) -> Result<usize, InputError> {
    let (raw, _) = split_word(args).ok_or(InputError::BadIndex)?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(InputError::BadIndex),
    }
}
