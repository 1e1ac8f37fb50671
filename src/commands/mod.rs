pub mod countdown;
pub mod ledger;
pub mod sheet;

use serenity::all::{Context, Message, ReactionType};

use crate::countdown::BoardKind;
use crate::error::InputError;
use crate::handlers::Handler;
use crate::pagination::{self, Pager, BACK_EMOJI, FORWARD_EMOJI};
use crate::utils;

// Discord rejects messages above 2000 characters
const MESSAGE_LIMIT: usize = 1990;

/// A prefixed command: lower-cased name and the raw remainder.
#[derive(Debug, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub name: String,
    pub args: &'a str,
}

pub fn parse_invocation<'a>(prefix: &str, content: &'a str) -> Option<Invocation<'a>> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, args) = split_word(rest)?;
    Some(Invocation { name: name.to_lowercase(), args })
}

/// First whitespace-separated word and whatever follows it.
pub fn split_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], s[i..].trim())),
        None => Some((s, "")),
    }
}

pub async fn dispatch(h: &Handler, ctx: &Context, msg: &Message) {
    let Some(inv) = parse_invocation(&h.config.prefix, &msg.content) else {
        return;
    };
    let args = inv.args;
    let result = match inv.name.as_str() {
        "content_in" => countdown::start(h, ctx, msg, BoardKind::General, args).await,
        "wb" => countdown::start(h, ctx, msg, BoardKind::WorldBoss, args).await,
        "remove" => countdown::remove(h, ctx, msg, BoardKind::General, args).await,
        "remove_wb" => countdown::remove(h, ctx, msg, BoardKind::WorldBoss, args).await,
        "signup" => ledger::signup(h, ctx, msg, args).await,
        "delete_user" => ledger::delete_user(h, ctx, msg).await,
        "add" => ledger::add(h, ctx, msg, args).await,
        "payout" => ledger::payout(h, ctx, msg, args).await,
        "ball" => ledger::ball(h, ctx, msg, args).await,
        "add_link" => ledger::add_link(h, ctx, msg, args).await,
        "log" => sheet::log(h, ctx, msg, args).await,
        "total_logger" => sheet::total_logger(h, ctx, msg, args).await,
        "loot_logger" => sheet::loot_logger(h, ctx, msg).await,
        "helpp" => help(h, ctx, msg).await,
        _ => return,
    };
    tracing::debug!(command = %inv.name, user = %msg.author.id, ok = result.is_ok(), "command handled");
    if let Err(err) = result {
        report(ctx, msg, &inv.name, err).await;
    }
}

async fn report(ctx: &Context, msg: &Message, command: &str, err: anyhow::Error) {
    let text = match err.downcast_ref::<InputError>() {
        Some(input) => input.to_string(),
        None => {
            tracing::error!(command, channel = %msg.channel_id, "command failed: {err:#}");
            "An error occurred while processing the command. Please try again later.".to_string()
        }
    };
    if let Err(e) = msg.channel_id.say(&ctx.http, text).await {
        tracing::warn!(command, "could not report command failure: {e}");
    }
}

async fn help(h: &Handler, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
    msg.channel_id
        .send_message(
            &ctx.http,
            serenity::builder::CreateMessage::new().embed(crate::ui::embeds::help_embed(&h.config.prefix)),
        )
        .await?;
    Ok(())
}

pub(crate) async fn say(ctx: &Context, msg: &Message, text: impl Into<String>) -> anyhow::Result<()> {
    msg.channel_id.say(&ctx.http, text).await?;
    Ok(())
}

/// Send `text` as consecutive messages, each under the size limit.
pub(crate) async fn say_long(ctx: &Context, msg: &Message, text: &str) -> anyhow::Result<()> {
    for page in pagination::paginate(text, MESSAGE_LIMIT) {
        if !page.trim().is_empty() {
            say(ctx, msg, page).await?;
        }
    }
    Ok(())
}

/// Post `pages` as one message the author can page through with the arrow reactions.
pub(crate) async fn send_pager(ctx: &Context, msg: &Message, pages: Vec<String>) -> anyhow::Result<()> {
    let pager = Pager::new(pages, msg.author.id);
    let posted = msg.channel_id.say(&ctx.http, pager.render()).await?;
    let count = pager.page_count();
    pagination::register(posted.id, pager);
    posted.react(&ctx.http, ReactionType::Unicode(BACK_EMOJI.to_string())).await?;
    posted.react(&ctx.http, ReactionType::Unicode(FORWARD_EMOJI.to_string())).await?;
    tracing::debug!(message = %posted.id, pages = count, "pager posted");
    Ok(())
}

/// Fails with `denial` unless the author holds one of `roles` in this guild.
pub(crate) async fn require_role(
    ctx: &Context,
    msg: &Message,
    roles: &[String],
    denial: &'static str,
) -> anyhow::Result<()> {
    let Some(guild) = msg.guild_id else {
        return Err(InputError::Forbidden(denial).into());
    };
    if utils::has_any_role(&ctx.http, guild, msg.author.id, roles).await? {
        Ok(())
    } else {
        Err(InputError::Forbidden(denial).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_prefixed_and_case_insensitive() {
        let inv = parse_invocation("#", "#Content_In 01:30 Castle run").unwrap();
        assert_eq!(inv, Invocation { name: "content_in".into(), args: "01:30 Castle run" });
        assert_eq!(parse_invocation("#", "#helpp").unwrap().args, "");
    }

    #[test]
    fn non_commands_are_ignored() {
        assert!(parse_invocation("#", "hello #wb").is_none());
        assert!(parse_invocation("#", "# wb").is_none());
        assert!(parse_invocation("#", "#").is_none());
        assert!(parse_invocation("!", "#wb").is_none());
    }

    #[test]
    fn split_word_keeps_inner_spacing_of_the_rest() {
        assert_eq!(split_word("  a  b  c "), Some(("a", "b  c")));
        assert_eq!(split_word("one"), Some(("one", "")));
        assert_eq!(split_word("   "), None);
    }
}
