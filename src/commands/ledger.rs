use once_cell::sync::Lazy;
use regex::Regex;
use serenity::all::{Context, Message};

use crate::battle;
use crate::commands::{require_role, say, say_long, split_word};
use crate::db::repo;
use crate::error::InputError;
use crate::handlers::Handler;
use crate::utils::{self, format_number};

static PAREN_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((.*?)\)").expect("static regex"));

/// Contents of every `( ... )` group, in order.
pub fn paren_args(args: &str) -> Vec<String> {
    PAREN_ARG
        .captures_iter(args)
        .map(|c| c[1].trim().to_string())
        .collect()
}

pub fn name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Share of each member after the guild tax (in percent).
pub fn split_amount(amount: f64, tax_percent: f64) -> f64 {
    amount * (1.0 - tax_percent / 100.0)
}

fn parse_number(raw: &str) -> Result<f64, InputError> {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(InputError::BadNumber(raw.trim().to_string())),
    }
}

pub async fn signup(h: &Handler, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    require_role(ctx, msg, &h.config.roles.members, "Sorry, only members or trials can use this command.").await?;
    let (ign, _) = split_word(args).ok_or(InputError::Usage("signup <ign_username>"))?;

    let discord_id = msg.author.id.to_string();
    if repo::is_signed_up(&h.pool, &discord_id).await? {
        return say(ctx, msg, "You are already signed up!").await;
    }
    let user = repo::create_user(&h.pool, &discord_id, &msg.author.name, ign).await?;
    tracing::info!(user = user.id, ign = %user.ign_username, "member signed up");
    say(ctx, msg, "You have been successfully signed up!").await
}

pub async fn delete_user(h: &Handler, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
    const ADMINS_ONLY: &str = "Sorry, only administrators can use this command.";
    let Some(guild) = msg.guild_id else {
        return Err(InputError::Forbidden(ADMINS_ONLY).into());
    };
    if !utils::is_administrator(&ctx.http, guild, msg.author.id).await? {
        return Err(InputError::Forbidden(ADMINS_ONLY).into());
    }
    if msg.mentions.is_empty() {
        return Err(InputError::Usage("delete_user <@user1> <@user2> ...").into());
    }

    let mut deleted = Vec::new();
    let mut not_found = Vec::new();
    for user in &msg.mentions {
        let name = user.global_name.clone().unwrap_or_else(|| user.name.clone());
        if repo::delete_user(&h.pool, &user.id.to_string()).await? {
            deleted.push(name);
        } else {
            not_found.push(name);
        }
    }

    let mut lines = Vec::new();
    if !deleted.is_empty() {
        lines.push(format!("Users ** {} ** have been deleted from the database.", deleted.join(", ")));
    }
    if !not_found.is_empty() {
        lines.push(format!("Users ** {} ** were not found in the database.", not_found.join(", ")));
    }
    say(ctx, msg, lines.join("\n")).await
}

/// `add (<amount>) (<names>) (<tax %>)`
pub async fn add(h: &Handler, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    const USAGE: &str = "add (<amount>) (<user names>) (<tax percentage>)";
    let parts = paren_args(args);
    let [amount, names, tax] = parts.as_slice() else {
        return Err(InputError::Usage(USAGE).into());
    };
    let share = split_amount(parse_number(amount)?, parse_number(tax)?);
    let names = name_list(names);
    if names.is_empty() {
        return Err(InputError::Usage(USAGE).into());
    }

    let mut found = Vec::new();
    let mut lines = Vec::new();
    for name in &names {
        match repo::find_user(&h.pool, name).await? {
            Some(user) => found.push((name.clone(), user.id)),
            None => lines.push(format!("User \"**{name}**\" not found.")),
        }
    }
    if !found.is_empty() {
        let ids: Vec<i64> = found.iter().map(|(_, id)| *id).collect();
        repo::add_splits(&h.pool, &ids, share, &msg.author.id.to_string()).await?;
        let who: Vec<&str> = found.iter().map(|(n, _)| n.as_str()).collect();
        lines.push(format!(
            "Money added to **{}** loot split successfully! Amount: {}",
            who.join(", "),
            format_number(share)
        ));
        tracing::info!(members = ids.len(), share, by = %msg.author.id, "loot split added");
    }
    say_long(ctx, msg, &lines.join("\n")).await
}

/// `payout (<names>)`: pay each member their whole balance.
pub async fn payout(h: &Handler, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    const USAGE: &str = "payout (<user names>)";
    let parts = paren_args(args);
    let [names] = parts.as_slice() else {
        return Err(InputError::Usage(USAGE).into());
    };
    let names = name_list(names);
    if names.is_empty() {
        return Err(InputError::Usage(USAGE).into());
    }

    let mut lines = Vec::new();
    for name in &names {
        match repo::find_user(&h.pool, name).await? {
            Some(user) => {
                let paid = repo::record_payout(&h.pool, user.id, &msg.author.id.to_string()).await?;
                tracing::info!(user = user.id, paid, by = %msg.author.id, "payout recorded");
                lines.push(format!(
                    "Payout of {} made to user \"**{name}**\" successfully!",
                    format_number(paid)
                ));
            }
            None => lines.push(format!("User \"**{name}**\" not found.")),
        }
    }
    say_long(ctx, msg, &lines.join("\n")).await
}

pub async fn ball(h: &Handler, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    let (name, _) = split_word(args).ok_or(InputError::Usage("ball <user name>"))?;
    let Some(user) = repo::find_user(&h.pool, name).await? else {
        return say(ctx, msg, format!("User ** {name} ** not found.")).await;
    };
    let text = match repo::user_total(&h.pool, user.id).await? {
        Some(total) => format!("Total amount for user ** {name} **: {}", format_number(total)),
        None => format!("No total amount found for user ** {name} **."),
    };
    say(ctx, msg, text).await
}

/// `add_link <amount> <link>`: credit every guild member seen in a battle report.
pub async fn add_link(h: &Handler, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    const USAGE: &str = "add_link <amount> <battle link>";
    let (raw_amount, rest) = split_word(args).ok_or(InputError::Usage(USAGE))?;
    let (link, _) = split_word(rest).ok_or(InputError::Usage(USAGE))?;
    let amount: i64 = raw_amount
        .parse()
        .map_err(|_| InputError::BadNumber(raw_amount.to_string()))?;
    let api = battle::api_link(&h.config.guilds.battle_api_base, link).ok_or(InputError::BadLink)?;

    let response = h.http_client.get(&api).send().await?;
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), url = %api, "battle report fetch failed");
        return say(ctx, msg, "Failed to fetch battle board data. Please check the link and try again.").await;
    }
    let report: serde_json::Value = response.json().await?;
    let names = battle::participant_names(&report, &h.config.guilds.battle_guild);
    if names.is_empty() {
        return say(ctx, msg, "No participant names found in the provided link.").await;
    }

    let share = split_amount(amount as f64, 0.0);
    let mut ids = Vec::new();
    let mut lines = Vec::new();
    for name in &names {
        match repo::find_user(&h.pool, name).await? {
            Some(user) => {
                ids.push(user.id);
                lines.push(format!(
                    "Money added to **{name}'s** loot split successfully! Amount: {}",
                    format_number(share)
                ));
            }
            None => lines.push(format!("User **{name}** not found in the database.")),
        }
    }
    if !ids.is_empty() {
        repo::add_splits(&h.pool, &ids, share, &msg.author.id.to_string()).await?;
        tracing::info!(members = ids.len(), share, url = %api, "battle split added");
    }
    say_long(ctx, msg, &lines.join("\n")).await
}
