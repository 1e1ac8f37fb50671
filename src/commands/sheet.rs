use serenity::all::{Context, Message};

use crate::commands::{require_role, say, send_pager, split_word};
use crate::deposits;
use crate::error::InputError;
use crate::handlers::Handler;
use crate::pagination::paginate;
use crate::sheets;

const LOG_PAGE: usize = 1980;
const LOOT_PAGE: usize = 1950;

pub async fn log(h: &Handler, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    let (player, _) = split_word(args).ok_or(InputError::Usage("log <player>"))?;
    let rows = h.sheets.rows(h.sheets.default_key()).await?;
    let entries = sheets::player_logs(&rows, player);
    if entries.is_empty() {
        return say(ctx, msg, "No logs found for the user.").await;
    }
    for page in paginate(&sheets::log_table(&entries), LOG_PAGE) {
        say(ctx, msg, format!("```{page}```")).await?;
    }
    Ok(())
}

pub async fn total_logger(h: &Handler, ctx: &Context, msg: &Message, args: &str) -> anyhow::Result<()> {
    let key = split_word(args).map(|(k, _)| k).unwrap_or_else(|| h.sheets.default_key());
    if key.is_empty() {
        anyhow::bail!("no spreadsheet key given and SPREADSHEET_KEY is unset");
    }
    let rows = h.sheets.rows(key).await?;
    let totals = sheets::totals(&rows);
    if totals.is_empty() {
        return say(ctx, msg, "No logs found in the spreadsheet.").await;
    }
    send_pager(ctx, msg, paginate(&sheets::totals_table(&totals), LOG_PAGE)).await
}

pub async fn loot_logger(h: &Handler, ctx: &Context, msg: &Message) -> anyhow::Result<()> {
    require_role(ctx, msg, &h.config.roles.officers, "You do not have permission to use this command.").await?;
    if !h.boards.general.allows(msg.channel_id) {
        return Err(InputError::WrongChannel.into());
    }
    let csvs = &msg.attachments;
    if csvs.is_empty() || !csvs.iter().all(|a| a.filename.to_lowercase().ends_with(".csv")) {
        return Err(InputError::MissingCsv.into());
    }

    let mut tables = Vec::with_capacity(csvs.len());
    for attachment in csvs {
        let data = attachment.download().await?;
        let members = deposits::reconcile(&data, &h.config.guilds.loot_guilds)?;
        tracing::debug!(file = %attachment.filename, members = members.len(), "deposit export read");
        tables.push(deposits::deposits_table(&members));
    }
    send_pager(ctx, msg, paginate(&tables.join("\n"), LOOT_PAGE)).await
}
