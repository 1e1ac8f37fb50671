use serenity::all::{GuildId, Http, UserId};

/// `1234.4` -> "` 1,234 ` :coin:"
pub fn format_number(amount: f64) -> String {
    format!("` {} ` :coin:", group_thousands(amount))
}

fn group_thousands(amount: f64) -> String {
    let digits = format!("{:.0}", amount.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if amount < 0.0 && digits != "0" {
        out.insert(0, '-');
    }
    out
}

/// Case-insensitive: does any held role name appear in `wanted`?
pub fn role_matches<'a>(held: impl IntoIterator<Item = &'a str>, wanted: &[String]) -> bool {
    held.into_iter()
        .any(|name| wanted.iter().any(|w| w.eq_ignore_ascii_case(name)))
}

/// Whether `user` holds any of the named roles in `guild`.
pub async fn has_any_role(http: &Http, guild: GuildId, user: UserId, wanted: &[String]) -> anyhow::Result<bool> {
    let roles = guild.roles(http).await?;
    let member = guild.member(http, user).await?;
    let held = member
        .roles
        .iter()
        .filter_map(|rid| roles.get(rid))
        .map(|r| r.name.as_str());
    Ok(role_matches(held, wanted))
}

/// Guild owner, or any role carrying the administrator permission.
pub async fn is_administrator(http: &Http, guild: GuildId, user: UserId) -> anyhow::Result<bool> {
    let partial = guild.to_partial_guild(http).await?;
    if partial.owner_id == user {
        return Ok(true);
    }
    let member = guild.member(http, user).await?;
    Ok(member
        .roles
        .iter()
        .filter_map(|rid| partial.roles.get(rid))
        .any(|r| r.permissions.administrator()))
}

/// True when a chat call failed because the target no longer exists.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<serenity::Error>() {
        Some(serenity::Error::Http(http)) => http.status_code().is_some_and(|s| s.as_u16() == 404),
        _ => false,
    }
}
