//! Battle reports from the game's public API.

use serde_json::Value;

/// Turn a public battle-board link into the API URL of the same battle.
pub fn api_link(api_base: &str, public_link: &str) -> Option<String> {
    let path = public_link.split(['?', '#']).next().unwrap_or_default();
    let battle_id = path.trim_end_matches('/').rsplit('/').next()?.trim();
    if battle_id.is_empty() || !battle_id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}/{}", api_base.trim_end_matches('/'), battle_id))
}

/// Names of the players in `report` whose guild is `guild` (any case).
pub fn participant_names(report: &Value, guild: &str) -> Vec<String> {
    let Some(players) = report.get("players").and_then(Value::as_object) else {
        return Vec::new();
    };
    players
        .values()
        .filter_map(|p| {
            let name = p.get("name")?.as_str()?;
            let guild_name = p.get("guildName")?.as_str()?;
            guild_name.eq_ignore_ascii_case(guild).then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://gameinfo.albiononline.com/api/gameinfo/battles";

    #[test]
    fn public_links_map_to_api_links() {
        assert_eq!(
            api_link(BASE, "https://albionbattles.com/battles/123456789").as_deref(),
            Some("https://gameinfo.albiononline.com/api/gameinfo/battles/123456789")
        );
        assert_eq!(
            api_link(BASE, "https://example.org/killboard/battles/42/?tab=players").as_deref(),
            Some("https://gameinfo.albiononline.com/api/gameinfo/battles/42")
        );
        assert_eq!(api_link(BASE, "https://example.org/battles/abc"), None);
    }

    #[test]
    fn only_members_of_the_guild_are_taken() {
        let report = json!({
            "players": {
                "a": { "name": "Ann", "guildName": "Smurfing Monkeys" },
                "b": { "name": "Bob", "guildName": "Other" },
                "c": { "name": "Cid" },
                "d": { "name": "Dee", "guildName": "smurfing monkeys" }
            }
        });
        assert_eq!(participant_names(&report, "smurfing monkeys"), vec!["Ann", "Dee"]);
        assert!(participant_names(&json!({}), "smurfing monkeys").is_empty());
    }
}
