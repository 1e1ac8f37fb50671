//! Read-only Google Sheets access with a service-account key, plus the aggregations
//! behind the `log` and `total_logger` commands.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::SheetsConfig;
use crate::ui::tables::{Align, Table};

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
// a range without a sheet name reads the first sheet
const FIRST_SHEET: &str = "A:Z";
const TOKEN_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsClient {
    http: reqwest::Client,
    credentials_path: PathBuf,
    default_key: String,
    token: Mutex<Option<(String, Instant)>>,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, config: &SheetsConfig) -> Self {
        Self {
            http,
            credentials_path: config.credentials_path.clone(),
            default_key: config.spreadsheet_key.clone(),
            token: Mutex::new(None),
        }
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some((token, valid_until)) = cached.as_ref() {
            if Instant::now() < *valid_until {
                return Ok(token.clone());
            }
        }

        let raw = tokio::fs::read_to_string(&self.credentials_path)
            .await
            .with_context(|| format!("reading {}", self.credentials_path.display()))?;
        let account: ServiceAccount = serde_json::from_str(&raw).context("parsing service account key")?;

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &account.client_email,
            scope: SCOPE,
            aud: &account.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes()).context("service account private key")?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let response = self
            .http
            .post(&account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("token exchange failed: {body}");
        }
        let token: TokenResponse = response.json().await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        *cached = Some((token.access_token.clone(), Instant::now() + lifetime));
        tracing::debug!(expires_in = token.expires_in, "spreadsheet token refreshed");
        Ok(token.access_token)
    }

    /// Every row of the first sheet, header included.
    pub async fn rows(&self, spreadsheet_key: &str) -> Result<Vec<Vec<String>>> {
        let token = self.access_token().await?;
        let url = format!("{SHEETS_API}/{spreadsheet_key}/values/{FIRST_SHEET}");
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("spreadsheet read failed ({status}): {body}");
        }
        let range: ValueRange = response.json().await?;
        tracing::debug!(rows = range.values.len(), "spreadsheet rows fetched");
        Ok(range.values)
    }
}

/// One deposit row of a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub item: String,
    pub enchantment: String,
    pub amount: i64,
}

/// Deposit rows of `player` with a positive amount. Columns: 1 player, 2 item,
/// 3 enchantment, 5 amount. The header row is skipped.
pub fn player_logs(rows: &[Vec<String>], player: &str) -> Vec<LogEntry> {
    rows.iter()
        .skip(1)
        .filter_map(|row| {
            if row.len() < 6 {
                tracing::debug!(?row, "ignoring row with insufficient columns");
                return None;
            }
            if row[1] != player {
                return None;
            }
            let amount: i64 = row[5].trim().parse().ok()?;
            (amount > 0).then(|| LogEntry {
                item: row[2].clone(),
                enchantment: row[3].clone(),
                amount,
            })
        })
        .collect()
}

pub fn log_table(entries: &[LogEntry]) -> String {
    let total: i64 = entries.iter().map(|e| e.amount).sum();
    let mut table = Table::new(["Item", "Enchantment", "Amount"]).align(2, Align::Right);
    table.row(["Total amount".to_string(), String::new(), format!("**{total}**")]);
    for e in entries {
        table.row([e.item.clone(), e.enchantment.clone(), e.amount.to_string()]);
    }
    table.render()
}

/// Amount totals keyed by player (column 1) and by guild (column 6), ascending.
/// Players and guilds share one namespace.
pub fn totals(rows: &[Vec<String>]) -> Vec<(String, i64)> {
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, i64> = HashMap::new();
    let mut bump = |key: &str, amount: i64| {
        if !sums.contains_key(key) {
            order.push(key.to_string());
        }
        *sums.entry(key.to_string()).or_insert(0) += amount;
    };

    for row in rows.iter().skip(1) {
        let Some(raw) = row.get(5) else { continue };
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(amount) = raw.parse::<i64>() else { continue };
        bump(&row[1], amount);
        if let Some(guild) = row.get(6) {
            bump(guild, amount);
        }
    }

    let mut out: Vec<(String, i64)> = order
        .into_iter()
        .map(|k| {
            let total = sums[&k];
            (k, total)
        })
        .collect();
    out.sort_by_key(|(_, total)| *total);
    out
}

pub fn totals_table(totals: &[(String, i64)]) -> String {
    let mut table = Table::new(["User", "Total Amount"]).align(1, Align::Right);
    for (name, total) in totals {
        table.row([name.clone(), total.to_string()]);
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    fn sample() -> Vec<Vec<String>> {
        sheet(&[
            &["Date", "Player", "Item", "Enchantment", "Quality", "Amount", "Guild"],
            &["d", "ann", "Sword", "1", "q", "3", "Monkeys"],
            &["d", "bob", "Bow", "0", "q", "10", "Monkeys"],
            &["d", "ann", "Axe", "2", "q", "-1", "Monkeys"],
            &["d", "ann", "Staff", "0", "q", "x", "Monkeys"],
            &["short", "ann"],
            &["d", "ann", "Cape", "0", "q", "4", "Penguins"],
        ])
    }

    #[test]
    fn player_logs_keep_positive_amounts_of_that_player() {
        let logs = player_logs(&sample(), "ann");
        let items: Vec<&str> = logs.iter().map(|l| l.item.as_str()).collect();
        assert_eq!(items, vec!["Sword", "Cape"]);
        assert_eq!(logs[0].enchantment, "1");
        assert!(player_logs(&sample(), "nobody").is_empty());
    }

    #[test]
    fn log_table_leads_with_total() {
        let out = log_table(&player_logs(&sample(), "ann"));
        let first_row = out.lines().nth(3).unwrap();
        assert!(first_row.contains("Total amount"));
        assert!(first_row.contains("**7**"));
    }

    #[test]
    fn totals_count_players_and_guilds_ascending() {
        let t = totals(&sample());
        assert_eq!(
            t,
            vec![
                ("Penguins".to_string(), 4),
                ("ann".to_string(), 7),
                ("bob".to_string(), 10),
                ("Monkeys".to_string(), 13),
            ]
        );
    }

    #[test]
    fn totals_skip_negative_and_non_numeric() {
        let rows = sheet(&[&["h"], &["d", "ann", "i", "e", "q", "-5", "G"], &["d", "ann", "i", "e", "q", "", "G"]]);
        assert!(totals(&rows).is_empty());
    }
}
