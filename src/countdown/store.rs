use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use serenity::all::MessageId;

use crate::countdown::record::{CountdownRecord, Initiator};
use crate::error::CountdownError;

/// JSON file holding one board's countdowns:
/// `{ "<message id>": ["<expiry>", "<initiator>", "<label>", "<permalink>"?] }`
#[derive(Debug, Clone)]
pub struct CountdownStore {
    path: PathBuf,
}

impl CountdownStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Never fails: a missing or unreadable file is an empty board.
    pub async fn load(&self) -> Vec<CountdownRecord> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no countdown snapshot yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), "error loading countdowns from file: {e}");
                return Vec::new();
            }
        };
        match decode_snapshot(&text) {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(path = %self.path.display(), "countdown snapshot is corrupt, starting empty: {e}");
                Vec::new()
            }
        }
    }

    /// Writes next to the target and renames over it, so a crash mid-write leaves the
    /// previous snapshot in place.
    pub async fn save<'a>(
        &self,
        records: impl IntoIterator<Item = &'a CountdownRecord>,
    ) -> Result<(), CountdownError> {
        let payload = serde_json::to_string_pretty(&encode_snapshot(records))
            .map_err(|e| CountdownError::Persist(e.to_string()))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, payload)
            .await
            .map_err(|e| CountdownError::Persist(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CountdownError::Persist(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }
}

pub fn encode_snapshot<'a>(records: impl IntoIterator<Item = &'a CountdownRecord>) -> Map<String, Value> {
    let mut out = Map::new();
    for r in records {
        let mut entry = vec![
            Value::String(r.expires_at.to_rfc3339()),
            Value::String(r.initiator.to_stored()),
            Value::String(r.label.clone()),
        ];
        if let Some(link) = &r.permalink {
            entry.push(Value::String(link.clone()));
        }
        out.insert(r.id.get().to_string(), Value::Array(entry));
    }
    out
}

/// Whole-file errors bubble up; bad individual entries are skipped with a warning.
pub fn decode_snapshot(text: &str) -> Result<Vec<CountdownRecord>, serde_json::Error> {
    let root: Map<String, Value> = serde_json::from_str(text)?;
    let mut records: Vec<CountdownRecord> = root
        .iter()
        .filter_map(|(key, value)| {
            let decoded = decode_entry(key, value);
            if decoded.is_none() {
                tracing::warn!("invalid countdown format for key {key}: {value}");
            }
            decoded
        })
        .collect();
    // snowflakes grow with time, so id order is creation order
    records.sort_by_key(|r| r.id);
    Ok(records)
}

fn decode_entry(key: &str, value: &Value) -> Option<CountdownRecord> {
    let id = key.trim().parse::<u64>().ok().filter(|v| *v != 0)?;
    let fields = value.as_array()?;
    if fields.len() < 3 {
        return None;
    }
    let expires_at = parse_timestamp(fields[0].as_str()?)?;
    let initiator = Initiator::from_stored(&text_of(&fields[1]));
    let label = text_of(&fields[2]);
    let permalink = fields.get(3).and_then(Value::as_str).map(str::to_string);
    Some(CountdownRecord {
        id: MessageId::new(id),
        expires_at,
        initiator,
        label,
        permalink,
    })
}

fn text_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serenity::all::UserId;

    fn record(id: u64, label: &str) -> CountdownRecord {
        CountdownRecord {
            id: MessageId::new(id),
            expires_at: Utc.with_ymd_and_hms(2030, 5, 1, 12, 30, 0).unwrap(),
            initiator: Initiator::User(UserId::new(99)),
            label: label.to_string(),
            permalink: Some(format!("https://discord.com/channels/1/2/{id}")),
        }
    }

    #[tokio::test]
    async fn save_then_load_keeps_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = CountdownStore::new(dir.path().join("board.json"));
        let records = vec![record(10, "castle"), record(20, "")];

        store.save(&records).await.unwrap();
        let loaded = store.load().await;

        assert_eq!(loaded, records);
        assert!(!dir.path().join("board.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CountdownStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn garbage_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        assert!(CountdownStore::new(path).load().await.is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let text = r#"{
            "101": ["2030-01-01T10:00:00+00:00", "5", "core"],
            "102": ["2030-01-01T11:00:00", "emily", ""],
            "103": ["2030-01-01T12:00:00+00:00", "5"],
            "104": "2030-01-01T12:00:00+00:00",
            "105": ["not a date", "5", "x"],
            "106": ["2030-01-02T09:15:00.250000+00:00", "6", "wb"]
        }"#;
        let records = decode_snapshot(text).unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![101, 102, 106]);
        assert_eq!(records[1].initiator, Initiator::Legacy("emily".into()));
        assert_eq!(records[1].expires_at, Utc.with_ymd_and_hms(2030, 1, 1, 11, 0, 0).unwrap());
        assert_eq!(records[0].permalink, None);
    }

    #[test]
    fn snapshot_layout_is_id_to_list() {
        let encoded = encode_snapshot(&[record(7, "gvg")]);
        let entry = encoded.get("7").and_then(Value::as_array).unwrap();
        assert_eq!(entry[0], Value::String("2030-05-01T12:30:00+00:00".into()));
        assert_eq!(entry[1], Value::String("99".into()));
        assert_eq!(entry[2], Value::String("gvg".into()));
        assert_eq!(entry.len(), 4);
    }
}
