use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// One record from the song catalog, as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
    pub year: i32,
    pub duration: f64,
}

/// One record from the listening-event logs. Fields other than `page` and
/// `ts` are optional because navigation events carry only a subset of them.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    pub page: String,
    pub ts: i64,
    #[serde(rename = "userId", default, deserialize_with = "flexible_user_id")]
    pub user_id: Option<i64>,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "userAgent", default)]
    pub user_agent: Option<String>,
}

/// The logs serialize `userId` as a number or a numeric string; an empty
/// string marks an anonymous session and maps to `None`.
fn flexible_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("non-integer userId: {}", n))),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("non-integer userId: {:?}", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unexpected userId value: {}",
            other
        ))),
    }
}

/// Convert raw JSON values into typed records. A record that fails to
/// deserialize is dropped with a warning; the run continues.
pub fn parse_records<T: DeserializeOwned>(values: Vec<Value>, collection: &str) -> Vec<T> {
    let total = values.len();
    let mut records = Vec::with_capacity(total);
    let mut skipped = 0usize;

    for value in values {
        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping malformed {} record: {}", collection, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(
            "Dropped {} of {} {} records as malformed",
            skipped, total, collection
        );
    }

    records
}
