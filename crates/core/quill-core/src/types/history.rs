//! Records served by the generation service's history and health endpoints

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Previously generated answer as logged by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// Row id
    pub id: i64,
    /// Prompt that produced the content
    pub prompt: String,
    /// Full accumulated content
    pub content: String,
    /// Agent type the service routed the prompt to
    pub content_type: String,
    /// Creation time; offset-less timestamps are taken as UTC
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Routing details (agent type, search type, result counts)
    #[serde(default)]
    pub meta_info: Option<serde_json::Value>,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Service health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `healthy` or `unhealthy`
    pub status: String,
    /// Database connectivity, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Informational message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure reason for an unhealthy service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    /// Whether the service reported itself healthy
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_entry() {
        let entry: GeneratedContent = serde_json::from_str(
            r#"{
                "id": 7,
                "prompt": "write a tweet about rust",
                "content": "Rust ships!",
                "content_type": "twitter",
                "created_at": "2024-05-01T12:30:00+00:00",
                "meta_info": {"agent_type": "twitter", "search_type": "general"}
            }"#,
        )
        .unwrap();
        assert_eq!(entry.id, 7);
        assert_eq!(entry.content_type, "twitter");
        assert_eq!(entry.meta_info.unwrap()["search_type"], "general");
    }

    #[test]
    fn test_history_entry_without_offset_is_utc() {
        let entry: GeneratedContent = serde_json::from_str(
            r#"{"id":1,"prompt":"p","content":"c","content_type":"thesis","created_at":"2024-05-01T12:30:00.123456","meta_info":null}"#,
        )
        .unwrap();
        assert_eq!(
            entry.created_at.to_rfc3339(),
            "2024-05-01T12:30:00.123456+00:00"
        );
        assert!(entry.meta_info.is_none());

        let whole_seconds: GeneratedContent = serde_json::from_str(
            r#"{"id":2,"prompt":"p","content":"c","content_type":"thesis","created_at":"2024-05-01T12:30:00"}"#,
        )
        .unwrap();
        assert_eq!(whole_seconds.created_at.timestamp(), 1_714_566_600);
    }

    #[test]
    fn test_history_entry_rejects_garbage_timestamp() {
        let result = serde_json::from_str::<GeneratedContent>(
            r#"{"id":3,"prompt":"p","content":"c","content_type":"thesis","created_at":"yesterday"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_health_flags() {
        let healthy: HealthStatus =
            serde_json::from_str(r#"{"status":"healthy","database":"connected"}"#).unwrap();
        assert!(healthy.is_healthy());

        let sick: HealthStatus =
            serde_json::from_str(r#"{"status":"unhealthy","error":"db down"}"#).unwrap();
        assert!(!sick.is_healthy());
        assert_eq!(sick.error.as_deref(), Some("db down"));
    }
}
