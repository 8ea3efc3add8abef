//! The immutable input record produced by the extraction collaborator.

use serde::{Deserialize, Serialize};

/// One extracted channel message. Never mutated by the resolver; any
/// fields beyond the ones the resolver reads ride along in `extra` so
/// the enriched output preserves them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<i64>,
    /// ISO-8601 message timestamp.
    #[serde(default, alias = "timestamp")]
    pub date: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Originating channel identifier, for the channel-fallback stage.
    #[serde(default)]
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// All text the resolver scans: the message body plus any forwarded
    /// or reply fragments, newline-joined.
    pub fn scan_text(&self) -> String {
        let mut text = self.text.clone();
        for fragment in [&self.forwarded_text, &self.reply_text].into_iter().flatten() {
            if !fragment.is_empty() {
                text.push('\n');
                text.push_str(fragment);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_extraction_record() {
        let line = r#"{
            "channel": "ClashReport",
            "link": "https://t.me/ClashReport/21300",
            "text": "Strike reported",
            "timestamp": "2025-06-28T19:31:17+00:00",
            "id": 21300
        }"#;
        let msg: Message = serde_json::from_str(line).unwrap();
        assert_eq!(msg.id, Some(21300));
        assert_eq!(msg.channel, "ClashReport");
        assert_eq!(msg.date.as_deref(), Some("2025-06-28T19:31:17+00:00"));
        assert!(msg.extra.contains_key("link"));
    }

    #[test]
    fn test_missing_fields_default() {
        let msg: Message = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(msg.text.is_empty());
        assert!(msg.channel.is_empty());
        assert!(msg.date.is_none());
    }

    #[test]
    fn test_scan_text_joins_fragments() {
        let msg: Message = serde_json::from_str(
            r#"{"text": "Explosion", "forwarded_text": "in Kyiv, Ukraine"}"#,
        )
        .unwrap();
        assert_eq!(msg.scan_text(), "Explosion\nin Kyiv, Ukraine");
    }
}
