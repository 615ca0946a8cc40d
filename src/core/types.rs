use serde::{Deserialize, Deserializer, Serialize};

/// User record returned by `get_user_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub role: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reg_time: String,
    #[serde(default)]
    pub last_use_time: String,
}

/// Group record returned by `get_group_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub gid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reg_time: String,
    #[serde(default)]
    pub last_use_time: String,
}

/// A single queued message, direct or group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub message: String,
    #[serde(default)]
    pub send_time: String,
}

/// Batch of queued messages returned by `get_direct_message` and
/// `get_group_message`.
///
/// The server deletes direct messages once delivered; callers that need
/// history must persist these themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBatch {
    pub count: u64,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    pub session: String,
}

/// Accept either a JSON string or a JSON number for fields the server is
/// inconsistent about (group ids in particular).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_info_accepts_numeric_or_string_gid() {
        let numeric: GroupInfo =
            serde_json::from_value(json!({"gid": 7, "name": "dev"})).unwrap();
        assert_eq!(numeric.gid, "7");

        let string: GroupInfo =
            serde_json::from_value(json!({"gid": "7", "name": "dev"})).unwrap();
        assert_eq!(string.gid, "7");
    }

    #[test]
    fn message_batch_tolerates_extra_fields() {
        let batch: MessageBatch = serde_json::from_value(json!({
            "count": 1,
            "messages": [{
                "message": "Howdy!",
                "send_time": "Sat, 09 Dec 2023 17:16:02 GMT",
                "username": "test4"
            }],
            "status": 0
        }))
        .unwrap();
        assert_eq!(batch.count, 1);
        assert_eq!(batch.messages[0].username, "test4");
    }
}
