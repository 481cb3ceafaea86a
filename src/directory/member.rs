use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One person as the upstream directory describes them. The cache only ever holds
/// read-only copies; a refresh replaces the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Shared secret ("RI"); compared by trimmed equality only.
    #[serde(default, alias = "ri", deserialize_with = "lenient_string", skip_serializing)]
    pub credential: String,
    #[serde(default, alias = "role", deserialize_with = "lenient_string")]
    pub role_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    /// Free text naming this member's leader, possibly prefixed with `"<group> | "`.
    #[serde(default, alias = "leader", deserialize_with = "lenient_string")]
    pub leader_field: String,
    #[serde(default, alias = "group", deserialize_with = "lenient_string")]
    pub group_id: String,
}

impl Member {
    pub fn new(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self { name: name.into(), credential: credential.into(), ..Default::default() }
    }

    pub fn with_role(mut self, role_title: impl Into<String>) -> Self {
        self.role_title = role_title.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn with_leader(mut self, leader_field: impl Into<String>) -> Self {
        self.leader_field = leader_field.into();
        self
    }
}

/// Derived "last seen" projection served by the recent-activity cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    pub last_seen: DateTime<Utc>,
}

/// Spreadsheet-backed directories hand back numbers, booleans and nulls where text is
/// expected. Numbers and booleans keep their textual form; anything else becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_aliases_and_loose_types() {
        let v = json!({
            "name": "Carlos Souza",
            "ri": 123,
            "role": "Membro",
            "status": null,
            "leader": "G1 | Maria S",
            "group": "G1"
        });
        let m: Member = serde_json::from_value(v).unwrap();
        assert_eq!(m.name, "Carlos Souza");
        assert_eq!(m.credential, "123");
        assert_eq!(m.role_title, "Membro");
        assert_eq!(m.status, "");
        assert_eq!(m.leader_field, "G1 | Maria S");
        assert_eq!(m.group_id, "G1");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let m: Member = serde_json::from_value(json!({"name": "Ana"})).unwrap();
        assert_eq!(m, Member::new("Ana", ""));
    }

    #[test]
    fn credential_never_serialized() {
        let v = serde_json::to_value(Member::new("Ana", "s3cret")).unwrap();
        assert!(v.get("credential").is_none());
        assert_eq!(v["name"], "Ana");
        assert_eq!(v["roleTitle"], "");
    }
}
