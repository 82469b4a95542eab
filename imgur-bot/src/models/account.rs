use botkit::Model;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;

/// An Imgur account as returned by `GET account/me`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Account {
    account: Value,
}

impl Account {
    /// Account id. Imgur sends it as a number; stubs and older payloads use a
    /// string.
    pub fn id(&self) -> Option<String> {
        match self.account.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.account.get("url").and_then(Value::as_str)
    }
}

impl Model for Account {
    fn from_json(json: Value) -> Self {
        Self { account: json }
    }

    fn json(&self) -> &Value {
        &self.account
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_id() {
        let account = Account::from_json(json!({"id": "42", "url": "http://x/42"}));
        assert_eq!(account.id().as_deref(), Some("42"));
        assert_eq!(account.url(), Some("http://x/42"));
    }

    #[test]
    fn test_numeric_id_and_missing_url() {
        let account = Account::from_json(json!({"id": 384077}));
        assert_eq!(account.id().as_deref(), Some("384077"));
        assert_eq!(account.url(), None);
    }

    #[test]
    fn test_serializes_as_payload() {
        let payload = json!({"id": "42", "url": "http://x/42", "reputation": 3});
        let account = Account::from_json(payload.clone());
        assert_eq!(serde_json::to_value(&account).unwrap(), payload);
        assert_eq!(account.json(), &payload);
    }
}
