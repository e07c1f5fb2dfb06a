use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// One parsed CSV row, keyed by header name (dotted names kept verbatim).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    fields: HashMap<String, String>,
}

impl UserRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn take(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }
}

impl<K, V> FromIterator<(K, V)> for UserRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Nested `address` value stored as JSON. Columns missing from the upload are
/// omitted from the object; empty cells stay as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Row shape written to the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Copied as-is, never parsed.
    pub age: Option<String>,
    pub address: Address,
}

impl From<UserRecord> for NewUser {
    fn from(mut record: UserRecord) -> Self {
        // Anything left in the record after this is dropped.
        Self {
            first_name: record.take("name.firstName"),
            last_name: record.take("name.lastName"),
            age: record.take("age"),
            address: Address {
                line1: record.take("address.line1"),
                line2: record.take("address.line2"),
                city: record.take("address.city"),
                state: record.take("address.state"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_fields_are_nested() {
        let record: UserRecord = [
            ("name.firstName", "Jane"),
            ("name.lastName", "Doe"),
            ("age", "30"),
            ("address.line1", "1 Main St"),
            ("address.city", "Springfield"),
        ]
        .into_iter()
        .collect();

        let user = NewUser::from(record);
        assert_eq!(user.first_name.as_deref(), Some("Jane"));
        assert_eq!(user.last_name.as_deref(), Some("Doe"));
        assert_eq!(user.age.as_deref(), Some("30"));
        assert_eq!(user.address.line1.as_deref(), Some("1 Main St"));
        assert_eq!(user.address.city.as_deref(), Some("Springfield"));
        assert!(user.address.line2.is_none());
        assert!(user.address.state.is_none());

        assert_eq!(
            serde_json::to_value(&user.address).unwrap(),
            json!({ "line1": "1 Main St", "city": "Springfield" })
        );
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let record: UserRecord = [
            ("name.firstName", "Jane"),
            ("email", "x@y.com"),
            ("address.zip", "12345"),
        ]
        .into_iter()
        .collect();

        let user = NewUser::from(record);
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("email").is_none());
        assert_eq!(value["address"], json!({}));
    }

    #[test]
    fn test_age_is_not_coerced() {
        let record: UserRecord = [("age", "thirty")].into_iter().collect();
        assert_eq!(NewUser::from(record).age.as_deref(), Some("thirty"));
    }

    #[test]
    fn test_empty_cells_are_kept() {
        let record: UserRecord = [("address.line2", ""), ("address.state", "IL")]
            .into_iter()
            .collect();

        let address = NewUser::from(record).address;
        assert_eq!(
            serde_json::to_value(&address).unwrap(),
            json!({ "line2": "", "state": "IL" })
        );
    }
}
