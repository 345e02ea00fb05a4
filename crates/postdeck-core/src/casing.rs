use serde_json::Value;

pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' {
            match chars.peek().copied() {
                Some(next) if next.is_ascii_lowercase() => {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                }
                _ => out.push('_'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn keys_to_snake(value: Value) -> Value {
    convert_keys(value, camel_to_snake)
}

pub fn keys_to_camel(value: Value) -> Value {
    convert_keys(value, snake_to_camel)
}

fn convert_keys(value: Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, inner)| (rename(&key), convert_keys(inner, rename)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, rename))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camel_keys_become_snake() {
        assert_eq!(camel_to_snake("clientId"), "client_id");
        assert_eq!(camel_to_snake("socialAccounts"), "social_accounts");
        assert_eq!(camel_to_snake("scheduledFor"), "scheduled_for");
        assert_eq!(camel_to_snake("id"), "id");
    }

    #[test]
    fn snake_keys_become_camel() {
        assert_eq!(snake_to_camel("client_id"), "clientId");
        assert_eq!(snake_to_camel("social_accounts"), "socialAccounts");
        assert_eq!(snake_to_camel("account_name"), "accountName");
        assert_eq!(snake_to_camel("status"), "status");
    }

    #[test]
    fn leading_capital_round_trips_through_underscore() {
        assert_eq!(camel_to_snake("Id"), "_id");
        assert_eq!(snake_to_camel("_id"), "Id");
    }

    #[test]
    fn underscore_before_non_lowercase_is_kept() {
        assert_eq!(snake_to_camel("retry_2"), "retry_2");
        assert_eq!(snake_to_camel("trailing_"), "trailing_");
        assert_eq!(snake_to_camel("__all"), "_All");
    }

    #[test]
    fn nested_objects_and_arrays_are_converted() {
        let wire = json!({
            "clientId": "1",
            "media": ["https://example.com/a.jpg"],
            "socialAccounts": [
                {"accountName": "Aesthetic Cafe", "platform": "telegram", "connected": true}
            ]
        });
        let rows = keys_to_snake(wire.clone());
        assert_eq!(
            rows,
            json!({
                "client_id": "1",
                "media": ["https://example.com/a.jpg"],
                "social_accounts": [
                    {"account_name": "Aesthetic Cafe", "platform": "telegram", "connected": true}
                ]
            })
        );
        assert_eq!(keys_to_camel(rows), wire);
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        assert_eq!(keys_to_snake(json!("clientId")), json!("clientId"));
        assert_eq!(keys_to_camel(json!(42)), json!(42));
        assert_eq!(keys_to_snake(json!(null)), json!(null));
    }
}
