//! Query flattening for GET form submissions

use serde_json::Value;
use url::Url;

/// Flatten a nested form body into query pairs.
///
/// Objects nest as `parent[key]`. Arrays of scalars repeat `parent[]`;
/// arrays of containers use `parent[index]` so the nesting survives.
/// A non-object body yields no pairs.
pub fn flatten_query(body: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Value::Object(map) = body {
        for (key, value) in map {
            flatten_into(key.clone(), value, &mut pairs);
        }
    }
    pairs
}

fn flatten_into(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(format!("{}[{}]", prefix, key), value, pairs);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let key = if item.is_object() || item.is_array() {
                    format!("{}[{}]", prefix, index)
                } else {
                    format!("{}[]", prefix)
                };
                flatten_into(key, item, pairs);
            }
        }
        Value::Null => pairs.push((prefix, String::new())),
        Value::String(s) => pairs.push((prefix, s.clone())),
        other => pairs.push((prefix, other.to_string())),
    }
}

/// `url` with its query replaced by the flattened `body`. The fragment is
/// kept.
pub fn with_query(url: &Url, body: &Value) -> Url {
    let mut url = url.clone();
    let pairs = flatten_query(body);

    url.set_query(None);
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_fields() {
        let pairs = flatten_query(&json!({ "q": "hello", "page": 2, "exact": true }));
        assert_eq!(
            pairs,
            vec![
                ("exact".to_string(), "true".to_string()),
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "hello".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_fields() {
        let pairs = flatten_query(&json!({
            "user": { "name": "ada" },
            "tags": ["a", "b"],
            "rows": [{ "id": "1" }],
            "empty": null,
        }));

        assert!(pairs.contains(&("user[name]".to_string(), "ada".to_string())));
        assert!(pairs.contains(&("tags[]".to_string(), "a".to_string())));
        assert!(pairs.contains(&("tags[]".to_string(), "b".to_string())));
        assert!(pairs.contains(&("rows[0][id]".to_string(), "1".to_string())));
        assert!(pairs.contains(&("empty".to_string(), String::new())));
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn test_non_object_body() {
        assert!(flatten_query(&Value::Null).is_empty());
        assert!(flatten_query(&json!("loose")).is_empty());
    }

    #[test]
    fn test_with_query_replaces_existing_query() {
        let url = Url::parse("http://app.test/search?old=1#results").unwrap();
        let url = with_query(&url, &json!({ "q": "hello world" }));

        assert_eq!(url.as_str(), "http://app.test/search?q=hello+world#results");
    }

    #[test]
    fn test_with_query_empty_body_clears_query() {
        let url = Url::parse("http://app.test/search?old=1").unwrap();
        assert_eq!(with_query(&url, &json!({})).as_str(), "http://app.test/search");
    }
}
