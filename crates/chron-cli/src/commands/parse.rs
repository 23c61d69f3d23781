use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::Value;

use chron_core::{EntityRef, Properties};

/// Parse a `Type:id` argument.
pub fn parse_entity_ref(value: &str, flag: &str) -> anyhow::Result<EntityRef> {
    value
        .parse()
        .with_context(|| format!("invalid --{flag} '{value}' (expected Type:id)"))
}

/// A JSON value if `raw` parses as one, else the string itself.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse an RFC 3339 timestamp argument.
pub fn parse_time(value: &str, flag: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("invalid --{flag} '{value}' (expected RFC 3339)"))
}

/// Parse repeated `key=value` arguments into a map.
///
/// Values that parse as JSON keep their type; anything else is a string.
pub fn parse_pairs(pairs: &[String], flag: &str) -> anyhow::Result<Properties> {
    let mut map = Properties::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .with_context(|| format!("invalid --{flag} '{pair}' (expected key=value)"))?;
        map.insert(key.to_string(), parse_value(raw));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn pairs_keep_json_types() {
        let pairs = ["rows=12".to_string(), "format=csv".into(), "tags=[\"a\"]".into()];
        let map = parse_pairs(&pairs, "property").unwrap();
        assert_eq!(map["rows"], json!(12));
        assert_eq!(map["format"], json!("csv"));
        assert_eq!(map["tags"], json!(["a"]));
    }

    #[test]
    fn pair_without_equals_is_rejected() {
        let err = parse_pairs(&["oops".to_string()], "context").unwrap_err();
        assert!(err.to_string().contains("--context"));
        assert!(parse_pairs(&["=v".to_string()], "context").is_err());
    }

    #[test]
    fn times_must_be_rfc3339() {
        let at = parse_time("2026-03-01T10:00:00+02:00", "at").unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-01T08:00:00+00:00");
        let err = parse_time("yesterday", "at").unwrap_err();
        assert!(err.to_string().contains("--at"));
    }

    #[test]
    fn entity_refs() {
        assert_eq!(
            parse_entity_ref("blog::Article:5", "subject").unwrap(),
            EntityRef::new("blog::Article", "5")
        );
        assert!(parse_entity_ref("Article", "subject").is_err());
    }
}
