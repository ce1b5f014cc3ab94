//! Extended JSON translation for commands and replies.
//!
//! Commands arrive as JSON text and must become ordered BSON documents; the first
//! key names the command, so key order is preserved all the way through
//! (`serde_json` is built with `preserve_order`). Type wrappers such as `$date`,
//! `$numberLong`, `$numberDecimal`, `$binary` and `$oid` are honored in both
//! canonical and relaxed form.

use crate::config::ExtJsonMode;
use crate::error::{MongoMcpError, MongoMcpResult};
use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

/// Parse command text into an ordered document.
pub fn parse_command(text: &str) -> MongoMcpResult<Document> {
    let value: JsonValue =
        serde_json::from_str(text).map_err(|e| MongoMcpError::parse(e.to_string()))?;

    if !value.is_object() {
        return Err(MongoMcpError::parse(format!(
            "command must be a JSON object, got {}",
            json_type_name(&value)
        )));
    }

    match Bson::try_from(value) {
        Ok(Bson::Document(document)) => Ok(document),
        // A top-level wrapper like {"$date": ...} converts to a scalar, not a document.
        Ok(other) => Err(MongoMcpError::parse(format!(
            "command must be a document, got {:?}",
            other.element_type()
        ))),
        Err(e) => Err(MongoMcpError::parse(e.to_string())),
    }
}

/// Render a reply document as Extended JSON text.
pub fn render_reply(reply: &Document, mode: ExtJsonMode) -> MongoMcpResult<String> {
    let bson = Bson::Document(reply.clone());
    let value = match mode {
        ExtJsonMode::Relaxed => bson.into_relaxed_extjson(),
        ExtJsonMode::Canonical => bson.into_canonical_extjson(),
    };
    serde_json::to_string(&value).map_err(|e| MongoMcpError::serialization(e.to_string()))
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::spec::BinarySubtype;
    use mongodb::bson::{Binary, DateTime, Decimal128, doc, oid::ObjectId};
    use std::str::FromStr;

    fn keys(document: &Document) -> Vec<&str> {
        document.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_simple_command() {
        let command = parse_command(r#"{"ping": 1}"#).unwrap();
        assert_eq!(command, doc! { "ping": 1 });
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let command =
            parse_command(r#"{"find": "users", "filter": {"b": 1, "a": 2}, "limit": 5, "batchSize": 2}"#)
                .unwrap();
        assert_eq!(keys(&command), vec!["find", "filter", "limit", "batchSize"]);
        assert_eq!(keys(command.get_document("filter").unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn test_parse_order_not_alphabetical() {
        let command = parse_command(r#"{"z": 1, "count": "c", "a": true}"#).unwrap();
        assert_eq!(command.keys().next().map(String::as_str), Some("z"));
    }

    #[test]
    fn test_parse_honors_type_wrappers() {
        let command = parse_command(
            r#"{
                "insert": "events",
                "documents": [{
                    "_id": {"$oid": "65a1b2c3d4e5f60718293a4b"},
                    "at": {"$date": "2024-01-15T10:30:00Z"},
                    "count": {"$numberLong": "9007199254740993"},
                    "price": {"$numberDecimal": "19.99"},
                    "small": {"$numberInt": "7"},
                    "payload": {"$binary": {"base64": "AQID", "subType": "00"}}
                }]
            }"#,
        )
        .unwrap();

        let documents = command.get_array("documents").unwrap();
        let event = documents[0].as_document().unwrap();
        assert!(matches!(event.get("_id"), Some(Bson::ObjectId(_))));
        assert!(matches!(event.get("at"), Some(Bson::DateTime(_))));
        assert_eq!(event.get("count"), Some(&Bson::Int64(9_007_199_254_740_993)));
        assert!(matches!(event.get("price"), Some(Bson::Decimal128(_))));
        assert_eq!(event.get("small"), Some(&Bson::Int32(7)));
        match event.get("payload") {
            Some(Bson::Binary(binary)) => {
                assert_eq!(binary.bytes, vec![1, 2, 3]);
                assert_eq!(binary.subtype, BinarySubtype::Generic);
            }
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_command("{invalid").unwrap_err();
        assert!(matches!(err, MongoMcpError::Parse { .. }));
    }

    #[test]
    fn test_parse_rejects_empty_text() {
        assert!(matches!(
            parse_command("").unwrap_err(),
            MongoMcpError::Parse { .. }
        ));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        for text in ["[1, 2]", "42", "\"ping\"", "null", "true"] {
            let err = parse_command(text).unwrap_err();
            assert!(matches!(err, MongoMcpError::Parse { .. }), "{text}");
            assert!(err.to_string().contains("JSON object"), "{text}");
        }
    }

    #[test]
    fn test_parse_rejects_top_level_wrapper() {
        let err = parse_command(r#"{"$date": "2024-01-15T10:30:00Z"}"#).unwrap_err();
        assert!(matches!(err, MongoMcpError::Parse { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_wrapper_payload() {
        let err = parse_command(r#"{"find": "c", "filter": {"_id": {"$oid": "nope"}}}"#)
            .unwrap_err();
        assert!(matches!(err, MongoMcpError::Parse { .. }));
    }

    #[test]
    fn test_render_relaxed_reply() {
        let reply = doc! { "ok": 1.0 };
        assert_eq!(
            render_reply(&reply, ExtJsonMode::Relaxed).unwrap(),
            r#"{"ok":1.0}"#
        );
    }

    #[test]
    fn test_render_canonical_tags_numbers() {
        let reply = doc! { "n": 5_i64, "ok": 1.0 };
        let text = render_reply(&reply, ExtJsonMode::Canonical).unwrap();
        assert!(text.starts_with(r#"{"n":{"$numberLong":"5"},"ok":{"$numberDouble":"#), "{text}");
    }

    #[test]
    fn test_render_preserves_reply_order() {
        let reply = doc! { "cursor": { "firstBatch": [], "id": 0_i64, "ns": "app.users" }, "ok": 1.0 };
        let text = render_reply(&reply, ExtJsonMode::Relaxed).unwrap();
        assert_eq!(
            text,
            r#"{"cursor":{"firstBatch":[],"id":0,"ns":"app.users"},"ok":1.0}"#
        );
    }

    #[test]
    fn test_render_relaxed_keeps_date_and_binary_tags() {
        let bin = Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        };
        let reply = doc! { "at": DateTime::from_millis(1_705_314_600_000), "bin": bin };
        let text = render_reply(&reply, ExtJsonMode::Relaxed).unwrap();
        assert!(text.contains(r#""$date":"2024-01-15T10:30:00Z""#), "{text}");
        assert!(text.contains(r#""$binary""#), "{text}");
        assert!(text.contains(r#""base64":"AQID""#), "{text}");
    }

    #[test]
    fn test_round_trip_relaxed_preserves_order_and_tagged_types() {
        let id = ObjectId::from_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let bin = Binary {
            subtype: BinarySubtype::Uuid,
            bytes: vec![7; 16],
        };
        let price = Decimal128::from_str("19.99").unwrap();
        let original = doc! {
            "zeta": "last-alphabetically-first",
            "_id": id,
            "at": DateTime::from_millis(1_705_314_600_000),
            "bin": bin,
            "price": price,
            "ratio": 0.25,
            "nested": { "b": true, "a": Bson::Null, "list": [1, "two", 3.5] },
        };

        let text = render_reply(&original, ExtJsonMode::Relaxed).unwrap();
        let parsed = parse_command(&text).unwrap();

        assert_eq!(parsed, original);
        assert_eq!(keys(&parsed), keys(&original));
        assert_eq!(
            keys(parsed.get_document("nested").unwrap()),
            vec!["b", "a", "list"]
        );
    }

    #[test]
    fn test_round_trip_canonical_preserves_numeric_subtypes() {
        let original = doc! {
            "i32": 42_i32,
            "i64": 42_i64,
            "double": 42.0,
            "big": i64::MAX,
            "neg": -3_i32,
        };

        let text = render_reply(&original, ExtJsonMode::Canonical).unwrap();
        let parsed = parse_command(&text).unwrap();

        assert_eq!(parsed.get("i32"), Some(&Bson::Int32(42)));
        assert_eq!(parsed.get("i64"), Some(&Bson::Int64(42)));
        assert_eq!(parsed.get("double"), Some(&Bson::Double(42.0)));
        assert_eq!(parsed.get("big"), Some(&Bson::Int64(i64::MAX)));
        assert_eq!(keys(&parsed), keys(&original));
    }

    #[test]
    fn test_round_trip_relaxed_collapses_small_int64() {
        let original = doc! { "n": 5_i64 };

        let relaxed =
            parse_command(&render_reply(&original, ExtJsonMode::Relaxed).unwrap()).unwrap();
        assert_eq!(relaxed.get("n"), Some(&Bson::Int32(5)));

        let canonical =
            parse_command(&render_reply(&original, ExtJsonMode::Canonical).unwrap()).unwrap();
        assert_eq!(canonical.get("n"), Some(&Bson::Int64(5)));
    }
}
