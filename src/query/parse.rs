use crate::errors::PodError;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;
use serde_json::value::RawValue;

use super::types::{DecodedValue, FilterSet, FilterTuple};

// Wrapper field names that mark a value as an object reference.
const REFERENCE_FIELD: &str = "ObjectId";
const EXTJSON_REFERENCE_FIELD: &str = "$oid";

fn is_reference_field(name: &str) -> bool {
    name.eq_ignore_ascii_case(REFERENCE_FIELD) || name == EXTJSON_REFERENCE_FIELD
}

/// Parses `candidate` as an object reference: hex that decodes to exactly 12 bytes.
#[must_use]
pub fn parse_reference(candidate: &str) -> Option<ObjectId> {
    let bytes: [u8; 12] = hex::decode(candidate).ok()?.try_into().ok()?;
    Some(ObjectId::from_bytes(bytes))
}

fn decode_reference(raw: &str) -> Option<ObjectId> {
    let wrapper: serde_json::Map<String, Value> = serde_json::from_str(raw).ok()?;
    if wrapper.len() != 1 {
        return None;
    }
    let (field, candidate) = wrapper.iter().next()?;
    if !is_reference_field(field) {
        return None;
    }
    parse_reference(candidate.as_str()?)
}

/// Decodes one raw filter value. A single-field reference wrapper holding valid hex becomes
/// `Reference`; anything else, including a wrapper with bad hex, is decoded as a plain value.
///
/// # Errors
/// Returns an error only when `raw` is not valid JSON.
pub fn decode_value(raw: &str) -> Result<DecodedValue, serde_json::Error> {
    if let Some(oid) = decode_reference(raw) {
        return Ok(DecodedValue::Reference(oid));
    }
    serde_json::from_str::<Value>(raw).map(DecodedValue::Value)
}

impl<'de> Deserialize<'de> for FilterTuple {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts: Vec<Box<RawValue>> = Vec::deserialize(deserializer)?;
        if parts.len() != 2 {
            return Err(de::Error::custom(format!(
                "filter tuple must have 2 values but got {}",
                parts.len()
            )));
        }
        let key: String = serde_json::from_str(parts[0].get())
            .map_err(|e| de::Error::custom(format!("filter key must be a string: {e}")))?;
        let value = decode_value(parts[1].get()).map_err(de::Error::custom)?;
        Ok(Self { key, value })
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<FilterTuple>::deserialize(deserializer).map(Self)
    }
}

/// # Errors
/// Returns a decode error if `json` is not an array of `[key, value]` tuples.
pub fn parse_filter_json(json: &str) -> Result<FilterSet, PodError> {
    serde_json::from_str(json).map_err(|e| PodError::Decode(format!("filters: {e}")))
}

/// Generic JSON to BSON conversion. No Extended JSON keys are interpreted.
#[must_use]
pub fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Bson::Int64(i),
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(json_object_to_document(map)),
    }
}

#[must_use]
pub fn json_object_to_document(map: &serde_json::Map<String, Value>) -> Document {
    map.iter().map(|(k, v)| (k.clone(), json_to_bson(v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    const HEX: &str = "5f1a2b3c4d5e6f7081920a1b";

    #[test]
    fn wrapped_hex_is_reference() {
        let v = decode_value(&format!("{{\"ObjectId\":\"{HEX}\"}}")).unwrap();
        assert_eq!(v, DecodedValue::Reference(ObjectId::parse_str(HEX).unwrap()));
    }

    #[test]
    fn wrapper_field_is_case_insensitive_and_accepts_extjson() {
        assert!(decode_value(&format!("{{\"objectid\":\"{HEX}\"}}")).unwrap().is_reference());
        assert!(decode_value(&format!("{{\"$oid\":\"{HEX}\"}}")).unwrap().is_reference());
    }

    #[test]
    fn bare_hex_string_stays_string() {
        let v = decode_value(&format!("\"{HEX}\"")).unwrap();
        assert_eq!(v, DecodedValue::Value(Value::String(HEX.into())));
    }

    #[test]
    fn bad_hex_in_wrapper_falls_back_to_document() {
        let raw = "{\"ObjectId\":\"not-hex\"}";
        let v = decode_value(raw).unwrap();
        assert_eq!(v, DecodedValue::Value(serde_json::json!({"ObjectId": "not-hex"})));
        // 11 bytes
        let short = "{\"ObjectId\":\"5f1a2b3c4d5e6f7081920a\"}";
        assert!(!decode_value(short).unwrap().is_reference());
    }

    #[test]
    fn extra_wrapper_fields_are_not_references() {
        let raw = format!("{{\"ObjectId\":\"{HEX}\",\"x\":1}}");
        assert!(!decode_value(&raw).unwrap().is_reference());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(decode_value("{\"a\":").is_err());
    }

    #[test]
    fn filter_set_preserves_order() {
        let fs = parse_filter_json(r#"[["a",1],["b","x"]]"#).unwrap();
        assert_eq!(fs.len(), 2);
        assert_eq!(fs.tuples()[0].key, "a");
        assert_eq!(fs.tuples()[1].key, "b");
        let keys: Vec<_> = fs.to_document().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(fs.to_document(), doc! {"a": 1_i64, "b": "x"});
    }

    #[test]
    fn repeated_keys_become_a_conjunction() {
        let fs = parse_filter_json(r#"[["age",{"$gte":18}],["name","x"],["age",{"$lt":65}]]"#).unwrap();
        assert_eq!(
            fs.to_document(),
            doc! {"$and": [{"age": {"$gte": 18_i64}}, {"name": "x"}, {"age": {"$lt": 65_i64}}]}
        );
    }

    #[test]
    fn empty_filter_set_matches_all() {
        let fs = parse_filter_json("[]").unwrap();
        assert!(fs.is_empty());
        assert!(fs.to_document().is_empty());
    }

    #[test]
    fn wrong_tuple_arity_is_decode_error() {
        let e = parse_filter_json(r#"[["a",1,2]]"#).unwrap_err();
        assert!(matches!(e, PodError::Decode(_)));
        assert!(e.to_string().contains("2 values but got 3"));
        assert!(parse_filter_json(r#"[["a"]]"#).is_err());
    }

    #[test]
    fn non_string_key_is_decode_error() {
        let e = parse_filter_json(r#"[[1,"a"]]"#).unwrap_err();
        assert!(e.to_string().contains("filter key must be a string"));
    }

    #[test]
    fn json_numbers_convert_by_kind() {
        assert_eq!(json_to_bson(&serde_json::json!(3)), Bson::Int64(3));
        assert_eq!(json_to_bson(&serde_json::json!(2.5)), Bson::Double(2.5));
        assert_eq!(json_to_bson(&serde_json::json!(u64::MAX)), Bson::Double(u64::MAX as f64));
    }

    #[test]
    fn json_to_bson_leaves_extjson_keys_alone() {
        let v = serde_json::json!({"$oid": "zz"});
        assert_eq!(json_to_bson(&v), Bson::Document(doc! {"$oid": "zz"}));
    }
}
