use bson::{Bson, Document};
use std::cmp::Ordering;

// Safety limits for the in-memory matcher
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;

/// Whether `doc` satisfies every field of `filter` (implicit conjunction).
#[must_use]
pub fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, expected)| match (path.as_str(), expected) {
        ("$and", Bson::Array(clauses)) => clauses.iter().all(|c| clause_matches(doc, c)),
        ("$or", Bson::Array(clauses)) => clauses.iter().any(|c| clause_matches(doc, c)),
        (_, Bson::Document(ops)) if is_operator_doc(ops) => {
            ops.iter().all(|(op, arg)| eval_operator(get_path(doc, path), op, arg))
        }
        _ => get_path(doc, path).is_some_and(|v| equals_or_contains(v, expected)),
    })
}

fn clause_matches(doc: &Document, clause: &Bson) -> bool {
    match clause {
        Bson::Document(sub) => matches_filter(doc, sub),
        _ => false,
    }
}

fn is_operator_doc(d: &Document) -> bool {
    !d.is_empty() && d.keys().all(|k| k.starts_with('$'))
}

fn eval_operator(value: Option<&Bson>, op: &str, arg: &Bson) -> bool {
    match op {
        "$eq" => value.is_some_and(|v| equals_or_contains(v, arg)),
        "$ne" => !value.is_some_and(|v| equals_or_contains(v, arg)),
        "$gt" => value.is_some_and(|v| comparable(v, arg) && compare_bson(v, arg).is_gt()),
        "$gte" => value.is_some_and(|v| comparable(v, arg) && compare_bson(v, arg).is_ge()),
        "$lt" => value.is_some_and(|v| comparable(v, arg) && compare_bson(v, arg).is_lt()),
        "$lte" => value.is_some_and(|v| comparable(v, arg) && compare_bson(v, arg).is_le()),
        "$in" => value.is_some_and(|v| in_set(v, arg)),
        "$nin" => !value.is_some_and(|v| in_set(v, arg)),
        "$exists" => value.is_some() == truthy(arg),
        _ => false,
    }
}

fn in_set(v: &Bson, set: &Bson) -> bool {
    match set {
        Bson::Array(items) => items.iter().take(MAX_IN_SET).any(|x| equals_or_contains(v, x)),
        _ => false,
    }
}

// Array fields match when any element equals the expected value.
fn equals_or_contains(v: &Bson, expected: &Bson) -> bool {
    if values_equal(v, expected) {
        return true;
    }
    match v {
        Bson::Array(items) => items.iter().any(|x| values_equal(x, expected)),
        _ => false,
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return as_f64_num(a) == as_f64_num(b);
    }
    a == b
}

fn comparable(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b)) || type_rank(a) == type_rank(b)
}

fn truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Null => false,
        x if is_num(x) => as_f64_num(x) != 0.0,
        _ => true,
    }
}

pub(crate) fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let parts: Vec<&str> = path.split('.').collect();
    if parts.len() > MAX_PATH_DEPTH {
        return None;
    }
    let (last, parents) = parts.split_last()?;
    let mut cur = doc;
    for part in parents {
        match cur.get(*part) {
            Some(Bson::Document(d)) => cur = d,
            _ => return None,
        }
    }
    cur.get(*last)
}

/// Orders two documents by a sort document of `{field: direction}` entries.
#[must_use]
pub fn compare_docs(a: &Document, b: &Document, sort: &Document) -> Ordering {
    for (field, dir) in sort.iter().take(MAX_SORT_FIELDS) {
        let ord = match (get_path(a, field), get_path(b, field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            let descending = is_num(dir) && as_f64_num(dir) < 0.0;
            return if descending { ord.reverse() } else { ord };
        }
    }
    Ordering::Equal
}

/// Applies an inclusion or exclusion projection to top-level fields.
/// `_id` is kept unless excluded explicitly.
#[must_use]
pub fn project(doc: &Document, projection: &Document) -> Document {
    let inclusive = projection.iter().any(|(k, v)| k != "_id" && truthy(v));
    if inclusive {
        let keep_id = projection.get("_id").is_none_or(truthy);
        doc.iter()
            .filter(|(k, _)| {
                if k.as_str() == "_id" {
                    keep_id
                } else {
                    projection.get(k.as_str()).is_some_and(truthy)
                }
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    } else {
        doc.iter()
            .filter(|(k, _)| !projection.get(k.as_str()).is_some_and(|v| !truthy(v)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// Cross-type order used by MongoDB for sorting.
fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Undefined | Bson::Null => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::Symbol(_) | Bson::String(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) => 12,
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => 13,
        Bson::MaxKey => 255,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;

    #[test]
    fn equality_is_conjunctive() {
        let d = doc! {"a": 1, "b": "x"};
        assert!(matches_filter(&d, &doc! {}));
        assert!(matches_filter(&d, &doc! {"a": 1_i64, "b": "x"}));
        assert!(!matches_filter(&d, &doc! {"a": 1_i64, "b": "y"}));
        assert!(!matches_filter(&d, &doc! {"missing": 1}));
    }

    #[test]
    fn numbers_compare_across_types() {
        let d = doc! {"n": 3_i32};
        assert!(matches_filter(&d, &doc! {"n": 3.0}));
        assert!(matches_filter(&d, &doc! {"n": 3_i64}));
    }

    #[test]
    fn dotted_paths_and_array_membership() {
        let oid = ObjectId::new();
        let d = doc! {"info": {"city": "Oslo"}, "refs": [ObjectId::new(), oid]};
        assert!(matches_filter(&d, &doc! {"info.city": "Oslo"}));
        assert!(matches_filter(&d, &doc! {"refs": oid}));
        assert!(!matches_filter(&d, &doc! {"info.city.zip": "x"}));
    }

    #[test]
    fn embedded_document_matches_exactly() {
        let d = doc! {"info": {"city": "Oslo"}};
        assert!(matches_filter(&d, &doc! {"info": {"city": "Oslo"}}));
        assert!(!matches_filter(&d, &doc! {"info": {"city": "Bergen"}}));
    }

    #[test]
    fn comparison_operators() {
        let d = doc! {"age": 30};
        assert!(matches_filter(&d, &doc! {"age": {"$gt": 20, "$lte": 30}}));
        assert!(!matches_filter(&d, &doc! {"age": {"$lt": 30}}));
        assert!(matches_filter(&d, &doc! {"age": {"$in": [1, 30]}}));
        assert!(matches_filter(&d, &doc! {"age": {"$ne": 31}}));
        assert!(matches_filter(&d, &doc! {"name": {"$exists": false}}));
        assert!(!matches_filter(&d, &doc! {"age": {"$gt": "a"}}));
    }

    #[test]
    fn logical_clauses() {
        let d = doc! {"age": 30};
        let range = doc! {"$and": [{"age": {"$gte": 18}}, {"age": {"$lt": 65}}]};
        assert!(matches_filter(&d, &range));
        assert!(!matches_filter(&doc! {"age": 70}, &range));
        assert!(matches_filter(&d, &doc! {"$or": [{"age": 1}, {"age": 30}]}));
        assert!(!matches_filter(&d, &doc! {"$or": [{"age": 1}, {"age": 2}]}));
    }

    #[test]
    fn sort_by_fields_and_direction() {
        let a = doc! {"x": 1, "y": 2};
        let b = doc! {"x": 1, "y": 5};
        assert_eq!(compare_docs(&a, &b, &doc! {"x": 1, "y": 1}), Ordering::Less);
        assert_eq!(compare_docs(&a, &b, &doc! {"x": 1, "y": -1}), Ordering::Greater);
        assert_eq!(compare_docs(&a, &b, &doc! {"x": 1}), Ordering::Equal);
    }

    #[test]
    fn projection_modes() {
        let d = doc! {"_id": 1, "a": 1, "b": 2, "c": 3};
        assert_eq!(project(&d, &doc! {"a": 1}), doc! {"_id": 1, "a": 1});
        assert_eq!(project(&d, &doc! {"a": 1, "_id": 0}), doc! {"a": 1});
        assert_eq!(project(&d, &doc! {"b": 0}), doc! {"_id": 1, "a": 1, "c": 3});
        assert_eq!(project(&d, &doc! {}), d);
    }
}
