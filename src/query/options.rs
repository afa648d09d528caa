//! Resolution of the loosely-typed options bag into store modifiers.
//!
//! Every recognized key is validated on its own; a value of the wrong shape is logged and
//! skipped so the remaining modifiers still apply.

use bson::{Bson, Document};
use serde_json::Value;

use super::parse::{json_object_to_document, json_to_bson};
use super::types::{FindManyModifiers, FindOneModifiers};
use crate::types::OptionsBag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    Projection,
    Sort,
    AllowDiskUse,
    Limit,
}

impl OptionKey {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Projection => "projection",
            Self::Sort => "sort",
            Self::AllowDiskUse => "allow-disk-use",
            Self::Limit => "limit",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "projection" => Some(Self::Projection),
            "sort" => Some(Self::Sort),
            "allow-disk-use" => Some(Self::AllowDiskUse),
            "limit" => Some(Self::Limit),
            _ => None,
        }
    }
}

/// The value supplied for an option did not have the expected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub expected: &'static str,
}

/// A modifier set that can be populated from an options bag.
pub trait ResolveOptions: Default {
    /// Keys this modifier set understands; all others are ignored.
    const SUPPORTED: &'static [OptionKey];

    /// # Errors
    /// Returns `ShapeMismatch` when `value` cannot be used for `key`.
    fn set(&mut self, key: OptionKey, value: &Value) -> Result<(), ShapeMismatch>;
}

impl ResolveOptions for FindOneModifiers {
    const SUPPORTED: &'static [OptionKey] = &[OptionKey::Projection];

    fn set(&mut self, key: OptionKey, value: &Value) -> Result<(), ShapeMismatch> {
        if key == OptionKey::Projection {
            self.projection = Some(projection(value)?);
        }
        Ok(())
    }
}

impl ResolveOptions for FindManyModifiers {
    const SUPPORTED: &'static [OptionKey] =
        &[OptionKey::Projection, OptionKey::Sort, OptionKey::AllowDiskUse, OptionKey::Limit];

    fn set(&mut self, key: OptionKey, value: &Value) -> Result<(), ShapeMismatch> {
        match key {
            OptionKey::Projection => self.projection = Some(projection(value)?),
            OptionKey::Sort => self.sort = Some(sort(value)?),
            OptionKey::AllowDiskUse => self.allow_disk_use = Some(allow_disk_use(value)?),
            OptionKey::Limit => self.limit = Some(limit(value)?),
        }
        Ok(())
    }
}

/// Applies the supported keys of `bag` to fresh modifiers. Never fails.
#[must_use]
pub fn resolve<M: ResolveOptions>(bag: Option<&OptionsBag>) -> M {
    let mut out = M::default();
    let Some(bag) = bag else {
        return out;
    };
    for key in M::SUPPORTED {
        let Some(value) = bag.get(key.name()) else {
            continue;
        };
        if let Err(e) = out.set(*key, value) {
            log::warn!("unexpected value for {}: {} (expected {})", key.name(), value, e.expected);
        }
    }
    out
}

fn projection(value: &Value) -> Result<Document, ShapeMismatch> {
    value.as_object().map(json_object_to_document).ok_or(ShapeMismatch { expected: "a document" })
}

// Either a document or an ordered list of [field, direction] pairs.
fn sort(value: &Value) -> Result<Document, ShapeMismatch> {
    const EXPECTED: ShapeMismatch =
        ShapeMismatch { expected: "a document or an array of [field, direction] pairs" };
    match value {
        Value::Object(map) => Ok(json_object_to_document(map)),
        Value::Array(pairs) => {
            let mut doc = Document::new();
            for pair in pairs {
                match pair.as_array().map(Vec::as_slice) {
                    Some([Value::String(field), dir]) => {
                        doc.insert(field.clone(), json_to_bson(dir));
                    }
                    _ => return Err(EXPECTED),
                }
            }
            Ok(doc)
        }
        _ => Err(EXPECTED),
    }
}

fn allow_disk_use(value: &Value) -> Result<bool, ShapeMismatch> {
    value.as_bool().ok_or(ShapeMismatch { expected: "a boolean" })
}

#[allow(clippy::cast_possible_truncation)]
fn limit(value: &Value) -> Result<i64, ShapeMismatch> {
    match value {
        Value::Number(n) => Ok(n.as_i64().unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64))),
        _ => Err(ShapeMismatch { expected: "a number" }),
    }
}

#[must_use]
pub(crate) fn describe_sort(sort: &Document) -> String {
    Bson::Document(sort.clone()).into_relaxed_extjson().to_string()
}
