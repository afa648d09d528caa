use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde_json::Value;

/// A filter value after type inference: either an object reference or any other JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Reference(ObjectId),
    Value(Value),
}

impl DecodedValue {
    #[must_use]
    pub fn to_bson(&self) -> Bson {
        match self {
            Self::Reference(oid) => Bson::ObjectId(*oid),
            Self::Value(v) => super::parse::json_to_bson(v),
        }
    }

    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

/// One `(field, value)` equality predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTuple {
    pub key: String,
    pub value: DecodedValue,
}

/// Ordered filter tuples. Empty matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet(pub(crate) Vec<FilterTuple>);

impl FilterSet {
    #[must_use]
    pub const fn new(tuples: Vec<FilterTuple>) -> Self {
        Self(tuples)
    }

    #[must_use]
    pub fn tuples(&self) -> &[FilterTuple] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Store-native ordered filter. When a key repeats, the tuples are wrapped in
    /// `{"$and": [{k1: v1}, {k2: v2}, ...]}` in tuple order so no predicate is lost.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        for t in &self.0 {
            if doc.contains_key(&t.key) {
                return self.to_conjunction();
            }
            doc.insert(t.key.clone(), t.value.to_bson());
        }
        doc
    }

    fn to_conjunction(&self) -> Document {
        let clauses: Vec<Bson> = self
            .0
            .iter()
            .map(|t| {
                let mut clause = Document::new();
                clause.insert(t.key.clone(), t.value.to_bson());
                Bson::Document(clause)
            })
            .collect();
        let mut doc = Document::new();
        doc.insert("$and", clauses);
        doc
    }
}

/// Modifiers honoured by `find_one`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneModifiers {
    pub projection: Option<Document>,
}

/// Modifiers honoured by `find_many`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindManyModifiers {
    pub projection: Option<Document>,
    pub sort: Option<Document>,
    pub allow_disk_use: Option<bool>,
    pub limit: Option<i64>,
}
