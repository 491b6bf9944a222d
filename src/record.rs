use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::validation::ValidationError;

// Collection names as stored in the document store (keep in sync with as_str())
const COLLECTION_TOURS: &str = "tours";
const COLLECTION_COMMENTS: &str = "comments";
const COLLECTION_COMPANY_INFO: &str = "companyInfo";
const COLLECTION_COMPANY_INTRODUCTION: &str = "companyIntroduction";
const COLLECTION_CONTACTS: &str = "contacts";

/// Named collections of the back office document store.
///
/// Collections are independent: deleting a tour never touches comments
/// and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    Tours,
    Comments,
    CompanyInfo,
    CompanyIntroduction,
    Contacts,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Tours,
        Collection::Comments,
        Collection::CompanyInfo,
        Collection::CompanyIntroduction,
        Collection::Contacts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tours => COLLECTION_TOURS,
            Collection::Comments => COLLECTION_COMMENTS,
            Collection::CompanyInfo => COLLECTION_COMPANY_INFO,
            Collection::CompanyIntroduction => COLLECTION_COMPANY_INTRODUCTION,
            Collection::Contacts => COLLECTION_CONTACTS,
        }
    }

    pub fn parse(name: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value of a document.
///
/// Serialized untagged so documents round-trip as plain JSON objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether a form would treat this value as "not filled in"
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => f.write_str(&items.join("\n")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Complete field set of a document. Every write replaces the whole map.
pub type Fields = BTreeMap<String, FieldValue>;

/// Store-assigned document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId(value)
    }
}

/// A committed document: persisted, with an identifier assigned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Record { id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(FieldValue::as_number)
    }
}

/// How a column is typed when coming in from a spreadsheet or a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    List,
}

impl FieldKind {
    /// Value used when a row leaves the column out
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Number => FieldValue::Number(0.0),
            FieldKind::List => FieldValue::List(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, required: bool) -> Self {
        FieldSpec {
            name,
            kind,
            required,
        }
    }
}

/// Column layout of one collection.
///
/// Drives required-field checks on forms, default-fill on import and the
/// header order on export. `id_field` names the column that carries the
/// record identifier in spreadsheets; it is never written as a document field.
#[derive(Debug)]
pub struct RecordSchema {
    pub collection: Collection,
    pub id_field: &'static str,
    pub search_field: &'static str,
    pub sheet_name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Data columns (everything except the identifier column)
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.name != self.id_field)
    }

    /// Reject a form submission that leaves a required field blank
    pub fn validate(&self, fields: &Fields) -> Result<(), ValidationError> {
        for spec in self.data_fields().filter(|f| f.required) {
            match fields.get(spec.name) {
                Some(value) if !value.is_blank() => {}
                _ => return Err(ValidationError::MissingField(spec.name.to_string())),
            }
        }
        Ok(())
    }

    /// Drop the identifier column from a field set before it is written
    pub fn strip_id(&self, mut fields: Fields) -> Fields {
        fields.remove(self.id_field);
        fields
    }
}

pub static COMMENT_SCHEMA: RecordSchema = RecordSchema {
    collection: Collection::Comments,
    id_field: "key",
    search_field: "name",
    sheet_name: "Comments",
    fields: &[
        FieldSpec::new("key", FieldKind::Text, false),
        FieldSpec::new("avatar", FieldKind::Text, false),
        FieldSpec::new("name", FieldKind::Text, true),
        FieldSpec::new("comment", FieldKind::Text, true),
        FieldSpec::new("rating", FieldKind::Number, true),
    ],
};

pub static TOUR_SCHEMA: RecordSchema = RecordSchema {
    collection: Collection::Tours,
    id_field: "key",
    search_field: "name",
    sheet_name: "Tours",
    fields: &[
        FieldSpec::new("key", FieldKind::Text, false),
        FieldSpec::new("name", FieldKind::Text, true),
        FieldSpec::new("duration", FieldKind::Text, true),
        FieldSpec::new("price", FieldKind::Number, true),
        FieldSpec::new("departure", FieldKind::Text, true),
        FieldSpec::new("rating", FieldKind::Number, true),
        FieldSpec::new("image", FieldKind::Text, true),
        FieldSpec::new("address", FieldKind::Text, false),
        FieldSpec::new("phone", FieldKind::Text, false),
        FieldSpec::new("highlights", FieldKind::List, false),
        FieldSpec::new("itinerary", FieldKind::Text, false),
    ],
};

pub static CONTACT_SCHEMA: RecordSchema = RecordSchema {
    collection: Collection::Contacts,
    id_field: "key",
    search_field: "name",
    sheet_name: "Contacts",
    fields: &[
        FieldSpec::new("key", FieldKind::Text, false),
        FieldSpec::new("name", FieldKind::Text, true),
        FieldSpec::new("email", FieldKind::Text, true),
        FieldSpec::new("message", FieldKind::Text, true),
    ],
};

impl RecordSchema {
    /// Schema of a listable collection
    pub fn for_collection(collection: Collection) -> Option<&'static RecordSchema> {
        match collection {
            Collection::Tours => Some(&TOUR_SCHEMA),
            Collection::Comments => Some(&COMMENT_SCHEMA),
            Collection::Contacts => Some(&CONTACT_SCHEMA),
            Collection::CompanyInfo | Collection::CompanyIntroduction => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(name: &str, comment: &str, rating: f64) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".into(), name.into());
        fields.insert("comment".into(), comment.into());
        fields.insert("rating".into(), rating.into());
        fields
    }

    #[test]
    fn test_required_fields_are_enforced() {
        assert!(COMMENT_SCHEMA.validate(&comment("Anna", "Great trip", 5.0)).is_ok());

        let err = COMMENT_SCHEMA
            .validate(&comment("  ", "Great trip", 5.0))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("name".into()));

        let mut missing_rating = comment("Anna", "Great trip", 5.0);
        missing_rating.remove("rating");
        assert_eq!(
            COMMENT_SCHEMA.validate(&missing_rating).unwrap_err(),
            ValidationError::MissingField("rating".into())
        );
    }

    #[test]
    fn test_avatar_is_optional() {
        let mut fields = comment("Anna", "Great trip", 4.0);
        fields.insert("avatar".into(), "".into());
        assert!(COMMENT_SCHEMA.validate(&fields).is_ok());
    }

    #[test]
    fn test_field_value_json_shape() {
        let mut fields = comment("Anna", "Great trip", 5.0);
        fields.insert("highlights".into(), FieldValue::List(vec!["Beach".into()]));

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["rating"], serde_json::json!(5.0));
        assert_eq!(json["name"], serde_json::json!("Anna"));
        assert_eq!(json["highlights"], serde_json::json!(["Beach"]));

        let back: Fields = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn test_number_display_drops_integral_fraction() {
        assert_eq!(FieldValue::Number(4.0).to_string(), "4");
        assert_eq!(FieldValue::Number(4.5).to_string(), "4.5");
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::CompanyInfo.as_str(), "companyInfo");
        assert_eq!(Collection::parse("comments"), Some(Collection::Comments));
        assert_eq!(Collection::parse("nope"), None);
    }
}
