// Typed views of the back office documents.
//
// Stores and controllers work on the generic `Fields` map; these types are
// for code that needs a concrete shape (tour details, company pages, the
// admin tool). Conversion goes through serde_json so the stored shape is
// exactly the serialized struct.

use crate::record::{Collection, Fields, Record, RecordId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A struct stored as one document of `COLLECTION`
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    /// Field map to write. Optional fields left as `None` are not written.
    fn to_fields(&self) -> Result<Fields, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        serde_json::from_value(value)
    }

    fn from_fields(fields: &Fields) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(fields)?;
        serde_json::from_value(value)
    }

    fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        Self::from_fields(&record.fields)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub avatar: String,
    pub name: String,
    pub comment: String,
    pub rating: f64,
}

impl Document for Comment {
    const COLLECTION: Collection = Collection::Comments;
}

/// One day/stop of a tour itinerary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItineraryItem {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tour {
    pub name: String,
    pub duration: String,
    pub price: f64,
    pub departure: String,
    pub rating: f64,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Itinerary items as a JSON array string
    #[serde(default)]
    pub itinerary: String,
}

impl Tour {
    /// Decode the stored itinerary; an empty field is an empty itinerary
    pub fn itinerary_items(&self) -> Result<Vec<ItineraryItem>, serde_json::Error> {
        if self.itinerary.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.itinerary)
    }

    pub fn set_itinerary(&mut self, items: &[ItineraryItem]) -> Result<(), serde_json::Error> {
        self.itinerary = serde_json::to_string(items)?;
        Ok(())
    }

    /// Edit-form cleanup: blank optional fields become `None`, blank
    /// highlight lines are dropped.
    pub fn sanitized(mut self) -> Self {
        self.address = self.address.filter(|a| !a.trim().is_empty());
        self.phone = self.phone.filter(|p| !p.trim().is_empty());
        self.highlights.retain(|h| !h.trim().is_empty());
        self
    }
}

impl Document for Tour {
    const COLLECTION: Collection = Collection::Tours;
}

/// The single `companyInfo/info` document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gmail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zalo: Option<String>,
}

impl Document for CompanyInfo {
    const COLLECTION: Collection = Collection::CompanyInfo;
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyIntroduction {
    /// Rich-text (HTML) body
    #[serde(default)]
    pub content: String,
    /// RFC 3339 timestamp of the last save
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Document for CompanyIntroduction {
    const COLLECTION: Collection = Collection::CompanyIntroduction;
}

/// Message left through the public contact form. Read and delete only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl Document for ContactMessage {
    const COLLECTION: Collection = Collection::Contacts;
}

/// A typed document together with its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: RecordId,
    pub doc: T,
}

impl<T: Document> Stored<T> {
    pub fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        Ok(Stored {
            id: record.id.clone(),
            doc: T::from_record(record)?,
        })
    }
}
