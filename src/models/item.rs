//! Catalog item model and related types.
//!
//! Items cover every physical and digital media kind the library tracks.
//! Creators, tags and free-form metadata are stored as JSONB columns and
//! parsed on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Media type codes for catalog items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Book,
    Comic,
    Cd,
    Vinyl,
    Dvd,
    Bluray,
    Ebook,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Book => "book",
            MediaType::Comic => "comic",
            MediaType::Cd => "cd",
            MediaType::Vinyl => "vinyl",
            MediaType::Dvd => "dvd",
            MediaType::Bluray => "bluray",
            MediaType::Ebook => "ebook",
        }
    }

    /// Audio kinds carry track listings and durations
    pub fn is_audio(&self) -> bool {
        matches!(self, MediaType::Cd | MediaType::Vinyl)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "book" => Ok(MediaType::Book),
            "comic" => Ok(MediaType::Comic),
            "cd" => Ok(MediaType::Cd),
            "vinyl" => Ok(MediaType::Vinyl),
            "dvd" => Ok(MediaType::Dvd),
            "bluray" => Ok(MediaType::Bluray),
            "ebook" => Ok(MediaType::Ebook),
            _ => Err(format!("Invalid media type: {}", s)),
        }
    }
}

/// A person credited on an item, with their role (author, director, artist...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Creator {
    pub name: String,
    pub role: Option<String>,
}

impl Creator {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Some(role.into()),
        }
    }
}

/// Internal row structure matching the `items` table
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub id: i32,
    pub media_type: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub isbn: Option<String>,
    pub barcode: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub rating: Option<i16>,
    pub external_id: Option<String>,
    pub external_source: Option<String>,
    pub creators: Option<serde_json::Value>,
    pub tags: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full item model returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Item {
    pub id: i32,
    pub media_type: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub isbn: Option<String>,
    pub barcode: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub rating: Option<i16>,
    pub external_id: Option<String>,
    pub external_source: Option<String>,
    pub creators: Vec<Creator>,
    pub tags: Vec<String>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        let creators = row
            .creators
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let tags = row
            .tags
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        let metadata = match row.metadata {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        Item {
            id: row.id,
            media_type: row.media_type,
            title: row.title,
            subtitle: row.subtitle,
            isbn: row.isbn,
            barcode: row.barcode,
            publisher: row.publisher,
            publish_date: row.publish_date,
            description: row.description,
            cover_url: row.cover_url,
            page_count: row.page_count,
            language: row.language,
            rating: row.rating,
            external_id: row.external_id,
            external_source: row.external_source,
            creators,
            tags,
            metadata,
            location: row.location,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Short item representation for list views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemShort {
    pub id: i32,
    pub media_type: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub cover_url: Option<String>,
    pub publish_date: Option<String>,
    pub rating: Option<i16>,
    pub creators: Vec<Creator>,
    pub reading_status: Option<String>,
    pub on_loan: bool,
}

/// Create / update payload for an item
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ItemInput {
    pub media_type: MediaType,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    pub subtitle: Option<String>,
    pub isbn: Option<String>,
    pub barcode: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    #[validate(range(min = 0, max = 5, message = "Rating must be between 0 and 5"))]
    pub rating: Option<i16>,
    pub external_id: Option<String>,
    pub external_source: Option<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Item list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ItemQuery {
    pub media_type: Option<MediaType>,
    /// Free-text search over title, subtitle and creator names
    pub search: Option<String>,
    pub tag: Option<String>,
    /// Filter on the caller's reading status
    pub reading_status: Option<String>,
    /// Sort key: title | created_at | publish_date | rating
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
