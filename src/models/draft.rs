//! Normalized metadata lookup types.
//!
//! Every external source mapping produces an [`ItemDraft`]: a candidate
//! record the user can review and persist as a catalog item. Field absence
//! means "the source did not supply this", never an empty default; the
//! storage boundary decides defaults.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::item::{Creator, MediaType};

/// External metadata providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    OpenLibrary,
    GoogleBooks,
    Tmdb,
    Jellyfin,
    ComicVine,
    MusicBrainz,
}

impl MetadataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataSource::OpenLibrary => "openlibrary",
            MetadataSource::GoogleBooks => "googlebooks",
            MetadataSource::Tmdb => "tmdb",
            MetadataSource::Jellyfin => "jellyfin",
            MetadataSource::ComicVine => "comicvine",
            MetadataSource::MusicBrainz => "musicbrainz",
        }
    }
}

impl std::fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of identifier the user supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceHint {
    Isbn,
    Title,
    Barcode,
}

/// Input record for one lookup request. Constructed per request, consumed
/// once, never persisted.
#[derive(Debug, Clone)]
pub struct MetadataQuery {
    pub hint: SourceHint,
    pub source: MetadataSource,
    pub raw_value: String,
    pub media_type: MediaType,
}

impl MetadataQuery {
    pub fn new(
        hint: SourceHint,
        source: MetadataSource,
        raw_value: impl Into<String>,
        media_type: MediaType,
    ) -> Self {
        Self {
            hint,
            source,
            raw_value: raw_value.into(),
            media_type,
        }
    }
}

/// Reference to a cover image.
///
/// Jellyfin's direct image URLs embed the server API key as a query
/// parameter, so drafts from that source carry `ProxiedById` and the
/// serialization boundary decides whether to expand it to the direct URL
/// (ephemeral search previews) or to this server's own image-relay route
/// (anything that may be persisted). Other sources use public URLs and
/// always carry `Direct`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverRef {
    Direct(String),
    ProxiedById(String),
}

/// Normalized candidate metadata record, not yet persisted.
///
/// All fields optional: no external source supplies every one of them.
#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub creators: Option<Vec<Creator>>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
    pub cover: Option<CoverRef>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub tags: Option<Vec<String>>,
    pub rating: Option<i16>,
    pub external_id: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ItemDraft {
    /// Enforce the draft invariants: empty collections collapse to absent,
    /// blank strings collapse to absent.
    pub fn normalized(mut self) -> Self {
        if self.creators.as_ref().is_some_and(|c| c.is_empty()) {
            self.creators = None;
        }
        if self.tags.as_ref().is_some_and(|t| t.is_empty()) {
            self.tags = None;
        }
        for field in [
            &mut self.title,
            &mut self.subtitle,
            &mut self.publisher,
            &mut self.publish_date,
            &mut self.description,
            &mut self.language,
            &mut self.external_id,
        ] {
            if field.as_ref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
        self
    }

    /// A draft is usable when it at least names the thing it describes
    pub fn is_usable(&self) -> bool {
        self.title.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_collapses_empty_creators_to_absent() {
        let draft = ItemDraft {
            title: Some("Dune".to_string()),
            creators: Some(vec![]),
            tags: Some(vec![]),
            ..Default::default()
        }
        .normalized();

        assert!(draft.creators.is_none());
        assert!(draft.tags.is_none());
    }

    #[test]
    fn normalized_collapses_blank_strings_to_absent() {
        let draft = ItemDraft {
            title: Some("Dune".to_string()),
            publisher: Some("   ".to_string()),
            description: Some(String::new()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(draft.title.as_deref(), Some("Dune"));
        assert!(draft.publisher.is_none());
        assert!(draft.description.is_none());
    }

    #[test]
    fn draft_without_title_is_not_usable() {
        let draft = ItemDraft {
            publisher: Some("Ace".to_string()),
            ..Default::default()
        };
        assert!(!draft.is_usable());
    }
}
