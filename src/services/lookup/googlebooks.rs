//! Google Books lookup and free-text search.
//!
//! Public quota, no key. Serves as the ISBN fallback behind Open Library
//! and as the only source for title search. Requests time out after 10s.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::draft::{CoverRef, ItemDraft, MetadataSource},
    models::item::Creator,
};

use super::{classify_send_error, read_json, BookSource};

const API_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const TIMEOUT: Duration = Duration::from_secs(10);
/// Search is capped; the UI shows one page of candidates
pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct VolumeList {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(rename = "volumeInfo")]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub average_rating: Option<f64>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

/// Pure mapping from one Google Books volume to a draft
pub fn draft_from_volume(volume: Volume) -> ItemDraft {
    let info = volume.volume_info;

    let creators: Vec<Creator> = info
        .authors
        .into_iter()
        .map(|name| Creator::new(name, "Author"))
        .collect();

    // Thumbnails are served over plain http by default
    let cover = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail))
        .map(|url| CoverRef::Direct(url.replacen("http://", "https://", 1)));

    ItemDraft {
        title: info.title,
        subtitle: info.subtitle,
        creators: Some(creators),
        publisher: info.publisher,
        publish_date: info.published_date,
        description: info.description,
        cover,
        page_count: info.page_count,
        language: info.language,
        tags: Some(info.categories),
        rating: info.average_rating.map(|r| r.round() as i16),
        external_id: Some(volume.id),
        ..Default::default()
    }
    .normalized()
}

#[derive(Clone)]
pub struct GoogleBooks {
    http: reqwest::Client,
}

impl GoogleBooks {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn query(&self, q: &str, max_results: usize) -> AppResult<Vec<Volume>> {
        let response = self
            .http
            .get(API_URL)
            .query(&[("q", q), ("maxResults", &max_results.to_string())])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::GoogleBooks, e))?;

        let body: VolumeList = read_json(MetadataSource::GoogleBooks, response).await?;
        Ok(body.items)
    }

    /// Free-text search, at most [`MAX_SEARCH_RESULTS`] drafts
    pub async fn search(&self, q: &str) -> AppResult<Vec<ItemDraft>> {
        let volumes = self.query(q, MAX_SEARCH_RESULTS).await?;
        Ok(volumes
            .into_iter()
            .map(draft_from_volume)
            .filter(ItemDraft::is_usable)
            .collect())
    }
}

#[async_trait]
impl BookSource for GoogleBooks {
    fn source(&self) -> MetadataSource {
        MetadataSource::GoogleBooks
    }

    async fn lookup_isbn(&self, isbn: &str) -> AppResult<Option<ItemDraft>> {
        let volumes = self.query(&format!("isbn:{}", isbn), 1).await?;
        Ok(volumes
            .into_iter()
            .next()
            .map(draft_from_volume)
            .filter(ItemDraft::is_usable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Volume {
        serde_json::from_value(json!({
            "id": "B1ZnzgEACAAJ",
            "volumeInfo": {
                "title": "Dune",
                "authors": ["Frank Herbert"],
                "publisher": "Ace Books",
                "publishedDate": "1990-09-01",
                "description": "Follows the adventures of Paul Atreides.",
                "pageCount": 535,
                "categories": ["Fiction"],
                "averageRating": 4.5,
                "language": "en",
                "imageLinks": {
                    "smallThumbnail": "http://books.google.com/books/content?id=x&zoom=5",
                    "thumbnail": "http://books.google.com/books/content?id=x&zoom=1"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn maps_full_volume() {
        let draft = draft_from_volume(fixture());
        assert_eq!(draft.title.as_deref(), Some("Dune"));
        assert_eq!(
            draft.creators.as_deref(),
            Some(&[Creator::new("Frank Herbert", "Author")][..])
        );
        assert_eq!(draft.publisher.as_deref(), Some("Ace Books"));
        assert_eq!(draft.page_count, Some(535));
        assert_eq!(draft.language.as_deref(), Some("en"));
        assert_eq!(draft.rating, Some(5));
        assert_eq!(draft.external_id.as_deref(), Some("B1ZnzgEACAAJ"));
    }

    #[test]
    fn thumbnail_is_upgraded_to_https() {
        let draft = draft_from_volume(fixture());
        match draft.cover {
            Some(CoverRef::Direct(url)) => assert!(url.starts_with("https://")),
            other => panic!("expected direct cover, got {:?}", other),
        }
    }

    #[test]
    fn volume_without_info_fields_maps_to_sparse_draft() {
        let volume: Volume = serde_json::from_value(json!({
            "id": "abc",
            "volumeInfo": {"title": "Bare"}
        }))
        .unwrap();
        let draft = draft_from_volume(volume);
        assert_eq!(draft.title.as_deref(), Some("Bare"));
        assert!(draft.creators.is_none());
        assert!(draft.tags.is_none());
        assert!(draft.rating.is_none());
    }
}
