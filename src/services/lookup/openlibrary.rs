//! Open Library ISBN lookup.
//!
//! Uses the books API with `jscmd=data`, which returns a map keyed by the
//! requested bib key. No authentication; requests time out after 5s.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::draft::{CoverRef, ItemDraft, MetadataSource},
    models::item::Creator,
};

use super::{classify_send_error, read_json, BookSource};

const API_URL: &str = "https://openlibrary.org/api/books";
const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
pub struct OlRecord {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<OlNamed>,
    #[serde(default)]
    pub publishers: Vec<OlNamed>,
    pub publish_date: Option<String>,
    pub number_of_pages: Option<i32>,
    pub cover: Option<OlCover>,
    #[serde(default)]
    pub subjects: Vec<OlNamed>,
    #[serde(default)]
    pub identifiers: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct OlNamed {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct OlCover {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

/// Pure mapping from one Open Library record to a draft
pub fn draft_from_record(record: OlRecord) -> ItemDraft {
    let creators: Vec<Creator> = record
        .authors
        .into_iter()
        .map(|a| Creator::new(a.name, "Author"))
        .collect();

    let cover = record
        .cover
        .and_then(|c| c.large.or(c.medium).or(c.small))
        .map(CoverRef::Direct);

    let tags: Vec<String> = record.subjects.into_iter().map(|s| s.name).collect();

    let external_id = record
        .identifiers
        .get("openlibrary")
        .and_then(|ids| ids.first())
        .cloned();

    ItemDraft {
        title: record.title,
        subtitle: record.subtitle,
        creators: Some(creators),
        publisher: record.publishers.into_iter().next().map(|p| p.name),
        publish_date: record.publish_date,
        cover,
        page_count: record.number_of_pages,
        tags: Some(tags),
        external_id,
        ..Default::default()
    }
    .normalized()
}

#[derive(Clone)]
pub struct OpenLibrary {
    http: reqwest::Client,
}

impl OpenLibrary {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BookSource for OpenLibrary {
    fn source(&self) -> MetadataSource {
        MetadataSource::OpenLibrary
    }

    async fn lookup_isbn(&self, isbn: &str) -> AppResult<Option<ItemDraft>> {
        let bibkey = format!("ISBN:{}", isbn);
        let response = self
            .http
            .get(API_URL)
            .query(&[
                ("bibkeys", bibkey.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(self.source(), e))?;

        let mut body: HashMap<String, OlRecord> = read_json(self.source(), response).await?;
        Ok(body
            .remove(&bibkey)
            .map(draft_from_record)
            .filter(ItemDraft::is_usable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> OlRecord {
        serde_json::from_value(json!({
            "title": "Dune",
            "subtitle": "A novel",
            "authors": [{"url": "/authors/OL79034A", "name": "Frank Herbert"}],
            "publishers": [{"name": "Chilton Books"}],
            "publish_date": "1965",
            "number_of_pages": 412,
            "cover": {
                "small": "https://covers.openlibrary.org/b/id/11481354-S.jpg",
                "medium": "https://covers.openlibrary.org/b/id/11481354-M.jpg",
                "large": "https://covers.openlibrary.org/b/id/11481354-L.jpg"
            },
            "subjects": [{"name": "Science fiction", "url": "..."}],
            "identifiers": {"openlibrary": ["OL26501493M"], "isbn_10": ["0441172717"]}
        }))
        .unwrap()
    }

    #[test]
    fn maps_full_record() {
        let draft = draft_from_record(fixture());
        assert_eq!(draft.title.as_deref(), Some("Dune"));
        assert_eq!(draft.subtitle.as_deref(), Some("A novel"));
        assert_eq!(
            draft.creators.as_deref(),
            Some(&[Creator::new("Frank Herbert", "Author")][..])
        );
        assert_eq!(draft.publisher.as_deref(), Some("Chilton Books"));
        assert_eq!(draft.page_count, Some(412));
        assert_eq!(
            draft.cover,
            Some(CoverRef::Direct(
                "https://covers.openlibrary.org/b/id/11481354-L.jpg".to_string()
            ))
        );
        assert_eq!(draft.tags.as_deref(), Some(&["Science fiction".to_string()][..]));
        assert_eq!(draft.external_id.as_deref(), Some("OL26501493M"));
    }

    #[test]
    fn sparse_record_leaves_fields_absent() {
        let record: OlRecord = serde_json::from_value(json!({"title": "Dune"})).unwrap();
        let draft = draft_from_record(record);
        assert_eq!(draft.title.as_deref(), Some("Dune"));
        // Empty collections collapse to absent, not empty
        assert!(draft.creators.is_none());
        assert!(draft.tags.is_none());
        assert!(draft.cover.is_none());
        assert!(draft.publisher.is_none());
    }

    #[test]
    fn cover_falls_back_to_smaller_sizes() {
        let record: OlRecord = serde_json::from_value(json!({
            "title": "Dune",
            "cover": {"small": "s.jpg"}
        }))
        .unwrap();
        let draft = draft_from_record(record);
        assert_eq!(draft.cover, Some(CoverRef::Direct("s.jpg".to_string())));
    }
}
