//! Comic Vine issue and volume lookup.
//!
//! The API key is mandatory: there is no anonymous quota, so a missing
//! key is the caller's error, not a degraded-service condition. Detail
//! endpoints need the resource id prefixed with its type namespace
//! (`4050-` volume, `4000-` issue); search results record their kind so
//! callers hit the right endpoint. Requests time out after 10s.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::draft::{CoverRef, ItemDraft, MetadataSource},
    models::item::Creator,
};

use super::classify_send_error;

const BASE_URL: &str = "https://comicvine.gamespot.com/api";
const TIMEOUT: Duration = Duration::from_secs(10);
const MAX_SEARCH_RESULTS: usize = 20;

// Upstream status codes in the response envelope
const STATUS_OK: i32 = 1;
const STATUS_INVALID_KEY: i32 = 100;
const STATUS_NOT_FOUND: i32 = 101;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Comic Vine resource kinds we resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComicKind {
    Issue,
    Volume,
}

impl ComicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComicKind::Issue => "issue",
            ComicKind::Volume => "volume",
        }
    }

    /// Numeric namespace prefix required by detail endpoints
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ComicKind::Issue => "4000",
            ComicKind::Volume => "4050",
        }
    }
}

impl std::str::FromStr for ComicKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(ComicKind::Issue),
            "volume" => Ok(ComicKind::Volume),
            _ => Err(format!("Invalid resource kind: {} (expected issue or volume)", s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CvEnvelope<T> {
    status_code: i32,
    error: String,
    results: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct CvResult {
    pub id: i64,
    pub name: Option<String>,
    pub resource_type: Option<String>,
    pub issue_number: Option<String>,
    pub volume: Option<CvVolumeRef>,
    pub description: Option<String>,
    pub deck: Option<String>,
    pub image: Option<CvImage>,
    pub cover_date: Option<String>,
    pub start_year: Option<String>,
    pub publisher: Option<CvNamed>,
    #[serde(default)]
    pub person_credits: Vec<CvPerson>,
    pub count_of_issues: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CvVolumeRef {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CvNamed {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CvImage {
    pub medium_url: Option<String>,
    pub original_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CvPerson {
    pub name: String,
    pub role: Option<String>,
}

/// Remove markup from upstream descriptions. A plain tag strip is enough:
/// the content comes from a trusted upstream, not arbitrary user input.
pub fn strip_html(input: &str) -> String {
    TAG_RE.replace_all(input, "").trim().to_string()
}

/// Issue titles are synthesized from the volume name and issue number,
/// with the issue's own name appended when it has one.
pub fn issue_title(volume_name: &str, issue_number: &str, issue_name: Option<&str>) -> String {
    match issue_name {
        Some(name) if !name.is_empty() => {
            format!("{} #{} - {}", volume_name, issue_number, name)
        }
        _ => format!("{} #{}", volume_name, issue_number),
    }
}

/// Pure mapping from one Comic Vine record to a draft. The record's kind
/// travels in the draft metadata so the detail endpoint can be addressed.
pub fn draft_from_result(kind: ComicKind, result: CvResult) -> ItemDraft {
    let title = match kind {
        ComicKind::Issue => {
            let volume_name = result
                .volume
                .as_ref()
                .and_then(|v| v.name.clone())
                .unwrap_or_default();
            let number = result.issue_number.clone().unwrap_or_default();
            if volume_name.is_empty() && number.is_empty() {
                result.name.clone()
            } else {
                Some(issue_title(&volume_name, &number, result.name.as_deref()))
            }
        }
        ComicKind::Volume => result.name.clone(),
    };

    let description = result
        .description
        .as_deref()
        .map(strip_html)
        .filter(|d| !d.is_empty())
        .or(result.deck);

    let creators: Vec<Creator> = result
        .person_credits
        .into_iter()
        .map(|person| Creator {
            name: person.name,
            role: person.role,
        })
        .collect();

    let cover = result
        .image
        .and_then(|image| image.medium_url.or(image.original_url))
        .map(CoverRef::Direct);

    let publish_date = match kind {
        ComicKind::Issue => result.cover_date,
        ComicKind::Volume => result.start_year,
    };

    let mut metadata = serde_json::Map::new();
    metadata.insert("comicvine_kind".to_string(), kind.as_str().into());
    if let Some(count) = result.count_of_issues {
        metadata.insert("count_of_issues".to_string(), count.into());
    }

    ItemDraft {
        title,
        description,
        creators: Some(creators),
        publisher: result.publisher.and_then(|p| p.name),
        publish_date,
        cover,
        external_id: Some(result.id.to_string()),
        metadata,
        ..Default::default()
    }
    .normalized()
}

#[derive(Clone)]
pub struct ComicVine {
    http: reqwest::Client,
}

impl ComicVine {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Decode the envelope, translating upstream status codes
    async fn read_envelope<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let envelope: CvEnvelope<T> =
            super::read_json(MetadataSource::ComicVine, response).await?;
        match envelope.status_code {
            STATUS_OK => envelope.results.ok_or_else(|| {
                AppError::Internal("comicvine returned an empty result set".to_string())
            }),
            STATUS_INVALID_KEY => Err(AppError::UpstreamAuth(
                "Comic Vine rejected the configured API key".to_string(),
            )),
            STATUS_NOT_FOUND => Err(AppError::NotFound(
                "Comic Vine has no such record".to_string(),
            )),
            code => Err(AppError::Internal(format!(
                "comicvine returned status {}: {}",
                code, envelope.error
            ))),
        }
    }

    /// Search issues and volumes together; each draft records its kind
    pub async fn search(&self, api_key: &str, query: &str) -> AppResult<Vec<ItemDraft>> {
        let limit = MAX_SEARCH_RESULTS.to_string();
        let response = self
            .http
            .get(format!("{}/search/", BASE_URL))
            .query(&[
                ("api_key", api_key),
                ("format", "json"),
                ("query", query),
                ("resources", "issue,volume"),
                ("limit", limit.as_str()),
            ])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::ComicVine, e))?;

        let results: Vec<CvResult> = self.read_envelope(response).await?;
        Ok(results
            .into_iter()
            .filter_map(|result| {
                let kind = match result.resource_type.as_deref() {
                    Some("issue") => ComicKind::Issue,
                    Some("volume") => ComicKind::Volume,
                    _ => return None,
                };
                Some(draft_from_result(kind, result))
            })
            .filter(ItemDraft::is_usable)
            .collect())
    }

    /// Fetch one issue or volume by its bare numeric id
    pub async fn detail(&self, api_key: &str, kind: ComicKind, id: i64) -> AppResult<ItemDraft> {
        let url = format!(
            "{}/{}/{}-{}/",
            BASE_URL,
            kind.as_str(),
            kind.id_prefix(),
            id
        );
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", api_key), ("format", "json")])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::ComicVine, e))?;

        let result: CvResult = self.read_envelope(response).await?;
        Ok(draft_from_result(kind, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_title_synthesis() {
        assert_eq!(issue_title("Batman", "27", None), "Batman #27");
        assert_eq!(issue_title("Batman", "27", Some("")), "Batman #27");
        assert_eq!(issue_title("Batman", "27", Some("Lovers")), "Batman #27 - Lovers");
    }

    #[test]
    fn strip_html_removes_tags_only() {
        assert_eq!(
            strip_html("<p>The Dark Knight returns to <em>Gotham</em>.</p>"),
            "The Dark Knight returns to Gotham."
        );
        assert_eq!(strip_html("no markup"), "no markup");
    }

    #[test]
    fn issue_result_synthesizes_its_title() {
        let result: CvResult = serde_json::from_value(json!({
            "id": 6643,
            "name": "Lovers",
            "resource_type": "issue",
            "issue_number": "27",
            "volume": {"name": "Batman"},
            "cover_date": "1945-02-01",
            "description": "<p>Dick Grayson takes the <b>night</b> off.</p>",
            "image": {"medium_url": "https://comicvine.gamespot.com/a/medium.jpg"}
        }))
        .unwrap();

        let draft = draft_from_result(ComicKind::Issue, result);
        assert_eq!(draft.title.as_deref(), Some("Batman #27 - Lovers"));
        assert_eq!(
            draft.description.as_deref(),
            Some("Dick Grayson takes the night off.")
        );
        assert_eq!(draft.publish_date.as_deref(), Some("1945-02-01"));
        assert_eq!(draft.metadata["comicvine_kind"], json!("issue"));
        assert_eq!(draft.external_id.as_deref(), Some("6643"));
    }

    #[test]
    fn volume_result_keeps_its_own_name() {
        let result: CvResult = serde_json::from_value(json!({
            "id": 796,
            "name": "Batman",
            "resource_type": "volume",
            "start_year": "1940",
            "publisher": {"name": "DC Comics"},
            "count_of_issues": 713
        }))
        .unwrap();

        let draft = draft_from_result(ComicKind::Volume, result);
        assert_eq!(draft.title.as_deref(), Some("Batman"));
        assert_eq!(draft.publish_date.as_deref(), Some("1940"));
        assert_eq!(draft.publisher.as_deref(), Some("DC Comics"));
        assert_eq!(draft.metadata["comicvine_kind"], json!("volume"));
        assert_eq!(draft.metadata["count_of_issues"], json!(713));
    }

    #[test]
    fn detail_ids_get_the_namespace_prefix() {
        assert_eq!(ComicKind::Volume.id_prefix(), "4050");
        assert_eq!(ComicKind::Issue.id_prefix(), "4000");
    }
}
