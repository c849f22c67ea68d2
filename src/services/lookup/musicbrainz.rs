//! MusicBrainz release lookup.
//!
//! No authentication, but the terms of service demand a descriptive
//! User-Agent and at most one request per second per client, enforced
//! process-wide by the shared [`Pacer`], which every request (including
//! the cover-art probe) passes through. 15 second budget.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::{
    error::AppResult,
    models::draft::{CoverRef, ItemDraft, MetadataSource},
    models::item::Creator,
};

use super::{classify_send_error, read_json, throttle::Pacer};

const API_URL: &str = "https://musicbrainz.org/ws/2";
/// Cover art lives on a separate archive host
const COVER_ART_URL: &str = "https://coverartarchive.org";
const TIMEOUT: Duration = Duration::from_secs(15);
const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct ReleaseList {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
pub struct Release {
    pub id: String,
    pub title: Option<String>,
    pub date: Option<String>,
    pub country: Option<String>,
    pub barcode: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(rename = "label-info", default)]
    pub label_info: Vec<LabelInfo>,
    #[serde(default)]
    pub media: Vec<Medium>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistCredit {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LabelInfo {
    pub label: Option<Label>,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Medium {
    pub format: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
pub struct Track {
    pub title: Option<String>,
    pub position: Option<i32>,
    /// Milliseconds
    pub length: Option<i64>,
}

/// Milliseconds to whole seconds, rounded
pub fn millis_to_seconds(millis: i64) -> i64 {
    (millis as f64 / 1000.0).round() as i64
}

/// Pure mapping from one release to a draft. Track listings only appear
/// on detail responses (`inc=recordings`); search results map without.
pub fn draft_from_release(release: Release) -> ItemDraft {
    let creators: Vec<Creator> = release
        .artist_credit
        .into_iter()
        .map(|credit| Creator::new(credit.name, "Artist"))
        .collect();

    let publisher = release
        .label_info
        .into_iter()
        .find_map(|info| info.label.and_then(|label| label.name));

    let mut metadata = serde_json::Map::new();
    if let Some(barcode) = release.barcode.filter(|b| !b.is_empty()) {
        metadata.insert("barcode".to_string(), barcode.into());
    }
    if let Some(country) = release.country {
        metadata.insert("country".to_string(), country.into());
    }
    if let Some(format) = release.media.first().and_then(|m| m.format.clone()) {
        metadata.insert("format".to_string(), format.into());
    }

    let tracks: Vec<&Track> = release.media.iter().flat_map(|m| m.tracks.iter()).collect();
    if !tracks.is_empty() {
        let mut total_seconds: i64 = 0;
        let listing: Vec<serde_json::Value> = tracks
            .iter()
            .map(|track| {
                let seconds = track.length.map(millis_to_seconds).unwrap_or(0);
                total_seconds += seconds;
                serde_json::json!({
                    "position": track.position,
                    "title": track.title,
                    "duration": seconds,
                })
            })
            .collect();
        metadata.insert("tracks".to_string(), serde_json::Value::Array(listing));
        metadata.insert("total_duration".to_string(), total_seconds.into());
    }

    ItemDraft {
        title: release.title,
        creators: Some(creators),
        publisher,
        publish_date: release.date,
        external_id: Some(release.id),
        metadata,
        ..Default::default()
    }
    .normalized()
}

#[derive(Clone)]
pub struct MusicBrainz {
    http: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl MusicBrainz {
    pub fn new(http: reqwest::Client, pacer: Arc<Pacer>) -> Self {
        Self { http, pacer }
    }

    async fn search_releases(&self, lucene_query: &str) -> AppResult<Vec<ItemDraft>> {
        self.pacer.pace().await;
        let limit = MAX_SEARCH_RESULTS.to_string();
        let response = self
            .http
            .get(format!("{}/release", API_URL))
            .query(&[
                ("query", lucene_query),
                ("fmt", "json"),
                ("limit", limit.as_str()),
            ])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::MusicBrainz, e))?;

        let list: ReleaseList = read_json(MetadataSource::MusicBrainz, response).await?;
        Ok(list
            .releases
            .into_iter()
            .map(draft_from_release)
            .filter(ItemDraft::is_usable)
            .collect())
    }

    /// Free-text release search
    pub async fn search(&self, query: &str) -> AppResult<Vec<ItemDraft>> {
        // Quote the term so Lucene operators in user input stay inert
        self.search_releases(&format!("release:\"{}\"", query.replace('"', ""))).await
    }

    /// Exact barcode search, for scanned CDs and vinyl
    pub async fn search_barcode(&self, barcode: &str) -> AppResult<Vec<ItemDraft>> {
        self.search_releases(&format!("barcode:{}", barcode.trim())).await
    }

    /// Fetch one release with artists, labels and the full track listing,
    /// then probe the archive for a front cover.
    pub async fn detail(&self, mbid: &str) -> AppResult<ItemDraft> {
        self.pacer.pace().await;
        let response = self
            .http
            .get(format!("{}/release/{}", API_URL, mbid))
            .query(&[
                ("inc", "artist-credits+labels+recordings"),
                ("fmt", "json"),
            ])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::MusicBrainz, e))?;

        let release: Release = read_json(MetadataSource::MusicBrainz, response).await?;
        let mut draft = draft_from_release(release);
        draft.cover = self.probe_cover(mbid).await.map(CoverRef::Direct);
        Ok(draft)
    }

    /// HEAD the archive for a front cover. No source confirms cover art
    /// availability reliably, so any failure here means "no cover", never
    /// an error. The probe counts against the shared rate limit.
    async fn probe_cover(&self, mbid: &str) -> Option<String> {
        self.pacer.pace().await;
        let url = format!("{}/release/{}/front", COVER_ART_URL, mbid);
        match self
            .http
            .head(&url)
            .timeout(TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => Some(url),
            Ok(response) => {
                tracing::debug!("no cover art for release {}: {}", mbid, response.status());
                None
            }
            Err(e) => {
                tracing::debug!("cover art probe failed for release {}: {}", mbid, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn millis_convert_to_rounded_seconds() {
        assert_eq!(millis_to_seconds(245_000), 245);
        assert_eq!(millis_to_seconds(245_499), 245);
        assert_eq!(millis_to_seconds(245_500), 246);
    }

    fn release_fixture() -> Release {
        serde_json::from_value(json!({
            "id": "d6010be3-98f8-422c-a6c9-787e2e491e58",
            "title": "Abbey Road",
            "date": "1969-09-26",
            "country": "GB",
            "barcode": "5099969944123",
            "artist-credit": [{"name": "The Beatles"}],
            "label-info": [{"label": {"name": "Apple Records"}}],
            "media": [{
                "format": "12\" Vinyl",
                "tracks": [
                    {"title": "Come Together", "position": 1, "length": 259_666},
                    {"title": "Something", "position": 2, "length": 182_293}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn maps_release_with_tracks() {
        let draft = draft_from_release(release_fixture());
        assert_eq!(draft.title.as_deref(), Some("Abbey Road"));
        assert_eq!(
            draft.creators.as_deref(),
            Some(&[Creator::new("The Beatles", "Artist")][..])
        );
        assert_eq!(draft.publisher.as_deref(), Some("Apple Records"));
        assert_eq!(draft.publish_date.as_deref(), Some("1969-09-26"));
        assert_eq!(
            draft.external_id.as_deref(),
            Some("d6010be3-98f8-422c-a6c9-787e2e491e58")
        );

        assert_eq!(draft.metadata["barcode"], json!("5099969944123"));
        assert_eq!(draft.metadata["format"], json!("12\" Vinyl"));
        // 259_666ms -> 260s, 182_293ms -> 182s
        assert_eq!(draft.metadata["total_duration"], json!(442));
        let tracks = draft.metadata["tracks"].as_array().unwrap();
        assert_eq!(tracks[0]["duration"], json!(260));
        assert_eq!(tracks[1]["duration"], json!(182));
    }

    #[test]
    fn search_result_without_recordings_has_no_track_metadata() {
        let release: Release = serde_json::from_value(json!({
            "id": "x",
            "title": "Abbey Road",
            "artist-credit": [{"name": "The Beatles"}]
        }))
        .unwrap();
        let draft = draft_from_release(release);
        assert!(!draft.metadata.contains_key("tracks"));
        assert!(!draft.metadata.contains_key("total_duration"));
        // Search results carry no cover; the probe only runs on detail
        assert!(draft.cover.is_none());
    }
}
