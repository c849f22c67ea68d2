//! Jellyfin library lookup.
//!
//! Talks to the user's own Jellyfin server with their API key. The key is
//! sent as a request header, never in the URL, except for image fetches,
//! where Jellyfin only accepts a query parameter. Drafts therefore carry a
//! proxied cover reference and the serialization boundary decides whether
//! a direct (preview) or relayed (persistable) URL leaves this server.
//! Requests time out after 15s.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::draft::{CoverRef, ItemDraft, MetadataSource},
    models::item::Creator,
};

use super::{classify_send_error, read_json};

const TIMEOUT: Duration = Duration::from_secs(15);
const AUTH_HEADER: &str = "X-Emby-Token";
/// Jellyfin reports durations in 100-nanosecond ticks
const TICKS_PER_SECOND: i64 = 10_000_000;
const MAX_SEARCH_RESULTS: usize = 20;

/// Connection details resolved from the caller's settings
#[derive(Debug, Clone)]
pub struct JellyfinConn {
    pub base_url: String,
    pub api_key: String,
}

impl JellyfinConn {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Direct image URL with the API key embedded. Preview use only;
    /// this must never be stored.
    pub fn direct_image_url(&self, item_id: &str) -> String {
        format!(
            "{}?api_key={}",
            self.url(&format!("/Items/{}/Images/Primary", item_id)),
            self.api_key
        )
    }
}

/// Library item kinds we search for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Movie,
    Series,
    Album,
    Book,
}

impl LibraryKind {
    fn include_item_types(&self) -> &'static str {
        match self {
            LibraryKind::Movie => "Movie",
            LibraryKind::Series => "Series",
            LibraryKind::Album => "MusicAlbum",
            LibraryKind::Book => "Book",
        }
    }
}

impl std::str::FromStr for LibraryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(LibraryKind::Movie),
            "series" => Ok(LibraryKind::Series),
            "album" => Ok(LibraryKind::Album),
            "book" => Ok(LibraryKind::Book),
            _ => Err(format!(
                "Invalid library kind: {} (expected movie, series, album or book)",
                s
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsPage {
    #[serde(default)]
    items: Vec<JellyfinItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinItem {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub overview: Option<String>,
    pub production_year: Option<i32>,
    #[serde(default)]
    pub artists: Vec<String>,
    pub album_artist: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub run_time_ticks: Option<i64>,
    pub community_rating: Option<f64>,
    pub index_number: Option<i32>,
}

/// Ticks to whole seconds, rounded
pub fn ticks_to_seconds(ticks: i64) -> i64 {
    (ticks as f64 / TICKS_PER_SECOND as f64).round() as i64
}

/// Pure mapping from one Jellyfin item to a draft. The cover is always a
/// proxied reference keyed by the upstream item id.
pub fn draft_from_item(item: JellyfinItem) -> ItemDraft {
    let creators: Vec<Creator> = if !item.artists.is_empty() {
        item.artists
            .into_iter()
            .map(|name| Creator::new(name, "Artist"))
            .collect()
    } else {
        item.album_artist
            .into_iter()
            .map(|name| Creator::new(name, "Artist"))
            .collect()
    };

    let mut metadata = serde_json::Map::new();
    if let Some(kind) = &item.item_type {
        metadata.insert("jellyfin_type".to_string(), kind.clone().into());
    }
    if let Some(ticks) = item.run_time_ticks {
        metadata.insert("duration".to_string(), ticks_to_seconds(ticks).into());
    }

    ItemDraft {
        title: item.name,
        description: item.overview,
        publish_date: item.production_year.map(|y| y.to_string()),
        creators: Some(creators),
        tags: Some(item.genres),
        rating: item
            .community_rating
            .map(|r| ((r / 2.0).round() as i16).clamp(0, 5)),
        cover: Some(CoverRef::ProxiedById(item.id.clone())),
        external_id: Some(item.id),
        metadata,
        ..Default::default()
    }
    .normalized()
}

#[derive(Clone)]
pub struct Jellyfin {
    http: reqwest::Client,
}

impl Jellyfin {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch_items(
        &self,
        conn: &JellyfinConn,
        query: &[(&str, &str)],
    ) -> AppResult<Vec<JellyfinItem>> {
        let response = self
            .http
            .get(conn.url("/Items"))
            .header(AUTH_HEADER, &conn.api_key)
            .query(query)
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::Jellyfin, e))?;

        let page: ItemsPage = read_json(MetadataSource::Jellyfin, response).await?;
        Ok(page.items)
    }

    /// Search the server's library for one item kind
    pub async fn search(
        &self,
        conn: &JellyfinConn,
        kind: LibraryKind,
        term: &str,
    ) -> AppResult<Vec<ItemDraft>> {
        let limit = MAX_SEARCH_RESULTS.to_string();
        let items = self
            .fetch_items(
                conn,
                &[
                    ("searchTerm", term),
                    ("IncludeItemTypes", kind.include_item_types()),
                    ("Recursive", "true"),
                    ("Fields", "Overview,Genres,ProductionYear"),
                    ("Limit", limit.as_str()),
                ],
            )
            .await?;

        Ok(items
            .into_iter()
            .map(draft_from_item)
            .filter(ItemDraft::is_usable)
            .collect())
    }

    /// Fetch one item by id. Albums get one extra request for their track
    /// listing, and the summed track seconds land in the draft metadata.
    pub async fn get_item(&self, conn: &JellyfinConn, id: &str) -> AppResult<ItemDraft> {
        let items = self
            .fetch_items(
                conn,
                &[("Ids", id), ("Fields", "Overview,Genres,ProductionYear")],
            )
            .await?;

        let item = items.into_iter().next().ok_or_else(|| {
            AppError::NotFound(format!("Jellyfin item {} not found", id))
        })?;
        let is_album = item.item_type.as_deref() == Some("MusicAlbum");
        let mut draft = draft_from_item(item);

        if is_album {
            let tracks = self
                .fetch_items(
                    conn,
                    &[
                        ("ParentId", id),
                        ("IncludeItemTypes", "Audio"),
                        ("SortBy", "ParentIndexNumber,IndexNumber"),
                    ],
                )
                .await?;
            attach_tracks(&mut draft, &tracks);
        }

        Ok(draft)
    }

    /// Fetch the primary image for relaying to the browser. The key goes
    /// in the request header; the relayed response never carries it.
    pub async fn fetch_image(
        &self,
        conn: &JellyfinConn,
        id: &str,
    ) -> AppResult<reqwest::Response> {
        let response = self
            .http
            .get(conn.url(&format!("/Items/{}/Images/Primary", id)))
            .header(AUTH_HEADER, &conn.api_key)
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::Jellyfin, e))?;

        if let Some(err) = super::classify_status(MetadataSource::Jellyfin, response.status()) {
            return Err(err);
        }
        Ok(response)
    }
}

/// Fold child tracks into the album draft: a track list plus the summed
/// per-track seconds as `total_duration`
pub fn attach_tracks(draft: &mut ItemDraft, tracks: &[JellyfinItem]) {
    let mut listing = Vec::with_capacity(tracks.len());
    let mut total_seconds: i64 = 0;

    for track in tracks {
        let seconds = track.run_time_ticks.map(ticks_to_seconds).unwrap_or(0);
        total_seconds += seconds;
        listing.push(serde_json::json!({
            "position": track.index_number,
            "title": track.name,
            "duration": seconds,
        }));
    }

    draft
        .metadata
        .insert("tracks".to_string(), serde_json::Value::Array(listing));
    draft
        .metadata
        .insert("total_duration".to_string(), total_seconds.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn album_fixture() -> JellyfinItem {
        serde_json::from_value(json!({
            "Id": "f27caa37e5142225cceded48f6553502",
            "Name": "Abbey Road",
            "Type": "MusicAlbum",
            "ProductionYear": 1969,
            "Artists": ["The Beatles"],
            "Genres": ["Rock"],
            "CommunityRating": 9.2
        }))
        .unwrap()
    }

    #[test]
    fn ticks_convert_to_rounded_seconds() {
        assert_eq!(ticks_to_seconds(30_000_000), 3);
        assert_eq!(ticks_to_seconds(2_450_000_000), 245);
        // 3.25 seconds rounds down, 3.5 rounds up
        assert_eq!(ticks_to_seconds(32_500_000), 3);
        assert_eq!(ticks_to_seconds(35_000_000), 4);
    }

    #[test]
    fn draft_cover_is_always_a_proxied_reference() {
        let draft = draft_from_item(album_fixture());
        assert_eq!(
            draft.cover,
            Some(CoverRef::ProxiedById(
                "f27caa37e5142225cceded48f6553502".to_string()
            ))
        );
        // The raw API key must appear nowhere in the draft
        assert_eq!(draft.title.as_deref(), Some("Abbey Road"));
        assert_eq!(
            draft.creators.as_deref(),
            Some(&[Creator::new("The Beatles", "Artist")][..])
        );
    }

    #[test]
    fn attach_tracks_sums_per_track_seconds() {
        let mut draft = draft_from_item(album_fixture());
        let tracks: Vec<JellyfinItem> = vec![
            serde_json::from_value(json!({
                "Id": "t1", "Name": "Come Together", "IndexNumber": 1,
                "RunTimeTicks": 2_599_000_000i64
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "Id": "t2", "Name": "Something", "IndexNumber": 2,
                "RunTimeTicks": 30_000_000i64
            }))
            .unwrap(),
        ];

        attach_tracks(&mut draft, &tracks);

        assert_eq!(draft.metadata["total_duration"], json!(263)); // 260 + 3
        let listing = draft.metadata["tracks"].as_array().unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0]["title"], json!("Come Together"));
        assert_eq!(listing[1]["duration"], json!(3));
    }

    #[test]
    fn direct_image_url_embeds_the_key_for_previews_only() {
        let conn = JellyfinConn {
            base_url: "https://media.example.net/".to_string(),
            api_key: "sekrit".to_string(),
        };
        assert_eq!(
            conn.direct_image_url("abc123"),
            "https://media.example.net/Items/abc123/Images/Primary?api_key=sekrit"
        );
    }
}
