//! TMDB movie and TV lookup.
//!
//! Requires an API key (per-user setting with a deployment fallback).
//! TMDB rates on a 0–10 scale; the catalog uses 0–5 stars, so votes are
//! halved and rounded half-up. 10 second budget.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    error::AppResult,
    models::draft::{CoverRef, ItemDraft, MetadataSource},
    models::item::Creator,
};

use super::{classify_send_error, read_json};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const TIMEOUT: Duration = Duration::from_secs(10);

/// Cap on cast and crew entries carried into a draft, each
const MAX_CAST: usize = 5;
const MAX_CREW: usize = 5;
/// Crew jobs worth crediting on a catalog record
const CREW_JOBS: [&str; 3] = ["Director", "Writer", "Producer"];

/// TMDB splits film and television across separate endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Movie,
    Tv,
}

impl ScreenKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ScreenKind::Movie => "movie",
            ScreenKind::Tv => "tv",
        }
    }
}

impl std::str::FromStr for ScreenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ScreenKind::Movie),
            "tv" => Ok(ScreenKind::Tv),
            _ => Err(format!("Invalid media kind: {} (expected movie or tv)", s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<TmdbEntry>,
}

/// One movie or TV record. Movies carry `title`/`release_date`, shows
/// carry `name`/`first_air_date`; both shapes land here.
#[derive(Debug, Deserialize)]
pub struct TmdbEntry {
    pub id: i64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub credits: Option<TmdbCredits>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCastMember>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbCastMember {
    pub name: String,
    pub character: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbCrewMember {
    pub name: String,
    pub job: Option<String>,
}

/// 0–10 vote average to 0–5 stars, rounded half-up
pub fn rating_from_vote(vote_average: f64) -> i16 {
    ((vote_average / 2.0).round() as i16).clamp(0, 5)
}

/// Up to [`MAX_CAST`] cast members (role = character name), then crew
/// members whose job is Director, Writer or Producer (role = job), capped
/// at [`MAX_CREW`]. Upstream order is preserved, cast first.
pub fn creators_from_credits(credits: &TmdbCredits) -> Vec<Creator> {
    let mut creators: Vec<Creator> = credits
        .cast
        .iter()
        .take(MAX_CAST)
        .map(|member| Creator {
            name: member.name.clone(),
            role: member.character.clone(),
        })
        .collect();

    creators.extend(
        credits
            .crew
            .iter()
            .filter(|member| {
                member
                    .job
                    .as_deref()
                    .is_some_and(|job| CREW_JOBS.contains(&job))
            })
            .take(MAX_CREW)
            .map(|member| Creator {
                name: member.name.clone(),
                role: member.job.clone(),
            }),
    );

    creators
}

/// Pure mapping from one TMDB entry to a draft
pub fn draft_from_entry(kind: ScreenKind, entry: TmdbEntry) -> ItemDraft {
    let title = match kind {
        ScreenKind::Movie => entry.title.or(entry.name),
        ScreenKind::Tv => entry.name.or(entry.title),
    };
    let publish_date = match kind {
        ScreenKind::Movie => entry.release_date.or(entry.first_air_date),
        ScreenKind::Tv => entry.first_air_date.or(entry.release_date),
    };

    let creators = entry
        .credits
        .as_ref()
        .map(creators_from_credits)
        .unwrap_or_default();

    let cover = entry
        .poster_path
        .map(|path| CoverRef::Direct(format!("{}{}", IMAGE_BASE_URL, path)));

    let tags: Vec<String> = entry.genres.into_iter().map(|g| g.name).collect();

    ItemDraft {
        title,
        publish_date,
        description: entry.overview,
        cover,
        language: entry.original_language,
        tags: Some(tags),
        creators: Some(creators),
        rating: entry.vote_average.map(rating_from_vote),
        external_id: Some(entry.id.to_string()),
        ..Default::default()
    }
    .normalized()
}

#[derive(Clone)]
pub struct Tmdb {
    http: reqwest::Client,
}

impl Tmdb {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn search(
        &self,
        api_key: &str,
        kind: ScreenKind,
        query: &str,
    ) -> AppResult<Vec<ItemDraft>> {
        let url = format!("{}/search/{}", BASE_URL, kind.path_segment());
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", api_key),
                ("query", query),
                ("include_adult", "false"),
            ])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::Tmdb, e))?;

        let page: SearchPage = read_json(MetadataSource::Tmdb, response).await?;
        Ok(page
            .results
            .into_iter()
            .map(|entry| draft_from_entry(kind, entry))
            .filter(ItemDraft::is_usable)
            .collect())
    }

    /// Detail with credits appended, for a full creator list
    pub async fn detail(&self, api_key: &str, kind: ScreenKind, id: i64) -> AppResult<ItemDraft> {
        let url = format!("{}/{}/{}", BASE_URL, kind.path_segment(), id);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", api_key), ("append_to_response", "credits")])
            .timeout(TIMEOUT)
            .send()
            .await
            .map_err(|e| classify_send_error(MetadataSource::Tmdb, e))?;

        let entry: TmdbEntry = read_json(MetadataSource::Tmdb, response).await?;
        Ok(draft_from_entry(kind, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vote_average_is_halved_and_rounded_half_up() {
        assert_eq!(rating_from_vote(7.8), 4); // 3.9 rounds to 4
        assert_eq!(rating_from_vote(5.0), 3); // 2.5 rounds half-up to 3
        assert_eq!(rating_from_vote(0.0), 0);
        assert_eq!(rating_from_vote(10.0), 5);
        assert_eq!(rating_from_vote(6.2), 3); // 3.1 rounds to 3
    }

    fn credits_fixture() -> TmdbCredits {
        serde_json::from_value(json!({
            "cast": [
                {"name": "Timothée Chalamet", "character": "Paul Atreides"},
                {"name": "Rebecca Ferguson", "character": "Jessica"},
                {"name": "Oscar Isaac", "character": "Duke Leto Atreides"},
                {"name": "Josh Brolin", "character": "Gurney Halleck"},
                {"name": "Stellan Skarsgård", "character": "Baron Harkonnen"},
                {"name": "Dave Bautista", "character": "Beast Rabban"}
            ],
            "crew": [
                {"name": "Hans Zimmer", "job": "Original Music Composer"},
                {"name": "Denis Villeneuve", "job": "Director"},
                {"name": "Jon Spaihts", "job": "Writer"},
                {"name": "Mary Parent", "job": "Producer"},
                {"name": "Greig Fraser", "job": "Director of Photography"},
                {"name": "Eric Roth", "job": "Writer"},
                {"name": "Cale Boyter", "job": "Producer"},
                {"name": "Denis Villeneuve", "job": "Producer"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn creators_take_five_cast_then_five_matching_crew_in_upstream_order() {
        let creators = creators_from_credits(&credits_fixture());
        assert_eq!(creators.len(), 10);

        // Cast first, upstream order, role = character
        assert_eq!(creators[0].name, "Timothée Chalamet");
        assert_eq!(creators[0].role.as_deref(), Some("Paul Atreides"));
        assert_eq!(creators[4].name, "Stellan Skarsgård");

        // Then crew filtered to Director/Writer/Producer, capped at 5
        assert_eq!(creators[5].name, "Denis Villeneuve");
        assert_eq!(creators[5].role.as_deref(), Some("Director"));
        assert_eq!(creators[6].role.as_deref(), Some("Writer"));
        // The composer and cinematographer never make the list
        assert!(creators.iter().all(|c| c.name != "Hans Zimmer"));
        assert!(creators.iter().all(|c| c.name != "Greig Fraser"));
    }

    #[test]
    fn movie_entry_maps_title_and_poster() {
        let entry: TmdbEntry = serde_json::from_value(json!({
            "id": 438631,
            "title": "Dune",
            "release_date": "2021-09-15",
            "overview": "Paul Atreides, a brilliant and gifted young man...",
            "poster_path": "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
            "vote_average": 7.8,
            "original_language": "en",
            "genres": [{"id": 878, "name": "Science Fiction"}]
        }))
        .unwrap();

        let draft = draft_from_entry(ScreenKind::Movie, entry);
        assert_eq!(draft.title.as_deref(), Some("Dune"));
        assert_eq!(draft.publish_date.as_deref(), Some("2021-09-15"));
        assert_eq!(draft.rating, Some(4));
        assert_eq!(
            draft.cover,
            Some(CoverRef::Direct(
                "https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg".to_string()
            ))
        );
        assert_eq!(draft.external_id.as_deref(), Some("438631"));
    }

    #[test]
    fn tv_entry_prefers_name_and_first_air_date() {
        let entry: TmdbEntry = serde_json::from_value(json!({
            "id": 94997,
            "name": "House of the Dragon",
            "first_air_date": "2022-08-21",
            "vote_average": 8.4
        }))
        .unwrap();

        let draft = draft_from_entry(ScreenKind::Tv, entry);
        assert_eq!(draft.title.as_deref(), Some("House of the Dragon"));
        assert_eq!(draft.publish_date.as_deref(), Some("2022-08-21"));
        assert_eq!(draft.rating, Some(4));
    }
}
