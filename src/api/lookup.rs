//! Metadata lookup endpoints.
//!
//! Single-result lookups answer `{ source, data }`, searches answer
//! `{ results }`. Drafts cross the wire as [`DraftBody`], which is where a
//! cover reference becomes a URL: direct for ephemeral search previews,
//! relayed through this server's own image route for anything that may be
//! persisted, so an upstream API key can never end up stored in a record.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{
        draft::{CoverRef, ItemDraft, MetadataQuery, MetadataSource, SourceHint},
        item::{Creator, MediaType},
    },
    services::lookup::jellyfin::JellyfinConn,
    AppState,
};

use super::AuthenticatedUser;

/// Whether a draft is about to leave as an ephemeral preview or as a
/// persistable record; decides how a proxied cover reference serializes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverContext {
    Preview,
    Persist,
}

/// Wire form of an [`ItemDraft`]
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct DraftBody {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub creators: Option<Vec<Creator>>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
    /// Directly fetchable cover URL (previews, public sources)
    pub cover_url: Option<String>,
    /// Cover URL relayed through this server, safe to persist
    pub cover_url_proxy: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub tags: Option<Vec<String>>,
    pub rating: Option<i16>,
    pub external_id: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl DraftBody {
    /// Resolve the cover reference at this serialization boundary
    pub fn from_draft(
        draft: ItemDraft,
        context: CoverContext,
        jellyfin: Option<&JellyfinConn>,
    ) -> Self {
        let (cover_url, cover_url_proxy) = match draft.cover {
            Some(CoverRef::Direct(url)) => (Some(url), None),
            Some(CoverRef::ProxiedById(id)) => match context {
                CoverContext::Preview => {
                    (jellyfin.map(|conn| conn.direct_image_url(&id)), None)
                }
                CoverContext::Persist => (
                    None,
                    Some(format!("/api/v1/lookup/jellyfin/image/{}", id)),
                ),
            },
            None => (None, None),
        };

        Self {
            title: draft.title,
            subtitle: draft.subtitle,
            creators: draft.creators,
            publisher: draft.publisher,
            publish_date: draft.publish_date,
            description: draft.description,
            cover_url,
            cover_url_proxy,
            page_count: draft.page_count,
            language: draft.language,
            tags: draft.tags,
            rating: draft.rating,
            external_id: draft.external_id,
            metadata: if draft.metadata.is_empty() {
                None
            } else {
                Some(draft.metadata)
            },
        }
    }
}

/// Single-result lookup response, tagged with the winning source
#[derive(Serialize, ToSchema)]
pub struct LookupResponse {
    pub source: String,
    pub data: DraftBody,
}

/// Search response
#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<DraftBody>,
}

// =============================================================================
// Books
// =============================================================================

/// Resolve an ISBN through Open Library, then Google Books
#[utoipa::path(
    get,
    path = "/lookup/isbn/{isbn}",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "ISBN-10 or ISBN-13, hyphens allowed")
    ),
    responses(
        (status = 200, description = "First usable match", body = LookupResponse),
        (status = 404, description = "No source has this ISBN; enter details manually")
    )
)]
pub async fn resolve_isbn(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<LookupResponse>> {
    let query = MetadataQuery::new(
        SourceHint::Isbn,
        MetadataSource::OpenLibrary,
        isbn.clone(),
        MediaType::Book,
    );
    let resolved = state
        .services
        .lookup
        .resolve_by_isbn(&query)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No match found for ISBN {}. You can enter the details manually.",
                isbn
            ))
        })?;

    Ok(Json(LookupResponse {
        source: resolved.source.to_string(),
        data: DraftBody::from_draft(resolved.draft, CoverContext::Persist, None),
    }))
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BookSearchParams {
    /// Free-text query
    pub q: String,
}

/// Free-text book search (Google Books)
#[utoipa::path(
    get,
    path = "/lookup/books",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(BookSearchParams),
    responses(
        (status = 200, description = "Up to 10 candidates, empty on no match", body = SearchResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(params): Query<BookSearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let query = MetadataQuery::new(
        SourceHint::Title,
        MetadataSource::GoogleBooks,
        params.q,
        MediaType::Book,
    );
    let drafts = state.services.lookup.search_books(&query).await?;
    Ok(Json(SearchResponse {
        results: drafts
            .into_iter()
            .map(|draft| DraftBody::from_draft(draft, CoverContext::Preview, None))
            .collect(),
    }))
}

// =============================================================================
// TMDB
// =============================================================================

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TmdbSearchParams {
    pub query: String,
    /// movie | tv
    pub kind: String,
}

/// Search TMDB for movies or TV shows
#[utoipa::path(
    get,
    path = "/lookup/tmdb",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(TmdbSearchParams),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 503, description = "TMDB not configured")
    )
)]
pub async fn search_tmdb(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(params): Query<TmdbSearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let kind = params.kind.parse().map_err(AppError::Validation)?;
    let drafts = state
        .services
        .lookup
        .search_tmdb(claims.user_id, kind, &params.query)
        .await?;
    Ok(Json(SearchResponse {
        results: drafts
            .into_iter()
            .map(|draft| DraftBody::from_draft(draft, CoverContext::Preview, None))
            .collect(),
    }))
}

/// Fetch one TMDB record with full credits
#[utoipa::path(
    get,
    path = "/lookup/tmdb/{kind}/{id}",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(
        ("kind" = String, Path, description = "movie | tv"),
        ("id" = i64, Path, description = "TMDB id")
    ),
    responses(
        (status = 200, description = "Resolved record", body = LookupResponse),
        (status = 404, description = "No such record"),
        (status = 503, description = "TMDB not configured")
    )
)]
pub async fn resolve_tmdb(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((kind, id)): Path<(String, i64)>,
) -> AppResult<Json<LookupResponse>> {
    let kind = kind.parse().map_err(AppError::Validation)?;
    let draft = state
        .services
        .lookup
        .resolve_tmdb(claims.user_id, kind, id)
        .await?;
    Ok(Json(LookupResponse {
        source: MetadataSource::Tmdb.to_string(),
        data: DraftBody::from_draft(draft, CoverContext::Persist, None),
    }))
}

// =============================================================================
// Jellyfin
// =============================================================================

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct JellyfinSearchParams {
    pub query: String,
    /// movie | series | album | book
    pub kind: String,
}

/// Search the configured Jellyfin server.
///
/// Previews carry direct image URLs; they are ephemeral and never stored.
#[utoipa::path(
    get,
    path = "/lookup/jellyfin",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(JellyfinSearchParams),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 503, description = "Jellyfin not configured")
    )
)]
pub async fn search_jellyfin(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(params): Query<JellyfinSearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let kind = params.kind.parse().map_err(AppError::Validation)?;
    let (conn, drafts) = state
        .services
        .lookup
        .search_jellyfin(claims.user_id, kind, &params.query)
        .await?;
    Ok(Json(SearchResponse {
        results: drafts
            .into_iter()
            .map(|draft| DraftBody::from_draft(draft, CoverContext::Preview, Some(&conn)))
            .collect(),
    }))
}

/// Resync one Jellyfin item by id.
///
/// The result is meant to be persisted, so the cover is the relayed URL,
/// never the direct one with the embedded API key.
#[utoipa::path(
    get,
    path = "/lookup/jellyfin/{id}",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Jellyfin item id")
    ),
    responses(
        (status = 200, description = "Resolved record", body = LookupResponse),
        (status = 404, description = "No such item"),
        (status = 503, description = "Jellyfin not configured")
    )
)]
pub async fn resolve_jellyfin(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<LookupResponse>> {
    let draft = state
        .services
        .lookup
        .resolve_jellyfin(claims.user_id, &id)
        .await?;
    Ok(Json(LookupResponse {
        source: MetadataSource::Jellyfin.to_string(),
        data: DraftBody::from_draft(draft, CoverContext::Persist, None),
    }))
}

/// Relay a Jellyfin cover image.
///
/// Unauthenticated by design: browsers cannot attach bearer tokens to
/// `<img>` loads. The route is keyed by item id only; the upstream API
/// key stays server-side.
#[utoipa::path(
    get,
    path = "/lookup/jellyfin/image/{id}",
    tag = "lookup",
    params(
        ("id" = String, Path, description = "Jellyfin item id")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "No image for this item"),
        (status = 503, description = "Jellyfin not configured")
    )
)]
pub async fn jellyfin_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let upstream = state.services.lookup.fetch_jellyfin_image(&id).await?;

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(format!("Failed to build image response: {}", e)))
}

// =============================================================================
// Comic Vine
// =============================================================================

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ComicSearchParams {
    pub query: String,
}

/// Search Comic Vine issues and volumes
#[utoipa::path(
    get,
    path = "/lookup/comicvine",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(ComicSearchParams),
    responses(
        (status = 200, description = "Search results; each records its resource kind", body = SearchResponse),
        (status = 400, description = "Comic Vine API key missing")
    )
)]
pub async fn search_comicvine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(params): Query<ComicSearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let drafts = state
        .services
        .lookup
        .search_comicvine(claims.user_id, &params.query)
        .await?;
    Ok(Json(SearchResponse {
        results: drafts
            .into_iter()
            .map(|draft| DraftBody::from_draft(draft, CoverContext::Preview, None))
            .collect(),
    }))
}

/// Fetch one Comic Vine issue or volume
#[utoipa::path(
    get,
    path = "/lookup/comicvine/{kind}/{id}",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(
        ("kind" = String, Path, description = "issue | volume"),
        ("id" = i64, Path, description = "Bare numeric id, without the namespace prefix")
    ),
    responses(
        (status = 200, description = "Resolved record", body = LookupResponse),
        (status = 400, description = "Comic Vine API key missing"),
        (status = 404, description = "No such record")
    )
)]
pub async fn resolve_comicvine(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((kind, id)): Path<(String, i64)>,
) -> AppResult<Json<LookupResponse>> {
    let kind = kind.parse().map_err(AppError::Validation)?;
    let draft = state
        .services
        .lookup
        .resolve_comicvine(claims.user_id, kind, id)
        .await?;
    Ok(Json(LookupResponse {
        source: MetadataSource::ComicVine.to_string(),
        data: DraftBody::from_draft(draft, CoverContext::Persist, None),
    }))
}

// =============================================================================
// MusicBrainz
// =============================================================================

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MusicSearchParams {
    /// Free-text release query
    pub query: Option<String>,
    /// Exact barcode from a scanned CD or vinyl sleeve
    pub barcode: Option<String>,
}

/// Search MusicBrainz releases by title or barcode
#[utoipa::path(
    get,
    path = "/lookup/musicbrainz",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(MusicSearchParams),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Neither query nor barcode supplied")
    )
)]
pub async fn search_musicbrainz(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(params): Query<MusicSearchParams>,
) -> AppResult<Json<SearchResponse>> {
    let query = match (params.query, params.barcode) {
        (_, Some(barcode)) => MetadataQuery::new(
            SourceHint::Barcode,
            MetadataSource::MusicBrainz,
            barcode,
            MediaType::Cd,
        ),
        (Some(text), None) => MetadataQuery::new(
            SourceHint::Title,
            MetadataSource::MusicBrainz,
            text,
            MediaType::Cd,
        ),
        (None, None) => {
            return Err(AppError::Validation(
                "Provide either 'query' or 'barcode'".to_string(),
            ))
        }
    };

    let drafts = state.services.lookup.search_musicbrainz(&query).await?;
    Ok(Json(SearchResponse {
        results: drafts
            .into_iter()
            .map(|draft| DraftBody::from_draft(draft, CoverContext::Preview, None))
            .collect(),
    }))
}

/// Fetch one MusicBrainz release with its track listing
#[utoipa::path(
    get,
    path = "/lookup/musicbrainz/{id}",
    tag = "lookup",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Release MBID")
    ),
    responses(
        (status = 200, description = "Resolved release", body = LookupResponse),
        (status = 404, description = "No such release")
    )
)]
pub async fn resolve_musicbrainz(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<LookupResponse>> {
    let draft = state.services.lookup.resolve_musicbrainz(&id).await?;
    Ok(Json(LookupResponse {
        source: MetadataSource::MusicBrainz.to_string(),
        data: DraftBody::from_draft(draft, CoverContext::Persist, None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jellyfin_draft() -> ItemDraft {
        ItemDraft {
            title: Some("Abbey Road".to_string()),
            cover: Some(CoverRef::ProxiedById("abc123".to_string())),
            ..Default::default()
        }
    }

    fn conn() -> JellyfinConn {
        JellyfinConn {
            base_url: "https://media.example.net".to_string(),
            api_key: "sekrit".to_string(),
        }
    }

    #[test]
    fn persisted_jellyfin_cover_is_the_proxy_route_never_the_key() {
        let body = DraftBody::from_draft(jellyfin_draft(), CoverContext::Persist, Some(&conn()));
        assert_eq!(body.cover_url, None);
        assert_eq!(
            body.cover_url_proxy.as_deref(),
            Some("/api/v1/lookup/jellyfin/image/abc123")
        );
        let encoded = serde_json::to_string(&body).unwrap();
        assert!(!encoded.contains("sekrit"));
    }

    #[test]
    fn preview_jellyfin_cover_is_the_direct_url() {
        let body = DraftBody::from_draft(jellyfin_draft(), CoverContext::Preview, Some(&conn()));
        assert_eq!(
            body.cover_url.as_deref(),
            Some("https://media.example.net/Items/abc123/Images/Primary?api_key=sekrit")
        );
        assert_eq!(body.cover_url_proxy, None);
    }

    #[test]
    fn direct_covers_pass_through_in_both_contexts() {
        let draft = ItemDraft {
            title: Some("Dune".to_string()),
            cover: Some(CoverRef::Direct("https://covers.example/x.jpg".to_string())),
            ..Default::default()
        };
        for context in [CoverContext::Preview, CoverContext::Persist] {
            let body = DraftBody::from_draft(draft.clone(), context, None);
            assert_eq!(body.cover_url.as_deref(), Some("https://covers.example/x.jpg"));
            assert_eq!(body.cover_url_proxy, None);
        }
    }

    #[test]
    fn absent_fields_are_omitted_from_the_wire_form() {
        let body = DraftBody::from_draft(
            ItemDraft {
                title: Some("Bare".to_string()),
                ..Default::default()
            },
            CoverContext::Preview,
            None,
        );
        let encoded = serde_json::to_value(&body).unwrap();
        let object = encoded.as_object().unwrap();
        assert_eq!(object.get("title"), Some(&serde_json::json!("Bare")));
        // skip_serializing_none drops unknowns instead of writing nulls
        assert!(!object.contains_key("publisher"));
        assert!(!object.contains_key("metadata"));
    }
}
