//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, health, items, loans, lookup, reading, settings, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfmark API",
        version = "1.0.0",
        description = "Personal Media Library REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        items::upload_cover,
        items::list_tags,
        // Reading
        reading::get_status,
        reading::upsert_status,
        reading::delete_status,
        reading::list,
        reading::stats,
        // Lookup
        lookup::resolve_isbn,
        lookup::search_books,
        lookup::search_tmdb,
        lookup::resolve_tmdb,
        lookup::search_jellyfin,
        lookup::resolve_jellyfin,
        lookup::jellyfin_image,
        lookup::search_comicvine,
        lookup::resolve_comicvine,
        lookup::search_musicbrainz,
        lookup::resolve_musicbrainz,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::item_loans,
        loans::open_loans,
        // Settings
        settings::get_settings,
        settings::update_settings,
    ),
    components(
        schemas(
            // Items
            crate::models::item::Item,
            crate::models::item::ItemShort,
            crate::models::item::ItemInput,
            crate::models::item::MediaType,
            crate::models::item::Creator,
            items::CoverUploadResponse,
            // Reading
            crate::models::reading::ReadingState,
            crate::models::reading::ReadingStatus,
            crate::models::reading::UpsertReadingStatus,
            crate::models::reading::ReadingStats,
            // Lookup
            crate::models::draft::MetadataSource,
            crate::models::draft::SourceHint,
            lookup::DraftBody,
            lookup::LookupResponse,
            lookup::SearchResponse,
            // Users
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::Role,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::CreateLoan,
            // Settings
            crate::models::settings::ApiSettingsView,
            crate::models::settings::UpdateApiSettings,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "items", description = "Catalog item management"),
        (name = "reading", description = "Reading status tracking"),
        (name = "lookup", description = "External metadata lookup"),
        (name = "users", description = "User management"),
        (name = "loans", description = "Lending"),
        (name = "settings", description = "Metadata source settings")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
