//! Catalog management service

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::item::{Item, ItemInput, ItemQuery, ItemShort},
    repository::Repository,
};

/// Cover uploads are kept small; pixel work is out of scope
const MAX_COVER_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    cover_dir: PathBuf,
}

impl CatalogService {
    pub fn new(repository: Repository, cover_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository,
            cover_dir: cover_dir.into(),
        }
    }

    /// Search items with filters; the caller's reading status rides along
    pub async fn search_items(
        &self,
        query: &ItemQuery,
        user_id: i32,
    ) -> AppResult<(Vec<ItemShort>, i64)> {
        self.repository.items.search(query, user_id).await
    }

    pub async fn get_item(&self, id: i32) -> AppResult<Item> {
        self.repository.items.get_by_id(id).await
    }

    /// Create a new item. A duplicate ISBN is refused so a double scan
    /// does not silently create a second record.
    pub async fn create_item(&self, input: ItemInput) -> AppResult<Item> {
        if let Some(ref isbn) = input.isbn {
            if self.repository.items.isbn_exists(isbn, None).await? {
                return Err(AppError::Conflict(format!(
                    "An item with ISBN {} already exists",
                    isbn
                )));
            }
        }
        self.repository.items.create(&input).await
    }

    pub async fn update_item(&self, id: i32, input: ItemInput) -> AppResult<Item> {
        if let Some(ref isbn) = input.isbn {
            if self.repository.items.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Another item with ISBN {} already exists",
                    isbn
                )));
            }
        }
        self.repository.items.update(id, &input).await
    }

    pub async fn delete_item(&self, id: i32) -> AppResult<()> {
        self.repository.items.delete(id).await
    }

    pub async fn list_tags(&self) -> AppResult<Vec<String>> {
        self.repository.items.list_tags().await
    }

    /// Store an uploaded cover for an item and point the record at the
    /// serving route. The file is written as-is; no resizing here.
    pub async fn save_cover(
        &self,
        item_id: i32,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        // Item must exist before anything touches the disk
        self.repository.items.get_by_id(item_id).await?;

        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded cover is empty".to_string()));
        }
        if bytes.len() > MAX_COVER_BYTES {
            return Err(AppError::Validation(
                "Uploaded cover exceeds the 10 MB limit".to_string(),
            ));
        }

        // Sniff by extension only; no format parsing here
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(AppError::Validation(
                "Cover must be an image file (.jpg, .png, .webp...)".to_string(),
            ));
        }
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "jpg".to_string());

        tokio::fs::create_dir_all(&self.cover_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create cover dir: {}", e)))?;

        // Unique name per upload so replaced covers bust browser caches
        let stored_name = format!("{}-{}.{}", item_id, Uuid::new_v4(), extension);
        let path = self.cover_dir.join(&stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write cover: {}", e)))?;

        let cover_url = format!("/covers/{}", stored_name);
        self.repository.items.set_cover_url(item_id, &cover_url).await?;
        Ok(cover_url)
    }
}
