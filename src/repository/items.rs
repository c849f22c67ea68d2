//! Items repository for database operations.
//!
//! Creators, tags and metadata live in JSONB columns; filters on them go
//! through jsonb operators so the database stays the single source of truth
//! for list queries.

use sqlx::{FromRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::item::{Creator, Item, ItemInput, ItemQuery, ItemRow, ItemShort},
};

/// Map a user-supplied sort key to a real column. Unknown keys fall back
/// to title so the query string can never inject an expression.
fn sort_column(key: Option<&str>) -> &'static str {
    match key {
        Some("created_at") => "i.created_at",
        Some("publish_date") => "i.publish_date",
        Some("rating") => "i.rating",
        _ => "i.title",
    }
}

#[derive(Debug, FromRow)]
struct ItemShortRow {
    id: i32,
    media_type: String,
    title: String,
    subtitle: Option<String>,
    cover_url: Option<String>,
    publish_date: Option<String>,
    rating: Option<i16>,
    creators: Option<serde_json::Value>,
    reading_status: Option<String>,
    on_loan: bool,
}

impl From<ItemShortRow> for ItemShort {
    fn from(row: ItemShortRow) -> Self {
        let creators: Vec<Creator> = row
            .creators
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        ItemShort {
            id: row.id,
            media_type: row.media_type,
            title: row.title,
            subtitle: row.subtitle,
            cover_url: row.cover_url,
            publish_date: row.publish_date,
            rating: row.rating,
            creators,
            reading_status: row.reading_status,
            on_loan: row.on_loan,
        }
    }
}

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search items with filters and pagination. The caller's user id is
    /// used to join their reading status onto each row.
    pub async fn search(
        &self,
        query: &ItemQuery,
        user_id: i32,
    ) -> AppResult<(Vec<ItemShort>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        // $1 is always the caller's user id; filter binds start at $2
        let mut conditions: Vec<String> = vec!["1=1".to_string()];
        let mut binds: Vec<String> = Vec::new();

        if let Some(media_type) = query.media_type {
            conditions.push(format!("i.media_type = ${}", binds.len() + 2));
            binds.push(media_type.as_str().to_string());
        }

        if let Some(ref status) = query.reading_status {
            conditions.push(format!("rs.status = ${}", binds.len() + 2));
            binds.push(status.clone());
        }

        if let Some(ref tag) = query.tag {
            conditions.push(format!("i.tags @> ${}::jsonb", binds.len() + 2));
            binds.push(serde_json::json!([tag]).to_string());
        }

        if let Some(ref search) = query.search {
            let pattern = format!("%{}%", search.to_lowercase());
            let n = binds.len() + 2;
            conditions.push(format!(
                "(LOWER(i.title) LIKE ${n} OR LOWER(COALESCE(i.subtitle, '')) LIKE ${n2} \
                 OR EXISTS (SELECT 1 FROM jsonb_array_elements(COALESCE(i.creators, '[]'::jsonb)) c \
                            WHERE LOWER(c->>'name') LIKE ${n3}))",
                n = n,
                n2 = n + 1,
                n3 = n + 2
            ));
            binds.push(pattern.clone());
            binds.push(pattern.clone());
            binds.push(pattern);
        }

        let where_clause = conditions.join(" AND ");
        let from_clause =
            "FROM items i LEFT JOIN reading_status rs ON rs.item_id = i.id AND rs.user_id = $1";

        let count_query = format!("SELECT COUNT(*) {} WHERE {}", from_clause, where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query).bind(user_id);
        for bind in &binds {
            count = count.bind(bind);
        }
        let total = count.fetch_one(&self.pool).await?;

        let direction = match query.order.as_deref() {
            Some("desc") => "DESC",
            _ => "ASC",
        };
        let select_query = format!(
            r#"
            SELECT i.id, i.media_type, i.title, i.subtitle, i.cover_url,
                   i.publish_date, i.rating, i.creators,
                   rs.status AS reading_status,
                   EXISTS (SELECT 1 FROM loans l
                           WHERE l.item_id = i.id AND l.returned_at IS NULL) AS on_loan
            {} WHERE {}
            ORDER BY {} {} NULLS LAST, i.id
            LIMIT {} OFFSET {}
            "#,
            from_clause,
            where_clause,
            sort_column(query.sort.as_deref()),
            direction,
            per_page,
            offset
        );

        let mut select = sqlx::query_as::<_, ItemShortRow>(&select_query).bind(user_id);
        for bind in &binds {
            select = select.bind(bind);
        }
        let items = select
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ItemShort::from)
            .collect();

        Ok((items, total))
    }

    /// Get item by ID with full details
    pub async fn get_by_id(&self, id: i32) -> AppResult<Item> {
        let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))?;
        Ok(row.into())
    }

    /// Check whether another item already carries this ISBN
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM items WHERE isbn = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a new item and return it fully loaded
    pub async fn create(&self, input: &ItemInput) -> AppResult<Item> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO items (
                media_type, title, subtitle, isbn, barcode, publisher,
                publish_date, description, cover_url, page_count, language,
                rating, external_id, external_source, creators, tags,
                metadata, location, notes, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, NOW(), NOW()
            )
            RETURNING id
            "#,
        )
        .bind(input.media_type.as_str())
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.isbn)
        .bind(&input.barcode)
        .bind(&input.publisher)
        .bind(&input.publish_date)
        .bind(&input.description)
        .bind(&input.cover_url)
        .bind(input.page_count)
        .bind(&input.language)
        .bind(input.rating)
        .bind(&input.external_id)
        .bind(&input.external_source)
        .bind(serde_json::to_value(&input.creators).unwrap_or_default())
        .bind(serde_json::to_value(&input.tags).unwrap_or_default())
        .bind(serde_json::Value::Object(input.metadata.clone()))
        .bind(&input.location)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Replace an item's fields
    pub async fn update(&self, id: i32, input: &ItemInput) -> AppResult<Item> {
        let rows = sqlx::query(
            r#"
            UPDATE items SET
                media_type = $2, title = $3, subtitle = $4, isbn = $5,
                barcode = $6, publisher = $7, publish_date = $8,
                description = $9, cover_url = $10, page_count = $11,
                language = $12, rating = $13, external_id = $14,
                external_source = $15, creators = $16, tags = $17,
                metadata = $18, location = $19, notes = $20, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.media_type.as_str())
        .bind(&input.title)
        .bind(&input.subtitle)
        .bind(&input.isbn)
        .bind(&input.barcode)
        .bind(&input.publisher)
        .bind(&input.publish_date)
        .bind(&input.description)
        .bind(&input.cover_url)
        .bind(input.page_count)
        .bind(&input.language)
        .bind(input.rating)
        .bind(&input.external_id)
        .bind(&input.external_source)
        .bind(serde_json::to_value(&input.creators).unwrap_or_default())
        .bind(serde_json::to_value(&input.tags).unwrap_or_default())
        .bind(serde_json::Value::Object(input.metadata.clone()))
        .bind(&input.location)
        .bind(&input.notes)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }
        self.get_by_id(id).await
    }

    /// Point an item at its uploaded cover
    pub async fn set_cover_url(&self, id: i32, cover_url: &str) -> AppResult<()> {
        let rows = sqlx::query("UPDATE items SET cover_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(cover_url)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }
        Ok(())
    }

    /// Delete an item. Reading statuses and loans go with it (FK cascade).
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let rows = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", id)));
        }
        Ok(())
    }

    /// Distinct tags across the catalog, for filter dropdowns
    pub async fn list_tags(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT jsonb_array_elements_text(tags) AS tag FROM items ORDER BY tag",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("tag")).collect())
    }
}
