use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;

use super::model::Manga;
use crate::error::StoreError;

/// Local persistence of manga records keyed by URL.
///
/// Implementations are shared by every background task and must tolerate
/// concurrent reads and writes.
#[async_trait]
pub trait MangaStore: Send + Sync {
    async fn get_by_url(&self, url: &str) -> Result<Option<Manga>, StoreError>;

    /// Inserts the record, or updates the row that already has its URL.
    async fn upsert(&self, manga: &Manga) -> Result<(), StoreError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS manga (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    source        INTEGER NOT NULL,
    url           TEXT NOT NULL UNIQUE,
    title         TEXT NOT NULL,
    thumbnail_url TEXT,
    author        TEXT,
    artist        TEXT,
    description   TEXT,
    genre         TEXT,
    status        TEXT,
    initialized   INTEGER NOT NULL DEFAULT 0
)
"#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Private database that lives as long as the store. A single
    /// connection, since each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn manga_from_row(row: &SqliteRow) -> Result<Manga, sqlx::Error> {
    Ok(Manga {
        id: Some(row.try_get("id")?),
        source: row.try_get("source")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        author: row.try_get("author")?,
        artist: row.try_get("artist")?,
        description: row.try_get("description")?,
        genre: row.try_get("genre")?,
        status: row.try_get("status")?,
        initialized: row.try_get("initialized")?,
    })
}

#[async_trait]
impl MangaStore for SqliteStore {
    async fn get_by_url(&self, url: &str) -> Result<Option<Manga>, StoreError> {
        let row = sqlx::query("SELECT * FROM manga WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(manga_from_row).transpose()?)
    }

    async fn upsert(&self, manga: &Manga) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO manga
                (source, url, title, thumbnail_url, author, artist, description, genre, status, initialized)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                thumbnail_url = excluded.thumbnail_url,
                author = excluded.author,
                artist = excluded.artist,
                description = excluded.description,
                genre = excluded.genre,
                status = excluded.status,
                initialized = excluded.initialized
            "#,
        )
        .bind(manga.source)
        .bind(&manga.url)
        .bind(&manga.title)
        .bind(&manga.thumbnail_url)
        .bind(&manga.author)
        .bind(&manga.artist)
        .bind(&manga.description)
        .bind(&manga.genre)
        .bind(&manga.status)
        .bind(manga.initialized)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
