use super::{placeholder_channel_title, CatalogStore};
use crate::config::PostgresConfig;
use crate::error::{RecError, RecResult};
use crate::models::{CatalogItem, Channel, EventType, InteractionEvent, InteractionMetadata};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

/// Postgres-backed catalog and interaction log.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct ChannelRow {
    channel_id: String,
    title: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct VideoRow {
    video_id: String,
    channel_id: String,
    title: String,
    description: String,
    tags: Json<Vec<String>>,
    duration_seconds: Option<i32>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct InteractionRow {
    id: Uuid,
    user_id: String,
    video_id: String,
    event_type: String,
    watch_seconds: Option<i32>,
    event_time: DateTime<Utc>,
    metadata: Option<Json<InteractionMetadata>>,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        Channel {
            channel_id: row.channel_id,
            title: row.title,
            created_at: row.created_at,
        }
    }
}

impl From<VideoRow> for CatalogItem {
    fn from(row: VideoRow) -> Self {
        CatalogItem {
            id: row.video_id,
            channel_id: row.channel_id,
            title: row.title,
            description: row.description,
            tags: row.tags.0,
            duration_seconds: row.duration_seconds.and_then(|d| u32::try_from(d).ok()),
            published_at: row.published_at,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<InteractionRow> for InteractionEvent {
    type Error = crate::error::RecError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let event_type: EventType = row
            .event_type
            .parse()
            .map_err(crate::error::RecError::Internal)?;

        Ok(InteractionEvent {
            id: row.id,
            user_id: row.user_id,
            video_id: row.video_id,
            event_type,
            watch_seconds: row.watch_seconds.and_then(|s| u32::try_from(s).ok()),
            timestamp: row.event_time,
            metadata: row.metadata.map(|m| m.0),
        })
    }
}

const VIDEO_COLUMNS: &str = "video_id, channel_id, title, description, tags, duration_seconds, published_at, created_at";

impl PgStore {
    pub async fn connect(config: &PostgresConfig) -> RecResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema when missing. Safe to run on every start.
    pub async fn migrate(&self) -> RecResult<()> {
        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS channels (
                channel_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS videos (
                video_id TEXT PRIMARY KEY,
                channel_id TEXT NOT NULL REFERENCES channels(channel_id),
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                tags JSONB NOT NULL DEFAULT '[]'::jsonb,
                duration_seconds INTEGER,
                published_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS interactions (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                video_id TEXT NOT NULL REFERENCES videos(video_id),
                event_type TEXT NOT NULL,
                watch_seconds INTEGER,
                event_time TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                metadata JSONB
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_interactions_user_time ON interactions (user_id, event_time DESC);",
        )
        .execute(&self.pool)
        .await?;

        info!("Postgres schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_catalog(&self) -> RecResult<Vec<CatalogItem>> {
        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            "SELECT {} FROM videos ORDER BY created_at DESC, video_id ASC",
            VIDEO_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn list_videos(&self, limit: usize) -> RecResult<Vec<CatalogItem>> {
        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            "SELECT {} FROM videos ORDER BY created_at DESC, video_id ASC LIMIT $1",
            VIDEO_COLUMNS
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn list_interactions(&self, user_id: &str) -> RecResult<Vec<InteractionEvent>> {
        let rows: Vec<InteractionRow> = sqlx::query_as(
            "\
            SELECT id, user_id, video_id, event_type, watch_seconds, event_time, metadata
            FROM interactions
            WHERE user_id = $1
            ORDER BY event_time DESC;
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InteractionEvent::try_from).collect()
    }

    async fn video_exists(&self, video_id: &str) -> RecResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM videos WHERE video_id = $1)")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn upsert_channel(&self, channel: Channel) -> RecResult<Channel> {
        let row: ChannelRow = sqlx::query_as(
            "\
            INSERT INTO channels (channel_id, title, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (channel_id)
            DO UPDATE SET title = EXCLUDED.title
            RETURNING channel_id, title, created_at;
            ",
        )
        .bind(&channel.channel_id)
        .bind(&channel.title)
        .bind(channel.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn upsert_video(&self, item: CatalogItem) -> RecResult<CatalogItem> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "\
            INSERT INTO channels (channel_id, title)
            VALUES ($1, $2)
            ON CONFLICT (channel_id) DO NOTHING;
            ",
        )
        .bind(&item.channel_id)
        .bind(placeholder_channel_title(&item.channel_id))
        .execute(&mut *tx)
        .await?;

        let row: VideoRow = sqlx::query_as(&format!(
            "\
            INSERT INTO videos ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (video_id)
            DO UPDATE SET
                channel_id = EXCLUDED.channel_id,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                tags = EXCLUDED.tags,
                duration_seconds = EXCLUDED.duration_seconds,
                published_at = EXCLUDED.published_at
            RETURNING {columns};
            ",
            columns = VIDEO_COLUMNS
        ))
        .bind(&item.id)
        .bind(&item.channel_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(Json(&item.tags))
        .bind(seconds_column("duration_seconds", item.duration_seconds)?)
        .bind(item.published_at)
        .bind(item.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn insert_interactions(&self, events: &[InteractionEvent]) -> RecResult<usize> {
        let mut tx = self.pool.begin().await?;

        for event in events {
            sqlx::query(
                "\
                INSERT INTO interactions (id, user_id, video_id, event_type, watch_seconds, event_time, metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7);
                ",
            )
            .bind(event.id)
            .bind(&event.user_id)
            .bind(&event.video_id)
            .bind(event.event_type.as_str())
            .bind(seconds_column("watch_seconds", event.watch_seconds)?)
            .bind(event.timestamp)
            .bind(event.metadata.as_ref().map(Json))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(events.len())
    }
}

/// Second counts are stored as INTEGER; anything past `i32::MAX` is refused
/// instead of wrapping.
fn seconds_column(field: &str, seconds: Option<u32>) -> RecResult<Option<i32>> {
    seconds
        .map(|value| {
            i32::try_from(value).map_err(|_| {
                RecError::InvalidInput(format!("{} too large (max {})", field, i32::MAX))
            })
        })
        .transpose()
}
