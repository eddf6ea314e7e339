//! Post Repository Implementation
//!
//! Every `PostView` query binds the viewer (nullable) as `$1` so the
//! liked/saved flags can be computed in the same statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{NewPost, Post, PostRepository, PostUpdate, PostView, UserSummary, Visibility};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

macro_rules! post_view_select {
    () => {
        r#"
        SELECT p.id, p.author_id, p.content, p.media_urls, p.visibility,
               p.likes_count, p.comments_count, p.shares_count, p.created_at, p.updated_at,
               u.username AS author_username, u.display_name AS author_display_name,
               u.avatar_url AS author_avatar_url,
               EXISTS (SELECT 1 FROM post_likes l  WHERE l.post_id = p.id AND l.user_id = $1) AS liked_by_viewer,
               EXISTS (SELECT 1 FROM saved_posts s WHERE s.post_id = p.id AND s.user_id = $1) AS saved_by_viewer,
               p.created_at AS listed_at
        FROM posts p
        JOIN users u ON u.id = p.author_id
        "#
    };
}

/// Excludes authors blocked by, or blocking, the viewer bound as `$1`.
macro_rules! not_blocked_by_viewer {
    () => {
        r#"
        NOT EXISTS (
            SELECT 1 FROM blocks b
            WHERE (b.blocker_id = $1 AND b.blocked_id = p.author_id)
               OR (b.blocker_id = p.author_id AND b.blocked_id = $1)
        )
        "#
    };
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    content: String,
    media_urls: Vec<String>,
    visibility: String,
    likes_count: i32,
    comments_count: i32,
    shares_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            content: self.content,
            media_urls: self.media_urls,
            visibility: Visibility::from_db(&self.visibility),
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            shares_count: self.shares_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Post joined with its author and viewer flags.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PostViewRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    author_display_name: String,
    author_avatar_url: Option<String>,
    liked_by_viewer: bool,
    saved_by_viewer: bool,
    listed_at: DateTime<Utc>,
}

impl PostViewRow {
    pub(crate) fn into_view(self) -> PostView {
        let author = UserSummary {
            id: self.post.author_id,
            username: self.author_username,
            display_name: self.author_display_name,
            avatar_url: self.author_avatar_url,
        };
        PostView {
            post: self.post.into_post(),
            author,
            liked_by_viewer: self.liked_by_viewer,
            saved_by_viewer: self.saved_by_viewer,
            listed_at: self.listed_at,
        }
    }
}

async fn link_hashtags(conn: &mut PgConnection, post_id: i64, tags: &[String]) -> Result<(), AppError> {
    if tags.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO hashtags (tag, post_count)
        SELECT t, 1 FROM UNNEST($1::varchar[]) AS t
        ON CONFLICT (tag) DO UPDATE SET post_count = hashtags.post_count + 1
        "#,
    )
    .bind(tags)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO post_hashtags (post_id, tag)
        SELECT $1, t FROM UNNEST($2::varchar[]) AS t
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(post_id)
    .bind(tags)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn unlink_hashtags(conn: &mut PgConnection, post_id: i64) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE hashtags h
        SET post_count = GREATEST(h.post_count - 1, 0)
        FROM post_hashtags ph
        WHERE ph.tag = h.tag AND ph.post_id = $1
        "#,
    )
    .bind(post_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM post_hashtags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: &NewPost) -> Result<Post, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, author_id, content, media_urls, visibility)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, author_id, content, media_urls, visibility,
                      likes_count, comments_count, shares_count, created_at, updated_at
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.content)
        .bind(&post.media_urls)
        .bind(post.visibility.as_str())
        .fetch_one(&mut *tx)
        .await?;

        link_hashtags(&mut tx, post.id, &post.hashtags).await?;

        tx.commit().await?;
        Ok(row.into_post())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, author_id, content, media_urls, visibility,
                   likes_count, comments_count, shares_count, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PostRow::into_post))
    }

    async fn find_view(&self, id: i64, viewer: Option<i64>) -> Result<Option<PostView>, AppError> {
        let row = sqlx::query_as::<_, PostViewRow>(concat!(post_view_select!(), "WHERE p.id = $2"))
            .bind(viewer)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostViewRow::into_view))
    }

    async fn update(&self, id: i64, update: &PostUpdate) -> Result<Post, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET content    = COALESCE($2, content),
                visibility = COALESCE($3, visibility),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, author_id, content, media_urls, visibility,
                      likes_count, comments_count, shares_count, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.content)
        .bind(update.visibility.map(|v| v.as_str()))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

        if let Some(tags) = &update.hashtags {
            unlink_hashtags(&mut tx, id).await?;
            link_hashtags(&mut tx, id, tags).await?;
        }

        tx.commit().await?;
        Ok(row.into_post())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        unlink_hashtags(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn feed(&self, viewer: i64, page: PageRequest) -> Result<Vec<PostView>, AppError> {
        let rows = sqlx::query_as::<_, PostViewRow>(concat!(
            post_view_select!(),
            r#"
            WHERE (
                    p.author_id = $1
                 OR (p.visibility = 'public' AND EXISTS (
                        SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.followee_id = p.author_id))
                 OR (p.visibility IN ('public', 'friends') AND EXISTS (
                        SELECT 1 FROM friendships fr WHERE fr.user_id = $1 AND fr.friend_id = p.author_id))
              )
              AND "#,
            not_blocked_by_viewer!(),
            r#"
              AND ($2::timestamptz IS NULL OR (p.created_at, p.id) < ($2, $3))
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $4
            "#,
        ))
        .bind(viewer)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostViewRow::into_view).collect())
    }

    async fn by_author(
        &self,
        author_id: i64,
        viewer: Option<i64>,
        visibilities: &[Visibility],
        page: PageRequest,
    ) -> Result<Vec<PostView>, AppError> {
        let visibilities: Vec<String> = visibilities.iter().map(|v| v.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, PostViewRow>(concat!(
            post_view_select!(),
            r#"
            WHERE p.author_id = $2
              AND p.visibility = ANY($3)
              AND ($4::timestamptz IS NULL OR (p.created_at, p.id) < ($4, $5))
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $6
            "#,
        ))
        .bind(viewer)
        .bind(author_id)
        .bind(visibilities)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostViewRow::into_view).collect())
    }

    async fn search(
        &self,
        query: &str,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Vec<PostView>, AppError> {
        let pattern = format!("%{}%", super::escape_like(query));

        let rows = sqlx::query_as::<_, PostViewRow>(concat!(
            post_view_select!(),
            r#"
            WHERE p.visibility = 'public'
              AND p.content ILIKE $2
              AND "#,
            not_blocked_by_viewer!(),
            r#"
              AND ($3::timestamptz IS NULL OR (p.created_at, p.id) < ($3, $4))
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $5
            "#,
        ))
        .bind(viewer)
        .bind(pattern)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostViewRow::into_view).collect())
    }

    async fn by_hashtag(
        &self,
        tag: &str,
        viewer: Option<i64>,
        page: PageRequest,
    ) -> Result<Vec<PostView>, AppError> {
        let rows = sqlx::query_as::<_, PostViewRow>(concat!(
            post_view_select!(),
            r#"
            WHERE p.visibility = 'public'
              AND EXISTS (SELECT 1 FROM post_hashtags ph WHERE ph.post_id = p.id AND ph.tag = $2)
              AND "#,
            not_blocked_by_viewer!(),
            r#"
              AND ($3::timestamptz IS NULL OR (p.created_at, p.id) < ($3, $4))
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $5
            "#,
        ))
        .bind(viewer)
        .bind(tag)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostViewRow::into_view).collect())
    }
}
