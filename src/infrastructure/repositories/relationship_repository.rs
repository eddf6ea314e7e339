//! Relationship Repository Implementation
//!
//! Friendships are stored as two rows, `(a, b)` and `(b, a)`, so every
//! friend query is a plain lookup on `user_id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::notification_repository::insert_notification;
use super::ListingRow;
use crate::domain::{
    FriendRequest, FriendRequestView, NotificationDraft, RelationshipFlags, RelationshipRepository,
    UserListing, UserSummary,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortDirection};

#[derive(Debug, sqlx::FromRow)]
struct FriendRequestRow {
    id: i64,
    requester_id: i64,
    addressee_id: i64,
    created_at: DateTime<Utc>,
}

impl From<FriendRequestRow> for FriendRequest {
    fn from(row: FriendRequestRow) -> Self {
        Self {
            id: row.id,
            requester_id: row.requester_id,
            addressee_id: row.addressee_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FriendRequestViewRow {
    #[sqlx(flatten)]
    request: FriendRequestRow,
    requester_username: String,
    requester_display_name: String,
    requester_avatar_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct FlagsRow {
    is_following: bool,
    is_followed_by: bool,
    is_friend: bool,
    is_blocked: bool,
    has_blocked_viewer: bool,
    request_sent: bool,
    request_received: bool,
}

/// Remove every follow, friendship and request between the pair.
async fn sever(conn: &mut PgConnection, a: i64, b: i64) -> Result<(), AppError> {
    sqlx::query(
        r#"
        DELETE FROM follows
        WHERE (follower_id = $1 AND followee_id = $2)
           OR (follower_id = $2 AND followee_id = $1)
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM friendships
        WHERE (user_id = $1 AND friend_id = $2)
           OR (user_id = $2 AND friend_id = $1)
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM friend_requests
        WHERE (requester_id = $1 AND addressee_id = $2)
           OR (requester_id = $2 AND addressee_id = $1)
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct PgRelationshipRepository {
    pool: PgPool,
}

impl PgRelationshipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipRepository for PgRelationshipRepository {
    async fn follow(
        &self,
        follower_id: i64,
        followee_id: i64,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(false);
        }

        if let Some(draft) = &notification {
            insert_notification(&mut tx, draft).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn followers(&self, user_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT u.id, u.username, u.display_name, u.avatar_url, f.created_at AS listed_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = $1
              AND ($2::timestamptz IS NULL OR (f.created_at, u.id) < ($2, $3))
            ORDER BY f.created_at DESC, u.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingRow::into_listing).collect())
    }

    async fn following(&self, user_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT u.id, u.username, u.display_name, u.avatar_url, f.created_at AS listed_at
            FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = $1
              AND ($2::timestamptz IS NULL OR (f.created_at, u.id) < ($2, $3))
            ORDER BY f.created_at DESC, u.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingRow::into_listing).collect())
    }

    async fn friend_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT friend_id FROM friendships WHERE user_id = $1 ORDER BY friend_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }

    async fn friends(&self, user_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT u.id, u.username, u.display_name, u.avatar_url, fr.created_at AS listed_at
            FROM friendships fr
            JOIN users u ON u.id = fr.friend_id
            WHERE fr.user_id = $1
              AND ($2::timestamptz IS NULL OR (fr.created_at, u.id) < ($2, $3))
            ORDER BY fr.created_at DESC, u.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingRow::into_listing).collect())
    }

    async fn are_friends(&self, a: i64, b: i64) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM friendships WHERE user_id = $1 AND friend_id = $2)",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_request(&self, id: i64) -> Result<Option<FriendRequest>, AppError> {
        let row = sqlx::query_as::<_, FriendRequestRow>(
            "SELECT id, requester_id, addressee_id, created_at FROM friend_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_request_between(&self, a: i64, b: i64) -> Result<Option<FriendRequest>, AppError> {
        let row = sqlx::query_as::<_, FriendRequestRow>(
            r#"
            SELECT id, requester_id, addressee_id, created_at
            FROM friend_requests
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_request(
        &self,
        request: &FriendRequest,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // The unique constraint covers one direction; the reverse is checked here.
        let inserted = sqlx::query(
            r#"
            INSERT INTO friend_requests (id, requester_id, addressee_id, created_at)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM friend_requests
                WHERE requester_id = $3 AND addressee_id = $2
            )
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(request.id)
        .bind(request.requester_id)
        .bind(request.addressee_id)
        .bind(request.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(false);
        }

        if let Some(draft) = &notification {
            insert_notification(&mut tx, draft).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn accept_request(
        &self,
        request: &FriendRequest,
        notification: Option<NotificationDraft>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(request.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO friendships (user_id, friend_id)
            VALUES ($1, $2), ($2, $1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(request.requester_id)
        .bind(request.addressee_id)
        .execute(&mut *tx)
        .await?;

        if let Some(draft) = &notification {
            insert_notification(&mut tx, draft).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_request(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn incoming_requests(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Vec<FriendRequestView>, AppError> {
        let rows = sqlx::query_as::<_, FriendRequestViewRow>(
            r#"
            SELECT r.id, r.requester_id, r.addressee_id, r.created_at,
                   u.username AS requester_username, u.display_name AS requester_display_name,
                   u.avatar_url AS requester_avatar_url
            FROM friend_requests r
            JOIN users u ON u.id = r.requester_id
            WHERE r.addressee_id = $1
              AND ($2::timestamptz IS NULL OR (r.created_at, r.id) < ($2, $3))
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FriendRequestView {
                requester: UserSummary {
                    id: row.request.requester_id,
                    username: row.requester_username,
                    display_name: row.requester_display_name,
                    avatar_url: row.requester_avatar_url,
                },
                request: row.request.into(),
            })
            .collect())
    }

    async fn pending_request_user_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT CASE WHEN requester_id = $1 THEN addressee_id ELSE requester_id END
            FROM friend_requests
            WHERE requester_id = $1 OR addressee_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn remove_friend(&self, a: i64, b: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (user_id = $1 AND friend_id = $2)
               OR (user_id = $2 AND friend_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn block(&self, blocker_id: i64, blocked_id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO blocks (blocker_id, blocked_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(false);
        }

        sever(&mut tx, blocker_id, blocked_id).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn unblock(&self, blocker_id: i64, blocked_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2")
            .bind(blocker_id)
            .bind(blocked_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn blocks(&self, blocker_id: i64, page: PageRequest) -> Result<Vec<UserListing>, AppError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT u.id, u.username, u.display_name, u.avatar_url, b.created_at AS listed_at
            FROM blocks b
            JOIN users u ON u.id = b.blocked_id
            WHERE b.blocker_id = $1
              AND ($2::timestamptz IS NULL OR (b.created_at, u.id) < ($2, $3))
            ORDER BY b.created_at DESC, u.id DESC
            LIMIT $4
            "#,
        )
        .bind(blocker_id)
        .bind(page.cursor_at())
        .bind(page.cursor_id(SortDirection::Descending))
        .bind(page.fetch_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingRow::into_listing).collect())
    }

    async fn is_blocked_between(&self, a: i64, b: i64) -> Result<bool, AppError> {
        let blocked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM blocks
                WHERE (blocker_id = $1 AND blocked_id = $2)
                   OR (blocker_id = $2 AND blocked_id = $1)
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;

        Ok(blocked)
    }

    async fn blocked_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT blocked_id FROM blocks WHERE blocker_id = $1
            UNION
            SELECT blocker_id FROM blocks WHERE blocked_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn flags(&self, viewer_id: i64, target_id: i64) -> Result<RelationshipFlags, AppError> {
        let row = sqlx::query_as::<_, FlagsRow>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2) AS is_following,
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $2 AND followee_id = $1) AS is_followed_by,
                EXISTS (SELECT 1 FROM friendships WHERE user_id = $1 AND friend_id = $2) AS is_friend,
                EXISTS (SELECT 1 FROM blocks WHERE blocker_id = $1 AND blocked_id = $2) AS is_blocked,
                EXISTS (SELECT 1 FROM blocks WHERE blocker_id = $2 AND blocked_id = $1) AS has_blocked_viewer,
                EXISTS (SELECT 1 FROM friend_requests WHERE requester_id = $1 AND addressee_id = $2) AS request_sent,
                EXISTS (SELECT 1 FROM friend_requests WHERE requester_id = $2 AND addressee_id = $1) AS request_received
            "#,
        )
        .bind(viewer_id)
        .bind(target_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RelationshipFlags {
            is_following: row.is_following,
            is_followed_by: row.is_followed_by,
            is_friend: row.is_friend,
            is_blocked: row.is_blocked,
            has_blocked_viewer: row.has_blocked_viewer,
            request_sent: row.request_sent,
            request_received: row.request_received,
        })
    }
}
