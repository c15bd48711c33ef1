use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::page::{PageOptions, PostWindow, QueryResult};
use crate::domain::post::{NewPost, Post};
use crate::domain::user::{NewUser, Role, User, UserFilter};
use crate::infra::db::Db;
use crate::infra::store::{EmailConflict, Store};

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.password_hash, u.role, u.created_at, u.updated_at, \
     ARRAY(SELECT f.follower_id FROM follows f WHERE f.followee_id = u.id \
           ORDER BY f.created_at, f.follower_id) AS followers, \
     ARRAY(SELECT f.followee_id FROM follows f WHERE f.follower_id = u.id \
           ORDER BY f.created_at, f.followee_id) AS followings";

const POST_COLUMNS: &str = "p.id, p.user_id, p.description, p.img, p.created_at, p.updated_at, \
     ARRAY(SELECT l.user_id FROM post_likes l WHERE l.post_id = p.id \
           ORDER BY l.created_at, l.user_id) AS likes";

const USER_FILTER: &str = "($1::text IS NULL OR u.name = $1) AND ($2::text IS NULL OR u.role = $2)";

/// PostgreSQL-backed store. Follow and like edges are rows keyed by their
/// two ids, so each edge write is a single statement.
#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.get("role");
    let role = Role::from_db(&role).ok_or_else(|| anyhow!("unknown user role: {}", role))?;
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        followers: row.get("followers"),
        followings: row.get("followings"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        user_id: row.get("user_id"),
        description: row.get("description"),
        img: row.get("img"),
        likes: row.get("likes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_email_conflict(err: sqlx::Error) -> anyhow::Error {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint().unwrap_or_default().contains("users_email_key")
        {
            return EmailConflict.into();
        }
    }
    err.into()
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }

    async fn insert_user(&self, id: Uuid, user: NewUser) -> Result<User> {
        let row = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, password_hash, role, created_at, updated_at, \
                       ARRAY[]::uuid[] AS followers, ARRAY[]::uuid[] AS followings",
        )
        .bind(id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role.as_db())
        .fetch_one(self.db.pool())
        .await
        .map_err(map_email_conflict)?;

        user_from_row(&row)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users u WHERE u.id = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users u WHERE u.email = $1", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn is_email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2) \
             )",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(self.db.pool())
        .await?;

        Ok(taken)
    }

    async fn save_user(&self, user: &User) -> Result<Option<User>> {
        let sql = format!(
            "WITH u AS ( \
                UPDATE users \
                SET name = $2, email = $3, password_hash = $4, role = $5, updated_at = now() \
                WHERE id = $1 \
                RETURNING id, name, email, password_hash, role, created_at, updated_at \
             ) \
             SELECT {} FROM u",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_db())
            .fetch_optional(self.db.pool())
            .await
            .map_err(map_email_conflict)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        // posts, follows and likes go with the user through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn paginate_users(
        &self,
        filter: &UserFilter,
        options: &PageOptions,
    ) -> Result<QueryResult<User>> {
        let mut order_by: Vec<String> = options
            .sort
            .iter()
            .map(|key| format!("u.{} {}", key.field.column(), key.order.as_sql()))
            .collect();
        order_by.push("u.id ASC".to_string());

        let sql = format!(
            "SELECT {} FROM users u WHERE {} ORDER BY {} LIMIT $3 OFFSET $4",
            USER_COLUMNS,
            USER_FILTER,
            order_by.join(", ")
        );
        let role = filter.role.map(|role| role.as_db());

        let rows = sqlx::query(&sql)
            .bind(filter.name.as_deref())
            .bind(role)
            .bind(i64::from(options.limit))
            .bind(i64::try_from(options.offset())?)
            .fetch_all(self.db.pool())
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM users u WHERE {}", USER_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.name.as_deref())
            .bind(role)
            .fetch_one(self.db.pool())
            .await?;

        let users = rows.iter().map(user_from_row).collect::<Result<Vec<_>>>()?;
        Ok(QueryResult::new(users, options, total.max(0) as u64))
    }

    async fn add_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_post(&self, id: Uuid, post: NewPost) -> Result<Post> {
        let row = sqlx::query(
            "INSERT INTO posts (id, user_id, description, img) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, description, img, created_at, updated_at, \
                       ARRAY[]::uuid[] AS likes",
        )
        .bind(id)
        .bind(post.user_id)
        .bind(post.description)
        .bind(post.img)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.id = $1", POST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn save_post(&self, post: &Post) -> Result<Option<Post>> {
        let sql = format!(
            "WITH p AS ( \
                UPDATE posts \
                SET description = $2, img = $3, updated_at = now() \
                WHERE id = $1 \
                RETURNING id, user_id, description, img, created_at, updated_at \
             ) \
             SELECT {} FROM p",
            POST_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(post.id)
            .bind(&post.description)
            .bind(&post.img)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts_by_authors(
        &self,
        author_ids: &[Uuid],
        window: &PostWindow,
    ) -> Result<Vec<Post>> {
        let direction = window.order.as_sql();
        let sql = format!(
            "SELECT {} FROM posts p \
             WHERE p.user_id = ANY($1) \
             ORDER BY p.created_at {}, p.id {} \
             LIMIT $2 OFFSET $3",
            POST_COLUMNS, direction, direction
        );
        let rows = sqlx::query(&sql)
            .bind(author_ids)
            .bind(i64::from(window.limit))
            .bind(i64::try_from(window.offset())?)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
