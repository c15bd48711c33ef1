use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::page::{PageOptions, PostWindow, QueryResult};
use crate::domain::post::{NewPost, Post};
use crate::domain::user::{NewUser, User, UserFilter};

/// Raised by a store when a write would register an email twice.
#[derive(Debug, Error)]
#[error("email already registered")]
pub struct EmailConflict;

pub fn is_email_conflict(err: &anyhow::Error) -> bool {
    err.downcast_ref::<EmailConflict>().is_some()
}

/// Persistence collaborator for users, posts and their edges.
///
/// Relationship and like mutations are single edge writes: they either
/// happen or they don't, and they report `false` when the edge was already
/// in the requested state.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn insert_user(&self, id: Uuid, user: NewUser) -> Result<User>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn is_email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool>;
    async fn save_user(&self, user: &User) -> Result<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    /// Paginated listing. Stores without a pagination capability answer with
    /// an empty, zeroed envelope.
    async fn paginate_users(
        &self,
        _filter: &UserFilter,
        _options: &PageOptions,
    ) -> Result<QueryResult<User>> {
        Ok(QueryResult::empty())
    }

    async fn add_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;
    async fn remove_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    async fn insert_post(&self, id: Uuid, post: NewPost) -> Result<Post>;
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;
    async fn save_post(&self, post: &Post) -> Result<Option<Post>>;
    async fn delete_post(&self, id: Uuid) -> Result<bool>;
    async fn list_posts_by_authors(
        &self,
        author_ids: &[Uuid],
        window: &PostWindow,
    ) -> Result<Vec<Post>>;

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;
    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool>;
}
