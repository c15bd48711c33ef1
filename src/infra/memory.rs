use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::page::{PageOptions, PostWindow, QueryResult, SortOrder, UserSortField};
use crate::domain::post::{NewPost, Post};
use crate::domain::user::{NewUser, User, UserFilter};
use crate::infra::store::{EmailConflict, Store};

/// In-process store used for local development and the test suite.
///
/// Listings order the same way `PgStore` does, with id as the final
/// tie-breaker. Every mutation happens under one write lock, so edge
/// updates touch both sides at once.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    posts: Vec<Post>,
}

impl Inner {
    fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|user| user.id == id)
    }

    fn post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
        self.posts.iter_mut().find(|post| post.id == id)
    }

    fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|user| user.email == email && Some(user.id) != exclude)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_users(a: &User, b: &User, options: &PageOptions) -> Ordering {
    for key in &options.sort {
        let ordering = match key.field {
            UserSortField::Name => a.name.cmp(&b.name),
            UserSortField::Email => a.email.cmp(&b.email),
            UserSortField::Role => a.role.as_db().cmp(b.role.as_db()),
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            UserSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let ordering = match key.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id.cmp(&b.id)
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_user(&self, id: Uuid, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&user.email, None) {
            return Err(EmailConflict.into());
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            followers: Vec::new(),
            followings: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|user| user.email == email).cloned())
    }

    async fn is_email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.email_taken(email, exclude))
    }

    async fn save_user(&self, user: &User) -> Result<Option<User>> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(&user.email, Some(user.id)) {
            return Err(EmailConflict.into());
        }

        let Some(stored) = inner.user_mut(user.id) else {
            return Ok(None);
        };
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.role = user.role;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.users.len();
        inner.users.retain(|user| user.id != id);
        if inner.users.len() == before {
            return Ok(false);
        }

        for user in inner.users.iter_mut() {
            user.followers.retain(|follower| *follower != id);
            user.followings.retain(|followee| *followee != id);
        }
        inner.posts.retain(|post| post.user_id != id);
        for post in inner.posts.iter_mut() {
            post.likes.retain(|liker| *liker != id);
        }
        Ok(true)
    }

    async fn paginate_users(
        &self,
        filter: &UserFilter,
        options: &PageOptions,
    ) -> Result<QueryResult<User>> {
        let inner = self.inner.read().await;
        let mut matched: Vec<&User> = inner.users.iter().filter(|user| filter.matches(user)).collect();
        matched.sort_by(|a, b| compare_users(a, b, options));

        let total = matched.len() as u64;
        let results = matched
            .into_iter()
            .skip(options.offset() as usize)
            .take(options.limit as usize)
            .cloned()
            .collect();

        Ok(QueryResult::new(results, options, total))
    }

    async fn add_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let both_exist = inner.users.iter().any(|user| user.id == follower_id)
            && inner.users.iter().any(|user| user.id == followee_id);
        if !both_exist {
            return Err(anyhow::anyhow!("follow edge references a missing user"));
        }

        let follower = inner.user_mut(follower_id).expect("checked existence");
        if follower.followings.contains(&followee_id) {
            return Ok(false);
        }
        follower.followings.push(followee_id);

        let followee = inner.user_mut(followee_id).expect("checked existence");
        followee.followers.push(follower_id);
        Ok(true)
    }

    async fn remove_follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let mut removed = false;
        if let Some(follower) = inner.user_mut(follower_id) {
            let before = follower.followings.len();
            follower.followings.retain(|id| *id != followee_id);
            removed = follower.followings.len() != before;
        }
        if let Some(followee) = inner.user_mut(followee_id) {
            followee.followers.retain(|id| *id != follower_id);
        }
        Ok(removed)
    }

    async fn insert_post(&self, id: Uuid, post: NewPost) -> Result<Post> {
        let mut inner = self.inner.write().await;
        if !inner.users.iter().any(|user| user.id == post.user_id) {
            return Err(anyhow::anyhow!("post author {} does not exist", post.user_id));
        }

        let now = OffsetDateTime::now_utc();
        let post = Post {
            id,
            user_id: post.user_id,
            description: post.description,
            img: post.img,
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn save_post(&self, post: &Post) -> Result<Option<Post>> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.post_mut(post.id) else {
            return Ok(None);
        };
        stored.description = post.description.clone();
        stored.img = post.img.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.posts.len();
        inner.posts.retain(|post| post.id != id);
        Ok(inner.posts.len() != before)
    }

    async fn list_posts_by_authors(
        &self,
        author_ids: &[Uuid],
        window: &PostWindow,
    ) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<&Post> = inner
            .posts
            .iter()
            .filter(|post| author_ids.contains(&post.user_id))
            .collect();
        // Ties on the timestamp break on id in the same direction.
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if window.order == SortOrder::Desc {
            posts.reverse();
        }

        Ok(posts
            .into_iter()
            .skip(window.offset() as usize)
            .take(window.limit as usize)
            .cloned()
            .collect())
    }

    async fn add_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let post = inner
            .post_mut(post_id)
            .ok_or_else(|| anyhow::anyhow!("post {} does not exist", post_id))?;
        if post.likes.contains(&user_id) {
            return Ok(false);
        }
        post.likes.push(user_id);
        Ok(true)
    }

    async fn remove_like(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(post) = inner.post_mut(post_id) else {
            return Ok(false);
        };
        let before = post.likes.len();
        post.likes.retain(|liker| *liker != user_id);
        Ok(post.likes.len() != before)
    }
}
