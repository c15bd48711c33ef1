use std::sync::Arc;

use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};
use crate::domain::page::PostWindow;
use crate::domain::post::{NewPost, Post};
use crate::infra::store::Store;

pub const LIKE_SUCCEEDED: &str = "succeed";

#[derive(Debug, Clone)]
pub struct CreatePost {
    pub description: String,
    pub img: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub description: Option<String>,
    pub img: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn Store>,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The author is always the authenticated actor.
    pub async fn create_post(&self, actor_id: Uuid, input: CreatePost) -> ServiceResult<Post> {
        self.require_actor(actor_id).await?;

        let post = self
            .store
            .insert_post(
                Uuid::new_v4(),
                NewPost {
                    user_id: actor_id,
                    description: input.description,
                    img: input.img.unwrap_or_default(),
                },
            )
            .await?;

        tracing::info!(post_id = %post.id, user_id = %actor_id, "post created");
        Ok(post)
    }

    pub async fn get_post_by_id(&self, id: Uuid) -> ServiceResult<Option<Post>> {
        Ok(self.store.find_post(id).await?)
    }

    pub async fn get_post_by_user_id(
        &self,
        window: &PostWindow,
        user_id: Uuid,
    ) -> ServiceResult<Vec<Post>> {
        Ok(self.store.list_posts_by_authors(&[user_id], window).await?)
    }

    /// Feed primitive: posts whose author is in `user_ids`.
    pub async fn get_timeline_post_by_user_ids(
        &self,
        window: &PostWindow,
        user_ids: &[Uuid],
    ) -> ServiceResult<Vec<Post>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.list_posts_by_authors(user_ids, window).await?)
    }

    pub async fn update_post_by_id(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
        patch: PostPatch,
    ) -> ServiceResult<Post> {
        let mut post = self.owned_post(actor_id, post_id).await?;
        if let Some(description) = patch.description {
            post.description = description;
        }
        if let Some(img) = patch.img {
            post.img = img;
        }

        self.store
            .save_post(&post)
            .await?
            .ok_or(ServiceError::NotFound("Post"))
    }

    pub async fn delete_post_by_id(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<Post> {
        let post = self.owned_post(actor_id, post_id).await?;
        if !self.store.delete_post(post_id).await? {
            return Err(ServiceError::NotFound("Post"));
        }

        tracing::info!(post_id = %post_id, user_id = %actor_id, "post deleted");
        Ok(post)
    }

    pub async fn like_post_by_user_id(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
    ) -> ServiceResult<&'static str> {
        self.require_actor(actor_id).await?;
        let post = self
            .get_post_by_id(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;
        if post.is_liked_by(actor_id) {
            return Err(ServiceError::AlreadyLiked);
        }

        if !self.store.add_like(post_id, actor_id).await? {
            return Err(ServiceError::AlreadyLiked);
        }
        Ok(LIKE_SUCCEEDED)
    }

    pub async fn unlike_post_by_user_id(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
    ) -> ServiceResult<&'static str> {
        self.require_actor(actor_id).await?;
        let post = self
            .get_post_by_id(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;
        if !post.is_liked_by(actor_id) {
            return Err(ServiceError::AlreadyUnliked);
        }

        if !self.store.remove_like(post_id, actor_id).await? {
            return Err(ServiceError::AlreadyUnliked);
        }
        Ok(LIKE_SUCCEEDED)
    }

    /// Tokens outlive accounts; a deleted actor must not write.
    async fn require_actor(&self, actor_id: Uuid) -> ServiceResult<()> {
        if self.store.find_user(actor_id).await?.is_none() {
            return Err(ServiceError::NotFound("User"));
        }
        Ok(())
    }

    async fn owned_post(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<Post> {
        let post = self
            .get_post_by_id(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;
        if post.user_id != actor_id {
            return Err(ServiceError::Forbidden("only the author can modify this post"));
        }
        Ok(post)
    }
}
