use std::sync::Arc;

use uuid::Uuid;

use crate::app::auth::hash_password;
use crate::app::error::{ServiceError, ServiceResult};
use crate::domain::page::{PageOptions, QueryResult};
use crate::domain::user::{NewUser, Role, User, UserFilter};
use crate::infra::store::{is_email_conflict, Store};

pub const FOLLOW_SUCCEEDED: &str = "succeed";

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_conflict_or(err: anyhow::Error) -> ServiceError {
    if is_email_conflict(&err) {
        ServiceError::EmailTaken
    } else {
        ServiceError::Store(err)
    }
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, input: CreateUser) -> ServiceResult<User> {
        let email = normalize_email(&input.email);
        if self.store.is_email_taken(&email, None).await? {
            return Err(ServiceError::EmailTaken);
        }

        let user = NewUser {
            name: input.name.trim().to_string(),
            email,
            password_hash: hash_password(&input.password)?,
            role: input.role,
        };
        let user = self
            .store
            .insert_user(Uuid::new_v4(), user)
            .await
            .map_err(email_conflict_or)?;

        tracing::info!(user_id = %user.id, role = user.role.as_db(), "user created");
        Ok(user)
    }

    pub async fn query_users(
        &self,
        filter: &UserFilter,
        options: &PageOptions,
    ) -> ServiceResult<QueryResult<User>> {
        Ok(self.store.paginate_users(filter, options).await?)
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.store.find_user(id).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        Ok(self.store.find_user_by_email(&normalize_email(email)).await?)
    }

    pub async fn update_user_by_id(&self, id: Uuid, patch: UserPatch) -> ServiceResult<User> {
        let mut user = self
            .get_user_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        if let Some(email) = patch.email.as_deref().map(normalize_email) {
            if self.store.is_email_taken(&email, Some(id)).await? {
                return Err(ServiceError::EmailTaken);
            }
            user.email = email;
        }
        if let Some(name) = patch.name {
            user.name = name.trim().to_string();
        }
        if let Some(password) = patch.password {
            user.password_hash = hash_password(&password)?;
        }

        self.store
            .save_user(&user)
            .await
            .map_err(email_conflict_or)?
            .ok_or(ServiceError::NotFound("User"))
    }

    pub async fn delete_user_by_id(&self, id: Uuid) -> ServiceResult<User> {
        let user = self
            .get_user_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        if !self.store.delete_user(id).await? {
            return Err(ServiceError::NotFound("User"));
        }

        tracing::info!(user_id = %id, "user deleted");
        Ok(user)
    }

    /// Resolves both parties, then records the edge. The pre-check and the
    /// store's own "already present" answer map to the same error.
    pub async fn follow_user_by_id(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> ServiceResult<&'static str> {
        if actor_id == target_id {
            return Err(ServiceError::SelfFollow);
        }
        let (actor, _target) = self.load_pair(actor_id, target_id).await?;
        if actor.is_following(target_id) {
            return Err(ServiceError::AlreadyFollowing);
        }

        if !self.store.add_follow(actor_id, target_id).await? {
            return Err(ServiceError::AlreadyFollowing);
        }

        tracing::debug!(follower_id = %actor_id, followee_id = %target_id, "follow recorded");
        Ok(FOLLOW_SUCCEEDED)
    }

    pub async fn unfollow_user_by_id(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> ServiceResult<&'static str> {
        if actor_id == target_id {
            return Err(ServiceError::SelfFollow);
        }
        let (actor, _target) = self.load_pair(actor_id, target_id).await?;
        if !actor.is_following(target_id) {
            return Err(ServiceError::NotFollowing);
        }

        if !self.store.remove_follow(actor_id, target_id).await? {
            return Err(ServiceError::NotFollowing);
        }

        tracing::debug!(follower_id = %actor_id, followee_id = %target_id, "follow removed");
        Ok(FOLLOW_SUCCEEDED)
    }

    async fn load_pair(&self, actor_id: Uuid, target_id: Uuid) -> ServiceResult<(User, User)> {
        let actor = self.store.find_user(actor_id).await?;
        let target = self.store.find_user(target_id).await?;
        match (actor, target) {
            (Some(actor), Some(target)) => Ok((actor, target)),
            _ => Err(ServiceError::NotFound("User")),
        }
    }
}
