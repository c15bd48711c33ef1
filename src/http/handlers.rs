use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::app::auth::AuthService;
use crate::app::posts::{CreatePost, PostPatch, PostService};
use crate::app::users::{CreateUser, UserPatch, UserService};
use crate::config::roles::Right;
use crate::domain::page::{PageOptions, PostWindow, QueryResult};
use crate::domain::post::Post;
use crate::domain::user::{Role, User, UserFilter};
use crate::http::validate::{validate_password, ValidatedJson, ValidatedQuery};
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = ?err, "store ping failed");
            "degraded"
        }
    };

    Json(HealthResponse { status })
}

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub access_expires_at: OffsetDateTime,
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AuthService::new(
        state.store.clone(),
        state.paseto_access_key,
        state.access_ttl_minutes,
    );
    let session = service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match session {
        Some((user, token)) => Ok(Json(LoginResponse {
            user,
            access_token: token.token,
            access_expires_at: token.expires_at,
        })),
        None => Err(AppError::unauthorized("Incorrect email or password")),
    }
}

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

pub async fn create_user(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let role = payload.role.unwrap_or_default();
    if role == Role::Admin && !auth.is_some_and(|auth| auth.has(Right::ManageUsers)) {
        return Err(AppError::forbidden("only administrators can create administrators"));
    }

    let service = UserService::new(state.store.clone());
    let user = service
        .create_user(CreateUser {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub name: Option<String>,
    pub role: Option<Role>,
    #[validate(range(min = 1, max = 200, message = "must be between 1 and 200"))]
    pub limit: Option<u32>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: Option<u32>,
    pub sort_by: Option<String>,
    pub populate: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<Json<QueryResult<User>>, AppError> {
    let options = PageOptions::new(
        query.page,
        query.limit,
        query.sort_by.as_deref(),
        query.populate.as_deref(),
    )?;
    let filter = UserFilter {
        name: query.name,
        role: query.role,
    };

    let service = UserService::new(state.store.clone());
    let page = service.query_users(&filter, &options).await?;
    Ok(Json(page))
}

pub async fn get_user(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.store.clone());
    match service.get_user_by_id(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("User not found")),
    }
}

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_user_patch"))]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,
}

fn validate_user_patch(request: &UpdateUserRequest) -> Result<(), ValidationError> {
    if request.name.is_none() && request.email.is_none() && request.password.is_none() {
        let mut err = ValidationError::new("empty_patch");
        err.message = Some("at least one field must be provided".into());
        return Err(err);
    }
    Ok(())
}

pub async fn update_user(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    auth.require_account_access(id)?;

    let service = UserService::new(state.store.clone());
    let user = service
        .update_user_by_id(
            id,
            UserPatch {
                name: payload.name,
                email: payload.email,
                password: payload.password,
            },
        )
        .await?;

    Ok(Json(user))
}

pub async fn delete_user(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    auth.require_account_access(id)?;

    let service = UserService::new(state.store.clone());
    service.delete_user_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn follow_user(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<&'static str, AppError> {
    auth.require(Right::Follow)?;

    let service = UserService::new(state.store.clone());
    Ok(service.follow_user_by_id(auth.user_id, id).await?)
}

pub async fn unfollow_user(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<&'static str, AppError> {
    auth.require(Right::Follow)?;

    let service = UserService::new(state.store.clone());
    Ok(service.unfollow_user_by_id(auth.user_id, id).await?)
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostWindowQuery {
    #[validate(range(min = 1, max = 200, message = "must be between 1 and 200"))]
    pub limit: Option<u32>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: Option<u32>,
    pub sort_by: Option<String>,
}

impl PostWindowQuery {
    fn window(&self) -> Result<PostWindow, AppError> {
        Ok(PostWindow::new(
            self.page,
            self.limit,
            self.sort_by.as_deref(),
        )?)
    }
}

pub async fn list_user_posts(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PostWindowQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    let window = query.window()?;

    let service = PostService::new(state.store.clone());
    let posts = service.get_post_by_user_id(&window, id).await?;
    Ok(Json(posts))
}

pub async fn timeline(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PostWindowQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    auth.require(Right::Timeline)?;
    let window = query.window()?;

    let users = UserService::new(state.store.clone());
    let actor = users
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let service = PostService::new(state.store.clone());
    let posts = service
        .get_timeline_post_by_user_ids(&window, &actor.followings)
        .await?;
    Ok(Json(posts))
}

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub description: String,
    #[serde(default)]
    pub img: Option<String>,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    auth.require(Right::Post)?;

    let service = PostService::new(state.store.clone());
    let post = service
        .create_post(
            auth.user_id,
            CreatePost {
                description: payload.description,
                img: payload.img,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.store.clone());
    match service.get_post_by_id(id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("Post not found")),
    }
}

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_post_patch"))]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, message = "cannot be empty"))]
    pub description: Option<String>,
    pub img: Option<String>,
}

fn validate_post_patch(request: &UpdatePostRequest) -> Result<(), ValidationError> {
    if request.description.is_none() && request.img.is_none() {
        let mut err = ValidationError::new("empty_patch");
        err.message = Some("at least one field must be provided".into());
        return Err(err);
    }
    Ok(())
}

pub async fn update_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdatePostRequest>,
) -> Result<Json<Post>, AppError> {
    auth.require(Right::Post)?;

    let service = PostService::new(state.store.clone());
    let post = service
        .update_post_by_id(
            auth.user_id,
            id,
            PostPatch {
                description: payload.description,
                img: payload.img,
            },
        )
        .await?;

    Ok(Json(post))
}

pub async fn delete_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    auth.require(Right::Post)?;

    let service = PostService::new(state.store.clone());
    service.delete_post_by_id(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<&'static str, AppError> {
    auth.require(Right::Post)?;

    let service = PostService::new(state.store.clone());
    Ok(service.like_post_by_user_id(auth.user_id, id).await?)
}

pub async fn unlike_post(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<&'static str, AppError> {
    auth.require(Right::Post)?;

    let service = PostService::new(state.store.clone());
    Ok(service.unlike_post_by_user_id(auth.user_id, id).await?)
}
