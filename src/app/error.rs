use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Email already taken")]
    EmailTaken,
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("current user already follows this user")]
    AlreadyFollowing,
    #[error("current user does not follow this user")]
    NotFollowing,
    #[error("current user already liked this post")]
    AlreadyLiked,
    #[error("current user has not liked this post")]
    AlreadyUnliked,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
