pub mod auth;
pub mod error;
pub mod posts;
pub mod users;
