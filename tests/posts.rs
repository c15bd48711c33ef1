//! Post Tests
//!
//! Covers post CRUD, author-only mutation, likes and per-user listings.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;
use uuid::Uuid;

// ===========================================================================
// Create / Read
// ===========================================================================

#[tokio::test]
async fn create_post_success() {
    let app = app();
    let user = app.create_user("post_create").await;

    let resp = app
        .post_json(
            "/v1/posts",
            json!({ "description": "hello", "img": "cat.png" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let body = resp.json();
    assert_eq!(body["userId"], user.id.to_string());
    assert_eq!(body["description"], "hello");
    assert_eq!(body["img"], "cat.png");
    assert_eq!(body["likes"], json!([]));
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn create_post_rejects_client_author() {
    let app = app();
    let user = app.create_user("post_author").await;
    let other = app.create_user("post_author_other").await;

    let resp = app
        .post_json(
            "/v1/posts",
            json!({ "description": "mine", "userId": other.id }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_post_requires_description() {
    let app = app();
    let user = app.create_user("post_empty").await;

    let resp = app
        .post_json("/v1/posts", json!({ "description": "" }), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "description: is required");
}

#[tokio::test]
async fn create_post_without_session() {
    let app = app();

    let resp = app
        .post_json("/v1/posts", json!({ "description": "anon" }), None)
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_post() {
    let app = app();
    let user = app.create_user("post_get").await;
    let post_id = app.create_post_for_user(&user, "visible").await;

    let resp = app.get(&format!("/v1/posts/{}", post_id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["description"], "visible");
    assert_eq!(resp.json()["img"], "");
}

#[tokio::test]
async fn get_post_not_found() {
    let app = app();

    let resp = app.get(&format!("/v1/posts/{}", Uuid::new_v4()), None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "Post not found");
}

// ===========================================================================
// Update / Delete
// ===========================================================================

#[tokio::test]
async fn update_post_by_author() {
    let app = app();
    let user = app.create_user("post_upd").await;
    let post_id = app.create_post_for_user(&user, "before").await;

    let resp = app
        .patch_json(
            &format!("/v1/posts/{}", post_id),
            json!({ "description": "after" }),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["description"], "after");
}

#[tokio::test]
async fn update_post_by_other_user_forbidden() {
    let app = app();
    let author = app.create_user("post_upd_author").await;
    let other = app.create_user("post_upd_other").await;
    let post_id = app.create_post_for_user(&author, "original").await;

    let resp = app
        .patch_json(
            &format!("/v1/posts/{}", post_id),
            json!({ "description": "defaced" }),
            Some(&other.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_message(), "only the author can modify this post");

    let resp = app.get(&format!("/v1/posts/{}", post_id), None).await;
    assert_eq!(resp.json()["description"], "original");
}

#[tokio::test]
async fn update_post_requires_a_field() {
    let app = app();
    let user = app.create_user("post_upd_empty").await;
    let post_id = app.create_post_for_user(&user, "text").await;

    let resp = app
        .patch_json(&format!("/v1/posts/{}", post_id), json!({}), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_post_by_author() {
    let app = app();
    let user = app.create_user("post_del").await;
    let post_id = app.create_post_for_user(&user, "bye").await;

    let resp = app
        .delete(&format!("/v1/posts/{}", post_id), Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/v1/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_post_by_other_user_forbidden() {
    let app = app();
    let author = app.create_user("post_del_author").await;
    let other = app.create_user("post_del_other").await;
    let post_id = app.create_post_for_user(&author, "keep").await;

    let resp = app
        .delete(&format!("/v1/posts/{}", post_id), Some(&other.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_missing_post() {
    let app = app();
    let user = app.create_user("post_del_missing").await;

    let resp = app
        .delete(&format!("/v1/posts/{}", Uuid::new_v4()), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Likes
// ===========================================================================

#[tokio::test]
async fn like_then_like_again() {
    let app = app();
    let author = app.create_user("post_like_author").await;
    let fan = app.create_user("post_like_fan").await;
    let post_id = app.create_post_for_user(&author, "likeable").await;

    let resp = app
        .post(&format!("/v1/posts/{}/like", post_id), Some(&fan.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text(), "succeed");

    let resp = app
        .post(&format!("/v1/posts/{}/like", post_id), Some(&fan.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "current user already liked this post");

    let post = app.get(&format!("/v1/posts/{}", post_id), None).await.json();
    assert_eq!(post["likes"], json!([fan.id.to_string()]));
}

#[tokio::test]
async fn unlike_without_like() {
    let app = app();
    let author = app.create_user("post_unlike_author").await;
    let post_id = app.create_post_for_user(&author, "unliked").await;

    let resp = app
        .post(&format!("/v1/posts/{}/unlike", post_id), Some(&author.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "current user has not liked this post");
}

#[tokio::test]
async fn like_then_unlike() {
    let app = app();
    let author = app.create_user("post_toggle").await;
    let post_id = app.create_post_for_user(&author, "toggle").await;

    let resp = app
        .post(&format!("/v1/posts/{}/like", post_id), Some(&author.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .post(&format!("/v1/posts/{}/unlike", post_id), Some(&author.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let post = app.get(&format!("/v1/posts/{}", post_id), None).await.json();
    assert_eq!(post["likes"], json!([]));
}

#[tokio::test]
async fn like_missing_post() {
    let app = app();
    let user = app.create_user("post_like_missing").await;

    let resp = app
        .post(&format!("/v1/posts/{}/like", Uuid::new_v4()), Some(&user.access_token))
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Per-user listing
// ===========================================================================

#[tokio::test]
async fn list_user_posts_newest_first() {
    let app = app();
    let user = app.create_user("post_list").await;
    let first = app.create_post_for_user(&user, "first").await;
    let second = app.create_post_for_user(&user, "second").await;

    let resp = app.get(&format!("/v1/users/{}/posts", user.id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let ids: Vec<String> = resp
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![second.to_string(), first.to_string()]);

    let resp = app
        .get(&format!("/v1/users/{}/posts?sortBy=asc", user.id), None)
        .await;
    assert_eq!(resp.json()[0]["id"], first.to_string());
}

#[tokio::test]
async fn list_posts_for_user_without_posts() {
    let app = app();
    let user = app.create_user("post_list_empty").await;

    let resp = app.get(&format!("/v1/users/{}/posts", user.id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!([]));
}

#[tokio::test]
async fn list_posts_rejects_bad_direction() {
    let app = app();
    let user = app.create_user("post_list_bad").await;

    let resp = app
        .get(&format!("/v1/users/{}/posts?sortBy=sideways", user.id), None)
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_user_posts_second_page_of_twenty_five() {
    let app = app();
    let user = app.create_user("post_list_page").await;
    for i in 1..=25 {
        app.create_post_for_user(&user, &format!("post {}", i)).await;
    }
    let descriptions = |body: serde_json::Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|post| post["description"].as_str().unwrap().to_string())
            .collect()
    };

    let resp = app
        .get(
            &format!("/v1/users/{}/posts?page=2&limit=10&sortBy=createdAt:asc", user.id),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let expected: Vec<String> = (11..=20).map(|i| format!("post {}", i)).collect();
    assert_eq!(descriptions(resp.json()), expected);

    let resp = app
        .get(&format!("/v1/users/{}/posts?page=2&limit=10", user.id), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let expected: Vec<String> = (6..=15).rev().map(|i| format!("post {}", i)).collect();
    assert_eq!(descriptions(resp.json()), expected);
}

#[tokio::test]
async fn list_posts_limit_is_bounded() {
    let app = app();
    let user = app.create_user("post_list_bound").await;

    let resp = app
        .get(&format!("/v1/users/{}/posts?limit=201", user.id), None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "limit: must be between 1 and 200");

    let resp = app
        .get(
            &format!("/v1/users/{}/posts?page=4294967295&limit=4294967295", user.id),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .get(&format!("/v1/users/{}/posts?page=4294967295&limit=200", user.id), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!([]));
}

#[tokio::test]
async fn deleted_account_cannot_like() {
    let app = app();
    let author = app.create_user("post_like_ghost_author").await;
    let ghost = app.create_user("post_like_ghost").await;
    let post_id = app.create_post_for_user(&author, "haunted").await;

    let resp = app
        .delete(&format!("/v1/users/{}", ghost.id), Some(&ghost.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post(&format!("/v1/posts/{}/like", post_id), Some(&ghost.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "User not found");

    let resp = app
        .post(&format!("/v1/posts/{}/unlike", post_id), Some(&ghost.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let post = app.get(&format!("/v1/posts/{}", post_id), None).await.json();
    assert_eq!(post["likes"], json!([]));
}
