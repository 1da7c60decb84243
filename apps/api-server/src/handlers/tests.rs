//! Handler contract tests against the in-memory store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use uuid::Uuid;

use quill_core::domain::{Post, Role, User};
use quill_core::ports::{PasswordService, TokenService};
use quill_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
use quill_infra::jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};
use quill_infra::notify::LogMailer;

use crate::handlers;
use crate::memory::{InMemoryPostRepository, InMemoryUserRepository};
use crate::state::AppState;

fn test_state() -> AppState {
    AppState {
        posts: Arc::new(InMemoryPostRepository::new()),
        users: Arc::new(InMemoryUserRepository::new()),
        notifier: Arc::new(LogMailer::new()),
        jobs: Arc::new(InMemoryJobQueue::new(InMemoryJobQueueConfig::default())),
        notify_window_hours: 24,
    }
}

fn token_service() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret-key".to_string(),
        expiration_hours: 1,
        issuer: "quill-test".to_string(),
    }))
}

fn bearer(tokens: &Arc<dyn TokenService>, user_id: Uuid, roles: &[&str]) -> (&'static str, String) {
    let token = tokens
        .generate_token(
            user_id,
            "caller@example.com",
            roles.iter().map(|r| r.to_string()).collect(),
        )
        .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! app {
    ($state:expr, $tokens:expr) => {{
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new($tokens.clone()))
                .app_data(web::Data::new(passwords))
                .configure(handlers::configure_routes),
        )
        .await
    }};
}

async fn seed_post(state: &AppState, author: Uuid, title: &str) -> Post {
    let post = Post::new(author, title.to_string(), "Body".to_string()).unwrap();
    state.posts.save(post).await.unwrap()
}

#[actix_web::test]
async fn create_sets_author_from_caller_identity() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);
    let caller = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&tokens, caller, &[]))
        .set_json(serde_json::json!({"title": "Hello", "body": "World"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["author_id"], caller.to_string());
    assert_eq!(body["published"], false);
}

#[actix_web::test]
async fn create_rejects_caller_supplied_author() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&tokens, Uuid::new_v4(), &[]))
        .set_json(serde_json::json!({
            "title": "Hello",
            "body": "World",
            "author": "Somebody Else"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_rejects_empty_title() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .insert_header(bearer(&tokens, Uuid::new_v4(), &[]))
        .set_json(serde_json::json!({"title": "", "body": "World"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_requires_authentication() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/posts")
        .set_json(serde_json::json!({"title": "Hello", "body": "World"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn update_by_non_author_is_forbidden_and_state_unchanged() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let author = Uuid::new_v4();
    let post = seed_post(&state, author, "Original").await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &[]))
        .set_json(serde_json::json!({"title": "Hijacked"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Original");
}

#[actix_web::test]
async fn update_payload_with_author_field_is_rejected() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let author = Uuid::new_v4();
    let post = seed_post(&state, author, "Original").await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&tokens, author, &[]))
        .set_json(serde_json::json!({"author_id": Uuid::new_v4().to_string()}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.author_id, author);
}

#[actix_web::test]
async fn update_of_missing_post_is_not_found() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", Uuid::new_v4()))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &[]))
        .set_json(serde_json::json!({"title": "New"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn author_can_update_own_post() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let author = Uuid::new_v4();
    let post = seed_post(&state, author, "Original").await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&tokens, author, &[]))
        .set_json(serde_json::json!({"title": "Edited", "body": "New body"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Edited");
    assert_eq!(body["author_id"], author.to_string());
}

#[actix_web::test]
async fn publish_by_owner_then_stranger() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let owner = Uuid::new_v4();
    let post = seed_post(&state, owner, "Hello").await;

    // Owner publishes
    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}/publish", post.id))
        .insert_header(bearer(&tokens, owner, &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["published"], true);

    // A stranger cannot publish another draft
    let draft = seed_post(&state, owner, "Second").await;
    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}/publish", draft.id))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let stored = state.posts.find_by_id(draft.id).await.unwrap().unwrap();
    assert!(!stored.published);
}

#[actix_web::test]
async fn editor_can_publish_any_post() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let post = seed_post(&state, Uuid::new_v4(), "Draft").await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}/publish", post.id))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &["editor"]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn publish_of_missing_post_is_not_found() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}/publish", Uuid::new_v4()))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &["editor"]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_of_missing_post_is_not_found() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", Uuid::new_v4()))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &["admin"]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_by_stranger_is_forbidden() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let post = seed_post(&state, Uuid::new_v4(), "Keep me").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", post.id))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(state.posts.find_by_id(post.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn owner_and_admin_can_delete() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let owner = Uuid::new_v4();
    let own = seed_post(&state, owner, "Mine").await;
    let other = seed_post(&state, Uuid::new_v4(), "Theirs").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", own.id))
        .insert_header(bearer(&tokens, owner, &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", other.id))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &["admin"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert!(state.posts.find_by_id(other.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn pending_lists_only_drafts() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let author = Uuid::new_v4();
    let draft = seed_post(&state, author, "Draft").await;
    let mut published = Post::new(author, "Live".into(), "Body".into()).unwrap();
    published.published = true;
    state.posts.save(published).await.unwrap();

    let req = test::TestRequest::get().uri("/api/posts/pending").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], draft.id.to_string());
}

#[actix_web::test]
async fn mine_lists_only_callers_posts() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let caller = Uuid::new_v4();
    seed_post(&state, caller, "Mine").await;
    seed_post(&state, Uuid::new_v4(), "Theirs").await;

    let req = test::TestRequest::get()
        .uri("/api/posts/mine")
        .insert_header(bearer(&tokens, caller, &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Mine");
}

#[actix_web::test]
async fn notify_recent_is_accepted_and_non_blocking() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/posts/notify-recent")
        .insert_header(bearer(&tokens, Uuid::new_v4(), &[]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["job_id"].as_str().is_some());
}

#[actix_web::test]
async fn comment_payloads_never_reach_post_deletion() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let post = seed_post(&state, Uuid::new_v4(), "Safe").await;

    // There is no comment resource; the route simply does not exist.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/comments/{}", post.id))
        .insert_header(bearer(&tokens, Uuid::new_v4(), &["admin"]))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(state.posts.find_by_id(post.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn register_login_me_roundtrip() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "correct horse",
            "first_name": "Ada",
            "last_name": "Lovelace"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "correct horse"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["display_name"], "Ada Lovelace");
}

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "correct horse",
            "first_name": "Ada",
            "last_name": "Lovelace"
        }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "wrong"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn granted_editor_role_flows_through_login() {
    let state = test_state();
    let tokens = token_service();
    let app = app!(state, tokens);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "email": "ed@example.com",
            "password": "correct horse",
            "first_name": "Ed",
            "last_name": "Itor"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Role assignment happens on the stored account, not via the API
    let mut user = state
        .users
        .find_by_email("ed@example.com")
        .await
        .unwrap()
        .unwrap();
    user.roles = vec![Role::Editor];
    state.users.save(user).await.unwrap();

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "ed@example.com",
            "password": "correct horse"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    // The stored role now authorizes publishing someone else's draft
    let draft = seed_post(&state, Uuid::new_v4(), "Draft").await;
    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}/publish", draft.id))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn seeded_user_is_visible_to_handlers() {
    let state = test_state();
    let user = User::new(
        "seed@example.com".into(),
        "Seed".into(),
        "User".into(),
        "hash".into(),
    );
    let id = user.id;
    state.users.save(user).await.unwrap();

    assert!(state.users.find_by_id(id).await.unwrap().is_some());
}
