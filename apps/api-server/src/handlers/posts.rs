//! Post resource handlers.
//!
//! Every mutating handler checks existence, then authorization, then
//! mutates - in that order - and performs the mutation as one store call.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges};
use quill_core::ports::{Job, JobQueue};
use quill_shared::ApiResponse;
use quill_shared::dto::{
    CreatePostRequest, NotifyAcceptedResponse, PostResponse, UpdatePostRequest,
};

use crate::background::NOTIFY_RECENT_POSTS;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        author_id: post.author_id.to_string(),
        title: post.title,
        body: post.body,
        published: post.published,
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

fn post_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Post with id {id} not found"))
}

/// GET /api/posts - all posts, newest first.
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        posts.into_iter().map(to_response).collect::<Vec<_>>(),
    )))
}

/// GET /api/posts/pending - drafts awaiting publication.
pub async fn list_pending(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_pending().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        posts.into_iter().map(to_response).collect::<Vec<_>>(),
    )))
}

/// GET /api/posts/mine - posts authored by the caller.
pub async fn mine(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let posts = state.posts.find_by_author(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        posts.into_iter().map(to_response).collect::<Vec<_>>(),
    )))
}

/// POST /api/posts - create a draft authored by the caller.
///
/// The author is the authenticated identity; the payload cannot carry one.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let post = Post::new(identity.user_id, req.title, req.body)?;
    let saved = state.posts.save(post).await?;

    tracing::info!(post_id = %saved.id, author_id = %saved.author_id, "Post created");
    Ok(HttpResponse::Created().json(to_response(saved)))
}

/// PATCH /api/posts/{id} - update title/body. Author only.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| post_not_found(id))?;

    post.apply_update(
        &identity.actor(),
        PostChanges {
            title: req.title,
            body: req.body,
        },
    )?;

    let saved = state.posts.save(post).await?;
    Ok(HttpResponse::Ok().json(to_response(saved)))
}

/// PATCH /api/posts/{id}/publish - draft -> published.
pub async fn publish(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| post_not_found(id))?;

    post.publish(&identity.actor())?;

    let saved = state.posts.save(post).await?;
    tracing::info!(post_id = %saved.id, "Post published");
    Ok(HttpResponse::Ok().json(to_response(saved)))
}

/// DELETE /api/posts/{id} - author or admin only.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| post_not_found(id))?;

    if !post.deletable_by(&identity.actor()) {
        return Err(AppError::Forbidden);
    }

    state.posts.delete(id).await?;
    tracing::info!(post_id = %id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/notify-recent - schedule the recent-posts digest.
///
/// Only enqueues; the worker does the fan-out so the request never blocks
/// on delivery.
pub async fn notify_recent(
    state: web::Data<AppState>,
    _identity: Identity,
) -> AppResult<HttpResponse> {
    let job = Job::new(NOTIFY_RECENT_POSTS, serde_json::json!({}));
    let job_id = job.id.clone();

    state
        .jobs
        .enqueue(job)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Accepted().json(NotifyAcceptedResponse { job_id }))
}
