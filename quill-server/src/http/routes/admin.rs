//! Admin endpoints, nested under `/admin`
//!
//! These carry no authentication of their own and are only mounted when
//! the server is started with admin enabled.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::posts::{PostPage, PostResponse};
use crate::admin::{
    Admin, AuthorDraft, CategoryDraft, CommentListQuery, PostDraft, PostListQuery, PostPatch,
};
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, ValidId};
use crate::http::server::AppState;
use crate::store::{Author, Category, Comment, Tag};

#[derive(Debug, Default, Deserialize)]
pub struct CategorySearch {
    pub search: Option<String>,
}

/// Body of the bulk comment actions
#[derive(Debug, Deserialize)]
pub struct CommentIds {
    pub ids: Vec<i64>,
}

#[derive(Serialize)]
pub struct BulkResult {
    pub updated: u64,
}

fn admin(state: &AppState) -> Admin<'_> {
    Admin::new(state.store.as_ref())
}

// Authors

/// POST /admin/authors
async fn create_author(
    State(state): State<Arc<AppState>>,
    JsonBody(draft): JsonBody<AuthorDraft>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    let author = admin(&state).create_author(&draft).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// DELETE /admin/authors/{id} - removes their posts too
async fn delete_author(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<StatusCode, ApiError> {
    admin(&state).delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Categories

/// GET /admin/categories?search=
async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategorySearch>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = admin(&state)
        .list_categories(params.search.as_deref())
        .await?;
    Ok(Json(categories))
}

/// POST /admin/categories
async fn create_category(
    State(state): State<Arc<AppState>>,
    JsonBody(draft): JsonBody<CategoryDraft>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = admin(&state).create_category(&draft).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH /admin/categories/{id}
async fn rename_category(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    JsonBody(draft): JsonBody<CategoryDraft>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(admin(&state).rename_category(id, &draft).await?))
}

/// DELETE /admin/categories/{id}
async fn delete_category(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<StatusCode, ApiError> {
    admin(&state).delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/tags
async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(admin(&state).list_tags().await?))
}

// Posts

/// GET /admin/posts - every status, filterable
async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostPage>, ApiError> {
    let page = admin(&state).list_posts(&query).await?;
    Ok(Json(page.into()))
}

/// POST /admin/posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    JsonBody(draft): JsonBody<PostDraft>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let post = admin(&state).create_post(&draft).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

/// GET /admin/posts/{id}
async fn get_post(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<PostResponse>, ApiError> {
    Ok(Json(admin(&state).get_post(id).await?.into()))
}

/// PATCH /admin/posts/{id}
async fn update_post(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    JsonBody(patch): JsonBody<PostPatch>,
) -> Result<Json<PostResponse>, ApiError> {
    Ok(Json(admin(&state).update_post(id, &patch).await?.into()))
}

/// DELETE /admin/posts/{id} - removes its comments too
async fn delete_post(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<StatusCode, ApiError> {
    admin(&state).delete_post(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Comments

/// GET /admin/comments - any state, oldest first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(admin(&state).list_comments(&query).await?))
}

/// POST /admin/comments/approve
async fn approve_comments(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<CommentIds>,
) -> Result<Json<BulkResult>, ApiError> {
    let updated = admin(&state).approve_comments(&body.ids).await?;
    Ok(Json(BulkResult { updated }))
}

/// POST /admin/comments/deactivate
async fn deactivate_comments(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<CommentIds>,
) -> Result<Json<BulkResult>, ApiError> {
    let updated = admin(&state).deactivate_comments(&body.ids).await?;
    Ok(Json(BulkResult { updated }))
}

/// DELETE /admin/comments/{id}
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<StatusCode, ApiError> {
    admin(&state).delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/authors", post(create_author))
        .route("/authors/{id}", delete(delete_author))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            patch(rename_category).delete(delete_category),
        )
        .route("/tags", get(list_tags))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/comments", get(list_comments))
        .route("/comments/approve", post(approve_comments))
        .route("/comments/deactivate", post(deactivate_comments))
        .route("/comments/{id}", delete(delete_comment))
}
