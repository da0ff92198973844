//! Public post endpoints: index and detail

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::comments::CommentResponse;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::models::{Paginated, PostStatus};
use crate::query::{IndexPage, PostDetail, Queries};
use crate::store::{Author, Category, Post, Tag};

/// Index query string; `page` stays raw so junk falls back to page 1
#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    pub search: Option<String>,
    pub page: Option<String>,
}

#[derive(Serialize)]
pub struct AuthorResponse {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

impl From<Author> for AuthorResponse {
    fn from(a: Author) -> Self {
        Self {
            id: a.id,
            username: a.username,
            display_name: a.display_name,
        }
    }
}

/// Post response
#[derive(Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author: AuthorResponse,
    pub body: String,
    /// Effective description, derived from the body when none was set
    pub meta_description: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub status: PostStatus,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub views: i64,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        let meta_description = p.meta_description();
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            author: p.author.into(),
            body: p.body,
            meta_description,
            created_on: p.created_on,
            updated_on: p.updated_on,
            status: p.status,
            categories: p.categories,
            tags: p.tags,
            views: p.views,
        }
    }
}

/// Page bookkeeping for paginated lists
#[derive(Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> From<&Paginated<T>> for PageInfo {
    fn from(p: &Paginated<T>) -> Self {
        Self {
            page: p.page,
            per_page: p.per_page,
            total: p.total,
            total_pages: p.total_pages(),
            has_next: p.has_next(),
            has_prev: p.has_prev(),
        }
    }
}

/// Paginated post list
#[derive(Serialize)]
pub struct PostPage {
    pub posts: Vec<PostResponse>,
    pub pagination: PageInfo,
}

impl From<Paginated<Post>> for PostPage {
    fn from(page: Paginated<Post>) -> Self {
        let pagination = PageInfo::from(&page);
        Self {
            posts: page.items.into_iter().map(PostResponse::from).collect(),
            pagination,
        }
    }
}

#[derive(Serialize)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub page: PostPage,
    pub categories: Vec<Category>,
    pub search_query: Option<String>,
}

impl From<IndexPage> for IndexResponse {
    fn from(index: IndexPage) -> Self {
        Self {
            page: index.posts.into(),
            categories: index.categories,
            search_query: index.search_query,
        }
    }
}

#[derive(Serialize)]
pub struct DetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub related: Vec<PostResponse>,
}

impl From<PostDetail> for DetailResponse {
    fn from(detail: PostDetail) -> Self {
        Self {
            post: detail.post.into(),
            comments: detail.comments.into_iter().map(CommentResponse::from).collect(),
            related: detail.related.into_iter().map(PostResponse::from).collect(),
        }
    }
}

/// GET /posts - published posts, searchable and paginated
async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> Result<Json<IndexResponse>, ApiError> {
    let page = Queries::new(state.store.as_ref(), &state.settings)
        .index(params.search.as_deref(), params.page.as_deref())
        .await?;

    Ok(Json(page.into()))
}

/// GET /posts/{slug} - one published post; counts a view
async fn detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<DetailResponse>, ApiError> {
    let detail = Queries::new(state.store.as_ref(), &state.settings)
        .post_detail(&slug)
        .await?;

    Ok(Json(detail.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/posts", get(index))
        .route("/posts/{slug}", get(detail))
}
