//! Public category page

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::posts::PostResponse;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::query::{CategoryPage, Queries};
use crate::store::Category;

#[derive(Serialize)]
pub struct CategoryResponse {
    pub category: Category,
    pub posts: Vec<PostResponse>,
    pub categories: Vec<Category>,
}

impl From<CategoryPage> for CategoryResponse {
    fn from(page: CategoryPage) -> Self {
        Self {
            category: page.category,
            posts: page.posts.into_iter().map(PostResponse::from).collect(),
            categories: page.categories,
        }
    }
}

/// GET /categories/{name} - published posts in the named category
async fn category(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let page = Queries::new(state.store.as_ref(), &state.settings)
        .category_page(&name)
        .await?;

    Ok(Json(page.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/categories/{name}", get(category))
}
