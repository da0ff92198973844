//! Reader comment submission

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::JsonBody;
use crate::http::server::AppState;
use crate::models::CommentSubmission;
use crate::moderation::Moderation;
use crate::store::Comment;

/// Public view of a comment; the email address stays private
#[derive(Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub body: String,
    pub created_on: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            name: c.name,
            body: c.body,
            created_on: c.created_on,
        }
    }
}

/// POST /posts/{slug}/comments
async fn submit(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    JsonBody(submission): JsonBody<CommentSubmission>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let comment = Moderation::new(state.store.as_ref())
        .submit_comment(&slug, &submission)
        .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/posts/{slug}/comments", post(submit))
}
